//! Normalization passes
//!
//! Each pass consumes a [RootConfig] and returns the rewritten one:
//!
//! 1. [resolve]: `${name}` in every string field, against declared variables
//! 2. [unroll]: `for` loops into concrete servers
//! 3. [expand_templates]: template spreads into unset server parameters
//!
//! [normalize] runs all three and drops the design-time entities afterwards,
//! so its output satisfies [RootConfig::is_normalized].
mod expr;
mod interpolate;
mod resolve;
mod templates;
mod unroll;

pub use resolve::resolve;
pub use templates::expand_templates;
pub use unroll::unroll;

use crate::ir::RootConfig;
use crate::value::FieldError;

/// Run every pass in order
#[tracing::instrument(level = "debug", skip_all)]
pub fn normalize(root: RootConfig) -> Result<RootConfig, NormalizeError> {
    let root = resolve(root)?;
    let root = unroll(root)?;
    let mut root = expand_templates(root)?;

    root.variables.clear();
    root.templates.clear();

    debug_assert!(root.is_normalized());
    Ok(root)
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum NormalizeError {
    #[error("undefined variable `{name}`")]
    UndefinedVariable { name: String },
    #[error("variables reference each other: {chain}")]
    VariableCycle { chain: String },
    #[error("cannot evaluate `{expression}`: {message}")]
    Expression { expression: String, message: String },
    #[error("`{expression}` is a {kind} and cannot be written into text")]
    NotInterpolatable {
        expression: String,
        kind: &'static str,
    },
    #[error("invalid bound `{bound}` for loop variable `{variable}`: {message}")]
    InvalidLoopBound {
        variable: String,
        bound: String,
        message: String,
    },
    #[error("server `{server}` uses unknown template `{template}`")]
    UnknownTemplate { template: String, server: String },
    #[error("template `{template}` sets `{param}`, which is not a server parameter")]
    UnknownTemplateParam { template: String, param: String },
    #[error("template `{template}`: {source}")]
    TemplateParam {
        template: String,
        source: FieldError,
    },
}
