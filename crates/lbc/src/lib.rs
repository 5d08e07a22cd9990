//! # lbc - load balancer configuration compiler
//!
//! Compiles a small declarative language into HAProxy configuration text.
//!
//! ## Introduction for developers
//!
//! Read this to understand how `lbc` works internally.
//!
//! ### Pipeline
//!
//! ```text
//! source ─▶ hcl_front ─▶ parse tree ─▶ builder ─▶ IR ─▶ passes ─▶ final IR ─▶ generate ─▶ text
//!                                                                    │
//!                                                                    └─▶ validate
//! ```
//!
//! Every stage takes its input by value (or by shared reference, for the
//! read-only ones) and returns a new value, so no stage can observe a tree
//! another stage is still working on.
//!
//! ### Front end
//!
//! [hcl_front] parses HCL with [hcl_edit] and produces a [parse_tree::Document].
//! The parse tree knows nothing about HAProxy: a section is an ordered list of
//! children, each already tagged as a pair, a typed sub-object, a list of
//! typed sub-objects or a `for` loop. Any other front end producing this shape
//! can drive the rest of the compiler via [compile_document].
//!
//! ### Building
//!
//! [builder::build] walks the parse tree and creates the [ir::RootConfig].
//! Every child is classified into a directive first; each section part
//! (common, front, back) then takes the directives it knows about. Whatever
//! is left over is reported as misplaced.
//!
//! Section defaults are applied here (`mode http`, `balance roundrobin`,
//! health check `rise 2` / `fall 3`). `env("NAME", "default")` is evaluated
//! here too; it is the only place process state enters the pipeline.
//!
//! Two things are *not* expanded by the builder but stored for later:
//! - `for` loops over servers become [ir::ServerLoop]s on their section
//! - `templates = [..]` on a server is kept as a list of template names
//!
//! ### Normalization
//!
//! [passes::normalize] runs three passes in a fixed order:
//!
//! 1. [passes::resolve] resolves variables and substitutes `${...}` in
//!    every string of the IR
//! 2. [passes::unroll] expands loops into concrete servers
//! 3. [passes::expand_templates] fills unset server parameters from the
//!    referenced templates
//!
//! Afterwards variables and templates are dropped; the IR only holds what
//! ends up in the output.
//!
//! `${...}` holds a restricted expression: names, integer and string
//! literals, `+`, `-` and parentheses. `$${` writes a literal `${`.
//!
//! ### Output
//!
//! [generate::generate] writes the final IR as text. Output is a pure
//! function of the IR; the same IR always produces the same bytes.
//!
//! [validate::semantic] and [validate::security] inspect the final IR and
//! report findings without changing anything.
pub mod builder;
pub mod generate;
pub mod hcl_front;
pub mod ir;
pub mod parse_tree;
pub mod passes;
pub mod validate;
pub mod value;
mod visit;

use builder::BuildError;
use hcl_front::ParseError;
use ir::RootConfig;
use parse_tree::Document;
use passes::NormalizeError;

/// Output of a successful compilation
#[derive(Debug, Clone)]
pub struct Compiled {
    /// The final IR, for validation or inspection
    pub config: RootConfig,
    /// Generated configuration text
    pub output: String,
}

/// The first error of a failed compilation
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Build(#[from] BuildError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
}

/// Compile HCL source text
pub fn compile(source: &str) -> Result<Compiled, Error> {
    let document = hcl_front::parse_document(source)?;
    compile_document(&document)
}

/// Compile an already parsed document
#[tracing::instrument(level = "debug", skip_all)]
pub fn compile_document(document: &Document) -> Result<Compiled, Error> {
    let config = builder::build(document)?;
    let config = passes::normalize(config)?;
    let output = generate::generate(&config);

    tracing::info!(bytes = output.len(), "compiled");
    Ok(Compiled { config, output })
}
