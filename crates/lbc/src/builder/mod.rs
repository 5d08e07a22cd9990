//! Tree-to-IR builder
//!
//! [build] turns a [Document] into a [RootConfig]. It runs in two steps for
//! every section:
//!
//! 1. each [Child] is classified into a [Directive], one variant per kind of
//!    directive result (see [classify]);
//! 2. the section constructor offers every directive to the parts the
//!    section is made of ([ProxyCommon], [FrontSide], [BackSide]). A part
//!    either absorbs the directive or hands it back. Whatever nobody absorbs
//!    is reported as misplaced.
//!
//! Loops and template spreads are stored, not expanded; see [crate::passes].
//!
//! The builder is pure except for `env(name, default)`, which reads the
//! process environment.
mod directives;
mod fields;
mod sections;
mod server;

pub(crate) use server::{assign_server_field, Assign};

use crate::ir::*;
use crate::parse_tree::{Child, Document, Expr, Item, ObjectNode, Position};
use crate::value::{FieldError, Value};

/// A directive result with its kind decided
#[derive(Debug)]
pub(crate) enum Directive {
    Pair { key: String, value: Value },
    Bind(Bind),
    Acl(Acl),
    Rule(Rule),
    UseBackend(UseBackend),
    UseServer(UseServer),
    Redirect(Redirect),
    StickTable(StickTable),
    StickRule(StickRule),
    Compression(Compression),
    ErrorPage(ErrorPage),
    Stats(Stats),
    Log(LogTarget),
    Timeouts(Timeouts),
    Options(ProxyOptions),
    Cookie(Cookie),
    HealthCheck(HealthCheck),
    Server(Server),
    DefaultServer(ServerParams),
    ServerTemplate(ServerTemplate),
    Loop(ServerLoop),
    StatsSocket(StatsSocket),
    Tune(indexmap::IndexMap<String, String>),
    SetEnv(indexmap::IndexMap<String, String>),
    Hold(indexmap::IndexMap<String, String>),
    Peer(Endpoint),
    Nameserver(Endpoint),
    Mailer(Endpoint),
}

impl Directive {
    /// Name as written in the source, for error messages
    pub fn name(&self) -> &str {
        match self {
            Directive::Pair { key, .. } => key,
            Directive::Bind(_) => "bind",
            Directive::Acl(_) => "acl",
            Directive::Rule(rule) => match rule.kind {
                RuleKind::HttpRequest => "http_request",
                RuleKind::HttpResponse => "http_response",
                RuleKind::HttpAfterResponse => "http_after_response",
                RuleKind::TcpRequest => "tcp_request",
                RuleKind::TcpResponse => "tcp_response",
                RuleKind::HttpCheck => "http_check",
                RuleKind::TcpCheck => "tcp_check",
            },
            Directive::UseBackend(_) => "use_backend",
            Directive::UseServer(_) => "use_server",
            Directive::Redirect(_) => "redirect",
            Directive::StickTable(_) => "stick_table",
            Directive::StickRule(_) => "stick",
            Directive::Compression(_) => "compression",
            Directive::ErrorPage(_) => "error_page",
            Directive::Stats(_) => "stats",
            Directive::Log(_) => "log",
            Directive::Timeouts(_) => "timeouts",
            Directive::Options(_) => "options",
            Directive::Cookie(_) => "cookie",
            Directive::HealthCheck(_) => "health_check",
            Directive::Server(_) => "server",
            Directive::DefaultServer(_) => "default_server",
            Directive::ServerTemplate(_) => "server_template",
            Directive::Loop(_) => "for",
            Directive::StatsSocket(_) => "stats_socket",
            Directive::Tune(_) => "tune",
            Directive::SetEnv(_) => "setenv",
            Directive::Hold(_) => "hold",
            Directive::Peer(_) => "peer",
            Directive::Nameserver(_) => "nameserver",
            Directive::Mailer(_) => "mailer",
        }
    }
}

/// A classified directive and where it came from
#[derive(Debug)]
pub(crate) struct Entry {
    pub directive: Directive,
    pub position: Option<Position>,
}

/// Build the IR for a whole document
#[tracing::instrument(level = "debug", skip_all)]
pub fn build(document: &Document) -> Result<RootConfig, BuildError> {
    let mut root = RootConfig::default();

    for item in &document.items {
        match item {
            Item::Variable {
                name,
                value,
                position,
            } => {
                let value = evaluate(value, *position)?;
                tracing::trace!(%name, ?value, "variable");
                root.variables.insert(
                    name.clone(),
                    Variable {
                        name: name.clone(),
                        value,
                    },
                );
            }
            Item::Template {
                name,
                children,
                position,
            } => {
                let template = sections::template(name, children, *position)?;
                root.templates.insert(name.clone(), template);
            }
            Item::Import { path, .. } => root.imports.push(path.clone()),
            Item::Section(section) => sections::section(&mut root, section)?,
        }
    }

    tracing::debug!(
        frontends = root.frontends.len(),
        backends = root.backends.len(),
        listens = root.listens.len(),
        variables = root.variables.len(),
        templates = root.templates.len(),
        "built"
    );

    Ok(root)
}

/// Decide the kind of every child of a section or object
pub(crate) fn classify(children: &[Child]) -> Result<Vec<Entry>, BuildError> {
    let mut entries = Vec::with_capacity(children.len());

    for child in children {
        let position = child.position();
        match child {
            Child::Pair { key, value, .. } => entries.push(Entry {
                directive: Directive::Pair {
                    key: key.clone(),
                    value: evaluate(value, position)?,
                },
                position,
            }),
            Child::Object(object) => entries.push(Entry {
                directive: classify_object(object)?,
                position,
            }),
            Child::List { items, .. } => {
                for object in items {
                    entries.push(Entry {
                        directive: classify_object(object)?,
                        position: object.position.or(position),
                    });
                }
            }
            Child::Loop(node) => entries.push(Entry {
                directive: Directive::Loop(server::server_loop(node)?),
                position,
            }),
        }
    }

    Ok(entries)
}

fn classify_object(object: &ObjectNode) -> Result<Directive, BuildError> {
    if let Some(kind) = RuleKind::from_directive(&object.kind) {
        return directives::rule(kind, object).map(Directive::Rule);
    }

    let directive = match object.kind.as_str() {
        "bind" => Directive::Bind(directives::bind(object)?),
        "acl" => Directive::Acl(directives::acl(object)?),
        "use_backend" => Directive::UseBackend(directives::use_backend(object)?),
        "use_server" => Directive::UseServer(directives::use_server(object)?),
        "redirect" => Directive::Redirect(directives::redirect(object)?),
        "stick_table" => Directive::StickTable(directives::stick_table(object)?),
        "stick" => Directive::StickRule(directives::stick_rule(object)?),
        "compression" => Directive::Compression(directives::compression(object)?),
        "error_page" => Directive::ErrorPage(directives::error_page(object)?),
        "stats" => Directive::Stats(directives::stats(object)?),
        "log" => Directive::Log(directives::log_target(object)?),
        "timeouts" => Directive::Timeouts(directives::timeouts(object)?),
        "options" => Directive::Options(directives::options(object)?),
        "stats_socket" => Directive::StatsSocket(directives::stats_socket(object)?),
        "tune" => Directive::Tune(directives::string_map(object)?),
        "setenv" => Directive::SetEnv(directives::string_map(object)?),
        "hold" => Directive::Hold(directives::string_map(object)?),
        "peer" => Directive::Peer(directives::endpoint(object)?),
        "nameserver" => Directive::Nameserver(directives::endpoint(object)?),
        "mailer" => Directive::Mailer(directives::endpoint(object)?),
        "cookie" => Directive::Cookie(server::cookie(object)?),
        "health_check" => Directive::HealthCheck(server::health_check(object)?),
        "server" => Directive::Server(server::server(object)?),
        "default_server" => Directive::DefaultServer(server::default_server(object)?),
        "server_template" => Directive::ServerTemplate(server::server_template(object)?),
        other => {
            return Err(BuildError::UnknownDirective {
                directive: other.to_string(),
                at: At(object.position),
            })
        }
    };

    if !object.spreads.is_empty() && !matches!(directive, Directive::Server(_)) {
        return Err(BuildError::Invalid {
            directive: object.kind.clone(),
            message: "only servers accept template spreads".to_string(),
            at: At(object.position),
        });
    }

    Ok(directive)
}

/// Evaluate an expression into a plain value
///
/// This is the only place where process state enters the pipeline.
pub(crate) fn evaluate(expr: &Expr, position: Option<Position>) -> Result<Value, BuildError> {
    Ok(match expr {
        Expr::Literal(value) => value.clone(),
        Expr::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| evaluate(item, position))
                .collect::<Result<_, _>>()?,
        ),
        Expr::Object(object) => Value::Object(
            object
                .iter()
                .map(|(key, item)| Ok((key.clone(), evaluate(item, position)?)))
                .collect::<Result<_, BuildError>>()?,
        ),
        Expr::Env { name, default } => match std::env::var(name) {
            Ok(value) => {
                tracing::debug!(%name, "environment variable read");
                Value::String(value)
            }
            Err(_) => match default {
                Some(default) => evaluate(default, position)?,
                None => {
                    return Err(BuildError::MissingEnvironment {
                        name: name.clone(),
                        at: At(position),
                    })
                }
            },
        },
    })
}

/// Optional source position, rendered as ` at <line>:<column>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct At(pub Option<Position>);

impl std::fmt::Display for At {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(position) => write!(f, " at {position}"),
            None => Ok(()),
        }
    }
}

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum BuildError {
    #[error("unknown directive `{directive}`{at}")]
    UnknownDirective { directive: String, at: At },
    #[error("`{directive}` is not allowed in {section}{at}")]
    Misplaced {
        directive: String,
        section: String,
        at: At,
    },
    #[error("unknown key `{key}` in `{directive}`{at}")]
    UnknownKey {
        key: String,
        directive: String,
        at: At,
    },
    #[error("`{directive}` requires {what}{at}")]
    Missing {
        directive: String,
        what: String,
        at: At,
    },
    #[error("invalid `{directive}`{at}: {source}")]
    Field {
        directive: String,
        source: FieldError,
        at: At,
    },
    #[error("invalid `{directive}`{at}: {message}")]
    Invalid {
        directive: String,
        message: String,
        at: At,
    },
    #[error("section `{kind}` declared more than once{at}")]
    DuplicateSection { kind: String, at: At },
    #[error("environment variable `{name}` is not set and has no default{at}")]
    MissingEnvironment { name: String, at: At },
}

#[cfg(test)]
mod test;
