//! servers, server parameters and everything attached to them
use super::fields::Fields;
use super::{evaluate, At, BuildError};
use crate::ir::*;
use crate::parse_tree::{Iterable, LoopNode, ObjectNode};
use crate::value::{FieldError, Value};

/// How a parameter is written into a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Assign {
    /// The author wrote it, always wins
    Overwrite,
    /// Coming from a template, only fills slots the author left unset
    FillUnset,
}

fn put<T>(slot: &mut Option<T>, value: T, assign: Assign) {
    if assign == Assign::Overwrite || slot.is_none() {
        *slot = Some(value);
    }
}

/// Write one named server parameter
///
/// Returns `Ok(false)` when `key` is not a server parameter. This is shared
/// by the builder and template expansion so both accept the same keys.
pub(crate) fn assign_server_param(
    params: &mut ServerParams,
    key: &str,
    value: &Value,
    assign: Assign,
) -> Result<bool, FieldError> {
    match key {
        "check" => put(&mut params.check, value.expect_bool(key)?, assign),
        "check_ssl" => put(&mut params.check_ssl, value.expect_bool(key)?, assign),
        "check_port" => put(&mut params.check_port, value.expect_u16(key)?, assign),
        "inter" => put(&mut params.inter, value.expect_string(key)?, assign),
        "fastinter" => put(&mut params.fastinter, value.expect_string(key)?, assign),
        "downinter" => put(&mut params.downinter, value.expect_string(key)?, assign),
        "rise" => put(&mut params.rise, value.expect_u32(key)?, assign),
        "fall" => put(&mut params.fall, value.expect_u32(key)?, assign),
        "weight" => put(&mut params.weight, value.expect_u32(key)?, assign),
        "maxconn" => put(&mut params.maxconn, value.expect_u32(key)?, assign),
        "maxqueue" => put(&mut params.maxqueue, value.expect_u32(key)?, assign),
        "minconn" => put(&mut params.minconn, value.expect_u32(key)?, assign),
        "backup" => put(&mut params.backup, value.expect_bool(key)?, assign),
        "disabled" => put(&mut params.disabled, value.expect_bool(key)?, assign),
        "ssl" => put(&mut params.ssl, value.expect_bool(key)?, assign),
        "verify" => put(&mut params.verify, value.expect_string(key)?, assign),
        "ca_file" => put(&mut params.ca_file, value.expect_string(key)?, assign),
        "crt" => put(&mut params.crt, value.expect_string(key)?, assign),
        "sni" => put(&mut params.sni, value.expect_string(key)?, assign),
        "alpn" => put(&mut params.alpn, value.expect_string_list(key)?, assign),
        "ciphers" => put(&mut params.ciphers, value.expect_string(key)?, assign),
        "ssl_min_ver" => put(&mut params.ssl_min_ver, value.expect_string(key)?, assign),
        "send_proxy" => put(&mut params.send_proxy, value.expect_bool(key)?, assign),
        "send_proxy_v2" => put(&mut params.send_proxy_v2, value.expect_bool(key)?, assign),
        "cookie" => put(&mut params.cookie, value.expect_string(key)?, assign),
        "resolvers" => put(&mut params.resolvers, value.expect_string(key)?, assign),
        "resolve_prefer" => put(&mut params.resolve_prefer, value.expect_string(key)?, assign),
        "init_addr" => put(&mut params.init_addr, value.expect_string(key)?, assign),
        "slowstart" => put(&mut params.slowstart, value.expect_string(key)?, assign),
        "agent_check" => put(&mut params.agent_check, value.expect_bool(key)?, assign),
        "agent_port" => put(&mut params.agent_port, value.expect_u16(key)?, assign),
        "agent_inter" => put(&mut params.agent_inter, value.expect_string(key)?, assign),
        "track" => put(&mut params.track, value.expect_string(key)?, assign),
        "observe" => put(&mut params.observe, value.expect_string(key)?, assign),
        "error_limit" => put(&mut params.error_limit, value.expect_u32(key)?, assign),
        "on_error" => put(&mut params.on_error, value.expect_string(key)?, assign),
        "on_marked_down" => put(&mut params.on_marked_down, value.expect_string(key)?, assign),
        "proto" => put(&mut params.proto, value.expect_string(key)?, assign),
        "source" => put(&mut params.source, value.expect_string(key)?, assign),
        "tfo" => put(&mut params.tfo, value.expect_bool(key)?, assign),
        _ => return Ok(false),
    }

    Ok(true)
}

/// Like [assign_server_param], plus the fields only a concrete server has
pub(crate) fn assign_server_field(
    server: &mut Server,
    key: &str,
    value: &Value,
    assign: Assign,
) -> Result<bool, FieldError> {
    match key {
        "port" => {
            put(&mut server.port, value.expect_u16(key)?, assign);
            Ok(true)
        }
        _ => assign_server_param(&mut server.params, key, value, assign),
    }
}

fn params_from(fields: &mut Fields, directive: &str) -> Result<ServerParams, BuildError> {
    let mut params = ServerParams::default();

    let pending: Vec<_> = fields.drain().collect();
    for (key, value) in pending {
        let known = assign_server_param(&mut params, &key, &value, Assign::Overwrite)
            .map_err(|e| fields.field_error(e))?;
        if !known {
            return Err(BuildError::UnknownKey {
                key,
                directive: directive.to_string(),
                at: At(fields.position()),
            });
        }
    }

    Ok(params)
}

/// `server "web1" { .. }`, or `server { name = "web${i}" .. }` where the
/// name needs interpolation, since block labels are plain strings
pub(super) fn server(object: &ObjectNode) -> Result<Server, BuildError> {
    let mut fields = Fields::new(object)?;
    let name = match (object.labels.as_slice(), fields.string("name")?) {
        ([label], None) => label.clone(),
        ([], Some(name)) => name,
        ([_], Some(_)) => return Err(fields.invalid("takes a name label or `name`, not both")),
        _ => return Err(fields.missing("exactly one name label or `name`")),
    };

    let address = fields.required_string("address")?;
    let port = fields.u16("port")?;
    let params = params_from(&mut fields, &object.kind)?;

    let server = Server {
        name,
        address,
        port,
        params,
        templates: object.spreads.clone(),
    };

    tracing::trace!(name = %server.name, templates = ?server.templates, "server");
    Ok(server)
}

pub(super) fn default_server(object: &ObjectNode) -> Result<ServerParams, BuildError> {
    let mut fields = Fields::new(object)?;
    if !object.labels.is_empty() {
        return Err(fields.invalid("takes no labels"));
    }

    params_from(&mut fields, &object.kind)
}

pub(super) fn server_template(object: &ObjectNode) -> Result<ServerTemplate, BuildError> {
    let [prefix] = object.labels.as_slice() else {
        return Err(Fields::new(object)?.missing("exactly one prefix label"));
    };
    let mut fields = Fields::new(object)?;

    let count = fields.required_string("count")?;
    let fqdn = fields.required_string("fqdn")?;
    let port = fields.u16("port")?;
    let params = params_from(&mut fields, &object.kind)?;

    Ok(ServerTemplate {
        prefix: prefix.clone(),
        count,
        fqdn,
        port,
        params,
    })
}

pub(super) fn cookie(object: &ObjectNode) -> Result<Cookie, BuildError> {
    let [name] = object.labels.as_slice() else {
        return Err(Fields::new(object)?.missing("exactly one cookie name label"));
    };
    let mut fields = Fields::new(object)?;

    let cookie = Cookie {
        name: name.clone(),
        mode: fields.string("mode")?,
        indirect: fields.flag("indirect")?,
        nocache: fields.flag("nocache")?,
        httponly: fields.flag("httponly")?,
        secure: fields.flag("secure")?,
        domain: fields.string("domain")?,
        maxidle: fields.string("maxidle")?,
        maxlife: fields.string("maxlife")?,
    };

    fields.finish()?;
    Ok(cookie)
}

pub(super) fn health_check(object: &ObjectNode) -> Result<HealthCheck, BuildError> {
    let mut fields = Fields::new(object)?;
    if !object.labels.is_empty() {
        return Err(fields.invalid("takes no labels"));
    }

    let kind = match fields.string("type")?.as_deref() {
        None | Some("http") => CheckKind::Http,
        Some("tcp") => CheckKind::Tcp,
        Some("ssl_hello") => CheckKind::SslHello,
        Some("mysql") => CheckKind::Mysql,
        Some("pgsql") => CheckKind::Pgsql,
        Some("redis") => CheckKind::Redis,
        Some("smtp") => CheckKind::Smtp,
        Some("ldap") => CheckKind::Ldap,
        Some(other) => return Err(fields.invalid(format!("unknown check type `{other}`"))),
    };

    let mut check = HealthCheck::new(kind);
    check.method = fields.string("method")?;
    check.uri = fields.string("uri")?;
    check.version = fields.string("version")?;
    check.host = fields.string("host")?;
    check.expect = fields.string("expect")?;
    check.user = fields.string("user")?;
    check.disable_on_404 = fields.flag("disable_on_404")?;
    check.inter = fields.string("inter")?;
    if let Some(rise) = fields.u32("rise")? {
        check.rise = rise;
    }
    if let Some(fall) = fields.u32("fall")? {
        check.fall = fall;
    }

    if matches!(kind, CheckKind::Mysql | CheckKind::Pgsql) && check.user.is_none() {
        return Err(fields.missing("`user` for database checks"));
    }

    fields.finish()?;
    Ok(check)
}

/// A loop stays a descriptor; its body is built like any other server
pub(super) fn server_loop(node: &LoopNode) -> Result<ServerLoop, BuildError> {
    let iterable = match &node.iterable {
        Iterable::Range { start, end } => LoopIterable::Range {
            start: bound(evaluate(start, node.position)?, node)?,
            end: bound(evaluate(end, node.position)?, node)?,
        },
        Iterable::List(items) => LoopIterable::List(
            items
                .iter()
                .map(|item| evaluate(item, node.position))
                .collect::<Result<_, _>>()?,
        ),
    };

    let mut body = Vec::with_capacity(node.body.len());
    for object in &node.body {
        if object.kind != "server" {
            return Err(BuildError::Misplaced {
                directive: object.kind.clone(),
                section: "a `for` loop".to_string(),
                at: At(object.position.or(node.position)),
            });
        }
        body.push(server(object)?);
    }

    Ok(ServerLoop {
        variable: node.variable.clone(),
        iterable,
        body,
    })
}

fn bound(value: Value, node: &LoopNode) -> Result<Bound, BuildError> {
    match value {
        Value::Integer(int) => Ok(Bound::Integer(int)),
        Value::String(s) => match s.trim().parse() {
            Ok(int) => Ok(Bound::Integer(int)),
            Err(_) => Ok(Bound::Expr(s)),
        },
        other => Err(BuildError::Field {
            directive: "for".to_string(),
            source: FieldError::new("range", "integer or expression", other.kind()),
            at: At(node.position),
        }),
    }
}
