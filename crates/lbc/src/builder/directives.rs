//! constructors for flat directive records
use super::fields::Fields;
use super::BuildError;
use crate::ir::*;
use crate::parse_tree::ObjectNode;
use crate::value::{FieldError, Value};
use indexmap::IndexMap;

/// The first label of an object, or an error naming what it should be
fn label<'a>(object: &'a ObjectNode, what: &str) -> Result<&'a str, BuildError> {
    match object.labels.as_slice() {
        [label] => Ok(label),
        [] => Err(Fields::new(object)?.missing(format!("a {what} label"))),
        _ => Err(Fields::new(object)?.invalid(format!("expects exactly one {what} label"))),
    }
}

fn no_label(object: &ObjectNode) -> Result<(), BuildError> {
    if object.labels.is_empty() {
        return Ok(());
    }
    Err(Fields::new(object)?.invalid("takes no labels"))
}

pub(super) fn bind(object: &ObjectNode) -> Result<Bind, BuildError> {
    let address = label(object, "address")?.to_string();
    let mut fields = Fields::new(object)?;

    let bind = Bind {
        address,
        port: fields.u16("port")?,
        ssl: fields.flag("ssl")?,
        crt: fields.list("crt")?,
        crt_list: fields.string("crt_list")?,
        ca_file: fields.string("ca_file")?,
        verify: fields.string("verify")?,
        alpn: fields.list("alpn")?,
        ciphers: fields.string("ciphers")?,
        ciphersuites: fields.string("ciphersuites")?,
        ssl_min_ver: fields.string("ssl_min_ver")?,
        ssl_max_ver: fields.string("ssl_max_ver")?,
        strict_sni: fields.flag("strict_sni")?,
        accept_proxy: fields.flag("accept_proxy")?,
        transparent: fields.flag("transparent")?,
        v4v6: fields.flag("v4v6")?,
        v6only: fields.flag("v6only")?,
        defer_accept: fields.flag("defer_accept")?,
        tfo: fields.flag("tfo")?,
        allow_0rtt: fields.flag("allow_0rtt")?,
        interface: fields.string("interface")?,
        name: fields.string("name")?,
        mode: fields.string("mode")?,
        user: fields.string("user")?,
        group: fields.string("group")?,
        level: fields.string("level")?,
        maxconn: fields.u32("maxconn")?,
    };

    fields.finish()?;
    Ok(bind)
}

pub(super) fn acl(object: &ObjectNode) -> Result<Acl, BuildError> {
    let name = label(object, "name")?.to_string();
    let mut fields = Fields::new(object)?;

    let acl = Acl {
        name,
        criterion: fields.required_string("criterion")?,
        flags: fields.list("flags")?,
        values: fields.list("values")?,
    };

    fields.finish()?;
    Ok(acl)
}

/// `<kind> "<action>" { condition = ..., <param> = ... }`
///
/// Every pair other than `condition` is a parameter, in declaration order.
pub(super) fn rule(kind: RuleKind, object: &ObjectNode) -> Result<Rule, BuildError> {
    let action = label(object, "action")?.to_string();
    let mut fields = Fields::new(object)?;
    let condition = fields.string("condition")?;

    let mut params = IndexMap::new();
    for (key, value) in fields.drain() {
        let rendered = value
            .render()
            .ok_or_else(|| FieldError::new(key.as_str(), "scalar or list", value.kind()));
        match rendered {
            Ok(rendered) => {
                params.insert(key, rendered);
            }
            Err(e) => return Err(Fields::new(object)?.field_error(e)),
        }
    }

    Ok(Rule {
        kind,
        action,
        params,
        condition,
    })
}

pub(super) fn use_backend(object: &ObjectNode) -> Result<UseBackend, BuildError> {
    let backend = label(object, "backend")?.to_string();
    let mut fields = Fields::new(object)?;
    let condition = fields.string("condition")?;
    fields.finish()?;

    Ok(UseBackend { backend, condition })
}

pub(super) fn use_server(object: &ObjectNode) -> Result<UseServer, BuildError> {
    let server = label(object, "server")?.to_string();
    let mut fields = Fields::new(object)?;
    let condition = fields.string("condition")?;
    fields.finish()?;

    Ok(UseServer { server, condition })
}

pub(super) fn redirect(object: &ObjectNode) -> Result<Redirect, BuildError> {
    let kind = match label(object, "redirect kind")? {
        "location" => RedirectKind::Location,
        "prefix" => RedirectKind::Prefix,
        "scheme" => RedirectKind::Scheme,
        other => {
            return Err(Fields::new(object)?.invalid(format!(
                "unknown redirect kind `{other}`, expected location, prefix or scheme"
            )))
        }
    };
    let mut fields = Fields::new(object)?;

    let redirect = Redirect {
        kind,
        target: fields.required_string("target")?,
        code: fields.u16("code")?,
        drop_query: fields.flag("drop_query")?,
        append_slash: fields.flag("append_slash")?,
        set_cookie: fields.string("set_cookie")?,
        condition: fields.string("condition")?,
    };

    fields.finish()?;
    Ok(redirect)
}

pub(super) fn stick_table(object: &ObjectNode) -> Result<StickTable, BuildError> {
    no_label(object)?;
    let mut fields = Fields::new(object)?;

    let table = StickTable {
        kind: fields.required_string("type")?,
        len: fields.u32("len")?,
        size: fields.required_string("size")?,
        expire: fields.string("expire")?,
        nopurge: fields.flag("nopurge")?,
        peers: fields.string("peers")?,
        store: fields.list("store")?,
    };

    fields.finish()?;
    Ok(table)
}

pub(super) fn stick_rule(object: &ObjectNode) -> Result<StickRule, BuildError> {
    let kind = match label(object, "stick rule kind")? {
        "match" => StickRuleKind::Match,
        "on" => StickRuleKind::On,
        "store_request" => StickRuleKind::StoreRequest,
        "store_response" => StickRuleKind::StoreResponse,
        other => {
            return Err(Fields::new(object)?.invalid(format!(
                "unknown stick rule `{other}`, expected match, on, store_request or store_response"
            )))
        }
    };
    let mut fields = Fields::new(object)?;

    let rule = StickRule {
        kind,
        pattern: fields.required_string("pattern")?,
        table: fields.string("table")?,
        condition: fields.string("condition")?,
    };

    fields.finish()?;
    Ok(rule)
}

pub(super) fn compression(object: &ObjectNode) -> Result<Compression, BuildError> {
    no_label(object)?;
    let mut fields = Fields::new(object)?;

    let compression = Compression {
        algo: fields.list("algo")?,
        types: fields.list("type")?,
        offload: fields.flag("offload")?,
    };

    fields.finish()?;
    Ok(compression)
}

/// `error_page "503" { file = "..." }` or
/// `error_page "503" { location = "...", code = 302 }`
pub(super) fn error_page(object: &ObjectNode) -> Result<ErrorPage, BuildError> {
    let code = Value::from(label(object, "status code")?)
        .expect_u16("status code")
        .map_err(|e| BuildError::Field {
            directive: object.kind.clone(),
            source: e,
            at: super::At(object.position),
        })?;
    let mut fields = Fields::new(object)?;

    let file = fields.string("file")?;
    let location = fields.string("location")?;
    let redirect_code = fields.u16("code")?;

    let (kind, target) = match (file, location, redirect_code) {
        (Some(file), None, None) => (ErrorPageKind::File, file),
        (None, Some(location), None) => (ErrorPageKind::Location, location),
        (None, Some(location), Some(302)) => (ErrorPageKind::Location302, location),
        (None, Some(location), Some(303)) => (ErrorPageKind::Location303, location),
        (None, Some(_), Some(other)) => {
            return Err(fields.invalid(format!("redirect code {other} is not 302 or 303")))
        }
        (Some(_), Some(_), _) => return Err(fields.invalid("`file` and `location` conflict")),
        (Some(_), None, Some(_)) => return Err(fields.invalid("`code` only applies to `location`")),
        _ => return Err(fields.missing("`file` or `location`")),
    };

    fields.finish()?;
    Ok(ErrorPage { code, kind, target })
}

pub(super) fn stats(object: &ObjectNode) -> Result<Stats, BuildError> {
    no_label(object)?;
    let mut fields = Fields::new(object)?;

    let stats = Stats {
        enable: fields.flag("enable")?,
        uri: fields.string("uri")?,
        realm: fields.string("realm")?,
        auth: fields.list("auth")?,
        refresh: fields.string("refresh")?,
        hide_version: fields.flag("hide_version")?,
        show_legends: fields.flag("show_legends")?,
        show_node: fields.flag("show_node")?,
        admin: fields.string("admin")?,
        scope: fields.list("scope")?,
    };

    fields.finish()?;
    Ok(stats)
}

pub(super) fn log_target(object: &ObjectNode) -> Result<LogTarget, BuildError> {
    let address = label(object, "address")?.to_string();
    let mut fields = Fields::new(object)?;

    let target = LogTarget {
        address,
        facility: fields
            .string("facility")?
            .unwrap_or_else(|| LogTarget::DEFAULT_FACILITY.to_string()),
        level: fields.string("level")?,
        min_level: fields.string("min_level")?,
        format: fields.string("format")?,
        length: fields.u32("length")?,
    };

    if target.min_level.is_some() && target.level.is_none() {
        return Err(fields.invalid("`min_level` requires `level`"));
    }

    fields.finish()?;
    Ok(target)
}

pub(super) fn timeouts(object: &ObjectNode) -> Result<Timeouts, BuildError> {
    no_label(object)?;
    let mut fields = Fields::new(object)?;
    let mut timeouts = Timeouts::default();

    let mut pending = vec![];
    for (key, value) in fields.drain() {
        pending.push((key, value));
    }

    for (key, value) in pending {
        let Some(slot) = timeouts.slot_mut(&key) else {
            return Err(BuildError::UnknownKey {
                key,
                directive: object.kind.clone(),
                at: super::At(object.position),
            });
        };
        *slot = Some(value.expect_string(&key).map_err(|e| fields.field_error(e))?);
    }

    Ok(timeouts)
}

/// `options { httplog = true, forwardfor = "127.0.0.0/8" }`
///
/// `forwardfor` takes either a flag or the network to exclude.
pub(super) fn options(object: &ObjectNode) -> Result<ProxyOptions, BuildError> {
    no_label(object)?;
    let mut fields = Fields::new(object)?;
    let mut options = ProxyOptions::default();

    match fields.take("forwardfor") {
        Some(Value::String(except)) if except != "true" && except != "false" => {
            options.forwardfor = true;
            options.forwardfor_except = Some(except);
        }
        Some(value) => {
            options.forwardfor = value
                .expect_bool("forwardfor")
                .map_err(|e| fields.field_error(e))?;
        }
        None => {}
    }

    let pending: Vec<_> = fields.drain().collect();
    for (key, value) in pending {
        let enabled = value.expect_bool(&key).map_err(|e| fields.field_error(e))?;
        let Some(flag) = options.flag_mut(&key) else {
            return Err(BuildError::UnknownKey {
                key,
                directive: object.kind.clone(),
                at: super::At(object.position),
            });
        };
        *flag = enabled;
    }

    Ok(options)
}

pub(super) fn stats_socket(object: &ObjectNode) -> Result<StatsSocket, BuildError> {
    let path = label(object, "path")?.to_string();
    let mut fields = Fields::new(object)?;

    let socket = StatsSocket {
        path,
        mode: fields.string("mode")?,
        level: fields.string("level")?,
        user: fields.string("user")?,
        group: fields.string("group")?,
        expose_fd_listeners: fields.flag("expose_fd_listeners")?,
    };

    fields.finish()?;
    Ok(socket)
}

/// Objects whose keys are free form, like `tune` or `setenv`
pub(super) fn string_map(object: &ObjectNode) -> Result<IndexMap<String, String>, BuildError> {
    no_label(object)?;
    let mut fields = Fields::new(object)?;

    let pending: Vec<_> = fields.drain().collect();
    let mut map = IndexMap::new();
    for (key, value) in pending {
        let value = value.expect_string(&key).map_err(|e| fields.field_error(e))?;
        map.insert(key, value);
    }

    Ok(map)
}

pub(super) fn endpoint(object: &ObjectNode) -> Result<Endpoint, BuildError> {
    let name = label(object, "name")?.to_string();
    let mut fields = Fields::new(object)?;

    let endpoint = Endpoint {
        name,
        address: fields.required_string("address")?,
        port: fields.u16("port")?,
    };

    fields.finish()?;
    Ok(endpoint)
}
