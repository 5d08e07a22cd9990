//! section constructors
//!
//! Every section offers each classified [Entry] to the parts it is made of.
//! A part returns `Ok(None)` when it absorbed the entry and `Ok(Some(entry))`
//! to hand it on; the last one standing is reported as misplaced.
use super::fields::Fields;
use super::{classify, At, BuildError, Directive, Entry};
use crate::ir::*;
use crate::parse_tree::{Child, Position, SectionNode};
use crate::value::{FieldError, Value};

type Offer = Result<Option<Entry>, BuildError>;

/// Build one top level section into `root`
pub(super) fn section(root: &mut RootConfig, node: &SectionNode) -> Result<(), BuildError> {
    tracing::trace!(kind = %node.kind, name = ?node.name, "section");

    match node.kind.as_str() {
        "global" => {
            no_name(node)?;
            if root.global.is_some() {
                return Err(duplicate(node));
            }
            root.global = Some(global(node)?);
        }
        "defaults" => {
            if root.defaults.is_some() {
                return Err(duplicate(node));
            }
            root.defaults = Some(defaults(node)?);
        }
        "frontend" => root.frontends.push(frontend(node)?),
        "backend" => root.backends.push(backend(node)?),
        "listen" => root.listens.push(listen(node)?),
        "peers" => root.peers.push(peers(node)?),
        "resolvers" => root.resolvers.push(resolvers(node)?),
        "mailers" => root.mailers.push(mailers(node)?),
        "script" => root.scripts.push(script(node)?),
        other => {
            return Err(BuildError::UnknownDirective {
                directive: other.to_string(),
                at: At(node.position),
            })
        }
    }

    Ok(())
}

/// A `template "name" { ... }` item; every pair but `kind` is a parameter
pub(super) fn template(
    name: &str,
    children: &[Child],
    position: Option<Position>,
) -> Result<Template, BuildError> {
    let mut fields = Fields::from_children("template", children, position)?;

    let kind = match fields.string("kind")?.as_deref() {
        None | Some("server") => TemplateKind::Server,
        Some(other) => {
            return Err(fields.invalid(format!("templates cannot target `{other}`")));
        }
    };

    let params = fields.drain().collect();
    let template = Template {
        name: name.to_string(),
        kind,
        params,
    };

    tracing::trace!(name, params = template.params.len(), "template");
    Ok(template)
}

fn global(node: &SectionNode) -> Result<Global, BuildError> {
    let mut global = Global::default();

    for entry in classify(&node.children)? {
        let position = entry.position;
        match entry.directive {
            Directive::Log(target) => global.logs.push(target),
            Directive::StatsSocket(socket) => global.stats_sockets.push(socket),
            Directive::Tune(tune) => global.tune.extend(tune),
            Directive::SetEnv(setenv) => global.setenv.extend(setenv),
            Directive::Pair { key, value } => {
                let known = global_pair(&mut global, &key, &value)
                    .map_err(|source| field(node, source, position))?;
                if !known {
                    return Err(unknown_key(node, key, position));
                }
            }
            directive => return Err(misplaced(node, Entry { directive, position })),
        }
    }

    Ok(global)
}

fn global_pair(global: &mut Global, key: &str, value: &Value) -> Result<bool, FieldError> {
    match key {
        "daemon" => global.daemon = value.expect_bool(key)?,
        "master_worker" => global.master_worker = value.expect_bool(key)?,
        "user" => global.user = Some(value.expect_string(key)?),
        "group" => global.group = Some(value.expect_string(key)?),
        "uid" => global.uid = Some(value.expect_u32(key)?),
        "gid" => global.gid = Some(value.expect_u32(key)?),
        "chroot" => global.chroot = Some(value.expect_string(key)?),
        "pidfile" => global.pidfile = Some(value.expect_string(key)?),
        "nbthread" => global.nbthread = Some(value.expect_u32(key)?),
        "cpu_map" => global.cpu_map = value.expect_string_list(key)?,
        "hard_stop_after" => global.hard_stop_after = Some(value.expect_string(key)?),
        "insecure_fork_wanted" => global.insecure_fork_wanted = value.expect_bool(key)?,
        "description" => global.description = Some(value.expect_string(key)?),
        "maxconn" => global.maxconn = Some(value.expect_u32(key)?),
        "maxconnrate" => global.maxconnrate = Some(value.expect_u32(key)?),
        "maxsessrate" => global.maxsessrate = Some(value.expect_u32(key)?),
        "maxsslconn" => global.maxsslconn = Some(value.expect_u32(key)?),
        "maxsslrate" => global.maxsslrate = Some(value.expect_u32(key)?),
        "ulimit_n" => global.ulimit_n = Some(value.expect_u32(key)?),
        "spread_checks" => global.spread_checks = Some(value.expect_u32(key)?),
        "ca_base" => global.ca_base = Some(value.expect_string(key)?),
        "crt_base" => global.crt_base = Some(value.expect_string(key)?),
        "ssl_default_bind_ciphers" => {
            global.ssl_default_bind_ciphers = Some(value.expect_string(key)?)
        }
        "ssl_default_bind_ciphersuites" => {
            global.ssl_default_bind_ciphersuites = Some(value.expect_string(key)?)
        }
        "ssl_default_bind_options" => {
            global.ssl_default_bind_options = value.expect_string_list(key)?
        }
        "ssl_default_server_ciphers" => {
            global.ssl_default_server_ciphers = Some(value.expect_string(key)?)
        }
        "ssl_default_server_ciphersuites" => {
            global.ssl_default_server_ciphersuites = Some(value.expect_string(key)?)
        }
        "ssl_default_server_options" => {
            global.ssl_default_server_options = value.expect_string_list(key)?
        }
        "ssl_dh_param_file" => global.ssl_dh_param_file = Some(value.expect_string(key)?),
        "ssl_server_verify" => global.ssl_server_verify = Some(value.expect_string(key)?),
        "log_tag" => global.log_tag = Some(value.expect_string(key)?),
        "log_send_hostname" => global.log_send_hostname = Some(value.expect_string(key)?),
        "stats_timeout" => global.stats_timeout = Some(value.expect_string(key)?),
        "listener_multi_queue" => global.listener_multi_queue = Some(value.expect_bool(key)?),
        "idle_pool_shared" => global.idle_pool_shared = Some(value.expect_bool(key)?),
        "ssl_keylog" => global.ssl_keylog = Some(value.expect_bool(key)?),
        "lua_load" => global.lua_load = value.expect_string_list(key)?,
        _ => return Ok(false),
    }

    Ok(true)
}

fn defaults(node: &SectionNode) -> Result<Defaults, BuildError> {
    let mut defaults = Defaults {
        name: node.name.clone(),
        ..Default::default()
    };

    for entry in classify(&node.children)? {
        // concrete servers belong to a backend, not to the defaults
        if matches!(
            entry.directive,
            Directive::Server(_) | Directive::Loop(_) | Directive::ServerTemplate(_)
        ) {
            return Err(misplaced(node, entry));
        }
        let Some(entry) = common(node, &mut defaults.common, entry)? else {
            continue;
        };
        let Some(entry) = back(node, &mut defaults.back, entry)? else {
            continue;
        };
        return Err(leftover(node, entry));
    }

    Ok(defaults)
}

fn frontend(node: &SectionNode) -> Result<Frontend, BuildError> {
    let mut frontend = Frontend {
        name: required_name(node)?,
        ..Default::default()
    };

    for entry in classify(&node.children)? {
        let Some(entry) = common(node, &mut frontend.common, entry)? else {
            continue;
        };
        let Some(entry) = front(node, &mut frontend.front, entry)? else {
            continue;
        };
        return Err(leftover(node, entry));
    }

    frontend.common.mode.get_or_insert(Mode::Http);
    Ok(frontend)
}

fn backend(node: &SectionNode) -> Result<Backend, BuildError> {
    let mut backend = Backend {
        name: required_name(node)?,
        ..Default::default()
    };

    for entry in classify(&node.children)? {
        let Some(entry) = common(node, &mut backend.common, entry)? else {
            continue;
        };
        let Some(entry) = back(node, &mut backend.back, entry)? else {
            continue;
        };
        return Err(leftover(node, entry));
    }

    backend.common.mode.get_or_insert(Mode::Http);
    backend.back.balance.get_or_insert(Balance::RoundRobin);
    Ok(backend)
}

fn listen(node: &SectionNode) -> Result<Listen, BuildError> {
    let mut listen = Listen {
        name: required_name(node)?,
        ..Default::default()
    };

    for entry in classify(&node.children)? {
        let Some(entry) = common(node, &mut listen.common, entry)? else {
            continue;
        };
        let Some(entry) = front(node, &mut listen.front, entry)? else {
            continue;
        };
        let Some(entry) = back(node, &mut listen.back, entry)? else {
            continue;
        };
        return Err(leftover(node, entry));
    }

    listen.common.mode.get_or_insert(Mode::Http);
    listen.back.balance.get_or_insert(Balance::RoundRobin);
    Ok(listen)
}

fn common(node: &SectionNode, common: &mut ProxyCommon, entry: Entry) -> Offer {
    let position = entry.position;
    match entry.directive {
        Directive::Log(target) => common.logs.push(target),
        Directive::Timeouts(timeouts) => common.timeouts.merge(timeouts),
        Directive::Options(options) => common.options.merge(options),
        Directive::Acl(acl) => common.acls.push(acl),
        Directive::Rule(rule) => common.rules.push(rule),
        Directive::StickTable(table) => {
            if common.stick_table.is_some() {
                return Err(invalid(node, "declares more than one stick table", position));
            }
            common.stick_table = Some(table);
        }
        Directive::StickRule(rule) => common.stick_rules.push(rule),
        Directive::Redirect(redirect) => common.redirects.push(redirect),
        Directive::Stats(stats) => common.stats = Some(stats),
        Directive::Compression(compression) => common.compression = Some(compression),
        Directive::ErrorPage(page) => common.error_pages.push(page),
        Directive::Pair { key, value } => {
            let convert = |source| field(node, source, position);
            match key.as_str() {
                "mode" => {
                    common.mode = Some(match value.expect_string(&key).map_err(convert)?.as_str() {
                        "http" => Mode::Http,
                        "tcp" => Mode::Tcp,
                        other => {
                            return Err(invalid(node, format!("unknown mode `{other}`"), position))
                        }
                    })
                }
                "description" => {
                    common.description = Some(value.expect_string(&key).map_err(convert)?)
                }
                "disabled" => common.disabled = value.expect_bool(&key).map_err(convert)?,
                "maxconn" => common.maxconn = Some(value.expect_u32(&key).map_err(convert)?),
                "log_global" => common.log_global = value.expect_bool(&key).map_err(convert)?,
                "log_format" => {
                    common.log_format = Some(value.expect_string(&key).map_err(convert)?)
                }
                "unique_id_format" => {
                    common.unique_id_format = Some(value.expect_string(&key).map_err(convert)?)
                }
                "unique_id_header" => {
                    common.unique_id_header = Some(value.expect_string(&key).map_err(convert)?)
                }
                _ => {
                    return Ok(Some(Entry {
                        directive: Directive::Pair { key, value },
                        position,
                    }))
                }
            }
        }
        directive => return Ok(Some(Entry { directive, position })),
    }

    Ok(None)
}

fn front(node: &SectionNode, front: &mut FrontSide, entry: Entry) -> Offer {
    let position = entry.position;
    match entry.directive {
        Directive::Bind(bind) => front.binds.push(bind),
        Directive::UseBackend(rule) => front.use_backends.push(rule),
        Directive::Pair { key, value } => {
            let convert = |source| field(node, source, position);
            match key.as_str() {
                "default_backend" => {
                    front.default_backend = Some(value.expect_string(&key).map_err(convert)?)
                }
                "monitor_uri" => {
                    front.monitor_uri = Some(value.expect_string(&key).map_err(convert)?)
                }
                _ => {
                    return Ok(Some(Entry {
                        directive: Directive::Pair { key, value },
                        position,
                    }))
                }
            }
        }
        directive => return Ok(Some(Entry { directive, position })),
    }

    Ok(None)
}

fn back(node: &SectionNode, back: &mut BackSide, entry: Entry) -> Offer {
    let position = entry.position;
    match entry.directive {
        Directive::Server(server) => back.servers.push(server),
        Directive::Loop(server_loop) => back.loops.push(server_loop),
        Directive::ServerTemplate(template) => back.server_templates.push(template),
        Directive::DefaultServer(params) => back.default_server = Some(params),
        Directive::UseServer(rule) => back.use_servers.push(rule),
        Directive::Cookie(cookie) => back.cookie = Some(cookie),
        Directive::HealthCheck(check) => back.health_check = Some(check),
        Directive::Pair { key, value } => {
            let convert = |source| field(node, source, position);
            match key.as_str() {
                "balance" => {
                    back.balance = Some(Balance::parse(
                        &value.expect_string(&key).map_err(convert)?,
                    ))
                }
                "hash_type" => back.hash_type = Some(value.expect_string(&key).map_err(convert)?),
                "retries" => back.retries = Some(value.expect_u32(&key).map_err(convert)?),
                "http_reuse" => {
                    back.http_reuse = Some(value.expect_string(&key).map_err(convert)?)
                }
                "fullconn" => back.fullconn = Some(value.expect_u32(&key).map_err(convert)?),
                _ => {
                    return Ok(Some(Entry {
                        directive: Directive::Pair { key, value },
                        position,
                    }))
                }
            }
        }
        directive => return Ok(Some(Entry { directive, position })),
    }

    Ok(None)
}

fn peers(node: &SectionNode) -> Result<Peers, BuildError> {
    let mut peers = Peers {
        name: required_name(node)?,
        peers: vec![],
    };

    for entry in classify(&node.children)? {
        match entry.directive {
            Directive::Peer(peer) => peers.peers.push(peer),
            _ => return Err(misplaced(node, entry)),
        }
    }

    Ok(peers)
}

fn resolvers(node: &SectionNode) -> Result<Resolvers, BuildError> {
    let mut resolvers = Resolvers {
        name: required_name(node)?,
        ..Default::default()
    };

    for entry in classify(&node.children)? {
        let position = entry.position;
        match entry.directive {
            Directive::Nameserver(nameserver) => resolvers.nameservers.push(nameserver),
            Directive::Hold(hold) => resolvers.hold.extend(hold),
            Directive::Pair { key, value } => {
                let convert = |source| field(node, source, position);
                match key.as_str() {
                    "parse_resolv_conf" => {
                        resolvers.parse_resolv_conf = value.expect_bool(&key).map_err(convert)?
                    }
                    "resolve_retries" => {
                        resolvers.resolve_retries =
                            Some(value.expect_u32(&key).map_err(convert)?)
                    }
                    "timeout_resolve" => {
                        resolvers.timeout_resolve =
                            Some(value.expect_string(&key).map_err(convert)?)
                    }
                    "timeout_retry" => {
                        resolvers.timeout_retry = Some(value.expect_string(&key).map_err(convert)?)
                    }
                    "accepted_payload_size" => {
                        resolvers.accepted_payload_size =
                            Some(value.expect_u32(&key).map_err(convert)?)
                    }
                    _ => return Err(unknown_key(node, key, position)),
                }
            }
            directive => return Err(misplaced(node, Entry { directive, position })),
        }
    }

    Ok(resolvers)
}

fn mailers(node: &SectionNode) -> Result<Mailers, BuildError> {
    let mut mailers = Mailers {
        name: required_name(node)?,
        mailers: vec![],
        timeout_mail: None,
    };

    for entry in classify(&node.children)? {
        let position = entry.position;
        match entry.directive {
            Directive::Mailer(mailer) => mailers.mailers.push(mailer),
            Directive::Pair { key, value } if key == "timeout_mail" => {
                mailers.timeout_mail = Some(
                    value
                        .expect_string(&key)
                        .map_err(|source| field(node, source, position))?,
                )
            }
            Directive::Pair { key, .. } => return Err(unknown_key(node, key, position)),
            directive => return Err(misplaced(node, Entry { directive, position })),
        }
    }

    Ok(mailers)
}

fn script(node: &SectionNode) -> Result<Script, BuildError> {
    let name = required_name(node)?;
    let mut fields = Fields::from_children("script", &node.children, node.position)?;

    let kind = match fields.string("kind")?.as_deref() {
        None | Some("lua") => ScriptKind::Lua,
        Some(other) => return Err(fields.invalid(format!("unsupported script kind `{other}`"))),
    };
    let path = fields.string("path")?;
    let source = fields.string("source")?;
    if path.is_none() && source.is_none() {
        return Err(fields.missing("`path` or `source`"));
    }

    fields.finish()?;
    Ok(Script {
        name,
        kind,
        path,
        source,
    })
}

fn required_name(node: &SectionNode) -> Result<String, BuildError> {
    node.name.clone().ok_or_else(|| BuildError::Missing {
        directive: node.kind.clone(),
        what: "a name".to_string(),
        at: At(node.position),
    })
}

fn no_name(node: &SectionNode) -> Result<(), BuildError> {
    match node.name {
        None => Ok(()),
        Some(_) => Err(invalid(node, "takes no name", node.position)),
    }
}

fn duplicate(node: &SectionNode) -> BuildError {
    BuildError::DuplicateSection {
        kind: node.kind.clone(),
        at: At(node.position),
    }
}

fn section_label(node: &SectionNode) -> String {
    match &node.name {
        Some(name) => format!("{} `{name}`", node.kind),
        None => format!("`{}`", node.kind),
    }
}

fn misplaced(node: &SectionNode, entry: Entry) -> BuildError {
    BuildError::Misplaced {
        directive: entry.directive.name().to_string(),
        section: section_label(node),
        at: At(entry.position.or(node.position)),
    }
}

/// Pairs any proxy section understands
const PROXY_KEYS: &[&str] = &[
    "mode",
    "description",
    "disabled",
    "maxconn",
    "log_global",
    "log_format",
    "unique_id_format",
    "unique_id_header",
    "default_backend",
    "monitor_uri",
    "balance",
    "hash_type",
    "retries",
    "http_reuse",
    "fullconn",
];

/// Whatever no part of a proxy section absorbed
///
/// A key that belongs to another kind of proxy section is misplaced,
/// anything else is unknown.
fn leftover(node: &SectionNode, entry: Entry) -> BuildError {
    if let Directive::Pair { key, .. } = &entry.directive {
        if !PROXY_KEYS.contains(&key.as_str()) {
            return unknown_key(node, key.clone(), entry.position);
        }
    }
    misplaced(node, entry)
}

fn unknown_key(node: &SectionNode, key: String, position: Option<Position>) -> BuildError {
    BuildError::UnknownKey {
        key,
        directive: node.kind.clone(),
        at: At(position.or(node.position)),
    }
}

fn field(node: &SectionNode, source: FieldError, position: Option<Position>) -> BuildError {
    BuildError::Field {
        directive: node.kind.clone(),
        source,
        at: At(position.or(node.position)),
    }
}

fn invalid(node: &SectionNode, message: impl Into<String>, position: Option<Position>) -> BuildError {
    BuildError::Invalid {
        directive: node.kind.clone(),
        message: message.into(),
        at: At(position.or(node.position)),
    }
}
