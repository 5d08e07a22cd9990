use super::VisitMut;
use crate::ir::*;
use crate::value::Value;
use indexmap::IndexMap;

/// Recursively visit all string-valued fields mutably
///
/// Pending loop bodies and design-time entities (variables, templates) are
/// not part of the walk; the passes that own them visit them explicitly.
pub trait VisitStringsMut {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>);
}

impl VisitStringsMut for String {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        visitor.visit_mut(self);
    }
}

impl<T: VisitStringsMut> VisitStringsMut for Option<T> {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        if let Some(inner) = self {
            inner.visit_strings_mut(visitor);
        }
    }
}

impl<T: VisitStringsMut> VisitStringsMut for Vec<T> {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        for element in self {
            element.visit_strings_mut(visitor);
        }
    }
}

/// Only values are visited, keys are directive names
impl<T: VisitStringsMut> VisitStringsMut for IndexMap<String, T> {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        for value in self.values_mut() {
            value.visit_strings_mut(visitor);
        }
    }
}

impl VisitStringsMut for Value {
    fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
        match self {
            Value::String(s) => visitor.visit_mut(s),
            Value::Array(array) => array.visit_strings_mut(visitor),
            Value::Object(object) => object.visit_strings_mut(visitor),
            Value::Boolean(_) | Value::Integer(_) | Value::Decimal(_) => {}
        }
    }
}

/// Implements [VisitStringsMut] for a struct by visiting the listed fields
macro_rules! visit_fields {
    ($ty:ty => $($field:ident),* $(,)?) => {
        impl VisitStringsMut for $ty {
            fn visit_strings_mut(&mut self, visitor: &mut dyn VisitMut<String>) {
                $(self.$field.visit_strings_mut(visitor);)*
            }
        }
    };
}

visit_fields!(RootConfig => global, defaults, frontends, backends, listens, scripts, peers, resolvers, mailers);
visit_fields!(Global => user, group, chroot, pidfile, cpu_map, hard_stop_after, description,
    ca_base, crt_base, ssl_default_bind_ciphers, ssl_default_bind_ciphersuites,
    ssl_default_bind_options, ssl_default_server_ciphers, ssl_default_server_ciphersuites,
    ssl_default_server_options, ssl_dh_param_file, ssl_server_verify, logs, log_tag,
    log_send_hostname, stats_sockets, stats_timeout, tune, setenv, lua_load);
visit_fields!(Defaults => name, common, back);
visit_fields!(Frontend => name, common, front);
visit_fields!(Backend => name, common, back);
visit_fields!(Listen => name, common, front, back);
visit_fields!(ProxyCommon => description, logs, log_format, unique_id_format, unique_id_header,
    timeouts, options, acls, rules, stick_table, stick_rules, redirects, stats, compression,
    error_pages);
visit_fields!(FrontSide => binds, monitor_uri, use_backends, default_backend);
visit_fields!(BackSide => hash_type, cookie, http_reuse, health_check, use_servers,
    default_server, server_templates, servers);
visit_fields!(Timeouts => connect, client, server, http_request, http_keep_alive, queue, tunnel,
    check, client_fin, server_fin, tarpit);
visit_fields!(ProxyOptions => forwardfor_except);
visit_fields!(Bind => address, crt, crt_list, ca_file, verify, alpn, ciphers, ciphersuites,
    ssl_min_ver, ssl_max_ver, interface, name, mode, user, group, level);
visit_fields!(Acl => name, criterion, flags, values);
visit_fields!(Rule => action, params, condition);
visit_fields!(RuleSet => http_request, http_response, http_after_response, tcp_request,
    tcp_response, http_check, tcp_check);
visit_fields!(UseBackend => backend, condition);
visit_fields!(UseServer => server, condition);
visit_fields!(Redirect => target, set_cookie, condition);
visit_fields!(StickTable => kind, size, expire, peers, store);
visit_fields!(StickRule => pattern, table, condition);
visit_fields!(Compression => algo, types);
visit_fields!(ErrorPage => target);
visit_fields!(Stats => uri, realm, auth, refresh, admin, scope);
visit_fields!(LogTarget => address, facility, level, min_level, format);
visit_fields!(StatsSocket => path, mode, level, user, group);
visit_fields!(Server => name, address, params);
visit_fields!(ServerParams => inter, fastinter, downinter, verify, ca_file, crt, sni, alpn,
    ciphers, ssl_min_ver, cookie, resolvers, resolve_prefer, init_addr, slowstart, agent_inter,
    track, observe, on_error, on_marked_down, proto, source);
visit_fields!(ServerTemplate => prefix, count, fqdn, params);
visit_fields!(HealthCheck => method, uri, version, host, expect, user, inter);
visit_fields!(Cookie => name, mode, domain, maxidle, maxlife);
visit_fields!(Script => name, path);
visit_fields!(Endpoint => name, address);
visit_fields!(Peers => name, peers);
visit_fields!(Resolvers => name, nameservers, timeout_resolve, timeout_retry, hold);
visit_fields!(Mailers => name, mailers, timeout_mail);
