//! server, server-template and default-server lines
use super::{address, Line};
use crate::ir::{HealthCheck, Server, ServerParams, ServerTemplate};

fn enabled(value: Option<bool>) -> bool {
    value == Some(true)
}

/// Append the parameters, always in the same order
pub(super) fn params(line: Line, params: &ServerParams) -> Line {
    line.flag("check", enabled(params.check))
        .flag("check-ssl", enabled(params.check_ssl))
        .opt("port", &params.check_port)
        .opt("inter", &params.inter)
        .opt("fastinter", &params.fastinter)
        .opt("downinter", &params.downinter)
        .opt("rise", &params.rise)
        .opt("fall", &params.fall)
        .opt("weight", &params.weight)
        .opt("maxconn", &params.maxconn)
        .opt("maxqueue", &params.maxqueue)
        .opt("minconn", &params.minconn)
        .flag("backup", enabled(params.backup))
        .flag("disabled", enabled(params.disabled))
        .flag("ssl", enabled(params.ssl))
        .opt("verify", &params.verify)
        .opt("ca-file", &params.ca_file)
        .opt("crt", &params.crt)
        .opt("sni", &params.sni)
        .opt("alpn", &params.alpn.as_ref().map(|alpn| alpn.join(",")))
        .opt("ciphers", &params.ciphers)
        .opt("ssl-min-ver", &params.ssl_min_ver)
        .flag("send-proxy", enabled(params.send_proxy))
        .flag("send-proxy-v2", enabled(params.send_proxy_v2))
        .opt("cookie", &params.cookie)
        .opt("resolvers", &params.resolvers)
        .opt("resolve-prefer", &params.resolve_prefer)
        .opt("init-addr", &params.init_addr)
        .opt("slowstart", &params.slowstart)
        .flag("agent-check", enabled(params.agent_check))
        .opt("agent-port", &params.agent_port)
        .opt("agent-inter", &params.agent_inter)
        .opt("track", &params.track)
        .opt("observe", &params.observe)
        .opt("error-limit", &params.error_limit)
        .opt("on-error", &params.on_error)
        .opt("on-marked-down", &params.on_marked_down)
        .opt("proto", &params.proto)
        .opt("source", &params.source)
        .flag("tfo", enabled(params.tfo))
}

pub(super) fn server(server: &Server) -> Line {
    let line = Line::new("server")
        .word(&server.name)
        .word(address(&server.address, server.port));
    params(line, &server.params)
}

pub(super) fn server_template(template: &ServerTemplate) -> Line {
    let line = Line::new("server-template")
        .word(&template.prefix)
        .word(&template.count)
        .word(address(&template.fqdn, template.port));
    params(line, &template.params)
}

/// The `default-server` line, if there is anything to put on it
///
/// Timing set on the health check goes here too, for every slot the
/// author's `default_server` leaves open. Rise and fall equal to the
/// engine's own defaults are not repeated. Server lines never receive
/// either; the engine applies the defaults at runtime.
pub(super) fn default_server(defaults: Option<&ServerParams>, check: Option<&HealthCheck>) -> Option<Line> {
    let mut defaults = defaults.cloned();

    if let Some(check) = check {
        let timing = ServerParams {
            inter: check.inter.clone(),
            rise: (check.rise != HealthCheck::DEFAULT_RISE).then_some(check.rise),
            fall: (check.fall != HealthCheck::DEFAULT_FALL).then_some(check.fall),
            ..Default::default()
        };
        if timing != ServerParams::default() {
            let defaults = defaults.get_or_insert_with(ServerParams::default);
            defaults.inter = defaults.inter.take().or(timing.inter);
            defaults.rise = defaults.rise.or(timing.rise);
            defaults.fall = defaults.fall.or(timing.fall);
        }
    }

    defaults.map(|defaults| params(Line::new("default-server"), &defaults))
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::CheckKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn template_values_render_like_explicit_ones() {
        let mut web = Server::new("web1", "10.0.1.1");
        web.port = Some(8080);
        web.params.check = Some(true);
        web.params.inter = Some("3s".to_string());

        assert_eq!(
            server(&web).to_string(),
            "server web1 10.0.1.1:8080 check inter 3s"
        );
    }

    #[test]
    fn false_flags_are_omitted() {
        let mut web = Server::new("web1", "10.0.1.1");
        web.params.check = Some(false);
        web.params.backup = Some(true);
        web.params.alpn = Some(vec!["h2".to_string(), "http/1.1".to_string()]);

        assert_eq!(
            server(&web).to_string(),
            "server web1 10.0.1.1 backup alpn h2,http/1.1"
        );
    }

    #[test]
    fn servers_carry_only_their_own_fields() {
        let mut check = HealthCheck::new(CheckKind::Http);
        check.inter = Some("2s".to_string());
        let defaults = ServerParams {
            rise: Some(5),
            fall: Some(1),
            ..Default::default()
        };
        let mut checked = Server::new("web1", "10.0.0.1");
        checked.params.check = Some(true);

        assert_eq!(
            server(&checked).to_string(),
            "server web1 10.0.0.1 check"
        );
        assert_eq!(
            default_server(Some(&defaults), Some(&check)).map(|line| line.to_string()),
            Some("default-server inter 2s rise 5 fall 1".to_string())
        );
    }

    #[test]
    fn check_timing_goes_to_default_server() {
        let mut check = HealthCheck::new(CheckKind::Http);
        assert!(default_server(None, Some(&check)).is_none());

        check.fall = 5;
        assert_eq!(
            default_server(None, Some(&check)).map(|line| line.to_string()),
            Some("default-server fall 5".to_string())
        );

        let defaults = ServerParams {
            fall: Some(2),
            ..Default::default()
        };
        assert_eq!(
            default_server(Some(&defaults), Some(&check)).map(|line| line.to_string()),
            Some("default-server fall 2".to_string())
        );
    }

    #[test]
    fn server_templates_and_default_server() {
        let template = ServerTemplate {
            prefix: "srv".to_string(),
            count: "1-5".to_string(),
            fqdn: "app.service.consul".to_string(),
            port: Some(80),
            params: ServerParams {
                resolvers: Some("dns".to_string()),
                ..Default::default()
            },
        };
        assert_eq!(
            server_template(&template).to_string(),
            "server-template srv 1-5 app.service.consul:80 resolvers dns"
        );

        let defaults = ServerParams {
            maxconn: Some(100),
            slowstart: Some("30s".to_string()),
            ..Default::default()
        };
        assert_eq!(
            default_server(Some(&defaults), None).map(|line| line.to_string()),
            Some("default-server maxconn 100 slowstart 30s".to_string())
        );
    }
}
