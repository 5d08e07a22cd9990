//! defaults, frontend, backend and listen sections
use super::global::log_target;
use super::{address, quote, rules, server, Line, Writer};
use crate::ir::*;

pub(super) fn defaults(writer: &mut Writer, defaults: &Defaults) {
    match &defaults.name {
        Some(name) => writer.section(format_args!("defaults {name}")),
        None => writer.section("defaults"),
    }
    proxy(writer, &defaults.common, None, Some(&defaults.back));
}

pub(super) fn frontend(writer: &mut Writer, frontend: &Frontend) {
    writer.section(format_args!("frontend {}", frontend.name));
    proxy(writer, &frontend.common, Some(&frontend.front), None);
}

pub(super) fn backend(writer: &mut Writer, backend: &Backend) {
    writer.section(format_args!("backend {}", backend.name));
    proxy(writer, &backend.common, None, Some(&backend.back));
}

pub(super) fn listen(writer: &mut Writer, listen: &Listen) {
    writer.section(format_args!("listen {}", listen.name));
    proxy(writer, &listen.common, Some(&listen.front), Some(&listen.back));
}

/// The body of any proxy section, family by family
fn proxy(
    writer: &mut Writer,
    common: &ProxyCommon,
    front: Option<&FrontSide>,
    back: Option<&BackSide>,
) {
    writer.opt("description", &common.description);
    writer.flag("disabled", common.disabled);
    writer.opt("mode", &common.mode.map(|mode| mode.keyword()));

    if let Some(front) = front {
        for bind in &front.binds {
            writer.line(self::bind(bind));
        }
    }
    writer.opt("maxconn", &common.maxconn);
    if let Some(front) = front {
        writer.opt("monitor-uri", &front.monitor_uri);
    }

    writer.flag("log global", common.log_global);
    for target in &common.logs {
        writer.line(log_target(target));
    }
    writer.opt("log-format", &common.log_format.as_deref().map(quote));
    writer.opt(
        "unique-id-format",
        &common.unique_id_format.as_deref().map(quote),
    );
    writer.opt("unique-id-header", &common.unique_id_header);

    for (name, value) in common.timeouts.entries() {
        writer.opt(&format!("timeout {name}"), value);
    }
    options(writer, &common.options);

    if let Some(back) = back {
        writer.opt("balance", &back.balance.as_ref().map(Balance::as_str));
        writer.opt("hash-type", &back.hash_type);
        writer.opt("retries", &back.retries);
        writer.opt("http-reuse", &back.http_reuse);
        writer.opt("fullconn", &back.fullconn);
        if let Some(cookie) = &back.cookie {
            writer.line(self::cookie(cookie));
        }
        if let Some(check) = &back.health_check {
            health_check(writer, check);
        }
    }

    for acl in &common.acls {
        writer.line(self::acl(acl));
    }
    if let Some(table) = &common.stick_table {
        writer.line(stick_table(table));
    }
    for rule in common.rules.iter() {
        writer.line(rules::rule(rule));
    }
    for rule in &common.stick_rules {
        writer.line(stick_rule(rule));
    }
    for redirect in &common.redirects {
        writer.line(self::redirect(redirect));
    }
    if let Some(stats) = &common.stats {
        self::stats(writer, stats);
    }
    if let Some(compression) = &common.compression {
        self::compression(writer, compression);
    }
    for page in &common.error_pages {
        writer.line(format_args!(
            "{} {} {}",
            page.kind.keyword(),
            page.code,
            page.target
        ));
    }

    if let Some(front) = front {
        for rule in &front.use_backends {
            writer.line(
                Line::new("use_backend")
                    .word(&rule.backend)
                    .condition(&rule.condition),
            );
        }
        writer.opt("default_backend", &front.default_backend);
    }

    if let Some(back) = back {
        for rule in &back.use_servers {
            writer.line(
                Line::new("use-server")
                    .word(&rule.server)
                    .condition(&rule.condition),
            );
        }
        if let Some(line) =
            server::default_server(back.default_server.as_ref(), back.health_check.as_ref())
        {
            writer.line(line);
        }
        for template in &back.server_templates {
            writer.line(server::server_template(template));
        }
        for member in &back.servers {
            writer.line(server::server(member));
        }
    }
}

fn bind(bind: &Bind) -> Line {
    let mut line = Line::new("bind")
        .word(address(&bind.address, bind.port))
        .flag("ssl", bind.ssl);
    for crt in &bind.crt {
        line = line.word("crt").word(crt);
    }
    let alpn = (!bind.alpn.is_empty()).then(|| bind.alpn.join(","));

    line.opt("crt-list", &bind.crt_list)
        .opt("ca-file", &bind.ca_file)
        .opt("verify", &bind.verify)
        .opt("alpn", &alpn)
        .opt("ciphers", &bind.ciphers)
        .opt("ciphersuites", &bind.ciphersuites)
        .opt("ssl-min-ver", &bind.ssl_min_ver)
        .opt("ssl-max-ver", &bind.ssl_max_ver)
        .flag("strict-sni", bind.strict_sni)
        .flag("accept-proxy", bind.accept_proxy)
        .flag("transparent", bind.transparent)
        .flag("v4v6", bind.v4v6)
        .flag("v6only", bind.v6only)
        .flag("defer-accept", bind.defer_accept)
        .flag("tfo", bind.tfo)
        .flag("allow-0rtt", bind.allow_0rtt)
        .opt("interface", &bind.interface)
        .opt("name", &bind.name)
        .opt("mode", &bind.mode)
        .opt("user", &bind.user)
        .opt("group", &bind.group)
        .opt("level", &bind.level)
        .opt("maxconn", &bind.maxconn)
}

fn options(writer: &mut Writer, options: &ProxyOptions) {
    for option in options.enabled() {
        match (option, &options.forwardfor_except) {
            ("forwardfor", Some(except)) => {
                writer.line(format_args!("option forwardfor except {except}"))
            }
            _ => writer.line(format_args!("option {option}")),
        }
    }
}

fn cookie(cookie: &Cookie) -> Line {
    Line::new("cookie")
        .word(&cookie.name)
        .maybe(&cookie.mode)
        .flag("indirect", cookie.indirect)
        .flag("nocache", cookie.nocache)
        .flag("httponly", cookie.httponly)
        .flag("secure", cookie.secure)
        .opt("domain", &cookie.domain)
        .opt("maxidle", &cookie.maxidle)
        .opt("maxlife", &cookie.maxlife)
}

fn health_check(writer: &mut Writer, check: &HealthCheck) {
    match check.kind {
        CheckKind::Http => {
            let mut line = Line::new("option httpchk");
            if check.method.is_some() || check.uri.is_some() {
                line = line
                    .word(check.method.as_deref().unwrap_or("GET"))
                    .word(check.uri.as_deref().unwrap_or("/"))
                    .maybe(&check.version);
            }
            writer.line(line);
            writer.opt("http-check send hdr Host", &check.host);
            writer.opt("http-check expect", &check.expect);
            writer.flag("http-check disable-on-404", check.disable_on_404);
        }
        CheckKind::Tcp => {
            writer.line("option tcp-check");
            writer.opt("tcp-check expect", &check.expect);
        }
        CheckKind::SslHello => writer.line("option ssl-hello-chk"),
        CheckKind::Mysql => writer.line(Line::new("option mysql-check").opt("user", &check.user)),
        CheckKind::Pgsql => writer.line(Line::new("option pgsql-check").opt("user", &check.user)),
        CheckKind::Redis => writer.line("option redis-check"),
        CheckKind::Smtp => writer.line("option smtpchk"),
        CheckKind::Ldap => writer.line("option ldap-check"),
    }
}

fn acl(acl: &Acl) -> Line {
    let mut line = Line::new("acl").word(&acl.name).word(&acl.criterion);
    for word in acl.flags.iter().chain(&acl.values) {
        line = line.word(word);
    }
    line
}

fn stick_table(table: &StickTable) -> Line {
    let store = (!table.store.is_empty()).then(|| table.store.join(","));
    Line::new("stick-table")
        .word("type")
        .word(&table.kind)
        .opt("len", &table.len)
        .word("size")
        .word(&table.size)
        .opt("expire", &table.expire)
        .flag("nopurge", table.nopurge)
        .opt("peers", &table.peers)
        .opt("store", &store)
}

fn stick_rule(rule: &StickRule) -> Line {
    Line::new("stick")
        .word(rule.kind.keyword())
        .word(&rule.pattern)
        .opt("table", &rule.table)
        .condition(&rule.condition)
}

fn redirect(redirect: &Redirect) -> Line {
    Line::new("redirect")
        .word(redirect.kind.keyword())
        .word(&redirect.target)
        .opt("code", &redirect.code)
        .flag("drop-query", redirect.drop_query)
        .flag("append-slash", redirect.append_slash)
        .opt("set-cookie", &redirect.set_cookie)
        .condition(&redirect.condition)
}

fn stats(writer: &mut Writer, stats: &Stats) {
    writer.flag("stats enable", stats.enable);
    writer.opt("stats uri", &stats.uri);
    writer.opt(
        "stats realm",
        &stats.realm.as_ref().map(|realm| realm.replace(' ', "\\ ")),
    );
    for credentials in &stats.auth {
        writer.line(format_args!("stats auth {credentials}"));
    }
    writer.opt("stats refresh", &stats.refresh);
    writer.flag("stats hide-version", stats.hide_version);
    writer.flag("stats show-legends", stats.show_legends);
    writer.flag("stats show-node", stats.show_node);
    if let Some(condition) = &stats.admin {
        writer.line(Line::new("stats admin").condition(&Some(condition.clone())));
    }
    for scope in &stats.scope {
        writer.line(format_args!("stats scope {scope}"));
    }
}

fn compression(writer: &mut Writer, compression: &Compression) {
    if !compression.algo.is_empty() {
        writer.line(format_args!("compression algo {}", compression.algo.join(" ")));
    }
    if !compression.types.is_empty() {
        writer.line(format_args!("compression type {}", compression.types.join(" ")));
    }
    writer.flag("compression offload", compression.offload);
}

#[cfg(test)]
mod test {
    use super::*;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn render(write: impl FnOnce(&mut Writer)) -> String {
        let mut writer = Writer::default();
        write(&mut writer);
        writer.text
    }

    #[test]
    fn frontend_family_order() {
        let mut frontend = Frontend {
            name: "web".to_string(),
            ..Default::default()
        };
        frontend.common.mode = Some(Mode::Http);
        frontend.common.log_global = true;
        frontend.common.timeouts.client = Some("30s".to_string());
        frontend.common.options.httplog = true;
        frontend.common.options.forwardfor = true;
        frontend.common.options.forwardfor_except = Some("127.0.0.0/8".to_string());
        frontend.common.acls.push(Acl {
            name: "is_api".to_string(),
            criterion: "path_beg".to_string(),
            flags: vec!["-i".to_string()],
            values: vec!["/api".to_string()],
        });
        frontend.common.rules.push(Rule {
            kind: RuleKind::HttpRequest,
            action: "set_header".to_string(),
            params: IndexMap::from([
                ("name".to_string(), "X-Forwarded-Proto".to_string()),
                ("value".to_string(), "https".to_string()),
            ]),
            condition: None,
        });
        frontend.common.rules.push(Rule {
            kind: RuleKind::TcpRequest,
            action: "inspect_delay".to_string(),
            params: IndexMap::from([("timeout".to_string(), "5s".to_string())]),
            condition: None,
        });
        frontend.front.binds.push(Bind {
            address: "*".to_string(),
            port: Some(443),
            ssl: true,
            crt: vec!["/etc/ssl/site.pem".to_string()],
            alpn: vec!["h2".to_string(), "http/1.1".to_string()],
            ..Default::default()
        });
        frontend.front.use_backends.push(UseBackend {
            backend: "api".to_string(),
            condition: Some("is_api".to_string()),
        });
        frontend.front.default_backend = Some("app".to_string());

        assert_eq!(
            render(|writer| self::frontend(writer, &frontend)),
            "frontend web
    mode http
    bind *:443 ssl crt /etc/ssl/site.pem alpn h2,http/1.1
    log global
    timeout client 30s
    option httplog
    option forwardfor except 127.0.0.0/8
    acl is_api path_beg -i /api
    tcp-request inspect delay timeout 5s
    http-request set-header X-Forwarded-Proto https
    use_backend api if is_api
    default_backend app
"
        );
    }

    #[test]
    fn backend_with_health_check() {
        let mut backend = Backend {
            name: "app".to_string(),
            ..Default::default()
        };
        backend.common.mode = Some(Mode::Http);
        backend.back.balance = Some(Balance::RoundRobin);
        let mut check = HealthCheck::new(CheckKind::Http);
        check.method = Some("GET".to_string());
        check.uri = Some("/health".to_string());
        check.expect = Some("status 200".to_string());
        backend.back.health_check = Some(check);
        backend.back.cookie = Some(Cookie {
            name: "SRV".to_string(),
            mode: Some("insert".to_string()),
            indirect: true,
            nocache: true,
            httponly: false,
            secure: false,
            domain: None,
            maxidle: None,
            maxlife: None,
        });
        let mut web = Server::new("web1", "10.0.1.1");
        web.port = Some(8080);
        web.params.check = Some(true);
        web.params.cookie = Some("w1".to_string());
        backend.back.servers.push(web);

        assert_eq!(
            render(|writer| self::backend(writer, &backend)),
            "backend app
    mode http
    balance roundrobin
    cookie SRV insert indirect nocache
    option httpchk GET /health
    http-check expect status 200
    server web1 10.0.1.1:8080 check cookie w1
"
        );
    }

    #[test]
    fn stats_and_error_pages() {
        let mut listen = Listen {
            name: "stats".to_string(),
            ..Default::default()
        };
        listen.front.binds.push(Bind {
            address: "*".to_string(),
            port: Some(8404),
            ..Default::default()
        });
        listen.common.stats = Some(Stats {
            enable: true,
            uri: Some("/stats".to_string()),
            realm: Some("HAProxy Statistics".to_string()),
            auth: vec!["admin:s3cret".to_string()],
            admin: Some("LOCALHOST".to_string()),
            ..Default::default()
        });
        listen.common.error_pages.push(ErrorPage {
            code: 503,
            kind: ErrorPageKind::File,
            target: "/etc/haproxy/errors/503.http".to_string(),
        });

        assert_eq!(
            render(|writer| self::listen(writer, &listen)),
            "listen stats
    bind *:8404
    stats enable
    stats uri /stats
    stats realm HAProxy\\ Statistics
    stats auth admin:s3cret
    stats admin if LOCALHOST
    errorfile 503 /etc/haproxy/errors/503.http
"
        );
    }

    #[test]
    fn stick_tables_and_redirects() {
        let mut frontend = Frontend {
            name: "edge".to_string(),
            ..Default::default()
        };
        frontend.common.stick_table = Some(StickTable {
            kind: "ip".to_string(),
            len: None,
            size: "100k".to_string(),
            expire: Some("30s".to_string()),
            nopurge: false,
            peers: None,
            store: vec!["http_req_rate(10s)".to_string()],
        });
        frontend.common.stick_rules.push(StickRule {
            kind: StickRuleKind::On,
            pattern: "src".to_string(),
            table: None,
            condition: None,
        });
        frontend.common.redirects.push(Redirect {
            kind: RedirectKind::Scheme,
            target: "https".to_string(),
            code: Some(301),
            drop_query: false,
            append_slash: false,
            set_cookie: None,
            condition: Some("!{ ssl_fc }".to_string()),
        });

        assert_eq!(
            render(|writer| self::frontend(writer, &frontend)),
            "frontend edge
    stick-table type ip size 100k expire 30s store http_req_rate(10s)
    stick on src
    redirect scheme https code 301 if !{ ssl_fc }
"
        );
    }

    #[test]
    fn named_defaults() {
        let defaults = Defaults {
            name: Some("base".to_string()),
            ..Default::default()
        };

        assert_eq!(render(|writer| self::defaults(writer, &defaults)), "defaults base\n");
    }
}
