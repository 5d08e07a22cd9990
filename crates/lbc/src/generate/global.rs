//! the global section
use super::{Line, Writer};
use crate::ir::{Global, LogTarget, Script, StatsSocket};

pub(super) fn log_target(target: &LogTarget) -> Line {
    Line::new("log")
        .word(&target.address)
        .opt("len", &target.length)
        .opt("format", &target.format)
        .word(&target.facility)
        .maybe(&target.level)
        .maybe(&target.min_level)
}

fn stats_socket(socket: &StatsSocket) -> Line {
    Line::new("stats socket")
        .word(&socket.path)
        .opt("mode", &socket.mode)
        .opt("level", &socket.level)
        .opt("user", &socket.user)
        .opt("group", &socket.group)
        .flag("expose-fd listeners", socket.expose_fd_listeners)
}

/// Write the global section; scripts are loaded from here
pub(super) fn write(writer: &mut Writer, global: &Global, scripts: &[Script]) {
    writer.section("global");

    // process management
    writer.flag("daemon", global.daemon);
    writer.flag("master-worker", global.master_worker);
    writer.opt("user", &global.user);
    writer.opt("group", &global.group);
    writer.opt("uid", &global.uid);
    writer.opt("gid", &global.gid);
    writer.opt("chroot", &global.chroot);
    writer.opt("pidfile", &global.pidfile);
    writer.opt("nbthread", &global.nbthread);
    for cpu_map in &global.cpu_map {
        writer.line(format_args!("cpu-map {cpu_map}"));
    }
    writer.flag("insecure-fork-wanted", global.insecure_fork_wanted);
    writer.opt("description", &global.description);
    writer.opt("hard-stop-after", &global.hard_stop_after);

    // limits
    writer.opt("maxconn", &global.maxconn);
    writer.opt("maxconnrate", &global.maxconnrate);
    writer.opt("maxsessrate", &global.maxsessrate);
    writer.opt("maxsslconn", &global.maxsslconn);
    writer.opt("maxsslrate", &global.maxsslrate);
    writer.opt("ulimit-n", &global.ulimit_n);
    writer.opt("spread-checks", &global.spread_checks);

    // ssl
    writer.opt("ca-base", &global.ca_base);
    writer.opt("crt-base", &global.crt_base);
    writer.opt("ssl-default-bind-ciphers", &global.ssl_default_bind_ciphers);
    writer.opt(
        "ssl-default-bind-ciphersuites",
        &global.ssl_default_bind_ciphersuites,
    );
    if !global.ssl_default_bind_options.is_empty() {
        writer.line(format_args!(
            "ssl-default-bind-options {}",
            global.ssl_default_bind_options.join(" ")
        ));
    }
    writer.opt(
        "ssl-default-server-ciphers",
        &global.ssl_default_server_ciphers,
    );
    writer.opt(
        "ssl-default-server-ciphersuites",
        &global.ssl_default_server_ciphersuites,
    );
    if !global.ssl_default_server_options.is_empty() {
        writer.line(format_args!(
            "ssl-default-server-options {}",
            global.ssl_default_server_options.join(" ")
        ));
    }
    writer.opt("ssl-dh-param-file", &global.ssl_dh_param_file);
    writer.opt("ssl-server-verify", &global.ssl_server_verify);

    // logging
    for target in &global.logs {
        writer.line(log_target(target));
    }
    writer.opt("log-tag", &global.log_tag);
    writer.opt("log-send-hostname", &global.log_send_hostname);

    // stats
    for socket in &global.stats_sockets {
        writer.line(stats_socket(socket));
    }
    writer.opt("stats timeout", &global.stats_timeout);

    // tuning
    for (key, value) in &global.tune {
        writer.line(format_args!("tune.{key} {value}"));
    }
    writer.on_off("tune.listener.multi-queue", global.listener_multi_queue);
    writer.on_off("tune.idle-pool.shared", global.idle_pool_shared);
    writer.on_off("tune.ssl.keylog", global.ssl_keylog);

    for (name, value) in &global.setenv {
        writer.line(format_args!("setenv {name} {}", super::quote(value)));
    }

    for path in &global.lua_load {
        writer.line(format_args!("lua-load {path}"));
    }
    for script in scripts {
        writer.line(format_args!("lua-load {}", script.load_path()));
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::ScriptKind;
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;

    fn render(global: &Global, scripts: &[Script]) -> String {
        let mut writer = Writer::default();
        write(&mut writer, global, scripts);
        writer.text
    }

    #[test]
    fn presence_flags_only_when_true() {
        let global = Global {
            daemon: false,
            master_worker: true,
            ..Default::default()
        };

        assert_eq!(render(&global, &[]), "global\n    master-worker\n");
    }

    #[test]
    fn on_off_switches_when_set() {
        let global = Global {
            listener_multi_queue: Some(true),
            ssl_keylog: Some(false),
            tune: IndexMap::from([("ssl.default-dh-param".to_string(), "2048".to_string())]),
            ..Default::default()
        };

        assert_eq!(
            render(&global, &[]),
            "global\n    tune.ssl.default-dh-param 2048\n    tune.listener.multi-queue on\n    tune.ssl.keylog off\n"
        );
    }

    #[test]
    fn process_and_limits_come_before_scripts() {
        let global = Global {
            daemon: true,
            hard_stop_after: Some("30s".to_string()),
            maxconn: Some(2000),
            spread_checks: Some(5),
            lua_load: vec!["/etc/haproxy/auth.lua".to_string()],
            ..Default::default()
        };

        assert_eq!(
            render(&global, &[]),
            "global
    daemon
    hard-stop-after 30s
    maxconn 2000
    spread-checks 5
    lua-load /etc/haproxy/auth.lua
"
        );
    }

    #[test]
    fn log_targets() {
        let target = LogTarget {
            address: "127.0.0.1:514".to_string(),
            facility: "local0".to_string(),
            level: Some("info".to_string()),
            min_level: None,
            format: Some("rfc5424".to_string()),
            length: None,
        };

        assert_eq!(
            log_target(&target).to_string(),
            "log 127.0.0.1:514 format rfc5424 local0 info"
        );
    }

    #[test]
    fn scripts_are_loaded_after_lua_load() {
        let global = Global {
            lua_load: vec!["/etc/haproxy/auth.lua".to_string()],
            ..Default::default()
        };
        let scripts = [
            Script {
                name: "cors".to_string(),
                kind: ScriptKind::Lua,
                path: None,
                source: Some("core.register_action()".to_string()),
            },
            Script {
                name: "acme".to_string(),
                kind: ScriptKind::Lua,
                path: Some("/opt/acme.lua".to_string()),
                source: None,
            },
        ];

        assert_eq!(
            render(&global, &scripts),
            "global\n    lua-load /etc/haproxy/auth.lua\n    lua-load /etc/haproxy/lua/cors.lua\n    lua-load /opt/acme.lua\n"
        );
    }
}
