//! top level sections
//!
//! Frontend, backend and listen are assembled from three parts:
//! - [ProxyCommon]: what every proxy section can carry
//! - [FrontSide]: accepting traffic and routing it
//! - [BackSide]: balancing and servers
//!
//! A listen section carries all three.
use super::*;
use indexmap::IndexMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Mode {
    Http,
    Tcp,
}

impl Mode {
    pub fn keyword(&self) -> &'static str {
        match self {
            Mode::Http => "http",
            Mode::Tcp => "tcp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub enum Balance {
    RoundRobin,
    StaticRr,
    LeastConn,
    First,
    Source,
    Uri,
    Random,
    /// Algorithms with arguments, e.g. `url_param userid` or `hdr(host)`
    Other(String),
}

impl Balance {
    pub fn parse(value: &str) -> Self {
        match value {
            "roundrobin" => Balance::RoundRobin,
            "static-rr" => Balance::StaticRr,
            "leastconn" => Balance::LeastConn,
            "first" => Balance::First,
            "source" => Balance::Source,
            "uri" => Balance::Uri,
            "random" => Balance::Random,
            other => Balance::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Balance::RoundRobin => "roundrobin",
            Balance::StaticRr => "static-rr",
            Balance::LeastConn => "leastconn",
            Balance::First => "first",
            Balance::Source => "source",
            Balance::Uri => "uri",
            Balance::Random => "random",
            Balance::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Timeouts {
    pub connect: Option<String>,
    pub client: Option<String>,
    pub server: Option<String>,
    pub http_request: Option<String>,
    pub http_keep_alive: Option<String>,
    pub queue: Option<String>,
    pub tunnel: Option<String>,
    pub check: Option<String>,
    pub client_fin: Option<String>,
    pub server_fin: Option<String>,
    pub tarpit: Option<String>,
}

impl Timeouts {
    /// `(wire name, value)` for every timeout, in emission order
    pub fn entries(&self) -> [(&'static str, &Option<String>); 11] {
        [
            ("connect", &self.connect),
            ("client", &self.client),
            ("server", &self.server),
            ("http-request", &self.http_request),
            ("http-keep-alive", &self.http_keep_alive),
            ("queue", &self.queue),
            ("tunnel", &self.tunnel),
            ("check", &self.check),
            ("client-fin", &self.client_fin),
            ("server-fin", &self.server_fin),
            ("tarpit", &self.tarpit),
        ]
    }

    /// Take every timeout `other` sets, keep the rest
    pub fn merge(&mut self, other: Timeouts) {
        let Timeouts {
            connect,
            client,
            server,
            http_request,
            http_keep_alive,
            queue,
            tunnel,
            check,
            client_fin,
            server_fin,
            tarpit,
        } = other;
        let incoming = [
            (&mut self.connect, connect),
            (&mut self.client, client),
            (&mut self.server, server),
            (&mut self.http_request, http_request),
            (&mut self.http_keep_alive, http_keep_alive),
            (&mut self.queue, queue),
            (&mut self.tunnel, tunnel),
            (&mut self.check, check),
            (&mut self.client_fin, client_fin),
            (&mut self.server_fin, server_fin),
            (&mut self.tarpit, tarpit),
        ];
        for (slot, value) in incoming {
            if value.is_some() {
                *slot = value;
            }
        }
    }

    pub fn slot_mut(&mut self, key: &str) -> Option<&mut Option<String>> {
        Some(match key {
            "connect" => &mut self.connect,
            "client" => &mut self.client,
            "server" => &mut self.server,
            "http_request" => &mut self.http_request,
            "http_keep_alive" => &mut self.http_keep_alive,
            "queue" => &mut self.queue,
            "tunnel" => &mut self.tunnel,
            "check" => &mut self.check,
            "client_fin" => &mut self.client_fin,
            "server_fin" => &mut self.server_fin,
            "tarpit" => &mut self.tarpit,
            _ => return None,
        })
    }
}

macro_rules! proxy_options {
    ($($field:ident => $wire:literal),+ $(,)?) => {
        /// `option <name>` flags, emitted only when set
        #[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
        pub struct ProxyOptions {
            $(pub $field: bool,)+
            /// `option forwardfor except <network>`
            pub forwardfor_except: Option<String>,
        }

        impl ProxyOptions {
            pub fn flag_mut(&mut self, name: &str) -> Option<&mut bool> {
                match name {
                    $(stringify!($field) => Some(&mut self.$field),)+
                    _ => None,
                }
            }

            /// Union of both flag sets
            pub fn merge(&mut self, other: ProxyOptions) {
                $(self.$field |= other.$field;)+
                if other.forwardfor_except.is_some() {
                    self.forwardfor_except = other.forwardfor_except;
                }
            }

            /// Wire names of all enabled flags, in emission order
            pub fn enabled(&self) -> Vec<&'static str> {
                let mut enabled = vec![];
                $(
                    if self.$field {
                        enabled.push($wire);
                    }
                )+
                enabled
            }
        }
    };
}

proxy_options! {
    httplog => "httplog",
    tcplog => "tcplog",
    dontlognull => "dontlognull",
    dontlog_normal => "dontlog-normal",
    log_health_checks => "log-health-checks",
    log_separate_errors => "log-separate-errors",
    logasap => "logasap",
    forwardfor => "forwardfor",
    http_server_close => "http-server-close",
    http_keep_alive => "http-keep-alive",
    httpclose => "httpclose",
    http_buffer_request => "http-buffer-request",
    http_no_delay => "http-no-delay",
    redispatch => "redispatch",
    abortonclose => "abortonclose",
    allbackups => "allbackups",
    prefer_last_server => "prefer-last-server",
    persist => "persist",
    tcp_smart_accept => "tcp-smart-accept",
    tcp_smart_connect => "tcp-smart-connect",
    tcpka => "tcpka",
    clitcpka => "clitcpka",
    srvtcpka => "srvtcpka",
    splice_auto => "splice-auto",
    independent_streams => "independent-streams",
    nolinger => "nolinger",
    contstats => "contstats",
    socket_stats => "socket-stats",
}

impl ProxyOptions {
    /// Options that only make sense in `mode http`
    pub const HTTP_ONLY: &'static [&'static str] = &[
        "httplog",
        "forwardfor",
        "http-server-close",
        "http-keep-alive",
        "httpclose",
        "http-buffer-request",
        "http-no-delay",
    ];

    /// Options that only make sense in `mode tcp`
    pub const TCP_ONLY: &'static [&'static str] = &["tcplog"];
}

/// Directives every proxy section can carry
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ProxyCommon {
    pub mode: Option<Mode>,
    pub description: Option<String>,
    pub disabled: bool,
    pub maxconn: Option<u32>,
    pub log_global: bool,
    pub logs: Vec<LogTarget>,
    pub log_format: Option<String>,
    pub unique_id_format: Option<String>,
    pub unique_id_header: Option<String>,
    pub timeouts: Timeouts,
    pub options: ProxyOptions,
    pub acls: Vec<Acl>,
    pub rules: RuleSet,
    pub stick_table: Option<StickTable>,
    pub stick_rules: Vec<StickRule>,
    pub redirects: Vec<Redirect>,
    pub stats: Option<Stats>,
    pub compression: Option<Compression>,
    pub error_pages: Vec<ErrorPage>,
}

/// Directives of sections that accept traffic
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct FrontSide {
    pub binds: Vec<Bind>,
    pub monitor_uri: Option<String>,
    pub use_backends: Vec<UseBackend>,
    pub default_backend: Option<String>,
}

/// Directives of sections that own servers
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct BackSide {
    pub balance: Option<Balance>,
    pub hash_type: Option<String>,
    pub cookie: Option<Cookie>,
    pub retries: Option<u32>,
    pub http_reuse: Option<String>,
    pub fullconn: Option<u32>,
    pub health_check: Option<HealthCheck>,
    pub use_servers: Vec<UseServer>,
    pub default_server: Option<ServerParams>,
    pub server_templates: Vec<ServerTemplate>,
    pub servers: Vec<Server>,
    /// Pending loops, cleared by loop unrolling
    pub loops: Vec<ServerLoop>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Global {
    // process management
    pub daemon: bool,
    pub master_worker: bool,
    pub user: Option<String>,
    pub group: Option<String>,
    pub uid: Option<u32>,
    pub gid: Option<u32>,
    pub chroot: Option<String>,
    pub pidfile: Option<String>,
    pub nbthread: Option<u32>,
    pub cpu_map: Vec<String>,
    pub hard_stop_after: Option<String>,
    pub insecure_fork_wanted: bool,
    pub description: Option<String>,

    // connection limits
    pub maxconn: Option<u32>,
    pub maxconnrate: Option<u32>,
    pub maxsessrate: Option<u32>,
    pub maxsslconn: Option<u32>,
    pub maxsslrate: Option<u32>,
    pub ulimit_n: Option<u32>,
    pub spread_checks: Option<u32>,

    // ssl
    pub ca_base: Option<String>,
    pub crt_base: Option<String>,
    pub ssl_default_bind_ciphers: Option<String>,
    pub ssl_default_bind_ciphersuites: Option<String>,
    pub ssl_default_bind_options: Vec<String>,
    pub ssl_default_server_ciphers: Option<String>,
    pub ssl_default_server_ciphersuites: Option<String>,
    pub ssl_default_server_options: Vec<String>,
    pub ssl_dh_param_file: Option<String>,
    pub ssl_server_verify: Option<String>,

    // logging
    pub logs: Vec<LogTarget>,
    pub log_tag: Option<String>,
    pub log_send_hostname: Option<String>,

    // stats
    pub stats_sockets: Vec<StatsSocket>,
    pub stats_timeout: Option<String>,

    // tuning
    pub tune: IndexMap<String, String>,
    pub listener_multi_queue: Option<bool>,
    pub idle_pool_shared: Option<bool>,
    pub ssl_keylog: Option<bool>,

    pub setenv: IndexMap<String, String>,
    pub lua_load: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Defaults {
    pub name: Option<String>,
    pub common: ProxyCommon,
    pub back: BackSide,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Frontend {
    pub name: String,
    pub common: ProxyCommon,
    pub front: FrontSide,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Backend {
    pub name: String,
    pub common: ProxyCommon,
    pub back: BackSide,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Listen {
    pub name: String,
    pub common: ProxyCommon,
    pub front: FrontSide,
    pub back: BackSide,
}
