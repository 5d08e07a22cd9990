//! servers and everything that produces them
use crate::value::Value;

/// Parameters shared by `server`, `server-template` and `default-server`
///
/// All fields start out as `None`; see the module docs of [crate::ir].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct ServerParams {
    pub check: Option<bool>,
    pub check_ssl: Option<bool>,
    pub check_port: Option<u16>,
    pub inter: Option<String>,
    pub fastinter: Option<String>,
    pub downinter: Option<String>,
    pub rise: Option<u32>,
    pub fall: Option<u32>,
    pub weight: Option<u32>,
    pub maxconn: Option<u32>,
    pub maxqueue: Option<u32>,
    pub minconn: Option<u32>,
    pub backup: Option<bool>,
    pub disabled: Option<bool>,
    pub ssl: Option<bool>,
    pub verify: Option<String>,
    pub ca_file: Option<String>,
    pub crt: Option<String>,
    pub sni: Option<String>,
    pub alpn: Option<Vec<String>>,
    pub ciphers: Option<String>,
    pub ssl_min_ver: Option<String>,
    pub send_proxy: Option<bool>,
    pub send_proxy_v2: Option<bool>,
    pub cookie: Option<String>,
    pub resolvers: Option<String>,
    pub resolve_prefer: Option<String>,
    pub init_addr: Option<String>,
    pub slowstart: Option<String>,
    pub agent_check: Option<bool>,
    pub agent_port: Option<u16>,
    pub agent_inter: Option<String>,
    pub track: Option<String>,
    pub observe: Option<String>,
    pub error_limit: Option<u32>,
    pub on_error: Option<String>,
    pub on_marked_down: Option<String>,
    pub proto: Option<String>,
    pub source: Option<String>,
    pub tfo: Option<bool>,
}

/// One concrete pool member
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Server {
    pub name: String,
    pub address: String,
    pub port: Option<u16>,
    pub params: ServerParams,
    /// Pending template spread, cleared by template expansion
    pub templates: Vec<String>,
}

impl Server {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
            port: None,
            params: Default::default(),
            templates: vec![],
        }
    }
}

/// `server-template <prefix> <count> <fqdn>[:<port>]`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServerTemplate {
    pub prefix: String,
    /// A count (`5`) or an id range (`1-5`)
    pub count: String,
    pub fqdn: String,
    pub port: Option<u16>,
    pub params: ServerParams,
}

/// Deferred `for` loop over a server body
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ServerLoop {
    pub variable: String,
    pub iterable: LoopIterable,
    pub body: Vec<Server>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum LoopIterable {
    /// Inclusive on both ends
    Range { start: Bound, end: Bound },
    List(Vec<Value>),
}

/// A range bound, either literal or an expression over global variables
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub enum Bound {
    Integer(i64),
    Expr(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum CheckKind {
    Http,
    Tcp,
    SslHello,
    Mysql,
    Pgsql,
    Redis,
    Smtp,
    Ldap,
}

/// Backend health checking
///
/// `inter`, `rise` and `fall` end up on the `default-server` line; servers
/// never inherit them directly.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct HealthCheck {
    pub kind: CheckKind,
    pub method: Option<String>,
    pub uri: Option<String>,
    pub version: Option<String>,
    pub host: Option<String>,
    pub expect: Option<String>,
    /// Database user for mysql/pgsql checks
    pub user: Option<String>,
    pub disable_on_404: bool,
    pub inter: Option<String>,
    pub rise: u32,
    pub fall: u32,
}

impl HealthCheck {
    pub const DEFAULT_RISE: u32 = 2;
    pub const DEFAULT_FALL: u32 = 3;

    pub fn new(kind: CheckKind) -> Self {
        Self {
            kind,
            method: None,
            uri: None,
            version: None,
            host: None,
            expect: None,
            user: None,
            disable_on_404: false,
            inter: None,
            rise: Self::DEFAULT_RISE,
            fall: Self::DEFAULT_FALL,
        }
    }
}

/// `cookie <name> [insert|rewrite|prefix] ...`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Cookie {
    pub name: String,
    pub mode: Option<String>,
    pub indirect: bool,
    pub nocache: bool,
    pub httponly: bool,
    pub secure: bool,
    pub domain: Option<String>,
    pub maxidle: Option<String>,
    pub maxlife: Option<String>,
}
