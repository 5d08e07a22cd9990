//! flat directive records
use indexmap::IndexMap;

/// `bind <address>[:<port>] [params...]`
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Bind {
    pub address: String,
    pub port: Option<u16>,
    pub ssl: bool,
    pub crt: Vec<String>,
    pub crt_list: Option<String>,
    pub ca_file: Option<String>,
    pub verify: Option<String>,
    pub alpn: Vec<String>,
    pub ciphers: Option<String>,
    pub ciphersuites: Option<String>,
    pub ssl_min_ver: Option<String>,
    pub ssl_max_ver: Option<String>,
    pub strict_sni: bool,
    pub accept_proxy: bool,
    pub transparent: bool,
    pub v4v6: bool,
    pub v6only: bool,
    pub defer_accept: bool,
    pub tfo: bool,
    pub allow_0rtt: bool,
    pub interface: Option<String>,
    pub name: Option<String>,
    pub mode: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub level: Option<String>,
    pub maxconn: Option<u32>,
}

/// `acl <name> <criterion> [flags] [values]`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Acl {
    pub name: String,
    pub criterion: String,
    pub flags: Vec<String>,
    pub values: Vec<String>,
}

/// Which rule block a [Rule] belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum RuleKind {
    HttpRequest,
    HttpResponse,
    HttpAfterResponse,
    TcpRequest,
    TcpResponse,
    HttpCheck,
    TcpCheck,
}

impl RuleKind {
    /// Emission order inside a proxy section
    pub const ORDER: [RuleKind; 7] = [
        RuleKind::TcpRequest,
        RuleKind::TcpResponse,
        RuleKind::HttpRequest,
        RuleKind::HttpResponse,
        RuleKind::HttpAfterResponse,
        RuleKind::HttpCheck,
        RuleKind::TcpCheck,
    ];

    pub fn keyword(&self) -> &'static str {
        match self {
            RuleKind::HttpRequest => "http-request",
            RuleKind::HttpResponse => "http-response",
            RuleKind::HttpAfterResponse => "http-after-response",
            RuleKind::TcpRequest => "tcp-request",
            RuleKind::TcpResponse => "tcp-response",
            RuleKind::HttpCheck => "http-check",
            RuleKind::TcpCheck => "tcp-check",
        }
    }

    /// Name of the directive in the DSL
    pub fn from_directive(name: &str) -> Option<Self> {
        Some(match name {
            "http_request" => RuleKind::HttpRequest,
            "http_response" => RuleKind::HttpResponse,
            "http_after_response" => RuleKind::HttpAfterResponse,
            "tcp_request" => RuleKind::TcpRequest,
            "tcp_response" => RuleKind::TcpResponse,
            "http_check" => RuleKind::HttpCheck,
            "tcp_check" => RuleKind::TcpCheck,
            _ => return None,
        })
    }

    pub fn is_http(&self) -> bool {
        matches!(
            self,
            RuleKind::HttpRequest
                | RuleKind::HttpResponse
                | RuleKind::HttpAfterResponse
                | RuleKind::HttpCheck
        )
    }
}

/// One line of a request/response/check block
///
/// `action` uses `_` as word separator; the generator converts it per
/// [RuleKind]. `params` order is token order.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Rule {
    pub kind: RuleKind,
    pub action: String,
    pub params: IndexMap<String, String>,
    pub condition: Option<String>,
}

/// All rule blocks of one section
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RuleSet {
    pub http_request: Vec<Rule>,
    pub http_response: Vec<Rule>,
    pub http_after_response: Vec<Rule>,
    pub tcp_request: Vec<Rule>,
    pub tcp_response: Vec<Rule>,
    pub http_check: Vec<Rule>,
    pub tcp_check: Vec<Rule>,
}

impl RuleSet {
    pub fn get(&self, kind: RuleKind) -> &[Rule] {
        match kind {
            RuleKind::HttpRequest => &self.http_request,
            RuleKind::HttpResponse => &self.http_response,
            RuleKind::HttpAfterResponse => &self.http_after_response,
            RuleKind::TcpRequest => &self.tcp_request,
            RuleKind::TcpResponse => &self.tcp_response,
            RuleKind::HttpCheck => &self.http_check,
            RuleKind::TcpCheck => &self.tcp_check,
        }
    }

    pub fn get_mut(&mut self, kind: RuleKind) -> &mut Vec<Rule> {
        match kind {
            RuleKind::HttpRequest => &mut self.http_request,
            RuleKind::HttpResponse => &mut self.http_response,
            RuleKind::HttpAfterResponse => &mut self.http_after_response,
            RuleKind::TcpRequest => &mut self.tcp_request,
            RuleKind::TcpResponse => &mut self.tcp_response,
            RuleKind::HttpCheck => &mut self.http_check,
            RuleKind::TcpCheck => &mut self.tcp_check,
        }
    }

    pub fn push(&mut self, rule: Rule) {
        self.get_mut(rule.kind).push(rule);
    }

    /// All rules in emission order
    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        RuleKind::ORDER.into_iter().flat_map(|kind| self.get(kind))
    }
}

/// `use_backend <name> [if <cond>]`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UseBackend {
    pub backend: String,
    pub condition: Option<String>,
}

/// `use-server <name> [if <cond>]`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct UseServer {
    pub server: String,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum RedirectKind {
    Location,
    Prefix,
    Scheme,
}

impl RedirectKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            RedirectKind::Location => "location",
            RedirectKind::Prefix => "prefix",
            RedirectKind::Scheme => "scheme",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Redirect {
    pub kind: RedirectKind,
    pub target: String,
    pub code: Option<u16>,
    pub drop_query: bool,
    pub append_slash: bool,
    pub set_cookie: Option<String>,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StickTable {
    /// `ip`, `ipv6`, `integer`, `string` or `binary`
    pub kind: String,
    pub len: Option<u32>,
    pub size: String,
    pub expire: Option<String>,
    pub nopurge: bool,
    pub peers: Option<String>,
    pub store: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum StickRuleKind {
    Match,
    On,
    StoreRequest,
    StoreResponse,
}

impl StickRuleKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            StickRuleKind::Match => "match",
            StickRuleKind::On => "on",
            StickRuleKind::StoreRequest => "store-request",
            StickRuleKind::StoreResponse => "store-response",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StickRule {
    pub kind: StickRuleKind,
    pub pattern: String,
    pub table: Option<String>,
    pub condition: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Compression {
    pub algo: Vec<String>,
    pub types: Vec<String>,
    pub offload: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ErrorPageKind {
    File,
    Location,
    Location302,
    Location303,
}

impl ErrorPageKind {
    pub fn keyword(&self) -> &'static str {
        match self {
            ErrorPageKind::File => "errorfile",
            ErrorPageKind::Location => "errorloc",
            ErrorPageKind::Location302 => "errorloc302",
            ErrorPageKind::Location303 => "errorloc303",
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ErrorPage {
    pub code: u16,
    pub kind: ErrorPageKind,
    pub target: String,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Stats {
    pub enable: bool,
    pub uri: Option<String>,
    pub realm: Option<String>,
    pub auth: Vec<String>,
    pub refresh: Option<String>,
    pub hide_version: bool,
    pub show_legends: bool,
    pub show_node: bool,
    /// Condition under which the admin level is granted
    pub admin: Option<String>,
    pub scope: Vec<String>,
}

/// `log <address> [len <n>] [format <f>] <facility> [<level> [<minlevel>]]`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct LogTarget {
    pub address: String,
    pub facility: String,
    pub level: Option<String>,
    pub min_level: Option<String>,
    pub format: Option<String>,
    pub length: Option<u32>,
}

impl LogTarget {
    pub const DEFAULT_FACILITY: &'static str = "local0";
}

/// `stats socket <path> [params...]`
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct StatsSocket {
    pub path: String,
    pub mode: Option<String>,
    pub level: Option<String>,
    pub user: Option<String>,
    pub group: Option<String>,
    pub expose_fd_listeners: bool,
}
