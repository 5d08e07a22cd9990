//! Intermediate representation
//!
//! The IR is produced by [crate::builder], rewritten by each normalization
//! pass in [crate::passes] and finally read by [crate::generate] and the
//! validators in [crate::validate].
//!
//! Every author-settable server parameter is an [Option]. `None` means "not
//! written by the author", which is what template expansion keys on. Fields
//! that are not template targets use plain values where the engine has an
//! obvious "absent" form (`false`, empty list).
//!
//! Passes take a [RootConfig] by value and return a new one, so no pass can
//! observe a tree another pass is still working on.
mod directives;
mod section;
mod server;

pub use directives::*;
pub use section::*;
pub use server::*;

use crate::value::Value;
use indexmap::IndexMap;

/// A whole compiled document
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct RootConfig {
    pub global: Option<Global>,
    pub defaults: Option<Defaults>,
    pub frontends: Vec<Frontend>,
    pub backends: Vec<Backend>,
    pub listens: Vec<Listen>,
    pub scripts: Vec<Script>,
    pub peers: Vec<Peers>,
    pub resolvers: Vec<Resolvers>,
    pub mailers: Vec<Mailers>,
    /// Design time only, emptied by normalization
    pub variables: IndexMap<String, Variable>,
    /// Design time only, emptied by normalization
    pub templates: IndexMap<String, Template>,
    pub imports: Vec<String>,
}

impl RootConfig {
    /// Sections that can hold servers, in emission order
    pub fn server_pools_mut(&mut self) -> impl Iterator<Item = (&str, &mut BackSide)> {
        let backends = self
            .backends
            .iter_mut()
            .map(|backend| (backend.name.as_str(), &mut backend.back));
        let listens = self
            .listens
            .iter_mut()
            .map(|listen| (listen.name.as_str(), &mut listen.back));
        backends.chain(listens)
    }

    pub fn server_pools(&self) -> impl Iterator<Item = (&str, &BackSide)> {
        let backends = self
            .backends
            .iter()
            .map(|backend| (backend.name.as_str(), &backend.back));
        let listens = self
            .listens
            .iter()
            .map(|listen| (listen.name.as_str(), &listen.back));
        backends.chain(listens)
    }

    /// Frontends and listens, the sections that accept traffic
    pub fn entry_points(&self) -> impl Iterator<Item = (&str, &ProxyCommon, &FrontSide)> {
        let frontends = self
            .frontends
            .iter()
            .map(|frontend| (frontend.name.as_str(), &frontend.common, &frontend.front));
        let listens = self
            .listens
            .iter()
            .map(|listen| (listen.name.as_str(), &listen.common, &listen.front));
        frontends.chain(listens)
    }

    /// True once no design-time entity or pending marker is left
    pub fn is_normalized(&self) -> bool {
        self.variables.is_empty()
            && self.templates.is_empty()
            && self.server_pools().all(|(_, back)| {
                back.loops.is_empty() && back.servers.iter().all(|s| s.templates.is_empty())
            })
    }
}

/// A user declared variable
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Variable {
    pub name: String,
    pub value: Value,
}

/// What a template can be spread into
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum TemplateKind {
    Server,
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::Server => f.write_str("server"),
        }
    }
}

/// A named bag of parameters
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Template {
    pub name: String,
    pub kind: TemplateKind,
    pub params: IndexMap<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ScriptKind {
    Lua,
}

/// A script the engine loads at startup
///
/// Writing inline sources to disk is the host's job; the generator only
/// needs to know where the file ends up.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Script {
    pub name: String,
    pub kind: ScriptKind,
    pub path: Option<String>,
    pub source: Option<String>,
}

impl Script {
    pub const DEFAULT_DIRECTORY: &'static str = "/etc/haproxy/lua";

    pub fn load_path(&self) -> String {
        match &self.path {
            Some(path) => path.clone(),
            None => format!("{}/{}.lua", Self::DEFAULT_DIRECTORY, self.name),
        }
    }
}

/// `name address:port`, shared by peers, nameservers and mailers
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Endpoint {
    pub name: String,
    pub address: String,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Peers {
    pub name: String,
    pub peers: Vec<Endpoint>,
}

#[derive(Debug, Clone, Default, PartialEq, serde::Serialize)]
pub struct Resolvers {
    pub name: String,
    pub nameservers: Vec<Endpoint>,
    pub parse_resolv_conf: bool,
    pub resolve_retries: Option<u32>,
    pub timeout_resolve: Option<String>,
    pub timeout_retry: Option<String>,
    /// `hold <status> <period>`, in declaration order
    pub hold: IndexMap<String, String>,
    pub accepted_payload_size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Mailers {
    pub name: String,
    pub mailers: Vec<Endpoint>,
    pub timeout_mail: Option<String>,
}
