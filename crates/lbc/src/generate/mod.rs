//! Code generator
//!
//! [generate] serializes a normalized [RootConfig] into HAProxy configuration
//! text. It never fails and never looks anything up: references are written
//! as given, checking them is [crate::validate]'s job.
//!
//! Layout:
//! - sections in the order global, defaults, peers, resolvers, mailers,
//!   frontends, backends, listens
//! - headers unindented, directives indented by four spaces
//! - one blank line between sections, a trailing newline at the end
mod endpoints;
mod global;
mod proxy;
mod rules;
mod server;

use crate::ir::{Global, RootConfig};
use std::fmt::Display;

/// Generate the configuration text for `root`
#[tracing::instrument(level = "debug", skip_all)]
pub fn generate(root: &RootConfig) -> String {
    let mut writer = Writer::default();

    // scripts are loaded from the global section, so they bring one along
    if root.global.is_some() || !root.scripts.is_empty() {
        let fallback = Global::default();
        let global = root.global.as_ref().unwrap_or(&fallback);
        global::write(&mut writer, global, &root.scripts);
    }
    if let Some(defaults) = &root.defaults {
        proxy::defaults(&mut writer, defaults);
    }
    for peers in &root.peers {
        endpoints::peers(&mut writer, peers);
    }
    for resolvers in &root.resolvers {
        endpoints::resolvers(&mut writer, resolvers);
    }
    for mailers in &root.mailers {
        endpoints::mailers(&mut writer, mailers);
    }
    for frontend in &root.frontends {
        proxy::frontend(&mut writer, frontend);
    }
    for backend in &root.backends {
        proxy::backend(&mut writer, backend);
    }
    for listen in &root.listens {
        proxy::listen(&mut writer, listen);
    }

    tracing::debug!(sections = writer.sections, bytes = writer.text.len(), "generated");
    writer.text
}

/// Accumulates sections and their directive lines
#[derive(Debug, Default)]
pub(crate) struct Writer {
    text: String,
    sections: usize,
}

impl Writer {
    pub fn section(&mut self, header: impl Display) {
        if self.sections > 0 {
            self.text.push('\n');
        }
        self.text.push_str(&header.to_string());
        self.text.push('\n');
        self.sections += 1;
    }

    pub fn line(&mut self, line: impl Display) {
        self.text.push_str("    ");
        self.text.push_str(&line.to_string());
        self.text.push('\n');
    }

    pub fn opt(&mut self, keyword: &str, value: &Option<impl Display>) {
        if let Some(value) = value {
            self.line(format_args!("{keyword} {value}"));
        }
    }

    /// Presence-only keyword
    pub fn flag(&mut self, keyword: &str, enabled: bool) {
        if enabled {
            self.line(keyword);
        }
    }

    /// Keyword followed by `on` or `off`, nothing when unset
    pub fn on_off(&mut self, keyword: &str, value: Option<bool>) {
        if let Some(enabled) = value {
            self.line(format_args!("{keyword} {}", if enabled { "on" } else { "off" }));
        }
    }
}

/// One directive line, built word by word
#[derive(Debug)]
pub(crate) struct Line(String);

impl Line {
    pub fn new(keyword: impl Display) -> Self {
        Self(keyword.to_string())
    }

    pub fn word(mut self, word: impl Display) -> Self {
        self.0.push(' ');
        self.0.push_str(&word.to_string());
        self
    }

    /// A bare word, if there is one
    pub fn maybe(self, word: &Option<impl Display>) -> Self {
        match word {
            Some(word) => self.word(word),
            None => self,
        }
    }

    pub fn flag(self, keyword: &str, enabled: bool) -> Self {
        if enabled {
            self.word(keyword)
        } else {
            self
        }
    }

    pub fn opt(self, keyword: &str, value: &Option<impl Display>) -> Self {
        match value {
            Some(value) => self.word(keyword).word(value),
            None => self,
        }
    }

    pub fn condition(self, condition: &Option<String>) -> Self {
        match condition {
            Some(condition) => self.word(format_condition(condition)),
            None => self,
        }
    }
}

impl Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// `if` is implied unless the condition already starts with `if` / `unless`
pub(crate) fn format_condition(condition: &str) -> String {
    let condition = condition.trim();
    if condition.starts_with("if ") || condition.starts_with("unless ") {
        condition.to_string()
    } else {
        format!("if {condition}")
    }
}

/// Quote values with whitespace so they stay one word
pub(crate) fn quote(value: &str) -> String {
    let already_quoted = value.len() >= 2 && value.starts_with('"') && value.ends_with('"');
    if already_quoted || !value.chars().any(char::is_whitespace) {
        return value.to_string();
    }
    format!("\"{}\"", value.replace('"', "\\\""))
}

/// `address` or `address:port`
pub(crate) fn address(address: &str, port: Option<u16>) -> String {
    match port {
        Some(port) => format!("{address}:{port}"),
        None => address.to_string(),
    }
}
