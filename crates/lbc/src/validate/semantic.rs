//! cross references and consistency
use super::proxies;
use crate::ir::*;
use std::collections::{HashMap, HashSet};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Finding {
    pub severity: Severity,
    /// Section header, e.g. `frontend web`
    pub section: String,
    pub message: String,
}

impl fmt::Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{severity}: {}: {}", self.section, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct Report {
    pub findings: Vec<Finding>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Finding> {
        self.findings
            .iter()
            .filter(|finding| finding.severity == Severity::Warning)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    fn error(&mut self, section: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Error, section.into(), message.into());
    }

    fn warning(&mut self, section: impl Into<String>, message: impl Into<String>) {
        self.push(Severity::Warning, section.into(), message.into());
    }

    fn push(&mut self, severity: Severity, section: String, message: String) {
        tracing::trace!(?severity, %section, %message, "finding");
        self.findings.push(Finding {
            severity,
            section,
            message,
        });
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for finding in &self.findings {
            writeln!(f, "{finding}")?;
        }
        Ok(())
    }
}

/// ACLs the engine defines on its own
const PREDEFINED_ACLS: &[&str] = &[
    "FALSE",
    "HTTP",
    "HTTP_1.0",
    "HTTP_1.1",
    "HTTP_2.0",
    "HTTP_CONTENT",
    "HTTP_URL_ABS",
    "HTTP_URL_SLASH",
    "HTTP_URL_STAR",
    "LOCALHOST",
    "METH_CONNECT",
    "METH_DELETE",
    "METH_GET",
    "METH_HEAD",
    "METH_OPTIONS",
    "METH_POST",
    "METH_PUT",
    "METH_TRACE",
    "RDP_COOKIE",
    "REQ_CONTENT",
    "TRUE",
    "WAIT_END",
];

/// Names of the ACLs a condition refers to
///
/// Anonymous ACLs in braces, negations and the `if`/`unless`/`or` keywords
/// are skipped.
pub fn condition_acls(condition: &str) -> Vec<&str> {
    let mut names = vec![];
    let mut depth = 0usize;

    for word in condition.split_whitespace() {
        if word.starts_with('{') || word.starts_with("!{") {
            depth += 1;
        }
        if depth > 0 {
            if word.ends_with('}') {
                depth -= 1;
            }
            continue;
        }

        let name = word.trim_start_matches('!');
        if matches!(name, "" | "if" | "unless" | "or" | "||" | "&&") {
            continue;
        }
        names.push(name);
    }

    names
}

/// Run all semantic checks
#[tracing::instrument(level = "debug", skip_all)]
pub fn check(root: &RootConfig) -> Report {
    let mut report = Report::default();

    duplicates(root, &mut report);
    routing(root, &mut report);
    use_servers(root, &mut report);
    stick_tables(root, &mut report);
    acl_references(root, &mut report);
    modes(root, &mut report);
    empty_sections(root, &mut report);

    tracing::debug!(
        errors = report.errors().count(),
        warnings = report.warnings().count(),
        "semantic check"
    );
    report
}

fn duplicates(root: &RootConfig, report: &mut Report) {
    fn check<'a>(
        kind: &str,
        names: impl Iterator<Item = &'a str>,
        taken: &mut HashSet<&'a str>,
        report: &mut Report,
    ) {
        for name in names {
            if !taken.insert(name) {
                report.error(
                    format!("{kind} {name}"),
                    format!("a proxy named `{name}` is already declared"),
                );
            }
        }
    }

    // frontends and backends have separate namespaces, a listen is both
    let mut frontends = HashSet::new();
    let mut backends = HashSet::new();
    check(
        "frontend",
        root.frontends.iter().map(|f| f.name.as_str()),
        &mut frontends,
        report,
    );
    check(
        "backend",
        root.backends.iter().map(|b| b.name.as_str()),
        &mut backends,
        report,
    );
    for listen in &root.listens {
        let name = listen.name.as_str();
        let front_clash = !frontends.insert(name);
        let back_clash = !backends.insert(name);
        if front_clash || back_clash {
            report.error(
                format!("listen {name}"),
                format!("a proxy named `{name}` is already declared"),
            );
        }
    }

    let mut seen = HashSet::new();
    for (kind, name) in root
        .peers
        .iter()
        .map(|p| ("peers", p.name.as_str()))
        .chain(root.resolvers.iter().map(|r| ("resolvers", r.name.as_str())))
        .chain(root.mailers.iter().map(|m| ("mailers", m.name.as_str())))
    {
        if !seen.insert((kind, name)) {
            report.error(
                format!("{kind} {name}"),
                format!("{kind} section `{name}` is already declared"),
            );
        }
    }
}

/// Names a frontend can route to
fn backend_names(root: &RootConfig) -> HashSet<&str> {
    root.server_pools().map(|(name, _)| name).collect()
}

fn backend_modes(root: &RootConfig) -> HashMap<&str, Option<Mode>> {
    let backends = root
        .backends
        .iter()
        .map(|b| (b.name.as_str(), b.common.mode));
    let listens = root.listens.iter().map(|l| (l.name.as_str(), l.common.mode));
    backends.chain(listens).collect()
}

fn routing(root: &RootConfig, report: &mut Report) {
    let known = backend_names(root);
    let modes = backend_modes(root);

    for (name, common, front) in root.entry_points() {
        let section = entry_header(root, name);
        let targets = front
            .default_backend
            .iter()
            .map(|target| ("default_backend", target))
            .chain(
                front
                    .use_backends
                    .iter()
                    .map(|rule| ("use_backend", &rule.backend)),
            );

        for (directive, target) in targets {
            if !known.contains(target.as_str()) {
                report.error(
                    section.clone(),
                    format!("{directive} references unknown backend `{target}`"),
                );
                continue;
            }
            if let (Some(ours), Some(Some(theirs))) = (common.mode, modes.get(target.as_str())) {
                if ours != *theirs {
                    report.warning(
                        section.clone(),
                        format!(
                            "routes {} traffic to backend `{target}` in {} mode",
                            ours.keyword(),
                            theirs.keyword()
                        ),
                    );
                }
            }
        }
    }
}

fn entry_header(root: &RootConfig, name: &str) -> String {
    if root.frontends.iter().any(|f| f.name == name) {
        format!("frontend {name}")
    } else {
        format!("listen {name}")
    }
}

fn pool_header(root: &RootConfig, name: &str) -> String {
    if root.backends.iter().any(|b| b.name == name) {
        format!("backend {name}")
    } else {
        format!("listen {name}")
    }
}

fn use_servers(root: &RootConfig, report: &mut Report) {
    for (name, back) in root.server_pools() {
        let servers: HashSet<&str> = back.servers.iter().map(|s| s.name.as_str()).collect();
        for rule in &back.use_servers {
            if !servers.contains(rule.server.as_str()) {
                report.error(
                    pool_header(root, name),
                    format!("use-server references unknown server `{}`", rule.server),
                );
            }
        }
    }
}

fn stick_tables(root: &RootConfig, report: &mut Report) {
    let tables: HashSet<&str> = root
        .frontends
        .iter()
        .filter(|f| f.common.stick_table.is_some())
        .map(|f| f.name.as_str())
        .chain(
            root.backends
                .iter()
                .filter(|b| b.common.stick_table.is_some())
                .map(|b| b.name.as_str()),
        )
        .chain(
            root.listens
                .iter()
                .filter(|l| l.common.stick_table.is_some())
                .map(|l| l.name.as_str()),
        )
        .collect();

    for (section, common) in proxies(root) {
        for rule in &common.stick_rules {
            match &rule.table {
                Some(table) if !tables.contains(table.as_str()) => report.error(
                    section.clone(),
                    format!("stick {} uses undeclared table `{table}`", rule.kind.keyword()),
                ),
                None if common.stick_table.is_none() => report.error(
                    section.clone(),
                    format!(
                        "stick {} without a table, and the section declares none",
                        rule.kind.keyword()
                    ),
                ),
                _ => {}
            }
        }
    }
}

fn acl_references(root: &RootConfig, report: &mut Report) {
    let mut sections: Vec<(String, &ProxyCommon, Vec<&str>)> = vec![];
    for (section, common) in proxies(root) {
        let mut conditions: Vec<&str> = vec![];
        conditions.extend(common.rules.iter().filter_map(|r| r.condition.as_deref()));
        conditions.extend(common.redirects.iter().filter_map(|r| r.condition.as_deref()));
        conditions.extend(common.stick_rules.iter().filter_map(|r| r.condition.as_deref()));
        if let Some(stats) = &common.stats {
            conditions.extend(stats.admin.as_deref());
        }
        sections.push((section, common, conditions));
    }

    for (name, _, front) in root.entry_points() {
        let header = entry_header(root, name);
        if let Some((_, _, conditions)) = sections.iter_mut().find(|(s, _, _)| *s == header) {
            conditions.extend(front.use_backends.iter().filter_map(|r| r.condition.as_deref()));
        }
    }
    for (name, back) in root.server_pools() {
        let header = pool_header(root, name);
        if let Some((_, _, conditions)) = sections.iter_mut().find(|(s, _, _)| *s == header) {
            conditions.extend(back.use_servers.iter().filter_map(|r| r.condition.as_deref()));
        }
    }

    for (section, common, conditions) in sections {
        let declared: HashSet<&str> = common.acls.iter().map(|acl| acl.name.as_str()).collect();
        let mut reported = HashSet::new();
        for name in conditions.into_iter().flat_map(condition_acls) {
            if declared.contains(name) || PREDEFINED_ACLS.contains(&name) {
                continue;
            }
            if reported.insert(name) {
                report.warning(
                    section.clone(),
                    format!("condition uses undeclared ACL `{name}`"),
                );
            }
        }
    }
}

fn modes(root: &RootConfig, report: &mut Report) {
    for (section, common) in proxies(root) {
        let enabled = common.options.enabled();
        match common.mode {
            Some(Mode::Http) => {
                for option in enabled.iter().copied().filter(|o| ProxyOptions::TCP_ONLY.contains(o)) {
                    report.warning(
                        section.clone(),
                        format!("option {option} has no effect in http mode"),
                    );
                }
            }
            Some(Mode::Tcp) => {
                for option in enabled.iter().copied().filter(|o| ProxyOptions::HTTP_ONLY.contains(o)) {
                    report.warning(
                        section.clone(),
                        format!("option {option} requires http mode"),
                    );
                }
                for kind in [
                    RuleKind::HttpRequest,
                    RuleKind::HttpResponse,
                    RuleKind::HttpAfterResponse,
                ] {
                    if !common.rules.get(kind).is_empty() {
                        report.warning(
                            section.clone(),
                            format!("{} rules require http mode", kind.keyword()),
                        );
                    }
                }
            }
            None => {}
        }
    }
}

fn empty_sections(root: &RootConfig, report: &mut Report) {
    for (name, _, front) in root.entry_points() {
        if front.binds.is_empty() {
            report.warning(entry_header(root, name), "no bind, it accepts no traffic");
        }
    }
    for (name, back) in root.server_pools() {
        if back.servers.is_empty() && back.server_templates.is_empty() {
            report.warning(pool_header(root, name), "no servers");
        }
    }
}
