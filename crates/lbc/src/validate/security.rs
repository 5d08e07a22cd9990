//! security audit
use super::proxies;
use crate::ir::*;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize)]
pub enum Level {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
            Level::Critical => "critical",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, derive_new::new)]
pub struct Issue {
    pub level: Level,
    pub section: String,
    pub message: String,
}

fn issue(level: Level, section: impl Into<String>, message: impl Into<String>) -> Issue {
    Issue::new(level, section.into(), message.into())
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.level, self.section, self.message)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SecurityReport {
    pub issues: Vec<Issue>,
}

impl SecurityReport {
    /// Worst level found, `None` for a clean report
    pub fn max_level(&self) -> Option<Level> {
        self.issues.iter().map(|issue| issue.level).max()
    }

    pub fn at_least(&self, level: Level) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(move |issue| issue.level >= level)
    }
}

impl fmt::Display for SecurityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for issue in &self.issues {
            writeln!(f, "{issue}")?;
        }
        Ok(())
    }
}

/// Cipher name fragments that mark a suite as broken
const WEAK_CIPHERS: &[&str] = &["RC4", "3DES", "DES", "MD5", "NULL", "EXPORT"];

/// Passwords that show up in every credential list
const WEAK_PASSWORDS: &[&str] = &[
    "admin", "password", "haproxy", "changeme", "secret", "root", "123456", "12345678",
];

const MIN_PASSWORD_LEN: usize = 8;

/// Weak suites enabled by an OpenSSL cipher list
///
/// Entries prefixed with `!` or `-` remove suites and are ignored.
pub fn weak_ciphers(list: &str) -> Vec<&str> {
    list.split(':')
        .map(str::trim)
        .filter(|entry| !entry.is_empty() && !entry.starts_with(['!', '-']))
        .filter(|entry| {
            let upper = entry.to_ascii_uppercase();
            WEAK_CIPHERS.iter().any(|weak| upper.contains(weak))
        })
        .collect()
}

/// `stats auth user:password` credentials that are easy to guess
fn weak_credentials(auth: &str) -> bool {
    let Some((user, password)) = auth.split_once(':') else {
        return true;
    };
    password.len() < MIN_PASSWORD_LEN
        || password == user
        || WEAK_PASSWORDS.contains(&password.to_ascii_lowercase().as_str())
}

/// Audit `root` for risky settings
#[tracing::instrument(level = "debug", skip_all)]
pub fn audit(root: &RootConfig) -> SecurityReport {
    let mut issues = vec![];

    process(root, &mut issues);
    stats_pages(root, &mut issues);
    tls(root, &mut issues);

    tracing::debug!(issues = issues.len(), "security audit");
    SecurityReport { issues }
}

fn process(root: &RootConfig, issues: &mut Vec<Issue>) {
    let fallback = Global::default();
    let global = root.global.as_ref().unwrap_or(&fallback);

    let root_user = global.user.as_deref() == Some("root") || global.uid == Some(0);
    if root_user {
        issues.push(issue(Level::Critical, "global", "runs as root"));
    } else if global.user.is_none() && global.uid.is_none() {
        issues.push(issue(
            Level::High,
            "global",
            "no `user` set, privileges are never dropped",
        ));
    }

    if global.chroot.is_none() {
        issues.push(issue(
            Level::Medium,
            "global",
            "no `chroot`, a compromised process sees the whole filesystem",
        ));
    }

    for socket in &global.stats_sockets {
        if socket.level.as_deref() == Some("admin") && socket.mode.is_none() {
            issues.push(issue(
                Level::Medium,
                "global",
                format!("admin stats socket `{}` without a file mode", socket.path),
            ));
        }
    }
}

fn stats_pages(root: &RootConfig, issues: &mut Vec<Issue>) {
    for (section, common) in proxies(root) {
        let Some(stats) = &common.stats else {
            continue;
        };
        if !stats.enable && stats.uri.is_none() {
            continue;
        }

        if stats.auth.is_empty() {
            issues.push(issue(
                Level::High,
                section.clone(),
                "stats page without authentication",
            ));
        }
        for auth in stats.auth.iter().filter(|auth| weak_credentials(auth)) {
            let user = auth.split_once(':').map_or(auth.as_str(), |(user, _)| user);
            issues.push(issue(
                Level::High,
                section.clone(),
                format!("weak stats credentials for `{user}`"),
            ));
        }
        if stats.admin.is_some() && stats.auth.is_empty() {
            issues.push(issue(
                Level::Critical,
                section.clone(),
                "stats admin enabled without authentication",
            ));
        }
        if !stats.hide_version {
            issues.push(issue(
                Level::Low,
                section,
                "stats page discloses the version",
            ));
        }
    }
}

fn tls(root: &RootConfig, issues: &mut Vec<Issue>) {
    let fallback = Global::default();
    let global = root.global.as_ref().unwrap_or(&fallback);

    let mut cipher_lists: Vec<(String, &str, &str)> = vec![];
    if let Some(list) = &global.ssl_default_bind_ciphers {
        cipher_lists.push(("global".to_string(), "ssl-default-bind-ciphers", list.as_str()));
    }
    if let Some(list) = &global.ssl_default_server_ciphers {
        cipher_lists.push(("global".to_string(), "ssl-default-server-ciphers", list.as_str()));
    }

    let global_min_ver = global
        .ssl_default_bind_options
        .iter()
        .any(|option| option.starts_with("ssl-min-ver") || option == "no-tlsv10");
    if global.ssl_server_verify.as_deref() == Some("none") {
        issues.push(issue(
            Level::High,
            "global",
            "ssl-server-verify none disables certificate checks for every server",
        ));
    }

    for (name, _, front) in root.entry_points() {
        let section = if root.frontends.iter().any(|f| f.name == name) {
            format!("frontend {name}")
        } else {
            format!("listen {name}")
        };
        for bind in front.binds.iter().filter(|bind| bind.ssl) {
            if let Some(list) = &bind.ciphers {
                cipher_lists.push((section.clone(), "bind ciphers", list.as_str()));
            }
            if bind.ssl_min_ver.is_none() && !global_min_ver {
                issues.push(issue(
                    Level::Medium,
                    section.clone(),
                    format!(
                        "ssl bind {} accepts legacy protocol versions, set ssl_min_ver",
                        bind.address
                    ),
                ));
            }
        }
    }

    for (name, back) in root.server_pools() {
        let section = if root.backends.iter().any(|b| b.name == name) {
            format!("backend {name}")
        } else {
            format!("listen {name}")
        };
        let servers = back
            .servers
            .iter()
            .map(|server| (server.name.as_str(), &server.params))
            .chain(
                back.server_templates
                    .iter()
                    .map(|template| (template.prefix.as_str(), &template.params)),
            );
        for (server, params) in servers {
            if params.verify.as_deref() == Some("none") {
                issues.push(issue(
                    Level::Medium,
                    section.clone(),
                    format!("server `{server}` skips certificate verification"),
                ));
            }
            if let Some(list) = &params.ciphers {
                cipher_lists.push((section.clone(), "server ciphers", list.as_str()));
            }
        }
    }

    for (section, directive, list) in cipher_lists {
        let weak = weak_ciphers(list);
        if !weak.is_empty() {
            issues.push(issue(
                Level::High,
                section,
                format!("{directive} enables weak ciphers: {}", weak.join(":")),
            ));
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn hardened_global() -> Global {
        Global {
            user: Some("haproxy".to_string()),
            group: Some("haproxy".to_string()),
            chroot: Some("/var/lib/haproxy".to_string()),
            ..Default::default()
        }
    }

    fn messages(report: &SecurityReport) -> Vec<String> {
        report.issues.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn hardened_config_is_clean() {
        let root = RootConfig {
            global: Some(hardened_global()),
            ..Default::default()
        };

        let report = audit(&root);
        assert_eq!(report.max_level(), None);
    }

    #[test]
    fn missing_global_keeps_root() {
        let report = audit(&RootConfig::default());

        assert_eq!(
            messages(&report),
            vec![
                "[high] global: no `user` set, privileges are never dropped",
                "[medium] global: no `chroot`, a compromised process sees the whole filesystem",
            ]
        );
        assert_eq!(report.max_level(), Some(Level::High));
    }

    #[test]
    fn running_as_root_is_critical() {
        let global = Global {
            user: Some("root".to_string()),
            ..hardened_global()
        };
        let root = RootConfig {
            global: Some(global),
            ..Default::default()
        };

        assert_eq!(audit(&root).max_level(), Some(Level::Critical));
    }

    #[test]
    fn stats_pages() {
        let mut listen = Listen {
            name: "stats".to_string(),
            ..Default::default()
        };
        listen.common.stats = Some(Stats {
            enable: true,
            uri: Some("/stats".to_string()),
            auth: vec!["admin:admin".to_string(), "ops:L0ng-enough-pass".to_string()],
            hide_version: true,
            ..Default::default()
        });
        let root = RootConfig {
            global: Some(hardened_global()),
            listens: vec![listen],
            ..Default::default()
        };

        assert_eq!(
            messages(&audit(&root)),
            vec!["[high] listen stats: weak stats credentials for `admin`"]
        );
    }

    #[test]
    fn tls_settings() {
        let mut frontend = Frontend {
            name: "web".to_string(),
            ..Default::default()
        };
        frontend.front.binds.push(Bind {
            address: "*".to_string(),
            port: Some(443),
            ssl: true,
            crt: vec!["/etc/ssl/site.pem".to_string()],
            ciphers: Some("ECDHE-RSA-AES128-GCM-SHA256:RC4-SHA:!MD5".to_string()),
            ..Default::default()
        });
        let mut backend = Backend {
            name: "app".to_string(),
            ..Default::default()
        };
        let mut server = Server::new("web1", "10.0.0.1");
        server.params.ssl = Some(true);
        server.params.verify = Some("none".to_string());
        backend.back.servers.push(server);
        let root = RootConfig {
            global: Some(hardened_global()),
            frontends: vec![frontend],
            backends: vec![backend],
            ..Default::default()
        };

        assert_eq!(
            messages(&audit(&root)),
            vec![
                "[medium] frontend web: ssl bind * accepts legacy protocol versions, set ssl_min_ver",
                "[medium] backend app: server `web1` skips certificate verification",
                "[high] frontend web: bind ciphers enables weak ciphers: RC4-SHA",
            ]
        );
    }

    #[test]
    fn global_min_version_covers_binds() {
        let global = Global {
            ssl_default_bind_options: vec!["ssl-min-ver".to_string(), "TLSv1.2".to_string()],
            ..hardened_global()
        };
        let mut frontend = Frontend {
            name: "web".to_string(),
            ..Default::default()
        };
        frontend.front.binds.push(Bind {
            address: "*".to_string(),
            port: Some(443),
            ssl: true,
            ..Default::default()
        });
        let root = RootConfig {
            global: Some(global),
            frontends: vec![frontend],
            ..Default::default()
        };

        assert_eq!(audit(&root), SecurityReport::default());
    }

    #[test]
    fn cipher_lists() {
        assert_eq!(
            weak_ciphers("ECDHE-ECDSA-AES256-GCM-SHA384:!RC4:-3DES:DES-CBC3-SHA:NULL-MD5"),
            vec!["DES-CBC3-SHA", "NULL-MD5"]
        );
        assert!(weak_ciphers("").is_empty());
    }
}
