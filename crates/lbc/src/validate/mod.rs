//! Validators over the final IR
//!
//! Neither validator mutates the IR or blocks generation on its own; the host
//! decides what to do with the findings.
//!
//! - [semantic::check]: references, duplicates and mode consistency
//! - [security::audit]: risky settings, graded by [security::Level]
pub mod security;
pub mod semantic;

use crate::ir::{ProxyCommon, RootConfig};

/// Every proxy section with its header, e.g. `backend app`
pub(crate) fn proxies(root: &RootConfig) -> Vec<(String, &ProxyCommon)> {
    let mut proxies = vec![];
    if let Some(defaults) = &root.defaults {
        let header = match &defaults.name {
            Some(name) => format!("defaults {name}"),
            None => "defaults".to_string(),
        };
        proxies.push((header, &defaults.common));
    }
    for frontend in &root.frontends {
        proxies.push((format!("frontend {}", frontend.name), &frontend.common));
    }
    for backend in &root.backends {
        proxies.push((format!("backend {}", backend.name), &backend.common));
    }
    for listen in &root.listens {
        proxies.push((format!("listen {}", listen.name), &listen.common));
    }
    proxies
}
