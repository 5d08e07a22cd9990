//! template expansion
use super::interpolate::interpolate_value;
use super::NormalizeError;
use crate::builder::{assign_server_field, Assign};
use crate::ir::{RootConfig, Server, Template, TemplateKind, Variable};
use crate::value::Value;
use indexmap::IndexMap;

/// Apply template spreads to the servers that list them
///
/// Templates apply in listed order and only fill parameters that are still
/// unset, so whatever the author wrote on the server (or an earlier template
/// set) wins.
#[tracing::instrument(level = "debug", skip_all)]
pub fn expand_templates(mut root: RootConfig) -> Result<RootConfig, NormalizeError> {
    let templates = std::mem::take(&mut root.templates);
    let globals = std::mem::take(&mut root.variables);
    let mut expanded = 0usize;

    for (_, back) in root.server_pools_mut() {
        for server in &mut back.servers {
            for name in std::mem::take(&mut server.templates) {
                let Some(template) = templates.get(&name) else {
                    return Err(NormalizeError::UnknownTemplate {
                        template: name,
                        server: server.name.clone(),
                    });
                };
                apply(template, server, &globals)?;
                expanded += 1;
            }
        }
    }

    tracing::debug!(expanded, "templates expanded");
    root.templates = templates;
    root.variables = globals;
    Ok(root)
}

fn apply(
    template: &Template,
    server: &mut Server,
    globals: &IndexMap<String, Variable>,
) -> Result<(), NormalizeError> {
    match template.kind {
        TemplateKind::Server => {}
    }
    tracing::trace!(template = %template.name, server = %server.name, "applying template");

    let mut lookup = |name: &str| {
        globals
            .get(name)
            .map(|variable| variable.value.clone())
            .ok_or_else(|| NormalizeError::UndefinedVariable {
                name: name.to_string(),
            })
    };

    for (key, value) in &template.params {
        // identity of a server is never inherited
        if key == "address" || key == "name" {
            return Err(NormalizeError::UnknownTemplateParam {
                template: template.name.clone(),
                param: key.clone(),
            });
        }

        let value: Value = interpolate_value(value.clone(), &mut lookup)?;
        let known = assign_server_field(server, key, &value, Assign::FillUnset).map_err(|source| {
            NormalizeError::TemplateParam {
                template: template.name.clone(),
                source,
            }
        })?;
        if !known {
            return Err(NormalizeError::UnknownTemplateParam {
                template: template.name.clone(),
                param: key.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::Backend;
    use pretty_assertions::assert_eq;

    fn template(name: &str, params: Vec<(&str, Value)>) -> Template {
        Template {
            name: name.to_string(),
            kind: TemplateKind::Server,
            params: params
                .into_iter()
                .map(|(key, value)| (key.to_string(), value))
                .collect(),
        }
    }

    fn root_with(servers: Vec<Server>, templates: Vec<Template>) -> RootConfig {
        let mut backend = Backend {
            name: "app".to_string(),
            ..Default::default()
        };
        backend.back.servers = servers;

        let mut root = RootConfig::default();
        root.backends.push(backend);
        for template in templates {
            root.templates.insert(template.name.clone(), template);
        }
        root
    }

    fn spread(mut server: Server, templates: &[&str]) -> Server {
        server.templates = templates.iter().map(|t| t.to_string()).collect();
        server
    }

    #[test]
    fn fills_only_unset_params() {
        let mut server = Server::new("web1", "10.0.0.1");
        server.params.inter = Some("5s".to_string());
        let prod = template(
            "prod",
            vec![
                ("check", Value::Boolean(true)),
                ("inter", Value::from("2s")),
                ("rise", Value::Integer(3)),
            ],
        );

        let root = expand_templates(root_with(vec![spread(server, &["prod"])], vec![prod])).unwrap();

        let server = &root.backends[0].back.servers[0];
        assert_eq!(server.params.check, Some(true));
        assert_eq!(server.params.inter.as_deref(), Some("5s"));
        assert_eq!(server.params.rise, Some(3));
        assert!(server.templates.is_empty());
    }

    #[test]
    fn explicit_default_value_still_wins() {
        let mut server = Server::new("web1", "10.0.0.1");
        server.params.weight = Some(1);
        let heavy = template("heavy", vec![("weight", Value::Integer(100))]);

        let root = expand_templates(root_with(vec![spread(server, &["heavy"])], vec![heavy])).unwrap();

        assert_eq!(root.backends[0].back.servers[0].params.weight, Some(1));
    }

    #[test]
    fn earlier_templates_win() {
        let first = template("first", vec![("maxconn", Value::Integer(10))]);
        let second = template(
            "second",
            vec![("maxconn", Value::Integer(20)), ("backup", Value::Boolean(true))],
        );
        let server = spread(Server::new("web1", "10.0.0.1"), &["first", "second"]);

        let root = expand_templates(root_with(vec![server], vec![first, second])).unwrap();

        let params = &root.backends[0].back.servers[0].params;
        assert_eq!(params.maxconn, Some(10));
        assert_eq!(params.backup, Some(true));
    }

    #[test]
    fn params_are_interpolated_against_globals() {
        let mut root = root_with(
            vec![spread(Server::new("web1", "10.0.0.1"), &["tls"])],
            vec![template(
                "tls",
                vec![
                    ("ca_file", Value::from("${certs}/ca.pem")),
                    ("port", Value::from("${port}")),
                ],
            )],
        );
        for (name, value) in [
            ("certs", Value::from("/etc/ssl")),
            ("port", Value::Integer(8443)),
        ] {
            root.variables.insert(
                name.to_string(),
                Variable {
                    name: name.to_string(),
                    value,
                },
            );
        }

        let root = expand_templates(root).unwrap();

        let server = &root.backends[0].back.servers[0];
        assert_eq!(server.params.ca_file.as_deref(), Some("/etc/ssl/ca.pem"));
        assert_eq!(server.port, Some(8443));
    }

    #[test]
    fn unknown_template_fails() {
        let server = spread(Server::new("web1", "10.0.0.1"), &["nope"]);

        assert_eq!(
            expand_templates(root_with(vec![server], vec![])).unwrap_err(),
            NormalizeError::UnknownTemplate {
                template: "nope".to_string(),
                server: "web1".to_string(),
            }
        );
    }

    #[test]
    fn unknown_param_fails() {
        let server = spread(Server::new("web1", "10.0.0.1"), &["odd"]);
        let odd = template("odd", vec![("colour", Value::from("blue"))]);

        assert_eq!(
            expand_templates(root_with(vec![server], vec![odd])).unwrap_err(),
            NormalizeError::UnknownTemplateParam {
                template: "odd".to_string(),
                param: "colour".to_string(),
            }
        );
    }

    #[test]
    fn address_cannot_be_templated() {
        let server = spread(Server::new("web1", "10.0.0.1"), &["addr"]);
        let addr = template("addr", vec![("address", Value::from("10.9.9.9"))]);

        assert!(expand_templates(root_with(vec![server], vec![addr])).is_err());
    }
}
