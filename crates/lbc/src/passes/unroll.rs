//! loop unrolling
use super::interpolate::{interpolate, interpolate_value};
use super::NormalizeError;
use crate::ir::{Bound, LoopIterable, RootConfig, Server, ServerLoop, Variable};
use crate::value::Value;
use crate::visit::rewrite_templated;
use indexmap::IndexMap;

/// Replace every loop descriptor with the servers it generates
///
/// Bounds and list items are evaluated against the global variables, the
/// body against the globals plus the loop variable. Generated servers are
/// appended after the servers written out explicitly.
#[tracing::instrument(level = "debug", skip_all)]
pub fn unroll(mut root: RootConfig) -> Result<RootConfig, NormalizeError> {
    let globals = std::mem::take(&mut root.variables);
    let mut generated = 0usize;

    for (pool, back) in root.server_pools_mut() {
        for server_loop in std::mem::take(&mut back.loops) {
            let values = iterate(&server_loop, &globals)?;
            tracing::trace!(%pool, variable = %server_loop.variable, iterations = values.len(), "unrolling");

            for value in values {
                for template in &server_loop.body {
                    back.servers
                        .push(instantiate(template, &server_loop.variable, &value, &globals)?);
                    generated += 1;
                }
            }
        }
    }

    tracing::debug!(generated, "loops unrolled");
    root.variables = globals;
    Ok(root)
}

fn global_lookup(
    globals: &IndexMap<String, Variable>,
) -> impl FnMut(&str) -> Result<Value, NormalizeError> + '_ {
    |name: &str| {
        globals
            .get(name)
            .map(|variable| variable.value.clone())
            .ok_or_else(|| NormalizeError::UndefinedVariable {
                name: name.to_string(),
            })
    }
}

/// The values the loop variable takes, in iteration order
fn iterate(
    server_loop: &ServerLoop,
    globals: &IndexMap<String, Variable>,
) -> Result<Vec<Value>, NormalizeError> {
    match &server_loop.iterable {
        LoopIterable::Range { start, end } => {
            let start = bound(start, server_loop, globals)?;
            let end = bound(end, server_loop, globals)?;
            // a descending range is empty
            Ok((start..=end).map(Value::Integer).collect())
        }
        LoopIterable::List(items) => items
            .iter()
            .map(|item| interpolate_value(item.clone(), &mut global_lookup(globals)))
            .collect(),
    }
}

fn bound(
    bound: &Bound,
    server_loop: &ServerLoop,
    globals: &IndexMap<String, Variable>,
) -> Result<i64, NormalizeError> {
    let source = match bound {
        Bound::Integer(int) => return Ok(*int),
        Bound::Expr(source) => source,
    };

    let invalid = |message: String| NormalizeError::InvalidLoopBound {
        variable: server_loop.variable.clone(),
        bound: source.clone(),
        message,
    };

    let value = interpolate_value(Value::String(source.clone()), &mut global_lookup(globals))
        .map_err(|e| invalid(e.to_string()))?;
    match value {
        Value::Integer(int) => Ok(int),
        Value::String(s) => s
            .trim()
            .parse()
            .map_err(|_| invalid(format!("`{s}` is not an integer"))),
        other => Err(invalid(format!("evaluates to a {}", other.kind()))),
    }
}

/// Clone a body server and substitute with the loop variable in scope
fn instantiate(
    template: &Server,
    variable: &str,
    value: &Value,
    globals: &IndexMap<String, Variable>,
) -> Result<Server, NormalizeError> {
    let mut server = template.clone();
    let mut lookup = |name: &str| {
        if name == variable {
            return Ok(value.clone());
        }
        global_lookup(globals)(name)
    };

    rewrite_templated(&mut server, |s| interpolate(s, &mut lookup))?;
    Ok(server)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ir::Backend;
    use pretty_assertions::assert_eq;

    fn root_with(server_loop: ServerLoop) -> RootConfig {
        let mut backend = Backend {
            name: "app".to_string(),
            ..Default::default()
        };
        backend.back.servers.push(Server::new("static", "10.0.0.100"));
        backend.back.loops.push(server_loop);

        let mut root = RootConfig::default();
        root.variables.insert(
            "count".to_string(),
            Variable {
                name: "count".to_string(),
                value: Value::Integer(3),
            },
        );
        root.backends.push(backend);
        root
    }

    fn range(start: Bound, end: Bound) -> ServerLoop {
        ServerLoop {
            variable: "i".to_string(),
            iterable: LoopIterable::Range { start, end },
            body: vec![Server::new("web${i}", "10.0.0.${i + 10}")],
        }
    }

    fn names(root: &RootConfig) -> Vec<(&str, &str)> {
        root.backends[0]
            .back
            .servers
            .iter()
            .map(|s| (s.name.as_str(), s.address.as_str()))
            .collect()
    }

    #[test]
    fn inclusive_range_in_order() {
        let root = unroll(root_with(range(
            Bound::Integer(1),
            Bound::Expr("${count}".to_string()),
        )))
        .unwrap();

        assert_eq!(
            names(&root),
            vec![
                ("static", "10.0.0.100"),
                ("web1", "10.0.0.11"),
                ("web2", "10.0.0.12"),
                ("web3", "10.0.0.13"),
            ]
        );
        assert!(root.backends[0].back.loops.is_empty());
    }

    #[test]
    fn bound_expressions() {
        let root = unroll(root_with(range(
            Bound::Expr("${count - 1}".to_string()),
            Bound::Expr("${count + 1}".to_string()),
        )))
        .unwrap();

        assert_eq!(root.backends[0].back.servers.len(), 1 + 3);
    }

    #[test]
    fn descending_range_is_empty() {
        let root = unroll(root_with(range(Bound::Integer(5), Bound::Integer(2)))).unwrap();

        assert_eq!(names(&root), vec![("static", "10.0.0.100")]);
    }

    #[test]
    fn list_iteration() {
        let server_loop = ServerLoop {
            variable: "zone".to_string(),
            iterable: LoopIterable::List(vec![Value::from("a"), Value::from("b")]),
            body: vec![Server::new("web-${zone}", "${zone}.internal")],
        };

        let root = unroll(root_with(server_loop)).unwrap();

        assert_eq!(
            names(&root),
            vec![
                ("static", "10.0.0.100"),
                ("web-a", "a.internal"),
                ("web-b", "b.internal"),
            ]
        );
    }

    #[test]
    fn loop_variable_shadows_globals() {
        let server_loop = ServerLoop {
            variable: "count".to_string(),
            iterable: LoopIterable::List(vec![Value::Integer(7)]),
            body: vec![Server::new("web${count}", "10.0.0.1")],
        };

        let root = unroll(root_with(server_loop)).unwrap();

        assert_eq!(root.backends[0].back.servers[1].name, "web7");
    }

    #[test]
    fn unresolvable_bound_aborts() {
        let err = unroll(root_with(range(
            Bound::Integer(1),
            Bound::Expr("${missing}".to_string()),
        )))
        .unwrap_err();

        assert_eq!(
            err,
            NormalizeError::InvalidLoopBound {
                variable: "i".to_string(),
                bound: "${missing}".to_string(),
                message: "undefined variable `missing`".to_string(),
            }
        );
    }

    #[test]
    fn rejects_calls_in_body() {
        let server_loop = ServerLoop {
            variable: "i".to_string(),
            iterable: LoopIterable::List(vec![Value::Integer(1)]),
            body: vec![Server::new("web${upper(i)}", "10.0.0.1")],
        };

        assert!(matches!(
            unroll(root_with(server_loop)),
            Err(NormalizeError::Expression { .. })
        ));
    }
}
