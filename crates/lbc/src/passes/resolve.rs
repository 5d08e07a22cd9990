//! variable resolution
use super::interpolate::{interpolate, interpolate_value};
use super::NormalizeError;
use crate::ir::{RootConfig, Variable};
use crate::value::Value;
use crate::visit::rewrite_templated;
use indexmap::IndexMap;

/// Resolves variables on demand, remembering the chain to report cycles
struct Variables<'a> {
    declared: &'a IndexMap<String, Variable>,
    resolved: IndexMap<String, Value>,
    stack: Vec<String>,
}

impl Variables<'_> {
    fn get(&mut self, name: &str) -> Result<Value, NormalizeError> {
        if let Some(value) = self.resolved.get(name) {
            return Ok(value.clone());
        }

        let declared = self.declared;
        let Some(variable) = declared.get(name) else {
            return Err(NormalizeError::UndefinedVariable {
                name: name.to_string(),
            });
        };

        if let Some(start) = self.stack.iter().position(|entry| entry == name) {
            let mut chain = self.stack[start..].to_vec();
            chain.push(name.to_string());
            return Err(NormalizeError::VariableCycle {
                chain: chain.join(" -> "),
            });
        }

        self.stack.push(name.to_string());
        let value = interpolate_value(variable.value.clone(), &mut |name| self.get(name))?;
        self.stack.pop();

        tracing::trace!(%name, ?value, "resolved variable");
        self.resolved.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

/// Resolve every variable, then substitute `${...}` in every string field
///
/// Loop bodies and template parameters are left alone; they are resolved
/// later against a wider scope. The resolved variables stay on the root for
/// those later passes.
#[tracing::instrument(level = "debug", skip_all)]
pub fn resolve(mut root: RootConfig) -> Result<RootConfig, NormalizeError> {
    let declared = std::mem::take(&mut root.variables);

    let mut variables = Variables {
        declared: &declared,
        resolved: IndexMap::new(),
        stack: vec![],
    };
    for name in declared.keys() {
        variables.get(name)?;
    }
    let resolved = variables.resolved;

    let substituted = rewrite_templated(&mut root, |s| {
        interpolate(s, &mut |name: &str| {
            resolved
                .get(name)
                .cloned()
                .ok_or_else(|| NormalizeError::UndefinedVariable {
                    name: name.to_string(),
                })
        })
    })?;

    tracing::debug!(variables = resolved.len(), substituted, "variables resolved");

    root.variables = declared
        .into_iter()
        .map(|(name, variable)| {
            let value = resolved
                .get(&name)
                .cloned()
                .unwrap_or(variable.value);
            (name.clone(), Variable { name, value })
        })
        .collect();

    Ok(root)
}
