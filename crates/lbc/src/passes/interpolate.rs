//! `${...}` substitution in strings and values
use super::expr::{evaluate, Lookup};
use super::NormalizeError;
use crate::value::Value;

/// Substitute every `${...}` in `input`; `$${` stands for a literal `${`
pub(crate) fn interpolate(input: &str, lookup: Lookup) -> Result<String, NormalizeError> {
    if !input.contains("${") {
        return Ok(input.to_string());
    }

    let mut output = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(idx) = rest.find("${") {
        if rest[..idx].ends_with('$') {
            output.push_str(&rest[..idx - 1]);
            output.push_str("${");
            rest = &rest[idx + 2..];
            continue;
        }

        output.push_str(&rest[..idx]);
        let after = &rest[idx + 2..];
        let Some(end) = after.find('}') else {
            return Err(NormalizeError::Expression {
                expression: input.to_string(),
                message: "unterminated `${`".to_string(),
            });
        };

        let expression = &after[..end];
        let value = evaluate(expression, &mut *lookup)?;
        match value.render() {
            Some(text) => output.push_str(&text),
            None => {
                return Err(NormalizeError::NotInterpolatable {
                    expression: expression.to_string(),
                    kind: value.kind(),
                })
            }
        }
        rest = &after[end + 1..];
    }

    output.push_str(rest);
    Ok(output)
}

/// The expression of a string that is exactly one `${...}`
fn sole_expression(input: &str) -> Option<&str> {
    let inner = input.strip_prefix("${")?.strip_suffix('}')?;
    if inner.contains('}') || inner.contains("${") {
        return None;
    }
    Some(inner)
}

/// Substitute inside a value, recursing into arrays and objects
///
/// A string that is exactly one `${...}` takes the type of its result, so
/// `port = "${base}"` stays an integer.
pub(crate) fn interpolate_value(value: Value, lookup: Lookup) -> Result<Value, NormalizeError> {
    Ok(match value {
        Value::String(s) => match sole_expression(&s) {
            Some(expression) => evaluate(expression, lookup)?,
            None => Value::String(interpolate(&s, lookup)?),
        },
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| interpolate_value(item, &mut *lookup))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(object) => Value::Object(
            object
                .into_iter()
                .map(|(key, item)| Ok((key, interpolate_value(item, &mut *lookup)?)))
                .collect::<Result<_, NormalizeError>>()?,
        ),
        scalar => scalar,
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn scope(name: &str) -> Result<Value, NormalizeError> {
        match name {
            "host" => Ok(Value::from("10.0.1.1")),
            "port" => Ok(Value::Integer(8080)),
            "tls" => Ok(Value::Boolean(true)),
            "alpn" => Ok(Value::from(vec!["h2", "http/1.1"])),
            other => Err(NormalizeError::UndefinedVariable {
                name: other.to_string(),
            }),
        }
    }

    #[test]
    fn substitutes_inside_text() {
        assert_eq!(
            interpolate("http://${host}:${port}/", &mut scope).unwrap(),
            "http://10.0.1.1:8080/"
        );
        assert_eq!(interpolate("ssl=${tls}", &mut scope).unwrap(), "ssl=true");
        assert_eq!(interpolate("${alpn}", &mut scope).unwrap(), "h2 http/1.1");
        assert_eq!(interpolate("plain", &mut scope).unwrap(), "plain");
    }

    #[test]
    fn dollar_dollar_escapes() {
        assert_eq!(
            interpolate("$${HOME} and ${port}", &mut scope).unwrap(),
            "${HOME} and 8080"
        );
    }

    #[test]
    fn unterminated_is_an_error() {
        assert!(matches!(
            interpolate("${host", &mut scope),
            Err(NormalizeError::Expression { .. })
        ));
    }

    #[test]
    fn sole_expression_keeps_type() {
        assert_eq!(
            interpolate_value(Value::from("${port}"), &mut scope).unwrap(),
            Value::Integer(8080)
        );
        assert_eq!(
            interpolate_value(Value::from("${port + 1}"), &mut scope).unwrap(),
            Value::Integer(8081)
        );
        assert_eq!(
            interpolate_value(Value::from("${host}:${port}"), &mut scope).unwrap(),
            Value::from("10.0.1.1:8080")
        );
        assert_eq!(
            interpolate_value(Value::from(vec!["${port}", "x"]), &mut scope).unwrap(),
            Value::Array(vec![Value::Integer(8080), Value::from("x")])
        );
    }

    #[test]
    fn names_the_missing_variable() {
        assert_eq!(
            interpolate("${nope}", &mut scope).unwrap_err().to_string(),
            "undefined variable `nope`"
        );
    }
}
