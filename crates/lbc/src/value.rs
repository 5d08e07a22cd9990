//! value representation
//!
//! Values are what the author writes on the right hand side of a directive,
//! a variable or a template parameter:
//! - boolean (true/false)
//! - integer (i64)
//! - decimal (f64)
//! - string (utf-8, may still contain `${...}` interpolation until normalized)
//! - array ("list" of values)
//! - object (order-preserving "map", where the key is of type string)
//!
//! There is no `null`. Typed IR fields are read out of values with the
//! `expect_*` accessors, which report the offending key on mismatch.
use serde::{
    ser::{SerializeMap, SerializeSeq},
    Serializer,
};

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(indexmap::IndexMap<String, Value>),
}

impl Value {
    /// Name of the value kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar rendering as it appears in emitted directives
    ///
    /// Arrays render space separated. Objects have no textual form.
    pub fn render(&self) -> Option<String> {
        match self {
            Value::Boolean(b) => Some(b.to_string()),
            Value::Integer(i) => Some(i.to_string()),
            Value::Decimal(d) => Some(d.to_string()),
            Value::String(s) => Some(s.clone()),
            Value::Array(items) => {
                let rendered: Option<Vec<String>> = items.iter().map(Value::render).collect();
                rendered.map(|parts| parts.join(" "))
            }
            Value::Object(_) => None,
        }
    }

    pub fn expect_string(&self, key: &str) -> Result<String, FieldError> {
        match self {
            Value::String(s) => Ok(s.clone()),
            Value::Integer(i) => Ok(i.to_string()),
            Value::Decimal(d) => Ok(d.to_string()),
            other => Err(FieldError::new(key, "string", other.kind())),
        }
    }

    pub fn expect_bool(&self, key: &str) -> Result<bool, FieldError> {
        match self {
            Value::Boolean(b) => Ok(*b),
            Value::String(s) if s == "true" => Ok(true),
            Value::String(s) if s == "false" => Ok(false),
            other => Err(FieldError::new(key, "boolean", other.kind())),
        }
    }

    pub fn expect_integer(&self, key: &str) -> Result<i64, FieldError> {
        match self {
            Value::Integer(i) => Ok(*i),
            Value::String(s) => s
                .trim()
                .parse()
                .map_err(|_| FieldError::new(key, "integer", "string")),
            other => Err(FieldError::new(key, "integer", other.kind())),
        }
    }

    pub fn expect_u32(&self, key: &str) -> Result<u32, FieldError> {
        let int = self.expect_integer(key)?;
        u32::try_from(int).map_err(|_| FieldError::new(key, "unsigned 32 bit integer", "integer"))
    }

    pub fn expect_u16(&self, key: &str) -> Result<u16, FieldError> {
        let int = self.expect_integer(key)?;
        u16::try_from(int).map_err(|_| FieldError::new(key, "port number", "integer"))
    }

    /// A list of strings; a single scalar counts as a list of one
    pub fn expect_string_list(&self, key: &str) -> Result<Vec<String>, FieldError> {
        match self {
            Value::Array(items) => items.iter().map(|item| item.expect_string(key)).collect(),
            scalar => Ok(vec![scalar.expect_string(key)?]),
        }
    }

    pub fn expect_object(
        &self,
        key: &str,
    ) -> Result<&indexmap::IndexMap<String, Value>, FieldError> {
        match self {
            Value::Object(object) => Ok(object),
            other => Err(FieldError::new(key, "object", other.kind())),
        }
    }
}

/// A value did not have the shape a field requires
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[error("`{key}` expects {expected}, found {found}")]
pub struct FieldError {
    pub key: String,
    pub expected: &'static str,
    pub found: &'static str,
}

impl FieldError {
    pub fn new(key: impl Into<String>, expected: &'static str, found: &'static str) -> Self {
        Self {
            key: key.into(),
            expected,
            found,
        }
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<hcl::Number> for Value {
    fn from(value: hcl::Number) -> Self {
        if let Some(int) = value.as_i64() {
            return Value::Integer(int);
        }

        Value::Decimal(value.as_f64().unwrap_or(f64::NAN))
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<K: ToString, V: Into<Value>> From<indexmap::IndexMap<K, V>> for Value {
    fn from(value: indexmap::IndexMap<K, V>) -> Self {
        Value::Object(
            value
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.into()))
                .collect(),
        )
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn render_scalars_and_arrays() {
        assert_eq!(Value::from(true).render().as_deref(), Some("true"));
        assert_eq!(Value::from(8080i64).render().as_deref(), Some("8080"));
        assert_eq!(
            Value::from(vec!["h2", "http/1.1"]).render().as_deref(),
            Some("h2 http/1.1")
        );
        assert_eq!(Value::Object(Default::default()).render(), None);
    }

    #[test]
    fn numeric_strings_are_integers() {
        assert_eq!(Value::from("443").expect_u16("port"), Ok(443));
        assert_eq!(
            Value::from("70000").expect_u16("port"),
            Err(FieldError::new("port", "port number", "integer"))
        );
    }

    #[test]
    fn scalar_is_a_list_of_one() {
        assert_eq!(
            Value::from("gzip").expect_string_list("algo"),
            Ok(vec!["gzip".to_string()])
        );
    }
}
