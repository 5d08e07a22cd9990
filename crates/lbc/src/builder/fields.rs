//! key/value access for flat records
use super::{classify, At, BuildError, Directive};
use crate::parse_tree::{Child, ObjectNode, Position};
use crate::value::{FieldError, Value};
use indexmap::IndexMap;

/// The pairs of an object, consumed key by key
///
/// Every `take_*` removes the key. [Fields::finish] rejects whatever was
/// not consumed, so typos surface as errors instead of being ignored.
pub(crate) struct Fields {
    directive: String,
    position: Option<Position>,
    entries: IndexMap<String, Value>,
}

impl Fields {
    /// Collect the pairs of an object; nested objects are rejected
    pub fn new(object: &ObjectNode) -> Result<Self, BuildError> {
        Self::from_children(&object.kind, &object.children, object.position)
    }

    pub fn from_children(
        directive: &str,
        children: &[Child],
        position: Option<Position>,
    ) -> Result<Self, BuildError> {
        let mut entries = IndexMap::new();

        for entry in classify(children)? {
            match entry.directive {
                Directive::Pair { key, value } => {
                    entries.insert(key, value);
                }
                other => {
                    return Err(BuildError::Misplaced {
                        directive: other.name().to_string(),
                        section: format!("`{directive}`"),
                        at: At(entry.position.or(position)),
                    })
                }
            }
        }

        Ok(Self {
            directive: directive.to_string(),
            position,
            entries,
        })
    }

    pub fn position(&self) -> Option<Position> {
        self.position
    }

    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.entries.shift_remove(key)
    }

    pub fn field_error(&self, source: FieldError) -> BuildError {
        BuildError::Field {
            directive: self.directive.clone(),
            source,
            at: At(self.position),
        }
    }

    pub fn invalid(&self, message: impl Into<String>) -> BuildError {
        BuildError::Invalid {
            directive: self.directive.clone(),
            message: message.into(),
            at: At(self.position),
        }
    }

    pub fn missing(&self, what: impl Into<String>) -> BuildError {
        BuildError::Missing {
            directive: self.directive.clone(),
            what: what.into(),
            at: At(self.position),
        }
    }

    fn convert<T>(
        &mut self,
        key: &str,
        convert: impl FnOnce(&Value, &str) -> Result<T, FieldError>,
    ) -> Result<Option<T>, BuildError> {
        match self.take(key) {
            None => Ok(None),
            Some(value) => convert(&value, key)
                .map(Some)
                .map_err(|e| self.field_error(e)),
        }
    }

    pub fn string(&mut self, key: &str) -> Result<Option<String>, BuildError> {
        self.convert(key, Value::expect_string)
    }

    pub fn required_string(&mut self, key: &str) -> Result<String, BuildError> {
        match self.string(key)? {
            Some(value) => Ok(value),
            None => Err(self.missing(format!("`{key}`"))),
        }
    }

    /// A presence flag; absent means `false`
    pub fn flag(&mut self, key: &str) -> Result<bool, BuildError> {
        Ok(self.convert(key, Value::expect_bool)?.unwrap_or(false))
    }

    pub fn u32(&mut self, key: &str) -> Result<Option<u32>, BuildError> {
        self.convert(key, Value::expect_u32)
    }

    pub fn u16(&mut self, key: &str) -> Result<Option<u16>, BuildError> {
        self.convert(key, Value::expect_u16)
    }

    /// Absent means empty
    pub fn list(&mut self, key: &str) -> Result<Vec<String>, BuildError> {
        Ok(self
            .convert(key, Value::expect_string_list)?
            .unwrap_or_default())
    }

    /// Hand the remaining pairs to the caller in declaration order
    pub fn drain(&mut self) -> impl Iterator<Item = (String, Value)> + '_ {
        self.entries.drain(..)
    }

    /// Fail on the first key nobody asked for
    pub fn finish(self) -> Result<(), BuildError> {
        match self.entries.into_iter().next() {
            None => Ok(()),
            Some((key, _)) => Err(BuildError::UnknownKey {
                key,
                directive: self.directive,
                at: At(self.position),
            }),
        }
    }
}
