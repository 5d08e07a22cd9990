//! generic parse tree
//!
//! This is the shape a front end hands to [crate::builder]. It carries no
//! knowledge of HAProxy directives: a section is an ordered list of
//! [Child]ren, and every child already says whether it is a key/value pair,
//! a typed sub-object, a list of typed sub-objects or a loop.
//!
//! Any front end producing this shape can drive the compiler. The bundled one
//! lives in [crate::hcl_front].
use crate::value::Value;

/// A whole source document
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct Document {
    pub items: Vec<Item>,
}

/// Top level entries of a document
#[derive(Debug, Clone, serde::Serialize)]
pub enum Item {
    Variable {
        name: String,
        value: Expr,
        position: Option<Position>,
    },
    Template {
        name: String,
        children: Vec<Child>,
        position: Option<Position>,
    },
    Import {
        path: String,
        position: Option<Position>,
    },
    Section(SectionNode),
}

/// `global`, `defaults`, `frontend`, `backend`, `listen`, `peers`,
/// `resolvers`, `mailers` or `script`
#[derive(Debug, Clone, serde::Serialize)]
pub struct SectionNode {
    pub kind: String,
    pub name: Option<String>,
    pub children: Vec<Child>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum Child {
    Pair {
        key: String,
        value: Expr,
        position: Option<Position>,
    },
    Object(ObjectNode),
    List {
        kind: String,
        items: Vec<ObjectNode>,
        position: Option<Position>,
    },
    Loop(LoopNode),
}

impl Child {
    pub fn position(&self) -> Option<Position> {
        match self {
            Child::Pair { position, .. } => *position,
            Child::Object(object) => object.position,
            Child::List { position, .. } => *position,
            Child::Loop(node) => node.position,
        }
    }
}

/// A typed sub-object such as `server "web1" { ... }`
#[derive(Debug, Clone, serde::Serialize)]
pub struct ObjectNode {
    pub kind: String,
    pub labels: Vec<String>,
    pub children: Vec<Child>,
    /// Templates the author spread into this object, in listed order
    pub spreads: Vec<String>,
    pub position: Option<Position>,
}

impl ObjectNode {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            labels: vec![],
            children: vec![],
            spreads: vec![],
            position: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.push(label.into());
        self
    }

    pub fn pair(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.children.push(Child::Pair {
            key: key.into(),
            value: Expr::Literal(value.into()),
            position: None,
        });
        self
    }

    pub fn child(mut self, child: impl Into<Child>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn spread(mut self, template: impl Into<String>) -> Self {
        self.spreads.push(template.into());
        self
    }
}

impl From<ObjectNode> for Child {
    fn from(value: ObjectNode) -> Self {
        Child::Object(value)
    }
}

impl From<LoopNode> for Child {
    fn from(value: LoopNode) -> Self {
        Child::Loop(value)
    }
}

/// `for <variable> in <iterable> { <body> }`
#[derive(Debug, Clone, serde::Serialize)]
pub struct LoopNode {
    pub variable: String,
    pub iterable: Iterable,
    pub body: Vec<ObjectNode>,
    pub position: Option<Position>,
}

#[derive(Debug, Clone, serde::Serialize)]
pub enum Iterable {
    /// Inclusive range, bounds are integers or `${...}` strings
    Range { start: Expr, end: Expr },
    List(Vec<Expr>),
}

/// Right hand side expressions
///
/// The only thing that is not plain data is the environment lookup, which
/// the builder evaluates.
#[derive(Debug, Clone, serde::Serialize)]
pub enum Expr {
    Literal(Value),
    Array(Vec<Expr>),
    Object(indexmap::IndexMap<String, Expr>),
    Env {
        name: String,
        default: Option<Box<Expr>>,
    },
}

impl From<Value> for Expr {
    fn from(value: Value) -> Self {
        Expr::Literal(value)
    }
}

/// 1-based line and column in the source document
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Position {
    /// Compute a position from a byte offset into `source`
    pub fn from_offset(source: &str, offset: usize) -> Self {
        let offset = offset.min(source.len());
        let before = &source.as_bytes()[..offset];
        let line = before.iter().filter(|b| **b == b'\n').count() + 1;
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);

        Self {
            line,
            column: offset - line_start + 1,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn position_from_offset() {
        let source = "one\ntwo three\n";
        assert_eq!(
            Position::from_offset(source, 0),
            Position { line: 1, column: 1 }
        );
        assert_eq!(
            Position::from_offset(source, 8),
            Position { line: 2, column: 5 }
        );
    }
}
