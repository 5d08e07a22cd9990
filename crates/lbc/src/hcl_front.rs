//! HCL front end
//!
//! Parses HCL with [hcl_edit] and maps it onto the [parse tree](crate::parse_tree).
//!
//! ```hcl
//! subnet = "10.0.0"                     # root attribute: a variable
//!
//! template "base" {                     # a named parameter bag
//!   kind  = "server"
//!   check = true
//! }
//!
//! backend "app" {                       # a section, one optional label
//!   balance = "leastconn"               # attribute: a pair
//!   timeouts = { server = "30s" }       # object attribute: a sub-object
//!   acl = [                             # array of objects: a list,
//!     { label = "api", criterion = "path_beg", values = ["/api"] },
//!     { label = "static", criterion = "path_end", values = [".css"] },
//!   ]                                   # `label`/`labels` give the labels
//!
//!   server "web1" {                     # block: a sub-object with labels
//!     address   = "${subnet}.1"
//!     port      = 8080
//!     templates = ["base"]              # spread
//!   }
//!
//!   for "i" {                           # loop over servers
//!     range = [2, 4]
//!     server {                          # labels are plain strings,
//!       name    = "web${i}"             # so interpolated names go
//!       address = "${subnet}.${i}"      # into `name`
//!     }
//!   }
//! }
//! ```
//!
//! Strings are kept raw, `${...}` is evaluated later by [crate::passes]. The
//! only function is `env("NAME", "default")`; references, operators and
//! other functions are rejected here with their position.
use crate::builder::At;
use crate::parse_tree::*;
use hcl_edit::structure::{Attribute, Block, Body, Structure};
use hcl_edit::Span;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Block identifiers that open a section at the root
const SECTIONS: &[&str] = &[
    "global",
    "defaults",
    "frontend",
    "backend",
    "listen",
    "peers",
    "resolvers",
    "mailers",
    "script",
];

#[derive(thiserror::Error, Debug)]
pub enum ParseError {
    #[error("unable to parse hcl: {0}")]
    Syntax(#[from] hcl_edit::parser::Error),
    #[error("{what} is not supported{at}")]
    Unsupported { what: String, at: At },
    #[error("invalid `{construct}`{at}: {message}")]
    Invalid {
        construct: String,
        message: String,
        at: At,
    },
    #[error("unable to read `{}`", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("in `{}`: {source}", path.display())]
    File {
        path: PathBuf,
        source: Box<ParseError>,
    },
    #[error("no .hcl files found in `{}`", path.display())]
    NoFilesFound { path: PathBuf },
}

/// Parse one HCL document
#[tracing::instrument(level = "debug", skip_all)]
pub fn parse_document(source: &str) -> Result<Document, ParseError> {
    let body = hcl_edit::parser::parse_body(source)?;
    let front = Front { source };

    let mut items = vec![];
    for structure in body.iter() {
        items.push(match structure {
            Structure::Attribute(attribute) => {
                let position = front.position(attribute);
                Item::Variable {
                    name: attribute.key.value().as_str().to_string(),
                    value: expr(attribute.value.clone().into(), position)?,
                    position,
                }
            }
            Structure::Block(block) => front.item(block)?,
        });
    }

    tracing::debug!(items = items.len(), "parsed document");
    Ok(Document { items })
}

struct Front<'a> {
    source: &'a str,
}

impl Front<'_> {
    fn position(&self, node: &impl Span) -> Option<Position> {
        node.span()
            .map(|span| Position::from_offset(self.source, span.start))
    }

    fn item(&self, block: &Block) -> Result<Item, ParseError> {
        let ident = block.ident.value().as_str();
        let position = self.position(block);
        let labels = labels(block);

        match ident {
            "template" => Ok(Item::Template {
                name: self.single_label(ident, labels, position)?,
                children: self.children(&block.body)?,
                position,
            }),
            "import" => Ok(Item::Import {
                path: self.single_label(ident, labels, position)?,
                position,
            }),
            kind if SECTIONS.contains(&kind) => {
                if labels.len() > 1 {
                    return Err(ParseError::Invalid {
                        construct: kind.to_string(),
                        message: "at most one label is allowed".to_string(),
                        at: At(position),
                    });
                }
                Ok(Item::Section(SectionNode {
                    kind: kind.to_string(),
                    name: labels.into_iter().next(),
                    children: self.children(&block.body)?,
                    position,
                }))
            }
            other => Err(ParseError::Unsupported {
                what: format!("top level block `{other}`"),
                at: At(position),
            }),
        }
    }

    fn single_label(
        &self,
        construct: &str,
        labels: Vec<String>,
        position: Option<Position>,
    ) -> Result<String, ParseError> {
        match <[String; 1]>::try_from(labels) {
            Ok([label]) => Ok(label),
            Err(_) => Err(ParseError::Invalid {
                construct: construct.to_string(),
                message: "exactly one label is required".to_string(),
                at: At(position),
            }),
        }
    }

    fn children(&self, body: &Body) -> Result<Vec<Child>, ParseError> {
        body.iter()
            .map(|structure| match structure {
                Structure::Attribute(attribute) => self.attribute(attribute),
                Structure::Block(block) if block.ident.value().as_str() == "for" => {
                    self.for_loop(block).map(Child::Loop)
                }
                Structure::Block(block) => self.object(block).map(Child::Object),
            })
            .collect()
    }

    fn attribute(&self, attribute: &Attribute) -> Result<Child, ParseError> {
        let key = attribute.key.value().as_str().to_string();
        let position = self.position(attribute);
        let value: hcl::Expression = attribute.value.clone().into();
        child(key, value, position)
    }

    fn object(&self, block: &Block) -> Result<ObjectNode, ParseError> {
        let kind = block.ident.value().as_str().to_string();
        let position = self.position(block);

        let mut object = ObjectNode {
            kind,
            labels: labels(block),
            children: vec![],
            spreads: vec![],
            position,
        };

        for structure in block.body.iter() {
            match structure {
                Structure::Attribute(attribute) if attribute.key.value().as_str() == "templates" => {
                    let value: hcl::Expression = attribute.value.clone().into();
                    object.spreads = spreads(value, self.position(attribute))?;
                }
                Structure::Attribute(attribute) => object.children.push(self.attribute(attribute)?),
                Structure::Block(inner) if inner.ident.value().as_str() == "for" => {
                    return Err(ParseError::Unsupported {
                        what: format!("`for` inside `{}`", object.kind),
                        at: At(self.position(inner)),
                    })
                }
                Structure::Block(inner) => object.children.push(Child::Object(self.object(inner)?)),
            }
        }

        Ok(object)
    }

    fn for_loop(&self, block: &Block) -> Result<LoopNode, ParseError> {
        let position = self.position(block);
        let variable = self.single_label("for", labels(block), position)?;

        let mut iterable = None;
        let mut body = vec![];
        for structure in block.body.iter() {
            match structure {
                Structure::Attribute(attribute) => {
                    let key = attribute.key.value().as_str();
                    let at = self.position(attribute);
                    let value: hcl::Expression = attribute.value.clone().into();
                    let parsed = match (key, value) {
                        ("range", value) => range(value, at)?,
                        ("in", hcl::Expression::Array(items)) => Iterable::List(
                            items
                                .into_iter()
                                .map(|item| expr(item, at))
                                .collect::<Result<_, _>>()?,
                        ),
                        ("in", _) => return Err(invalid("for", "`in` must be an array", at)),
                        // `server = { .. }` or `server = [{ .. }, ..]` in the body
                        (kind, value) => match child(kind.to_string(), value, at)? {
                            Child::Object(object) => {
                                body.push(object);
                                continue;
                            }
                            Child::List { items, .. } => {
                                body.extend(items);
                                continue;
                            }
                            _ => {
                                return Err(invalid(
                                    "for",
                                    format!("unknown key `{kind}`, expected `range` or `in`"),
                                    at,
                                ));
                            }
                        },
                    };
                    if iterable.replace(parsed).is_some() {
                        return Err(invalid("for", "more than one iterable", at));
                    }
                }
                Structure::Block(inner) if inner.ident.value().as_str() == "for" => {
                    return Err(ParseError::Unsupported {
                        what: "nested `for`".to_string(),
                        at: At(self.position(inner)),
                    })
                }
                Structure::Block(inner) => body.push(self.object(inner)?),
            }
        }

        let Some(iterable) = iterable else {
            return Err(invalid("for", "`range` or `in` is required", position));
        };

        Ok(LoopNode {
            variable,
            iterable,
            body,
            position,
        })
    }
}

fn labels(block: &Block) -> Vec<String> {
    block
        .labels
        .iter()
        .map(|label| label.as_str().to_string())
        .collect()
}

fn invalid(construct: &str, message: impl Into<String>, position: Option<Position>) -> ParseError {
    ParseError::Invalid {
        construct: construct.to_string(),
        message: message.into(),
        at: At(position),
    }
}

/// An attribute inside a section or object
fn child(key: String, value: hcl::Expression, position: Option<Position>) -> Result<Child, ParseError> {
    match value {
        hcl::Expression::Object(object) => Ok(Child::Object(object_node(key, object, position)?)),
        hcl::Expression::Array(items)
            if !items.is_empty() && items.iter().all(|item| matches!(item, hcl::Expression::Object(_))) =>
        {
            let items = items
                .into_iter()
                .filter_map(|item| match item {
                    hcl::Expression::Object(object) => Some(object),
                    _ => None,
                })
                .map(|object| object_node(key.clone(), object, position))
                .collect::<Result<_, _>>()?;
            Ok(Child::List {
                kind: key,
                items,
                position,
            })
        }
        value => Ok(Child::Pair {
            key,
            value: expr(value, position)?,
            position,
        }),
    }
}

/// An object literal standing for a typed sub-object
fn object_node(
    kind: String,
    object: hcl::Object<hcl::ObjectKey, hcl::Expression>,
    position: Option<Position>,
) -> Result<ObjectNode, ParseError> {
    let mut node = ObjectNode::new(kind);
    node.position = position;

    for (key, value) in object {
        let key = object_key(key, position)?;
        match key.as_str() {
            "templates" => node.spreads = spreads(value, position)?,
            "label" => node.labels.push(string(value, "label", position)?),
            "labels" => {
                let hcl::Expression::Array(labels) = value else {
                    return Err(invalid("labels", "expected an array of strings", position));
                };
                for label in labels {
                    node.labels.push(string(label, "labels", position)?);
                }
            }
            _ => node.children.push(child(key, value, position)?),
        }
    }

    Ok(node)
}

fn string(value: hcl::Expression, construct: &str, position: Option<Position>) -> Result<String, ParseError> {
    match value {
        hcl::Expression::String(text) => Ok(text),
        hcl::Expression::TemplateExpr(template) => match *template {
            hcl::expr::TemplateExpr::QuotedString(text) => Ok(text),
            hcl::expr::TemplateExpr::Heredoc(heredoc) => Ok(heredoc.template),
        },
        _ => Err(invalid(construct, "expected a string", position)),
    }
}

fn object_key(key: hcl::ObjectKey, position: Option<Position>) -> Result<String, ParseError> {
    match key {
        hcl::ObjectKey::Identifier(ident) => Ok(ident.to_string()),
        hcl::ObjectKey::Expression(hcl::Expression::String(key)) => Ok(key),
        _ => Err(ParseError::Unsupported {
            what: "computed object key".to_string(),
            at: At(position),
        }),
    }
}

/// `templates = ["a", "b"]`
fn spreads(value: hcl::Expression, position: Option<Position>) -> Result<Vec<String>, ParseError> {
    let hcl::Expression::Array(items) = value else {
        return Err(invalid("templates", "expected an array of template names", position));
    };

    items
        .into_iter()
        .map(|item| match item {
            hcl::Expression::String(name) => Ok(name),
            _ => Err(invalid("templates", "template names must be plain strings", position)),
        })
        .collect()
}

/// `range = [a, b]` or `range = "a..b"`
fn range(value: hcl::Expression, position: Option<Position>) -> Result<Iterable, ParseError> {
    match value {
        hcl::Expression::Array(bounds) => {
            let Ok([start, end]) = <[hcl::Expression; 2]>::try_from(bounds) else {
                return Err(invalid("for", "`range` takes exactly two bounds", position));
            };
            Ok(Iterable::Range {
                start: expr(start, position)?,
                end: expr(end, position)?,
            })
        }
        value => {
            let Expr::Literal(crate::value::Value::String(text)) = expr(value, position)? else {
                return Err(invalid("for", "`range` must be `[start, end]` or \"start..end\"", position));
            };
            let Some((start, end)) = text.split_once("..") else {
                return Err(invalid("for", format!("`{text}` is not a `start..end` range"), position));
            };
            Ok(Iterable::Range {
                start: bound(start),
                end: bound(end),
            })
        }
    }
}

fn bound(text: &str) -> Expr {
    let text = text.trim();
    match text.parse::<i64>() {
        Ok(int) => Expr::Literal(int.into()),
        Err(_) => Expr::Literal(text.into()),
    }
}

/// Convert a right hand side expression
fn expr(value: hcl::Expression, position: Option<Position>) -> Result<Expr, ParseError> {
    let unsupported = |what: &str| ParseError::Unsupported {
        what: what.to_string(),
        at: At(position),
    };

    Ok(match value {
        hcl::Expression::Bool(value) => Expr::Literal(value.into()),
        hcl::Expression::Number(number) => Expr::Literal(number.into()),
        // a plain string can only hold `${` if the author escaped it
        hcl::Expression::String(text) => Expr::Literal(text.replace("${", "$${").into()),
        hcl::Expression::TemplateExpr(template) => match *template {
            hcl::expr::TemplateExpr::QuotedString(text) => Expr::Literal(text.into()),
            hcl::expr::TemplateExpr::Heredoc(heredoc) => Expr::Literal(heredoc.template.into()),
        },
        hcl::Expression::Array(items) => Expr::Array(
            items
                .into_iter()
                .map(|item| expr(item, position))
                .collect::<Result<_, _>>()?,
        ),
        hcl::Expression::Object(object) => {
            let mut entries = IndexMap::new();
            for (key, item) in object {
                entries.insert(object_key(key, position)?, expr(item, position)?);
            }
            Expr::Object(entries)
        }
        hcl::Expression::Parenthesis(inner) => expr(*inner, position)?,
        hcl::Expression::FuncCall(call) => {
            let name = call.name.to_string();
            if name != "env" {
                return Err(unsupported(&format!("function `{name}`")));
            }
            let mut args = call.args.into_iter();
            let variable = match args.next() {
                Some(hcl::Expression::String(variable)) => variable,
                _ => return Err(invalid("env", "the first argument must be a plain string", position)),
            };
            let default = args
                .next()
                .map(|default| expr(default, position))
                .transpose()?
                .map(Box::new);
            if args.next().is_some() {
                return Err(invalid("env", "takes at most two arguments", position));
            }
            Expr::Env {
                name: variable,
                default,
            }
        }
        hcl::Expression::Null => return Err(unsupported("null")),
        hcl::Expression::Variable(variable) => {
            let variable = variable.into_inner();
            return Err(unsupported(&format!(
                "reference `{variable}` (write \"${{{variable}}}\")"
            )))
        }
        hcl::Expression::Traversal(_) => return Err(unsupported("attribute access")),
        hcl::Expression::Operation(_) => return Err(unsupported("operator outside `${...}`")),
        hcl::Expression::Conditional(_) => return Err(unsupported("conditional expression")),
        hcl::Expression::ForExpr(_) => return Err(unsupported("for expression")),
        #[allow(unreachable_patterns)]
        _ => return Err(unsupported("expression")),
    })
}

/// Documents loaded from files, with their imports
///
/// Imports are loaded relative to the importing file, before the items of
/// the importing file. Every file is loaded at most once.
#[derive(Debug, Default)]
pub struct HclSources {
    loaded: Vec<PathBuf>,
    items: Vec<Item>,
}

impl HclSources {
    /// Add an in-memory document
    pub fn insert(&mut self, document: Document) {
        self.items.extend(document.items);
    }

    pub fn load_file(&mut self, path: &Path) -> Result<(), ParseError> {
        let path = path.canonicalize().map_err(|source| ParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if self.loaded.contains(&path) {
            tracing::debug!(path = %path.display(), "already loaded");
            return Ok(());
        }
        tracing::info!(path = %path.display(), "loading file");
        self.loaded.push(path.clone());

        let source = std::fs::read_to_string(&path).map_err(|source| ParseError::Io {
            path: path.clone(),
            source,
        })?;
        let document = parse_document(&source).map_err(|source| ParseError::File {
            path: path.clone(),
            source: Box::new(source),
        })?;

        let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
        for item in document.items {
            if let Item::Import { path: import, .. } = &item {
                self.load_file(&base.join(import))?;
            }
            self.items.push(item);
        }

        Ok(())
    }

    /// Load every `*.hcl` file of a directory, in file name order
    pub fn load_directory(&mut self, directory: &Path) -> Result<(), ParseError> {
        let io = |source| ParseError::Io {
            path: directory.to_path_buf(),
            source,
        };

        let mut files = vec![];
        for entry in std::fs::read_dir(directory).map_err(io)? {
            let entry = entry.map_err(io)?;
            if !entry.file_type().map_err(io)?.is_file() {
                continue;
            }
            if entry.file_name().to_string_lossy().ends_with(".hcl") {
                files.push(entry.path());
            }
        }

        if files.is_empty() {
            return Err(ParseError::NoFilesFound {
                path: directory.to_path_buf(),
            });
        }

        files.sort();
        for file in files {
            self.load_file(&file)?;
        }
        Ok(())
    }

    pub fn source_count(&self) -> usize {
        self.loaded.len()
    }

    pub fn into_document(self) -> Document {
        Document { items: self.items }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn parse(source: &str) -> Document {
        parse_document(source).expect("document must parse")
    }

    fn section(document: &Document, index: usize) -> &SectionNode {
        match &document.items[index] {
            Item::Section(section) => section,
            other => panic!("expected a section, got {other:?}"),
        }
    }

    fn error(source: &str) -> String {
        parse_document(source)
            .expect_err("document must not parse")
            .to_string()
    }

    #[test]
    fn root_items() {
        let document = parse(
            r#"
count = 3
import "common.hcl" {}
template "base" {
  kind = "server"
}
global {}
backend "app" {}
"#,
        );

        assert!(matches!(
            &document.items[0],
            Item::Variable { name, value: Expr::Literal(Value::Integer(3)), .. } if name == "count"
        ));
        assert!(matches!(&document.items[1], Item::Import { path, .. } if path == "common.hcl"));
        assert!(matches!(&document.items[2], Item::Template { name, .. } if name == "base"));
        assert_eq!(section(&document, 3).name, None);
        assert_eq!(section(&document, 4).name.as_deref(), Some("app"));
        assert_eq!(
            section(&document, 4).position,
            Some(Position { line: 8, column: 1 })
        );
    }

    #[test]
    fn children_are_classified() {
        let document = parse(
            r#"
frontend "web" {
  mode = "http"
  timeouts = { client = "30s" }
  bind = [{ label = "*:80" }, { label = "*:443", ssl = true }]
  acl "is_api" {
    criterion = "path_beg"
    values = ["/api"]
  }
}
"#,
        );
        let children = &section(&document, 0).children;

        assert!(matches!(&children[0], Child::Pair { key, .. } if key == "mode"));
        assert!(matches!(&children[1], Child::Object(object) if object.kind == "timeouts"));
        let Child::List { kind, items, .. } = &children[2] else {
            panic!("binds must be a list");
        };
        assert_eq!(kind, "bind");
        assert_eq!(items[1].kind, "bind");
        assert_eq!(items[1].labels, vec!["*:443"]);
        assert_eq!(items[1].children.len(), 1);
        let Child::Object(acl) = &children[3] else {
            panic!("acl must be an object");
        };
        assert_eq!(acl.labels, vec!["is_api"]);
        assert_eq!(acl.children.len(), 2);
    }

    #[test]
    fn templates_and_interpolation_stay_raw() {
        let document = parse(
            r#"
backend "app" {
  server "web1" {
    address = "10.0.0.${i + 10}"
    templates = ["base", "tls"]
  }
}
"#,
        );
        let Child::Object(server) = &section(&document, 0).children[0] else {
            panic!("server must be an object");
        };

        assert_eq!(server.spreads, vec!["base", "tls"]);
        assert!(matches!(
            &server.children[0],
            Child::Pair { value: Expr::Literal(Value::String(address)), .. } if address == "10.0.0.${i + 10}"
        ));
    }

    #[test]
    fn loops() {
        let document = parse(
            r#"
backend "app" {
  for "i" {
    range = "1..${count}"
    server {
      name    = "web${i}"
      address = "10.0.0.${i}"
    }
  }
  for "host" {
    in = ["a", "b"]
    server = [
      { name = "${host}", address = "${host}.internal" },
      { name = "${host}-spare", address = "${host}.spare.internal", backup = true },
    ]
  }
}
"#,
        );
        let children = &section(&document, 0).children;

        let Child::Loop(range) = &children[0] else {
            panic!("expected a loop");
        };
        assert_eq!(range.variable, "i");
        assert!(matches!(
            &range.iterable,
            Iterable::Range {
                start: Expr::Literal(Value::Integer(1)),
                end: Expr::Literal(Value::String(end)),
            } if end == "${count}"
        ));
        assert_eq!(range.body.len(), 1);
        assert!(range.body[0].labels.is_empty());
        assert!(matches!(
            &range.body[0].children[0],
            Child::Pair { key, value: Expr::Literal(Value::String(name)), .. }
                if key == "name" && name == "web${i}"
        ));

        let Child::Loop(list) = &children[1] else {
            panic!("expected a loop");
        };
        assert!(matches!(&list.iterable, Iterable::List(items) if items.len() == 2));
        let kinds: Vec<&str> = list.body.iter().map(|object| object.kind.as_str()).collect();
        assert_eq!(kinds, vec!["server", "server"]);
        assert_eq!(list.body[1].children.len(), 3);
    }

    #[test]
    fn loop_bodies_hold_objects_only() {
        assert_eq!(
            error("backend \"app\" {\n  for \"i\" {\n    range = [1, 2]\n    weight = 3\n  }\n}\n"),
            "invalid `for` at 4:5: unknown key `weight`, expected `range` or `in`"
        );
    }

    #[test]
    fn env_calls() {
        let document = parse(r#"port = env("PORT", 8080)"#);

        let Item::Variable { value: Expr::Env { name, default }, .. } = &document.items[0] else {
            panic!("expected an env lookup");
        };
        assert_eq!(name, "PORT");
        assert!(matches!(default.as_deref(), Some(Expr::Literal(Value::Integer(8080)))));
    }

    #[test]
    fn rejected_expressions() {
        assert_eq!(
            error("backend \"app\" {\n  balance = upper(\"x\")\n}\n"),
            "function `upper` is not supported at 2:3"
        );
        assert_eq!(
            error("a = b"),
            "reference `b` (write \"${b}\") is not supported at 1:1"
        );
        assert_eq!(error("a = 1 + 2"), "operator outside `${...}` is not supported at 1:1");
        assert_eq!(error("a = null"), "null is not supported at 1:1");
        assert_eq!(
            error("unknown {}"),
            "top level block `unknown` is not supported at 1:1"
        );
        assert_eq!(
            error("backend \"a\" \"b\" {}"),
            "invalid `backend` at 1:1: at most one label is allowed"
        );
    }

    #[test]
    fn loops_need_an_iterable() {
        assert_eq!(
            error("backend \"app\" {\n  for \"i\" {}\n}\n"),
            "invalid `for` at 2:3: `range` or `in` is required"
        );
    }

    #[test]
    fn syntax_errors() {
        assert!(matches!(
            parse_document("not = valid = hcl"),
            Err(ParseError::Syntax(_))
        ));
    }

    #[test]
    fn imports_are_loaded_relative_to_the_importer() {
        let directory = std::env::temp_dir().join(format!("lbc-imports-{}", std::process::id()));
        std::fs::create_dir_all(directory.join("shared")).expect("create directory");
        std::fs::write(
            directory.join("main.hcl"),
            "import \"shared/vars.hcl\" {}\nbackend \"app\" {}\n",
        )
        .expect("write main");
        std::fs::write(
            directory.join("shared/vars.hcl"),
            "import \"../main.hcl\" {}\nregion = \"eu\"\n",
        )
        .expect("write vars");

        let mut sources = HclSources::default();
        sources
            .load_file(&directory.join("main.hcl"))
            .expect("files must load");
        std::fs::remove_dir_all(&directory).ok();

        assert_eq!(sources.source_count(), 2);
        let kinds: Vec<&str> = sources
            .into_document()
            .items
            .iter()
            .map(|item| match item {
                Item::Variable { .. } => "variable",
                Item::Template { .. } => "template",
                Item::Import { .. } => "import",
                Item::Section(_) => "section",
            })
            .collect();
        assert_eq!(kinds, vec!["import", "variable", "import", "section"]);
    }

    #[test]
    fn missing_file() {
        let mut sources = HclSources::default();
        assert!(matches!(
            sources.load_file(Path::new("/nonexistent/lbc.hcl")),
            Err(ParseError::Io { .. })
        ));
    }
}
