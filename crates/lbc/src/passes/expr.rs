//! the restricted expression language inside `${...}`
//!
//! ```text
//! expr    := term (("+" | "-") term)*
//! term    := "-" term | primary
//! primary := integer | string | name | "(" expr ")"
//! ```
//!
//! `+` adds integers and concatenates as soon as one side is a string.
//! Calls, attribute access and indexing are rejected by the parser, not
//! silently skipped.
use super::NormalizeError;
use crate::value::Value;

pub(crate) type Lookup<'a> = &'a mut dyn FnMut(&str) -> Result<Value, NormalizeError>;

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Integer(i64),
    String(String),
    Name(String),
    Plus,
    Minus,
    Open,
    Close,
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Token::Integer(int) => write!(f, "{int}"),
            Token::String(s) => write!(f, "\"{s}\""),
            Token::Name(name) => f.write_str(name),
            Token::Plus => f.write_str("+"),
            Token::Minus => f.write_str("-"),
            Token::Open => f.write_str("("),
            Token::Close => f.write_str(")"),
        }
    }
}

/// Evaluate `source`, looking names up through `lookup`
pub(crate) fn evaluate(source: &str, lookup: Lookup) -> Result<Value, NormalizeError> {
    let error = |message: String| NormalizeError::Expression {
        expression: source.to_string(),
        message,
    };

    let tokens = lex(source).map_err(error)?;
    let mut parser = Parser {
        tokens,
        next: 0,
        lookup,
    };

    let value = parser.expr().map_err(|e| e.into_error(source))?;
    if let Some(token) = parser.peek() {
        return Err(error(format!("unexpected `{token}`")));
    }

    Ok(value)
}

fn lex(source: &str) -> Result<Vec<Token>, String> {
    let mut tokens = vec![];
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => {}
            '+' => tokens.push(Token::Plus),
            '-' => tokens.push(Token::Minus),
            '(' => tokens.push(Token::Open),
            ')' => tokens.push(Token::Close),
            '0'..='9' => {
                let mut end = start + 1;
                while let Some((idx, '0'..='9')) = chars.peek().copied() {
                    end = idx + 1;
                    chars.next();
                }
                let digits = &source[start..end];
                let int = digits
                    .parse()
                    .map_err(|_| format!("integer `{digits}` is out of range"))?;
                tokens.push(Token::Integer(int));
            }
            '"' | '\'' => {
                let mut literal = String::new();
                loop {
                    match chars.next() {
                        Some((_, end)) if end == c => break,
                        Some((_, ch)) => literal.push(ch),
                        None => return Err("unterminated string literal".to_string()),
                    }
                }
                tokens.push(Token::String(literal));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let mut end = start + c.len_utf8();
                while let Some((idx, ch)) = chars.peek().copied() {
                    if !(ch.is_ascii_alphanumeric() || ch == '_') {
                        break;
                    }
                    end = idx + ch.len_utf8();
                    chars.next();
                }
                tokens.push(Token::Name(source[start..end].to_string()));
            }
            '.' => return Err("attribute access is not supported".to_string()),
            '[' => return Err("indexing is not supported".to_string()),
            other => return Err(format!("unexpected character `{other}`")),
        }
    }

    Ok(tokens)
}

/// Parser failures; lookups already produce complete errors
enum Failure {
    Syntax(String),
    Lookup(NormalizeError),
}

impl Failure {
    fn into_error(self, source: &str) -> NormalizeError {
        match self {
            Failure::Syntax(message) => NormalizeError::Expression {
                expression: source.to_string(),
                message,
            },
            Failure::Lookup(error) => error,
        }
    }
}

struct Parser<'a> {
    tokens: Vec<Token>,
    next: usize,
    lookup: Lookup<'a>,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.next)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.next).cloned();
        self.next += 1;
        token
    }

    fn expr(&mut self) -> Result<Value, Failure> {
        let mut value = self.term()?;

        loop {
            match self.peek() {
                Some(Token::Plus) => {
                    self.bump();
                    let rhs = self.term()?;
                    value = add(value, rhs)?;
                }
                Some(Token::Minus) => {
                    self.bump();
                    let rhs = self.term()?;
                    value = subtract(value, rhs)?;
                }
                _ => return Ok(value),
            }
        }
    }

    fn term(&mut self) -> Result<Value, Failure> {
        if self.peek() == Some(&Token::Minus) {
            self.bump();
            return match self.term()? {
                Value::Integer(int) => int
                    .checked_neg()
                    .map(Value::Integer)
                    .ok_or_else(|| Failure::Syntax("integer overflow".to_string())),
                other => Err(Failure::Syntax(format!("cannot negate a {}", other.kind()))),
            };
        }

        self.primary()
    }

    fn primary(&mut self) -> Result<Value, Failure> {
        match self.bump() {
            Some(Token::Integer(int)) => Ok(Value::Integer(int)),
            Some(Token::String(s)) => Ok(Value::String(s)),
            Some(Token::Name(name)) => {
                if self.peek() == Some(&Token::Open) {
                    return Err(Failure::Syntax(format!(
                        "function calls are not supported (`{name}(...)`)"
                    )));
                }
                (self.lookup)(&name).map_err(Failure::Lookup)
            }
            Some(Token::Open) => {
                let value = self.expr()?;
                match self.bump() {
                    Some(Token::Close) => Ok(value),
                    _ => Err(Failure::Syntax("missing `)`".to_string())),
                }
            }
            Some(token) => Err(Failure::Syntax(format!("unexpected `{token}`"))),
            None => Err(Failure::Syntax("unexpected end of expression".to_string())),
        }
    }
}

fn add(lhs: Value, rhs: Value) -> Result<Value, Failure> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_add(*b)
            .map(Value::Integer)
            .ok_or_else(|| Failure::Syntax("integer overflow".to_string())),
        (Value::String(_), _) | (_, Value::String(_)) => match (lhs.render(), rhs.render()) {
            (Some(a), Some(b)) => Ok(Value::String(a + &b)),
            _ => Err(Failure::Syntax("cannot concatenate an object".to_string())),
        },
        _ => Err(Failure::Syntax(format!(
            "cannot add {} and {}",
            lhs.kind(),
            rhs.kind()
        ))),
    }
}

fn subtract(lhs: Value, rhs: Value) -> Result<Value, Failure> {
    match (&lhs, &rhs) {
        (Value::Integer(a), Value::Integer(b)) => a
            .checked_sub(*b)
            .map(Value::Integer)
            .ok_or_else(|| Failure::Syntax("integer overflow".to_string())),
        _ => Err(Failure::Syntax(format!(
            "cannot subtract {} from {}",
            rhs.kind(),
            lhs.kind()
        ))),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Result<Value, NormalizeError> {
        evaluate(source, &mut |name| match name {
            "base" => Ok(Value::Integer(8000)),
            "host" => Ok(Value::from("web")),
            "i" => Ok(Value::Integer(3)),
            other => Err(NormalizeError::UndefinedVariable {
                name: other.to_string(),
            }),
        })
    }

    #[test]
    fn arithmetic() {
        assert_eq!(eval("base + i").unwrap(), Value::Integer(8003));
        assert_eq!(eval("base - (i - 1)").unwrap(), Value::Integer(7998));
        assert_eq!(eval("-i + 10").unwrap(), Value::Integer(7));
        assert_eq!(eval(" 42 ").unwrap(), Value::Integer(42));
    }

    #[test]
    fn plus_concatenates_strings() {
        assert_eq!(eval("host + \"-\" + i").unwrap(), Value::from("web-3"));
        assert_eq!(eval("'a' + 'b'").unwrap(), Value::from("ab"));
    }

    #[test]
    fn names_keep_their_type() {
        assert_eq!(eval("host").unwrap(), Value::from("web"));
        assert_eq!(eval("i").unwrap(), Value::Integer(3));
    }

    #[test]
    fn rejects_unsupported_syntax() {
        let message = |source| match eval(source).unwrap_err() {
            NormalizeError::Expression { message, .. } => message,
            other => panic!("unexpected error {other:?}"),
        };

        assert_eq!(message("upper(host)"), "function calls are not supported (`upper(...)`)");
        assert_eq!(message("host.name"), "attribute access is not supported");
        assert_eq!(message("hosts[0]"), "indexing is not supported");
        assert_eq!(message("i * 2"), "unexpected character `*`");
        assert_eq!(message("(i + 1"), "missing `)`");
        assert_eq!(message("i 1"), "unexpected `1`");
        assert_eq!(message("host - 1"), "cannot subtract integer from string");
    }

    #[test]
    fn overflow_is_an_error() {
        assert!(eval("9223372036854775807 + 1").is_err());
    }

    #[test]
    fn unknown_name_is_reported_as_is() {
        assert_eq!(
            eval("missing + 1").unwrap_err(),
            NormalizeError::UndefinedVariable {
                name: "missing".to_string()
            }
        );
    }
}
