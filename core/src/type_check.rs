//! `TypeDescriptor`: Structural type checks over metadata values
//!
//! Type constraints are written in a small descriptor language and checked
//! against [`serde_json::Value`]s:
//!
//! | Descriptor | Accepts |
//! |------------|---------|
//! | `String`, `Number`, `Boolean`, `Null`, `Array`, `Object` | values of that class |
//! | `Undefined` | a missing value (only meaningful inside records and tuples) |
//! | `*` | anything |
//! | `Maybe T` | undefined, `null`, or `T` |
//! | `A \| B` | `A` or `B` |
//! | `[T]` | arrays whose every element is `T` |
//! | `(A, B)` | arrays with at most two elements, typed positionally |
//! | `{a: A, b: B}` | objects with exactly these fields |
//! | `{a: A, ...}` | objects with at least these fields |
//! | `Name{a: A}` | values of class `Name` whose fields match |
//!
//! Unknown type names parse fine but never match a value. Field checks only
//! see the members of JSON objects, so a structure prefixed by any name other
//! than `Object` matches nothing.
//!
//! # Example
//!
//! ```
//! use metacheck::TypeDescriptor;
//! use serde_json::json;
//!
//! let tags = TypeDescriptor::parse("[String]").unwrap();
//! assert!(tags.check(&json!(["rust", "web"])));
//! assert!(!tags.check(&json!(["rust", 1])));
//!
//! let author = TypeDescriptor::parse("{name: String, email: Maybe String}").unwrap();
//! assert!(author.check(&json!({"name": "Ada"})));
//! assert!(!author.check(&json!({"name": "Ada", "twitter": "@ada"})));
//! ```

use crate::value::class_name;
use crate::{ConfigError, MAX_TYPE_DEPTH};
use serde_json::Value;

/// A parsed type descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeDescriptor {
    /// `*`: accepts anything, including a missing value.
    Any,
    /// A built-in class name such as `String` or `Undefined`.
    Named(String),
    /// `Maybe T`: undefined, `null`, or `T`.
    Maybe(Box<TypeDescriptor>),
    /// `A | B | ...`: any alternative.
    Union(Vec<TypeDescriptor>),
    /// `[T]`: homogeneous array.
    ArrayOf(Box<TypeDescriptor>),
    /// `(A, B, ...)`: positional array.
    Tuple(Vec<TypeDescriptor>),
    /// `{a: A, ...}`: object with typed fields; `open` allows extra fields.
    Fields {
        /// Declared fields in source order.
        fields: Vec<(String, TypeDescriptor)>,
        /// Whether fields beyond the declared ones are allowed.
        open: bool,
    },
    /// `Name{...}`: the named type and the field structure both hold.
    Structured {
        /// The type named before the braces.
        name: Box<TypeDescriptor>,
        /// Always a [`TypeDescriptor::Fields`].
        fields: Box<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    /// Parse a descriptor string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidType`] on a syntax error and
    /// [`ConfigError::TypeTooDeep`] when nesting exceeds [`MAX_TYPE_DEPTH`].
    pub fn parse(source: &str) -> Result<Self, ConfigError> {
        let tokens = tokenize(source)?;
        let mut parser = Parser {
            source,
            tokens,
            pos: 0,
            depth: 0,
        };
        let descriptor = parser.union()?;
        match parser.peek() {
            None => Ok(descriptor),
            Some(token) => Err(parser.error(format!("unexpected {token}"))),
        }
    }

    /// Check whether a present value conforms to this descriptor.
    #[must_use]
    pub fn check(&self, value: &Value) -> bool {
        self.accepts(Some(value))
    }

    /// Check a possibly-missing value (`None` is "undefined").
    #[must_use]
    pub fn accepts(&self, value: Option<&Value>) -> bool {
        match self {
            Self::Any => true,
            Self::Named(name) => match value {
                None => name == "Undefined",
                Some(v) => class_name(v) == name,
            },
            Self::Maybe(inner) => matches!(value, None | Some(Value::Null)) || inner.accepts(value),
            Self::Union(alternatives) => alternatives.iter().any(|t| t.accepts(value)),
            Self::ArrayOf(element) => match value {
                Some(Value::Array(items)) => items.iter().all(|item| element.check(item)),
                _ => false,
            },
            Self::Tuple(positions) => match value {
                Some(Value::Array(items)) => {
                    items.len() <= positions.len()
                        && positions
                            .iter()
                            .enumerate()
                            .all(|(i, t)| t.accepts(items.get(i)))
                }
                _ => false,
            },
            Self::Fields { fields, open } => match value {
                Some(Value::Object(map)) => {
                    fields.iter().all(|(name, t)| t.accepts(map.get(name)))
                        && (*open || map.keys().all(|k| fields.iter().any(|(name, _)| name == k)))
                }
                _ => false,
            },
            Self::Structured { name, fields } => name.accepts(value) && fields.accepts(value),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tokenizer
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Ident(String),
    Star,
    Ellipsis,
    Pipe,
    Comma,
    Colon,
    Open(char),
    Close(char),
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "\"{name}\""),
            Self::Star => f.write_str("'*'"),
            Self::Ellipsis => f.write_str("'...'"),
            Self::Pipe => f.write_str("'|'"),
            Self::Comma => f.write_str("','"),
            Self::Colon => f.write_str("':'"),
            Self::Open(c) | Self::Close(c) => write!(f, "'{c}'"),
        }
    }
}

fn tokenize(source: &str) -> Result<Vec<Token>, ConfigError> {
    let mut tokens = Vec::new();
    let mut chars = source.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        let token = match c {
            c if c.is_whitespace() => continue,
            '*' => Token::Star,
            '|' => Token::Pipe,
            ',' => Token::Comma,
            ':' => Token::Colon,
            '[' | '(' | '{' => Token::Open(c),
            ']' | ')' | '}' => Token::Close(c),
            '.' => {
                if source[start..].starts_with("...") {
                    chars.next();
                    chars.next();
                    Token::Ellipsis
                } else {
                    return Err(invalid(source, "stray '.'"));
                }
            }
            c if c.is_alphanumeric() || c == '_' || c == '$' => {
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' || next == '$' {
                        end = i + next.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                Token::Ident(source[start..end].to_string())
            }
            other => return Err(invalid(source, format!("unexpected character '{other}'"))),
        };
        tokens.push(token);
    }

    if tokens.is_empty() {
        return Err(invalid(source, "empty type descriptor"));
    }
    Ok(tokens)
}

fn invalid(source: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidType {
        descriptor: source.to_string(),
        reason: reason.into(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Parser
// ═══════════════════════════════════════════════════════════════════════════════

struct Parser<'a> {
    source: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        self.pos += 1;
        token
    }

    fn eat(&mut self, expected: &Token) -> bool {
        if self.peek() == Some(expected) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, expected: &Token) -> Result<(), ConfigError> {
        match self.next() {
            Some(ref token) if token == expected => Ok(()),
            Some(token) => Err(self.error(format!("expected {expected}, found {token}"))),
            None => Err(self.error(format!("expected {expected}, found end of input"))),
        }
    }

    fn error(&self, reason: impl Into<String>) -> ConfigError {
        invalid(self.source, reason)
    }

    fn descend(&mut self) -> Result<(), ConfigError> {
        self.depth += 1;
        if self.depth > MAX_TYPE_DEPTH {
            return Err(ConfigError::TypeTooDeep {
                descriptor: self.source.to_string(),
                max: MAX_TYPE_DEPTH,
            });
        }
        Ok(())
    }

    fn union(&mut self) -> Result<TypeDescriptor, ConfigError> {
        self.descend()?;
        let mut alternatives = vec![self.term()?];
        while self.eat(&Token::Pipe) {
            alternatives.push(self.term()?);
        }
        self.depth -= 1;

        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            TypeDescriptor::Union(alternatives)
        })
    }

    fn term(&mut self) -> Result<TypeDescriptor, ConfigError> {
        match self.next() {
            Some(Token::Star) => Ok(TypeDescriptor::Any),
            Some(Token::Ident(name)) if name == "Maybe" => {
                self.descend()?;
                let inner = self.term()?;
                self.depth -= 1;
                Ok(TypeDescriptor::Maybe(Box::new(inner)))
            }
            Some(Token::Ident(name)) => {
                if !self.eat(&Token::Open('{')) {
                    return Ok(TypeDescriptor::Named(name));
                }
                self.descend()?;
                let fields = self.fields()?;
                self.depth -= 1;
                Ok(TypeDescriptor::Structured {
                    name: Box::new(TypeDescriptor::Named(name)),
                    fields: Box::new(fields),
                })
            }
            Some(Token::Open('[')) => {
                let element = self.union()?;
                self.expect(&Token::Close(']'))?;
                Ok(TypeDescriptor::ArrayOf(Box::new(element)))
            }
            Some(Token::Open('(')) => {
                let mut positions = vec![self.union()?];
                while self.eat(&Token::Comma) {
                    positions.push(self.union()?);
                }
                self.expect(&Token::Close(')'))?;
                Ok(TypeDescriptor::Tuple(positions))
            }
            Some(Token::Open('{')) => self.fields(),
            Some(token) => Err(self.error(format!("unexpected {token}"))),
            None => Err(self.error("unexpected end of input")),
        }
    }

    fn fields(&mut self) -> Result<TypeDescriptor, ConfigError> {
        let mut fields = Vec::new();
        let mut open = false;

        loop {
            match self.next() {
                Some(Token::Close('}')) => break,
                Some(Token::Ellipsis) => {
                    open = true;
                    self.expect(&Token::Close('}'))?;
                    break;
                }
                Some(Token::Ident(name)) => {
                    self.expect(&Token::Colon)?;
                    let field_type = self.union()?;
                    fields.push((name, field_type));
                    if !self.eat(&Token::Comma) {
                        self.expect(&Token::Close('}'))?;
                        break;
                    }
                }
                Some(token) => return Err(self.error(format!("unexpected {token} in fields"))),
                None => return Err(self.error("unterminated '{'")),
            }
        }

        Ok(TypeDescriptor::Fields { fields, open })
    }
}
