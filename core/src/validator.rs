//! `Validator`: Per-key constraints in canonical form
//!
//! A [`Validator`] is what every configuration shorthand normalizes into: a
//! struct of four optional constraints. `None` means "not declared"; a
//! declared `exists: false` is very different from an undeclared `exists`.
//!
//! The two union-valued constraints are tagged enums resolved explicitly at
//! evaluation time:
//!
//! - [`DefaultValue`]: `Literal(Value)` or `Computed(fn)`
//! - [`ValuePattern`]: `Regex(Regex)` or `Predicate(fn)`

use crate::type_check::TypeDescriptor;
use crate::{ConfigError, MAX_REGEX_PATTERN_LENGTH};
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Callback computing a default from the current (absent) value.
pub type DefaultFn = dyn Fn(Option<&Value>) -> Value + Send + Sync;

/// Callback deciding whether a present value is acceptable.
pub type PredicateFn = dyn Fn(&Value) -> bool + Send + Sync;

// ═══════════════════════════════════════════════════════════════════════════════
// DefaultValue
// ═══════════════════════════════════════════════════════════════════════════════

/// The value assigned to a key that is missing from a record.
#[derive(Clone)]
pub enum DefaultValue {
    /// A fixed value, cloned into every record that lacks the key.
    Literal(Value),
    /// A value computed from the record's current value for the key.
    ///
    /// The default only fires when the key is absent, so the callback
    /// always receives `None` during evaluation.
    Computed(Arc<DefaultFn>),
}

impl DefaultValue {
    /// Resolve the default for the given current value.
    #[must_use]
    pub fn resolve(&self, current: Option<&Value>) -> Value {
        match self {
            Self::Literal(value) => value.clone(),
            Self::Computed(f) => f(current),
        }
    }
}

impl fmt::Debug for DefaultValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Literal(value) => f.debug_tuple("Literal").field(value).finish(),
            Self::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ValuePattern
// ═══════════════════════════════════════════════════════════════════════════════

/// A constraint on the content of a present value.
#[derive(Clone)]
pub enum ValuePattern {
    /// The value, coerced to a string, must match this regex.
    Regex(Regex),
    /// The callback must return `true` for the value.
    Predicate {
        /// Name used when reporting a failed match.
        label: String,
        /// The check itself.
        check: Arc<PredicateFn>,
    },
}

impl ValuePattern {
    /// Compile a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::PatternTooLong`] if the source exceeds
    /// [`MAX_REGEX_PATTERN_LENGTH`], or [`ConfigError::InvalidRegex`] if it
    /// does not compile.
    pub fn regex(pattern: &str) -> Result<Self, ConfigError> {
        if pattern.len() > MAX_REGEX_PATTERN_LENGTH {
            return Err(ConfigError::PatternTooLong {
                len: pattern.len(),
                max: MAX_REGEX_PATTERN_LENGTH,
            });
        }
        Regex::new(pattern)
            .map(Self::Regex)
            .map_err(|e| ConfigError::InvalidRegex {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// Wrap a predicate callback, labelled for error messages.
    pub fn predicate(
        label: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        Self::Predicate {
            label: label.into(),
            check: Arc::new(check),
        }
    }

    /// Test a present value against this pattern.
    #[must_use]
    pub fn matches(&self, value: &Value) -> bool {
        match self {
            Self::Regex(regex) => regex.is_match(&crate::value::coerce_to_string(value)),
            Self::Predicate { check, .. } => check(value),
        }
    }
}

/// Regexes render in slash-delimited literal form (`/^draft-/`); predicates
/// render as their label.
impl fmt::Display for ValuePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(regex) => write!(f, "/{}/", regex_source(regex.as_str())),
            Self::Predicate { label, .. } => f.write_str(label),
        }
    }
}

/// The regex source as a literal would show it: unescaped `/` outside a
/// class is escaped, and an empty pattern shows as `(?:)`.
fn regex_source(source: &str) -> std::borrow::Cow<'_, str> {
    if source.is_empty() {
        return "(?:)".into();
    }
    if !source.contains('/') {
        return source.into();
    }

    let mut out = String::with_capacity(source.len() + 2);
    let mut chars = source.chars();
    let mut in_class = false;
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                out.push(c);
                if let Some(escaped) = chars.next() {
                    out.push(escaped);
                }
                continue;
            }
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => out.push('\\'),
            _ => {}
        }
        out.push(c);
    }
    out.into()
}

impl fmt::Debug for ValuePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex(regex) => f.debug_tuple("Regex").field(&regex.as_str()).finish(),
            Self::Predicate { label, .. } => f.debug_tuple("Predicate").field(label).finish(),
        }
    }
}

impl From<Regex> for ValuePattern {
    fn from(regex: Regex) -> Self {
        Self::Regex(regex)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TypeSpec
// ═══════════════════════════════════════════════════════════════════════════════

/// One acceptable type: the descriptor as written plus its parsed form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeSpec {
    source: String,
    descriptor: TypeDescriptor,
}

impl TypeSpec {
    /// Parse a type descriptor.
    ///
    /// # Errors
    ///
    /// Propagates [`TypeDescriptor::parse`] errors.
    pub fn parse(source: impl Into<String>) -> Result<Self, ConfigError> {
        let source = source.into();
        let descriptor = TypeDescriptor::parse(&source)?;
        Ok(Self { source, descriptor })
    }

    /// The descriptor as written in configuration.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// The parsed descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &TypeDescriptor {
        &self.descriptor
    }
}

impl fmt::Display for TypeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Validator
// ═══════════════════════════════════════════════════════════════════════════════

/// Canonical constraints for one metadata key.
///
/// All fields are optional and may coexist. Evaluation order is fixed:
/// default, exists, absence short-circuit, type, pattern.
///
/// # Example
///
/// ```
/// use metacheck::Validator;
/// use serde_json::json;
///
/// let layout = Validator::new().default_value(json!("page.html"));
/// let title = Validator::new().exists(true).types(["String"]).unwrap();
/// let slug = Validator::new().regex("^[a-z0-9-]+$").unwrap();
/// let words = Validator::new().predicate("at most 5 words", |v| {
///     v.as_str().is_some_and(|s| s.split_whitespace().count() <= 5)
/// });
/// # let _ = (layout, title, slug, words);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validator {
    /// Value to assign when the key is absent.
    pub default: Option<DefaultValue>,
    /// Whether the key must be present (`true`) or absent (`false`).
    pub exists: Option<bool>,
    /// Acceptable types; a value must match at least one.
    pub types: Option<Vec<TypeSpec>>,
    /// Constraint on the value's content.
    pub pattern: Option<ValuePattern>,
}

impl Validator {
    /// A validator with no constraints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fill absent keys with a fixed value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(DefaultValue::Literal(value.into()));
        self
    }

    /// Fill absent keys with a computed value.
    #[must_use]
    pub fn default_with(
        mut self,
        f: impl Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.default = Some(DefaultValue::Computed(Arc::new(f)));
        self
    }

    /// Require the key to be present (`true`) or absent (`false`).
    #[must_use]
    pub fn exists(mut self, exists: bool) -> Self {
        self.exists = Some(exists);
        self
    }

    /// Restrict the value to one of the given type descriptors.
    ///
    /// # Errors
    ///
    /// Returns the first descriptor parse error.
    pub fn types<I, S>(mut self, types: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let specs = types
            .into_iter()
            .map(TypeSpec::parse)
            .collect::<Result<Vec<_>, _>>()?;
        self.types = Some(specs);
        Ok(self)
    }

    /// Constrain the value with an already-built pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<ValuePattern>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Constrain the value with a regex source string.
    ///
    /// # Errors
    ///
    /// Propagates [`ValuePattern::regex`] errors.
    pub fn regex(self, pattern: &str) -> Result<Self, ConfigError> {
        Ok(self.pattern(ValuePattern::regex(pattern)?))
    }

    /// Constrain the value with a labelled predicate callback.
    #[must_use]
    pub fn predicate(
        self,
        label: impl Into<String>,
        check: impl Fn(&Value) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.pattern(ValuePattern::predicate(label, check))
    }
}

/// The `{key: true}` / `{key: false}` shorthand.
impl From<bool> for Validator {
    fn from(exists: bool) -> Self {
        Self::new().exists(exists)
    }
}
