//! `Rule`: A path pattern paired with ordered per-key validators

use crate::{ConfigError, PathPattern, Validator};
use indexmap::IndexMap;

/// A normalized rule.
///
/// The matcher is compiled once when the rule is built. Keys are evaluated
/// in insertion order, which is the order they were written in.
///
/// # Example
///
/// ```
/// use metacheck::{Rule, Validator};
/// use serde_json::json;
///
/// let rule = Rule::new("posts/**/*.md")?
///     .key("title", true)
///     .key("layout", Validator::new().default_value(json!("post.html")));
///
/// assert!(rule.applies_to("posts/2024/hello.md"));
/// assert!(!rule.applies_to("index.md"));
/// assert_eq!(rule.keys().collect::<Vec<_>>(), ["title", "layout"]);
/// # Ok::<(), metacheck::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Rule {
    matcher: PathPattern,
    metadata: IndexMap<String, Validator>,
}

impl Rule {
    /// A rule with no keys, applying to files matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGlob`] if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Ok(Self::with_matcher(PathPattern::new(pattern)?))
    }

    /// A rule with no keys, applying to every file.
    #[must_use]
    pub fn match_all() -> Self {
        Self::default()
    }

    /// A rule with no keys, applying to files matching an already-compiled pattern.
    #[must_use]
    pub fn with_matcher(matcher: PathPattern) -> Self {
        Self {
            matcher,
            metadata: IndexMap::new(),
        }
    }

    /// Add (or replace) the validator for a key (builder pattern).
    ///
    /// Replacing a key keeps its original position.
    #[must_use]
    pub fn key(mut self, name: impl Into<String>, validator: impl Into<Validator>) -> Self {
        self.metadata.insert(name.into(), validator.into());
        self
    }

    /// The glob pattern as written.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.matcher.as_str()
    }

    /// The compiled matcher.
    #[must_use]
    pub fn matcher(&self) -> &PathPattern {
        &self.matcher
    }

    /// Whether this rule applies to the file at `path`.
    #[must_use]
    pub fn applies_to(&self, path: &str) -> bool {
        self.matcher.is_match(path)
    }

    /// Validators in evaluation order.
    pub fn validators(&self) -> impl Iterator<Item = (&str, &Validator)> {
        self.metadata.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Key names in evaluation order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.metadata.keys().map(String::as_str)
    }

    /// The validator for a key, if declared.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Validator> {
        self.metadata.get(key)
    }

    /// Number of validated keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.len()
    }

    /// Returns `true` if the rule validates no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.metadata.is_empty()
    }
}
