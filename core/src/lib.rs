//! metacheck - Rule-driven validation of per-file metadata
//!
//! Validates and normalizes the metadata records of a static-site build.
//! Declarative rules are matched to files by glob, and every matching rule
//! checks its keys against the file's record: fill defaults, enforce
//! existence, enforce types, enforce patterns. The first violation aborts the
//! whole pass.
//!
//! # Architecture
//!
//! - [`RawConfig`]: What the user wrote (JSON/YAML, shorthand allowed)
//! - [`normalize()`]: Turns `RawConfig` into canonical [`Rule`]s, once
//! - [`Rule`]: A compiled [`PathPattern`] plus ordered per-key [`Validator`]s
//! - [`Validate`]: The [`Plugin`] that evaluates rules over a [`Files`] collection
//!
//! # Key Design Insights
//!
//! 1. **Normalize once, never inspect shapes again**: shorthand such as
//!    `{draft: false}` is expanded into a [`Validator`] at construction time.
//!
//! 2. **Present is not truthy**: every constraint is an `Option`, so a
//!    declared `exists: false` is enforced, not ignored.
//!
//! 3. **Fail fast, no rollback**: at most one [`ValidationError`] per pass, in
//!    file → rule → key order. Defaults applied before the failure stay in the
//!    records; a failed pass aborts the build, so nothing observes them.
//!
//! # Example
//!
//! ```
//! use metacheck::prelude::*;
//! use serde_json::json;
//!
//! let validate = Validate::from_value(json!([
//!     { "pattern": "posts/**/*.md", "metadata": {
//!         "title": { "exists": true, "type": "String" },
//!         "layout": { "default": "post.html" },
//!         "draft": false
//!     }}
//! ])).unwrap();
//!
//! let mut files = Files::new();
//! files.insert("posts/hello.md".into(), metadata(json!({ "title": "Hello" })));
//!
//! validate.run(&mut files).unwrap();
//! assert_eq!(files["posts/hello.md"]["layout"], json!("post.html"));
//!
//! files.insert("posts/wip.md".into(), metadata(json!({ "title": "WIP", "draft": true })));
//! let err = validate.run(&mut files).unwrap_err();
//! assert_eq!(err.to_string(), r#"File "posts/wip.md" has value "draft"."#);
//! ```

// ═══════════════════════════════════════════════════════════════════════════════
// Modules
// ═══════════════════════════════════════════════════════════════════════════════

mod config;
mod evaluate;
mod glob;
mod normalize;
mod rule;
mod trace;
mod type_check;
mod validator;
mod value;

// ═══════════════════════════════════════════════════════════════════════════════
// Public API
// ═══════════════════════════════════════════════════════════════════════════════

// Configuration
pub use config::{RawConfig, RawValidator, RuleConfig, TypeField, ValidatorConfig};
pub use normalize::normalize;

// Core types
pub use evaluate::{Plugin, Validate};
pub use glob::{PathPattern, MATCH_ALL};
pub use rule::Rule;
pub use type_check::TypeDescriptor;
pub use validator::{DefaultFn, DefaultValue, PredicateFn, TypeSpec, ValuePattern, Validator};
pub use value::{class_name, coerce_to_string, typeof_name};

// Trace types
pub use trace::{FileTrace, KeyOutcome, KeyTrace, RuleTrace, RunTrace};

/// A file's metadata record.
pub type Metadata = serde_json::Map<String, serde_json::Value>;

/// The file collection handed over by the pipeline host, keyed by
/// pipeline-relative `/`-separated path.
pub type Files = std::collections::BTreeMap<String, Metadata>;

/// Build a [`Metadata`] record from a JSON object.
///
/// Non-object values yield an empty record.
///
/// ```
/// use metacheck::metadata;
/// use serde_json::json;
///
/// let record = metadata(json!({ "title": "Hello" }));
/// assert_eq!(record["title"], json!("Hello"));
/// assert!(metadata(json!("not an object")).is_empty());
/// ```
#[must_use]
pub fn metadata(value: serde_json::Value) -> Metadata {
    match value {
        serde_json::Value::Object(map) => map,
        _ => Metadata::new(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════════════════════════════════════════

/// Prelude module for convenient imports.
///
/// ```
/// use metacheck::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        // Functions
        metadata,
        normalize,
        // Errors
        ConfigError,
        // Validator parts
        DefaultValue,
        // Collections
        Files,
        Metadata,
        PathPattern,
        Plugin,
        // Config types
        RawConfig,
        Rule,
        // Trace types
        RunTrace,
        TypeDescriptor,
        Validate,
        ValidationError,
        ValuePattern,
        Validator,
    };
}

// ═══════════════════════════════════════════════════════════════════════════════
// Constants
// ═══════════════════════════════════════════════════════════════════════════════

/// Maximum length for regex patterns.
///
/// Regex compilation is expensive even with the linear-time Rust `regex` crate.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 4096;

/// Maximum nesting depth of a type descriptor such as `[[String]]`.
///
/// Descriptors are parsed and checked recursively; the limit is enforced when
/// the descriptor is parsed, not when a value is checked.
pub const MAX_TYPE_DEPTH: usize = 32;

// ═══════════════════════════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════════════════════════

/// Errors from rule construction.
///
/// These errors are caught at plugin construction time, not evaluation time.
/// Fix the configuration and rebuild the plugin.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A rule's path pattern is not a valid glob.
    #[error("invalid glob \"{pattern}\": {reason}")]
    InvalidGlob {
        /// The glob that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },
    /// A value pattern is not a valid regex.
    #[error("invalid pattern \"{pattern}\": {reason}")]
    InvalidRegex {
        /// The regex that failed to compile.
        pattern: String,
        /// The underlying error message.
        reason: String,
    },
    /// A regex pattern exceeds [`MAX_REGEX_PATTERN_LENGTH`].
    #[error("pattern length is {len}, but maximum allowed is {max}")]
    PatternTooLong {
        /// Actual length of the pattern.
        len: usize,
        /// Maximum allowed length.
        max: usize,
    },
    /// A type descriptor could not be parsed.
    #[error("invalid type \"{descriptor}\": {reason}")]
    InvalidType {
        /// The descriptor as written.
        descriptor: String,
        /// What went wrong.
        reason: String,
    },
    /// A type descriptor nests deeper than [`MAX_TYPE_DEPTH`].
    #[error("type \"{descriptor}\" nests deeper than the maximum of {max}")]
    TypeTooDeep {
        /// The descriptor as written.
        descriptor: String,
        /// Maximum allowed depth.
        max: usize,
    },
    /// Configuration deserialization failed.
    #[error("invalid config: {reason}")]
    InvalidConfig {
        /// The underlying error message.
        reason: String,
    },
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidConfig {
            reason: e.to_string(),
        }
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(e: serde_yaml::Error) -> Self {
        Self::InvalidConfig {
            reason: e.to_string(),
        }
    }
}

/// A metadata violation. The first one found ends the pass.
///
/// Every variant names the offending file and key; the `Display` form is the
/// message a build tool shows when it aborts.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required key is missing, or a forbidden key is present.
    #[error(
        "File \"{file}\" {verb} value \"{key}\".",
        verb = existence_verb(.expected)
    )]
    Existence {
        /// Path of the offending file.
        file: String,
        /// The metadata key.
        key: String,
        /// `true` if the key was required, `false` if it was forbidden.
        expected: bool,
    },
    /// The value matches none of the acceptable types.
    #[error("File \"{file}\" value \"{key}\" must be of type [{}].", join_types(.types))]
    Type {
        /// Path of the offending file.
        file: String,
        /// The metadata key.
        key: String,
        /// The acceptable type descriptors, as written.
        types: Vec<String>,
    },
    /// The value fails its regex or predicate.
    #[error("File \"{file}\" value \"{key}\" does not match {pattern}.")]
    Pattern {
        /// Path of the offending file.
        file: String,
        /// The metadata key.
        key: String,
        /// Rendered pattern (`/regex/` or the predicate's label).
        pattern: String,
    },
}

fn existence_verb(expected: &bool) -> &'static str {
    if *expected {
        "does not have"
    } else {
        "has"
    }
}

fn join_types(types: &[String]) -> String {
    types.join(", ")
}

impl ValidationError {
    /// Path of the file that failed.
    #[must_use]
    pub fn file(&self) -> &str {
        match self {
            Self::Existence { file, .. } | Self::Type { file, .. } | Self::Pattern { file, .. } => {
                file
            }
        }
    }

    /// The metadata key that failed.
    #[must_use]
    pub fn key(&self) -> &str {
        match self {
            Self::Existence { key, .. } | Self::Type { key, .. } | Self::Pattern { key, .. } => key,
        }
    }
}
