//! `PathPattern`: Compiled glob matcher for pipeline-relative file paths
//!
//! Wraps [`glob::Pattern`] with the matching options a static-site pipeline
//! expects from its path patterns:
//!
//! - `*` and `?` never cross a `/`
//! - `**/` matches zero or more whole directories
//! - a leading `.` in a path segment must be matched literally
//! - matching is case-sensitive
//! - `[^...]` negates a class, like `[!...]`
//! - `**` is a globstar only as a whole path segment; elsewhere (`a**`,
//!   `***`) it behaves as `*`

use crate::ConfigError;
use glob::{MatchOptions, Pattern};
use std::fmt;

/// Pattern applied when a rule does not name one: every (non-hidden) file.
pub const MATCH_ALL: &str = "**/*";

const OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: true,
};

/// A compiled glob pattern.
///
/// # Example
///
/// ```
/// use metacheck::PathPattern;
///
/// let top_level = PathPattern::new("*.md").unwrap();
/// assert!(top_level.is_match("index.md"));
/// assert!(!top_level.is_match("posts/first.md"));
///
/// let anywhere = PathPattern::new("**/*.md").unwrap();
/// assert!(anywhere.is_match("index.md"));
/// assert!(anywhere.is_match("posts/2024/first.md"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    pattern: Pattern,
}

impl PathPattern {
    /// Compile a glob pattern.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidGlob`] if the pattern is malformed
    /// (e.g. an unterminated character class).
    pub fn new(pattern: &str) -> Result<Self, ConfigError> {
        Pattern::new(&translate(pattern))
            .map(|compiled| Self {
                source: pattern.to_string(),
                pattern: compiled,
            })
            .map_err(|e| ConfigError::InvalidGlob {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// The pattern that matches every file: [`MATCH_ALL`].
    #[must_use]
    pub fn match_all() -> Self {
        Self {
            source: MATCH_ALL.to_string(),
            pattern: Pattern::new(MATCH_ALL).expect("MATCH_ALL is a valid glob"),
        }
    }

    /// Test a pipeline-relative, `/`-separated path.
    #[must_use]
    pub fn is_match(&self, path: &str) -> bool {
        self.pattern.matches_with(path, OPTIONS)
    }

    /// Returns the pattern as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.source
    }
}

/// Rewrite pattern syntax that `glob::Pattern` reads differently: `[^` class
/// negation and `**` runs that are not a whole segment.
fn translate(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    for (i, segment) in pattern.split('/').enumerate() {
        if i > 0 {
            out.push('/');
        }
        if segment == "**" {
            out.push_str(segment);
        } else {
            translate_segment(segment, &mut out);
        }
    }
    out
}

fn translate_segment(segment: &str, out: &mut String) {
    let mut chars = segment.chars().peekable();
    let mut in_class = false;

    while let Some(c) = chars.next() {
        if in_class {
            out.push(c);
            if c == ']' {
                in_class = false;
            }
            continue;
        }
        match c {
            '[' => {
                out.push('[');
                in_class = true;
                if matches!(chars.peek(), Some('^' | '!')) {
                    chars.next();
                    out.push('!');
                }
                // A `]` right after the opener is a member, not the close.
                if chars.peek() == Some(&']') {
                    chars.next();
                    out.push(']');
                }
            }
            '*' => {
                out.push('*');
                while chars.peek() == Some(&'*') {
                    chars.next();
                }
            }
            other => out.push(other),
        }
    }
}

impl Default for PathPattern {
    fn default() -> Self {
        Self::match_all()
    }
}

impl fmt::Debug for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PathPattern").field(&self.as_str()).finish()
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
