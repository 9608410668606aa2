//! Evaluation trace types for debugging validation passes.
//!
//! Trace types mirror the evaluation loop (file → rule → key) but capture
//! what happened at each step instead of only the final result. Use
//! [`Validate::run_with_trace()`](crate::Validate::run_with_trace) to see which
//! rules applied to which files, which defaults were filled in, and where the
//! pass stopped.
//!
//! # Example
//!
//! ```ignore
//! let trace = validate.run_with_trace(&mut files);
//! for (file, key, value) in trace.defaults_applied() {
//!     println!("{file}: {key} defaulted to {value}");
//! }
//! if let Some(err) = trace.error() {
//!     eprintln!("{err}");
//! }
//! ```

use crate::ValidationError;
use serde_json::Value;

/// What happened to one key of one applying rule.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyOutcome {
    /// The key was absent and the default was written into the record.
    Defaulted(Value),
    /// The key was absent and nothing required it; remaining checks skipped.
    Absent,
    /// The key was present and passed every declared check.
    Passed,
    /// The key violated a constraint. Always the last step of a trace.
    Failed(ValidationError),
}

/// Trace of one key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyTrace {
    /// The metadata key.
    pub key: String,
    /// Result of evaluating the key's validator.
    pub outcome: KeyOutcome,
}

/// Trace of one rule against one file.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTrace {
    /// Position of the rule in the rule list.
    pub index: usize,
    /// The rule's glob pattern.
    pub pattern: String,
    /// Whether the pattern matched the file path.
    pub matched: bool,
    /// Keys evaluated, in order. Empty when the rule did not match.
    pub keys: Vec<KeyTrace>,
}

/// Trace of every rule checked against one file.
#[derive(Debug, Clone, PartialEq)]
pub struct FileTrace {
    /// Path of the file.
    pub file: String,
    /// Rules checked, in order.
    pub rules: Vec<RuleTrace>,
}

/// Trace of a full validation pass.
///
/// # INV: `result()` == `run()` result
///
/// The traced pass performs the same steps as
/// [`Validate::run()`](crate::Validate::run), including record mutation and
/// stopping at the first failure.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunTrace {
    /// Files visited, in order. The last one holds the failure, if any.
    pub files: Vec<FileTrace>,
}

impl RunTrace {
    /// The violation that stopped the pass, if any.
    #[must_use]
    pub fn error(&self) -> Option<&ValidationError> {
        self.keys().find_map(|(_, _, key)| match &key.outcome {
            KeyOutcome::Failed(err) => Some(err),
            _ => None,
        })
    }

    /// The pass result, as [`Validate::run()`](crate::Validate::run) reports it.
    ///
    /// # Errors
    ///
    /// Returns the violation that stopped the pass.
    pub fn result(&self) -> Result<(), ValidationError> {
        match self.error() {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    /// Every default written during the pass as `(file, key, value)`.
    pub fn defaults_applied(&self) -> impl Iterator<Item = (&str, &str, &Value)> {
        self.keys().filter_map(|(file, _, key)| match &key.outcome {
            KeyOutcome::Defaulted(value) => Some((file, key.key.as_str(), value)),
            _ => None,
        })
    }

    /// Patterns of the rules that applied to `file`, in order.
    pub fn matched_rules<'a>(&'a self, file: &str) -> impl Iterator<Item = &'a str> + 'a {
        let rules = self
            .files
            .iter()
            .find(|f| f.file == file)
            .map_or(&[][..], |f| f.rules.as_slice());
        rules
            .iter()
            .filter(|r| r.matched)
            .map(|r| r.pattern.as_str())
    }

    fn keys(&self) -> impl Iterator<Item = (&str, &RuleTrace, &KeyTrace)> {
        self.files.iter().flat_map(|file| {
            file.rules.iter().flat_map(move |rule| {
                rule.keys
                    .iter()
                    .map(move |key| (file.file.as_str(), rule, key))
            })
        })
    }
}
