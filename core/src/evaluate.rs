//! Validate: The evaluation pass over a file collection
//!
//! [`Validate`] holds the normalized rules and runs them against the
//! pipeline's [`Files`] once per build. Iteration is strictly ordered:
//!
//! ```text
//! for file in files            (collection order)
//!   for rule in rules          (normalization order, only if the glob matches)
//!     for key in rule          (insertion order)
//!       default → exists → absent? → type → pattern
//! ```
//!
//! # INV: First violation wins
//!
//! The pass stops at the first failing key. Nothing after it is evaluated, so
//! a run reports at most one [`ValidationError`].
//!
//! # INV: Defaults are not rolled back
//!
//! Defaults are written into the records as they are applied. If a later key
//! fails, earlier defaults stay. A failed pass aborts the build, so the
//! partially-filled records are never used.

use crate::trace::{FileTrace, KeyOutcome, KeyTrace, RuleTrace, RunTrace};
use crate::value::typeof_name;
use crate::{normalize, ConfigError, Files, Metadata, RawConfig, Rule, ValidationError, Validator};
use serde_json::Value;

/// A pass over the pipeline's file collection.
///
/// This is the boundary with the file-pipeline host: the host owns the
/// [`Files`], lends them mutably for one pass, and aborts the build on error.
pub trait Plugin: Send + Sync {
    /// Run the pass.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] encountered.
    fn run(&self, files: &mut Files) -> Result<(), ValidationError>;

    /// Run the pass and report completion through a callback.
    ///
    /// `done` is called exactly once: with `None` on success, or with the
    /// first violation.
    fn run_with_done<F>(&self, files: &mut Files, done: F)
    where
        F: FnOnce(Option<ValidationError>),
        Self: Sized,
    {
        done(self.run(files).err());
    }
}

/// The metadata validation plugin.
///
/// # Example
///
/// ```
/// use metacheck::prelude::*;
/// use serde_json::json;
///
/// let validate = Validate::new(vec![
///     Rule::new("*.md")?.key("title", Validator::new().exists(true).types(["String"])?),
/// ]);
///
/// let mut files = Files::new();
/// files.insert("index.md".into(), metadata(json!({ "title": 42 })));
///
/// let err = validate.run(&mut files).unwrap_err();
/// assert_eq!(err.to_string(), r#"File "index.md" value "title" must be of type [String]."#);
/// # Ok::<(), ConfigError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Validate {
    rules: Vec<Rule>,
}

/// Successful outcome of one key.
enum Checked {
    Defaulted(Value),
    Absent,
    Passed,
}

impl Validate {
    /// Build from already-normalized rules.
    #[must_use]
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    /// Build from raw configuration.
    ///
    /// # Errors
    ///
    /// Propagates [`normalize()`] errors.
    pub fn from_config(config: RawConfig) -> Result<Self, ConfigError> {
        normalize(config).map(Self::new)
    }

    /// Build from a JSON value in either config form.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidConfig`] if the value is not a valid
    /// config shape, or any normalization error.
    pub fn from_value(value: Value) -> Result<Self, ConfigError> {
        Self::from_config(serde_json::from_value(value)?)
    }

    /// Build from a JSON document.
    ///
    /// # Errors
    ///
    /// See [`from_value()`](Self::from_value).
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Self::from_config(serde_json::from_str(json)?)
    }

    /// Build from a YAML document.
    ///
    /// # Errors
    ///
    /// See [`from_value()`](Self::from_value).
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        Self::from_config(serde_yaml::from_str(yaml)?)
    }

    /// The normalized rules, in evaluation order.
    #[must_use]
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Validate every file, filling defaults in place.
    ///
    /// # Errors
    ///
    /// Returns the first violation in file → rule → key order.
    pub fn run(&self, files: &mut Files) -> Result<(), ValidationError> {
        for (file, record) in files.iter_mut() {
            tracing::debug!(file = file.as_str(), "validate file");

            for rule in self.rules.iter().filter(|rule| rule.applies_to(file)) {
                tracing::debug!(file = file.as_str(), pattern = rule.pattern(), "validate against rule");

                for (key, validator) in rule.validators() {
                    check_key(file, key, validator, record)?;
                }
            }
        }
        Ok(())
    }

    /// Validate every file exactly like [`run()`](Self::run), recording each step.
    #[must_use]
    pub fn run_with_trace(&self, files: &mut Files) -> RunTrace {
        let mut trace = RunTrace::default();

        for (file, record) in files.iter_mut() {
            tracing::debug!(file = file.as_str(), "validate file");
            let mut file_trace = FileTrace {
                file: file.clone(),
                rules: Vec::with_capacity(self.rules.len()),
            };
            let mut failed = false;

            for (index, rule) in self.rules.iter().enumerate() {
                let matched = rule.applies_to(file);
                let mut rule_trace = RuleTrace {
                    index,
                    pattern: rule.pattern().to_string(),
                    matched,
                    keys: Vec::new(),
                };

                if matched {
                    tracing::debug!(file = file.as_str(), pattern = rule.pattern(), "validate against rule");
                    for (key, validator) in rule.validators() {
                        let outcome = match check_key(file, key, validator, record) {
                            Ok(Checked::Defaulted(value)) => KeyOutcome::Defaulted(value),
                            Ok(Checked::Absent) => KeyOutcome::Absent,
                            Ok(Checked::Passed) => KeyOutcome::Passed,
                            Err(err) => {
                                failed = true;
                                KeyOutcome::Failed(err)
                            }
                        };
                        rule_trace.keys.push(KeyTrace {
                            key: key.to_string(),
                            outcome,
                        });
                        if failed {
                            break;
                        }
                    }
                }

                file_trace.rules.push(rule_trace);
                if failed {
                    break;
                }
            }

            trace.files.push(file_trace);
            if failed {
                break;
            }
        }

        trace
    }
}

impl Plugin for Validate {
    fn run(&self, files: &mut Files) -> Result<(), ValidationError> {
        Validate::run(self, files)
    }
}

/// Evaluate one key of one applying rule against a record.
fn check_key(
    file: &str,
    key: &str,
    validator: &Validator,
    record: &mut Metadata,
) -> Result<Checked, ValidationError> {
    if let Some(default) = &validator.default {
        if !record.contains_key(key) {
            let value = default.resolve(None);
            tracing::debug!(file, key, %value, "applied default");
            record.insert(key.to_string(), value.clone());
            return Ok(Checked::Defaulted(value));
        }
    }

    let present = record.contains_key(key);
    if let Some(expected) = validator.exists {
        if expected != present {
            return Err(ValidationError::Existence {
                file: file.to_string(),
                key: key.to_string(),
                expected,
            });
        }
    }

    let Some(value) = record.get(key) else {
        return Ok(Checked::Absent);
    };

    if let Some(types) = &validator.types {
        let primitive = typeof_name(value);
        let valid = types.iter().any(|t| t.as_str() == primitive)
            || types.iter().any(|t| t.descriptor().check(value));
        if !valid {
            return Err(ValidationError::Type {
                file: file.to_string(),
                key: key.to_string(),
                types: types.iter().map(|t| t.as_str().to_string()).collect(),
            });
        }
    }

    if let Some(pattern) = &validator.pattern {
        if !pattern.matches(value) {
            return Err(ValidationError::Pattern {
                file: file.to_string(),
                key: key.to_string(),
                pattern: pattern.to_string(),
            });
        }
    }

    tracing::trace!(file, key, "key passed");
    Ok(Checked::Passed)
}
