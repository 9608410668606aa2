//! Conformance test fixture runner
//!
//! Loads YAML fixtures and runs them through a [`Pipeline`](crate::Pipeline)
//! with a single [`Validate`] plugin.
//!
//! ```yaml
//! name: hash config applies to all files
//! config:
//!   default: { default: unspecified }
//! cases:
//!   - name: fills only missing keys
//!     files:
//!       one.md: { default: specified }
//!       two.md: {}
//!     expect_files:
//!       two.md: { default: unspecified }
//! ---
//! name: bad regex
//! config: { slug: { pattern: "(" } }
//! expect_config_error: true
//! ```

use crate::Pipeline;
use metacheck::{Files, Validate, ValidationError};
use serde::Deserialize;

/// A complete test fixture: one config, many cases.
#[derive(Debug, Deserialize)]
pub struct Fixture {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Raw configuration, in either the global or the rule-list form.
    pub config: serde_json::Value,
    #[serde(default)]
    pub cases: Vec<TestCase>,
    /// The config itself must be rejected at construction time.
    #[serde(default)]
    pub expect_config_error: bool,
}

/// One input collection and what the pass should do to it.
#[derive(Debug, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub files: Files,
    /// The violation the pass must report; `None` means the pass succeeds.
    #[serde(default)]
    pub expect_error: Option<ExpectedError>,
    /// Keys each listed file must hold after the pass (subset match).
    #[serde(default)]
    pub expect_files: Files,
}

/// Expected violation.
#[derive(Debug, Deserialize)]
pub struct ExpectedError {
    pub kind: ErrorKind,
    pub file: String,
    pub key: String,
    /// Exact `Display` text, when the fixture pins it.
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorKind {
    Existence,
    Type,
    Pattern,
}

impl ErrorKind {
    fn of(err: &ValidationError) -> Self {
        match err {
            ValidationError::Existence { .. } => Self::Existence,
            ValidationError::Type { .. } => Self::Type,
            ValidationError::Pattern { .. } => Self::Pattern,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Runner
// ═══════════════════════════════════════════════════════════════════════════════

/// Result of running a single test case
#[derive(Debug)]
pub struct CaseResult {
    pub case_name: String,
    pub passed: bool,
    /// Human-readable mismatches; empty when `passed`.
    pub mismatches: Vec<String>,
}

impl ExpectedError {
    fn mismatches(&self, actual: &ValidationError) -> Vec<String> {
        let mut out = Vec::new();
        if self.kind != ErrorKind::of(actual) {
            out.push(format!("expected {:?} error, got {actual:?}", self.kind));
        }
        if self.file != actual.file() {
            out.push(format!("expected error in {:?}, got {:?}", self.file, actual.file()));
        }
        if self.key != actual.key() {
            out.push(format!("expected error on key {:?}, got {:?}", self.key, actual.key()));
        }
        if let Some(message) = &self.message {
            if *message != actual.to_string() {
                out.push(format!("expected message {message:?}, got {:?}", actual.to_string()));
            }
        }
        out
    }
}

impl TestCase {
    fn run(&self, pipeline: &Pipeline) -> CaseResult {
        let mut files = self.files.clone();
        let result = pipeline.build(&mut files);

        let mut mismatches = match (&self.expect_error, &result) {
            (None, Ok(())) => Vec::new(),
            (None, Err(err)) => vec![format!("unexpected error: {err}")],
            (Some(expected), Err(err)) => expected.mismatches(err),
            (Some(expected), Ok(())) => vec![format!("expected {:?} error, pass succeeded", expected.kind)],
        };

        for (path, expected) in &self.expect_files {
            let Some(record) = files.get(path) else {
                mismatches.push(format!("file {path:?} missing after pass"));
                continue;
            };
            for (key, value) in expected {
                match record.get(key) {
                    Some(actual) if actual == value => {}
                    actual => mismatches.push(format!(
                        "{path}: expected {key} = {value}, got {actual:?}"
                    )),
                }
            }
        }

        CaseResult {
            case_name: self.name.clone(),
            passed: mismatches.is_empty(),
            mismatches,
        }
    }
}

impl Fixture {
    /// Parse a fixture from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    /// Parse multiple fixtures from a YAML file with `---` separators
    pub fn from_yaml_multi(yaml: &str) -> Result<Vec<Self>, serde_yaml::Error> {
        let mut fixtures = Vec::new();
        for doc in serde_yaml::Deserializer::from_str(yaml) {
            fixtures.push(Self::deserialize(doc)?);
        }
        Ok(fixtures)
    }

    /// Build the plugin from this fixture's config.
    ///
    /// # Errors
    ///
    /// Returns the construction error, if the config is rejected.
    pub fn build(&self) -> Result<Validate, metacheck::ConfigError> {
        Validate::from_value(self.config.clone())
    }

    /// Run all test cases and return results
    ///
    /// # Panics
    ///
    /// Panics if the config fails to build (unless the fixture expects it
    /// to) or builds when an error was expected.
    pub fn run(&self) -> Vec<CaseResult> {
        let validate = match (self.build(), self.expect_config_error) {
            (Ok(validate), false) => validate,
            (Err(_), true) => return Vec::new(),
            (Ok(_), true) => panic!("Fixture '{}' expected a config error", self.name),
            (Err(e), false) => panic!("Fixture '{}' config failed: {e}", self.name),
        };

        let pipeline = Pipeline::new().using(validate);
        self.cases.iter().map(|case| case.run(&pipeline)).collect()
    }

    /// Run all test cases and panic on first failure
    pub fn run_and_assert(&self) {
        for result in self.run() {
            assert!(
                result.passed,
                "Fixture '{}' case '{}' failed:\n  {}",
                self.name,
                result.case_name,
                result.mismatches.join("\n  ")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"
name: exists
config:
  - metadata:
      title: true
cases:
  - name: present
    files:
      a.md: { title: A }
  - name: missing
    files:
      a.md: {}
    expect_error:
      kind: existence
      file: a.md
      key: title
      message: 'File "a.md" does not have value "title".'
"#;

    #[test]
    fn parses_and_runs() {
        let fixture = Fixture::from_yaml(FIXTURE).unwrap();
        assert_eq!(fixture.cases.len(), 2);
        let results = fixture.run();
        assert!(results.iter().all(|r| r.passed), "{results:?}");
    }

    #[test]
    fn reports_mismatches() {
        let mut fixture = Fixture::from_yaml(FIXTURE).unwrap();
        fixture.cases[0].expect_error = Some(ExpectedError {
            kind: ErrorKind::Type,
            file: "a.md".into(),
            key: "title".into(),
            message: None,
        });
        let results = fixture.run();
        assert!(!results[0].passed);
        assert_eq!(results[0].mismatches.len(), 1);
    }

    #[test]
    fn multi_document() {
        let yaml = format!("{FIXTURE}\n---\nname: bad\nconfig: {{ k: {{ pattern: '(' }} }}\nexpect_config_error: true\n");
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap();
        assert_eq!(fixtures.len(), 2);
        assert!(fixtures[1].run().is_empty());
    }
}
