//! metacheck-test: Reference pipeline host for conformance testing
//!
//! Provides a minimal file-pipeline host ([`Pipeline`]) that owns a file
//! collection and runs [`Plugin`]s over it in order, aborting on the first
//! error. This is the reference for how a static-site build drives
//! metacheck.
//!
//! # Example
//!
//! ```
//! use metacheck_test::prelude::*;
//! use serde_json::json;
//!
//! let pipeline = Pipeline::new()
//!     .using(Validate::from_value(json!({ "layout": { "default": "page.html" } })).unwrap());
//!
//! let mut files = file_set([("index.md", json!({ "title": "Home" }))]);
//! pipeline.build(&mut files).unwrap();
//! assert_eq!(files["index.md"]["layout"], json!("page.html"));
//! ```

use metacheck::{metadata, Files, Plugin, ValidationError};

#[cfg(feature = "fixtures")]
pub mod fixture;

/// A file-pipeline host: an ordered list of plugins run over one collection.
#[derive(Default)]
pub struct Pipeline {
    plugins: Vec<Box<dyn Plugin>>,
}

impl Pipeline {
    /// Create an empty pipeline.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a plugin (builder pattern).
    #[must_use]
    pub fn using(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Number of plugins in the pipeline.
    #[must_use]
    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    /// Returns `true` if the pipeline has no plugins.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    /// Run every plugin in order over `files`.
    ///
    /// Stops at the first plugin that fails; later plugins never run. Any
    /// changes made before the failure stay in `files`.
    ///
    /// # Errors
    ///
    /// Returns the failing plugin's error.
    pub fn build(&self, files: &mut Files) -> Result<(), ValidationError> {
        tracing::debug!(plugins = self.plugins.len(), files = files.len(), "build");
        for (index, plugin) in self.plugins.iter().enumerate() {
            if let Err(err) = plugin.run(files) {
                tracing::warn!(plugin = index, %err, "build aborted");
                return Err(err);
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("plugins", &self.plugins.len())
            .finish()
    }
}

/// Build a [`Files`] collection from `(path, json)` pairs.
///
/// Non-object JSON values become empty records.
pub fn file_set<I, P>(entries: I) -> Files
where
    I: IntoIterator<Item = (P, serde_json::Value)>,
    P: Into<String>,
{
    entries
        .into_iter()
        .map(|(path, value)| (path.into(), metadata(value)))
        .collect()
}

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::{file_set, Pipeline};
    pub use metacheck::prelude::*;
}

#[cfg(test)]
mod tests {
    use super::*;
    use metacheck::{Rule, Validate, Validator};
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts how often it runs.
    struct Counter(Arc<AtomicUsize>);

    impl Plugin for Counter {
        fn run(&self, _files: &mut Files) -> Result<(), ValidationError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn file_set_builder() {
        let files = file_set([("b.md", json!({ "x": 1 })), ("a.md", json!(null))]);
        let paths: Vec<_> = files.keys().map(String::as_str).collect();
        assert_eq!(paths, ["a.md", "b.md"]);
        assert!(files["a.md"].is_empty());
    }

    #[test]
    fn empty_pipeline_is_noop() {
        let mut files = file_set([("a.md", json!({}))]);
        let pipeline = Pipeline::new();
        assert!(pipeline.is_empty());
        assert!(pipeline.build(&mut files).is_ok());
    }

    #[test]
    fn plugins_run_in_order() {
        let fill = Validate::new(vec![
            Rule::match_all().key("layout", Validator::new().default_value("page.html")),
        ]);
        let require = Validate::new(vec![Rule::match_all().key("layout", true)]);

        let pipeline = Pipeline::new().using(fill).using(require);
        let mut files = file_set([("a.md", json!({}))]);
        assert!(pipeline.build(&mut files).is_ok());
        assert_eq!(pipeline.len(), 2);
    }

    #[test]
    fn failure_stops_the_build() {
        let count = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .using(Validate::new(vec![Rule::match_all().key("title", true)]))
            .using(Counter(Arc::clone(&count)));

        let mut files = file_set([("a.md", json!({}))]);
        let err = pipeline.build(&mut files).unwrap_err();
        assert_eq!(err.key(), "title");
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn debug_shows_plugin_count() {
        let pipeline = Pipeline::new().using(Validate::default());
        assert_eq!(format!("{pipeline:?}"), "Pipeline { plugins: 1 }");
    }
}
