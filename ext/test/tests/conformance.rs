//! Conformance tests that run YAML fixtures against metacheck
//!
//! Run with: cargo test -p metacheck-test --test conformance --features metacheck-test/fixtures
//!
//! Note: This test file requires the `fixtures` feature to be enabled.

#![cfg(feature = "fixtures")]

use metacheck_test::fixture::Fixture;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the fixtures directory relative to the workspace root
fn fixtures_dir() -> PathBuf {
    let manifest_dir = env!("CARGO_MANIFEST_DIR");
    let ext_test = Path::new(manifest_dir);

    // Go up: ext/test -> ext -> workspace root
    let root = ext_test
        .parent() // ext
        .and_then(|p| p.parent()) // root
        .expect("Could not find workspace root");

    root.join("fixtures")
}

/// Load and run all fixtures in a directory
fn run_fixtures_in_dir(dir: &Path) {
    if !dir.exists() {
        panic!("Fixtures directory does not exist: {}", dir.display());
    }

    let mut paths: Vec<_> = fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| entry.expect("dir entry").path())
        .filter(|path| path.extension().is_some_and(|e| e == "yaml" || e == "yml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "No fixtures in {}", dir.display());

    for path in paths {
        println!("Running fixture: {}", path.display());

        let yaml = fs::read_to_string(&path).expect("read yaml");
        let fixtures = Fixture::from_yaml_multi(&yaml).unwrap_or_else(|e| {
            panic!("Failed to parse {}: {}", path.display(), e);
        });

        for fixture in fixtures {
            println!("  Running: {}", fixture.name);
            fixture.run_and_assert();
        }
    }
}

#[test]
fn test_defaults() {
    run_fixtures_in_dir(&fixtures_dir().join("01_defaults"));
}

#[test]
fn test_exists() {
    run_fixtures_in_dir(&fixtures_dir().join("02_exists"));
}

#[test]
fn test_types() {
    run_fixtures_in_dir(&fixtures_dir().join("03_types"));
}

#[test]
fn test_patterns() {
    run_fixtures_in_dir(&fixtures_dir().join("04_patterns"));
}

#[test]
fn test_matching() {
    run_fixtures_in_dir(&fixtures_dir().join("05_matching"));
}

#[test]
fn test_config_errors() {
    run_fixtures_in_dir(&fixtures_dir().join("06_config_errors"));
}
