//! Config types for rule construction.
//!
//! These types capture what the user wrote, shorthand included. They are
//! serde-deserializable from JSON or YAML and are turned into runtime types
//! by [`normalize()`](crate::normalize).
//!
//! # Relationship to runtime types
//!
//! | Config type | Runtime type |
//! |-------------|-------------|
//! | [`RawConfig`] | `Vec<`[`Rule`](crate::Rule)`>` |
//! | [`RuleConfig`] | [`Rule`](crate::Rule) |
//! | [`RawValidator`] / [`ValidatorConfig`] | [`Validator`](crate::Validator) |
//! | [`TypeField`] | `Vec<`[`TypeSpec`](crate::TypeSpec)`>` |
//!
//! Callback-valued defaults and predicates have no serialized form; build
//! those with the [`Validator`](crate::Validator) builder instead.

use indexmap::IndexMap;
use serde::de::{self, MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::fmt;
use serde_json::Value;

/// Top-level configuration.
///
/// Either a list of rules, or a flat key → validator mapping applied to every
/// file:
///
/// ```yaml
/// # global form
/// title: true
/// layout: { default: page.html }
/// ---
/// # rule-list form
/// - pattern: "posts/**/*.md"
///   metadata:
///     date: { exists: true, type: String, pattern: '^\d{4}-\d{2}-\d{2}$' }
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawConfig {
    /// Ordered rules, each with its own pattern.
    Rules(Vec<RuleConfig>),
    /// One validator map for all files.
    Global(IndexMap<String, RawValidator>),
}

/// Configuration for a [`Rule`](crate::Rule).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuleConfig {
    /// Glob selecting the files this rule applies to. Defaults to `**/*`.
    #[serde(default)]
    pub pattern: Option<String>,

    /// Per-key validators, evaluated in the order written.
    #[serde(default)]
    pub metadata: IndexMap<String, RawValidator>,
}

/// A validator as written: either a full object or bare shorthand.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawValidator {
    /// `key: true` (must exist) or `key: false` (must not exist).
    Exists(bool),
    /// `key: { default, exists, type, pattern }`.
    #[serde(deserialize_with = "validator_map")]
    Full(ValidatorConfig),
}

/// Configuration for a [`Validator`](crate::Validator).
///
/// Every field distinguishes "absent" from "present": `default: null` is a
/// declared default of `null`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Value assigned when the key is absent.
    #[serde(default, deserialize_with = "present")]
    pub default: Option<Value>,

    /// Whether the key must exist.
    #[serde(default)]
    pub exists: Option<bool>,

    /// Acceptable type descriptor(s).
    #[serde(default, rename = "type")]
    pub types: Option<TypeField>,

    /// Regex source the value must match.
    #[serde(default)]
    pub pattern: Option<String>,
}

/// A `type` field: one descriptor or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum TypeField {
    /// `type: String`
    One(String),
    /// `type: [String, Number]`
    Many(Vec<String>),
}

impl TypeField {
    /// The descriptors as a list; a single descriptor becomes a one-element list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(descriptor) => vec![descriptor],
            Self::Many(descriptors) => descriptors,
        }
    }
}

/// Wraps whatever value is present, `null` included; the field's
/// `#[serde(default)]` covers absence.
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

/// Accepts only a mapping; the derived struct impl would also take a
/// sequence and fill fields by position.
fn validator_map<'de, D: Deserializer<'de>>(deserializer: D) -> Result<ValidatorConfig, D::Error> {
    struct MapOnly;

    impl<'de> Visitor<'de> for MapOnly {
        type Value = ValidatorConfig;

        fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("a validator map or a boolean")
        }

        fn visit_map<A: MapAccess<'de>>(self, map: A) -> Result<Self::Value, A::Error> {
            ValidatorConfig::deserialize(de::value::MapAccessDeserializer::new(map))
        }
    }

    deserializer.deserialize_map(MapOnly)
}
