//! Rule normalization: config shorthand to canonical [`Rule`]s
//!
//! Runs once, when the plugin is built. Everything the evaluator needs is
//! decided here:
//!
//! - a flat validator map becomes one rule matching `**/*`
//! - a missing or empty rule pattern becomes `**/*`, a missing `metadata`
//!   becomes empty
//! - bare `true`/`false` becomes `{ exists: true/false }`
//! - a single `type` becomes a one-element list, each descriptor parsed
//! - a `pattern` string is compiled into a regex
//!
//! Rule order and key order are preserved.

use crate::config::{RawConfig, RawValidator, RuleConfig, ValidatorConfig};
use crate::validator::{DefaultValue, TypeSpec, ValuePattern};
use crate::{ConfigError, PathPattern, Rule, Validator, MATCH_ALL};
use indexmap::IndexMap;

/// Normalize raw configuration into ordered rules.
///
/// # Errors
///
/// Returns a [`ConfigError`] for an invalid glob, regex, or type descriptor.
/// Nothing is partially built: the first error aborts normalization.
///
/// # Example
///
/// ```
/// use metacheck::{normalize, RawConfig};
///
/// let config: RawConfig = serde_json::from_value(serde_json::json!({
///     "title": true,
///     "tags": { "type": "[String]" }
/// })).unwrap();
///
/// let rules = normalize(config).unwrap();
/// assert_eq!(rules.len(), 1);
/// assert_eq!(rules[0].pattern(), "**/*");
/// assert_eq!(rules[0].get("title").unwrap().exists, Some(true));
/// ```
pub fn normalize(config: RawConfig) -> Result<Vec<Rule>, ConfigError> {
    let rules = match config {
        RawConfig::Rules(rules) => rules,
        RawConfig::Global(metadata) => vec![RuleConfig {
            pattern: None,
            metadata,
        }],
    };

    rules.into_iter().map(normalize_rule).collect()
}

fn normalize_rule(rule: RuleConfig) -> Result<Rule, ConfigError> {
    let pattern = rule
        .pattern
        .as_deref()
        .filter(|p| !p.is_empty())
        .unwrap_or(MATCH_ALL);
    tracing::debug!(pattern, keys = rule.metadata.len(), "normalize rule");

    let metadata = normalize_metadata(rule.metadata)?;
    let mut normalized = Rule::with_matcher(PathPattern::new(pattern)?);
    for (key, validator) in metadata {
        normalized = normalized.key(key, validator);
    }
    Ok(normalized)
}

fn normalize_metadata(
    metadata: IndexMap<String, RawValidator>,
) -> Result<IndexMap<String, Validator>, ConfigError> {
    metadata
        .into_iter()
        .map(|(key, raw)| Ok((key, normalize_validator(raw)?)))
        .collect()
}

/// Expand one raw validator into canonical form.
fn normalize_validator(raw: RawValidator) -> Result<Validator, ConfigError> {
    let config = match raw {
        RawValidator::Exists(exists) => return Ok(Validator::from(exists)),
        RawValidator::Full(config) => config,
    };
    let ValidatorConfig {
        default,
        exists,
        types,
        pattern,
    } = config;

    let types = types
        .map(|field| {
            field
                .into_vec()
                .into_iter()
                .map(TypeSpec::parse)
                .collect::<Result<Vec<_>, _>>()
        })
        .transpose()?;

    let pattern = pattern.as_deref().map(ValuePattern::regex).transpose()?;

    Ok(Validator {
        default: default.map(DefaultValue::Literal),
        exists,
        types,
        pattern,
    })
}
