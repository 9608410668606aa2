//! Value helpers: how metadata values look to the type and pattern gates
//!
//! Metadata values are plain [`serde_json::Value`]s. Two views of a value are
//! needed during evaluation:
//!
//! - [`typeof_name`]: the primitive type name used by the type gate's fast
//!   path (`"string"`, `"number"`, `"boolean"`, `"object"`).
//! - [`coerce_to_string`]: the text a regex pattern is matched against.

use serde_json::Value;
use std::borrow::Cow;

/// Returns the primitive type name of a value.
///
/// Mirrors the classic `typeof` operator: `null`, arrays and objects all
/// report `"object"`.
///
/// # Example
///
/// ```
/// use metacheck::typeof_name;
/// use serde_json::json;
///
/// assert_eq!(typeof_name(&json!("x")), "string");
/// assert_eq!(typeof_name(&json!(3)), "number");
/// assert_eq!(typeof_name(&json!(null)), "object");
/// assert_eq!(typeof_name(&json!([1, 2])), "object");
/// ```
#[must_use]
pub fn typeof_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null | Value::Array(_) | Value::Object(_) => "object",
    }
}

/// Returns the structural class name of a value.
///
/// This is the name the type descriptor language uses for built-in types
/// (`"String"`, `"Number"`, `"Boolean"`, `"Null"`, `"Array"`, `"Object"`).
#[must_use]
pub fn class_name(value: &Value) -> &'static str {
    match value {
        Value::String(_) => "String",
        Value::Number(_) => "Number",
        Value::Bool(_) => "Boolean",
        Value::Null => "Null",
        Value::Array(_) => "Array",
        Value::Object(_) => "Object",
    }
}

/// Coerces a value to the string a regex pattern is tested against.
///
/// Strings are borrowed as-is. Scalars use their natural text form, with
/// whole floats printed as integers (`1.0` as `"1"`); arrays
/// join their elements with `,` and objects render as compact JSON.
///
/// # Example
///
/// ```
/// use metacheck::coerce_to_string;
/// use serde_json::json;
///
/// assert_eq!(coerce_to_string(&json!("post")), "post");
/// assert_eq!(coerce_to_string(&json!(42)), "42");
/// assert_eq!(coerce_to_string(&json!(["a", 1])), "a,1");
/// ```
#[must_use]
pub fn coerce_to_string(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed("null"),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(number_to_string(n)),
        Value::Array(items) => Cow::Owned(
            items
                .iter()
                .map(|item| match item {
                    // Nested nulls vanish when an array is joined.
                    Value::Null => String::new(),
                    other => coerce_to_string(other).into_owned(),
                })
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

/// Whole floats print without a fraction: `1.0` becomes `"1"`.
fn number_to_string(n: &serde_json::Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
        Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{f:.0}"),
        _ => n.to_string(),
    }
}
