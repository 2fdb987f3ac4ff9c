//! Structural type inference for schema nodes lacking a declared `type`.

use serde_json::Value;

use crate::schema::SUBSCHEMA_CONTAINERS;

const ARRAY_KEYWORDS: &[&str] = &["additionalItems", "items", "uniqueItems"];
const NUMERIC_KEYWORDS: &[&str] = &[
    "exclusiveMaximum",
    "exclusiveMinimum",
    "maximum",
    "minimum",
    "multipleOf",
];
const OBJECT_KEYWORDS: &[&str] = &[
    "additionalProperties",
    "dependencies",
    "maxProperties",
    "minProperties",
    "patternProperties",
    "properties",
    "required",
];
const STRING_KEYWORDS: &[&str] = &["maxLength", "minLength", "pattern", "format"];

/// Infers a primitive type from which constraint keywords the node holds.
/// Checked in order: array, numeric, object, string. Inference is
/// suppressed when the node sits directly beneath a sub-schema container
/// segment, so a property literally named `items` never triggers a false
/// positive.
pub fn infer_type(node: &Value, path: &[String]) -> Option<&'static str> {
    let last = path.last().map(String::as_str);
    if last
        .map(|segment| SUBSCHEMA_CONTAINERS.contains(&segment))
        .unwrap_or(false)
    {
        return None;
    }
    let map = node.as_object()?;
    let has = |candidates: &[&str]| map.keys().any(|key| candidates.contains(&key.as_str()));
    if has(ARRAY_KEYWORDS) {
        return Some("array");
    }
    if has(NUMERIC_KEYWORDS) {
        return Some("integer");
    }
    if has(OBJECT_KEYWORDS) {
        return Some("object");
    }
    if has(STRING_KEYWORDS) {
        return Some("string");
    }
    None
}
