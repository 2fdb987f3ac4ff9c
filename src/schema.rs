//! Schema-node utilities shared by the reducer and the traversal engine.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value, json};

use crate::random;

/// Every primitive type a schema can declare.
pub const ALL_TYPES: &[&str] = &[
    "array", "object", "integer", "number", "string", "boolean", "null",
];

/// Keywords whose values are plain data, never nested sub-schemas.
pub const RESERVED_KEYS: &[&str] = &[
    "enum",
    "const",
    "default",
    "examples",
    "required",
    "definitions",
];

/// Parent-path segments marking sub-schema containers; structural type
/// inference is suppressed directly beneath them.
pub const SUBSCHEMA_CONTAINERS: &[&str] = &[
    "additionalItems",
    "items",
    "additionalProperties",
    "dependencies",
    "patternProperties",
    "properties",
];

static TEMPLATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#\{([\w.-]+)\}").expect("template pattern is valid"));

pub fn is_reserved_key(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

pub fn render_path(path: &[String]) -> String {
    path.join("/")
}

/// Deep merge of `b` into `a`: scalars override, arrays union without
/// duplicates, nested objects merge recursively.
pub fn merge(a: &mut Value, b: &Value) {
    let Value::Object(source) = b else { return };
    if !a.is_object() {
        *a = Value::Object(Map::new());
    }
    let Value::Object(target) = a else { return };
    for (key, incoming) in source {
        match incoming {
            Value::Array(items) => {
                let entry = target
                    .entry(key.clone())
                    .or_insert_with(|| Value::Array(Vec::new()));
                if !entry.is_array() {
                    *entry = Value::Array(Vec::new());
                }
                if let Value::Array(existing) = entry {
                    for item in items {
                        if !existing.contains(item) {
                            existing.push(item.clone());
                        }
                    }
                }
            }
            Value::Object(_) => {
                let entry = target.entry(key.clone()).or_insert(Value::Null);
                if !entry.is_object() {
                    *entry = Value::Object(Map::new());
                }
                merge(entry, incoming);
            }
            other => {
                target.insert(key.clone(), other.clone());
            }
        }
    }
}

/// Shallow copy of an object without the named keys.
pub fn omit_props(value: &Value, props: &[&str]) -> Value {
    let Value::Object(map) = value else {
        return value.clone();
    };
    let mut copy = Map::new();
    for (key, entry) in map {
        if !props.contains(&key.as_str()) {
            copy.insert(key.clone(), entry.clone());
        }
    }
    Value::Object(copy)
}

pub fn has_any(value: &Value, keys: &[&str]) -> bool {
    keys.iter().any(|key| value.get(*key).is_some())
}

/// Compact rendering of a schema fragment for error messages.
pub fn short(schema: &Value) -> String {
    let compact = schema.to_string();
    if compact.len() <= 400 {
        return compact;
    }
    let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| compact.clone());
    let mut cut: String = pretty.chars().take(400).collect();
    cut.push_str("...");
    cut
}

/// Substitutes `#{token}` placeholders in string values with the matching
/// top-level entries of the root schema. Arrays are templated element-wise.
pub fn template(value: &Value, root: &Value) -> Value {
    match value {
        Value::Array(items) => {
            Value::Array(items.iter().map(|item| template(item, root)).collect())
        }
        Value::String(text) => {
            let replaced = TEMPLATE_RE.replace_all(text, |caps: &regex::Captures<'_>| {
                match root.get(&caps[1]) {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => String::new(),
                }
            });
            Value::String(replaced.into_owned())
        }
        other => other.clone(),
    }
}

/// Arbitrary JSON value used for "anything but" draws.
pub fn any_value(rng: &mut dyn rand::RngCore) -> Value {
    use rand::Rng;
    match rng.random_range(0..9) {
        0 => Value::Bool(false),
        1 => Value::Bool(true),
        2 => Value::Null,
        3 => json!(-1),
        4 => json!(std::f64::consts::PI),
        5 => json!(rng.random_range(0.0..1.0)),
        6 => Value::Array(Vec::new()),
        7 => Value::Object(Map::new()),
        _ => Value::String(format!("{:08x}", rng.random::<u32>())),
    }
}

/// Builds a schema meant to produce values outside the excluded sub-schema.
/// Best-effort inversions: bounds flip into exclusive opposites, declared
/// types are negated (number and integer count as one type), excluded enum
/// values are avoided by retrying arbitrary draws, and properties required
/// by the excluded schema are dropped.
pub fn not_value(excluded: &Value, parent: &Value, rng: &mut dyn rand::RngCore) -> Value {
    let mut copy = Value::Object(Map::new());
    merge(&mut copy, parent);

    if let Some(min) = excluded.get("minimum") {
        copy["maximum"] = min.clone();
        copy["exclusiveMaximum"] = Value::Bool(true);
    }
    if let Some(max) = excluded.get("maximum").and_then(Value::as_f64) {
        let current = copy.get("maximum").and_then(Value::as_f64);
        let minimum = if current.map(|value| max > value).unwrap_or(false) {
            0.0
        } else {
            max
        };
        copy["minimum"] = json!(minimum);
        copy["exclusiveMinimum"] = Value::Bool(true);
    }
    if let Some(len) = excluded.get("minLength") {
        copy["maxLength"] = len.clone();
    }
    if let Some(len) = excluded.get("maxLength").and_then(Value::as_u64) {
        let current = copy.get("maxLength").and_then(Value::as_u64);
        let min_length = if current.map(|value| len > value).unwrap_or(false) {
            0
        } else {
            len
        };
        copy["minLength"] = json!(min_length);
    }

    if let Some(declared) = excluded.get("type") {
        let excluded_types: Vec<&str> = match declared {
            Value::String(name) => vec![name.as_str()],
            Value::Array(names) => names.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        let candidates: Vec<&str> = ALL_TYPES
            .iter()
            .copied()
            .filter(|candidate| {
                excluded_types.iter().all(|banned| {
                    if *candidate == "number" || *candidate == "integer" {
                        *banned != "number" && *banned != "integer"
                    } else {
                        candidate != banned
                    }
                })
            })
            .collect();
        if let Some(chosen) = random::pick(rng, &candidates) {
            copy["type"] = json!(chosen);
        }
    } else if let Some(Value::Array(banned)) = excluded.get("enum") {
        let mut value = any_value(rng);
        let mut budget = 100;
        while banned.contains(&value) && budget > 0 {
            value = any_value(rng);
            budget -= 1;
        }
        copy["enum"] = Value::Array(vec![value]);
    }

    if let (Some(Value::Array(required)), Some(Value::Object(props))) =
        (excluded.get("required"), copy.get_mut("properties"))
    {
        for name in required.iter().filter_map(Value::as_str) {
            props.remove(name);
        }
    }
    copy
}

/// Accepts an enum candidate when at least one alternative's declared
/// numeric bounds admit it; non-numeric candidates always pass, and an
/// alternative without bounds admits everything.
pub fn satisfies_any_bounds(value: &Value, alternatives: &[Value]) -> bool {
    let Some(number) = value.as_f64() else {
        return true;
    };
    alternatives.iter().any(|alternative| {
        let min_ok = alternative
            .get("minimum")
            .and_then(Value::as_f64)
            .map(|min| number >= min)
            .unwrap_or(true);
        let max_ok = alternative
            .get("maximum")
            .and_then(Value::as_f64)
            .map(|max| number <= max)
            .unwrap_or(true);
        min_ok && max_ok
    })
}
