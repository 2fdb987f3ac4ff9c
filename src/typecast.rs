//! Constraint normalization and output coercion applied around raw
//! generator draws.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::errors::GenerationError;
use crate::options::GenerateOptions;
use crate::random;

const PADDING: &[char] = &[' ', '/', '_', '-', '+', '=', '@', '^'];

/// Constraints extracted from a schema node before generation, after
/// global option clamps were applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct CastParams {
    pub minimum: Option<f64>,
    pub maximum: Option<f64>,
    pub min_length: Option<u64>,
    pub max_length: Option<u64>,
}

/// Runs `produce` between the two typecast phases: constraint
/// normalization first (which may rewrite the node's `enum`), then
/// coercion of the raw draw into the declared type with string length and
/// format fixups.
pub fn typecast<F>(
    declared: Option<&str>,
    node: &mut Value,
    options: &GenerateOptions,
    rng: &mut dyn rand::RngCore,
    produce: F,
) -> Result<Value, GenerationError>
where
    F: FnOnce(&Value, &CastParams, &mut dyn rand::RngCore) -> Result<Value, GenerationError>,
{
    let params = normalize_constraints(declared, node, options);
    let raw = produce(&*node, &params, rng)?;
    coerce(declared, &*node, &params, raw, options, rng)
}

fn effective_type(declared: Option<&str>, node: &Value) -> Option<String> {
    declared
        .map(str::to_owned)
        .or_else(|| node.get("type").and_then(Value::as_str).map(str::to_owned))
}

fn normalize_constraints(
    declared: Option<&str>,
    node: &mut Value,
    options: &GenerateOptions,
) -> CastParams {
    let mut params = CastParams::default();
    match effective_type(declared, node).as_deref() {
        Some("integer") | Some("number") => {
            params.minimum = node.get("minimum").and_then(Value::as_f64);
            params.maximum = node.get("maximum").and_then(Value::as_f64);
            if node.get("enum").map(Value::is_array).unwrap_or(false) {
                filter_numeric_enum(node, &params);
            }
        }
        Some("string") => {
            params.min_length = node.get("minLength").and_then(Value::as_u64);
            params.max_length = node.get("maxLength").and_then(Value::as_u64);
            if let Some(cap) = options.max_length {
                if params.max_length.map(|value| value > cap).unwrap_or(false) {
                    params.max_length = Some(cap);
                }
            }
            if options.min_length > 0
                && params
                    .min_length
                    .map(|value| value < options.min_length)
                    .unwrap_or(false)
            {
                params.min_length = Some(options.min_length);
            }
        }
        _ => {}
    }
    params
}

/// Drops enum candidates falling outside the declared numeric bounds;
/// exclusive bounds are stepped inward by `multipleOf` (or 1).
fn filter_numeric_enum(node: &mut Value, params: &CastParams) {
    let step = node
        .get("multipleOf")
        .and_then(Value::as_f64)
        .unwrap_or(1.0);
    let mut min = params.minimum.unwrap_or(0.0).max(0.0);
    let mut max = params.maximum.unwrap_or(f64::INFINITY);
    let exclusive_min = node
        .get("exclusiveMinimum")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let exclusive_max = node
        .get("exclusiveMaximum")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    if exclusive_min && Some(min) == params.minimum {
        min += step;
    }
    if exclusive_max && Some(max) == params.maximum {
        max -= step;
    }
    if min == 0.0 && max.is_infinite() {
        return;
    }
    if let Some(Value::Array(choices)) = node.get_mut("enum") {
        choices.retain(|choice| {
            choice
                .as_f64()
                .map(|value| value >= min && value <= max)
                .unwrap_or(false)
        });
    }
}

fn coerce(
    declared: Option<&str>,
    node: &Value,
    params: &CastParams,
    raw: Value,
    options: &GenerateOptions,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    match effective_type(declared, node).as_deref() {
        Some("number") => Ok(float_value(as_f64_lossy(&raw))),
        Some("integer") => Ok(Value::from(as_f64_lossy(&raw).trunc() as i64)),
        Some("boolean") => Ok(Value::Bool(truthy(&raw))),
        Some("string") => coerce_string(node, params, raw, options, rng),
        _ => Ok(raw),
    }
}

fn coerce_string(
    node: &Value,
    params: &CastParams,
    raw: Value,
    options: &GenerateOptions,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    let mut text = match raw {
        Value::String(s) => s,
        Value::Null => "null".to_string(),
        other => other.to_string(),
    };

    let min = params.min_length.unwrap_or(0) as usize;
    while text.chars().count() < min {
        let filler = match node.get("pattern").and_then(Value::as_str) {
            Some(pattern) => random::randexp(rng, pattern, options.default_rand_exp_max)?,
            None => {
                let separator = random::pick(rng, PADDING).copied().unwrap_or(' ');
                format!("{separator}{text}")
            }
        };
        text.push_str(&filler);
    }
    if let Some(max) = params.max_length {
        truncate_chars(&mut text, max as usize);
    }

    match node.get("format").and_then(Value::as_str) {
        Some("date-time") | Some("datetime") => {
            if let Ok(parsed) = DateTime::parse_from_rfc3339(&text) {
                text = parsed
                    .with_timezone(&Utc)
                    .to_rfc3339_opts(SecondsFormat::Millis, true);
            }
        }
        Some("date") => {
            if text.len() > 10 && DateTime::parse_from_rfc3339(&text).is_ok() {
                text.truncate(10);
            }
        }
        Some("time") => {
            if DateTime::parse_from_rfc3339(&text).is_ok() {
                text = text.chars().skip(11).collect();
            }
        }
        _ => {}
    }
    Ok(Value::String(text))
}

fn truncate_chars(text: &mut String, max: usize) {
    if text.chars().count() > max {
        *text = text.chars().take(max).collect();
    }
}

fn as_f64_lossy(value: &Value) -> f64 {
    match value {
        Value::Number(number) => number.as_f64().unwrap_or(0.0),
        Value::String(text) => text.trim().parse().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null | Value::Bool(false) => false,
        Value::Number(number) => number.as_f64().map(|v| v != 0.0).unwrap_or(false),
        Value::String(text) => !text.is_empty(),
        _ => true,
    }
}

/// JSON number from a float; non-finite values degrade to null since JSON
/// cannot carry them.
pub fn float_value(value: f64) -> Value {
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}
