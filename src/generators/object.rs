use rand::Rng;
use serde_json::{Map, Value};

use crate::engine::GenContext;
use crate::errors::GenerationError;
use crate::generators::{any_type_schema, string::word};
use crate::random;
use crate::schema;
use crate::traverse::traverse;

pub fn object(
    ctx: &mut GenContext<'_>,
    node: &Value,
    path: &[String],
    level: u32,
) -> Result<Value, GenerationError> {
    let empty = Map::new();
    let properties = node
        .get("properties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let pattern_properties = node
        .get("patternProperties")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let required: Vec<&str> = node
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();

    // nothing can be generated when additional members are forbidden and
    // no property source exists, whatever the count keywords ask for
    let forbids_additional = node.get("additionalProperties") == Some(&Value::Bool(false));
    if forbids_additional
        && properties.is_empty()
        && pattern_properties.is_empty()
        && schema::has_any(
            node,
            &["minProperties", "maxProperties", "dependencies", "required"],
        )
    {
        return Ok(Value::Object(Map::new()));
    }

    let mut out = Map::new();

    for name in &required {
        if let Some(property) = properties.get(*name) {
            let sub_path = member_path(path, name);
            out.insert(
                (*name).to_string(),
                traverse(ctx, property.clone(), &sub_path, level + 1)?,
            );
        }
    }

    let include_probability = if ctx.options.always_fake_optionals {
        Some(1.0)
    } else {
        ctx.options.optionals_probability
    };

    if !ctx.options.required_only {
        for (name, property) in properties {
            if out.contains_key(name) {
                continue;
            }
            if let Some(probability) = include_probability {
                if !ctx.rng.random_bool(probability.clamp(0.0, 1.0)) {
                    continue;
                }
            }
            let sub_path = member_path(path, name);
            out.insert(
                name.clone(),
                traverse(ctx, property.clone(), &sub_path, level + 1)?,
            );
        }

        for (pattern, property) in pattern_properties {
            if let Some(probability) = include_probability {
                if !ctx.rng.random_bool(probability.clamp(0.0, 1.0)) {
                    continue;
                }
            }
            let key = random::randexp(&mut *ctx.rng, pattern, ctx.options.default_rand_exp_max)?;
            if key.is_empty() || out.contains_key(&key) {
                continue;
            }
            let sub_path = member_path(path, &key);
            let value = traverse(ctx, property.clone(), &sub_path, level + 1)?;
            out.insert(key, value);
        }

        // with no declared members, an additional-properties schema (or a
        // blanket `true`) still fills the object
        if properties.is_empty() && pattern_properties.is_empty() {
            let filler = match node.get("additionalProperties") {
                Some(Value::Bool(true)) => Some(any_type_schema()),
                Some(value @ Value::Object(_)) => Some(value.clone()),
                _ => None,
            };
            if let Some(filler) = filler {
                let min = node.get("minProperties").and_then(Value::as_u64);
                let max = node.get("maxProperties").and_then(Value::as_u64);
                let count = random::number(
                    &mut *ctx.rng,
                    min.map(|value| value as f64),
                    max.map(|value| value as f64),
                    1.0,
                    3.0,
                    false,
                ) as u64;
                for index in 0..count {
                    let key = format!("{}{}", word(&mut *ctx.rng), index);
                    let sub_path = member_path(path, &key);
                    let value = traverse(ctx, filler.clone(), &sub_path, level + 1)?;
                    out.insert(key, value);
                }
            }
        }
    }

    Ok(Value::Object(out))
}

fn member_path(path: &[String], name: &str) -> Vec<String> {
    let mut sub = path.to_vec();
    sub.push(name.to_string());
    sub
}
