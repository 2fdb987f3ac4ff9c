use serde_json::{Map, Value};
use tracing::warn;

use crate::engine::GenContext;
use crate::errors::GenerationError;
use crate::random;
use crate::schema;
use crate::traverse::traverse;

/// Regeneration attempts allowed for duplicate elements under
/// `uniqueItems` before accepting a shorter array.
const UNIQUE_RETRY_BUDGET: u32 = 100;

pub fn array(
    ctx: &mut GenContext<'_>,
    node: &Value,
    path: &[String],
    level: u32,
) -> Result<Value, GenerationError> {
    let items = node.get("items");
    let additional = node.get("additionalItems");

    if items.is_none() && additional.is_none() {
        if schema::has_any(node, &["minItems", "maxItems", "uniqueItems"]) {
            return Err(GenerationError::MalformedArraySchema {
                schema: schema::short(node),
                path: schema::render_path(path),
            });
        }
        return Ok(Value::Array(Vec::new()));
    }

    // positional tuple
    if let Some(Value::Array(tuple)) = items {
        let mut out = Vec::with_capacity(tuple.len());
        for (index, item) in tuple.iter().enumerate() {
            out.push(traverse(ctx, item.clone(), &item_path(path, index), level + 1)?);
        }
        return Ok(Value::Array(out));
    }

    let (min_items, max_items) = clamp_lengths(ctx, node);
    let length = draw_length(ctx, min_items, max_items);

    let item_schema = match items {
        Some(value) => value.clone(),
        None => match additional {
            Some(value @ Value::Object(_)) => value.clone(),
            _ => Value::Object(Map::new()),
        },
    };

    let mut out = Vec::with_capacity(length as usize);
    for index in 0..length {
        out.push(traverse(
            ctx,
            item_schema.clone(),
            &item_path(path, index as usize),
            level + 1,
        )?);
    }

    let unique = match node.get("uniqueItems") {
        Some(Value::Bool(flag)) => *flag,
        Some(other) => !other.is_null(),
        None => false,
    };
    if unique {
        out = deduplicate(ctx, out, &item_schema, path, level)?;
    }
    Ok(Value::Array(out))
}

fn item_path(path: &[String], index: usize) -> Vec<String> {
    let mut sub = path.to_vec();
    sub.push("items".to_string());
    sub.push(index.to_string());
    sub
}

fn clamp_lengths(ctx: &GenContext<'_>, node: &Value) -> (Option<u64>, Option<u64>) {
    let mut min_items = node.get("minItems").and_then(Value::as_u64);
    let mut max_items = node.get("maxItems").and_then(Value::as_u64);
    if ctx.options.min_items > 0 {
        min_items = Some(match max_items {
            Some(cap) => ctx.options.min_items.min(cap),
            None => ctx.options.min_items,
        });
    }
    if let Some(cap) = ctx.options.max_items {
        if max_items.map(|value| value > cap).unwrap_or(false) {
            max_items = Some(cap);
        }
        if min_items.map(|value| value > cap).unwrap_or(false) {
            min_items = max_items;
        }
    }
    (min_items, max_items)
}

/// Element count for a non-tuple array; the optionals-probability policy
/// scales the draw (or the declared cap under fixed probabilities).
fn draw_length(ctx: &mut GenContext<'_>, min_items: Option<u64>, max_items: Option<u64>) -> u64 {
    let probability = if ctx.options.always_fake_optionals {
        Some(1.0)
    } else {
        ctx.options.optionals_probability
    };
    let fixed = ctx.options.always_fake_optionals || ctx.options.fixed_probabilities;
    let draw = |rng: &mut dyn rand::RngCore| {
        random::number(
            rng,
            min_items.map(|value| value as f64),
            max_items.map(|value| value as f64),
            1.0,
            5.0,
            false,
        )
    };
    let length = draw(&mut *ctx.rng) as u64;
    match probability {
        None => length,
        Some(probability) => {
            let scaled = if fixed {
                (max_items.map(|value| value as f64).unwrap_or(length as f64) * probability).round()
            } else {
                (draw(&mut *ctx.rng) * probability).abs().round()
            };
            (scaled.max(0.0) as u64).max(min_items.unwrap_or(0))
        }
    }
}

/// Replaces duplicates with fresh draws until the requested count is
/// reached or the retry budget runs out; equality is deep structural.
fn deduplicate(
    ctx: &mut GenContext<'_>,
    generated: Vec<Value>,
    item_schema: &Value,
    path: &[String],
    level: u32,
) -> Result<Vec<Value>, GenerationError> {
    let requested = generated.len();
    let mut kept: Vec<Value> = Vec::with_capacity(requested);
    for value in generated {
        if !kept.contains(&value) {
            kept.push(value);
        }
    }
    let mut budget = UNIQUE_RETRY_BUDGET;
    while kept.len() < requested && budget > 0 {
        let candidate = traverse(
            ctx,
            item_schema.clone(),
            &item_path(path, kept.len()),
            level + 1,
        )?;
        if kept.contains(&candidate) {
            budget -= 1;
        } else {
            kept.push(candidate);
        }
    }
    if kept.len() < requested {
        warn!(
            requested,
            produced = kept.len(),
            "uniqueItems retry budget exhausted, keeping shorter array"
        );
    }
    Ok(kept)
}
