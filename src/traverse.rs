//! Traversal engine: reduces each node, applies the fixed precedence chain
//! (examples, default, not, const, enum) and dispatches to the per-type
//! generators.

use serde_json::{Map, Value};
use tracing::debug;

use crate::engine::GenContext;
use crate::errors::GenerationError;
use crate::generators;
use crate::infer;
use crate::random;
use crate::reducer::{self, Reduced};
use crate::schema;
use crate::typecast::typecast;

/// Depth cap for the generic copy path over free-form fragments.
const MAX_COPY_DEPTH: u32 = 6;

pub fn traverse(
    ctx: &mut GenContext<'_>,
    node: Value,
    path: &[String],
    level: u32,
) -> Result<Value, GenerationError> {
    let reduction = reducer::reduce(ctx, node, 0, path)?;
    let result = visit(ctx, reduction.reduced, path, level);
    for reference in &reduction.expanded_refs {
        if let Some(count) = ctx.ref_depth.get_mut(reference) {
            *count = count.saturating_sub(1);
        }
    }
    result
}

fn visit(
    ctx: &mut GenContext<'_>,
    reduced: Reduced,
    path: &[String],
    level: u32,
) -> Result<Value, GenerationError> {
    let mut node = match reduced {
        Reduced::Circular => return Ok(Value::Object(Map::new())),
        Reduced::Deferred(thunk) => {
            let chosen = thunk.invoke(&mut *ctx.rng);
            return traverse(ctx, chosen, path, level);
        }
        Reduced::Wrapped { keyword, node } => {
            let mut node = node;
            let root = ctx.root.clone();
            let value = ctx
                .keywords
                .generate(&keyword, &node, &root, &mut *ctx.rng)?;
            return typecast(None, &mut node, ctx.options, &mut *ctx.rng, move |_, _, _| {
                Ok(value)
            });
        }
        Reduced::Node(node) => node,
    };

    if !node.is_object() {
        // boolean schemas: `true` admits anything, `false` admits nothing
        return Ok(match node {
            Value::Bool(true) => schema::any_value(&mut *ctx.rng),
            _ => Value::Null,
        });
    }

    if ctx.options.use_examples_value {
        let pool: Option<Vec<Value>> = node
            .get("examples")
            .and_then(Value::as_array)
            .filter(|examples| !examples.is_empty())
            .map(|examples| {
                let mut pool = examples.clone();
                if let Some(default) = node.get("default") {
                    pool.push(default.clone());
                }
                pool
            });
        if let Some(pool) = pool {
            let choice = random::pick(&mut *ctx.rng, &pool)
                .cloned()
                .unwrap_or(Value::Null);
            return typecast(None, &mut node, ctx.options, &mut *ctx.rng, move |_, _, _| {
                Ok(choice)
            });
        }
    }

    if ctx.options.use_default_value {
        if let Some(default) = node.get("default") {
            return Ok(default.clone());
        }
    }

    if node.get("not").map(Value::is_object).unwrap_or(false) {
        let excluded = node.get("not").cloned().unwrap_or(Value::Null);
        let parent = schema::omit_props(&node, &["not"]);
        node = schema::not_value(&excluded, &parent, &mut *ctx.rng);
    }

    if let Some(constant) = node.get("const") {
        return Ok(constant.clone());
    }

    if node.get("enum").map(Value::is_array).unwrap_or(false) {
        return typecast(None, &mut node, ctx.options, &mut *ctx.rng, |node, _, rng| {
            let choices = node
                .get("enum")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default();
            Ok(random::pick(rng, &choices).cloned().unwrap_or(Value::Null))
        });
    }

    let mut declared = node.get("type").cloned();
    if declared.as_ref().map(Value::is_array).unwrap_or(false) {
        let candidates = declared
            .and_then(|value| value.as_array().cloned())
            .unwrap_or_default();
        declared = random::pick(&mut *ctx.rng, &candidates).cloned();
        if let Some(chosen) = &declared {
            node["type"] = chosen.clone();
        }
    } else if declared.is_none() {
        if let Some(inferred) = infer::infer_type(&node, path) {
            debug!(inferred, "type inferred from constraint keywords");
            declared = Some(Value::String(inferred.to_string()));
            node["type"] = Value::String(inferred.to_string());
        }
    }

    if let Some(type_name) = declared.as_ref().and_then(Value::as_str) {
        return match type_name {
            "boolean" => Ok(generators::boolean(&mut *ctx.rng)),
            "null" => Ok(Value::Null),
            "number" => Ok(generators::number(&mut *ctx.rng, &node)),
            "integer" => Ok(generators::integer(&mut *ctx.rng, &node)),
            "string" => generators::string(ctx, &mut node, path),
            "array" => generators::array(ctx, &node, path, level),
            "object" => generators::object(ctx, &node, path, level),
            other => {
                if ctx.options.fail_on_invalid_types {
                    let mut at = path.to_vec();
                    at.push("type".to_string());
                    Err(GenerationError::UnknownType {
                        type_name: other.to_string(),
                        path: schema::render_path(&at),
                    })
                } else {
                    debug!(type_name = other, "unknown type, using placeholder");
                    Ok(ctx.options.default_invalid_type_product.clone())
                }
            }
        };
    }

    copy_fragment(ctx, &node, path, level)
}

/// Free-form fragment: annotation values are copied verbatim while nested
/// objects are traversed as schemas, up to a fixed depth.
fn copy_fragment(
    ctx: &mut GenContext<'_>,
    node: &Value,
    path: &[String],
    level: u32,
) -> Result<Value, GenerationError> {
    if level >= MAX_COPY_DEPTH {
        return Ok(Value::Object(Map::new()));
    }
    let mut copy = Map::new();
    if let Some(map) = node.as_object() {
        for (key, value) in map {
            if key == "definitions" {
                continue;
            }
            if value.is_object() {
                let mut sub_path = path.to_vec();
                sub_path.push(key.clone());
                copy.insert(key.clone(), traverse(ctx, value.clone(), &sub_path, level + 1)?);
            } else {
                copy.insert(key.clone(), value.clone());
            }
        }
    }
    Ok(Value::Object(copy))
}
