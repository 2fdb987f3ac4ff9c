//! JSONPath post-resolution over a produced value tree: `jsonPath` marker
//! nodes are replaced by values queried from the whole tree.

use std::collections::HashMap;

use serde_json::{Map, Value};
use serde_json_path::JsonPath;

use crate::errors::GenerationError;
use crate::random;

struct QueryParams {
    path: String,
    group: String,
    cycle: bool,
    reverse: bool,
    count: u64,
}

/// One resolution pass. Query results are cached per `group__path` key so
/// related markers share a pool; `cycle` rotates forward through it,
/// `reverse` backward, otherwise a random member is picked.
pub fn resolve_json_paths(
    tree: &Value,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    let source = tree.clone();
    let mut cache: HashMap<String, Vec<Value>> = HashMap::new();
    resolve_node(tree, &source, &mut cache, None, rng)
}

fn resolve_node(
    node: &Value,
    source: &Value,
    cache: &mut HashMap<String, Vec<Value>>,
    property: Option<&str>,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    match node {
        Value::Array(items) => items
            .iter()
            .map(|item| resolve_node(item, source, cache, property, rng))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            if let Some(marker) = map.get("jsonPath") {
                return resolve_query(marker, map, source, cache, property, rng);
            }
            let mut out = Map::new();
            for (key, value) in map {
                out.insert(
                    key.clone(),
                    resolve_node(value, source, cache, Some(key), rng)?,
                );
            }
            Ok(Value::Object(out))
        }
        other => Ok(other.clone()),
    }
}

fn resolve_query(
    marker: &Value,
    holder: &Map<String, Value>,
    source: &Value,
    cache: &mut HashMap<String, Vec<Value>>,
    property: Option<&str>,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    let mut params = match marker {
        Value::String(path) => QueryParams {
            path: path.clone(),
            group: String::new(),
            cycle: false,
            reverse: false,
            count: 1,
        },
        Value::Object(map) => QueryParams {
            path: map
                .get("path")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            group: map
                .get("group")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            cycle: map.get("cycle").and_then(Value::as_bool).unwrap_or(false),
            reverse: map.get("reverse").and_then(Value::as_bool).unwrap_or(false),
            count: map.get("count").and_then(Value::as_u64).unwrap_or(1),
        },
        other => return Ok(other.clone()),
    };
    // sibling keys on the holder override the marker's own parameters
    if let Some(group) = holder.get("group").and_then(Value::as_str) {
        params.group = group.to_string();
    }
    if params.group.is_empty() {
        params.group = property.unwrap_or_default().to_string();
    }
    if holder.get("cycle").and_then(Value::as_bool).unwrap_or(false) {
        params.cycle = true;
    }
    if holder
        .get("reverse")
        .and_then(Value::as_bool)
        .unwrap_or(false)
    {
        params.reverse = true;
    }
    if let Some(count) = holder.get("count").and_then(Value::as_u64) {
        params.count = count;
    }

    let key = format!("{}__{}", params.group, params.path);
    if !cache.contains_key(&key) {
        let compiled =
            JsonPath::parse(&params.path).map_err(|err| GenerationError::JsonPath {
                path: params.path.clone(),
                reason: err.to_string(),
            })?;
        let mut matches: Vec<Value> = compiled.query(source).all().into_iter().cloned().collect();
        if params.count > 1 {
            matches.truncate(params.count as usize);
        }
        cache.insert(key.clone(), matches);
    }
    let pool = cache.entry(key).or_default();
    if params.cycle || params.reverse {
        return Ok(rotate(pool, params.reverse));
    }
    Ok(random::pick(rng, pool).cloned().unwrap_or(Value::Null))
}

fn rotate(pool: &mut Vec<Value>, reverse: bool) -> Value {
    if pool.is_empty() {
        return Value::Null;
    }
    if reverse {
        let value = pool.remove(pool.len() - 1);
        pool.insert(0, value.clone());
        value
    } else {
        let value = pool.remove(0);
        pool.push(value.clone());
        value
    }
}
