//! Reference and composition reduction: normalizes one schema node into a
//! tagged form the traversal engine can dispatch on.

use serde_json::Value;
use tracing::{debug, warn};

use crate::engine::GenContext;
use crate::errors::GenerationError;
use crate::schema;

/// Nesting cap for one reduction pass.
const MAX_REDUCE_DEPTH: u32 = 64;
/// In-flight expansions allowed per `$ref` target along one descent;
/// past it the target is considered circular.
const MAX_REF_EXPANSIONS: u32 = 5;

/// Outcome of reducing one node.
pub enum Reduced {
    /// Self-contained node ready for type dispatch.
    Node(Value),
    /// Node whose generation is delegated to a registered keyword.
    Wrapped { keyword: String, node: Value },
    /// Deferred `oneOf`/`anyOf` choice.
    Deferred(CompositionThunk),
    /// Cycle cut; traversal emits an empty placeholder.
    Circular,
}

/// Pending composition choice: one alternative gets merged over the base
/// node when the thunk is invoked. Invoked exactly once.
pub struct CompositionThunk {
    base: Value,
    alternatives: Vec<Value>,
    exclusive: bool,
}

impl CompositionThunk {
    /// Picks one alternative and merges it over the base. Under exclusive
    /// choice, properties required by the other alternatives are dropped
    /// so the result cannot satisfy two branches at once.
    pub fn invoke(self, rng: &mut dyn rand::RngCore) -> Value {
        use rand::Rng;
        let mut copy = schema::omit_props(&self.base, &["anyOf", "oneOf"]);
        if self.alternatives.is_empty() {
            return copy;
        }
        let index = rng.random_range(0..self.alternatives.len());
        schema::merge(&mut copy, &self.alternatives[index]);
        if self.exclusive {
            for (position, alternative) in self.alternatives.iter().enumerate() {
                if position == index {
                    continue;
                }
                let Some(Value::Array(required)) = alternative.get("required") else {
                    continue;
                };
                if let Some(Value::Object(props)) = copy.get_mut("properties") {
                    for name in required.iter().filter_map(Value::as_str) {
                        props.remove(name);
                    }
                }
            }
        }
        copy
    }
}

/// A reduction result plus the `$ref` targets whose in-flight counters it
/// incremented; traversal decrements them once the node's value exists.
pub struct Reduction {
    pub reduced: Reduced,
    pub expanded_refs: Vec<String>,
}

impl Reduction {
    fn plain(reduced: Reduced) -> Self {
        Self {
            reduced,
            expanded_refs: Vec::new(),
        }
    }
}

/// Reduces one node: strips identifiers, expands `$ref`, flattens `allOf`,
/// defers `oneOf`/`anyOf`, pre-reduces nested sub-schemas, and finally
/// checks for a keyword wrap.
pub fn reduce(
    ctx: &mut GenContext<'_>,
    node: Value,
    depth: u32,
    parent_path: &[String],
) -> Result<Reduction, GenerationError> {
    let mut node = node;
    let mut expanded_refs = Vec::new();

    if !node.is_object() || depth > MAX_REDUCE_DEPTH {
        return Ok(Reduction::plain(Reduced::Node(node)));
    }

    strip_identifiers(&mut node);

    if let Some(reference) = node.get("$ref").and_then(Value::as_str).map(str::to_owned) {
        return expand_reference(ctx, node, reference, depth, parent_path);
    }

    if node.get("allOf").map(Value::is_array).unwrap_or(false) {
        flatten_all_of(ctx, &mut node, &mut expanded_refs, depth, parent_path)?;
    }

    let exclusive = node.get("oneOf").map(Value::is_array).unwrap_or(false);
    let inclusive = node.get("anyOf").map(Value::is_array).unwrap_or(false);
    if exclusive || inclusive {
        let key = if exclusive { "oneOf" } else { "anyOf" };
        let alternatives = match node.get(key) {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        if exclusive {
            if let Some(Value::Array(choices)) = node.get_mut("enum") {
                choices.retain(|choice| schema::satisfies_any_bounds(choice, &alternatives));
            }
        }
        debug!(
            alternatives = alternatives.len(),
            exclusive, "deferring composition choice"
        );
        return Ok(Reduction {
            reduced: Reduced::Deferred(CompositionThunk {
                base: node,
                alternatives,
                exclusive,
            }),
            expanded_refs,
        });
    }

    reduce_children(ctx, &mut node, &mut expanded_refs, depth, parent_path)?;

    // container maps under these segments hold property names, not
    // keywords; never wrap them
    let under_container = parent_path
        .last()
        .map(|segment| segment == "properties" || segment == "items")
        .unwrap_or(false);
    // const, enum and option-selected examples/default pin the value;
    // a matched keyword never overrides them
    let pinned = node.get("const").is_some()
        || node.get("enum").map(Value::is_array).unwrap_or(false)
        || (ctx.options.use_examples_value
            && node
                .get("examples")
                .and_then(Value::as_array)
                .map(|examples| !examples.is_empty())
                .unwrap_or(false))
        || (ctx.options.use_default_value && node.get("default").is_some());
    if !under_container && !pinned {
        if let Some(keyword) = ctx.keywords.match_keyword(&node) {
            return Ok(Reduction {
                reduced: Reduced::Wrapped { keyword, node },
                expanded_refs,
            });
        }
    }

    Ok(Reduction {
        reduced: Reduced::Node(node),
        expanded_refs,
    })
}

/// Identifier metadata is dropped once a node carries a string id, same as
/// the surrounding document headers.
fn strip_identifiers(node: &mut Value) {
    let has_id = node
        .get("$id")
        .or_else(|| node.get("id"))
        .map(Value::is_string)
        .unwrap_or(false);
    if has_id {
        if let Some(map) = node.as_object_mut() {
            map.remove("id");
            map.remove("$id");
            map.remove("$schema");
        }
    }
}

fn expand_reference(
    ctx: &mut GenContext<'_>,
    mut node: Value,
    reference: String,
    depth: u32,
    parent_path: &[String],
) -> Result<Reduction, GenerationError> {
    if reference == "#" {
        if let Some(map) = node.as_object_mut() {
            map.remove("$ref");
        }
        return Ok(Reduction::plain(Reduced::Node(node)));
    }

    let in_flight = ctx.ref_depth.get(&reference).copied().unwrap_or(0);
    if in_flight >= MAX_REF_EXPANSIONS {
        debug!(reference = %reference, "expansion cap reached, cutting cycle");
        return Ok(Reduction::plain(Reduced::Circular));
    }

    let target = if let Some(name) = reference.strip_prefix("#/definitions/") {
        ctx.root
            .get("definitions")
            .and_then(|definitions| definitions.get(name))
            .cloned()
    } else {
        ctx.refs.get(&reference).cloned()
    };

    let Some(target) = target else {
        if ctx.options.ignore_missing_refs {
            warn!(reference = %reference, "ignoring missing reference");
            if let Some(map) = node.as_object_mut() {
                map.remove("$ref");
            }
            return Ok(Reduction::plain(Reduced::Node(node)));
        }
        return Err(GenerationError::MissingReference { reference });
    };

    if let Some(map) = node.as_object_mut() {
        map.remove("$ref");
    }
    // the node's own keys take precedence over the referenced target
    let mut merged = target;
    schema::merge(&mut merged, &node);

    *ctx.ref_depth.entry(reference.clone()).or_insert(0) += 1;
    let inner = reduce(ctx, merged, depth + 1, parent_path)?;
    let mut expanded_refs = vec![reference];
    expanded_refs.extend(inner.expanded_refs);
    Ok(Reduction {
        reduced: inner.reduced,
        expanded_refs,
    })
}

/// Flattens every `allOf` branch into the node, invoking deferred choices
/// immediately since the merged constraints must all hold.
fn flatten_all_of(
    ctx: &mut GenContext<'_>,
    node: &mut Value,
    expanded_refs: &mut Vec<String>,
    depth: u32,
    parent_path: &[String],
) -> Result<(), GenerationError> {
    let branches = match node.as_object_mut().and_then(|map| map.remove("allOf")) {
        Some(Value::Array(branches)) => branches,
        _ => return Ok(()),
    };
    for branch in branches {
        let inner = reduce(ctx, branch, depth + 1, parent_path)?;
        expanded_refs.extend(inner.expanded_refs);
        let resolved = match inner.reduced {
            Reduced::Node(value) | Reduced::Wrapped { node: value, .. } => value,
            Reduced::Deferred(thunk) => thunk.invoke(&mut *ctx.rng),
            Reduced::Circular => continue,
        };
        schema::merge(node, &resolved);
    }
    Ok(())
}

/// Pre-reduces nested sub-schema values. Only fully plain results are
/// embedded back; deferred or wrapped children stay untouched and get
/// re-reduced when traversal visits them.
fn reduce_children(
    ctx: &mut GenContext<'_>,
    node: &mut Value,
    expanded_refs: &mut Vec<String>,
    depth: u32,
    parent_path: &[String],
) -> Result<(), GenerationError> {
    let keys: Vec<String> = match node.as_object() {
        Some(map) => map.keys().cloned().collect(),
        None => return Ok(()),
    };
    for key in keys {
        if schema::is_reserved_key(&key) {
            continue;
        }
        let mut child_path = parent_path.to_vec();
        child_path.push(key.clone());
        let original = node.get(&key).cloned().unwrap_or(Value::Null);
        match original {
            Value::Object(_) => {
                let inner = reduce(ctx, original, depth + 1, &child_path)?;
                expanded_refs.extend(inner.expanded_refs);
                if let Reduced::Node(reduced) = inner.reduced {
                    if let Some(map) = node.as_object_mut() {
                        map.insert(key, reduced);
                    }
                }
            }
            Value::Array(items) => {
                let mut replaced = Vec::with_capacity(items.len());
                for item in items {
                    if !item.is_object() {
                        replaced.push(item);
                        continue;
                    }
                    let inner = reduce(ctx, item.clone(), depth + 1, &child_path)?;
                    expanded_refs.extend(inner.expanded_refs);
                    match inner.reduced {
                        Reduced::Node(reduced) => replaced.push(reduced),
                        _ => replaced.push(item),
                    }
                }
                if let Some(map) = node.as_object_mut() {
                    map.insert(key, Value::Array(replaced));
                }
            }
            _ => {}
        }
    }
    Ok(())
}
