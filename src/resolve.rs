//! Resolving entrypoint: dereferences external `$ref`s through a
//! caller-supplied loader, then generates from the expanded document.

use std::collections::HashSet;
use std::future::Future;
use std::pin::Pin;

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::engine::{GenerationEngine, ReferenceTable};
use crate::errors::GenerationError;

/// External reference collaborator. For each reference URL it either
/// supplies a parsed document or returns `None` to delegate the lookup to
/// the caller's reference table.
#[async_trait]
pub trait ReferenceLoader: Send + Sync {
    async fn load(&self, url: &str) -> Result<Option<Value>, GenerationError>;
}

/// Dereferences every external `$ref` in `schema` and generates a value
/// from the result. Relative references are qualified against
/// `base_dir`; circular external references are left unexpanded rather
/// than failed.
pub async fn resolve(
    engine: &mut GenerationEngine,
    schema: &Value,
    refs: &ReferenceTable,
    base_dir: Option<&str>,
    loader: &dyn ReferenceLoader,
) -> Result<Value, GenerationError> {
    let mut expanded = schema.clone();
    let mut in_flight = HashSet::new();
    dereference(&mut expanded, refs, base_dir, loader, &mut in_flight).await?;
    engine.generate_with_refs(&expanded, refs)
}

fn qualify(url: &str, base_dir: Option<&str>) -> String {
    match base_dir {
        Some(base) if !url.contains("://") && !url.starts_with('/') => {
            format!("{}/{}", base.trim_end_matches('/'), url)
        }
        _ => url.to_string(),
    }
}

fn external_url(node: &Value) -> Option<String> {
    node.get("$ref")
        .and_then(Value::as_str)
        .filter(|target| !target.starts_with('#'))
        .map(str::to_owned)
}

fn dereference<'a>(
    node: &'a mut Value,
    refs: &'a ReferenceTable,
    base_dir: Option<&'a str>,
    loader: &'a dyn ReferenceLoader,
    in_flight: &'a mut HashSet<String>,
) -> Pin<Box<dyn Future<Output = Result<(), GenerationError>> + Send + 'a>> {
    Box::pin(async move {
        if let Some(url) = external_url(node) {
            let qualified = qualify(&url, base_dir);
            if in_flight.contains(&qualified) {
                debug!(url = %qualified, "circular external reference left unexpanded");
                return Ok(());
            }
            let document = match loader.load(&qualified).await? {
                Some(document) => Some(document),
                None => refs
                    .get(&qualified)
                    .or_else(|| refs.get(&url))
                    .or_else(|| url.rsplit('/').next().and_then(|tail| refs.get(tail)))
                    .cloned(),
            };
            let Some(mut document) = document else {
                return Err(GenerationError::MissingReference { reference: url });
            };
            in_flight.insert(qualified.clone());
            dereference(&mut document, refs, base_dir, loader, in_flight).await?;
            in_flight.remove(&qualified);
            if let (Value::Object(loaded), Value::Object(map)) = (&document, &mut *node) {
                // the node's own keys take precedence over the document
                map.remove("$ref");
                for (key, value) in loaded {
                    map.entry(key.clone()).or_insert(value.clone());
                }
            } else {
                *node = document;
            }
            return Ok(());
        }
        match node {
            Value::Array(items) => {
                for item in items {
                    dereference(item, refs, base_dir, loader, in_flight).await?;
                }
            }
            Value::Object(map) => {
                for value in map.values_mut() {
                    dereference(value, refs, base_dir, loader, in_flight).await?;
                }
            }
            _ => {}
        }
        Ok(())
    })
}
