//! Generation engine: options, registries and the synchronous entrypoints.

use std::collections::HashMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::debug;

use crate::errors::GenerationError;
use crate::formats::FormatRegistry;
use crate::keywords::{Dependency, KeywordFn, KeywordRegistry};
use crate::options::GenerateOptions;
use crate::postresolve;
use crate::traverse;

/// Schema documents keyed by identifier, supplied by callers for `$ref`
/// targets outside the root document.
pub type ReferenceTable = HashMap<String, Value>;

/// Builds a reference table from documents keyed by their `$id` (or `id`).
pub fn reference_table_from_documents(documents: &[Value]) -> ReferenceTable {
    let mut table = ReferenceTable::new();
    for document in documents {
        let id = document
            .get("$id")
            .or_else(|| document.get("id"))
            .and_then(Value::as_str);
        if let Some(id) = id {
            table.insert(id.to_string(), document.clone());
        }
    }
    table
}

/// Per-call state threaded through reduction and traversal.
pub struct GenContext<'a> {
    pub options: &'a GenerateOptions,
    pub formats: &'a FormatRegistry,
    pub keywords: &'a mut KeywordRegistry,
    pub refs: &'a ReferenceTable,
    /// Clone of the caller's document; `#/definitions/` lookups and
    /// `#{token}` templating read from it.
    pub root: Value,
    pub rng: &'a mut dyn rand::RngCore,
    /// In-flight expansion counts per `$ref` target, for cycle cutting.
    pub ref_depth: HashMap<String, u32>,
}

pub struct GenerationEngine {
    options: GenerateOptions,
    formats: FormatRegistry,
    keywords: KeywordRegistry,
}

impl GenerationEngine {
    pub fn new() -> Self {
        Self::with_options(GenerateOptions::default())
    }

    pub fn with_options(options: GenerateOptions) -> Self {
        let keywords = KeywordRegistry::with_builtins(&options);
        Self {
            options,
            formats: FormatRegistry::new(),
            keywords,
        }
    }

    pub fn options(&self) -> &GenerateOptions {
        &self.options
    }

    pub fn formats_mut(&mut self) -> &mut FormatRegistry {
        &mut self.formats
    }

    /// Registers a custom keyword generator.
    pub fn define(&mut self, name: impl Into<String>, generator: KeywordFn) {
        self.keywords.define(name, generator);
    }

    /// Installs or decorates a named dependency for proxy indirection.
    pub fn extend<F>(&mut self, name: impl Into<String>, decorator: F)
    where
        F: FnOnce(Option<Dependency>) -> Dependency,
    {
        self.keywords.extend(name, decorator);
    }

    /// Clears stateful keyword contexts, one by name or all of them.
    pub fn reset(&mut self, name: Option<&str>) {
        self.keywords.reset(name);
    }

    pub fn generate(&mut self, schema: &Value) -> Result<Value, GenerationError> {
        self.generate_with_refs(schema, &ReferenceTable::new())
    }

    pub fn generate_with_refs(
        &mut self,
        schema: &Value,
        refs: &ReferenceTable,
    ) -> Result<Value, GenerationError> {
        let seed = self.options.seed.unwrap_or_else(rand::random);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        self.generate_with_rng(schema, refs, &mut rng)
    }

    /// Entrypoint with a caller-supplied random source; a deterministic
    /// rng makes the whole run reproducible.
    pub fn generate_with_rng(
        &mut self,
        schema: &Value,
        refs: &ReferenceTable,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Value, GenerationError> {
        let root = schema.clone();
        debug!("generation started");
        let result = {
            let mut ctx = GenContext {
                options: &self.options,
                formats: &self.formats,
                keywords: &mut self.keywords,
                refs,
                root: root.clone(),
                rng: &mut *rng,
                ref_depth: HashMap::new(),
            };
            traverse::traverse(&mut ctx, root, &[], 0)?
        };
        let result = if self.options.resolve_json_path {
            postresolve::resolve_json_paths(&result, rng)?
        } else {
            result
        };
        debug!("generation completed");
        Ok(result)
    }
}

impl Default for GenerationEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// One-shot generation with default options.
pub fn generate(schema: &Value, refs: &ReferenceTable) -> Result<Value, GenerationError> {
    GenerationEngine::new().generate_with_refs(schema, refs)
}
