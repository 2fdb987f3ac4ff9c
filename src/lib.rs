//! Random JSON-Schema-conforming data synthesis.
//!
//! Given a schema document, possibly holding internal references,
//! composition keywords and value constraints, the engine produces a
//! concrete `serde_json::Value` tree satisfying every applicable
//! constraint. Built for test-data generators, API mocking tools and
//! fixture builders.
//!
//! ```no_run
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "required": ["id", "name"],
//!     "properties": {
//!         "id": {"type": "integer", "minimum": 1},
//!         "name": {"type": "string", "minLength": 3}
//!     }
//! });
//! let mut engine = jsonsmith::GenerationEngine::new();
//! let value = engine.generate(&schema).unwrap();
//! assert!(value["id"].as_i64().unwrap() >= 1);
//! ```

pub mod engine;
pub mod errors;
pub mod formats;
pub mod generators;
pub mod infer;
pub mod keywords;
pub mod options;
pub mod postresolve;
pub mod random;
pub mod reducer;
pub mod resolve;
pub mod schema;
pub mod traverse;
pub mod typecast;

pub use engine::{GenerationEngine, ReferenceTable, generate, reference_table_from_documents};
pub use errors::GenerationError;
pub use formats::{FormatFn, FormatRegistry};
pub use keywords::{Dependency, DependencyFn, KeywordFn, KeywordRegistry, KeywordState};
pub use options::GenerateOptions;
pub use resolve::{ReferenceLoader, resolve};
