use async_trait::async_trait;
use serde_json::{Value, json};

use jsonsmith::errors::GenerationError;
use jsonsmith::resolve::{ReferenceLoader, resolve};
use jsonsmith::{GenerateOptions, GenerationEngine, ReferenceTable, reference_table_from_documents};

struct MapLoader(std::collections::HashMap<String, Value>);

#[async_trait]
impl ReferenceLoader for MapLoader {
    async fn load(&self, url: &str) -> Result<Option<Value>, GenerationError> {
        Ok(self.0.get(url).cloned())
    }
}

struct NullLoader;

#[async_trait]
impl ReferenceLoader for NullLoader {
    async fn load(&self, _url: &str) -> Result<Option<Value>, GenerationError> {
        Ok(None)
    }
}

fn engine(seed: u64) -> GenerationEngine {
    GenerationEngine::with_options(GenerateOptions {
        seed: Some(seed),
        ..GenerateOptions::default()
    })
}

#[tokio::test]
async fn external_reference_is_loaded_and_generated() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "https://example.com/user.json".to_string(),
        json!({
            "type": "object",
            "required": ["name"],
            "properties": {"name": {"type": "string", "minLength": 1}}
        }),
    );
    let loader = MapLoader(documents);
    let schema = json!({"$ref": "https://example.com/user.json"});
    let refs = ReferenceTable::new();
    let mut engine = engine(1);
    let value = resolve(&mut engine, &schema, &refs, None, &loader)
        .await
        .unwrap();
    assert!(value["name"].is_string());
}

#[tokio::test]
async fn relative_references_are_qualified_against_base_dir() {
    let mut documents = std::collections::HashMap::new();
    documents.insert(
        "https://example.com/schemas/pet.json".to_string(),
        json!({"type": "string", "enum": ["cat", "dog"]}),
    );
    let loader = MapLoader(documents);
    let schema = json!({"$ref": "pet.json"});
    let refs = ReferenceTable::new();
    let mut engine = engine(2);
    let value = resolve(
        &mut engine,
        &schema,
        &refs,
        Some("https://example.com/schemas"),
        &loader,
    )
    .await
    .unwrap();
    assert!(value == json!("cat") || value == json!("dog"));
}

#[tokio::test]
async fn loader_delegates_to_the_reference_table() {
    let document = json!({
        "$id": "https://example.com/size.json",
        "type": "integer",
        "minimum": 7,
        "maximum": 7
    });
    let refs = reference_table_from_documents(&[document]);
    let schema = json!({"$ref": "https://example.com/size.json"});
    let mut engine = engine(3);
    let value = resolve(&mut engine, &schema, &refs, None, &NullLoader)
        .await
        .unwrap();
    assert_eq!(value, json!(7));
}

#[tokio::test]
async fn unresolvable_external_reference_fails() {
    let schema = json!({"$ref": "https://example.com/ghost.json"});
    let refs = ReferenceTable::new();
    let mut engine = engine(4);
    let result = resolve(&mut engine, &schema, &refs, None, &NullLoader).await;
    assert!(matches!(
        result,
        Err(GenerationError::MissingReference { .. })
    ));
}

#[tokio::test]
async fn circular_external_reference_terminates() {
    let url = "https://example.com/tree.json";
    let document = json!({
        "$id": url,
        "type": "object",
        "required": ["label"],
        "properties": {
            "label": {"type": "string", "minLength": 1},
            "next": {"$ref": url}
        }
    });
    let mut documents = std::collections::HashMap::new();
    documents.insert(url.to_string(), document.clone());
    let loader = MapLoader(documents);
    let refs = reference_table_from_documents(&[document]);
    let schema = json!({"$ref": url});
    let mut engine = engine(5);
    let value = resolve(&mut engine, &schema, &refs, None, &loader)
        .await
        .unwrap();
    assert!(value["label"].is_string());
}
