use serde_json::json;

use jsonsmith::errors::GenerationError;
use jsonsmith::{GenerateOptions, GenerationEngine};

fn seeded(seed: u64) -> GenerationEngine {
    GenerationEngine::with_options(GenerateOptions {
        seed: Some(seed),
        ..GenerateOptions::default()
    })
}

#[test]
fn all_of_merges_every_branch() {
    let schema = json!({
        "allOf": [
            {"type": "object", "required": ["a"], "properties": {"a": {"type": "integer"}}},
            {"required": ["b"], "properties": {"b": {"type": "string", "minLength": 2}}}
        ]
    });
    let value = seeded(1).generate(&schema).unwrap();
    assert!(value["a"].is_i64());
    assert!(value["b"].as_str().unwrap().chars().count() >= 2);
}

#[test]
fn one_of_picks_exactly_one_branch() {
    let schema = json!({
        "type": "object",
        "properties": {
            "a": {"type": "integer"},
            "b": {"type": "integer"}
        },
        "oneOf": [
            {"required": ["a"]},
            {"required": ["b"]}
        ]
    });
    for seed in 0..30 {
        let value = seeded(seed).generate(&schema).unwrap();
        let has_a = value.get("a").is_some();
        let has_b = value.get("b").is_some();
        assert!(has_a ^ has_b, "expected exactly one of a/b in {value}");
    }
}

#[test]
fn any_of_output_satisfies_a_branch() {
    let schema = json!({
        "anyOf": [
            {"type": "integer", "minimum": 100, "maximum": 200},
            {"type": "string", "minLength": 3, "maxLength": 5}
        ]
    });
    for seed in 0..20 {
        let value = seeded(seed).generate(&schema).unwrap();
        let branch_int = value
            .as_i64()
            .map(|number| (100..=200).contains(&number))
            .unwrap_or(false);
        let branch_str = value
            .as_str()
            .map(|text| (3..=5).contains(&text.chars().count()))
            .unwrap_or(false);
        assert!(branch_int || branch_str, "no branch satisfied by {value}");
    }
}

#[test]
fn one_of_prefilters_enum_against_bounds() {
    let schema = json!({
        "type": "integer",
        "enum": [1, 50, 60, 2],
        "oneOf": [{"minimum": 40, "maximum": 70}]
    });
    for seed in 0..20 {
        let value = seeded(seed).generate(&schema).unwrap();
        let number = value.as_i64().unwrap();
        assert!(number == 50 || number == 60, "filtered enum leaked {number}");
    }
}

#[test]
fn internal_definitions_resolve() {
    let schema = json!({
        "type": "object",
        "required": ["name"],
        "properties": {"name": {"$ref": "#/definitions/shortName"}},
        "definitions": {
            "shortName": {"type": "string", "minLength": 2, "maxLength": 6}
        }
    });
    let value = seeded(7).generate(&schema).unwrap();
    let name = value["name"].as_str().unwrap();
    assert!((2..=6).contains(&name.chars().count()));
}

#[test]
fn ref_sibling_keys_take_precedence() {
    let schema = json!({
        "type": "object",
        "required": ["size"],
        "properties": {
            "size": {"$ref": "#/definitions/count", "maximum": 3}
        },
        "definitions": {
            "count": {"type": "integer", "minimum": 3, "maximum": 100}
        }
    });
    for seed in 0..10 {
        let value = seeded(seed).generate(&schema).unwrap();
        assert_eq!(value["size"], json!(3));
    }
}

#[test]
fn recursive_reference_terminates_with_placeholder() {
    let schema = json!({
        "$ref": "#/definitions/node",
        "definitions": {
            "node": {
                "type": "object",
                "required": ["label", "child"],
                "properties": {
                    "label": {"type": "string", "minLength": 1},
                    "child": {"$ref": "#/definitions/node"}
                }
            }
        }
    });
    let value = seeded(2).generate(&schema).unwrap();
    let mut depth = 0;
    let mut cursor = &value;
    while let Some(child) = cursor.get("child") {
        assert!(cursor["label"].is_string());
        cursor = child;
        depth += 1;
        assert!(depth < 32, "runaway recursion");
    }
    assert!(depth >= 1);
    assert_eq!(cursor, &json!({}));
}

#[test]
fn missing_reference_fails_or_is_ignored() {
    let schema = json!({"$ref": "#/definitions/ghost"});
    let result = seeded(3).generate(&schema);
    assert!(matches!(
        result,
        Err(GenerationError::MissingReference { .. })
    ));

    let mut permissive = GenerationEngine::with_options(GenerateOptions {
        seed: Some(3),
        ignore_missing_refs: true,
        ..GenerateOptions::default()
    });
    assert!(permissive.generate(&schema).is_ok());
}

#[test]
fn self_reference_is_a_no_op() {
    let schema = json!({"type": "integer", "minimum": 2, "maximum": 2, "$ref": "#"});
    assert_eq!(seeded(4).generate(&schema).unwrap(), json!(2));
}
