//! Keyword extension registry: custom keyword generators, the wrap
//! protocol, and proxy-style indirection into named dependency trees.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};

use crate::errors::GenerationError;
use crate::options::GenerateOptions;
use crate::random;
use crate::schema;

/// Mutable context threaded into a keyword generator on every invocation.
/// One state object per registered keyword, engine-scoped; it persists
/// across calls until the registry is reset.
pub type KeywordState = Map<String, Value>;

/// Keyword generator: `(state, value, node, keyword, root, rng)` where
/// `value` is the keyword's own value inside `node` and `root` is the
/// whole schema document.
pub type KeywordFn = Box<
    dyn Fn(
            &mut KeywordState,
            &Value,
            &Value,
            &str,
            &Value,
            &mut dyn rand::RngCore,
        ) -> Result<Value, GenerationError>
        + Send
        + Sync,
>;

pub type DependencyFn =
    Box<dyn Fn(&[Value], &mut dyn rand::RngCore) -> Result<Value, GenerationError> + Send + Sync>;

/// A named external dependency navigable by dotted path: either a leaf
/// callable or a map of further segments.
pub enum Dependency {
    Func(DependencyFn),
    Map(HashMap<String, Dependency>),
}

pub struct KeywordRegistry {
    generators: HashMap<String, KeywordFn>,
    states: HashMap<String, KeywordState>,
    dependencies: HashMap<String, Dependency>,
}

impl KeywordRegistry {
    /// Registry with the built-in `pattern`, `autoIncrement` and
    /// `sequentialDate` keywords. Option values the built-ins need are
    /// captured at construction.
    pub fn with_builtins(options: &GenerateOptions) -> Self {
        let mut registry = Self {
            generators: HashMap::new(),
            states: HashMap::new(),
            dependencies: HashMap::new(),
        };
        let max_repeat = options.default_rand_exp_max;
        registry.define(
            "pattern",
            Box::new(move |_state, value, _node, keyword, _root, rng| {
                let pattern =
                    value
                        .as_str()
                        .ok_or_else(|| GenerationError::InvalidKeywordValue {
                            keyword: keyword.to_string(),
                            reason: "pattern must be a string".to_string(),
                        })?;
                Ok(Value::String(random::randexp(rng, pattern, max_repeat)?))
            }),
        );
        registry.define("autoIncrement", Box::new(auto_increment));
        let base_time = options.base_time;
        registry.define(
            "sequentialDate",
            Box::new(move |state, value, node, _keyword, _root, rng| {
                sequential_date(state, value, node, base_time, rng)
            }),
        );
        registry
    }

    /// Registers (or replaces) a keyword generator.
    pub fn define(&mut self, name: impl Into<String>, generator: KeywordFn) {
        self.generators.insert(name.into(), generator);
    }

    /// Installs or decorates a named dependency; the keyword of the same
    /// name becomes available through proxy indirection.
    pub fn extend<F>(&mut self, name: impl Into<String>, decorator: F)
    where
        F: FnOnce(Option<Dependency>) -> Dependency,
    {
        let name = name.into();
        let previous = self.dependencies.remove(&name);
        self.dependencies.insert(name, decorator(previous));
    }

    /// Clears mutable keyword state: one keyword by name, or all of them.
    pub fn reset(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.states.remove(name);
            }
            None => self.states.clear(),
        }
    }

    /// Scans a node's own keys, last declared first, for a registered
    /// keyword. An `x-` prefix is stripped before matching, so vendor
    /// spellings alias their plain counterparts.
    pub fn match_keyword(&self, node: &Value) -> Option<String> {
        let map = node.as_object()?;
        for key in map.keys().rev() {
            let name = key.strip_prefix("x-").unwrap_or(key);
            if self.generators.contains_key(name) || self.dependencies.contains_key(name) {
                return Some(key.clone());
            }
        }
        None
    }

    /// Invokes the generator (or proxy dependency) behind the matched key.
    pub fn generate(
        &mut self,
        key: &str,
        node: &Value,
        root: &Value,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Value, GenerationError> {
        let name = key.strip_prefix("x-").unwrap_or(key).to_string();
        let value = node.get(key).cloned().unwrap_or(Value::Null);
        if let Some(generator) = self.generators.get(&name) {
            let state = self.states.entry(name.clone()).or_default();
            return generator(state, &value, node, key, root, rng);
        }
        self.invoke_proxy(&name, &value, root, rng)
    }

    /// Navigates the keyword's value as a dotted path into the named
    /// dependency tree and calls the leaf with templated arguments.
    fn invoke_proxy(
        &self,
        name: &str,
        value: &Value,
        root: &Value,
        rng: &mut dyn rand::RngCore,
    ) -> Result<Value, GenerationError> {
        let unresolved = |target: String| GenerationError::UnresolvedProxyValue {
            property: name.to_string(),
            target,
        };
        let dependency = self
            .dependencies
            .get(name)
            .ok_or_else(|| unresolved(schema::short(value)))?;

        let (target, args) = match value {
            Value::String(path) => (path.clone(), Vec::new()),
            Value::Object(map) => {
                let Some((path, raw)) = map.iter().next() else {
                    return Err(unresolved(schema::short(value)));
                };
                let args = match raw {
                    Value::Array(items) => items.clone(),
                    other => vec![other.clone()],
                };
                (path.clone(), args)
            }
            other => return Err(unresolved(schema::short(other))),
        };

        let mut current = dependency;
        for segment in target.split('.') {
            match current {
                Dependency::Map(entries) => {
                    current = entries
                        .get(segment)
                        .ok_or_else(|| unresolved(target.clone()))?;
                }
                Dependency::Func(_) => break,
            }
        }
        match current {
            Dependency::Func(callable) => {
                let args: Vec<Value> = args.iter().map(|arg| schema::template(arg, root)).collect();
                callable(&args, rng)
            }
            Dependency::Map(_) => Err(unresolved(target)),
        }
    }
}

/// Counter keyword: first use seeds an offset from `initialOffset` (on the
/// keyword value or the node) or from a random draw above `minimum`; each
/// `true` occurrence afterwards emits and advances it.
fn auto_increment(
    state: &mut KeywordState,
    value: &Value,
    node: &Value,
    _keyword: &str,
    _root: &Value,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    if !state.contains_key("offset") {
        let min = node.get("minimum").and_then(Value::as_i64).unwrap_or(1);
        let initial = value
            .get("initialOffset")
            .and_then(Value::as_i64)
            .or_else(|| node.get("initialOffset").and_then(Value::as_i64));
        let offset = initial.unwrap_or_else(|| {
            random::number(
                rng,
                Some(min as f64),
                Some((min as f64) + random::MAX_NUMBER),
                min as f64,
                (min as f64) + random::MAX_NUMBER,
                false,
            ) as i64
        });
        state.insert("offset".to_string(), json!(offset));
    }
    if value == &Value::Bool(true) {
        let current = state.get("offset").and_then(Value::as_i64).unwrap_or(1);
        state.insert("offset".to_string(), json!(current + 1));
        return Ok(json!(current));
    }
    Ok(node.clone())
}

/// Stateful date keyword: seeds a random instant, then emits it and steps
/// forward by one randomized unit on every use. `true` means days.
fn sequential_date(
    state: &mut KeywordState,
    value: &Value,
    node: &Value,
    base_time: DateTime<Utc>,
    rng: &mut dyn rand::RngCore,
) -> Result<Value, GenerationError> {
    let unit = match value {
        Value::Bool(true) => "days".to_string(),
        Value::String(unit) => unit.clone(),
        _ => return Ok(node.clone()),
    };
    if !state.contains_key("now") {
        let start = random::datetime(rng, base_time).timestamp_millis();
        state.insert("now".to_string(), json!(start));
    }
    let step = random::date_step(rng, &unit)
        .ok_or(GenerationError::UnsupportedIncrement { unit: unit.clone() })?;
    let now = state.get("now").and_then(Value::as_i64).unwrap_or(0);
    let stamp = DateTime::<Utc>::from_timestamp_millis(now)
        .unwrap_or_default()
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    state.insert("now".to_string(), json!(now + step));
    Ok(Value::String(stamp))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    fn registry() -> KeywordRegistry {
        KeywordRegistry::with_builtins(&GenerateOptions::default())
    }

    #[test]
    fn reverse_scan_prefers_last_declared_key() {
        let mut registry = registry();
        registry.define("first", Box::new(|_, _, _, _, _, _| Ok(json!(1))));
        registry.define("second", Box::new(|_, _, _, _, _, _| Ok(json!(2))));
        let node = json!({"first": true, "second": true});
        assert_eq!(registry.match_keyword(&node), Some("second".to_string()));
    }

    #[test]
    fn x_prefix_aliases_plain_keyword() {
        let mut registry = registry();
        registry.define("tag", Box::new(|_, value, _, _, _, _| Ok(value.clone())));
        let node = json!({"x-tag": "hello"});
        let key = registry.match_keyword(&node).unwrap();
        assert_eq!(key, "x-tag");
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let value = registry.generate(&key, &node, &json!({}), &mut rng).unwrap();
        assert_eq!(value, json!("hello"));
    }

    #[test]
    fn auto_increment_counts_from_initial_offset() {
        let mut registry = registry();
        let node = json!({"autoIncrement": true, "initialOffset": 5});
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for expected in 5..8 {
            let value = registry
                .generate("autoIncrement", &node, &json!({}), &mut rng)
                .unwrap();
            assert_eq!(value, json!(expected));
        }
        registry.reset(Some("autoIncrement"));
        let value = registry
            .generate("autoIncrement", &node, &json!({}), &mut rng)
            .unwrap();
        assert_eq!(value, json!(5));
    }

    #[test]
    fn sequential_date_advances_monotonically() {
        let mut registry = registry();
        let node = json!({"sequentialDate": "days"});
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let first = registry
            .generate("sequentialDate", &node, &json!({}), &mut rng)
            .unwrap();
        let second = registry
            .generate("sequentialDate", &node, &json!({}), &mut rng)
            .unwrap();
        let first = DateTime::parse_from_rfc3339(first.as_str().unwrap()).unwrap();
        let second = DateTime::parse_from_rfc3339(second.as_str().unwrap()).unwrap();
        assert!(second > first);
    }

    #[test]
    fn sequential_date_rejects_unknown_unit() {
        let mut registry = registry();
        let node = json!({"sequentialDate": "eons"});
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = registry.generate("sequentialDate", &node, &json!({}), &mut rng);
        assert!(matches!(
            result,
            Err(GenerationError::UnsupportedIncrement { .. })
        ));
    }

    #[test]
    fn proxy_navigates_dotted_path_and_templates_args() {
        let mut registry = registry();
        registry.extend("helpers", |_| {
            let mut strings = HashMap::new();
            strings.insert(
                "join".to_string(),
                Dependency::Func(Box::new(|args, _| {
                    let joined: Vec<String> = args
                        .iter()
                        .map(|arg| arg.as_str().unwrap_or_default().to_string())
                        .collect();
                    Ok(json!(joined.join("-")))
                })),
            );
            let mut top = HashMap::new();
            top.insert("strings".to_string(), Dependency::Map(strings));
            Dependency::Map(top)
        });
        let root = json!({"env": "prod"});
        let node = json!({"helpers": {"strings.join": ["#{env}", "api"]}});
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let value = registry.generate("helpers", &node, &root, &mut rng).unwrap();
        assert_eq!(value, json!("prod-api"));
    }

    #[test]
    fn proxy_landing_on_map_is_unresolved() {
        let mut registry = registry();
        registry.extend("helpers", |_| Dependency::Map(HashMap::new()));
        let node = json!({"helpers": "strings"});
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let result = registry.generate("helpers", &node, &json!({}), &mut rng);
        assert!(matches!(
            result,
            Err(GenerationError::UnresolvedProxyValue { .. })
        ));
    }
}
