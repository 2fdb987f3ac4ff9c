//! Format registry and the built-in `format` generators.

use std::collections::HashMap;

use chrono::SecondsFormat;
use rand::Rng;
use serde_json::Value;
use tracing::warn;

use crate::errors::GenerationError;
use crate::options::GenerateOptions;
use crate::random;
use crate::schema;

/// Custom format generator: receives the schema node carrying the format.
pub type FormatFn = Box<dyn Fn(&Value, &mut dyn rand::RngCore) -> String + Send + Sync>;

/// Registered custom format generators; consulted before the built-ins so
/// callers can override any name.
#[derive(Default)]
pub struct FormatRegistry {
    callbacks: HashMap<String, FormatFn>,
}

impl FormatRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, name: impl Into<String>, callback: FormatFn) {
        self.callbacks.insert(name.into(), callback);
    }

    /// Removes one registration, or all of them when no name is given.
    pub fn unregister(&mut self, name: Option<&str>) {
        match name {
            Some(name) => {
                self.callbacks.remove(name);
            }
            None => self.callbacks.clear(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&FormatFn> {
        self.callbacks.get(name)
    }
}

const HOSTNAME: &str = r"[a-zA-Z]{1,33}\.[a-z]{2,4}";
const FRAGMENT: &str = r"[a-zA-Z][a-zA-Z0-9+\-.]*";
const QUERY: &str = r"(\?([a-z]{1,7}(=\w{1,5})?&){0,3})?";

/// Sampling pattern for a core format name; `{hostname}` placeholders are
/// expanded before compiling.
fn core_pattern(name: &str) -> Option<String> {
    let pattern = match name {
        "email" | "idn-email" => r"[a-zA-Z\d][a-zA-Z\d\-]{1,13}[a-zA-Z\d]@{hostname}".to_string(),
        "hostname" | "idn-hostname" => HOSTNAME.to_string(),
        "ipv6" => r"[a-f\d]{4}(:[a-f\d]{4}){7}".to_string(),
        "uri" => format!("https?://{{hostname}}(?:{FRAGMENT})+"),
        "uri-reference" | "iri" | "iri-reference" => {
            format!("https?://{{hostname}}(?:{FRAGMENT})+{QUERY}")
        }
        "uri-template" => format!(r"https?://{{hostname}}(?:/\{{[a-z][:a-zA-Z0-9\-]*\}}|{FRAGMENT})+"),
        "json-pointer" => r"(/([a-zA-Z][a-zA-Z0-9+\-./]*|~[01]))+".to_string(),
        "slug" => r"[a-zA-Z\d_\-]+".to_string(),
        _ => return None,
    };
    Some(pattern)
}

fn expand_placeholders(pattern: &str) -> String {
    let mut expanded = pattern.to_string();
    while let Some(start) = expanded.find("{hostname}") {
        expanded.replace_range(start..start + "{hostname}".len(), &format!("(?:{HOSTNAME})"));
    }
    expanded
}

/// Produces a string for the node's `format`. Registered callbacks win,
/// then the built-in table; an unknown name either fails or degrades to
/// the caller's fallback, per `fail_on_invalid_format`.
pub fn generate_format<F>(
    registry: &FormatRegistry,
    node: &Value,
    options: &GenerateOptions,
    rng: &mut dyn rand::RngCore,
    path: &[String],
    fallback: F,
) -> Result<String, GenerationError>
where
    F: FnOnce(&mut dyn rand::RngCore) -> String,
{
    let Some(name) = node.get("format").and_then(Value::as_str) else {
        return Ok(fallback(rng));
    };
    if let Some(callback) = registry.get(name) {
        return Ok(callback(node, rng));
    }
    match name {
        "date-time" | "datetime" => Ok(date_time(rng, options)),
        "date" => Ok(date_time(rng, options)[..10].to_string()),
        "time" => Ok(date_time(rng, options)[11..].to_string()),
        "ipv4" => Ok(ipv4(rng)),
        "uuid" => Ok(uuid_string(rng)),
        // a regex that matches something, not a sampled string
        "regex" => Ok(".+?".to_string()),
        other => match core_pattern(other) {
            Some(pattern) => {
                let expanded = expand_placeholders(&pattern);
                random::randexp(rng, &expanded, options.default_rand_exp_max).map_err(|err| {
                    GenerationError::UnsupportedFormat {
                        format: other.to_string(),
                        reason: err.to_string(),
                    }
                })
            }
            None if options.fail_on_invalid_format => Err(GenerationError::UnknownFormat {
                format: other.to_string(),
                path: schema::render_path(path),
            }),
            None => {
                warn!(format = other, "no generator for format, using plain words");
                Ok(fallback(rng))
            }
        },
    }
}

fn date_time(rng: &mut dyn rand::RngCore, options: &GenerateOptions) -> String {
    random::datetime(rng, options.base_time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn ipv4(rng: &mut dyn rand::RngCore) -> String {
    let octet = |rng: &mut dyn rand::RngCore| rng.random_range(0..=255u8);
    format!(
        "{}.{}.{}.{}",
        octet(rng),
        octet(rng),
        octet(rng),
        octet(rng)
    )
}

fn uuid_string(rng: &mut dyn rand::RngCore) -> String {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    // v4 version and variant bits
    bytes[6] = (bytes[6] & 0x0f) | 0x40;
    bytes[8] = (bytes[8] & 0x3f) | 0x80;
    uuid::Uuid::from_bytes(bytes).to_string()
}
