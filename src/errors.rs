use thiserror::Error;

/// Errors emitted by the generation engine.
///
/// Structural errors carry the schema path at the point of failure,
/// rendered as `/a/b/c` inside the message.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unknown primitive type '{type_name}' in /{path}")]
    UnknownType { type_name: String, path: String },
    #[error("unknown format '{format}' in /{path}")]
    UnknownFormat { format: String, path: String },
    #[error("unsupported format '{format}': {reason}")]
    UnsupportedFormat { format: String, reason: String },
    #[error("reference not found: {reference}")]
    MissingReference { reference: String },
    #[error("missing items for {schema} in /{path}")]
    MalformedArraySchema { schema: String, path: String },
    #[error("cannot resolve value for '{property}: {target}'")]
    UnresolvedProxyValue { property: String, target: String },
    #[error("invalid pattern '{pattern}': {reason}")]
    InvalidPattern { pattern: String, reason: String },
    #[error("unsupported increment unit '{unit}'")]
    UnsupportedIncrement { unit: String },
    #[error("invalid value for keyword '{keyword}': {reason}")]
    InvalidKeywordValue { keyword: String, reason: String },
    #[error("json path query '{path}' failed: {reason}")]
    JsonPath { path: String, reason: String },
    #[error("loading reference '{url}' failed: {reason}")]
    Loader { url: String, reason: String },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
