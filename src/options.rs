use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Flat configuration surface consumed by the reducer, the traversal
/// engine and the type generators. Deserializable from camel-cased
/// JSON config, with absent fields falling back to their defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GenerateOptions {
    /// Placeholder emitted for unknown declared types when
    /// `fail_on_invalid_types` is off.
    pub default_invalid_type_product: Value,
    /// Repetition cap applied to unbounded regex quantifiers.
    pub default_rand_exp_max: u32,
    /// Treat unresolved internal references as no-ops instead of failing.
    pub ignore_missing_refs: bool,
    pub fail_on_invalid_types: bool,
    pub fail_on_invalid_format: bool,
    /// Include every optional member, as if all were required.
    pub always_fake_optionals: bool,
    /// Probability of including optional members; `None` disables the
    /// policy.
    pub optionals_probability: Option<f64>,
    /// Derive lengths deterministically from `optionals_probability`
    /// instead of drawing them.
    pub fixed_probabilities: bool,
    pub use_examples_value: bool,
    pub use_default_value: bool,
    /// Omit every property not listed in `required`.
    pub required_only: bool,
    /// Global clamps for array lengths.
    pub min_items: u64,
    pub max_items: Option<u64>,
    /// Global clamps for string lengths.
    pub min_length: u64,
    pub max_length: Option<u64>,
    /// Run the JSONPath post-resolver over the produced tree.
    pub resolve_json_path: bool,
    /// Seed for the per-call rng; a fresh random seed is drawn when unset.
    pub seed: Option<u64>,
    /// Reference instant for date and time generation. Fixed by default so
    /// seeded runs stay reproducible across wall-clock time.
    pub base_time: DateTime<Utc>,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            default_invalid_type_product: Value::Null,
            default_rand_exp_max: 10,
            ignore_missing_refs: false,
            fail_on_invalid_types: true,
            fail_on_invalid_format: true,
            always_fake_optionals: false,
            optionals_probability: None,
            fixed_probabilities: false,
            use_examples_value: false,
            use_default_value: false,
            required_only: false,
            min_items: 0,
            max_items: None,
            min_length: 0,
            max_length: None,
            resolve_json_path: false,
            seed: None,
            base_time: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or_default(),
        }
    }
}
