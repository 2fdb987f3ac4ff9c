//! Type generators: one synthesis function per JSON primitive type.

mod array;
mod number;
mod object;
mod string;

pub use array::array;
pub use number::{integer, number};
pub use object::object;
pub use string::{string, words};

use rand::Rng;
use serde_json::Value;

pub fn boolean(rng: &mut dyn rand::RngCore) -> Value {
    Value::Bool(rng.random_bool(0.5))
}

/// Schema standing in for unconstrained members.
pub(crate) fn any_type_schema() -> Value {
    serde_json::json!({"type": ["string", "number", "integer", "boolean"]})
}
