use serde_json::Value;

use crate::random;
use crate::typecast::float_value;

/// Draws a number honoring bounds, exclusivity flags and `multipleOf`.
/// Bounds made infeasible by the constraints yield JSON null, the closest
/// representable failure sentinel.
pub fn number(rng: &mut dyn rand::RngCore, node: &Value) -> Value {
    let declared_min = node.get("minimum").and_then(Value::as_f64);
    let declared_max = node.get("maximum").and_then(Value::as_f64);
    let mut min = declared_min.unwrap_or(random::MIN_INTEGER as f64);
    let mut max = declared_max.unwrap_or(random::MAX_INTEGER as f64);
    let step = node
        .get("multipleOf")
        .and_then(Value::as_f64)
        .filter(|step| *step != 0.0);

    if let Some(step) = step {
        max = (max / step).floor() * step;
        min = (min / step).ceil() * step;
    }
    if exclusive(node, "exclusiveMinimum") && Some(min) == declared_min {
        min += step.unwrap_or(1.0);
    }
    if exclusive(node, "exclusiveMaximum") && Some(max) == declared_max {
        max -= step.unwrap_or(1.0);
    }
    if min > max {
        return Value::Null;
    }

    if let Some(step) = step {
        let slots = ((max - min) / step).floor().max(0.0);
        let index = random::number(rng, Some(0.0), Some(slots), 0.0, slots, false);
        // min is already step-aligned, so the offset keeps exactness
        let value = min + index * step;
        let remainder = (value / step).fract().abs();
        if remainder < 1e-9 || (1.0 - remainder) < 1e-9 {
            return float_value(value);
        }
        return float_value(min);
    }
    float_value(random::number(rng, Some(min), Some(max), min, max, true))
}

/// Integer draw: the numeric draw with `multipleOf` defaulting to 1,
/// emitted as a JSON integer.
pub fn integer(rng: &mut dyn rand::RngCore, node: &Value) -> Value {
    let mut copy = node.clone();
    if copy.is_object() && copy.get("multipleOf").is_none() {
        copy["multipleOf"] = Value::from(1);
    }
    match number(rng, &copy) {
        Value::Number(value) => value
            .as_f64()
            .map(|value| Value::from(value as i64))
            .unwrap_or(Value::Null),
        other => other,
    }
}

fn exclusive(node: &Value, key: &str) -> bool {
    match node.get(key) {
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(value)) => value.as_f64().map(|v| v != 0.0).unwrap_or(false),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use serde_json::json;

    use super::*;

    #[test]
    fn pinned_bounds_yield_the_single_value() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let node = json!({"type": "integer", "minimum": 5, "maximum": 5});
        assert_eq!(integer(&mut rng, &node), json!(5));
    }

    #[test]
    fn multiple_of_is_exact() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let node = json!({"minimum": 0, "maximum": 30, "multipleOf": 3});
        for _ in 0..100 {
            let value = number(&mut rng, &node).as_f64().unwrap();
            assert_eq!(value % 3.0, 0.0);
            assert!((0.0..=30.0).contains(&value));
        }
    }

    #[test]
    fn fractional_multiple_of_within_tolerance() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let node = json!({"minimum": 1, "maximum": 10, "multipleOf": 0.5});
        for _ in 0..100 {
            let value = number(&mut rng, &node).as_f64().unwrap();
            assert!((value * 2.0).fract().abs() < 1e-9);
            assert!((1.0..=10.0).contains(&value));
        }
    }

    #[test]
    fn exclusive_bounds_step_inward() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let node = json!({
            "minimum": 0,
            "maximum": 3,
            "multipleOf": 1,
            "exclusiveMinimum": true,
            "exclusiveMaximum": true
        });
        for _ in 0..50 {
            let value = number(&mut rng, &node).as_f64().unwrap();
            assert!((1.0..=2.0).contains(&value));
        }
    }

    #[test]
    fn infeasible_bounds_degrade_to_null() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let node = json!({"minimum": 10, "maximum": 5, "multipleOf": 1, "exclusiveMaximum": true});
        assert_eq!(number(&mut rng, &node), Value::Null);
    }
}
