//! Random primitives: bounded numeric draws, element picks, shuffles,
//! regex-driven string sampling and date arithmetic. Every function takes
//! an injectable `&mut dyn RngCore` source so seeded runs reproduce.

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::errors::GenerationError;

pub const MIN_INTEGER: i64 = -100_000_000;
pub const MAX_INTEGER: i64 = 100_000_000;
pub const MAX_NUMBER: f64 = 100.0;
/// Milliseconds of history available to random date draws.
pub const MOST_NEAR_DATETIME: i64 = 2_524_608_000_000;

/// Draws a number in `[min, max]`, falling back to the given defaults when
/// a bound is absent. A crossed range (`max < min`) is folded by shifting
/// `max` up by `min` before drawing. Without `precision` the draw is an
/// integer one.
pub fn number(
    rng: &mut dyn rand::RngCore,
    min: Option<f64>,
    max: Option<f64>,
    def_min: f64,
    def_max: f64,
    precision: bool,
) -> f64 {
    let min = min.unwrap_or(def_min);
    let mut max = max.unwrap_or(def_max);
    if max < min {
        max += min;
    }
    if precision {
        if max <= min {
            return min;
        }
        return rng.random_range(min..max);
    }
    let lo = min.floor() as i64;
    let hi = max.floor() as i64;
    if lo >= hi {
        return lo as f64;
    }
    rng.random_range(lo..=hi) as f64
}

/// Picks one element uniformly; `None` on an empty slice.
pub fn pick<'a, T>(rng: &mut dyn rand::RngCore, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let index = rng.random_range(0..items.len());
    items.get(index)
}

/// Samples a string matching `pattern`. Anchors are stripped first since
/// the sampler rejects them; unbounded quantifiers repeat at most
/// `max_repeat` times.
pub fn randexp(
    rng: &mut dyn rand::RngCore,
    pattern: &str,
    max_repeat: u32,
) -> Result<String, GenerationError> {
    let trimmed = pattern.trim_start_matches('^').trim_end_matches('$');
    let regex = rand_regex::Regex::compile(trimmed, max_repeat).map_err(|err| {
        GenerationError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: err.to_string(),
        }
    })?;
    let value: String = rng.sample(regex);
    Ok(value)
}

/// Random instant drawn from roughly eighty years of history before the
/// reference instant.
pub fn datetime(rng: &mut dyn rand::RngCore, base: DateTime<Utc>) -> DateTime<Utc> {
    let millis = number(
        rng,
        Some(-1000.0),
        Some(MOST_NEAR_DATETIME as f64),
        -1000.0,
        MOST_NEAR_DATETIME as f64,
        false,
    ) as i64;
    base - Duration::milliseconds(millis)
}

/// Randomized millisecond step for one increment of the given unit.
/// `None` for an unrecognized unit.
pub fn date_step(rng: &mut dyn rand::RngCore, unit: &str) -> Option<i64> {
    let step = |rng: &mut dyn rand::RngCore, lo: f64, hi: f64, scale: f64| {
        number(rng, Some(lo), Some(hi), lo, hi, false) * scale
    };
    let millis = match unit {
        "seconds" => step(rng, 0.0, 60.0, 60.0),
        "minutes" => step(rng, 15.0, 50.0, 612.0),
        "hours" => step(rng, 12.0, 72.0, 36_123.0),
        "days" => step(rng, 7.0, 30.0, 86_412_345.0),
        "weeks" => step(rng, 4.0, 52.0, 604_812_345.0),
        "months" => step(rng, 2.0, 13.0, 2_592_012_345.0),
        "years" => step(rng, 1.0, 20.0, 31_104_012_345.0),
        _ => return None,
    };
    Some(millis as i64)
}
