use std::sync::LazyLock;

use rand::seq::SliceRandom;
use serde_json::Value;

use crate::engine::GenContext;
use crate::errors::GenerationError;
use crate::formats;
use crate::random;
use crate::typecast::typecast;

const LIPSUM: &str = "Lorem ipsum dolor sit amet consectetur adipisicing elit sed do eiusmod \
tempor incididunt ut labore et dolore magna aliqua Ut enim ad minim veniam quis nostrud \
exercitation ullamco laboris nisi ut aliquip ex ea commodo consequat Duis aute irure dolor in \
reprehenderit in voluptate velit esse cillum dolore eu fugiat nulla pariatur Excepteur sint \
occaecat cupidatat non proident sunt in culpa qui officia deserunt mollit anim id est laborum";

static WORDS: LazyLock<Vec<&'static str>> =
    LazyLock::new(|| LIPSUM.split_whitespace().collect());

/// Random lorem words joined into a string whose length lands between the
/// given bounds.
pub fn words(rng: &mut dyn rand::RngCore, min: usize, max: usize) -> String {
    let max = max.max(min);
    let target = random::number(
        rng,
        Some(min as f64),
        Some(max as f64),
        min as f64,
        max as f64,
        false,
    ) as usize;
    let mut text = sample_words(rng);
    while text.chars().count() < min {
        text.push(' ');
        text.push_str(&sample_words(rng));
    }
    if text.chars().count() > target {
        text = text.chars().take(target).collect();
    }
    text
}

/// One random lorem word.
pub(crate) fn word(rng: &mut dyn rand::RngCore) -> &'static str {
    random::pick(rng, &WORDS).copied().unwrap_or("lorem")
}

fn sample_words(rng: &mut dyn rand::RngCore) -> String {
    let count = random::number(rng, Some(1.0), Some(5.0), 1.0, 5.0, false) as usize;
    let mut pool: Vec<&str> = WORDS.clone();
    pool.shuffle(rng);
    pool[..count.min(pool.len())].join(" ")
}

/// String draw: custom or built-in format first, then plain words; a node
/// carrying `pattern` is claimed by the keyword registry before type
/// dispatch and never reaches here. Length constraints and format fixups
/// apply on the way out through the typecast.
pub fn string(
    ctx: &mut GenContext<'_>,
    node: &mut Value,
    path: &[String],
) -> Result<Value, GenerationError> {
    let formats = ctx.formats;
    let options = ctx.options;
    typecast(
        Some("string"),
        node,
        ctx.options,
        &mut *ctx.rng,
        |node, params, rng| {
            let min = params.min_length.unwrap_or(0) as usize;
            let max = params.max_length.map(|value| value as usize).unwrap_or(140);
            if node.get("format").is_some() {
                let text = formats::generate_format(formats, node, options, rng, path, |rng| {
                    words(rng, min, max)
                })?;
                return Ok(Value::String(text));
            }
            Ok(Value::String(words(rng, min, max)))
        },
    )
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::*;

    #[test]
    fn words_honors_length_window() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..50 {
            let text = words(&mut rng, 10, 25);
            let length = text.chars().count();
            assert!((10..=25).contains(&length), "length {length} out of range");
        }
    }

    #[test]
    fn word_draws_from_the_pool() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for _ in 0..20 {
            assert!(WORDS.contains(&word(&mut rng)));
        }
    }
}
