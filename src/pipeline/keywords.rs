//! Keyword simplification for image-search queries.
//!
//! The model's `image_prompt` values read like captions ("A detailed
//! diagram illustrating the stages of photosynthesis in a leaf"). Image
//! indexes match keywords, not prose, so the prompt is reduced to its
//! three most frequent content words before searching.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;
use std::collections::HashSet;

/// Fallback query used when no token survives filtering.
pub const FALLBACK_QUERY: &str = "technology diagram";

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").unwrap());

static STOP_WORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "a", "an", "the", "of", "in", "on", "with", "to", "and", "for", "from", "showing",
        "illustrating", "representation", "diagram", "image", "prompt",
    ]
    .into_iter()
    .collect()
});

/// Reduce a verbose image prompt to a short keyword query.
///
/// Tokenises on word boundaries, lowercases, drops stop words and tokens
/// of length ≤ 2, then keeps the 3 most frequent remaining tokens. Ties
/// break in first-encountered order, so the result is deterministic.
/// Returns [`FALLBACK_QUERY`] when nothing survives.
pub fn simplify_image_prompt(prompt: &str) -> String {
    let lowered = prompt.to_lowercase();

    // Count tokens, remembering each one's first position for stable ties.
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut order = 0usize;
    for m in RE_WORD.find_iter(&lowered) {
        let word = m.as_str();
        if word.len() <= 2 || STOP_WORDS.contains(word) {
            continue;
        }
        counts
            .entry(word)
            .and_modify(|(count, _first)| *count += 1)
            .or_insert_with(|| {
                order += 1;
                (1, order)
            });
    }

    let mut ranked: Vec<(&str, (usize, usize))> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));

    let query = ranked
        .iter()
        .take(3)
        .map(|(word, _)| *word)
        .collect::<Vec<_>>()
        .join(" ");

    if query.is_empty() {
        FALLBACK_QUERY.to_string()
    } else {
        query
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_stop_words_and_short_tokens() {
        let q = simplify_image_prompt("A diagram of the water cycle in nature");
        assert_eq!(q, "water cycle nature");
    }

    #[test]
    fn frequency_beats_position() {
        let q = simplify_image_prompt("solar panels solar energy wind turbines solar");
        assert!(q.starts_with("solar"), "got: {q}");
        assert_eq!(q.split_whitespace().count(), 3);
    }

    #[test]
    fn ties_break_in_first_encountered_order() {
        let q = simplify_image_prompt("alpha beta gamma delta");
        assert_eq!(q, "alpha beta gamma");
    }

    #[test]
    fn falls_back_when_nothing_survives() {
        assert_eq!(simplify_image_prompt("a an of to"), FALLBACK_QUERY);
        assert_eq!(simplify_image_prompt(""), FALLBACK_QUERY);
    }

    #[test]
    fn simplification_is_idempotent() {
        let once = simplify_image_prompt("A timeline showing key historical events");
        let twice = simplify_image_prompt(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn short_input_does_not_crash() {
        assert_eq!(simplify_image_prompt("ox"), FALLBACK_QUERY);
        let q = simplify_image_prompt("cat");
        assert_eq!(q, "cat");
    }

    #[test]
    fn lowercases_everything() {
        let q = simplify_image_prompt("PHOTOSYNTHESIS Process OVERVIEW");
        assert_eq!(q, "photosynthesis process overview");
    }
}
