//! Response normalisation: LLM text blob → parsed JSON value.
//!
//! Models are instructed to return bare JSON, but they wrap output in
//! ` ```json … ``` ` fences often enough that stripping must happen on
//! every call. The rules are deliberately narrow: exactly one leading
//! fence (optional case-insensitive `json` tag) and one trailing fence
//! are removed, nothing inside the payload is touched, and anything that
//! is not valid JSON afterwards is a [`DeckGenError::MalformedResponse`].
//! There is no partial recovery — one malformed response aborts the
//! calling pipeline step.
//!
//! Each pass is a pure function (`&str → …`) with no shared state,
//! mirroring the post-processing layout elsewhere in this crate.

use crate::error::DeckGenError;
use crate::output::{EvaluationResult, SlideContent};
use once_cell::sync::Lazy;
use regex::Regex;

static RE_LEADING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^```(?:json)?\s*").unwrap());
static RE_TRAILING_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```\s*$").unwrap());

/// Remove one leading and one trailing markdown fence, if present.
///
/// The leading fence may carry a `json` language tag in any letter case.
/// Inner fences are left alone: only the outermost wrapper is the
/// model's formatting artefact.
pub fn strip_fences(raw: &str) -> String {
    let trimmed = raw.trim();
    let without_leading = RE_LEADING_FENCE.replace(trimmed, "");
    let without_trailing = RE_TRAILING_FENCE.replace(&without_leading, "");
    without_trailing.trim().to_string()
}

/// Strip fences and parse the remainder as JSON.
pub fn normalize_json(raw: &str) -> Result<serde_json::Value, DeckGenError> {
    let cleaned = strip_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| DeckGenError::MalformedResponse {
        detail: e.to_string(),
    })
}

/// Parse a presentation response into slide records.
pub fn parse_slides(raw: &str) -> Result<Vec<SlideContent>, DeckGenError> {
    let cleaned = strip_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| DeckGenError::MalformedResponse {
        detail: e.to_string(),
    })
}

/// Parse an evaluation response, enforcing the 0–100 score contract.
///
/// The score range is documented by the prompt but not guaranteed by the
/// model; enforcing it here means nothing out of contract reaches the
/// store.
pub fn parse_evaluation(raw: &str) -> Result<EvaluationResult, DeckGenError> {
    let cleaned = strip_fences(raw);
    let result: EvaluationResult =
        serde_json::from_str(&cleaned).map_err(|e| DeckGenError::MalformedResponse {
            detail: e.to_string(),
        })?;
    if !(0..=100).contains(&result.score) {
        return Err(DeckGenError::ScoreOutOfRange {
            score: result.score,
        });
    }
    Ok(result)
}

/// Parse a notes response into bullet strings.
pub fn parse_bullets(raw: &str) -> Result<Vec<String>, DeckGenError> {
    let cleaned = strip_fences(raw);
    serde_json::from_str(&cleaned).map_err(|e| DeckGenError::MalformedResponse {
        detail: e.to_string(),
    })
}
