//! Result records returned by the pipelines.
//!
//! Every pipeline returns a single owned output value: the caller gets
//! the full content (slides, evaluation, notes) plus run statistics in
//! one place, and nothing references pipeline-internal state afterwards.
//! The slide records here are also the deck builder's input format, so
//! the LLM JSON deserialises straight into them.

use crate::error::SlideImageError;
use crate::pipeline::upload::DeletionHandle;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One unit of deck content, as produced by the LLM.
///
/// The model is asked for structured slides, but the deck builder also
/// accepts a bare string (rendered as a slide titled "Slide" with a
/// single bold run). `#[serde(untagged)]` lets both shapes deserialise
/// from the same JSON array.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlideContent {
    /// Plain body text with no title or bullets.
    Text(String),
    /// A structured slide record.
    Structured(Slide),
}

/// A structured slide: title, bullets, and an optional image.
///
/// `bullet_points` may be empty — absence is tolerated, not rejected.
/// `image_path` starts `None` and is attached once by the presentation
/// pipeline after a successful image fetch; `image_error` records why a
/// fetch was skipped or failed, without failing the run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default = "default_title")]
    pub title: String,

    #[serde(default)]
    pub bullet_points: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_prompt: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_path: Option<PathBuf>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_error: Option<SlideImageError>,
}

fn default_title() -> String {
    "Untitled".to_string()
}

impl Slide {
    /// A slide with just a title, for tests and programmatic construction.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            bullet_points: Vec::new(),
            subtitle: None,
            image_prompt: None,
            image_path: None,
            image_error: None,
        }
    }
}

/// The evaluation record parsed from the LLM's JSON response.
///
/// `score` is validated against the 0–100 contract at normalisation
/// time; a value outside that range never reaches the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub evaluation: String,
    pub score: i64,
}

/// Statistics for one pipeline run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunStats {
    /// Slides produced by the LLM.
    pub slide_count: usize,
    /// Slides whose image fetch succeeded.
    pub images_fetched: usize,
    /// Slides whose image fetch failed (non-fatal).
    pub images_failed: usize,
    /// Wall-clock time spent in the LLM call.
    pub llm_duration_ms: u64,
    /// Wall-clock time spent fetching images.
    pub image_duration_ms: u64,
    /// Total wall-clock time for the run.
    pub total_duration_ms: u64,
}

/// Output of the presentation pipeline.
#[derive(Debug, Serialize)]
pub struct PresentationOutput {
    pub topic: String,
    pub slides: Vec<SlideContent>,
    /// Where the .pptx was written before upload.
    pub local_path: PathBuf,
    pub presentation_url: String,
    pub public_id: String,
    pub stats: RunStats,
    /// Handle for the scheduled remote deletion. Not awaited by the
    /// pipeline; the caller owns it and may await or abort it.
    #[serde(skip)]
    pub deletion: Option<DeletionHandle>,
}

/// Output of the evaluation pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationOutput {
    pub exam_file: PathBuf,
    pub evaluation: String,
    pub score: i64,
    /// Characters of text extracted from the document.
    pub extracted_chars: usize,
}

/// Output of the notes pipeline.
#[derive(Debug, Clone, Serialize)]
pub struct NotesOutput {
    pub topic: String,
    pub points: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slide_content_accepts_bare_string() {
        let parsed: Vec<SlideContent> = serde_json::from_str(r#"["Hello"]"#).unwrap();
        assert!(matches!(&parsed[0], SlideContent::Text(s) if s == "Hello"));
    }

    #[test]
    fn slide_content_accepts_structured_record() {
        let json = r#"[{"title": "T", "bullet_points": ["a", "b"], "image_prompt": "a cat"}]"#;
        let parsed: Vec<SlideContent> = serde_json::from_str(json).unwrap();
        match &parsed[0] {
            SlideContent::Structured(s) => {
                assert_eq!(s.title, "T");
                assert_eq!(s.bullet_points, vec!["a", "b"]);
                assert_eq!(s.image_prompt.as_deref(), Some("a cat"));
                assert!(s.image_path.is_none());
            }
            other => panic!("expected structured slide, got {other:?}"),
        }
    }

    #[test]
    fn slide_without_bullets_defaults_to_empty() {
        let parsed: Slide = serde_json::from_str(r#"{"title": "Only title"}"#).unwrap();
        assert!(parsed.bullet_points.is_empty());
    }

    #[test]
    fn slide_without_title_defaults_to_untitled() {
        let parsed: Slide = serde_json::from_str(r#"{"bullet_points": ["x"]}"#).unwrap();
        assert_eq!(parsed.title, "Untitled");
    }
}
