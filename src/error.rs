//! Error types for the deckgen library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`DeckGenError`] — **Fatal**: the pipeline cannot proceed at all
//!   (empty topic, missing input file, malformed LLM output, deck or
//!   upload failure). Returned as `Err(DeckGenError)` from the top-level
//!   pipeline functions.
//!
//! * [`SlideImageError`] — **Non-fatal**: the image for a single slide
//!   could not be fetched. Stored inside the slide record (its
//!   `image_path` stays `None`) so the deck is still produced with every
//!   other slide intact.
//!
//! The separation lets callers decide their own tolerance: a slide
//! without a picture is acceptable, a deck without content is not.

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the deckgen library.
///
/// Per-slide image failures use [`SlideImageError`] and are stored in
/// [`crate::output::Slide`] rather than propagated here.
#[derive(Debug, Error)]
pub enum DeckGenError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// The topic string was empty.
    #[error("Topic is required")]
    EmptyTopic,

    /// The exam file path is missing or does not exist.
    ///
    /// The display text is part of the agent contract; callers match on it.
    #[error("Invalid or missing file path.")]
    InvalidPath,

    /// The exam file has an extension other than `.pdf` or `.docx`.
    #[error("Unsupported file type '.{extension}'. Please provide a .pdf or .docx file.")]
    UnsupportedFileType { extension: String },

    /// Text extraction from a PDF or DOCX file failed.
    #[error("Failed to extract text from '{path}': {detail}")]
    ExtractionFailed { path: PathBuf, detail: String },

    // ── Image search errors ───────────────────────────────────────────────
    /// The image index request itself failed (network, HTTP status).
    #[error("Image search request failed for '{query}': {reason}")]
    SearchFailed { query: String, reason: String },

    /// The search returned zero hits for the query.
    #[error("No image found for query: {query}")]
    NoImageFound { query: String },

    /// The metadata lookup for a search hit returned no usable URL.
    #[error("No image info found for: {title}")]
    NoImageInfo { title: String },

    /// Every download attempt failed validation.
    #[error("Failed to download and save image after {attempts} attempts: {query}")]
    ImageDownloadFailed { query: String, attempts: u32 },

    // ── LLM errors ────────────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider is not configured.\n{hint}")]
    ProviderNotConfigured { hint: String },

    /// The LLM API returned an error.
    #[error("LLM API error: {message}")]
    LlmApiError { message: String },

    /// The LLM returned an empty completion.
    #[error("LLM returned an empty response")]
    EmptyLlmResponse,

    /// The LLM response was not valid JSON after fence stripping.
    #[error("Invalid JSON response: {detail}")]
    MalformedResponse { detail: String },

    /// The evaluation score fell outside the documented 0–100 range.
    #[error("Evaluation score {score} is outside the range 0–100")]
    ScoreOutOfRange { score: i64 },

    // ── Output errors ─────────────────────────────────────────────────────
    /// Could not create or write the presentation file.
    #[error("Failed to write presentation '{path}': {source}")]
    DeckWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file host rejected the upload or returned an unusable record.
    #[error("Upload failed: {reason}")]
    UploadFailed { reason: String },

    /// A database write or open failed.
    #[error("Storage error: {detail}")]
    PersistenceFailure { detail: String },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error for a single slide's image.
///
/// Stored alongside the slide when its image fetch fails. The deck is
/// still built; the affected slide simply has no picture.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum SlideImageError {
    /// Search, metadata lookup, or download failed for this slide.
    #[error("Slide {slide}: image fetch failed: {detail}")]
    FetchFailed { slide: usize, detail: String },
}

impl From<sqlx::Error> for DeckGenError {
    fn from(err: sqlx::Error) -> Self {
        DeckGenError::PersistenceFailure {
            detail: err.to_string(),
        }
    }
}
