//! # deckgen
//!
//! Turn a topic string into a hosted slide deck, and grade exam
//! documents, using LLMs.
//!
//! ## Why this crate?
//!
//! Producing a presentable deck from one line of input takes a chain of
//! unreliable collaborators: a model that returns JSON wrapped in
//! markdown fences, an image index that serves error pages with HTTP 200,
//! and a temp file host that forgets nothing unless told. This crate owns
//! that chain end to end — normalisation, validated downloads with
//! backoff, OOXML assembly, scheduled remote deletion — behind three
//! small entry points.
//!
//! ## Pipeline Overview
//!
//! ```text
//! topic
//!  │
//!  ├─ 1. Prompt    structured slide request
//!  ├─ 2. LLM       gemini-2.0-flash by default (any provider works)
//!  ├─ 3. Normalize fence-strip + JSON parse
//!  ├─ 4. Images    Wikimedia search → validated JPEG, per slide,
//!  │               failures degrade to a slide without a picture
//!  ├─ 5. Deck      records → .pptx
//!  ├─ 6. Upload    shareable URL, deletion scheduled after 5 minutes
//!  └─ 7. Output    slides + URL + run stats
//! ```
//!
//! The evaluation pipeline swaps steps 4–6 for text extraction
//! (PDF/DOCX) in front and an append-only SQLite store behind.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use deckgen::{present, PipelineConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from GEMINI_API_KEY / OPENAI_API_KEY / …
//!     let config = PipelineConfig::default();
//!     let output = present("Photosynthesis", &config).await?;
//!     println!("{}", output.presentation_url);
//!     eprintln!(
//!         "{} slides, {}/{} images",
//!         output.stats.slide_count,
//!         output.stats.images_fetched,
//!         output.stats.slide_count
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `deckgen` binary (clap + anyhow + tracing-subscriber) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! deckgen = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod evaluate;
pub mod normalize;
pub mod notes;
pub mod output;
pub mod pipeline;
pub mod present;
pub mod progress;
pub mod prompts;
pub mod report;
pub mod store;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use error::{DeckGenError, SlideImageError};
pub use evaluate::evaluate;
pub use notes::notes;
pub use output::{
    EvaluationOutput, EvaluationResult, NotesOutput, PresentationOutput, RunStats, Slide,
    SlideContent,
};
pub use pipeline::images::SlideImageFetcher;
pub use pipeline::llm::TextGenerator;
pub use pipeline::upload::{DeletionHandle, FileHost, UploadRecord};
pub use present::present;
pub use progress::{NoopProgressCallback, PipelineProgressCallback, ProgressCallback};
pub use report::{run_evaluation, run_notes, run_presentation, PipelineReport};
pub use store::{ExamRecord, NoteRecord, ResultStore};
