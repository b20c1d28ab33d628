//! Progress-callback trait for per-slide pipeline events.
//!
//! Inject an [`Arc<dyn PipelineProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as the presentation pipeline works through its slides. Callers
//! can forward events to a terminal progress bar, a WebSocket, or a log —
//! the library knows nothing about how the host application communicates.
//!
//! Image fetches run one slide at a time, so implementations are never
//! called concurrently; `Send + Sync` is still required because the
//! pipeline future may migrate between executor threads.

use std::sync::Arc;

/// Called by the presentation pipeline as it progresses.
///
/// All methods have default no-op implementations so callers only
/// override what they care about.
pub trait PipelineProgressCallback: Send + Sync {
    /// Called once after the LLM response parsed, with the slide count.
    fn on_slides_parsed(&self, total_slides: usize) {
        let _ = total_slides;
    }

    /// Called before the image fetch for a slide begins.
    ///
    /// # Arguments
    /// * `slide`  — 0-indexed slide number
    /// * `query`  — the simplified search query being used
    fn on_image_start(&self, slide: usize, query: &str) {
        let _ = (slide, query);
    }

    /// Called when a slide's image was fetched and saved.
    fn on_image_fetched(&self, slide: usize) {
        let _ = slide;
    }

    /// Called when a slide's image fetch failed (the slide keeps going
    /// without a picture).
    fn on_image_failed(&self, slide: usize, error: &str) {
        let _ = (slide, error);
    }

    /// Called after the deck file has been written locally.
    fn on_deck_built(&self, slide_count: usize) {
        let _ = slide_count;
    }

    /// Called after the deck has been uploaded.
    fn on_uploaded(&self, url: &str) {
        let _ = url;
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl PipelineProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn PipelineProgressCallback>;
