//! The presentation pipeline: topic string → hosted slide deck.
//!
//! This is the primary orchestration in the crate. The flow is strictly
//! sequential — no per-slide parallelism — and has exactly one point of
//! tolerated failure: a slide whose image cannot be fetched keeps its
//! place in the deck without a picture. Everything else aborts the run
//! with a typed error.
//!
//! Slide images are written into a per-run [`tempfile::TempDir`], so
//! they are removed when the run ends — on success, error, and panic
//! alike. Two concurrent runs therefore never share a scratch path.

use crate::config::PipelineConfig;
use crate::error::{DeckGenError, SlideImageError};
use crate::normalize;
use crate::output::{PresentationOutput, RunStats, SlideContent};
use crate::pipeline::images::{SlideImageFetcher, WikimediaFetcher};
use crate::pipeline::keywords::simplify_image_prompt;
use crate::pipeline::upload::{schedule_deletion, CloudinaryHost, FileHost};
use crate::pipeline::{deck, llm};
use crate::prompts;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Generate, build, upload, and return a presentation for `topic`.
///
/// # Errors
/// Returns `Err(DeckGenError)` for anything fatal: empty topic, LLM or
/// normalisation failure, deck write failure, upload failure. Per-slide
/// image failures are recorded in the slide (`image_error`) and never
/// abort the run.
pub async fn present(
    topic: &str,
    config: &PipelineConfig,
) -> Result<PresentationOutput, DeckGenError> {
    let total_start = Instant::now();

    if topic.trim().is_empty() {
        return Err(DeckGenError::EmptyTopic);
    }
    info!("Starting presentation run: {}", topic);

    // ── Step 1: Resolve collaborators ────────────────────────────────────
    // All three up front: a misconfigured uploader should fail the run
    // before any tokens are spent.
    let generator = llm::resolve_generator(config)?;
    let fetcher = resolve_fetcher(config)?;
    let host = resolve_host(config)?;

    // ── Step 2: Generate slide content ───────────────────────────────────
    let llm_start = Instant::now();
    let prompt = prompts::presentation_prompt(topic);
    let response = generator.generate(&prompt).await?;
    let llm_duration_ms = llm_start.elapsed().as_millis() as u64;

    // ── Step 3: Normalise the response ───────────────────────────────────
    let mut slides = normalize::parse_slides(&response)?;
    info!("Model produced {} slides", slides.len());
    if let Some(ref cb) = config.progress_callback {
        cb.on_slides_parsed(slides.len());
    }

    // ── Step 4: Fetch slide images, one at a time ────────────────────────
    let image_dir = tempfile::tempdir()
        .map_err(|e| DeckGenError::Internal(format!("scratch dir: {e}")))?;
    let image_start = Instant::now();
    let mut images_fetched = 0usize;
    let mut images_failed = 0usize;

    for (i, entry) in slides.iter_mut().enumerate() {
        let SlideContent::Structured(slide) = entry else {
            continue;
        };
        let Some(image_prompt) = slide.image_prompt.clone() else {
            continue;
        };

        let query = simplify_image_prompt(&image_prompt);
        debug!("Slide {} image prompt: '{}' -> '{}'", i, image_prompt, query);
        if let Some(ref cb) = config.progress_callback {
            cb.on_image_start(i, &query);
        }

        let dest = image_dir.path().join(format!("slide_image_{i}.jpg"));
        match fetcher.fetch(&query, &dest).await {
            Ok(()) => {
                slide.image_path = Some(dest);
                images_fetched += 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_fetched(i);
                }
            }
            Err(e) => {
                warn!("Image fetch failed for slide {}: {}", i, e);
                slide.image_path = None;
                slide.image_error = Some(SlideImageError::FetchFailed {
                    slide: i,
                    detail: e.to_string(),
                });
                images_failed += 1;
                if let Some(ref cb) = config.progress_callback {
                    cb.on_image_failed(i, &e.to_string());
                }
            }
        }
    }
    let image_duration_ms = image_start.elapsed().as_millis() as u64;

    // ── Step 5: Build the deck ───────────────────────────────────────────
    let deck_path = config
        .output_dir
        .join(format!("{}.pptx", topic.replace(' ', "_")));
    let local_path = deck::build_deck(topic, &slides, Some(&deck_path))?;
    if let Some(ref cb) = config.progress_callback {
        cb.on_deck_built(slides.len());
    }

    // ── Step 6: Upload and schedule remote deletion ──────────────────────
    let public_id = topic.replace(' ', "_");
    let record = host.upload(&local_path, Some(&public_id)).await?;
    let deletion = schedule_deletion(
        Arc::clone(&host),
        record.clone(),
        Duration::from_secs(config.auto_delete_delay_secs),
    );
    if let Some(ref cb) = config.progress_callback {
        cb.on_uploaded(&record.secure_url);
    }

    // ── Step 7: Assemble output ──────────────────────────────────────────
    // `image_dir` drops at the end of this scope, removing the slide
    // images; the paths recorded in the slides become historical.
    let stats = RunStats {
        slide_count: slides.len(),
        images_fetched,
        images_failed,
        llm_duration_ms,
        image_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    info!(
        "Presentation run complete: {} slides, {}/{} images, {}ms total",
        stats.slide_count,
        stats.images_fetched,
        stats.slide_count,
        stats.total_duration_ms
    );

    Ok(PresentationOutput {
        topic: topic.to_string(),
        slides,
        local_path,
        presentation_url: record.secure_url,
        public_id: record.public_id,
        stats,
        deletion: Some(deletion),
    })
}

// ── Collaborator resolution ──────────────────────────────────────────────

fn resolve_fetcher(config: &PipelineConfig) -> Result<Arc<dyn SlideImageFetcher>, DeckGenError> {
    if let Some(ref fetcher) = config.image_fetcher {
        return Ok(Arc::clone(fetcher));
    }
    Ok(Arc::new(WikimediaFetcher::from_config(config)?))
}

fn resolve_host(config: &PipelineConfig) -> Result<Arc<dyn FileHost>, DeckGenError> {
    if let Some(ref host) = config.file_host {
        return Ok(Arc::clone(host));
    }
    Ok(Arc::new(CloudinaryHost::from_env(config)?))
}
