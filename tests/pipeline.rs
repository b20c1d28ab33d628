//! End-to-end pipeline tests with injected collaborators.
//!
//! Every external service — LLM, image index, file host — enters the
//! pipelines through a config seam, so these tests run the real
//! orchestration code against in-process doubles: no network, no API
//! keys, deterministic timing.

use async_trait::async_trait;
use deckgen::{
    evaluate, notes, present, DeckGenError, FileHost, PipelineConfig, ResultStore,
    SlideContent, SlideImageFetcher, TextGenerator, UploadRecord,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

// ── Test doubles ─────────────────────────────────────────────────────────────

/// Generator that returns one canned response, counting calls.
struct CannedGenerator {
    response: String,
    calls: AtomicUsize,
}

impl CannedGenerator {
    fn new(response: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            response: response.into(),
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl TextGenerator for CannedGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, DeckGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.response.clone())
    }
}

/// Fetcher that writes a real 4×4 JPEG, or fails every call.
struct StubFetcher {
    fail: bool,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn succeeding() -> Arc<Self> {
        Arc::new(Self {
            fail: false,
            calls: AtomicUsize::new(0),
        })
    }

    fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl SlideImageFetcher for StubFetcher {
    async fn fetch(&self, query: &str, dest: &Path) -> Result<(), DeckGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(DeckGenError::NoImageFound {
                query: query.to_string(),
            });
        }
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([120, 180, 90]));
        img.save(dest)
            .map_err(|e| DeckGenError::Internal(e.to_string()))?;
        Ok(())
    }
}

/// Host that records uploads and deletions in memory.
struct StubHost {
    uploads: AtomicUsize,
    deletes: AtomicUsize,
}

impl StubHost {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            uploads: AtomicUsize::new(0),
            deletes: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl FileHost for StubHost {
    async fn upload(
        &self,
        local_path: &Path,
        public_id: Option<&str>,
    ) -> Result<UploadRecord, DeckGenError> {
        assert!(local_path.exists(), "upload must receive an existing file");
        self.uploads.fetch_add(1, Ordering::SeqCst);
        let id = public_id.unwrap_or("anonymous").to_string();
        Ok(UploadRecord {
            secure_url: format!("https://files.test/presentations/{id}.pptx"),
            public_id: id,
            delete_token: Some("tok".into()),
        })
    }

    async fn delete(&self, _record: &UploadRecord) -> Result<(), DeckGenError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

const TWO_SLIDE_RESPONSE: &str = r#"```json
[
  {
    "title": "What is Photosynthesis?",
    "bullet_points": ["Light energy to chemical energy", "Occurs in chloroplasts"],
    "image_prompt": "A diagram showing the photosynthesis process in a leaf"
  },
  {
    "title": "Why it Matters",
    "bullet_points": ["Produces oxygen", "Base of the food chain"],
    "image_prompt": "Forest canopy with sunlight"
  }
]
```"#;

fn presentation_config(
    dir: &Path,
    generator: Arc<CannedGenerator>,
    fetcher: Arc<StubFetcher>,
    host: Arc<StubHost>,
) -> PipelineConfig {
    PipelineConfig::builder()
        .generator(generator)
        .image_fetcher(fetcher)
        .file_host(host)
        .output_dir(dir)
        .auto_delete_delay_secs(0)
        .database_path(dir.join("results.db"))
        .build()
        .expect("valid config")
}

// ── Presentation pipeline ────────────────────────────────────────────────────

#[tokio::test]
async fn presentation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let generator = CannedGenerator::new(TWO_SLIDE_RESPONSE);
    let fetcher = StubFetcher::succeeding();
    let host = StubHost::new();
    let config = presentation_config(
        dir.path(),
        Arc::clone(&generator),
        Arc::clone(&fetcher),
        Arc::clone(&host),
    );

    let output = present("Photosynthesis", &config)
        .await
        .expect("pipeline should succeed");

    assert_eq!(output.stats.slide_count, 2);
    assert_eq!(output.stats.images_fetched, 2);
    assert_eq!(output.stats.images_failed, 0);
    assert!(!output.presentation_url.is_empty());
    assert_eq!(output.public_id, "Photosynthesis");

    for slide in &output.slides {
        match slide {
            SlideContent::Structured(s) => {
                assert!(s.image_path.is_some(), "every slide fetched an image");
                assert!(s.image_error.is_none());
            }
            SlideContent::Text(_) => panic!("response contained only structured slides"),
        }
    }

    // One LLM call, one image fetch per slide, one upload.
    assert_eq!(generator.calls.load(Ordering::SeqCst), 1);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 2);
    assert_eq!(host.uploads.load(Ordering::SeqCst), 1);

    // The deck landed in the requested directory.
    assert_eq!(output.local_path, dir.path().join("Photosynthesis.pptx"));
    assert!(output.local_path.exists());

    // The caller owns the deletion handle; with a zero delay it resolves
    // promptly and the host records the delete.
    let deleted = output.deletion.unwrap().await.unwrap();
    assert!(deleted);
    assert_eq!(host.deletes.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn image_failures_degrade_per_slide() {
    let dir = tempfile::tempdir().unwrap();
    let generator = CannedGenerator::new(TWO_SLIDE_RESPONSE);
    let fetcher = StubFetcher::failing();
    let host = StubHost::new();
    let config = presentation_config(dir.path(), generator, Arc::clone(&fetcher), host);

    let output = present("Photosynthesis", &config)
        .await
        .expect("image failures must not abort the pipeline");

    assert_eq!(output.stats.images_fetched, 0);
    assert_eq!(output.stats.images_failed, 2);
    for slide in &output.slides {
        let SlideContent::Structured(s) = slide else {
            panic!("expected structured slides")
        };
        assert!(s.image_path.is_none());
        assert!(s.image_error.is_some());
    }

    // Deck and upload still happened.
    assert!(output.local_path.exists());
    assert!(!output.presentation_url.is_empty());
}

#[tokio::test]
async fn malformed_llm_response_aborts_the_run() {
    let dir = tempfile::tempdir().unwrap();
    let generator = CannedGenerator::new("Sure! Here are your slides: title one, title two.");
    let fetcher = StubFetcher::succeeding();
    let host = StubHost::new();
    let config = presentation_config(
        dir.path(),
        generator,
        Arc::clone(&fetcher),
        Arc::clone(&host),
    );

    let err = present("Photosynthesis", &config).await.unwrap_err();
    assert!(matches!(err, DeckGenError::MalformedResponse { .. }));

    // Nothing downstream of normalisation may run.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert_eq!(host.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn bare_string_slides_flow_through() {
    let dir = tempfile::tempdir().unwrap();
    let generator = CannedGenerator::new(r#"["Welcome to the talk", "Thanks for listening"]"#);
    let fetcher = StubFetcher::succeeding();
    let host = StubHost::new();
    let config = presentation_config(dir.path(), generator, Arc::clone(&fetcher), host);

    let output = present("Greetings", &config).await.unwrap();

    assert_eq!(output.stats.slide_count, 2);
    // Bare strings carry no image prompt, so the fetcher is never called.
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert!(output.local_path.exists());
}

// ── Evaluation pipeline ──────────────────────────────────────────────────────

fn write_exam_docx(path: &Path) {
    use docx_rs::{Docx, Paragraph, Run};
    let file = std::fs::File::create(path).unwrap();
    Docx::new()
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("Q1: Define ownership.")))
        .add_paragraph(Paragraph::new().add_run(Run::new().add_text("A1: One owner per value.")))
        .build()
        .pack(file)
        .unwrap();
}

#[tokio::test]
async fn evaluation_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let exam_path = dir.path().join("exam.docx");
    write_exam_docx(&exam_path);
    let db_path = dir.path().join("results.db");

    let generator = CannedGenerator::new(
        "```json\n{\"evaluation\": \"Clear and correct answers.\", \"score\": 88}\n```",
    );
    let config = PipelineConfig::builder()
        .generator(generator)
        .database_path(&db_path)
        .build()
        .unwrap();

    let output = evaluate(&exam_path, &config).await.unwrap();
    assert_eq!(output.score, 88);
    assert_eq!(output.evaluation, "Clear and correct answers.");
    assert!(output.extracted_chars > 0);

    // The row is in the store.
    let store = ResultStore::open(&db_path).await.unwrap();
    let rows = store.exam_results().await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].score, 88);
    assert!(rows[0].exam_file.ends_with("exam.docx"));
}

#[tokio::test]
async fn evaluation_missing_file_makes_no_llm_call() {
    let generator = CannedGenerator::new("{\"evaluation\": \"x\", \"score\": 1}");
    let config = PipelineConfig::builder()
        .generator(Arc::clone(&generator) as Arc<dyn TextGenerator>)
        .build()
        .unwrap();

    let err = evaluate(Path::new("/no/such/file.pdf"), &config)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Invalid or missing file path.");
    assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn evaluation_rejects_out_of_range_score() {
    let dir = tempfile::tempdir().unwrap();
    let exam_path = dir.path().join("exam.docx");
    write_exam_docx(&exam_path);

    let generator = CannedGenerator::new("{\"evaluation\": \"suspiciously good\", \"score\": 250}");
    let config = PipelineConfig::builder()
        .generator(generator)
        .database_path(dir.path().join("results.db"))
        .build()
        .unwrap();

    let err = evaluate(&exam_path, &config).await.unwrap_err();
    assert!(matches!(err, DeckGenError::ScoreOutOfRange { score: 250 }));

    // Nothing out of contract reaches the store.
    let store = ResultStore::open(&dir.path().join("results.db")).await.unwrap();
    assert!(store.exam_results().await.unwrap().is_empty());
}

// ── Notes pipeline ───────────────────────────────────────────────────────────

#[tokio::test]
async fn notes_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("notes.db");

    let bullets: Vec<String> = (1..=10).map(|i| format!("Point {i}")).collect();
    let generator = CannedGenerator::new(serde_json::to_string(&bullets).unwrap());
    let config = PipelineConfig::builder()
        .generator(generator)
        .database_path(&db_path)
        .build()
        .unwrap();

    let output = notes("Rust ownership", &config).await.unwrap();
    assert_eq!(output.points.len(), 10);
    assert_eq!(output.points[0], "Point 1");

    let store = ResultStore::open(&db_path).await.unwrap();
    let stored = store.notes_for_topic("Rust ownership").await.unwrap();
    assert_eq!(stored.len(), 10);
    assert_eq!(stored[9].point, "Point 10");
}

// ── Uniform report layer ─────────────────────────────────────────────────────

#[tokio::test]
async fn reports_wrap_success_and_error_uniformly() {
    let dir = tempfile::tempdir().unwrap();
    let generator = CannedGenerator::new(TWO_SLIDE_RESPONSE);
    let fetcher = StubFetcher::succeeding();
    let host = StubHost::new();
    let config = presentation_config(dir.path(), generator, fetcher, host);

    let report = deckgen::run_presentation("Photosynthesis", &config).await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["topic"], "Photosynthesis");
    assert_eq!(json["slides"].as_array().unwrap().len(), 2);
    assert!(json["presentation_url"].as_str().unwrap().starts_with("https://"));

    let report = deckgen::run_presentation("", &config).await;
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "error");
    assert_eq!(json["error"], "Topic is required");
}
