//! The evaluation pipeline: exam document → graded result in the store.
//!
//! Input validation runs strictly before anything expensive: a missing
//! path or unsupported extension is rejected without touching the LLM or
//! the database. The path's extension decides the extractor; the model
//! grades the extracted text; the parsed result is persisted append-only.

use crate::config::PipelineConfig;
use crate::error::DeckGenError;
use crate::normalize;
use crate::output::EvaluationOutput;
use crate::pipeline::{extract, llm};
use crate::prompts;
use crate::store::ResultStore;
use std::path::Path;
use tracing::info;

/// Evaluate the exam document at `file_path` and persist the result.
///
/// # Errors
/// * [`DeckGenError::InvalidPath`] — the path does not exist (checked
///   before any network or database work).
/// * [`DeckGenError::UnsupportedFileType`] — not a `.pdf`/`.docx`.
/// * LLM, normalisation, and persistence failures propagate as their
///   respective variants.
pub async fn evaluate(
    file_path: &Path,
    config: &PipelineConfig,
) -> Result<EvaluationOutput, DeckGenError> {
    // ── Step 1: Validate input ───────────────────────────────────────────
    if !file_path.exists() {
        return Err(DeckGenError::InvalidPath);
    }

    // ── Step 2: Extract text ─────────────────────────────────────────────
    let exam_content = extract::extract_text(file_path)?;
    info!(
        "Evaluating {} ({} chars extracted)",
        file_path.display(),
        exam_content.len()
    );

    // ── Step 3: Grade via the LLM ────────────────────────────────────────
    let generator = llm::resolve_generator(config)?;
    let prompt = prompts::evaluation_prompt(&exam_content);
    let response = generator.generate(&prompt).await?;

    // ── Step 4: Normalise ────────────────────────────────────────────────
    let result = normalize::parse_evaluation(&response)?;

    // ── Step 5: Persist ──────────────────────────────────────────────────
    let store = ResultStore::open(&config.database_path).await?;
    store
        .store_exam(&file_path.to_string_lossy(), &result)
        .await?;

    info!(
        "Stored evaluation for {}: score {}",
        file_path.display(),
        result.score
    );

    Ok(EvaluationOutput {
        exam_file: file_path.to_path_buf(),
        evaluation: result.evaluation,
        score: result.score,
        extracted_chars: exam_content.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn nonexistent_path_fails_before_everything_else() {
        // No generator configured and no reachable database: if the
        // pipeline got past validation, the error would not be InvalidPath.
        let config = PipelineConfig::default();
        let err = evaluate(Path::new("/no/such/file.pdf"), &config)
            .await
            .unwrap_err();
        assert!(matches!(err, DeckGenError::InvalidPath));
        assert_eq!(err.to_string(), "Invalid or missing file path.");
    }

    #[tokio::test]
    async fn unsupported_extension_fails_before_the_llm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("answers.txt");
        std::fs::write(&path, "1 + 1 = 2").unwrap();

        let config = PipelineConfig::default();
        let err = evaluate(&path, &config).await.unwrap_err();
        assert!(matches!(err, DeckGenError::UnsupportedFileType { .. }));
    }
}
