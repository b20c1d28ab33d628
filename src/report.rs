//! Agent-facing result records.
//!
//! Tool callers (and the CLI's `--json` mode) want one uniform shape:
//! a success record carrying the full content, or an error record with a
//! human-readable message. The typed [`DeckGenError`] taxonomy stays
//! available to library callers; this layer flattens it at the boundary
//! where a string is all the consumer can use.

use crate::config::PipelineConfig;
use crate::error::DeckGenError;
use crate::output::{EvaluationOutput, NotesOutput, PresentationOutput};
use serde::Serialize;
use std::path::Path;

/// Uniform `{"status": "success", ...}` / `{"status": "error", "error": …}`
/// record wrapping a pipeline result.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum PipelineReport<T: Serialize> {
    Success {
        #[serde(flatten)]
        result: T,
    },
    Error {
        error: String,
    },
}

impl<T: Serialize> PipelineReport<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, PipelineReport::Success { .. })
    }
}

impl<T: Serialize> From<Result<T, DeckGenError>> for PipelineReport<T> {
    fn from(result: Result<T, DeckGenError>) -> Self {
        match result {
            Ok(result) => PipelineReport::Success { result },
            Err(e) => PipelineReport::Error {
                error: e.to_string(),
            },
        }
    }
}

/// Presentation pipeline with the uniform record contract.
pub async fn run_presentation(
    topic: &str,
    config: &PipelineConfig,
) -> PipelineReport<PresentationOutput> {
    crate::present::present(topic, config).await.into()
}

/// Evaluation pipeline with the uniform record contract.
pub async fn run_evaluation(
    file_path: &Path,
    config: &PipelineConfig,
) -> PipelineReport<EvaluationOutput> {
    crate::evaluate::evaluate(file_path, config).await.into()
}

/// Notes pipeline with the uniform record contract.
pub async fn run_notes(topic: &str, config: &PipelineConfig) -> PipelineReport<NotesOutput> {
    crate::notes::notes(topic, config).await.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_record_has_status_and_message() {
        let report: PipelineReport<NotesOutput> = Err(DeckGenError::InvalidPath).into();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Invalid or missing file path.");
    }

    #[test]
    fn success_record_flattens_the_result() {
        let output = NotesOutput {
            topic: "rust".into(),
            points: vec!["ownership".into()],
        };
        let report: PipelineReport<NotesOutput> = Ok(output).into();
        assert!(report.is_success());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["topic"], "rust");
        assert_eq!(json["points"][0], "ownership");
    }

    #[tokio::test]
    async fn evaluation_report_for_missing_file() {
        let config = PipelineConfig::default();
        let report = run_evaluation(Path::new("/no/such/file.pdf"), &config).await;
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "Invalid or missing file path.");
    }
}
