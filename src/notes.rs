//! The notes pipeline: topic string → ten stored bullet points.
//!
//! The smallest of the three pipelines: one LLM call, one parse, one
//! append per bullet. Bullets are persisted individually so a later run
//! on the same topic accumulates rather than overwrites.

use crate::config::PipelineConfig;
use crate::error::DeckGenError;
use crate::normalize;
use crate::output::NotesOutput;
use crate::pipeline::llm;
use crate::prompts;
use crate::store::ResultStore;
use tracing::info;

/// Generate concise notes for `topic` and persist each bullet.
pub async fn notes(topic: &str, config: &PipelineConfig) -> Result<NotesOutput, DeckGenError> {
    if topic.trim().is_empty() {
        return Err(DeckGenError::EmptyTopic);
    }

    let generator = llm::resolve_generator(config)?;
    let prompt = prompts::notes_prompt(topic);
    let response = generator.generate(&prompt).await?;

    let points = normalize::parse_bullets(&response)?;

    let store = ResultStore::open(&config.database_path).await?;
    for point in &points {
        store.store_note(topic, point).await?;
    }

    info!("Stored {} note bullets for '{}'", points.len(), topic);

    Ok(NotesOutput {
        topic: topic.to_string(),
        points,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_topic_is_rejected() {
        let config = PipelineConfig::default();
        let err = notes("", &config).await.unwrap_err();
        assert!(matches!(err, DeckGenError::EmptyTopic));
    }
}
