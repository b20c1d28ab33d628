//! LLM interaction: the [`TextGenerator`] seam and its provider-backed
//! implementation.
//!
//! The pipelines never talk to a provider SDK directly — they depend on
//! the one-method `TextGenerator` trait, so tests substitute a canned
//! generator and the CLI substitutes a real provider resolved from the
//! environment. All prompt engineering lives in [`crate::prompts`]; this
//! module only ships a prompt string out and a text blob back.

use crate::config::PipelineConfig;
use crate::error::DeckGenError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::sync::Arc;
use tracing::{debug, warn};

/// Model used when neither config nor environment names one.
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// Minimal text-generation capability the pipelines need.
///
/// One prompt in, one completion out. Anything conversational, streamed,
/// or multimodal is out of scope for this crate.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Send a prompt and return the model's trimmed completion text.
    async fn generate(&self, prompt: &str) -> Result<String, DeckGenError>;
}

/// [`TextGenerator`] backed by an edgequake-llm provider.
pub struct ProviderGenerator {
    provider: Arc<dyn LLMProvider>,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, temperature: f32, max_tokens: usize) -> Self {
        Self {
            provider,
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl TextGenerator for ProviderGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, DeckGenError> {
        debug!("Calling LLM, prompt length {} chars", prompt.len());

        let messages = vec![ChatMessage::user(prompt)];
        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                warn!("LLM call failed: {}", e);
                DeckGenError::LlmApiError {
                    message: e.to_string(),
                }
            })?;

        debug!(
            "LLM responded: {} input tokens, {} output tokens",
            response.prompt_tokens, response.completion_tokens
        );

        let content = response.content.trim().to_string();
        if content.is_empty() {
            return Err(DeckGenError::EmptyLlmResponse);
        }
        Ok(content)
    }
}

/// Instantiate a named provider with the given model.
fn create_provider(
    provider_name: &str,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, DeckGenError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        DeckGenError::ProviderNotConfigured {
            hint: format!("provider '{provider_name}': {e}"),
        }
    })
}

/// Resolve the text generator, from most-specific to least-specific.
///
/// The fallback chain lets library users and CLI users each set exactly
/// as much or as little as they need:
///
/// 1. **Pre-built generator** (`config.generator`) — used as-is. This is
///    how tests inject doubles.
///
/// 2. **Named provider + model** (`config.provider_name`) — the factory
///    reads the corresponding API key from the environment.
///
/// 3. **Environment pair** (`DECKGEN_LLM_PROVIDER` + `DECKGEN_MODEL`) —
///    a provider/model choice made at the execution-environment level.
///
/// 4. **Gemini key** (`GEMINI_API_KEY`) — the default deployment uses
///    Gemini, so an explicit Gemini key wins over full auto-detection
///    when multiple keys are present.
///
/// 5. **Full auto-detection** (`ProviderFactory::from_env`) — the factory
///    scans all known API key variables and picks the first available.
pub fn resolve_generator(config: &PipelineConfig) -> Result<Arc<dyn TextGenerator>, DeckGenError> {
    if let Some(ref generator) = config.generator {
        return Ok(Arc::clone(generator));
    }

    let model = config.model.as_deref().unwrap_or(DEFAULT_MODEL);

    if let Some(ref name) = config.provider_name {
        let provider = create_provider(name, model)?;
        return Ok(Arc::new(ProviderGenerator::new(
            provider,
            config.temperature,
            config.max_tokens,
        )));
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("DECKGEN_LLM_PROVIDER"),
        std::env::var("DECKGEN_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let provider = create_provider(&prov, &env_model)?;
            return Ok(Arc::new(ProviderGenerator::new(
                provider,
                config.temperature,
                config.max_tokens,
            )));
        }
    }

    if let Ok(key) = std::env::var("GEMINI_API_KEY") {
        if !key.is_empty() {
            let provider = create_provider("gemini", model)?;
            return Ok(Arc::new(ProviderGenerator::new(
                provider,
                config.temperature,
                config.max_tokens,
            )));
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| DeckGenError::ProviderNotConfigured {
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderGenerator::new(
        provider,
        config.temperature,
        config.max_tokens,
    )))
}
