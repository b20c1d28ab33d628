//! Configuration for the deckgen pipelines.
//!
//! All pipeline behaviour is controlled through [`PipelineConfig`], built
//! via its [`PipelineConfigBuilder`]. Keeping every knob in one struct
//! makes it trivial to share a config across pipelines and to substitute
//! the external collaborators (LLM, image index, file host) with test
//! doubles — each one is an `Option<Arc<dyn …>>` that, when `None`, is
//! resolved from the environment at run time.
//!
//! # Design choice: builder over constructor
//! A fifteen-field constructor is unreadable and breaks on every new
//! field. The builder lets callers set only what they care about and
//! rely on documented defaults for the rest.

use crate::error::DeckGenError;
use crate::pipeline::images::SlideImageFetcher;
use crate::pipeline::llm::TextGenerator;
use crate::pipeline::upload::FileHost;
use crate::progress::ProgressCallback;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Configuration for presentation, evaluation, and notes runs.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use deckgen::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .model("gemini-2.0-flash")
///     .jpeg_quality(90)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// LLM model identifier. If None, defaults to `gemini-2.0-flash`.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    /// If None along with `generator`, the provider is auto-detected
    /// from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed text generator. Takes precedence over
    /// `provider_name`. This is the substitution point for tests.
    pub generator: Option<Arc<dyn TextGenerator>>,

    /// Sampling temperature for the LLM completion. Default: 0.3.
    ///
    /// Structured JSON output wants low-but-nonzero temperature: zero
    /// makes some models repeat example text from the prompt verbatim.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per call. Default: 4096.
    pub max_tokens: usize,

    /// Image fetcher. If None, a Wikimedia Commons fetcher is built with
    /// this config's timeouts. This is the substitution point for tests.
    pub image_fetcher: Option<Arc<dyn SlideImageFetcher>>,

    /// File host for the finished deck. If None, a Cloudinary host is
    /// built from `CLOUDINARY_CLOUD_NAME` / `CLOUDINARY_UPLOAD_PRESET`.
    pub file_host: Option<Arc<dyn FileHost>>,

    /// Timeout for image search/metadata requests in seconds. Default: 10.
    pub search_timeout_secs: u64,

    /// Timeout for image downloads in seconds. Default: 15.
    pub download_timeout_secs: u64,

    /// Download attempts per image before giving up. Default: 3.
    pub image_max_attempts: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 1000.
    ///
    /// Doubles after each failed attempt: 1 s → 2 s. Image hosts
    /// intermittently return error pages under an `image/*` content type
    /// with HTTP 200; a short backoff clears most of those.
    pub image_retry_backoff_ms: u64,

    /// JPEG quality for saved slide images, 1–100. Default: 95.
    pub jpeg_quality: u8,

    /// Directory where the .pptx is written before upload. Default: /tmp.
    pub output_dir: PathBuf,

    /// Remote folder name on the file host. Default: "presentations".
    pub upload_folder: String,

    /// Delay before the uploaded deck is deleted remotely, in seconds.
    /// Default: 300 (five minutes — temp-hosting pattern).
    pub auto_delete_delay_secs: u64,

    /// SQLite database file for evaluation and notes results.
    /// Default: `deckgen.db` in the working directory.
    pub database_path: PathBuf,

    /// User-Agent sent to the image index, which requires one.
    pub user_agent: String,

    /// Per-slide progress events. Default: none.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            generator: None,
            temperature: 0.3,
            max_tokens: 4096,
            image_fetcher: None,
            file_host: None,
            search_timeout_secs: 10,
            download_timeout_secs: 15,
            image_max_attempts: 3,
            image_retry_backoff_ms: 1000,
            jpeg_quality: 95,
            output_dir: PathBuf::from("/tmp"),
            upload_folder: "presentations".to_string(),
            auto_delete_delay_secs: 300,
            database_path: PathBuf::from("deckgen.db"),
            user_agent: "DeckGenBot/1.0 (https://sugardevs.in/)".to_string(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("generator", &self.generator.as_ref().map(|_| "<dyn TextGenerator>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("image_fetcher", &self.image_fetcher.as_ref().map(|_| "<dyn SlideImageFetcher>"))
            .field("file_host", &self.file_host.as_ref().map(|_| "<dyn FileHost>"))
            .field("image_max_attempts", &self.image_max_attempts)
            .field("image_retry_backoff_ms", &self.image_retry_backoff_ms)
            .field("jpeg_quality", &self.jpeg_quality)
            .field("output_dir", &self.output_dir)
            .field("upload_folder", &self.upload_folder)
            .field("auto_delete_delay_secs", &self.auto_delete_delay_secs)
            .field("database_path", &self.database_path)
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
#[derive(Debug)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.config.generator = Some(generator);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn image_fetcher(mut self, fetcher: Arc<dyn SlideImageFetcher>) -> Self {
        self.config.image_fetcher = Some(fetcher);
        self
    }

    pub fn file_host(mut self, host: Arc<dyn FileHost>) -> Self {
        self.config.file_host = Some(host);
        self
    }

    pub fn search_timeout_secs(mut self, secs: u64) -> Self {
        self.config.search_timeout_secs = secs.max(1);
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs.max(1);
        self
    }

    pub fn image_max_attempts(mut self, n: u32) -> Self {
        self.config.image_max_attempts = n.max(1);
        self
    }

    pub fn image_retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.image_retry_backoff_ms = ms;
        self
    }

    pub fn jpeg_quality(mut self, q: u8) -> Self {
        self.config.jpeg_quality = q.clamp(1, 100);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.config.output_dir = dir.into();
        self
    }

    pub fn upload_folder(mut self, folder: impl Into<String>) -> Self {
        self.config.upload_folder = folder.into();
        self
    }

    pub fn auto_delete_delay_secs(mut self, secs: u64) -> Self {
        self.config.auto_delete_delay_secs = secs;
        self
    }

    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.database_path = path.into();
        self
    }

    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.config.user_agent = ua.into();
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, DeckGenError> {
        let c = &self.config;
        if c.image_max_attempts == 0 {
            return Err(DeckGenError::InvalidConfig(
                "image_max_attempts must be ≥ 1".into(),
            ));
        }
        if c.jpeg_quality == 0 || c.jpeg_quality > 100 {
            return Err(DeckGenError::InvalidConfig(format!(
                "jpeg_quality must be 1–100, got {}",
                c.jpeg_quality
            )));
        }
        if c.upload_folder.is_empty() {
            return Err(DeckGenError::InvalidConfig(
                "upload_folder must not be empty".into(),
            ));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let config = PipelineConfig::builder().build().unwrap();
        assert_eq!(config.image_max_attempts, 3);
        assert_eq!(config.image_retry_backoff_ms, 1000);
        assert_eq!(config.jpeg_quality, 95);
        assert_eq!(config.auto_delete_delay_secs, 300);
    }

    #[test]
    fn builder_clamps_out_of_range_values() {
        let config = PipelineConfig::builder()
            .temperature(5.0)
            .jpeg_quality(200)
            .image_max_attempts(0)
            .build()
            .unwrap();
        assert_eq!(config.temperature, 2.0);
        assert_eq!(config.jpeg_quality, 100);
        assert_eq!(config.image_max_attempts, 1);
    }

    #[test]
    fn empty_upload_folder_is_rejected() {
        let err = PipelineConfig::builder()
            .upload_folder("")
            .build()
            .unwrap_err();
        assert!(matches!(err, DeckGenError::InvalidConfig(_)));
    }
}
