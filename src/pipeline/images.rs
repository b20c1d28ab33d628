//! Image fetching: free-text query → validated JPEG on disk.
//!
//! The fetcher runs against the Wikimedia Commons API, whose shape
//! dictates the two-phase flow: a keyword search in the File namespace
//! returns page *titles*, and a second metadata request resolves a title
//! to a direct download URL.
//!
//! ## Retry Strategy
//!
//! Image hosts intermittently return error pages with HTTP 200 and an
//! `image/*` content type, so every attempt validates status, content
//! type, and — by decoding — the actual bytes. Failed attempts back off
//! exponentially (`backoff_ms * 2^attempt`): with the 1 s default the
//! wait sequence between attempts is 1 s → 2 s.

use crate::config::PipelineConfig;
use crate::error::DeckGenError;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

const COMMONS_API: &str = "https://commons.wikimedia.org/w/api.php";

/// Content types that pass the `image/` prefix check but cannot be
/// rasterised into a slide picture.
const UNSUPPORTED_TYPES: [&str; 2] = ["image/svg+xml", "image/gif"];

/// Resolves a short query to one image file on disk.
///
/// The presentation pipeline depends on this trait, not on the concrete
/// Wikimedia client, so tests substitute a fetcher that writes a fixture.
#[async_trait]
pub trait SlideImageFetcher: Send + Sync {
    /// Fetch the best image for `query` and save it as a JPEG at `dest`.
    async fn fetch(&self, query: &str, dest: &Path) -> Result<(), DeckGenError>;
}

// ── Wikimedia API response shapes ────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    query: Option<SearchQuery>,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default)]
    query: Option<InfoQuery>,
}

#[derive(Debug, Deserialize)]
struct InfoQuery {
    #[serde(default)]
    pages: HashMap<String, InfoPage>,
}

#[derive(Debug, Deserialize)]
struct InfoPage {
    #[serde(default)]
    imageinfo: Vec<ImageInfo>,
}

#[derive(Debug, Deserialize)]
struct ImageInfo {
    #[serde(default)]
    url: Option<String>,
}

// ── Fetcher ──────────────────────────────────────────────────────────────

/// [`SlideImageFetcher`] backed by the Wikimedia Commons search API.
pub struct WikimediaFetcher {
    client: reqwest::Client,
    download_timeout: Duration,
    max_attempts: u32,
    backoff_ms: u64,
    jpeg_quality: u8,
}

impl WikimediaFetcher {
    /// Build a fetcher from the pipeline config's timeouts and quality.
    ///
    /// The Commons API rejects requests without a User-Agent, so the
    /// client always sends the configured one.
    pub fn from_config(config: &PipelineConfig) -> Result<Self, DeckGenError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(Duration::from_secs(config.search_timeout_secs))
            .build()
            .map_err(|e| DeckGenError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            client,
            download_timeout: Duration::from_secs(config.download_timeout_secs),
            max_attempts: config.image_max_attempts,
            backoff_ms: config.image_retry_backoff_ms,
            jpeg_quality: config.jpeg_quality,
        })
    }

    /// Phase 1: search the File namespace for bitmap hits, take the first.
    async fn search_title(&self, query: &str) -> Result<String, DeckGenError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("list", "search"),
            ("srsearch", &format!("{query} filetype:bitmap")),
            ("srlimit", "1"),
            ("srnamespace", "6"),
        ];

        let response = self
            .client
            .get(COMMONS_API)
            .query(&params)
            .send()
            .await
            .map_err(|e| DeckGenError::SearchFailed {
                query: query.to_string(),
                reason: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| DeckGenError::SearchFailed {
                query: query.to_string(),
                reason: e.to_string(),
            })?;

        let body: SearchResponse =
            response
                .json()
                .await
                .map_err(|e| DeckGenError::SearchFailed {
                    query: query.to_string(),
                    reason: e.to_string(),
                })?;

        body.query
            .and_then(|q| q.search.into_iter().next())
            .map(|hit| hit.title)
            .ok_or_else(|| DeckGenError::NoImageFound {
                query: query.to_string(),
            })
    }

    /// Phase 2: resolve a file title to its direct download URL.
    async fn resolve_url(&self, title: &str) -> Result<String, DeckGenError> {
        let params = [
            ("action", "query"),
            ("format", "json"),
            ("prop", "imageinfo"),
            ("titles", title),
            ("iiprop", "url"),
        ];

        let response = self
            .client
            .get(COMMONS_API)
            .query(&params)
            .send()
            .await
            .map_err(|e| DeckGenError::SearchFailed {
                query: title.to_string(),
                reason: e.to_string(),
            })?
            .error_for_status()
            .map_err(|e| DeckGenError::SearchFailed {
                query: title.to_string(),
                reason: e.to_string(),
            })?;

        let body: InfoResponse = response
            .json()
            .await
            .map_err(|e| DeckGenError::SearchFailed {
                query: title.to_string(),
                reason: e.to_string(),
            })?;

        body.query
            .and_then(|q| q.pages.into_values().next())
            .and_then(|page| page.imageinfo.into_iter().next())
            .and_then(|info| info.url)
            .ok_or_else(|| DeckGenError::NoImageInfo {
                title: title.to_string(),
            })
    }

    /// One download attempt: fetch, validate headers, decode, save.
    ///
    /// Errors are strings because every failure mode here is retryable
    /// and only the last one's description matters.
    async fn attempt_download(&self, url: &str, dest: &Path) -> Result<(), String> {
        let response = self
            .client
            .get(url)
            .timeout(self.download_timeout)
            .send()
            .await
            .map_err(|e| format!("request failed: {e}"))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        validate_content_type(&content_type)?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("body read failed: {e}"))?;

        save_jpeg(&bytes, dest, self.jpeg_quality)
    }
}

#[async_trait]
impl SlideImageFetcher for WikimediaFetcher {
    async fn fetch(&self, query: &str, dest: &Path) -> Result<(), DeckGenError> {
        let title = self.search_title(query).await?;
        debug!("Query '{}' resolved to '{}'", query, title);

        let url = self.resolve_url(&title).await?;

        let succeeded = with_retry(self.max_attempts, self.backoff_ms, |_attempt| {
            self.attempt_download(&url, dest)
        })
        .await;

        if !succeeded {
            return Err(DeckGenError::ImageDownloadFailed {
                query: query.to_string(),
                attempts: self.max_attempts,
            });
        }

        info!("Image saved: {}", dest.display());
        Ok(())
    }
}

// ── Helpers ──────────────────────────────────────────────────────────────

/// Reject content types that are not downloadable bitmap images.
fn validate_content_type(content_type: &str) -> Result<(), String> {
    if !content_type.starts_with("image/") {
        return Err(format!("Invalid content type: {content_type}"));
    }
    if UNSUPPORTED_TYPES.contains(&content_type) {
        return Err(format!("Unsupported image format: {content_type}"));
    }
    Ok(())
}

/// Decode the downloaded bytes and persist them as an RGB JPEG.
///
/// Decoding doubles as the integrity check: truncated or non-image bytes
/// fail here and count as a failed attempt.
fn save_jpeg(bytes: &[u8], dest: &Path, quality: u8) -> Result<(), String> {
    let decoded = image::load_from_memory(bytes).map_err(|e| format!("decode failed: {e}"))?;
    let rgb = decoded.to_rgb8();

    let mut file = std::fs::File::create(dest).map_err(|e| format!("create failed: {e}"))?;
    let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(&mut file, quality);
    encoder
        .encode_image(&rgb)
        .map_err(|e| format!("jpeg encode failed: {e}"))
}

/// Run `attempt` up to `max_attempts` times with exponential backoff
/// between failures. Returns whether any attempt succeeded.
///
/// Generic over the attempt closure so the retry discipline is testable
/// without a network.
pub(crate) async fn with_retry<F, Fut>(max_attempts: u32, backoff_ms: u64, mut attempt: F) -> bool
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<(), String>>,
{
    for i in 0..max_attempts {
        match attempt(i).await {
            Ok(()) => return true,
            Err(e) => {
                warn!("[Attempt {}/{}] Download failed: {}", i + 1, max_attempts, e);
                if i + 1 < max_attempts {
                    sleep(Duration::from_millis(backoff_ms << i)).await;
                }
            }
        }
    }
    false
}
