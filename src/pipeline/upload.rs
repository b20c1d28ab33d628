//! File hosting: upload the finished deck and schedule its deletion.
//!
//! The deck is temp-hosted: the caller gets a shareable URL and the file
//! is deleted from the host a few minutes later. The [`FileHost`] trait
//! is the seam — the presentation pipeline depends on it, the default
//! implementation talks to Cloudinary, and tests substitute an in-memory
//! host.
//!
//! ## Scheduled deletion
//!
//! Deletion runs as a spawned task that sleeps for the configured delay
//! and then calls [`FileHost::delete`]. The task's [`DeletionHandle`] is
//! returned to the caller rather than dropped: the pipeline itself never
//! awaits it (the URL is returned immediately), but the caller can await
//! or abort it, and tests can make the delay deterministic. If the
//! process exits before the delay elapses the remote file outlives its
//! welcome — accepted for the temp-hosting pattern.

use crate::config::PipelineConfig;
use crate::error::DeckGenError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info};

/// Handle to the spawned deletion task. Resolves to `true` when the
/// remote file was deleted.
pub type DeletionHandle = tokio::task::JoinHandle<bool>;

/// What the host knows about an uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRecord {
    pub secure_url: String,
    pub public_id: String,
    /// Token authorising deletion without API credentials. Present only
    /// for hosts that issue one at upload time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delete_token: Option<String>,
}

/// A remote store for finished decks.
#[async_trait]
pub trait FileHost: Send + Sync {
    /// Upload a local file, optionally under a caller-chosen identifier.
    async fn upload(
        &self,
        local_path: &Path,
        public_id: Option<&str>,
    ) -> Result<UploadRecord, DeckGenError>;

    /// Remove a previously uploaded file.
    async fn delete(&self, record: &UploadRecord) -> Result<(), DeckGenError>;
}

/// Spawn the delayed deletion task for an uploaded file.
pub fn schedule_deletion(
    host: Arc<dyn FileHost>,
    record: UploadRecord,
    delay: Duration,
) -> DeletionHandle {
    tokio::spawn(async move {
        sleep(delay).await;
        match host.delete(&record).await {
            Ok(()) => {
                info!("Successfully deleted file: {}", record.public_id);
                true
            }
            Err(e) => {
                error!(
                    "Error during scheduled deletion of {}: {}",
                    record.public_id, e
                );
                false
            }
        }
    })
}

// ── Cloudinary implementation ────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct CloudinaryUploadResponse {
    #[serde(default)]
    secure_url: String,
    #[serde(default)]
    public_id: String,
    #[serde(default)]
    delete_token: Option<String>,
}

/// [`FileHost`] backed by Cloudinary's unsigned raw-upload API.
///
/// Unsigned uploads need no request signing; deletion uses the
/// short-lived delete token issued in the upload response, which
/// comfortably covers the five-minute hosting window.
pub struct CloudinaryHost {
    client: reqwest::Client,
    cloud_name: String,
    upload_preset: String,
    folder: String,
}

impl CloudinaryHost {
    /// Build a host from `CLOUDINARY_CLOUD_NAME` and
    /// `CLOUDINARY_UPLOAD_PRESET` plus the configured folder.
    pub fn from_env(config: &PipelineConfig) -> Result<Self, DeckGenError> {
        let cloud_name = require_env("CLOUDINARY_CLOUD_NAME")?;
        let upload_preset = require_env("CLOUDINARY_UPLOAD_PRESET")?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DeckGenError::Internal(format!("http client: {e}")))?;

        Ok(Self {
            client,
            cloud_name,
            upload_preset,
            folder: config.upload_folder.clone(),
        })
    }
}

fn require_env(name: &str) -> Result<String, DeckGenError> {
    match std::env::var(name) {
        Ok(v) if !v.is_empty() => Ok(v),
        _ => Err(DeckGenError::InvalidConfig(format!("{name} is not set"))),
    }
}

#[async_trait]
impl FileHost for CloudinaryHost {
    async fn upload(
        &self,
        local_path: &Path,
        public_id: Option<&str>,
    ) -> Result<UploadRecord, DeckGenError> {
        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/raw/upload",
            self.cloud_name
        );

        let bytes = tokio::fs::read(local_path)
            .await
            .map_err(|e| DeckGenError::UploadFailed {
                reason: format!("read {}: {e}", local_path.display()),
            })?;

        let file_name = local_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("presentation.pptx")
            .to_string();

        let mut form = reqwest::multipart::Form::new()
            .part(
                "file",
                reqwest::multipart::Part::bytes(bytes).file_name(file_name),
            )
            .text("upload_preset", self.upload_preset.clone())
            .text("folder", self.folder.clone())
            .text("return_delete_token", "1");
        if let Some(id) = public_id {
            form = form.text("public_id", id.to_string());
        }

        let response = self
            .client
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| DeckGenError::UploadFailed {
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeckGenError::UploadFailed {
                reason: format!("HTTP {status}: {body}"),
            });
        }

        let parsed: CloudinaryUploadResponse =
            response
                .json()
                .await
                .map_err(|e| DeckGenError::UploadFailed {
                    reason: format!("bad upload response: {e}"),
                })?;

        if parsed.secure_url.is_empty() || parsed.public_id.is_empty() {
            return Err(DeckGenError::UploadFailed {
                reason: "upload response missing secure_url or public_id".into(),
            });
        }

        info!("Uploaded {} as {}", local_path.display(), parsed.public_id);

        Ok(UploadRecord {
            secure_url: parsed.secure_url,
            public_id: parsed.public_id,
            delete_token: parsed.delete_token,
        })
    }

    async fn delete(&self, record: &UploadRecord) -> Result<(), DeckGenError> {
        let token = record
            .delete_token
            .as_deref()
            .ok_or_else(|| DeckGenError::UploadFailed {
                reason: format!("no delete token for {}", record.public_id),
            })?;

        let url = format!(
            "https://api.cloudinary.com/v1_1/{}/delete_by_token",
            self.cloud_name
        );

        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({ "token": token }))
            .send()
            .await
            .map_err(|e| DeckGenError::UploadFailed {
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DeckGenError::UploadFailed {
                reason: format!("delete_by_token returned HTTP {}", response.status()),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RecordingHost {
        deletes: AtomicUsize,
        fail_delete: bool,
    }

    #[async_trait]
    impl FileHost for RecordingHost {
        async fn upload(
            &self,
            _local_path: &Path,
            public_id: Option<&str>,
        ) -> Result<UploadRecord, DeckGenError> {
            Ok(UploadRecord {
                secure_url: "https://host.test/deck".into(),
                public_id: public_id.unwrap_or("anon").to_string(),
                delete_token: Some("tok".into()),
            })
        }

        async fn delete(&self, _record: &UploadRecord) -> Result<(), DeckGenError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                Err(DeckGenError::UploadFailed {
                    reason: "boom".into(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[tokio::test]
    async fn scheduled_deletion_fires_after_delay() {
        let host = Arc::new(RecordingHost {
            deletes: AtomicUsize::new(0),
            fail_delete: false,
        });
        let record = host.upload(Path::new("/tmp/x.pptx"), Some("x")).await.unwrap();

        let handle = schedule_deletion(
            Arc::clone(&host) as Arc<dyn FileHost>,
            record,
            Duration::from_millis(10),
        );

        assert!(handle.await.unwrap(), "deletion should report success");
        assert_eq!(host.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn scheduled_deletion_reports_failure() {
        let host = Arc::new(RecordingHost {
            deletes: AtomicUsize::new(0),
            fail_delete: true,
        });
        let record = host.upload(Path::new("/tmp/x.pptx"), None).await.unwrap();

        let handle = schedule_deletion(
            Arc::clone(&host) as Arc<dyn FileHost>,
            record,
            Duration::from_millis(1),
        );

        assert!(!handle.await.unwrap());
        assert_eq!(host.deletes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn deletion_can_be_aborted() {
        let host = Arc::new(RecordingHost {
            deletes: AtomicUsize::new(0),
            fail_delete: false,
        });
        let record = host.upload(Path::new("/tmp/x.pptx"), None).await.unwrap();

        let handle = schedule_deletion(
            Arc::clone(&host) as Arc<dyn FileHost>,
            record,
            Duration::from_secs(3600),
        );
        handle.abort();

        assert!(handle.await.is_err(), "aborted task yields JoinError");
        assert_eq!(host.deletes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn upload_record_omits_absent_token() {
        let record = UploadRecord {
            secure_url: "https://host.test/d".into(),
            public_id: "d".into(),
            delete_token: None,
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("delete_token"));
    }
}
