//! Forwards recognized labels to the downstream audio backend.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::Mutex;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("HTTP {status}: {message}")]
    Response { status: u16, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyOutcome {
    /// Below threshold or same label as the last successful post.
    Skipped,
    Sent { audio_url: Option<String> },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAudio<'a> {
    text: &'a str,
    user_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAudioReply {
    #[serde(default)]
    audio_url: Option<String>,
}

/// Posts each new high-confidence label once.
///
/// The last posted label only advances after a successful post, so a label
/// whose post failed is offered again on the next prediction. At most one
/// offered post is pending at a time; offers made meanwhile are dropped.
#[derive(Debug)]
pub struct Notifier {
    client: Client,
    url: String,
    user_id: String,
    threshold: f32,
    last_posted: Mutex<Option<String>>,
    posting: AtomicBool,
}

impl Notifier {
    pub fn new(
        url: impl Into<String>,
        user_id: impl Into<String>,
        threshold: f32,
        timeout: Duration,
    ) -> Result<Self, NotifyError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| NotifyError::Request(e.to_string()))?;
        Ok(Self {
            client,
            url: url.into(),
            user_id: user_id.into(),
            threshold,
            last_posted: Mutex::new(None),
            posting: AtomicBool::new(false),
        })
    }

    pub async fn notify(&self, label: &str, confidence: f32) -> Result<NotifyOutcome, NotifyError> {
        if confidence < self.threshold {
            return Ok(NotifyOutcome::Skipped);
        }

        // held across the post so concurrent offers of one label post once
        let mut last_posted = self.last_posted.lock().await;
        if last_posted.as_deref() == Some(label) {
            return Ok(NotifyOutcome::Skipped);
        }

        let response = self
            .client
            .post(&self.url)
            .json(&GenerateAudio {
                text: label,
                user_id: &self.user_id,
            })
            .send()
            .await
            .map_err(|e| NotifyError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Response {
                status: status.as_u16(),
                message,
            });
        }

        let reply: GenerateAudioReply = response
            .json()
            .await
            .unwrap_or(GenerateAudioReply { audio_url: None });
        *last_posted = Some(label.to_string());

        tracing::info!(label, audio_url = ?reply.audio_url, "label forwarded");
        Ok(NotifyOutcome::Sent {
            audio_url: reply.audio_url,
        })
    }

    /// Fire-and-forget variant for the capture loop.
    ///
    /// Returns `false` when the offer was dropped, either below threshold or
    /// because an earlier post has not finished yet.
    pub fn offer(self: &Arc<Self>, label: String, confidence: f32) -> bool {
        if confidence < self.threshold {
            return false;
        }
        if self.posting.swap(true, Ordering::AcqRel) {
            tracing::debug!(label, "label post still pending, dropping offer");
            return false;
        }

        let notifier = self.clone();
        tokio::spawn(async move {
            if let Err(e) = notifier.notify(&label, confidence).await {
                tracing::warn!(label, "failed to forward label: {}", e);
            }
            notifier.posting.store(false, Ordering::Release);
        });
        true
    }

    pub fn is_posting(&self) -> bool {
        self.posting.load(Ordering::Acquire)
    }
}
