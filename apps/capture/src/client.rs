//! HTTP client for the prediction server.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Prediction {
    pub label: String,
    pub confidence: f32,
    #[serde(default)]
    pub scores: HashMap<String, f32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    pub status: String,
    pub model_loaded: bool,
    #[serde(default)]
    pub model_path: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Transport(String),
    #[error("Request timed out")]
    Timeout,
    #[error("HTTP {status}: {message}")]
    Response {
        status: u16,
        code: Option<String>,
        message: String,
    },
    #[error("Parse error: {0}")]
    Parse(String),
}

impl ClientError {
    /// Connection failures and timeouts; the next capture tick may retry.
    pub fn is_transient(&self) -> bool {
        matches!(self, ClientError::Transport(_) | ClientError::Timeout)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout
        } else if err.is_decode() {
            ClientError::Parse(err.to_string())
        } else {
            ClientError::Transport(err.to_string())
        }
    }
}

/// The calls a capture session makes against the prediction server.
#[async_trait]
pub trait PredictionService: Send + Sync {
    async fn health(&self) -> Result<Health, ClientError>;

    async fn predict(&self, landmarks: Vec<f32>) -> Result<Prediction, ClientError>;
}

#[derive(Serialize)]
struct PredictRequest<'a> {
    landmarks: &'a [f32],
}

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl PredictionService for ApiClient {
    async fn health(&self) -> Result<Health, ClientError> {
        let url = format!("{}/health", self.base_url);
        let response = self.client.get(&url).send().await?;
        parse(response).await
    }

    async fn predict(&self, landmarks: Vec<f32>) -> Result<Prediction, ClientError> {
        let url = format!("{}/predict", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PredictRequest {
                landmarks: &landmarks,
            })
            .send()
            .await?;
        parse(response).await
    }
}

async fn parse<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return response.json().await.map_err(|e| ClientError::Parse(e.to_string()));
    }

    let text = response.text().await.unwrap_or_default();
    let (code, message) = error_detail(&text);
    Err(ClientError::Response {
        status: status.as_u16(),
        code,
        message: message.unwrap_or(text),
    })
}

/// Reads `{"error": {"code", "message"}}`, tolerating a bare `{"error": "..."}`.
fn error_detail(text: &str) -> (Option<String>, Option<String>) {
    let Ok(body) = serde_json::from_str::<serde_json::Value>(text) else {
        return (None, None);
    };
    match &body["error"] {
        serde_json::Value::String(message) => (None, Some(message.clone())),
        serde_json::Value::Object(error) => (
            error.get("code").and_then(|c| c.as_str()).map(str::to_string),
            error
                .get("message")
                .and_then(|m| m.as_str())
                .map(str::to_string),
        ),
        _ => (None, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_structured_errors() {
        let (code, message) =
            error_detail(r#"{"error":{"code":"INVALID_LENGTH","message":"Invalid landmark length"}}"#);
        assert_eq!(code.as_deref(), Some("INVALID_LENGTH"));
        assert_eq!(message.as_deref(), Some("Invalid landmark length"));
    }

    #[test]
    fn extracts_flat_errors() {
        let (code, message) = error_detail(r#"{"error":"Not Found"}"#);
        assert_eq!(code, None);
        assert_eq!(message.as_deref(), Some("Not Found"));
        assert_eq!(error_detail("<html>"), (None, None));
    }

    #[test]
    fn transient_errors() {
        assert!(ClientError::Timeout.is_transient());
        assert!(ClientError::Transport("refused".into()).is_transient());
        assert!(
            !ClientError::Response {
                status: 400,
                code: None,
                message: String::new()
            }
            .is_transient()
        );
    }

    #[test]
    fn trims_trailing_slash() {
        let client = ApiClient::new("http://127.0.0.1:8000/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:8000");
    }
}
