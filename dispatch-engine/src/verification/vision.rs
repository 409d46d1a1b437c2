//! Vision client - HTTP adapter for the OCR / vision model
//!
//! Speaks the OpenAI-compatible chat-completions protocol with the image
//! inlined as a base64 data URL.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use shared::order::Attachment;
use std::time::Duration;
use thiserror::Error;

use crate::core::VisionConfig;

/// Vision service failure. Never a match verdict.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("vision service returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("vision service quota exhausted")]
    QuotaExceeded,

    #[error("vision service timed out")]
    Timeout,

    #[error("vision request failed: {0}")]
    Transport(String),

    #[error("unexpected vision response: {0}")]
    InvalidResponse(String),

    #[error("image payload is not valid base64")]
    InvalidImage,

    #[error("vision service not configured (missing API key)")]
    NotConfigured,
}

impl From<reqwest::Error> for VisionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            VisionError::Timeout
        } else {
            VisionError::Transport(err.to_string())
        }
    }
}

/// Recognize text in an image
#[async_trait]
pub trait VisionClient: Send + Sync {
    /// Raw model answer for `prompt` about `image`
    async fn recognize(&self, image: &Attachment, prompt: &str) -> Result<String, VisionError>;
}

/// reqwest-based [`VisionClient`]
pub struct HttpVisionClient {
    client: Client,
    config: VisionConfig,
}

impl HttpVisionClient {
    pub fn new(config: VisionConfig) -> Result<Self, VisionError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| VisionError::Transport(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn request_body(&self, image: &Attachment, prompt: &str) -> Value {
        json!({
            "model": self.config.model,
            "temperature": 0,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "image_url", "image_url": { "url": image.to_data_url() } },
                    { "type": "text", "text": prompt }
                ]
            }]
        })
    }
}

#[async_trait]
impl VisionClient for HttpVisionClient {
    async fn recognize(&self, image: &Attachment, prompt: &str) -> Result<String, VisionError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(VisionError::NotConfigured)?;

        if image.data.is_empty() || STANDARD.decode(image.data.as_bytes()).is_err() {
            return Err(VisionError::InvalidImage);
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(api_key)
            .json(&self.request_body(image, prompt))
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(VisionError::QuotaExceeded);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| VisionError::InvalidResponse(e.to_string()))?;
        message_content(&body)
    }
}

/// `choices[0].message.content`, as text
fn message_content(body: &Value) -> Result<String, VisionError> {
    let content = body
        .pointer("/choices/0/message/content")
        .ok_or_else(|| VisionError::InvalidResponse("missing choices[0].message.content".into()))?;

    match content {
        Value::String(text) => Ok(text.clone()),
        // 部分兼容接口返回分段内容
        Value::Array(parts) => Ok(parts
            .iter()
            .filter_map(|p| p.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n")),
        other => Err(VisionError::InvalidResponse(format!(
            "content is not text: {other}"
        ))),
    }
}
