use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use serde::{Deserialize, Serialize};

use crate::source::error::SourceError;

pub const DEFAULT_VISION_ENDPOINT: &str = "http://localhost:11434/api/generate";
pub const DEFAULT_VISION_MODEL: &str = "llava:7b";
pub const DEFAULT_VISION_TIMEOUT_SECS: u64 = 120;

/// Vision-capable model that answers a prompt about one image.
pub trait VisionInference {
    fn describe_image(&self, image: &[u8], prompt: &str) -> Result<String, SourceError>;
}

// ============================================================================
// Ollama Backend
// ============================================================================

pub struct OllamaVision {
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

#[derive(Serialize)]
struct OllamaVisionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    images: Vec<String>,
    stream: bool,
    format: &'static str,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaVision {
    pub fn new(endpoint: &str, model: &str, timeout_secs: u64) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            timeout: Duration::from_secs(timeout_secs),
        }
    }
}

impl VisionInference for OllamaVision {
    fn describe_image(&self, image: &[u8], prompt: &str) -> Result<String, SourceError> {
        let request = OllamaVisionRequest {
            model: &self.model,
            prompt,
            images: vec![BASE64_STANDARD.encode(image)],
            stream: false,
            format: "json",
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;
        let response = client.post(&self.endpoint).json(&request).send()?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(SourceError::VisionStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: OllamaResponse = response
            .json()
            .map_err(|e| SourceError::VisionPayload(e.to_string()))?;
        Ok(envelope.response)
    }
}

// ============================================================================
// Mock Backend (for testing without a vision service)
// ============================================================================

pub enum MockVision {
    /// Answer every image with this text.
    Respond(String),
    /// Fail every call as if the service were unreachable.
    Unavailable,
}

impl VisionInference for MockVision {
    fn describe_image(&self, _image: &[u8], _prompt: &str) -> Result<String, SourceError> {
        match self {
            MockVision::Respond(text) => Ok(text.clone()),
            MockVision::Unavailable => Err(SourceError::VisionPayload(
                "mock vision service unavailable".into(),
            )),
        }
    }
}
