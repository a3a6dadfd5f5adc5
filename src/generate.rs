//! HTTP binding to the text-generation endpoint.
//!
//! `POST {base_url}/generate` with `{ prompt, max_length, temperature }`,
//! answered by a JSON object holding a string `response` field.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_MAX_LENGTH: u32 = 1000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Tunables sent with every prompt. Only constructed through
/// [`GenerationOptions::new`], so values on the wire are always in range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    max_length: u32,
    temperature: f32,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum OptionsError {
    #[error("max_length must be greater than 0")]
    MaxLength,

    #[error("temperature must be between 0 and 1, got {0}")]
    Temperature(f32),
}

impl GenerationOptions {
    pub fn new(max_length: u32, temperature: f32) -> Result<Self, OptionsError> {
        if max_length == 0 {
            return Err(OptionsError::MaxLength);
        }
        // NaN fails the range check too
        if !(0.0..=1.0).contains(&temperature) {
            return Err(OptionsError::Temperature(temperature));
        }
        Ok(Self {
            max_length,
            temperature,
        })
    }

    pub fn max_length(&self) -> u32 {
        self.max_length
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub prompt: String,
    pub max_length: u32,
    pub temperature: f32,
}

impl GenerateRequest {
    pub fn new(prompt: impl Into<String>, options: GenerationOptions) -> Self {
        Self {
            prompt: prompt.into(),
            max_length: options.max_length,
            temperature: options.temperature,
        }
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Reasons a generation attempt produced no text
#[derive(Error, Debug)]
pub enum GenerateError {
    /// Connection refused, DNS failure, timeout and friends
    #[error("request to generation endpoint failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("generation endpoint returned status {0}")]
    Status(StatusCode),

    /// Body was not a JSON object with a string `response` field
    #[error("malformed generation response: {0}")]
    Malformed(String),

    /// The background task ended before reporting a result
    #[error("generation task ended before completing")]
    Interrupted,
}

#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError>;
}

#[derive(Clone)]
pub struct GenerateClient {
    client: Client,
    base_url: String,
}

impl GenerateClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GenerateError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> String {
        format!("{}/generate", self.base_url)
    }
}

#[async_trait]
impl TextGenerator for GenerateClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, GenerateError> {
        let url = self.endpoint();
        debug!(%url, prompt_chars = request.prompt.chars().count(), "sending generation request");

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(GenerateError::Status(status));
        }

        let body = response.text().await?;
        let parsed: GenerateResponse =
            serde_json::from_str(&body).map_err(|e| GenerateError::Malformed(e.to_string()))?;

        debug!(response_chars = parsed.response.chars().count(), "generation succeeded");
        Ok(parsed.response)
    }
}
