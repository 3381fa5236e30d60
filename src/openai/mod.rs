//! OpenAI-compatible generative client
//!
//! Provides:
//! - Chat completions for the home description
//! - Image generation for the floor plan and 3D render
//!
//! Both calls are one-shot: no retry, no streaming.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::ProviderConfig;
use crate::error::GenerationError;
use crate::prompts::SYSTEM_PERSONA;

/// Chat message for the completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: &str) -> Self {
        Self {
            role: "system".to_string(),
            content: content.to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self {
            role: "user".to_string(),
            content: content.to_string(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

/// Chat completion response
#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Image generation request
#[derive(Debug, Serialize)]
struct ImageRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    n: u32,
    size: &'a str,
}

/// Image generation response
#[derive(Debug, Deserialize)]
struct ImageResponse {
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    url: Option<String>,
}

/// Error body returned by OpenAI-compatible APIs
#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Generative provider client
#[derive(Clone)]
pub struct OpenAiClient {
    /// HTTP client
    client: Client,
    /// API key
    api_key: Option<String>,
    /// API base URL, without trailing slash
    base_url: String,
    text_model: String,
    image_model: String,
    image_size: String,
}

impl OpenAiClient {
    /// Create a client from provider settings
    pub fn new(config: &ProviderConfig) -> Result<Self, GenerationError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone().filter(|k| !k.trim().is_empty()),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            text_model: config.text_model.clone(),
            image_model: config.image_model.clone(),
            image_size: config.image_size.clone(),
        })
    }

    /// Check if API key is configured
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    fn api_key(&self) -> Result<&str, GenerationError> {
        self.api_key
            .as_deref()
            .ok_or_else(|| GenerationError::Provider("API key not configured".to_string()))
    }

    /// Generate text for a prompt under the architectural design persona
    ///
    /// Returns the first completion's content, trimmed.
    pub async fn generate_text(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;

        let request = ChatRequest {
            model: &self.text_model,
            messages: vec![ChatMessage::system(SYSTEM_PERSONA), ChatMessage::user(prompt)],
        };

        debug!("Sending chat request to provider: {}", request.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let chat_response: ChatResponse = check_status(response).await?.json().await?;

        chat_response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .ok_or_else(|| GenerationError::Provider("no completion returned".to_string()))
    }

    /// Generate one image for a prompt and return its URL
    pub async fn generate_image_url(&self, prompt: &str) -> Result<String, GenerationError> {
        let api_key = self.api_key()?;

        let request = ImageRequest {
            model: &self.image_model,
            prompt,
            n: 1,
            size: &self.image_size,
        };

        debug!("Sending image generation request to provider: {}", request.model);

        let response = self
            .client
            .post(format!("{}/images/generations", self.base_url))
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let image_response: ImageResponse = check_status(response).await?.json().await?;

        image_response
            .data
            .into_iter()
            .next()
            .and_then(|d| d.url)
            .ok_or_else(|| GenerationError::Provider("no image generated".to_string()))
    }
}

/// Map a non-2xx provider response to a provider error
async fn check_status(response: Response) -> Result<Response, GenerationError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!("Provider API error: {} - {}", status, body);

    Err(GenerationError::Provider(match provider_message(&body) {
        Some(message) => format!("API error: {}: {}", status, message),
        None => format!("API error: {}", status),
    }))
}

fn provider_message(body: &str) -> Option<String> {
    serde_json::from_str::<ApiErrorBody>(body)
        .ok()
        .map(|b| b.error.message)
}
