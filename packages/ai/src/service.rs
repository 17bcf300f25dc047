// ABOUTME: Anthropic Messages API client implementing the TextGenerator capability
// ABOUTME: Handles API requests, response extraction, and usage reporting

use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use crate::{AiError, TextGenerator};

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_MAX_TOKENS: u32 = 4096;
const DEFAULT_TEMPERATURE: f32 = 0.7;

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    #[allow(dead_code)]
    id: String,
    content: Vec<ContentBlock>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    #[allow(dead_code)]
    content_type: String,
    text: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    pub fn total_tokens(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

#[derive(Debug)]
pub struct AIResponse<T> {
    pub data: T,
    pub usage: Usage,
}

/// Strips markdown code fences from a model response (```json ... ``` and
/// friends). Returns the inner text, or the trimmed input when unfenced.
pub fn strip_code_fences(text: &str) -> &str {
    let cleaned = text.trim();
    if !cleaned.starts_with("```") {
        return cleaned;
    }
    // Skip the opening fence line, then cut at the closing fence
    let start = cleaned.find('\n').map(|i| i + 1).unwrap_or(0);
    let end = cleaned[start..]
        .rfind("```")
        .map(|i| i + start)
        .unwrap_or(cleaned.len());
    cleaned[start..end].trim()
}

/// Anthropic-backed text generation service
pub struct AIService {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl AIService {
    /// Create HTTP client with timeout configuration
    fn create_client() -> Client {
        Client::builder()
            .timeout(std::time::Duration::from_secs(600))
            .connect_timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("Failed to build HTTP client")
    }

    /// Creates a new AI service instance
    /// API key is fetched from ANTHROPIC_API_KEY environment variable
    /// Model can be overridden with ANTHROPIC_MODEL environment variable
    pub fn new() -> Self {
        let api_key = env::var("ANTHROPIC_API_KEY").ok();
        if api_key.is_none() {
            info!("ANTHROPIC_API_KEY not set - generation calls will fail until a key is provided");
        }

        let model = env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        if model != DEFAULT_MODEL {
            info!("Using custom Anthropic model: {}", model);
        }

        Self {
            client: Self::create_client(),
            api_key,
            model,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Creates a new AI service instance with a specific API key
    pub fn with_api_key(api_key: String) -> Self {
        let model = env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        Self {
            client: Self::create_client(),
            api_key: Some(api_key),
            model,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Creates a new AI service instance with a specific API key and model
    pub fn with_api_key_and_model(api_key: String, model: String) -> Self {
        Self {
            client: Self::create_client(),
            api_key: Some(api_key),
            model,
            base_url: ANTHROPIC_API_URL.to_string(),
        }
    }

    /// Overrides the API endpoint. Used by tests against a local mock server.
    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    /// Get the model being used by this service
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Makes a text generation call to Claude
    pub async fn generate_text(
        &self,
        prompt: String,
        system_prompt: Option<String>,
    ) -> Result<AIResponse<String>, AiError> {
        let api_key = self.api_key.as_ref().ok_or(AiError::NoApiKey)?;

        let request = AnthropicRequest {
            model: self.model.clone(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt,
            }],
            system: system_prompt,
        };

        info!(
            "Making Anthropic API request: model={}, max_tokens={}",
            request.model, request.max_tokens
        );

        let response = self
            .client
            .post(&self.base_url)
            .header("x-api-key", api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    error!("Anthropic API request timed out");
                    AiError::Timeout(
                        "Request timed out after 600 seconds. The AI service may be overloaded or unavailable.".to_string(),
                    )
                } else {
                    error!("Anthropic API request failed: {}", e);
                    AiError::Request(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            error!("Anthropic API error: {} - {}", status, error_text);
            return Err(AiError::Api {
                status,
                message: error_text,
            });
        }

        let anthropic_response: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| AiError::Parse(e.to_string()))?;

        // Extract text from the first content block
        let text = anthropic_response
            .content
            .first()
            .ok_or(AiError::InvalidResponse)?
            .text
            .clone();

        Ok(AIResponse {
            data: text,
            usage: anthropic_response.usage,
        })
    }
}

impl Default for AIService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextGenerator for AIService {
    async fn generate(&self, prompt: &str) -> Result<String, AiError> {
        let response = self.generate_text(prompt.to_string(), None).await?;
        Ok(response.data)
    }
}
