// ABOUTME: Text generation capability boundary and the Anthropic client behind it
// ABOUTME: Everything upstream consumes the capability through the TextGenerator trait

use async_trait::async_trait;

mod error;
mod service;

pub use error::AiError;
pub use service::{strip_code_fences, AIResponse, AIService, Usage};

/// The black-box text generation capability: prompt in, completion text out.
/// No structured error channel beyond [`AiError`].
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, AiError>;
}
