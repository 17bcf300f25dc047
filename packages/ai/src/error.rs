// ABOUTME: Error type for the text generation capability
// ABOUTME: Carries the retryable-vs-fatal classification used by the retry loop

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AiError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("No API key configured")]
    NoApiKey,

    #[error("Invalid response format")]
    InvalidResponse,
}

impl AiError {
    /// Whether another attempt could plausibly succeed. The generator retry
    /// loop consumes an attempt for retryable errors and aborts immediately
    /// on everything else.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::Request(_) | AiError::Timeout(_) => true,
            AiError::Api { status, .. } => {
                matches!(*status, 408 | 429) || (500..600).contains(status)
            }
            AiError::Parse(_) | AiError::InvalidResponse => true,
            AiError::NoApiKey => false,
        }
    }
}
