// ABOUTME: Error types for the chat package
// ABOUTME: Covers turn input validation and collaborator failures

use drafter_ai::AiError;
use drafter_core::{SpeechError, StoreError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("Message cannot be empty")]
    EmptyMessage,

    #[error("Voice input is not configured")]
    VoiceUnavailable,

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Speech error: {0}")]
    Speech(#[from] SpeechError),
}

pub type Result<T> = std::result::Result<T, ChatError>;
