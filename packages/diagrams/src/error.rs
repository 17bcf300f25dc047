// ABOUTME: Error types for the diagrams package
// ABOUTME: Covers kind routing, generation, and persistence failures

use drafter_ai::AiError;
use drafter_core::StoreError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiagramError {
    #[error("Unknown diagram kind: {0}")]
    UnknownKind(String),

    #[error("Diagram generation failed: {0}")]
    Generation(String),

    #[error("Failed to save diagram for project {0}")]
    NotSaved(i64),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),
}

pub type Result<T> = std::result::Result<T, DiagramError>;
