// ABOUTME: Collaborator boundary traits consumed by the orchestration core
// ABOUTME: Persistence, identity resolution, and speech conversion live outside this repo

use async_trait::async_trait;
use thiserror::Error;

use crate::types::{Diagram, Project};

/// Errors surfaced by the persistence and identity collaborators.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid credential: {0}")]
    InvalidCredential(String),
}

/// Errors surfaced by the speech collaborators.
#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("Speech service error: {0}")]
    Service(String),
    #[error("Audio input was empty")]
    EmptyInput,
}

/// Project persistence, keyed by the opaque owning-user credential.
#[async_trait]
pub trait ProjectStore: Send + Sync {
    async fn create_project(
        &self,
        credential: &str,
        name: &str,
        description: &str,
    ) -> Result<Project, StoreError>;

    async fn get_project(&self, id: i64) -> Result<Option<Project>, StoreError>;
}

/// Diagram persistence. `Ok(None)` means the store accepted the write but
/// returned no row, which callers treat as a persistence failure.
#[async_trait]
pub trait DiagramStore: Send + Sync {
    async fn insert_diagram(
        &self,
        project_id: i64,
        name: &str,
        kind_label: &str,
        content: &str,
    ) -> Result<Option<Diagram>, StoreError>;
}

/// Resolves a caller credential to a stable user identifier.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, credential: &str) -> Result<String, StoreError>;
}

/// Text to speech. Returns base64-encoded audio.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str) -> Result<String, SpeechError>;
}

/// Speech to text.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    async fn transcribe(&self, audio: &[u8]) -> Result<String, SpeechError>;
}
