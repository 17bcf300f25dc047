// ABOUTME: Core types and collaborator boundaries for Drafter
// ABOUTME: Foundational package shared by the generation and conversation packages

pub mod boundary;
pub mod types;

// Re-export main types
pub use types::{Diagram, DiagramKind, Project, Role, Utterance};

// Re-export collaborator boundaries
pub use boundary::{
    DiagramStore, IdentityResolver, ProjectStore, SpeechError, SpeechSynthesizer, SpeechToText,
    StoreError,
};
