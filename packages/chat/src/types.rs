// ABOUTME: Conversation phases, per-user state, and the per-turn reply shape

use drafter_core::{Project, Utterance};
use serde::{Deserialize, Serialize};

/// State machine phases. Transitions only move forward:
/// Naming → Gathering → Generating → Done.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Naming,
    Gathering,
    Generating,
    Done,
}

/// Everything tracked for one user's conversation. Lives for the process
/// lifetime inside the session registry; mutated on every turn.
#[derive(Debug, Clone)]
pub struct ConversationState {
    pub user_id: String,
    pub credential: String,
    pub history: Vec<Utterance>,
    pub phase: Phase,
    pub project_name: Option<String>,
    pub project_description: Option<String>,
    pub project: Option<Project>,
}

impl ConversationState {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            credential: String::new(),
            history: Vec::new(),
            phase: Phase::Naming,
            project_name: None,
            project_description: None,
            project: None,
        }
    }
}

/// The engine's answer to one chat turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    /// Base64 audio of the response when a synthesizer is configured.
    pub audio: Option<String>,
    pub requirements_gathered: bool,
    pub project_id: Option<i64>,
}
