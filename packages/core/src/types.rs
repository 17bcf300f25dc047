// ABOUTME: Shared domain types for Drafter
// ABOUTME: Projects, saved diagrams, diagram kinds, and conversation utterances

use serde::{Deserialize, Serialize};
use std::fmt;

/// A project owned by the external project store. Generators receive it by
/// reference and never mutate it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub description: String,
}

/// A persisted diagram row as returned by the diagram store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagram {
    pub id: i64,
    pub project_id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub kind_label: String,
    pub content: String,
}

/// The four diagram kinds the router recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagramKind {
    Erd,
    Flowchart,
    Sequence,
    Class,
}

impl DiagramKind {
    pub const ALL: [DiagramKind; 4] = [
        DiagramKind::Erd,
        DiagramKind::Flowchart,
        DiagramKind::Sequence,
        DiagramKind::Class,
    ];

    /// Canonical wire label, the exact string stored alongside diagrams.
    pub fn label(&self) -> &'static str {
        match self {
            DiagramKind::Erd => "ERD",
            DiagramKind::Flowchart => "Flowchart",
            DiagramKind::Sequence => "Sequence Diagram",
            DiagramKind::Class => "Class Diagram",
        }
    }

    /// Parses a kind label, case-insensitively and with the accepted aliases.
    /// Returns `None` for anything outside the fixed set.
    pub fn parse(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "erd" | "entity relationship diagram" => Some(DiagramKind::Erd),
            "flowchart" | "flow chart" => Some(DiagramKind::Flowchart),
            "sequence diagram" | "sequence" => Some(DiagramKind::Sequence),
            "class diagram" | "class" => Some(DiagramKind::Class),
            _ => None,
        }
    }
}

impl fmt::Display for DiagramKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Who produced a conversation utterance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One turn entry in a conversation history. History ordering is append-only
/// and meaningful: entries are rendered verbatim into later prompts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Utterance {
    pub role: Role,
    pub content: String,
}

impl Utterance {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}
