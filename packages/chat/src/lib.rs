// ABOUTME: Per-user conversational state machine that gathers requirements
// ABOUTME: Drives project creation and diagram generation once details suffice

mod engine;
mod error;
mod prompts;
mod session;
mod types;

pub use engine::ConversationEngine;
pub use error::{ChatError, Result};
pub use session::{Session, SessionRegistry};
pub use types::{ChatReply, ConversationState, Phase};
