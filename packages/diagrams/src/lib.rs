// ABOUTME: Diagram generation core: retry loop, validator, and kind router
// ABOUTME: Everything here talks to the model through the TextGenerator trait

mod error;
mod generator;
mod orchestrator;
mod prompt;
mod validator;

pub use error::{DiagramError, Result};
pub use generator::{DiagramGenerator, GenerationResult, MAX_RETRIES};
pub use orchestrator::{Orchestrator, RequirementSet};
pub use validator::{ValidationOutcome, Validator};
