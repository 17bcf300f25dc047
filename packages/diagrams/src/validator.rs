// ABOUTME: Checklist-prompt validation of generated diagram artifacts
// ABOUTME: Classifies model responses by a leading VALID/INVALID verdict token

use std::sync::Arc;

use drafter_ai::{AiError, TextGenerator};
use drafter_core::DiagramKind;
use tracing::debug;

/// Outcome of a validation call. `feedback` is empty iff `valid` is true.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationOutcome {
    pub valid: bool,
    pub feedback: String,
}

impl ValidationOutcome {
    pub fn valid() -> Self {
        Self {
            valid: true,
            feedback: String::new(),
        }
    }

    pub fn invalid(feedback: impl Into<String>) -> Self {
        Self {
            valid: false,
            feedback: feedback.into(),
        }
    }
}

/// Submits generated artifacts back to the model with a kind-appropriate
/// checklist and classifies the response.
pub struct Validator {
    model: Arc<dyn TextGenerator>,
}

fn checklist(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::Erd => {
            "1. Proper ERD syntax\n\
             2. Valid entity definitions\n\
             3. Correct relationship notations\n\
             4. Primary and foreign key definitions\n\
             5. Complete and meaningful relationships"
        }
        DiagramKind::Flowchart => {
            "1. Proper flowchart syntax\n\
             2. Clear start and end points\n\
             3. Valid connections between nodes\n\
             4. Proper decision points with all paths\n\
             5. Logical flow and readability"
        }
        // Sequence and class diagrams use the generic syntax checklist
        DiagramKind::Sequence | DiagramKind::Class => {
            "1. Proper syntax and structure\n\
             2. Valid node and edge definitions\n\
             3. Correct use of Mermaid keywords\n\
             4. Complete and well-formed statements"
        }
    }
}

fn validation_prompt(diagram_code: &str, kind: DiagramKind) -> String {
    format!(
        "Validate this Mermaid {label}:\n\
         {diagram_code}\n\
         \n\
         Check for:\n\
         {checklist}\n\
         \n\
         Respond with a single verdict token on the first line: VALID or INVALID.\n\
         If INVALID, follow the token with an explanation of the specific issues found.",
        label = kind.label(),
        checklist = checklist(kind),
    )
}

/// Classifies a validation response by its leading token. Only a response
/// whose first token is VALID (case-insensitive, trailing punctuation
/// ignored) counts as valid; anything ambiguous classifies as invalid and
/// the full response becomes the feedback.
fn classify_verdict(response: &str) -> ValidationOutcome {
    let trimmed = response.trim();
    let leading = trimmed
        .split_whitespace()
        .next()
        .unwrap_or("")
        .trim_end_matches(|c: char| c.is_ascii_punctuation());

    if leading.eq_ignore_ascii_case("valid") {
        ValidationOutcome::valid()
    } else {
        ValidationOutcome::invalid(trimmed)
    }
}

impl Validator {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        Self { model }
    }

    /// Validates a generated artifact against the kind-appropriate checklist.
    /// Errors here are capability transport errors; the caller decides
    /// whether they consume a retry.
    pub async fn validate(
        &self,
        diagram_code: &str,
        kind: DiagramKind,
    ) -> Result<ValidationOutcome, AiError> {
        let response = self
            .model
            .generate(&validation_prompt(diagram_code, kind))
            .await?;
        let outcome = classify_verdict(&response);
        debug!(kind = %kind, valid = outcome.valid, "validated diagram artifact");
        Ok(outcome)
    }

    /// Asks the model for actionable improvement suggestions on an existing
    /// artifact.
    pub async fn suggest_improvements(
        &self,
        diagram_code: &str,
        kind: DiagramKind,
    ) -> Result<String, AiError> {
        let prompt = format!(
            "Analyze this {label} diagram and suggest improvements:\n\
             {diagram_code}\n\
             \n\
             Consider:\n\
             1. Clarity and readability\n\
             2. Completeness of information\n\
             3. Proper use of diagram conventions\n\
             4. Logical organization\n\
             5. Best practices for {label} diagrams\n\
             \n\
             Provide specific, actionable suggestions for improvement.",
            label = kind.label(),
        );
        self.model.generate(&prompt).await
    }
}
