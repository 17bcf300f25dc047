// ABOUTME: Bounded retry loop turning requirements text into a validated diagram
// ABOUTME: Attempt-scoped failures consume a retry; fatal capability errors abort

use std::sync::Arc;

use drafter_ai::{AiError, TextGenerator};
use drafter_core::{DiagramKind, Project};
use tracing::{error, info, warn};

use crate::prompt::{self, explain_prompt};
use crate::validator::Validator;

/// Upper bound on generation attempts for one request.
pub const MAX_RETRIES: u32 = 3;

/// Terminal outcome of a generation request. `name` and `diagram_code` are
/// non-empty whenever `Success`.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationResult {
    Success { name: String, diagram_code: String },
    Failure { error_message: String },
}

/// One attempt's failure, split into the two failure domains: retryable
/// failures consume an attempt, fatal ones abort the whole generation.
enum AttemptFailure {
    Retryable(String),
    Fatal(AiError),
}

/// Generates diagrams of any kind with bounded self-correction: prompt the
/// model for the two-field payload, validate the artifact, retry on
/// rejection with the original requirements unchanged.
pub struct DiagramGenerator {
    model: Arc<dyn TextGenerator>,
    validator: Validator,
}

impl DiagramGenerator {
    pub fn new(model: Arc<dyn TextGenerator>) -> Self {
        let validator = Validator::new(model.clone());
        Self { model, validator }
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Runs the bounded generation loop. Infallible signature: every failure
    /// mode collapses into the `Failure` variant.
    pub async fn generate(
        &self,
        project: &Project,
        kind: DiagramKind,
        requirements: &str,
    ) -> GenerationResult {
        // Built once: retries never thread validator feedback back in
        let prompt = prompt::diagram_prompt(project, kind, requirements);

        for attempt in 1..=MAX_RETRIES {
            info!(
                project_id = project.id,
                kind = %kind,
                attempt,
                max = MAX_RETRIES,
                "generating diagram"
            );

            match self.attempt(&prompt, kind).await {
                Ok((name, diagram_code)) => {
                    info!(project_id = project.id, kind = %kind, name = %name, "generated and validated diagram");
                    return GenerationResult::Success { name, diagram_code };
                }
                Err(AttemptFailure::Retryable(reason)) => {
                    warn!(project_id = project.id, kind = %kind, attempt, %reason, "generation attempt failed");
                }
                Err(AttemptFailure::Fatal(err)) => {
                    error!(project_id = project.id, kind = %kind, %err, "generation aborted");
                    return GenerationResult::Failure {
                        error_message: format!("Error generating {}: {err}", kind.label()),
                    };
                }
            }
        }

        GenerationResult::Failure {
            error_message: format!(
                "Failed to generate valid {} after {} attempts",
                kind.label(),
                MAX_RETRIES
            ),
        }
    }

    /// One attempt: capability call, payload parse, validation. Parse
    /// failures and validation rejections are indistinguishable to the
    /// retry counter.
    async fn attempt(
        &self,
        prompt: &str,
        kind: DiagramKind,
    ) -> Result<(String, String), AttemptFailure> {
        let response = self
            .model
            .generate(prompt)
            .await
            .map_err(classify_capability_error)?;

        let payload = prompt::parse_payload(&response).map_err(AttemptFailure::Retryable)?;

        let outcome = self
            .validator
            .validate(&payload.diagram, kind)
            .await
            .map_err(classify_capability_error)?;

        if outcome.valid {
            Ok((payload.name, payload.diagram))
        } else {
            Err(AttemptFailure::Retryable(format!(
                "validation rejected artifact: {}",
                outcome.feedback
            )))
        }
    }

    /// One capability call returning a plain-language explanation of an
    /// existing artifact.
    pub async fn explain(&self, kind: DiagramKind, diagram_code: &str) -> Result<String, AiError> {
        self.model.generate(&explain_prompt(kind, diagram_code)).await
    }
}

fn classify_capability_error(err: AiError) -> AttemptFailure {
    if err.is_retryable() {
        AttemptFailure::Retryable(format!("capability call failed: {err}"))
    } else {
        AttemptFailure::Fatal(err)
    }
}
