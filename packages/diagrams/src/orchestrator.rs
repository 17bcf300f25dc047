// ABOUTME: Router over the diagram generators: kind dispatch, persistence, kind inference
// ABOUTME: Also extracts per-kind requirements and drives full-suite generation

use std::sync::Arc;

use drafter_ai::TextGenerator;
use drafter_core::{Diagram, DiagramKind, DiagramStore, Project};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::error::{DiagramError, Result};
use crate::generator::{DiagramGenerator, GenerationResult};
use crate::prompt;

const SECTION_HEADINGS: [&str; 4] = [
    "Entity Relationship Diagram",
    "Flowchart",
    "Sequence Diagram",
    "Class Diagram",
];

/// Per-kind requirement texts extracted from one project description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub erd: String,
    pub flowchart: String,
    pub sequence: String,
    pub class_diagram: String,
}

impl RequirementSet {
    pub fn for_kind(&self, kind: DiagramKind) -> &str {
        match kind {
            DiagramKind::Erd => &self.erd,
            DiagramKind::Flowchart => &self.flowchart,
            DiagramKind::Sequence => &self.sequence,
            DiagramKind::Class => &self.class_diagram,
        }
    }
}

/// Pulls one named section out of a free-form sectioned response. Returns an
/// empty string when the heading is absent.
fn extract_section(content: &str, heading: &str) -> String {
    let Some(start) = content.find(heading) else {
        return String::new();
    };

    let mut rest = content[start + heading.len()..].trim_start();
    // Drop a parenthesized abbreviation and separator left over from the
    // heading line, e.g. "(ERD):"
    if rest.starts_with('(') {
        if let Some(close) = rest.find(')') {
            rest = &rest[close + 1..];
        }
    }
    rest = rest.trim_start_matches([':', '-', '*', '#']).trim_start();

    let end = SECTION_HEADINGS
        .iter()
        .filter(|h| **h != heading)
        .filter_map(|h| rest.find(h))
        .min()
        .unwrap_or(rest.len());

    rest[..end]
        .trim_end_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '#' || c.is_whitespace())
        .to_string()
}

/// Dispatches generation requests to the right generator and persists the
/// results through the diagram store collaborator.
pub struct Orchestrator {
    model: Arc<dyn TextGenerator>,
    generator: DiagramGenerator,
    store: Arc<dyn DiagramStore>,
}

impl Orchestrator {
    pub fn new(model: Arc<dyn TextGenerator>, store: Arc<dyn DiagramStore>) -> Self {
        let generator = DiagramGenerator::new(model.clone());
        Self {
            model,
            generator,
            store,
        }
    }

    pub fn generator(&self) -> &DiagramGenerator {
        &self.generator
    }

    /// Generates a diagram of the requested kind and persists it.
    ///
    /// The kind label is matched against the fixed set (with aliases); an
    /// unrecognized label is a fatal input error and never reaches the model.
    /// Generator failure and a store that returns no row are fatal too.
    pub async fn generate_and_save(
        &self,
        project: &Project,
        kind_label: &str,
        requirements: &str,
    ) -> Result<Diagram> {
        let kind = DiagramKind::parse(kind_label)
            .ok_or_else(|| DiagramError::UnknownKind(kind_label.to_string()))?;

        match self.generator.generate(project, kind, requirements).await {
            GenerationResult::Success { name, diagram_code } => {
                info!(project_id = project.id, kind = %kind, name = %name, "persisting generated diagram");
                let saved = self
                    .store
                    .insert_diagram(project.id, &name, kind.label(), &diagram_code)
                    .await?;
                saved.ok_or(DiagramError::NotSaved(project.id))
            }
            GenerationResult::Failure { error_message } => {
                Err(DiagramError::Generation(error_message))
            }
        }
    }

    /// Asks the model which single diagram kind best fits the requirements.
    /// Out-of-set responses fall back to `Flowchart`.
    pub async fn infer_optimal_kind(&self, requirements: &str) -> Result<DiagramKind> {
        let response = self
            .model
            .generate(&prompt::infer_kind_prompt(requirements))
            .await?;
        let trimmed = response.trim();

        Ok(DiagramKind::parse(trimmed).unwrap_or_else(|| {
            warn!(
                response = %trimmed,
                "model returned out-of-set diagram kind, defaulting to Flowchart"
            );
            DiagramKind::Flowchart
        }))
    }

    /// One model call producing tailored requirement sections for every kind.
    pub async fn extract_requirements(
        &self,
        name: &str,
        description: &str,
    ) -> Result<RequirementSet> {
        info!(project = %name, "extracting per-kind requirements");
        let response = self
            .model
            .generate(&prompt::extract_requirements_prompt(name, description))
            .await?;

        Ok(RequirementSet {
            erd: extract_section(&response, "Entity Relationship Diagram"),
            flowchart: extract_section(&response, "Flowchart"),
            sequence: extract_section(&response, "Sequence Diagram"),
            class_diagram: extract_section(&response, "Class Diagram"),
        })
    }

    /// Extracts a requirement set and generates every kind with its tailored
    /// requirements. Per-kind failures are logged and collected; they never
    /// abort the remaining kinds.
    pub async fn generate_suite(
        &self,
        project: &Project,
        description: &str,
    ) -> Result<Vec<(DiagramKind, Result<Diagram>)>> {
        let requirements = self
            .extract_requirements(&project.name, description)
            .await?;

        let mut results = Vec::with_capacity(DiagramKind::ALL.len());
        for kind in DiagramKind::ALL {
            let outcome = self
                .generate_and_save(project, kind.label(), requirements.for_kind(kind))
                .await;
            if let Err(err) = &outcome {
                error!(project_id = project.id, kind = %kind, %err, "suite diagram generation failed");
            }
            results.push((kind, outcome));
        }
        Ok(results)
    }
}
