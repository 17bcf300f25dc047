// ABOUTME: Prompt builders for the diagram generation core
// ABOUTME: Kind-specific instruction prompts and the two-field payload contract

use drafter_ai::strip_code_fences;
use drafter_core::{DiagramKind, Project};
use serde::Deserialize;

/// The structured payload the model is instructed to return for a diagram
/// request: exactly two named text fields and nothing else.
#[derive(Debug, Deserialize)]
pub(crate) struct DiagramPayload {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub diagram: String,
}

/// Parses a model response as the two-field payload. Missing or blank fields
/// fail the attempt the same way malformed JSON does.
pub(crate) fn parse_payload(response: &str) -> Result<DiagramPayload, String> {
    let json_text = strip_code_fences(response);
    let payload: DiagramPayload = serde_json::from_str(json_text)
        .map_err(|e| format!("response was not the expected JSON payload: {e}"))?;

    if payload.name.trim().is_empty() || payload.diagram.trim().is_empty() {
        return Err("missing 'name' or 'diagram' in model response".to_string());
    }
    Ok(payload)
}

fn kind_rules(kind: DiagramKind) -> &'static str {
    match kind {
        DiagramKind::Erd => {
            "1. Use proper Mermaid ERD syntax.\n\
             2. Include all relevant entities with their attributes based on requirements.\n\
             3. Show relationships between entities clearly.\n\
             4. Use appropriate cardinality notation (e.g., ||, |o, }|, }o).\n\
             5. Include primary and foreign keys where applicable.\n\
             6. Add meaningful relationship descriptions."
        }
        DiagramKind::Flowchart => {
            "1. Use proper Mermaid flowchart syntax.\n\
             2. Include necessary steps and decision points based on requirements.\n\
             3. Use clear directional flow.\n\
             4. Add appropriate labels.\n\
             5. Keep it clear and readable."
        }
        DiagramKind::Sequence => {
            "1. Use proper Mermaid sequence diagram syntax.\n\
             2. Show all relevant participants and their interactions based on requirements.\n\
             3. Include message types (sync/async) where appropriate.\n\
             4. Show activation/deactivation if needed for clarity.\n\
             5. Use proper time ordering."
        }
        DiagramKind::Class => {
            "1. Use proper Mermaid class diagram syntax.\n\
             2. Include relevant classes with attributes and methods based on requirements.\n\
             3. Show relationships (inheritance, composition, aggregation, association) clearly.\n\
             4. Use correct notation for visibility (public +, private -, protected #).\n\
             5. Define data types for attributes and parameters where appropriate."
        }
    }
}

/// Builds the kind-specific instruction prompt. Built once per generation,
/// outside the attempt loop: retries reuse the original requirements verbatim.
pub(crate) fn diagram_prompt(project: &Project, kind: DiagramKind, requirements: &str) -> String {
    format!(
        "Project Context:\n\
         Name: {name}\n\
         Description: {description}\n\
         \n\
         Requirements for {label}:\n\
         {requirements}\n\
         \n\
         Generate a Mermaid {label} based on the project context and requirements.\n\
         \n\
         Follow these rules for the {label}:\n\
         {rules}\n\
         \n\
         Also, generate a concise and relevant name for this specific {label} based on the project and requirements.\n\
         \n\
         Respond ONLY with a valid JSON object containing two keys: \"name\" (string) and \"diagram\" (string, the Mermaid code).\n\
         Do not include any other text or markdown formatting outside the JSON object.",
        name = project.name,
        description = project.description,
        label = kind.label(),
        requirements = requirements,
        rules = kind_rules(kind),
    )
}

/// Prompt asking the model to pick the single best diagram kind for a block
/// of requirements text.
pub(crate) fn infer_kind_prompt(requirements: &str) -> String {
    format!(
        "Analyze this project description and determine the single most appropriate diagram type to visualize it.\n\
         Available types: ERD, Flowchart, Sequence Diagram, Class Diagram.\n\
         Consider the focus of the description (data structure, process flow, interactions, object structure).\n\
         \n\
         Description:\n\
         {requirements}\n\
         \n\
         Respond ONLY with the name of the single most appropriate diagram type (e.g., Flowchart, ERD, Sequence Diagram, Class Diagram)."
    )
}

/// Prompt producing per-kind requirement sections from one project description.
pub(crate) fn extract_requirements_prompt(name: &str, description: &str) -> String {
    format!(
        "Given the following project details:\n\
         Name: {name}\n\
         Description: {description}\n\
         \n\
         Please analyze the project and provide requirements for the following diagram types:\n\
         1. Entity Relationship Diagram (ERD)\n\
         2. Flowchart\n\
         3. Sequence Diagram\n\
         4. Class Diagram\n\
         \n\
         Format your response in clear sections for each diagram type."
    )
}

/// Prompt asking for a plain-language explanation of an existing artifact.
pub(crate) fn explain_prompt(kind: DiagramKind, diagram_code: &str) -> String {
    format!(
        "Explain the following Mermaid {label} code in simple terms:\n\
         {diagram_code}\n\
         \n\
         Requirements:\n\
         1. Explain the overall structure\n\
         2. Describe each element and its purpose\n\
         3. Explain the relationships and flow between elements\n\
         4. Highlight key constraints and conventions used\n\
         5. Note any important design decisions\n\
         \n\
         Provide a clear and comprehensive explanation.",
        label = kind.label(),
    )
}
