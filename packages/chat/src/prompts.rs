// ABOUTME: Turn prompt builders for the conversation engine
// ABOUTME: History is rendered verbatim as User/AI lines into every prompt

use drafter_core::{Role, Utterance};

/// Renders the conversation history the way it is fed into prompts.
pub(crate) fn render_history(history: &[Utterance]) -> String {
    history
        .iter()
        .map(|u| match u.role {
            Role::User => format!("User: {}", u.content),
            Role::Assistant => format!("AI: {}", u.content),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn name_prompt(message: &str) -> String {
    format!(
        "Analyze this message and extract a suitable project name:\n\
         User Message: {message}\n\
         \n\
         Requirements:\n\
         1. Name should be concise and descriptive\n\
         2. Use standard naming conventions\n\
         3. Avoid special characters\n\
         4. Maximum 50 characters\n\
         \n\
         Return only the project name, nothing else."
    )
}

pub(crate) fn follow_up_prompt(project_name: &str, message: &str) -> String {
    format!(
        "You are an AI assistant helping gather project requirements.\n\
         Project Name: {project_name}\n\
         Last Message: {message}\n\
         \n\
         Generate a response that:\n\
         1. Acknowledges the project name\n\
         2. Asks about the core functionality\n\
         3. Encourages detailed explanation\n\
         4. Maintains conversational tone\n\
         5. Keep it short and engaging, only ask one question at a time.\n\
         6. Don't use markdown or code blocks\n\
         \n\
         Provide only the response text."
    )
}

pub(crate) fn sufficiency_prompt(project_name: &str, conversation: &str) -> String {
    format!(
        "Based on this conversation about project \"{project_name}\", determine if we have enough information to generate requirements:\n\
         \n\
         {conversation}\n\
         \n\
         Analyze the conversation and determine:\n\
         1. Is there enough detail to generate technical diagrams?\n\
         2. If the user instructs to generate diagrams in the last message.\n\
         \n\
         Answer with a single leading token: SUFFICIENT or INSUFFICIENT, followed by a brief reason."
    )
}

pub(crate) fn description_prompt(project_name: &str, conversation: &str) -> String {
    format!(
        "Based on this conversation about project \"{project_name}\":\n\
         \n\
         {conversation}\n\
         \n\
         Generate a comprehensive project description that:\n\
         1. Summarizes the project purpose\n\
         2. Lists all key features and requirements\n\
         3. Includes any technical constraints mentioned\n\
         4. Is structured and detailed enough for technical diagram generation\n\
         5. Don't use markdown or code blocks.\n\
         6. Keep it concise.\n\
         \n\
         Provide only the description text."
    )
}

pub(crate) fn clarify_prompt(project_name: &str, conversation: &str) -> String {
    format!(
        "You are an AI assistant helping gather project requirements.\n\
         Project Name: {project_name}\n\
         Conversation so far: {conversation}\n\
         \n\
         Generate a response that:\n\
         1. Acknowledges the information provided so far\n\
         2. Asks specific questions to gather missing details\n\
         3. Guides the user toward providing complete requirements\n\
         4. Maintains conversational tone\n\
         5. Keep it short and engaging\n\
         6. Don't use markdown or code blocks\n\
         \n\
         Provide only the response text."
    )
}

pub(crate) fn confirmation_prompt(project_name: &str, description: &str) -> String {
    format!(
        "Based on the gathered information:\n\
         Project Name: {project_name}\n\
         Project Description: {description}\n\
         \n\
         Generate a confirmation message that:\n\
         1. Summarizes the understood requirements\n\
         2. Confirms proceeding to diagram generation\n\
         3. Sets expectations for next steps\n\
         4. Don't use markdown or code blocks.\n\
         5. Keep it short, concise, and precise.\n\
         \n\
         Provide only the response text."
    )
}
