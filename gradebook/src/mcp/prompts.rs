//! MCP prompts for Gradebook

use super::protocol::{JsonRpcError, PromptArgument, PromptDefinition, PromptMessage, ToolContent};
use crate::gateway::Gateway;
use serde_json::{json, Value};

pub fn get_prompt_definitions() -> Vec<PromptDefinition> {
    vec![PromptDefinition {
        name: "ask_database_prompt".to_string(),
        description: "Turn a natural-language question into a complete SQL query over the student database".to_string(),
        arguments: vec![PromptArgument {
            name: "question".to_string(),
            description: "Question about the students".to_string(),
            required: true,
        }],
    }]
}

/// Render a prompt by name
pub async fn get_prompt(
    gateway: &Gateway,
    name: &str,
    arguments: &Value,
) -> Result<Value, JsonRpcError> {
    match name {
        "ask_database_prompt" => ask_database_prompt(gateway, arguments).await,
        _ => Err(JsonRpcError::invalid_params(format!("Unknown prompt: {}", name))),
    }
}

async fn ask_database_prompt(gateway: &Gateway, args: &Value) -> Result<Value, JsonRpcError> {
    let question = args
        .get("question")
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonRpcError::invalid_params("Missing question argument"))?;

    let sql = gateway
        .translate_question_to_sql(question)
        .await
        .map_err(|e| JsonRpcError::server_error(e.to_string()))?;

    let message = PromptMessage {
        role: "user".to_string(),
        content: ToolContent::text(sql),
    };

    Ok(json!({
        "description": format!("SQL for: {}", question),
        "messages": [message]
    }))
}
