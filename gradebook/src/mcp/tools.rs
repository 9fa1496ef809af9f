//! MCP tool handlers for Gradebook

use super::protocol::{JsonRpcError, ToolDefinition, ToolResult};
use crate::gateway::Gateway;
use serde_json::{json, Value};

/// Get all tool definitions
pub fn get_tool_definitions() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "execute_query".to_string(),
            description: "Execute a SQL query against the student database. Returns the first column of each result row, one per line, or the error message if the query fails.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "sql_query": {
                        "type": "string",
                        "description": "SQL statement to run (SQLite dialect)"
                    }
                },
                "required": ["sql_query"]
            }),
        },
        ToolDefinition {
            name: "ask_database".to_string(),
            description: "Answer a natural-language question about the students table. The question is translated to SQL by a language model and then executed.".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "question": {
                        "type": "string",
                        "description": "Question in plain language, e.g. 'What is the average grade in Math?'"
                    }
                },
                "required": ["question"]
            }),
        },
    ]
}

/// Handle tool call dispatch
pub async fn handle_tool_call(
    gateway: &Gateway,
    tool_name: &str,
    arguments: &Value,
) -> Result<ToolResult, JsonRpcError> {
    match tool_name {
        "execute_query" => tool_execute_query(gateway, arguments),
        "ask_database" => tool_ask_database(gateway, arguments).await,
        _ => Err(JsonRpcError::invalid_params(format!(
            "Unknown tool: {}",
            tool_name
        ))),
    }
}

fn required_str<'a>(args: &'a Value, name: &str) -> Result<&'a str, JsonRpcError> {
    args.get(name)
        .and_then(|v| v.as_str())
        .ok_or_else(|| JsonRpcError::invalid_params(format!("Missing {} parameter", name)))
}

fn tool_execute_query(gateway: &Gateway, args: &Value) -> Result<ToolResult, JsonRpcError> {
    let sql = required_str(args, "sql_query")?;
    Ok(ToolResult::text(gateway.execute_query(sql)))
}

async fn tool_ask_database(gateway: &Gateway, args: &Value) -> Result<ToolResult, JsonRpcError> {
    let question = required_str(args, "question")?;
    Ok(ToolResult::text(gateway.ask_and_execute(question).await))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Store;

    fn gateway() -> Gateway {
        Gateway::new(Store::open_memory().unwrap())
    }

    #[test]
    fn test_tool_definitions_valid() {
        let tools = get_tool_definitions();
        let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["execute_query", "ask_database"]);

        for tool in tools {
            assert!(!tool.description.is_empty());
            assert!(tool.input_schema.is_object());
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_error() {
        let result = handle_tool_call(&gateway(), "drop_everything", &json!({})).await;
        let err = result.unwrap_err();
        assert_eq!(err.code, -32602);
    }

    #[tokio::test]
    async fn test_missing_sql_error() {
        let err = handle_tool_call(&gateway(), "execute_query", &json!({}))
            .await
            .unwrap_err();
        assert!(err.message.contains("Missing sql_query"));
    }

    #[tokio::test]
    async fn test_execute_query_error_is_text() {
        let result = handle_tool_call(
            &gateway(),
            "execute_query",
            &json!({"sql_query": "SELECT * FROM"}),
        )
        .await
        .unwrap();
        assert!(result.content[0].text.starts_with("SQL execution error:"));
    }
}
