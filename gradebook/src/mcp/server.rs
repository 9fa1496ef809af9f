//! MCP server implementation
//!
//! Implements the stdio transport for the Model Context Protocol.

use super::prompts::{get_prompt, get_prompt_definitions};
use super::protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ServerCapabilities, ServerInfo, ToolResult,
    MCP_PROTOCOL_VERSION,
};
use super::resources::{get_resource_definitions, get_resource_templates, read_resource};
use super::tools::{get_tool_definitions, handle_tool_call};
use crate::gateway::Gateway;
use crate::store::Store;
use crate::translate::SqlTranslator;
use serde_json::{json, Value};
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

/// MCP server for Gradebook
///
/// Exposes the student database as resources, a SQL tool and a
/// natural-language prompt over JSON-RPC on stdio.
pub struct McpServer {
    gateway: Gateway,
}

impl McpServer {
    /// Create a server over an existing database file
    pub fn new<P: AsRef<Path>>(db_path: P) -> crate::Result<Self> {
        let store = Store::open_existing(db_path)?;
        Ok(Self::with_store(store))
    }

    /// Create a new MCP server with an existing store
    pub fn with_store(store: Store) -> Self {
        Self {
            gateway: Gateway::new(store),
        }
    }

    /// Enable natural-language questions
    pub fn with_translator(mut self, translator: Box<dyn SqlTranslator>) -> Self {
        self.gateway = self.gateway.with_translator(translator);
        self
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    /// Run the MCP server on stdio until EOF
    pub async fn run(&self) -> crate::Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        let writer = tokio::io::stdout();
        self.serve(reader, writer).await
    }

    /// Serve newline-delimited JSON-RPC from `reader`, writing responses to `writer`
    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> crate::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        tracing::info!(
            "Gradebook MCP server started (protocol version {})",
            MCP_PROTOCOL_VERSION
        );

        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => {
                    tracing::info!("EOF received, shutting down");
                    break;
                }
                Ok(_) => {
                    let message = line.trim();
                    if message.is_empty() {
                        continue;
                    }

                    tracing::debug!("Received: {}", message);

                    let response = match serde_json::from_str::<JsonRpcRequest>(message) {
                        Ok(request) => self.handle_request(request).await,
                        Err(e) => Some(JsonRpcResponse::error(
                            None,
                            JsonRpcError::parse_error(format!("Parse error: {}", e)),
                        )),
                    };

                    if let Some(response) = response {
                        let response_json = serde_json::to_string(&response)?;
                        writer.write_all(response_json.as_bytes()).await?;
                        writer.write_all(b"\n").await?;
                        writer.flush().await?;
                        tracing::debug!("Sent: {}", response_json);
                    }
                }
                Err(e) => {
                    tracing::error!("Read error: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle a single JSON-RPC request. Notifications produce no response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            tracing::debug!("Notification: {}", request.method);
            return None;
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(&request.params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": get_tool_definitions() })),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "resources/list" => Ok(json!({ "resources": get_resource_definitions() })),
            "resources/templates/list" => {
                Ok(json!({ "resourceTemplates": get_resource_templates() }))
            }
            "resources/read" => self.handle_resources_read(&request.params).await,
            "prompts/list" => Ok(json!({ "prompts": get_prompt_definitions() })),
            "prompts/get" => self.handle_prompts_get(&request.params).await,
            _ => Err(JsonRpcError::method_not_found(&request.method)),
        };

        Some(match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(error) => JsonRpcResponse::error(request.id, error),
        })
    }

    fn handle_initialize(&self, _params: &Option<Value>) -> Result<Value, JsonRpcError> {
        Ok(json!({
            "protocolVersion": MCP_PROTOCOL_VERSION,
            "capabilities": ServerCapabilities::default(),
            "serverInfo": ServerInfo::default()
        }))
    }

    async fn handle_tools_call(&self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params
            .as_ref()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let tool_name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool name"))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        let result: ToolResult = handle_tool_call(&self.gateway, tool_name, &arguments).await?;

        serde_json::to_value(result).map_err(|e| JsonRpcError::server_error(e.to_string()))
    }

    async fn handle_resources_read(&self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        let uri = params
            .as_ref()
            .and_then(|p| p.get("uri"))
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing resource uri"))?;

        let contents = read_resource(&self.gateway, uri).await?;
        Ok(json!({ "contents": [contents] }))
    }

    async fn handle_prompts_get(&self, params: &Option<Value>) -> Result<Value, JsonRpcError> {
        let params = params
            .as_ref()
            .ok_or_else(|| JsonRpcError::invalid_params("Missing params"))?;

        let name = params
            .get("name")
            .and_then(|v| v.as_str())
            .ok_or_else(|| JsonRpcError::invalid_params("Missing prompt name"))?;

        let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

        get_prompt(&self.gateway, name, &arguments).await
    }
}
