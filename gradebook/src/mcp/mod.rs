//! MCP (Model Context Protocol) server for Gradebook
//!
//! This module implements an MCP server using stdio transport, exposing the
//! student database to AI agents.
//!
//! ## Resources
//!
//! - `database://csv` - table names
//! - `database://csv/{table_name}/columns` - column names
//! - `database://csv/{table_name}/rows` - first 10 rows
//! - `database://csv/students/all/data` - every student
//! - `database://csv/students/{column_name}/data` - one column, one value per line
//! - `database://csv/query/{question}` - natural-language question, answered via SQL
//!
//! ## Tools
//!
//! - `execute_query` - run SQL text
//! - `ask_database` - translate a question to SQL and run it
//!
//! ## Prompts
//!
//! - `ask_database_prompt` - the SQL a question translates to
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gradebook::mcp::McpServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = McpServer::new("csv.db").unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

mod prompts;
mod protocol;
pub mod resources;
mod server;
pub mod tools;

pub use protocol::{
    JsonRpcError, JsonRpcRequest, JsonRpcResponse, ResourceContents, ToolDefinition, ToolResult,
};
pub use server::McpServer;
