//! Gradebook MCP Server
//!
//! A Model Context Protocol (MCP) server that exposes the student database
//! to AI agents over stdio transport.
//!
//! ## Usage
//!
//! ```bash
//! # Serve ./csv.db (run `gradebook import` first)
//! gradebook-mcp
//!
//! # Custom database, natural-language questions enabled
//! GOOGLE_API_KEY=... gradebook-mcp --db-path /path/to/csv.db
//!
//! # Key read from ./.env
//! echo 'GOOGLE_API_KEY=...' > .env && gradebook-mcp
//!
//! # Enable verbose logging
//! gradebook-mcp --verbose
//! ```
//!
//! ## MCP Configuration
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "gradebook": {
//!       "command": "gradebook-mcp",
//!       "args": ["--db-path", "/path/to/csv.db"],
//!       "env": { "GOOGLE_API_KEY": "..." }
//!     }
//!   }
//! }
//! ```

use anyhow::Result;
use clap::Parser;
use gradebook::mcp::McpServer;
use gradebook::translate::{GeminiTranslator, TranslatorConfig, DEFAULT_MODEL};
use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Gradebook MCP Server - query the student database via Model Context Protocol
#[derive(Parser, Debug)]
#[command(name = "gradebook-mcp")]
#[command(
    author,
    version,
    about = "Gradebook MCP Server - Model Context Protocol interface for the student database"
)]
struct Args {
    /// Path to the SQLite database file
    #[arg(long, short = 'd', env = "GRADEBOOK_DB_PATH")]
    db_path: Option<PathBuf>,

    /// API key for the text-to-SQL model
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// Gemini model used for natural-language questions
    #[arg(long, env = "GRADEBOOK_MODEL", default_value = DEFAULT_MODEL)]
    model: String,

    /// Enable verbose logging (outputs to stderr)
    #[arg(long, short = 'v')]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env next to the server may carry GOOGLE_API_KEY
    dotenvy::dotenv().ok();
    let args = Args::parse();

    // Logs go to stderr; stdout carries the protocol
    let filter = if args.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("error")
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(gradebook::default_db_path);

    tracing::info!(
        "Starting Gradebook MCP server with database: {}",
        db_path.display()
    );

    let mut server = McpServer::new(&db_path)?;
    if let Some(translator) = build_translator(&args)? {
        server = server.with_translator(Box::new(translator));
    }

    server.run().await?;

    Ok(())
}

/// Gemini translator from the key, if one is configured.
///
/// A missing key is logged at `error` so it shows without `--verbose`.
fn build_translator(args: &Args) -> Result<Option<GeminiTranslator>> {
    match args.api_key.as_deref().filter(|key| !key.trim().is_empty()) {
        Some(api_key) => {
            let config = TranslatorConfig::new(api_key).with_model(args.model.as_str());
            Ok(Some(GeminiTranslator::new(config)?))
        }
        None => {
            tracing::error!("GOOGLE_API_KEY not set; natural-language questions are disabled");
            Ok(None)
        }
    }
}
