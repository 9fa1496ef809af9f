//! Gradebook CLI - import student CSVs and query the resulting database

use anyhow::Result;
use clap::{Parser, Subcommand};
use gradebook::mcp::McpServer;
use gradebook::translate::{GeminiTranslator, SqlTranslator, TranslatorConfig, DEFAULT_MODEL};
use gradebook::{Gateway, ImportStats, Importer, Store};
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "gradebook")]
#[command(
    author,
    version,
    about = "Gradebook - import student grades into SQLite and query them"
)]
#[command(propagate_version = true)]
struct Cli {
    /// Database path (default: ./csv.db)
    #[arg(long, short = 'd', env = "GRADEBOOK_DB_PATH", global = true)]
    database: Option<PathBuf>,

    /// API key for the text-to-SQL model
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true)]
    api_key: Option<String>,

    /// Gemini model used for natural-language questions
    #[arg(long, env = "GRADEBOOK_MODEL", default_value = DEFAULT_MODEL, global = true)]
    model: String,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a CSV of student records (id,first_name,last_name,course_name,grade)
    Import {
        /// CSV file (default: ./data.csv)
        #[arg(env = "GRADEBOOK_CSV_PATH")]
        csv: Option<PathBuf>,
    },

    /// Run a SQL query and print the first column of each row
    Query {
        /// SQL statement
        sql: String,
    },

    /// Ask a question in plain language
    Ask {
        /// The question
        question: String,
    },

    /// Show database status and statistics
    Status {
        /// Output format (text, json)
        #[arg(long, short = 'o', default_value = "text")]
        format: String,
    },

    /// Start MCP server (stdio transport)
    Serve,
}

#[tokio::main]
async fn main() -> Result<()> {
    // A .env in the working directory may carry GOOGLE_API_KEY and friends
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // stderr keeps stdout clean for query output and the MCP protocol
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let db_path = cli.database.unwrap_or_else(gradebook::default_db_path);
    let translator = build_translator(cli.api_key.as_deref(), &cli.model)?;

    match cli.command {
        Commands::Import { csv } => {
            let csv_path = csv.unwrap_or_else(gradebook::default_csv_path);
            cmd_import(&db_path, &csv_path)
        }
        Commands::Query { sql } => cmd_query(&db_path, &sql),
        Commands::Ask { question } => cmd_ask(&db_path, translator, &question).await,
        Commands::Status { format } => cmd_status(&db_path, &format),
        Commands::Serve => cmd_serve(&db_path, translator).await,
    }
}

fn build_translator(api_key: Option<&str>, model: &str) -> Result<Option<Box<dyn SqlTranslator>>> {
    match api_key.filter(|key| !key.trim().is_empty()) {
        Some(key) => {
            let config = TranslatorConfig::new(key).with_model(model);
            Ok(Some(Box::new(GeminiTranslator::new(config)?)))
        }
        None => Ok(None),
    }
}

fn cmd_import(db_path: &Path, csv_path: &Path) -> Result<()> {
    let store = Store::open(db_path)?;

    println!("Importing {} into {}...", csv_path.display(), db_path.display());
    let stats = Importer::new(&store).import_file(csv_path)?;
    store.close()?;

    print_import_summary(&stats);
    Ok(())
}

fn print_import_summary(stats: &ImportStats) {
    println!(
        "Import complete:\n  Rows read: {}\n  Imported: {}\n  Rejected: {}\n  Header skipped: {}\n  Duration: {:?}",
        stats.rows_read,
        stats.rows_imported,
        stats.rows_rejected(),
        if stats.header_skipped { "yes" } else { "no" },
        stats.duration
    );

    if !stats.rejected.is_empty() {
        println!("\nRejected rows:");
        for rejected in &stats.rejected {
            println!("  Row {}: {}", rejected.row, rejected.error);
        }
    }
}

fn cmd_query(db_path: &Path, sql: &str) -> Result<()> {
    let gateway = Gateway::new(Store::open_existing(db_path)?);
    println!("{}", gateway.execute_query(sql));
    Ok(())
}

async fn cmd_ask(
    db_path: &Path,
    translator: Option<Box<dyn SqlTranslator>>,
    question: &str,
) -> Result<()> {
    let translator = translator.ok_or_else(|| {
        anyhow::anyhow!("GOOGLE_API_KEY is not set. Export it or pass --api-key.")
    })?;
    let gateway = Gateway::new(Store::open_existing(db_path)?).with_translator(translator);

    let sql = gateway.translate_question_to_sql(question).await?;
    println!("SQL: {}\n", sql);
    println!("{}", gateway.execute_query(&sql));
    Ok(())
}

fn cmd_status(db_path: &Path, format: &str) -> Result<()> {
    let store = match Store::open_existing(db_path) {
        Ok(store) => store,
        Err(gradebook::Error::DatabaseNotFound(_)) => {
            println!("Database not found. Run 'gradebook import' first.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    let status = store.status()?;

    if format == "json" {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("Gradebook Status");
    println!("================");
    println!("Database: {}", status.path);
    println!("Size: {}", format_bytes(status.database_size_bytes));
    println!("Tables: {}", status.tables.join(", "));
    println!("Students: {}", status.students);
    Ok(())
}

async fn cmd_serve(db_path: &Path, translator: Option<Box<dyn SqlTranslator>>) -> Result<()> {
    let mut server = McpServer::new(db_path)?;
    if let Some(translator) = translator {
        server = server.with_translator(translator);
    }
    Ok(server.run().await?)
}

/// Format bytes as human-readable size
fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes < GB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    }
}
