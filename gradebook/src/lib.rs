//! # Gradebook
//!
//! Load a CSV of student grades into SQLite and query it over MCP, either
//! with SQL or with plain-language questions translated by a hosted model.
//!
//! Gradebook provides:
//! - **Importer** that validates rows and skips bad ones without aborting
//! - **Store** over a single `students` table keyed by `student_id`
//! - **Query gateway** rendering SQL results as text
//! - **Text-to-SQL** via the Gemini API, with SQL extraction from model output
//! - **MCP server** for AI agent integration
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gradebook::{Importer, Store};
//!
//! let store = Store::open("csv.db").unwrap();
//!
//! let stats = Importer::new(&store).import_file("data.csv").unwrap();
//! println!("{} imported, {} rejected", stats.rows_imported, stats.rows_rejected());
//!
//! let gateway = gradebook::Gateway::new(store);
//! println!("{}", gateway.execute_query("SELECT COUNT(*) FROM students"));
//! ```

pub mod error;
pub mod gateway;
pub mod importer;
pub mod mcp;
pub mod record;
pub mod store;
pub mod translate;

// Re-exports for convenience
pub use error::{Error, Result};
pub use gateway::Gateway;
pub use importer::{ImportStats, Importer, RejectedRow};
pub use record::{RowError, StudentRecord};
pub use store::{QueryRows, Store};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default database file, relative to the working directory
pub const DEFAULT_DB_FILE: &str = "csv.db";

/// Default CSV source, relative to the working directory
pub const DEFAULT_CSV_FILE: &str = "data.csv";

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_DB_FILE)
}

/// Default CSV path
pub fn default_csv_path() -> std::path::PathBuf {
    std::path::PathBuf::from(DEFAULT_CSV_FILE)
}
