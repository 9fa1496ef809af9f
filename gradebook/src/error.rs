//! Error types for Gradebook

use thiserror::Error;

/// Gradebook error type
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV reader error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP error talking to the translation model
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Database file does not exist
    #[error("Database not found: {0}")]
    DatabaseNotFound(String),

    /// Table not found
    #[error("Table not found: {0}")]
    TableNotFound(String),

    /// Column not found
    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    /// A student with this id is already stored
    #[error("Duplicate student_id: {0}")]
    DuplicateStudent(i64),

    /// Natural-language translation failed
    #[error("Translation error: {0}")]
    Translation(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

/// Result type alias for Gradebook operations
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True when the error is a primary-key collision on insert
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Error::DuplicateStudent(_))
    }
}
