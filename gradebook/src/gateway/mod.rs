//! Query gateway
//!
//! Text-in, text-out operations over the store: listing tables, columns and
//! rows, running SQL, and answering natural-language questions through a
//! [`SqlTranslator`]. Every operation returns display text. Query failures
//! come back as an error message rather than an `Err`, so a bad statement
//! never takes down whoever is serving requests.

use crate::error::{Error, Result};
use crate::store::{render_value, Store, STUDENTS_TABLE};
use crate::translate::{extract_sql, SqlTranslator};
use serde_json::json;

/// Maximum rows returned by bulk listings
pub const MAX_LISTED_ROWS: usize = 10;

/// Sample rows per table included in translation prompts
const SCHEMA_SAMPLE_ROWS: usize = 3;

/// Message returned by `execute_query` when a statement yields no rows
pub const NO_RESULTS_MESSAGE: &str = "Query executed successfully, but returned no results.";

pub struct Gateway {
    store: Store,
    translator: Option<Box<dyn SqlTranslator>>,
}

impl Gateway {
    pub fn new(store: Store) -> Self {
        Self {
            store,
            translator: None,
        }
    }

    pub fn with_translator(mut self, translator: Box<dyn SqlTranslator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Release the store
    pub fn into_store(self) -> Store {
        self.store
    }

    pub fn has_translator(&self) -> bool {
        self.translator.is_some()
    }

    /// Table names as a JSON array
    pub fn list_tables(&self) -> String {
        match self.store.table_names() {
            Ok(tables) if tables.is_empty() => {
                "No tables available in the database.".to_string()
            }
            Ok(tables) => json!(tables).to_string(),
            Err(e) => format!("Error listing tables: {}", e),
        }
    }

    /// Column names of `table` as a JSON array
    pub fn list_columns(&self, table: &str) -> String {
        match self.store.column_names(table) {
            Ok(columns) if columns.is_empty() => {
                format!("No columns found for table {}.", table)
            }
            Ok(columns) => json!(columns).to_string(),
            Err(e) => format!("Error listing columns of table {}: {}", table, e),
        }
    }

    /// Up to [`MAX_LISTED_ROWS`] rows of `table` as a JSON array of arrays
    pub fn list_rows(&self, table: &str) -> String {
        match self.store.table_rows(table, Some(MAX_LISTED_ROWS)) {
            Ok(rows) if rows.is_empty() => format!("No rows found in table {}.", table),
            Ok(rows) => json!(rows.json_rows()).to_string(),
            Err(e) => format!("Error listing rows of table {}: {}", table, e),
        }
    }

    /// Every value of one students column, one per line
    pub fn list_column_data(&self, column: &str) -> String {
        match self.store.column_values(column) {
            Ok(values) if values.is_empty() => {
                format!("No data found in column '{}'.", column)
            }
            Ok(values) => values
                .iter()
                .map(render_value)
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("Error retrieving data for column {}: {}", column, e),
        }
    }

    /// Every student, one per line, as `column: value` pairs
    pub fn list_all_student_data(&self) -> String {
        match self.store.table_rows(STUDENTS_TABLE, None) {
            Ok(rows) if rows.is_empty() => "No data found in the students table.".to_string(),
            Ok(rows) => rows
                .rows
                .iter()
                .map(|row| {
                    rows.columns
                        .iter()
                        .zip(row)
                        .map(|(column, value)| format!("{}: {}", column, render_value(value)))
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => format!("Error retrieving data from the students table: {}", e),
        }
    }

    /// Run SQL text and render the first column of each row, one per line
    pub fn execute_query(&self, sql: &str) -> String {
        tracing::debug!("Executing SQL: {}", sql);

        match self.store.execute(sql) {
            Ok(rows) if rows.is_empty() => NO_RESULTS_MESSAGE.to_string(),
            Ok(rows) => rows
                .rows
                .iter()
                .map(|row| row.first().map(render_value).unwrap_or_default())
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => {
                tracing::debug!("SQL execution failed: {}", e);
                format!("SQL execution error: {}", e)
            }
        }
    }

    /// Ask the translator for SQL answering `question`
    pub async fn translate_question_to_sql(&self, question: &str) -> Result<String> {
        let translator = self.translator.as_ref().ok_or_else(|| {
            Error::ConfigError(format!(
                "natural-language queries need {} to be set",
                crate::translate::API_KEY_ENV
            ))
        })?;

        let schema = self.store.schema_description(SCHEMA_SAMPLE_ROWS)?;
        tracing::info!("Translating question with {}", translator.model());

        let raw = translator.complete(question, &schema).await?;
        tracing::debug!("Model output: {}", raw);

        Ok(extract_sql(&raw))
    }

    /// Translate `question` to SQL and execute it
    pub async fn ask_and_execute(&self, question: &str) -> String {
        match self.translate_question_to_sql(question).await {
            Ok(sql) => self.execute_query(&sql),
            Err(e) => format!("Could not translate question to SQL: {}", e),
        }
    }
}
