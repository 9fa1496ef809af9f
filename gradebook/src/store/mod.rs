//! Database store for Gradebook
//!
//! The store owns the single SQLite connection used by both the importer and
//! the query gateway. It holds one table, `students`, keyed by `student_id`.

mod schema;

use crate::error::{Error, Result};
use crate::record::StudentRecord;
use rusqlite::types::Value;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use serde::Serialize;
use std::path::{Path, PathBuf};

pub use schema::{STUDENTS_TABLE, STUDENT_COLUMNS};

/// Rows returned by an arbitrary statement, with their column names
#[derive(Debug, Clone, Default)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryRows {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows converted to JSON values, for structured output
    pub fn json_rows(&self) -> Vec<Vec<serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| row.iter().map(value_to_json).collect())
            .collect()
    }
}

/// Summary of the database for status output
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub path: String,
    pub tables: Vec<String>,
    pub students: i64,
    pub database_size_bytes: u64,
}

/// Render a single SQLite value as display text
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Integer(i) => i.to_string(),
        // Debug keeps the fractional part on whole numbers ("4.0", not "4")
        Value::Real(f) => format!("{:?}", f),
        Value::Text(s) => s.clone(),
        Value::Blob(b) => format!("<blob {} bytes>", b.len()),
    }
}

/// Convert a SQLite value to JSON
pub fn value_to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Integer(i) => serde_json::json!(i),
        Value::Real(f) => serde_json::json!(f),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Blob(b) => serde_json::Value::String(format!("<blob {} bytes>", b.len())),
    }
}

/// Quote an identifier for interpolation into SQL
fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// The main database store
pub struct Store {
    conn: Connection,
    path: PathBuf,
}

impl Store {
    /// Open or create a database at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(&path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        let store = Store { conn, path };
        store.ensure_schema()?;

        Ok(store)
    }

    /// Open a database that must already exist on disk.
    ///
    /// Readers use this: the file is left as found, with no journal-mode
    /// change and no schema creation.
    pub fn open_existing<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::DatabaseNotFound(path.display().to_string()));
        }

        let conn = Connection::open(path)?;
        Ok(Store {
            conn,
            path: path.to_path_buf(),
        })
    }

    /// Open an in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Store {
            conn,
            path: PathBuf::from(":memory:"),
        };
        store.ensure_schema()?;
        Ok(store)
    }

    /// Close the connection, surfacing any error SQLite reports on close
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    fn ensure_schema(&self) -> Result<()> {
        schema::ensure_schema(&self.conn)
    }

    /// Get the database path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` inside a single transaction, committing only if it succeeds
    pub fn with_transaction<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Self) -> Result<T>,
    {
        let tx = self.conn.unchecked_transaction()?;
        let out = f(self)?;
        tx.commit()?;
        Ok(out)
    }

    // -------------------------------------------------------------------------
    // Student operations
    // -------------------------------------------------------------------------

    /// Insert a student. A primary-key collision returns `Error::DuplicateStudent`
    /// and leaves the existing row untouched.
    pub fn insert_student(&self, record: &StudentRecord) -> Result<()> {
        let result = self.conn.execute(
            "INSERT INTO students (student_id, first_name, last_name, course_name, grade)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.student_id,
                record.first_name,
                record.last_name,
                record.course_name,
                record.grade
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == ErrorCode::ConstraintViolation
                    && err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY =>
            {
                Err(Error::DuplicateStudent(record.student_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get a student by id
    pub fn get_student(&self, student_id: i64) -> Result<Option<StudentRecord>> {
        let record = self
            .conn
            .query_row(
                "SELECT student_id, first_name, last_name, course_name, grade
                 FROM students WHERE student_id = ?1",
                [student_id],
                |row| {
                    Ok(StudentRecord {
                        student_id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                        course_name: row.get(3)?,
                        grade: row.get::<_, Option<f64>>(4)?.unwrap_or(f64::NAN),
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Count stored students
    pub fn count_students(&self) -> Result<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))?;
        Ok(count)
    }

    // -------------------------------------------------------------------------
    // Introspection
    // -------------------------------------------------------------------------

    /// List user tables
    pub fn table_names(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master
             WHERE type='table' AND name NOT LIKE 'sqlite_%'
             ORDER BY name",
        )?;

        let names = stmt
            .query_map([], |row| row.get(0))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(names)
    }

    /// List the columns of a table in declaration order. Unknown tables yield
    /// an empty list.
    pub fn column_names(&self, table: &str) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;

        let names = stmt
            .query_map([], |row| row.get(1))?
            .collect::<std::result::Result<Vec<String>, _>>()?;

        Ok(names)
    }

    fn require_table(&self, table: &str) -> Result<()> {
        if self.table_names()?.iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(Error::TableNotFound(table.to_string()))
        }
    }

    /// Fetch rows of a table, optionally capped
    pub fn table_rows(&self, table: &str, limit: Option<usize>) -> Result<QueryRows> {
        self.require_table(table)?;

        let mut sql = format!("SELECT * FROM {}", quote_ident(table));
        if let Some(limit) = limit {
            sql.push_str(&format!(" LIMIT {}", limit));
        }
        self.execute(&sql)
    }

    /// Fetch every value of one column of the students table
    pub fn column_values(&self, column: &str) -> Result<Vec<Value>> {
        // SQLite falls back to a string literal for unknown double-quoted
        // identifiers, so the column has to be checked first.
        if !self.column_names(STUDENTS_TABLE)?.iter().any(|c| c == column) {
            return Err(Error::ColumnNotFound(column.to_string()));
        }

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM {}",
            quote_ident(column),
            STUDENTS_TABLE
        ))?;

        let values = stmt
            .query_map([], |row| row.get::<_, Value>(0))?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(values)
    }

    /// Execute arbitrary SQL text and collect every result row
    pub fn execute(&self, sql: &str) -> Result<QueryRows> {
        let mut stmt = self.conn.prepare(sql)?;

        let columns: Vec<String> = stmt
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        let width = columns.len();

        let rows = stmt
            .query_map([], |row| {
                (0..width)
                    .map(|i| row.get::<_, Value>(i))
                    .collect::<std::result::Result<Vec<_>, _>>()
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(QueryRows { columns, rows })
    }

    /// Describe every table as DDL plus a few sample rows, for prompting a
    /// text-to-SQL model
    pub fn schema_description(&self, sample_rows: usize) -> Result<String> {
        let mut sections = Vec::new();

        for table in self.table_names()? {
            let ddl: String = self.conn.query_row(
                "SELECT sql FROM sqlite_master WHERE type='table' AND name=?1",
                [&table],
                |row| row.get(0),
            )?;

            let sample = self.table_rows(&table, Some(sample_rows))?;
            let mut section = format!("{}\n\n/*\n", ddl.trim());
            section.push_str(&format!(
                "{} rows from {} table:\n{}\n",
                sample_rows,
                table,
                sample.columns.join("\t")
            ));
            for row in &sample.rows {
                let cells: Vec<String> = row.iter().map(render_value).collect();
                section.push_str(&cells.join("\t"));
                section.push('\n');
            }
            section.push_str("*/");
            sections.push(section);
        }

        Ok(sections.join("\n\n"))
    }

    /// Get database file size in bytes
    pub fn database_size(&self) -> Result<u64> {
        if self.path.to_str() == Some(":memory:") {
            return Ok(0);
        }
        let metadata = std::fs::metadata(&self.path)?;
        Ok(metadata.len())
    }

    /// Collect a status summary
    pub fn status(&self) -> Result<StoreStatus> {
        let tables = self.table_names()?;
        let students = if tables.iter().any(|t| t == STUDENTS_TABLE) {
            self.count_students()?
        } else {
            0
        };

        Ok(StoreStatus {
            path: self.path.display().to_string(),
            tables,
            students,
            database_size_bytes: self.database_size().unwrap_or(0),
        })
    }
}
