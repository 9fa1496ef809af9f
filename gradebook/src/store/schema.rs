//! Database schema for Gradebook

use crate::error::Result;
use rusqlite::Connection;

/// Name of the single data table
pub const STUDENTS_TABLE: &str = "students";

/// Column names of the students table, in declaration order
pub const STUDENT_COLUMNS: [&str; 5] = [
    "student_id",
    "first_name",
    "last_name",
    "course_name",
    "grade",
];

/// SQL to create the database schema
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS students (
    student_id INTEGER PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    course_name TEXT NOT NULL,
    grade REAL
);
"#;

/// Create the students table if it does not exist yet
pub fn ensure_schema(conn: &Connection) -> Result<()> {
    let table_exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM sqlite_master WHERE type='table' AND name=?1",
        [STUDENTS_TABLE],
        |row| row.get(0),
    )?;

    if !table_exists {
        conn.execute_batch(SCHEMA_SQL)?;
        tracing::info!("Created table '{}'", STUDENTS_TABLE);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column_names(conn: &Connection) -> Vec<String> {
        conn.prepare("PRAGMA table_info(students)")
            .unwrap()
            .query_map([], |row| row.get(1))
            .unwrap()
            .collect::<std::result::Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_schema_creation() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        assert_eq!(column_names(&conn), STUDENT_COLUMNS);
    }

    #[test]
    fn test_idempotent_schema() {
        let conn = Connection::open_in_memory().unwrap();

        ensure_schema(&conn).unwrap();
        conn.execute(
            "INSERT INTO students VALUES (1, 'Ann', 'Lee', 'Math', 3.5)",
            [],
        )
        .unwrap();
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();

        // Existing rows survive repeated schema checks
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM students", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_required_columns_reject_null() {
        let conn = Connection::open_in_memory().unwrap();
        ensure_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO students VALUES (1, NULL, 'Lee', 'Math', 3.5)",
            [],
        );
        assert!(result.is_err());

        // grade is nullable
        conn.execute(
            "INSERT INTO students VALUES (2, 'Bo', 'Kim', 'Math', NULL)",
            [],
        )
        .unwrap();
    }
}
