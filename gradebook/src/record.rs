//! Student record type and row validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of positional fields in a source row
pub const FIELD_COUNT: usize = 5;

/// A validated student row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentRecord {
    pub student_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub course_name: String,
    pub grade: f64,
}

/// Why a single source row was rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RowError {
    #[error("expected {expected} fields, found {found}")]
    MissingFields { expected: usize, found: usize },

    #[error("invalid student_id '{0}': not an integer")]
    InvalidId(String),

    #[error("{0} is empty")]
    EmptyField(&'static str),

    #[error("invalid grade '{0}': not a number")]
    InvalidGrade(String),

    #[error("duplicate student_id {0}")]
    Duplicate(i64),

    #[error("row is not valid UTF-8")]
    Encoding,

    #[error("store rejected row: {0}")]
    Store(String),
}

impl StudentRecord {
    /// Validate and coerce positional fields `[id, first_name, last_name, course_name, grade]`.
    ///
    /// Fields after the fifth are ignored.
    pub fn from_fields<S: AsRef<str>>(fields: &[S]) -> Result<Self, RowError> {
        if fields.len() < FIELD_COUNT {
            return Err(RowError::MissingFields {
                expected: FIELD_COUNT,
                found: fields.len(),
            });
        }

        let student_id = parse_id(fields[0].as_ref())?;
        let first_name = required_text(fields[1].as_ref(), "first_name")?;
        let last_name = required_text(fields[2].as_ref(), "last_name")?;
        let course_name = required_text(fields[3].as_ref(), "course_name")?;
        let grade = parse_grade(fields[4].as_ref())?;

        Ok(StudentRecord {
            student_id,
            first_name,
            last_name,
            course_name,
            grade,
        })
    }
}

/// Parse a student id, tolerating surrounding whitespace
pub fn parse_id(raw: &str) -> Result<i64, RowError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| RowError::InvalidId(raw.to_string()))
}

fn required_text(raw: &str, field: &'static str) -> Result<String, RowError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(RowError::EmptyField(field));
    }
    Ok(trimmed.to_string())
}

fn parse_grade(raw: &str) -> Result<f64, RowError> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| RowError::InvalidGrade(raw.to_string()))
}
