//! CSV importer
//!
//! Reads student rows positionally (`id,first_name,last_name,course_name,grade`),
//! validates each one and inserts the valid ones into the store. A bad row is
//! logged and recorded in [`ImportStats`]; it never aborts the run. The only
//! fatal errors are failing to read the source or failing to talk to the store.

use crate::error::{Error, Result};
use crate::record::{parse_id, RowError, StudentRecord};
use crate::store::Store;
use csv::{ByteRecord, ReaderBuilder};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::time::{Duration, Instant};

const UTF8_BOM: char = '\u{feff}';

/// A row that was skipped, with the 1-based source line it starts on
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub row: usize,
    pub error: RowError,
}

/// Statistics from an import run
#[derive(Debug, Clone, Default)]
pub struct ImportStats {
    /// Number of data rows read (the header row is not counted)
    pub rows_read: usize,
    /// Number of rows inserted
    pub rows_imported: usize,
    /// Whether row 1 was recognised as a header and skipped
    pub header_skipped: bool,
    /// Rows that failed validation or insertion
    pub rejected: Vec<RejectedRow>,
    /// Time taken
    pub duration: Duration,
}

impl ImportStats {
    pub fn rows_rejected(&self) -> usize {
        self.rejected.len()
    }
}

/// Outcome of a single source row
#[derive(Debug, Clone)]
pub enum RowStatus {
    Imported(i64),
    HeaderSkipped,
    Rejected(RowError),
}

/// Progress callback for importing
pub trait ImportProgress {
    /// Called once per source row, with its 1-based row number
    fn on_row(&mut self, row: usize, status: &RowStatus);
    /// Called when the import has been committed
    fn on_complete(&mut self, stats: &ImportStats);
}

/// Student CSV importer
pub struct Importer<'a> {
    store: &'a Store,
}

impl<'a> Importer<'a> {
    /// Create a new importer writing into `store`
    pub fn new(store: &'a Store) -> Self {
        Importer { store }
    }

    /// Import a CSV file
    pub fn import_file<P: AsRef<Path>>(&self, path: P) -> Result<ImportStats> {
        self.import_file_with_progress(path, &mut NoopProgress)
    }

    /// Import a CSV file with progress reporting
    pub fn import_file_with_progress<P: AsRef<Path>>(
        &self,
        path: P,
        progress: &mut dyn ImportProgress,
    ) -> Result<ImportStats> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("cannot open {}: {}", path.display(), e),
            ))
        })?;

        tracing::info!("Importing students from {}", path.display());
        self.import_reader_with_progress(file, progress)
    }

    /// Import CSV data from any reader
    pub fn import_reader<R: Read>(&self, reader: R) -> Result<ImportStats> {
        self.import_reader_with_progress(reader, &mut NoopProgress)
    }

    /// Import CSV data from any reader with progress reporting.
    ///
    /// All accepted rows are committed in one transaction before returning.
    pub fn import_reader_with_progress<R: Read>(
        &self,
        reader: R,
        progress: &mut dyn ImportProgress,
    ) -> Result<ImportStats> {
        let start = Instant::now();

        let mut stats = self.store.with_transaction(|store| {
            let mut stats = ImportStats::default();
            let mut csv = ReaderBuilder::new()
                .has_headers(false)
                .flexible(true)
                .from_reader(reader);

            for (index, record) in csv.byte_records().enumerate() {
                let record = record?;
                // Blank lines are skipped by the reader, so number rows by
                // the source line they start on
                let row = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(index + 1);

                let status = match import_row(store, index, &record) {
                    Ok(Some(student_id)) => {
                        stats.rows_read += 1;
                        stats.rows_imported += 1;
                        RowStatus::Imported(student_id)
                    }
                    Ok(None) => {
                        stats.header_skipped = true;
                        RowStatus::HeaderSkipped
                    }
                    Err(RowFailure::Row(error)) => {
                        stats.rows_read += 1;
                        tracing::warn!("Row {}: {}", row, error);
                        stats.rejected.push(RejectedRow {
                            row,
                            error: error.clone(),
                        });
                        RowStatus::Rejected(error)
                    }
                    Err(RowFailure::Fatal(e)) => return Err(e),
                };

                progress.on_row(row, &status);
            }

            Ok(stats)
        })?;

        stats.duration = start.elapsed();
        tracing::info!(
            "Import finished: {} imported, {} rejected in {:?}",
            stats.rows_imported,
            stats.rows_rejected(),
            stats.duration
        );
        progress.on_complete(&stats);

        Ok(stats)
    }
}

enum RowFailure {
    Row(RowError),
    Fatal(Error),
}

/// Validate and insert one record. `Ok(None)` means the row was a header.
fn import_row(
    store: &Store,
    index: usize,
    record: &ByteRecord,
) -> std::result::Result<Option<i64>, RowFailure> {
    let mut fields = decode_fields(record).map_err(RowFailure::Row)?;

    if index == 0 {
        if let Some(first) = fields.first_mut() {
            if first.starts_with(UTF8_BOM) {
                *first = first.trim_start_matches(UTF8_BOM).to_string();
            }
        }
        if is_header(&fields) {
            return Ok(None);
        }
    }

    let student = StudentRecord::from_fields(&fields).map_err(RowFailure::Row)?;

    match store.insert_student(&student) {
        Ok(()) => Ok(Some(student.student_id)),
        Err(Error::DuplicateStudent(id)) => Err(RowFailure::Row(RowError::Duplicate(id))),
        Err(Error::Database(e)) if is_row_constraint(&e) => {
            Err(RowFailure::Row(RowError::Store(e.to_string())))
        }
        Err(e) => Err(RowFailure::Fatal(e)),
    }
}

fn is_row_constraint(err: &rusqlite::Error) -> bool {
    matches!(
        err.sqlite_error_code(),
        Some(rusqlite::ErrorCode::ConstraintViolation)
    )
}

/// A leading row whose first field is not an integer is a header
fn is_header(fields: &[String]) -> bool {
    match fields.first() {
        Some(first) => parse_id(first).is_err(),
        None => true,
    }
}

fn decode_fields(record: &ByteRecord) -> std::result::Result<Vec<String>, RowError> {
    record
        .iter()
        .map(|field| {
            std::str::from_utf8(field)
                .map(str::to_string)
                .map_err(|_| RowError::Encoding)
        })
        .collect()
}

/// No-op progress reporter
struct NoopProgress;

impl ImportProgress for NoopProgress {
    fn on_row(&mut self, _row: usize, _status: &RowStatus) {}
    fn on_complete(&mut self, _stats: &ImportStats) {}
}
