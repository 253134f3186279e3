//! Workout history import
//!
//! History files feed the CLI; the engine itself only sees
//! [`ExerciseRecordSnapshot`]s.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::path::Path;
use tracing::{debug, info};

use crate::error::{ImportError, Result};
use crate::models::ExerciseRecordSnapshot;

pub mod csv;
pub mod json;

/// Trait for importing exercise history from different file formats
pub trait HistoryImporter {
    /// Check if this importer can handle the given file
    fn can_import(&self, file_path: &Path) -> bool;

    /// Import exercise records from the file
    fn import_file(&self, file_path: &Path) -> Result<Vec<ExerciseRecordSnapshot>>;

    /// Get the format name for this importer
    fn format_name(&self) -> &'static str;
}

/// Manager for coordinating different import formats
pub struct ImportManager {
    importers: Vec<Box<dyn HistoryImporter>>,
}

impl ImportManager {
    /// Create a new import manager with all available importers
    pub fn new() -> Self {
        let importers: Vec<Box<dyn HistoryImporter>> = vec![
            Box::new(csv::CsvImporter::new()),
            Box::new(json::JsonImporter::new()),
        ];

        Self { importers }
    }

    /// Import a single file, auto-detecting the format
    ///
    /// Records are returned sorted by date.
    pub fn import_file(&self, file_path: &Path) -> Result<Vec<ExerciseRecordSnapshot>> {
        let importer = self
            .importers
            .iter()
            .find(|importer| importer.can_import(file_path))
            .ok_or_else(|| ImportError::UnsupportedFormat {
                path: file_path.to_path_buf(),
            })?;

        debug!(
            path = %file_path.display(),
            format = importer.format_name(),
            "Importing history"
        );

        let mut records = importer.import_file(file_path)?;
        records.sort_by_key(|r| r.date);

        info!(
            path = %file_path.display(),
            records = records.len(),
            "History imported"
        );
        Ok(records)
    }
}

impl Default for ImportManager {
    fn default() -> Self {
        Self::new()
    }
}

/// True when the file has the given extension, ignoring case
pub(crate) fn has_extension(file_path: &Path, wanted: &str) -> bool {
    file_path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(wanted))
        .unwrap_or(false)
}

/// Parse the timestamp formats found in exported workout logs
///
/// Naive timestamps are taken as UTC; a bare date means midnight.
pub(crate) fn parse_datetime(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let formats = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%d/%m/%Y %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
    ];
    for format in &formats {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|naive| DateTime::from_naive_utc_and_offset(naive, Utc));
    }

    // Seconds since epoch
    value
        .parse::<i64>()
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
}
