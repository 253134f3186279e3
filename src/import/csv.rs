use chrono::{DateTime, Utc};
use csv::ReaderBuilder;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::str::FromStr;
use tracing::warn;

use crate::error::{ImportError, LiftRsError, Result};
use crate::import::{has_extension, parse_datetime, HistoryImporter};
use crate::models::{ExerciseRecordSnapshot, MuscleGroup};

/// CSV importer with flexible column mapping
///
/// One row per completed exercise. Muscle columns hold `;`-separated
/// muscle names. Rows with an unparseable date are skipped; unknown
/// muscle names are an error.
pub struct CsvImporter {
    column_mapping: HashMap<String, String>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        // Common column name variations
        Self::add_mapping(
            &mut column_mapping,
            "date",
            &["date", "timestamp", "time", "completed_at", "start_time"],
        );
        Self::add_mapping(&mut column_mapping, "exercise_id", &["exercise_id", "id"]);
        Self::add_mapping(
            &mut column_mapping,
            "exercise_name",
            &["exercise_name", "exercise", "name", "movement"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "primary_muscles",
            &["primary_muscles", "primary", "muscles", "target"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "secondary_muscles",
            &["secondary_muscles", "secondary", "synergists"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "sets",
            &["sets", "set_count", "completed_sets", "completed_set_count"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "total_weight",
            &["total_weight", "weight", "volume", "volume_kg", "tonnage"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "total_reps",
            &["total_reps", "reps", "repetitions"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "duration_minutes",
            &["duration_minutes", "duration", "minutes", "duration_min"],
        );
        Self::add_mapping(
            &mut column_mapping,
            "distance_km",
            &["distance_km", "distance", "dist", "km"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, String>, standard: &str, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), standard.to_string());
        }
    }

    fn normalize_column_name(&self, name: &str) -> String {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");

        self.column_mapping
            .get(&normalized)
            .cloned()
            .unwrap_or(normalized)
    }

    /// Parse CSV content with a header row
    pub fn parse<R: std::io::Read>(&self, input: R) -> Result<Vec<ExerciseRecordSnapshot>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(input);

        let headers = reader.headers().map_err(|e| parse_error(0, e.to_string()))?.clone();
        let header_mapping: HashMap<usize, String> = headers
            .iter()
            .enumerate()
            .map(|(i, header)| (i, self.normalize_column_name(header)))
            .collect();

        if !header_mapping.values().any(|name| name == "date") {
            return Err(ImportError::MissingField {
                field: "date".to_string(),
            }
            .into());
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (row, result) in reader.records().enumerate() {
            let line = row + 1;
            let row_values = result.map_err(|e| parse_error(line, e.to_string()))?;

            let mut date = None;
            let mut snapshot = ExerciseRecordSnapshot::new(DateTime::<Utc>::default());

            for (i, value) in row_values.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let Some(column) = header_mapping.get(&i) else {
                    continue;
                };

                match column.as_str() {
                    "date" => date = parse_datetime(value),
                    "exercise_id" => snapshot.exercise_id = Some(value.to_string()),
                    "exercise_name" => snapshot.exercise_name = Some(value.to_string()),
                    "primary_muscles" => snapshot.primary_muscles = parse_muscles(value, line)?,
                    "secondary_muscles" => snapshot.secondary_muscles = parse_muscles(value, line)?,
                    "sets" => snapshot.completed_set_count = parse_number::<i32>(value, "sets", line)?,
                    "total_weight" => snapshot.total_weight = Some(parse_number(value, "total_weight", line)?),
                    "total_reps" => snapshot.total_reps = Some(parse_number(value, "total_reps", line)?),
                    "duration_minutes" => {
                        snapshot.duration_minutes = Some(parse_number(value, "duration_minutes", line)?)
                    }
                    "distance_km" => snapshot.distance_km = Some(parse_number(value, "distance_km", line)?),
                    _ => {}
                }
            }

            match date {
                Some(date) => {
                    snapshot.date = date;
                    records.push(snapshot);
                }
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(skipped, "Skipped CSV rows without a valid date");
        }

        Ok(records)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryImporter for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<ExerciseRecordSnapshot>> {
        let file = std::fs::File::open(file_path)?;
        self.parse(file)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

fn parse_error(record: usize, reason: String) -> LiftRsError {
    ImportError::ParseError {
        format: "CSV".to_string(),
        record,
        reason,
    }
    .into()
}

fn parse_muscles(value: &str, line: usize) -> Result<BTreeSet<MuscleGroup>> {
    value
        .split(';')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(|name| {
            MuscleGroup::from_str(name).map_err(|_| parse_error(line, format!("unknown muscle group '{}'", name)))
        })
        .collect()
}

fn parse_number<T: FromStr>(value: &str, field: &str, line: usize) -> Result<T> {
    value
        .parse::<T>()
        .map_err(|_| parse_error(line, format!("invalid {} '{}'", field, value)))
}
