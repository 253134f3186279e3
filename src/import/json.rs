use std::fs;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{has_extension, HistoryImporter};
use crate::models::ExerciseRecordSnapshot;

/// Imports a JSON array of exercise records
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse history from a JSON string
    pub fn parse(content: &str) -> Result<Vec<ExerciseRecordSnapshot>> {
        serde_json::from_str(content).map_err(|e| {
            ImportError::ParseError {
                format: "JSON".to_string(),
                record: e.line(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl HistoryImporter for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<ExerciseRecordSnapshot>> {
        let content = fs::read_to_string(file_path)?;
        Self::parse(&content)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LiftRsError;
    use crate::models::MuscleGroup;

    #[test]
    fn test_parse_minimal_records() {
        let json = r#"[
            {"date": "2024-03-14T10:00:00Z", "exercise_name": "Pull-Up",
             "primary_muscles": ["back"], "secondary_muscles": ["biceps"], "completed_set_count": 4},
            {"date": "2024-03-13T07:00:00Z", "duration_minutes": 30.0, "distance_km": 5.0,
             "primary_muscles": ["quadriceps", "calves"]}
        ]"#;

        let records = JsonImporter::parse(json).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].primary_muscles.contains(&MuscleGroup::Back));
        assert!(records[0].secondary_muscles.contains(&MuscleGroup::Biceps));
        assert_eq!(records[1].completed_set_count, 0);
        assert_eq!(records[1].distance_km, Some(5.0));
    }

    #[test]
    fn test_unknown_muscle_is_parse_error() {
        let json = r#"[{"date": "2024-03-14T10:00:00Z", "primary_muscles": ["wings"]}]"#;
        assert!(matches!(
            JsonImporter::parse(json),
            Err(LiftRsError::Import(ImportError::ParseError { .. }))
        ));
    }

    #[test]
    fn test_import_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        fs::write(&path, "[]").unwrap();

        let importer = JsonImporter::new();
        assert!(importer.can_import(&path));
        assert!(importer.import_file(&path).unwrap().is_empty());
    }
}
