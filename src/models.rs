use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{LiftRsError, Result};

/// Anatomical muscle groups tracked by the fatigue model
///
/// Declaration order is the canonical iteration order and the final
/// tiebreak wherever muscles are ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MuscleGroup {
    Chest,
    Shoulders,
    Traps,
    Back,
    Biceps,
    Triceps,
    Forearms,
    Core,
    Quadriceps,
    Hamstrings,
    Glutes,
    Calves,
}

impl MuscleGroup {
    /// All muscle groups for iteration
    pub fn all() -> &'static [MuscleGroup] {
        &[
            MuscleGroup::Chest,
            MuscleGroup::Shoulders,
            MuscleGroup::Traps,
            MuscleGroup::Back,
            MuscleGroup::Biceps,
            MuscleGroup::Triceps,
            MuscleGroup::Forearms,
            MuscleGroup::Core,
            MuscleGroup::Quadriceps,
            MuscleGroup::Hamstrings,
            MuscleGroup::Glutes,
            MuscleGroup::Calves,
        ]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            MuscleGroup::Chest => "Chest",
            MuscleGroup::Shoulders => "Shoulders",
            MuscleGroup::Traps => "Traps",
            MuscleGroup::Back => "Back",
            MuscleGroup::Biceps => "Biceps",
            MuscleGroup::Triceps => "Triceps",
            MuscleGroup::Forearms => "Forearms",
            MuscleGroup::Core => "Core",
            MuscleGroup::Quadriceps => "Quadriceps",
            MuscleGroup::Hamstrings => "Hamstrings",
            MuscleGroup::Glutes => "Glutes",
            MuscleGroup::Calves => "Calves",
        }
    }

    /// Default size class assignment
    pub fn default_size_class(&self) -> SizeClass {
        match self {
            MuscleGroup::Biceps
            | MuscleGroup::Triceps
            | MuscleGroup::Forearms
            | MuscleGroup::Core
            | MuscleGroup::Calves => SizeClass::Small,
            MuscleGroup::Chest | MuscleGroup::Shoulders | MuscleGroup::Traps => SizeClass::Medium,
            MuscleGroup::Back
            | MuscleGroup::Quadriceps
            | MuscleGroup::Hamstrings
            | MuscleGroup::Glutes => SizeClass::Large,
        }
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for MuscleGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for MuscleGroup {
    type Err = LiftRsError;

    fn from_str(s: &str) -> Result<Self> {
        let normalized = s.trim().to_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "chest" | "pecs" | "pectorals" => Ok(MuscleGroup::Chest),
            "shoulders" | "delts" | "deltoids" => Ok(MuscleGroup::Shoulders),
            "traps" | "trapezius" => Ok(MuscleGroup::Traps),
            "back" | "lats" | "upper_back" | "lower_back" => Ok(MuscleGroup::Back),
            "biceps" => Ok(MuscleGroup::Biceps),
            "triceps" => Ok(MuscleGroup::Triceps),
            "forearms" | "grip" => Ok(MuscleGroup::Forearms),
            "core" | "abs" | "abdominals" | "obliques" => Ok(MuscleGroup::Core),
            "quadriceps" | "quads" => Ok(MuscleGroup::Quadriceps),
            "hamstrings" | "hams" => Ok(MuscleGroup::Hamstrings),
            "glutes" | "gluteus" => Ok(MuscleGroup::Glutes),
            "calves" | "calf" => Ok(MuscleGroup::Calves),
            _ => Err(LiftRsError::UnknownMuscleGroup {
                name: s.to_string(),
            }),
        }
    }
}

/// Muscle size class, which sets the baseline recovery constant and the
/// saturation threshold of the fatigue score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeClass {
    Small,
    Medium,
    Large,
}

impl fmt::Display for SizeClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeClass::Small => write!(f, "small"),
            SizeClass::Medium => write!(f, "medium"),
            SizeClass::Large => write!(f, "large"),
        }
    }
}

/// Size class assignment for every muscle group
///
/// Starts from [`MuscleGroup::default_size_class`] and accepts overrides by
/// muscle name, so the table can be completed against a full exercise
/// library without touching code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MuscleTable {
    classes: [SizeClass; 12],
}

impl Default for MuscleTable {
    fn default() -> Self {
        let mut classes = [SizeClass::Medium; 12];
        for muscle in MuscleGroup::all() {
            classes[muscle.index()] = muscle.default_size_class();
        }
        Self { classes }
    }
}

impl MuscleTable {
    /// Build the table from name-keyed overrides
    ///
    /// Unknown muscle names are a precondition violation and are reported
    /// rather than ignored.
    pub fn with_overrides(overrides: &BTreeMap<String, SizeClass>) -> Result<Self> {
        let mut table = Self::default();
        for (name, class) in overrides {
            let muscle: MuscleGroup = name.parse()?;
            table.set(muscle, *class);
        }
        Ok(table)
    }

    pub fn size_class(&self, muscle: MuscleGroup) -> SizeClass {
        self.classes[muscle.index()]
    }

    pub fn set(&mut self, muscle: MuscleGroup, class: SizeClass) {
        self.classes[muscle.index()] = class;
    }
}

/// Immutable summary of one completed exercise within a session
///
/// Produced by the history provider; the engine only reads it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseRecordSnapshot {
    /// When the exercise was completed
    pub date: DateTime<Utc>,

    /// Catalog identifier, if the exercise came from the catalog
    #[serde(default)]
    pub exercise_id: Option<String>,

    /// Display name of the exercise
    #[serde(default)]
    pub exercise_name: Option<String>,

    /// Muscles doing the main work
    #[serde(default)]
    pub primary_muscles: BTreeSet<MuscleGroup>,

    /// Assisting muscles, counted at reduced engagement
    #[serde(default)]
    pub secondary_muscles: BTreeSet<MuscleGroup>,

    /// Number of completed working sets
    #[serde(default)]
    pub completed_set_count: i32,

    /// Total weight moved in kilograms
    #[serde(default)]
    pub total_weight: Option<f64>,

    /// Total repetitions across all sets
    #[serde(default)]
    pub total_reps: Option<f64>,

    /// Duration in minutes
    #[serde(default)]
    pub duration_minutes: Option<f64>,

    /// Distance in kilometers
    #[serde(default)]
    pub distance_km: Option<f64>,
}

impl ExerciseRecordSnapshot {
    /// Create a bare snapshot with no muscles or metrics
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            date,
            exercise_id: None,
            exercise_name: None,
            primary_muscles: BTreeSet::new(),
            secondary_muscles: BTreeSet::new(),
            completed_set_count: 0,
            total_weight: None,
            total_reps: None,
            duration_minutes: None,
            distance_km: None,
        }
    }

    /// Engagement of a muscle in this exercise: 1.0 primary, 0.5 secondary-only
    pub fn engagement(&self, muscle: MuscleGroup, secondary_weight: f64) -> Option<f64> {
        if self.primary_muscles.contains(&muscle) {
            Some(1.0)
        } else if self.secondary_muscles.contains(&muscle) {
            Some(secondary_weight)
        } else {
            None
        }
    }

    pub fn engages(&self, muscle: MuscleGroup) -> bool {
        self.primary_muscles.contains(&muscle) || self.secondary_muscles.contains(&muscle)
    }

    /// Key used to track exercise recency: the catalog id, else the name
    ///
    /// Both are normalized with [`normalize_exercise_key`], so a record logged
    /// as "Seated Calf Raise" matches the catalog id `seated_calf_raise`.
    pub fn exercise_key(&self) -> Option<String> {
        self.exercise_id
            .as_deref()
            .map(normalize_exercise_key)
            .filter(|k| !k.is_empty())
            .or_else(|| self.exercise_name.as_deref().map(normalize_exercise_key))
            .filter(|k| !k.is_empty())
    }
}

/// Lowercase snake_case form of an exercise id or display name
///
/// Apostrophes are dropped and every other run of non-alphanumeric
/// characters becomes a single underscore.
pub fn normalize_exercise_key(raw: &str) -> String {
    let mut key = String::with_capacity(raw.len());
    for c in raw.trim().chars().filter(|c| *c != '\'' && *c != '’') {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.is_empty() && !key.ends_with('_') {
            key.push('_');
        }
    }
    while key.ends_with('_') {
        key.pop();
    }
    key
}

/// Equipment needed for a catalog exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Equipment {
    Bodyweight,
    Dumbbell,
    Barbell,
    Kettlebell,
    Cable,
    Machine,
    Band,
}

/// Exercise metadata supplied by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseDefinition {
    pub id: String,
    pub name: String,
    pub primary_muscles: Vec<MuscleGroup>,
    #[serde(default)]
    pub secondary_muscles: Vec<MuscleGroup>,
    pub equipment: Equipment,
}

impl ExerciseDefinition {
    pub fn targets(&self, muscle: MuscleGroup) -> bool {
        self.primary_muscles.contains(&muscle)
    }

    /// Keys under which history may record this exercise: its id and its name
    pub fn recency_keys(&self) -> Vec<String> {
        let mut keys = vec![normalize_exercise_key(&self.id)];
        let by_name = normalize_exercise_key(&self.name);
        if by_name != keys[0] {
            keys.push(by_name);
        }
        keys.retain(|k| !k.is_empty());
        keys
    }
}

/// Recovery inputs from the biometric provider; any field may be absent
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RecoverySignals {
    /// Total sleep last night in minutes
    #[serde(default)]
    pub total_sleep_minutes: Option<f64>,

    /// Fraction of sleep spent in deep sleep (0-1)
    #[serde(default)]
    pub deep_ratio: Option<f64>,

    /// Fraction of sleep spent in REM sleep (0-1)
    #[serde(default)]
    pub rem_ratio: Option<f64>,

    /// Today's HRV expressed as a z-score against the personal baseline
    #[serde(default)]
    pub hrv_z_score: Option<f64>,

    /// Resting heart rate minus baseline, in bpm
    #[serde(default)]
    pub rhr_delta: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_muscle_group_parsing() {
        assert_eq!("Quads".parse::<MuscleGroup>().unwrap(), MuscleGroup::Quadriceps);
        assert_eq!("lower back".parse::<MuscleGroup>().unwrap(), MuscleGroup::Back);
        assert!(matches!(
            "wings".parse::<MuscleGroup>(),
            Err(LiftRsError::UnknownMuscleGroup { .. })
        ));
    }

    #[test]
    fn test_default_size_classes() {
        let table = MuscleTable::default();
        assert_eq!(table.size_class(MuscleGroup::Biceps), SizeClass::Small);
        assert_eq!(table.size_class(MuscleGroup::Chest), SizeClass::Medium);
        assert_eq!(table.size_class(MuscleGroup::Quadriceps), SizeClass::Large);
        assert_eq!(MuscleGroup::all().len(), 12);
    }

    #[test]
    fn test_table_overrides() {
        let mut overrides = BTreeMap::new();
        overrides.insert("traps".to_string(), SizeClass::Small);
        let table = MuscleTable::with_overrides(&overrides).unwrap();
        assert_eq!(table.size_class(MuscleGroup::Traps), SizeClass::Small);

        overrides.insert("neck".to_string(), SizeClass::Small);
        assert!(MuscleTable::with_overrides(&overrides).is_err());
    }

    #[test]
    fn test_engagement_and_key() {
        let mut snapshot = ExerciseRecordSnapshot::new(Utc::now());
        snapshot.exercise_name = Some(" Bench Press ".to_string());
        snapshot.primary_muscles.insert(MuscleGroup::Chest);
        snapshot.secondary_muscles.insert(MuscleGroup::Triceps);

        assert_eq!(snapshot.engagement(MuscleGroup::Chest, 0.5), Some(1.0));
        assert_eq!(snapshot.engagement(MuscleGroup::Triceps, 0.5), Some(0.5));
        assert_eq!(snapshot.engagement(MuscleGroup::Back, 0.5), None);
        assert_eq!(snapshot.exercise_key().as_deref(), Some("bench_press"));
    }

    #[test]
    fn test_exercise_keys_match_catalog_ids() {
        assert_eq!(normalize_exercise_key("Seated Calf Raise"), "seated_calf_raise");
        assert_eq!(normalize_exercise_key("  Farmer's Carry "), "farmers_carry");
        assert_eq!(normalize_exercise_key("Pull-Up (weighted)"), "pull_up_weighted");
        assert_eq!(normalize_exercise_key("seated_calf_raise"), "seated_calf_raise");
        assert_eq!(normalize_exercise_key(" - "), "");

        let mut snapshot = ExerciseRecordSnapshot::new(Utc::now());
        snapshot.exercise_id = Some("  ".to_string());
        snapshot.exercise_name = Some("Goblet Squat".to_string());
        assert_eq!(snapshot.exercise_key().as_deref(), Some("goblet_squat"));

        let definition = ExerciseDefinition {
            id: "ohp".to_string(),
            name: "Overhead Press".to_string(),
            primary_muscles: vec![MuscleGroup::Shoulders],
            secondary_muscles: vec![],
            equipment: Equipment::Barbell,
        };
        assert_eq!(definition.recency_keys(), vec!["ohp".to_string(), "overhead_press".to_string()]);
    }
}
