//! Exercise catalog boundary and the built-in exercise library

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::{LiftRsError, Result};
use crate::models::{normalize_exercise_key, Equipment, ExerciseDefinition, MuscleGroup};

/// Source of exercise metadata for suggestions
pub trait ExerciseCatalog {
    /// Every exercise the catalog knows
    fn exercises(&self) -> &[ExerciseDefinition];

    /// Exercises that work `muscle` as a primary mover
    ///
    /// `exclude_recent` holds normalized exercise keys; an exercise is skipped
    /// when either its id or its name matches one.
    fn lookup_exercises(
        &self,
        muscle: MuscleGroup,
        exclude_recent: &HashSet<String>,
    ) -> Vec<ExerciseDefinition> {
        self.exercises()
            .iter()
            .filter(|e| e.targets(muscle))
            .filter(|e| !e.recency_keys().iter().any(|k| exclude_recent.contains(k)))
            .cloned()
            .collect()
    }

    fn is_empty(&self) -> bool {
        self.exercises().is_empty()
    }
}

/// In-memory exercise catalog
#[derive(Debug, Clone, Default)]
pub struct ExerciseLibrary {
    exercises: Vec<ExerciseDefinition>,
}

impl ExerciseLibrary {
    pub fn new(exercises: Vec<ExerciseDefinition>) -> Self {
        Self { exercises }
    }

    /// The bundled library covering every muscle group
    pub fn builtin() -> Self {
        let exercises = BUILTIN_EXERCISES
            .iter()
            .map(|(id, name, primary, secondary, equipment)| ExerciseDefinition {
                id: id.to_string(),
                name: name.to_string(),
                primary_muscles: primary.to_vec(),
                secondary_muscles: secondary.to_vec(),
                equipment: *equipment,
            })
            .collect();
        Self { exercises }
    }

    /// Load a catalog from a JSON array of exercise definitions
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let exercises: Vec<ExerciseDefinition> = serde_json::from_str(&content)?;
        validate_definitions(&exercises)?;
        Ok(Self { exercises })
    }

    pub fn find(&self, id: &str) -> Option<&ExerciseDefinition> {
        self.exercises.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }
}

/// Every exercise needs a usable id and a primary muscle; ids must stay
/// distinct after key normalization
fn validate_definitions(exercises: &[ExerciseDefinition]) -> Result<()> {
    let mut seen = HashSet::new();
    for exercise in exercises {
        let key = normalize_exercise_key(&exercise.id);
        if key.is_empty() {
            return Err(LiftRsError::Validation(format!(
                "exercise '{}' has an empty id",
                exercise.name
            )));
        }
        if exercise.primary_muscles.is_empty() {
            return Err(LiftRsError::Validation(format!(
                "exercise '{}' has no primary muscles",
                exercise.id
            )));
        }
        if !seen.insert(key) {
            return Err(LiftRsError::Validation(format!(
                "duplicate exercise id '{}'",
                exercise.id
            )));
        }
    }
    Ok(())
}

impl ExerciseCatalog for ExerciseLibrary {
    fn exercises(&self) -> &[ExerciseDefinition] {
        &self.exercises
    }
}

type BuiltinExercise = (
    &'static str,
    &'static str,
    &'static [MuscleGroup],
    &'static [MuscleGroup],
    Equipment,
);

use MuscleGroup::*;

const BUILTIN_EXERCISES: &[BuiltinExercise] = &[
    // Push
    ("bench_press", "Bench Press", &[Chest], &[Triceps, Shoulders], Equipment::Barbell),
    ("push_up", "Push-Up", &[Chest], &[Triceps, Shoulders, Core], Equipment::Bodyweight),
    ("incline_dumbbell_press", "Incline Dumbbell Press", &[Chest, Shoulders], &[Triceps], Equipment::Dumbbell),
    ("overhead_press", "Overhead Press", &[Shoulders], &[Triceps, Core], Equipment::Barbell),
    ("lateral_raise", "Lateral Raise", &[Shoulders], &[Traps], Equipment::Dumbbell),
    ("dip", "Dip", &[Triceps], &[Chest, Shoulders], Equipment::Bodyweight),
    ("triceps_pushdown", "Triceps Pushdown", &[Triceps], &[], Equipment::Cable),
    // Pull
    ("pull_up", "Pull-Up", &[Back], &[Biceps, Forearms], Equipment::Bodyweight),
    ("barbell_row", "Barbell Row", &[Back], &[Biceps, Traps], Equipment::Barbell),
    ("lat_pulldown", "Lat Pulldown", &[Back], &[Biceps], Equipment::Cable),
    ("shrug", "Shrug", &[Traps], &[Forearms], Equipment::Dumbbell),
    ("face_pull", "Face Pull", &[Traps, Shoulders], &[], Equipment::Cable),
    ("biceps_curl", "Biceps Curl", &[Biceps], &[Forearms], Equipment::Dumbbell),
    ("hammer_curl", "Hammer Curl", &[Biceps, Forearms], &[], Equipment::Dumbbell),
    ("farmers_carry", "Farmer's Carry", &[Forearms], &[Traps, Core], Equipment::Dumbbell),
    ("wrist_curl", "Wrist Curl", &[Forearms], &[], Equipment::Dumbbell),
    // Legs
    ("back_squat", "Back Squat", &[Quadriceps, Glutes], &[Core, Back], Equipment::Barbell),
    ("lunge", "Walking Lunge", &[Quadriceps], &[Glutes, Hamstrings], Equipment::Dumbbell),
    ("leg_press", "Leg Press", &[Quadriceps], &[Glutes], Equipment::Machine),
    ("romanian_deadlift", "Romanian Deadlift", &[Hamstrings], &[Glutes, Back], Equipment::Barbell),
    ("leg_curl", "Leg Curl", &[Hamstrings], &[Calves], Equipment::Machine),
    ("hip_thrust", "Hip Thrust", &[Glutes], &[Hamstrings], Equipment::Barbell),
    ("glute_bridge", "Glute Bridge", &[Glutes], &[Hamstrings, Core], Equipment::Bodyweight),
    ("standing_calf_raise", "Standing Calf Raise", &[Calves], &[], Equipment::Machine),
    ("seated_calf_raise", "Seated Calf Raise", &[Calves], &[], Equipment::Machine),
    // Core
    ("plank", "Plank", &[Core], &[Shoulders], Equipment::Bodyweight),
    ("hanging_leg_raise", "Hanging Leg Raise", &[Core], &[Forearms], Equipment::Bodyweight),
    ("pallof_press", "Pallof Press", &[Core], &[], Equipment::Band),
];
