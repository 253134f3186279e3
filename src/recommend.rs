//! Workout recommendation engine
//!
//! One decision per call, nothing carried between calls:
//!
//! 1. Compute the state of every muscle group.
//! 2. Detect weekday habits and exercise staleness from history.
//! 3. Candidates are muscles that are recovered or at most mildly fatigued.
//! 4. No candidates: suggest a rest day with active recovery options.
//! 5. Otherwise pick the top-ranked focus muscles and fill up to four
//!    exercises from the catalog, least recently performed first.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use std::fmt;
use tracing::debug;

use crate::catalog::ExerciseCatalog;
use crate::config::{RecommendationSettings, MAX_SUGGESTED_EXERCISES};
use crate::fatigue::DecayFatigueCalculator;
use crate::level::FatigueLevel;
use crate::models::{ExerciseDefinition, ExerciseRecordSnapshot, MuscleGroup};
use crate::patterns::{weekday_patterns, ExerciseStaleness};
use crate::recovery::RecoveryModifiers;
use crate::state::{compute_states, MuscleFatigueState};

pub const MIN_SUGGESTED_SETS: u8 = 2;
pub const MAX_SUGGESTED_SETS: u8 = 5;

/// Combined recovery modifier at or above which volume is increased
const STRONG_RECOVERY: f64 = 1.10;
/// Combined recovery modifier below which volume is reduced
const WEAK_RECOVERY: f64 = 0.85;

/// Light activity offered on rest days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActiveRecovery {
    Walking,
    Stretching,
    Yoga,
}

impl ActiveRecovery {
    pub fn all() -> &'static [ActiveRecovery] {
        &[ActiveRecovery::Walking, ActiveRecovery::Stretching, ActiveRecovery::Yoga]
    }

    pub fn label(&self) -> &'static str {
        match self {
            ActiveRecovery::Walking => "Walking",
            ActiveRecovery::Stretching => "Stretching",
            ActiveRecovery::Yoga => "Yoga",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ActiveRecovery::Walking => "20-30 minutes of easy walking to promote blood flow",
            ActiveRecovery::Stretching => "10-15 minutes of gentle full-body stretching",
            ActiveRecovery::Yoga => "A light restorative yoga flow focused on mobility",
        }
    }
}

impl fmt::Display for ActiveRecovery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One exercise in a suggestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuggestedExercise {
    pub exercise: ExerciseDefinition,
    /// Focus muscle this exercise was picked for
    pub target_muscle: MuscleGroup,
    /// Always within `[2, 5]`
    pub suggested_sets: u8,
}

/// Result of one recommendation call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkoutSuggestion {
    pub exercises: Vec<SuggestedExercise>,
    pub focus_muscles: Vec<MuscleGroup>,
    pub reasoning: String,
    pub is_rest_day: bool,
    pub active_recovery_suggestions: Vec<ActiveRecovery>,
    /// Muscle expected to be ready first, on rest days
    pub next_ready_muscle: Option<MuscleGroup>,
    pub generated_at: DateTime<Utc>,
}

/// A muscle eligible for training, with its ranking signals
#[derive(Debug, Clone)]
struct Candidate<'a> {
    state: &'a MuscleFatigueState,
    weekday_habit: bool,
    /// Catalog exercises for this muscle not performed recently
    diversity: usize,
}

/// Recommendation engine
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    calculator: DecayFatigueCalculator,
    settings: RecommendationSettings,
}

impl RecommendationEngine {
    pub fn new(calculator: DecayFatigueCalculator, settings: RecommendationSettings) -> Self {
        Self {
            calculator,
            settings,
        }
    }

    pub fn calculator(&self) -> &DecayFatigueCalculator {
        &self.calculator
    }

    /// Recommend the next workout or a rest day
    ///
    /// Returns `None` only when the catalog is empty.
    pub fn recommend<C: ExerciseCatalog + ?Sized>(
        &self,
        records: &[ExerciseRecordSnapshot],
        catalog: &C,
        modifiers: RecoveryModifiers,
        reference: DateTime<Utc>,
    ) -> Option<WorkoutSuggestion> {
        if catalog.is_empty() {
            debug!("Exercise catalog is empty, no recommendation");
            return None;
        }

        let states = compute_states(&self.calculator, records, modifiers, reference);
        let habits = weekday_patterns(
            records,
            reference,
            self.settings.min_pattern_weeks,
            self.settings.utc_offset_minutes,
        );
        let staleness = ExerciseStaleness::from_records(records, reference);
        let recent = staleness.recent(self.settings.recent_exercise_window_hours);

        let mut candidates: Vec<Candidate> = states
            .iter()
            .filter(|s| {
                s.level.is_training_recommended() || (s.is_recovered && !s.level.is_rest_advised())
            })
            .map(|state| Candidate {
                state,
                weekday_habit: habits.contains(&state.muscle),
                diversity: catalog.lookup_exercises(state.muscle, &recent).len(),
            })
            .collect();

        debug!(
            candidates = candidates.len(),
            habits = habits.len(),
            recent_exercises = recent.len(),
            "Ranking candidate muscles"
        );

        if candidates.is_empty() {
            return Some(rest_day(
                &states,
                &self.calculator,
                "Every muscle group is still at moderate fatigue or above, or needs rest.",
                reference,
            ));
        }

        candidates.sort_by(|a, b| {
            b.state
                .recovery_percent
                .total_cmp(&a.state.recovery_percent)
                .then_with(|| b.weekday_habit.cmp(&a.weekday_habit))
                .then_with(|| b.diversity.cmp(&a.diversity))
                .then_with(|| a.state.compound_score.total_cmp(&b.state.compound_score))
                .then_with(|| a.state.muscle.cmp(&b.state.muscle))
        });

        let focus = self.select_focus(&candidates, catalog, &recent, &staleness);
        if focus.is_empty() {
            return Some(rest_day(
                &states,
                &self.calculator,
                "The exercise catalog has nothing for the muscle groups that are ready.",
                reference,
            ));
        }

        let exercises = self.fill_exercises(&focus, modifiers);
        let focus_muscles: Vec<MuscleGroup> = focus
            .iter()
            .map(|(candidate, _)| candidate.state.muscle)
            .filter(|muscle| exercises.iter().any(|e| e.target_muscle == *muscle))
            .collect();

        let reasoning = training_reasoning(&focus, &focus_muscles, modifiers, reference);

        debug!(
            focus = ?focus_muscles,
            exercises = exercises.len(),
            "Training day recommended"
        );

        Some(WorkoutSuggestion {
            exercises,
            focus_muscles,
            reasoning,
            is_rest_day: false,
            active_recovery_suggestions: Vec::new(),
            next_ready_muscle: None,
            generated_at: reference,
        })
    }

    /// Top candidates the catalog can serve, each with its options stalest first
    fn select_focus<'a, C: ExerciseCatalog + ?Sized>(
        &self,
        candidates: &[Candidate<'a>],
        catalog: &C,
        recent: &HashSet<String>,
        staleness: &ExerciseStaleness,
    ) -> Vec<(Candidate<'a>, Vec<ExerciseDefinition>)> {
        let mut focus = Vec::new();

        for candidate in candidates {
            if focus.len() >= self.settings.max_focus_muscles.max(1) {
                break;
            }

            let muscle = candidate.state.muscle;
            let mut options = catalog.lookup_exercises(muscle, recent);
            if options.is_empty() {
                options = catalog.lookup_exercises(muscle, &HashSet::new());
            }
            if options.is_empty() {
                continue;
            }

            options.sort_by(|a, b| staleness.compare(a, b).then_with(|| a.id.cmp(&b.id)));
            focus.push((candidate.clone(), options));
        }

        focus
    }

    /// Round-robin over focus muscles until the exercise budget is spent
    fn fill_exercises(
        &self,
        focus: &[(Candidate, Vec<ExerciseDefinition>)],
        modifiers: RecoveryModifiers,
    ) -> Vec<SuggestedExercise> {
        let budget = self.settings.max_exercises.clamp(1, MAX_SUGGESTED_EXERCISES);
        let mut picked: Vec<SuggestedExercise> = Vec::new();
        let mut used: HashSet<&str> = HashSet::new();
        let mut cursors = vec![0usize; focus.len()];

        loop {
            let mut progressed = false;

            for (slot, (candidate, options)) in focus.iter().enumerate() {
                if picked.len() >= budget {
                    return picked;
                }

                while cursors[slot] < options.len() && used.contains(options[cursors[slot]].id.as_str()) {
                    cursors[slot] += 1;
                }
                let Some(exercise) = options.get(cursors[slot]) else {
                    continue;
                };

                cursors[slot] += 1;
                used.insert(exercise.id.as_str());
                picked.push(SuggestedExercise {
                    exercise: exercise.clone(),
                    target_muscle: candidate.state.muscle,
                    suggested_sets: suggested_sets(
                        candidate.state.level,
                        candidate.weekday_habit,
                        modifiers.combined(),
                    ),
                });
                progressed = true;
            }

            if !progressed || picked.len() >= budget {
                return picked;
            }
        }
    }
}

/// Working sets for an exercise, always within `[2, 5]`
pub fn suggested_sets(level: FatigueLevel, weekday_habit: bool, combined_modifier: f64) -> u8 {
    let mut sets: i32 = match level {
        FatigueLevel::NoData | FatigueLevel::FullyRecovered | FatigueLevel::WellRested => 4,
        FatigueLevel::LightFatigue | FatigueLevel::MildFatigue => 3,
        _ => 2,
    };

    if weekday_habit {
        sets += 1;
    }
    if combined_modifier.is_finite() {
        if combined_modifier >= STRONG_RECOVERY {
            sets += 1;
        } else if combined_modifier < WEAK_RECOVERY {
            sets -= 1;
        }
    }

    sets.clamp(i32::from(MIN_SUGGESTED_SETS), i32::from(MAX_SUGGESTED_SETS)) as u8
}

/// Build the rest-day suggestion
fn rest_day(
    states: &[MuscleFatigueState],
    calculator: &DecayFatigueCalculator,
    cause: &str,
    reference: DateTime<Utc>,
) -> WorkoutSuggestion {
    let next_ready = states
        .iter()
        .filter_map(|s| s.next_ready_date.map(|date| (s, date)))
        .min_by(|(a, a_date), (b, b_date)| {
            a_date
                .cmp(b_date)
                .then_with(|| {
                    calculator
                        .base_tau_hours(a.muscle)
                        .total_cmp(&calculator.base_tau_hours(b.muscle))
                })
                .then_with(|| a.muscle.cmp(&b.muscle))
        });

    let mut reasoning = format!("Rest day recommended. {} Give your muscles time to recover.", cause);
    if let Some((state, date)) = next_ready {
        reasoning.push_str(&format!(
            " {} should be recovered first, around {}.",
            state.muscle,
            date.format("%a %H:%M UTC")
        ));
    }
    reasoning.push_str(" Light active recovery such as walking, stretching or yoga will help.");

    debug!(next_ready = ?next_ready.map(|(s, _)| s.muscle), "Rest day recommended");

    WorkoutSuggestion {
        exercises: Vec::new(),
        focus_muscles: Vec::new(),
        reasoning,
        is_rest_day: true,
        active_recovery_suggestions: ActiveRecovery::all().to_vec(),
        next_ready_muscle: next_ready.map(|(state, _)| state.muscle),
        generated_at: reference,
    }
}

fn training_reasoning(
    focus: &[(Candidate, Vec<ExerciseDefinition>)],
    focus_muscles: &[MuscleGroup],
    modifiers: RecoveryModifiers,
    reference: DateTime<Utc>,
) -> String {
    let names: Vec<&str> = focus_muscles.iter().map(|m| m.display_name()).collect();
    let mut parts = vec![format!("Focus on {}.", names.join(", "))];

    for (candidate, _) in focus.iter().filter(|(c, _)| focus_muscles.contains(&c.state.muscle)) {
        let state = candidate.state;
        let detail = match state.hours_since_last_trained {
            None => format!("{} has no recent training.", state.muscle),
            Some(_) if state.level == FatigueLevel::NoData => {
                format!("{} has not been trained in the last two weeks.", state.muscle)
            }
            Some(hours) => format!(
                "{} is {:.0}% recovered ({:.0}h since last trained, {}).",
                state.muscle,
                state.recovery_percent * 100.0,
                hours,
                state.level.label().to_lowercase()
            ),
        };
        parts.push(detail);
    }

    let habits: BTreeSet<&str> = focus
        .iter()
        .filter(|(c, _)| c.weekday_habit && focus_muscles.contains(&c.state.muscle))
        .map(|(c, _)| c.state.muscle.display_name())
        .collect();
    if !habits.is_empty() {
        parts.push(format!(
            "You usually train {} on {}.",
            habits.into_iter().collect::<Vec<_>>().join(", "),
            reference.weekday()
        ));
    }

    let combined = modifiers.combined();
    if combined >= STRONG_RECOVERY {
        parts.push("Recovery signals are strong, so volume is slightly higher.".to_string());
    } else if combined < WEAK_RECOVERY {
        parts.push("Recovery signals are weak, so volume is reduced.".to_string());
    }

    parts.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ExerciseLibrary;
    use chrono::{Duration, TimeZone};

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
    }

    fn heavy(hours_ago: i64, muscles: &[MuscleGroup]) -> ExerciseRecordSnapshot {
        let mut record = ExerciseRecordSnapshot::new(reference() - Duration::hours(hours_ago));
        record.primary_muscles = muscles.iter().copied().collect();
        record.total_weight = Some(5000.0);
        record.total_reps = Some(100.0);
        record.completed_set_count = 10;
        record
    }

    #[test]
    fn test_suggested_sets_bounds() {
        assert_eq!(suggested_sets(FatigueLevel::NoData, false, 1.0), 4);
        assert_eq!(suggested_sets(FatigueLevel::MildFatigue, false, 1.0), 3);
        assert_eq!(suggested_sets(FatigueLevel::HighFatigue, false, 1.0), 2);
        assert_eq!(suggested_sets(FatigueLevel::NoData, true, 1.3), 5);
        assert_eq!(suggested_sets(FatigueLevel::Overtrained, false, 0.5), 2);
        assert_eq!(suggested_sets(FatigueLevel::WellRested, false, f64::NAN), 4);
    }

    #[test]
    fn test_empty_catalog_gives_none() {
        let engine = RecommendationEngine::default();
        let catalog = ExerciseLibrary::default();
        assert!(engine
            .recommend(&[], &catalog, RecoveryModifiers::neutral(), reference())
            .is_none());
    }

    #[test]
    fn test_fresh_athlete_gets_full_workout() {
        let engine = RecommendationEngine::default();
        let catalog = ExerciseLibrary::builtin();
        let suggestion = engine
            .recommend(&[], &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert!(!suggestion.is_rest_day);
        assert_eq!(suggestion.exercises.len(), 4);
        assert!(!suggestion.focus_muscles.is_empty());
        assert!(suggestion.focus_muscles.len() <= 3);
        assert!(!suggestion.reasoning.is_empty());
        assert!(suggestion.active_recovery_suggestions.is_empty());

        let ids: HashSet<_> = suggestion.exercises.iter().map(|e| e.exercise.id.as_str()).collect();
        assert_eq!(ids.len(), suggestion.exercises.len());
        for exercise in &suggestion.exercises {
            assert!((2..=5).contains(&exercise.suggested_sets));
            assert!(suggestion.focus_muscles.contains(&exercise.target_muscle));
        }
    }

    #[test]
    fn test_rest_day_when_everything_trained_today() {
        let engine = RecommendationEngine::default();
        let catalog = ExerciseLibrary::builtin();
        let records = vec![heavy(1, MuscleGroup::all())];

        let suggestion = engine
            .recommend(&records, &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert!(suggestion.is_rest_day);
        assert!(suggestion.exercises.is_empty());
        assert_eq!(suggestion.active_recovery_suggestions, ActiveRecovery::all().to_vec());
        assert!(suggestion.reasoning.to_lowercase().contains("recover"));

        let next = suggestion.next_ready_muscle.unwrap();
        assert_eq!(engine.calculator().base_tau_hours(next), 36.0);
    }

    #[test]
    fn test_fatigued_muscles_are_avoided() {
        let engine = RecommendationEngine::default();
        let catalog = ExerciseLibrary::builtin();
        let records = vec![heavy(2, &[MuscleGroup::Chest, MuscleGroup::Triceps, MuscleGroup::Shoulders])];

        let suggestion = engine
            .recommend(&records, &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert!(!suggestion.is_rest_day);
        for muscle in [MuscleGroup::Chest, MuscleGroup::Triceps, MuscleGroup::Shoulders] {
            assert!(!suggestion.focus_muscles.contains(&muscle));
        }
    }

    #[test]
    fn test_recently_performed_exercises_come_last() {
        let engine = RecommendationEngine::new(
            DecayFatigueCalculator::default(),
            RecommendationSettings {
                max_focus_muscles: 1,
                ..Default::default()
            },
        );
        let catalog = ExerciseLibrary::new(vec![
            ExerciseDefinition {
                id: "a".to_string(),
                name: "A".to_string(),
                primary_muscles: vec![MuscleGroup::Chest],
                secondary_muscles: vec![],
                equipment: crate::models::Equipment::Bodyweight,
            },
            ExerciseDefinition {
                id: "b".to_string(),
                name: "B".to_string(),
                primary_muscles: vec![MuscleGroup::Chest],
                secondary_muscles: vec![],
                equipment: crate::models::Equipment::Bodyweight,
            },
        ]);

        // "a" done lightly 10 days ago: chest is recovered, "b" never done
        let mut record = ExerciseRecordSnapshot::new(reference() - Duration::days(10));
        record.exercise_id = Some("a".to_string());
        record.primary_muscles.insert(MuscleGroup::Chest);
        record.completed_set_count = 3;

        let suggestion = engine
            .recommend(&[record], &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert_eq!(suggestion.focus_muscles, vec![MuscleGroup::Chest]);
        assert_eq!(suggestion.exercises[0].exercise.id, "b");
        assert_eq!(suggestion.exercises[1].exercise.id, "a");
    }

    #[test]
    fn test_catalog_without_coverage_falls_back_to_rest() {
        let engine = RecommendationEngine::default();
        let catalog = ExerciseLibrary::new(vec![ExerciseDefinition {
            id: "curl".to_string(),
            name: "Curl".to_string(),
            primary_muscles: vec![MuscleGroup::Biceps],
            secondary_muscles: vec![],
            equipment: crate::models::Equipment::Dumbbell,
        }]);
        let records = vec![heavy(1, &[MuscleGroup::Biceps])];

        let suggestion = engine
            .recommend(&records, &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert!(suggestion.is_rest_day);
        assert_eq!(suggestion.next_ready_muscle, Some(MuscleGroup::Biceps));
        assert_eq!(suggestion.active_recovery_suggestions.len(), 3);
    }

    fn calf_catalog() -> ExerciseLibrary {
        let builtin = ExerciseLibrary::builtin();
        let calves = ["seated_calf_raise", "standing_calf_raise"]
            .iter()
            .filter_map(|id| builtin.find(id).cloned())
            .collect();
        ExerciseLibrary::new(calves)
    }

    #[test]
    fn test_exercises_logged_by_name_count_as_recent() {
        let engine = RecommendationEngine::new(
            DecayFatigueCalculator::default(),
            RecommendationSettings {
                max_exercises: 1,
                ..Default::default()
            },
        );
        let catalog = calf_catalog();
        assert_eq!(catalog.len(), 2);

        let mut record = ExerciseRecordSnapshot::new(reference() - Duration::hours(40));
        record.exercise_name = Some("Seated Calf Raise".to_string());
        record.primary_muscles.insert(MuscleGroup::Calves);
        record.completed_set_count = 3;

        let suggestion = engine
            .recommend(&[record], &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert!(!suggestion.is_rest_day);
        assert_eq!(suggestion.exercises.len(), 1);
        assert_eq!(suggestion.exercises[0].exercise.id, "standing_calf_raise");
    }

    #[test]
    fn test_recovered_but_overtrained_muscle_is_rested() {
        let engine = RecommendationEngine::default();
        let catalog = calf_catalog();
        // 30h of a 36h recovery time has passed, but the load was extreme
        let records = vec![heavy(30, &[MuscleGroup::Calves])];

        let states = compute_states(engine.calculator(), &records, RecoveryModifiers::neutral(), reference());
        let calves = states.iter().find(|s| s.muscle == MuscleGroup::Calves).unwrap();
        assert!(calves.is_recovered);
        assert!(calves.level.is_rest_advised());

        let suggestion = engine
            .recommend(&records, &catalog, RecoveryModifiers::neutral(), reference())
            .unwrap();

        assert!(suggestion.is_rest_day);
        assert!(suggestion.exercises.is_empty());
    }
}
