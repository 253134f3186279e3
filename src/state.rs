//! Per-muscle recovery state
//!
//! Combines the decay score with time-based recovery: how long ago the
//! muscle was last trained relative to its (modifier-adjusted) recovery
//! time, plus weekly set volume.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::fatigue::{hours_between, DecayFatigueCalculator, MuscleFatigueScore};
use crate::level::FatigueLevel;
use crate::models::{ExerciseRecordSnapshot, MuscleGroup};
use crate::recovery::RecoveryModifiers;

/// Recovery state for one muscle group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleFatigueState {
    pub muscle: MuscleGroup,
    pub last_trained: Option<DateTime<Utc>>,
    pub hours_since_last_trained: Option<f64>,
    /// Sets over the weekly window; secondary engagement counts half
    pub weekly_volume: f64,
    /// Elapsed fraction of the recovery time, in `[0, 1]`
    pub recovery_percent: f64,
    pub is_recovered: bool,
    /// Normalized decay fatigue score
    pub compound_score: f64,
    pub level: FatigueLevel,
    /// When the muscle will be recovered; `None` once recovered
    pub next_ready_date: Option<DateTime<Utc>>,
    /// Recovery time in hours used for `recovery_percent`
    pub recovery_hours: f64,
}

impl MuscleFatigueState {
    pub fn is_training_recommended(&self) -> bool {
        self.level.is_training_recommended()
    }
}

/// Compute the state of every muscle group
pub fn compute_states(
    calculator: &DecayFatigueCalculator,
    records: &[ExerciseRecordSnapshot],
    modifiers: RecoveryModifiers,
    reference: DateTime<Utc>,
) -> Vec<MuscleFatigueState> {
    let scores = calculator.compute(MuscleGroup::all(), records, modifiers, reference);

    scores
        .into_iter()
        .map(|score| build_state(calculator, score, records, modifiers, reference))
        .collect()
}

fn build_state(
    calculator: &DecayFatigueCalculator,
    score: MuscleFatigueScore,
    records: &[ExerciseRecordSnapshot],
    modifiers: RecoveryModifiers,
    reference: DateTime<Utc>,
) -> MuscleFatigueState {
    let muscle = score.muscle;
    let settings = calculator.settings();
    let recovery_hours = calculator.effective_tau_hours(muscle, modifiers);

    let last_trained = records
        .iter()
        .filter(|r| r.date <= reference && r.engages(muscle))
        .map(|r| r.date)
        .max();

    let hours_since_last_trained = last_trained.map(|date| hours_between(date, reference));

    let recovery_percent = match hours_since_last_trained {
        Some(hours) => (hours / recovery_hours).clamp(0.0, 1.0),
        None => 1.0,
    };
    let is_recovered = recovery_percent >= settings.recovered_threshold;

    let next_ready_date = match last_trained {
        Some(date) if !is_recovered => Some(ready_after(date, recovery_hours)),
        _ => None,
    };

    let week_start = reference - Duration::days(i64::from(settings.weekly_volume_days));
    let weekly_volume = records
        .iter()
        .filter(|r| r.date >= week_start && r.date <= reference)
        .filter_map(|r| {
            r.engagement(muscle, settings.secondary_engagement)
                .map(|engagement| r.completed_set_count.max(0) as f64 * engagement)
        })
        .sum();

    MuscleFatigueState {
        muscle,
        last_trained,
        hours_since_last_trained,
        weekly_volume,
        recovery_percent,
        is_recovered,
        compound_score: score.normalized_score,
        level: score.level,
        next_ready_date,
        recovery_hours,
    }
}

/// `date` plus `hours`, saturating at the latest representable instant
fn ready_after(date: DateTime<Utc>, hours: f64) -> DateTime<Utc> {
    Duration::try_milliseconds((hours * 3_600_000.0).round() as i64)
        .and_then(|delay| date.checked_add_signed(delay))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
