//! Decay-based per-muscle fatigue aggregation
//!
//! Each session inside the lookback window contributes
//! `load * engagement * exp(-age_hours / effective_tau)` to every muscle it
//! engages, where `effective_tau = base_tau / (sleep * readiness)`. The sum
//! is normalized against the muscle's saturation threshold and classified
//! into a [`FatigueLevel`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::{EngineConfig, FatigueSettings, SizeClassParams};
use crate::error::Result;
use crate::level::FatigueLevel;
use crate::load::{LoadMethod, SessionLoadCalculator};
use crate::models::{ExerciseRecordSnapshot, MuscleGroup, MuscleTable, SizeClass};
use crate::recovery::RecoveryModifiers;

/// One session's share of a muscle's fatigue
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueContribution {
    pub date: DateTime<Utc>,
    pub exercise_name: Option<String>,
    /// 1.0 for primary, secondary weight otherwise
    pub engagement: f64,
    pub session_load: f64,
    /// Rule that produced `session_load`
    pub load_method: LoadMethod,
    pub age_hours: f64,
    pub contribution: f64,
}

/// Explains how a fatigue score was reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FatigueBreakdown {
    pub contributions: Vec<FatigueContribution>,
    /// Decay constant actually used, after recovery modifiers
    pub effective_tau_hours: f64,
}

/// Fatigue score for one muscle at a reference time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleFatigueScore {
    pub muscle: MuscleGroup,
    pub raw_score: f64,
    /// `raw_score / saturation_threshold`, capped at 1.0
    pub normalized_score: f64,
    pub level: FatigueLevel,
    pub breakdown: FatigueBreakdown,
}

impl MuscleFatigueScore {
    pub fn has_data(&self) -> bool {
        self.level != FatigueLevel::NoData
    }
}

/// Decay fatigue calculator
#[derive(Debug, Clone)]
pub struct DecayFatigueCalculator {
    load: SessionLoadCalculator,
    table: MuscleTable,
    settings: FatigueSettings,
}

impl Default for DecayFatigueCalculator {
    fn default() -> Self {
        Self {
            load: SessionLoadCalculator::default(),
            table: MuscleTable::default(),
            settings: FatigueSettings::default(),
        }
    }
}

impl DecayFatigueCalculator {
    /// Build a calculator from engine configuration
    pub fn from_config(config: &EngineConfig) -> Result<Self> {
        Ok(Self {
            load: SessionLoadCalculator::new(config.body_weight_kg),
            table: config.muscle_table()?,
            settings: config.fatigue.clone(),
        })
    }

    pub fn settings(&self) -> &FatigueSettings {
        &self.settings
    }

    pub fn muscle_table(&self) -> &MuscleTable {
        &self.table
    }

    pub fn size_class(&self, muscle: MuscleGroup) -> SizeClass {
        self.table.size_class(muscle)
    }

    pub fn class_params(&self, muscle: MuscleGroup) -> SizeClassParams {
        self.settings.size_classes.params(self.size_class(muscle))
    }

    /// Baseline recovery constant in hours
    pub fn base_tau_hours(&self, muscle: MuscleGroup) -> f64 {
        self.class_params(muscle).recovery_hours
    }

    /// Decay constant after applying recovery modifiers
    ///
    /// Weaker recovery (modifiers below 1.0) lengthens the constant.
    pub fn effective_tau_hours(&self, muscle: MuscleGroup, modifiers: RecoveryModifiers) -> f64 {
        self.base_tau_hours(muscle) / modifiers.combined()
    }

    /// Fatigue scores for the requested muscles
    pub fn compute(
        &self,
        muscles: &[MuscleGroup],
        records: &[ExerciseRecordSnapshot],
        modifiers: RecoveryModifiers,
        reference: DateTime<Utc>,
    ) -> Vec<MuscleFatigueScore> {
        let window_start = reference - Duration::days(i64::from(self.settings.lookback_days));

        let in_window: Vec<WindowedSession> = records
            .iter()
            .filter(|r| r.date >= window_start && r.date <= reference)
            .map(|record| {
                let (load, method) = self.load.session_load_with_method(record);
                WindowedSession {
                    record,
                    load,
                    method,
                    age_hours: hours_between(record.date, reference),
                }
            })
            .collect();

        debug!(
            total_records = records.len(),
            in_window = in_window.len(),
            muscles = muscles.len(),
            "Computing decay fatigue"
        );

        muscles
            .iter()
            .map(|muscle| self.score_muscle(*muscle, &in_window, modifiers))
            .collect()
    }

    fn score_muscle(
        &self,
        muscle: MuscleGroup,
        in_window: &[WindowedSession],
        modifiers: RecoveryModifiers,
    ) -> MuscleFatigueScore {
        let effective_tau = self.effective_tau_hours(muscle, modifiers);

        let contributions: Vec<FatigueContribution> = in_window
            .iter()
            .filter_map(|session| {
                let record = session.record;
                let engagement = record.engagement(muscle, self.settings.secondary_engagement)?;
                let contribution = session.load * engagement * (-session.age_hours / effective_tau).exp();
                Some(FatigueContribution {
                    date: record.date,
                    exercise_name: record.exercise_name.clone(),
                    engagement,
                    session_load: session.load,
                    load_method: session.method,
                    age_hours: session.age_hours,
                    contribution: if contribution.is_finite() { contribution } else { 0.0 },
                })
            })
            .collect();

        if contributions.is_empty() {
            return MuscleFatigueScore {
                muscle,
                raw_score: 0.0,
                normalized_score: 0.0,
                level: FatigueLevel::NoData,
                breakdown: FatigueBreakdown {
                    contributions,
                    effective_tau_hours: effective_tau,
                },
            };
        }

        let raw_score: f64 = contributions.iter().map(|c| c.contribution).sum();
        let threshold = self.class_params(muscle).saturation_threshold;
        let normalized_score = (raw_score / threshold).clamp(0.0, 1.0);
        let level = FatigueLevel::from_score(normalized_score);

        trace!(
            muscle = %muscle,
            sessions = contributions.len(),
            raw_score,
            normalized_score,
            effective_tau,
            level = %level,
            "Muscle fatigue scored"
        );

        MuscleFatigueScore {
            muscle,
            raw_score,
            normalized_score,
            level,
            breakdown: FatigueBreakdown {
                contributions,
                effective_tau_hours: effective_tau,
            },
        }
    }
}

/// A record inside the lookback window with its load already computed
struct WindowedSession<'a> {
    record: &'a ExerciseRecordSnapshot,
    load: f64,
    method: LoadMethod,
    age_hours: f64,
}

/// Exact elapsed hours from `from` to `to`
pub(crate) fn hours_between(from: DateTime<Utc>, to: DateTime<Utc>) -> f64 {
    (to - from).num_milliseconds() as f64 / 3_600_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 15, 18, 0, 0).unwrap()
    }

    fn session(hours_ago: i64, primary: &[MuscleGroup], secondary: &[MuscleGroup], sets: i32) -> ExerciseRecordSnapshot {
        let mut record = ExerciseRecordSnapshot::new(reference() - Duration::hours(hours_ago));
        record.primary_muscles = primary.iter().copied().collect();
        record.secondary_muscles = secondary.iter().copied().collect();
        record.completed_set_count = sets;
        record
    }

    #[test]
    fn test_no_history_is_no_data() {
        let calc = DecayFatigueCalculator::default();
        let scores = calc.compute(&[MuscleGroup::Chest], &[], RecoveryModifiers::neutral(), reference());

        assert_eq!(scores.len(), 1);
        assert_eq!(scores[0].level, FatigueLevel::NoData);
        assert_eq!(scores[0].normalized_score, 0.0);
        assert!(scores[0].breakdown.contributions.is_empty());
    }

    #[test]
    fn test_single_fresh_session() {
        let calc = DecayFatigueCalculator::default();
        // 20 sets -> load 2.0, no decay at age 0
        let records = vec![session(0, &[MuscleGroup::Biceps], &[], 20)];
        let score = &calc.compute(&[MuscleGroup::Biceps], &records, RecoveryModifiers::neutral(), reference())[0];

        assert!((score.raw_score - 2.0).abs() < 1e-9);
        assert!((score.normalized_score - 0.2).abs() < 1e-9);
        assert_eq!(score.level, FatigueLevel::LightFatigue);
        assert_eq!(score.breakdown.contributions.len(), 1);
        assert!((score.breakdown.effective_tau_hours - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_decay_follows_time_constant() {
        let calc = DecayFatigueCalculator::default();
        let records = vec![session(36, &[MuscleGroup::Biceps], &[], 20)];
        let score = &calc.compute(&[MuscleGroup::Biceps], &records, RecoveryModifiers::neutral(), reference())[0];

        assert!((score.raw_score - 2.0 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn test_secondary_engagement_is_half() {
        let calc = DecayFatigueCalculator::default();
        let records = vec![session(0, &[MuscleGroup::Chest], &[MuscleGroup::Triceps], 20)];
        let scores = calc.compute(
            &[MuscleGroup::Chest, MuscleGroup::Triceps],
            &records,
            RecoveryModifiers::neutral(),
            reference(),
        );

        assert!((scores[0].raw_score - 2.0).abs() < 1e-9);
        assert!((scores[1].raw_score - 1.0).abs() < 1e-9);
        assert_eq!(scores[1].breakdown.contributions[0].engagement, 0.5);
    }

    #[test]
    fn test_lookback_window_excludes_old_sessions() {
        let calc = DecayFatigueCalculator::default();
        let records = vec![session(15 * 24, &[MuscleGroup::Back], &[], 30)];
        let score = &calc.compute(&[MuscleGroup::Back], &records, RecoveryModifiers::neutral(), reference())[0];

        assert_eq!(score.level, FatigueLevel::NoData);
        assert_eq!(score.raw_score, 0.0);
    }

    #[test]
    fn test_future_sessions_ignored() {
        let calc = DecayFatigueCalculator::default();
        let records = vec![session(-5, &[MuscleGroup::Back], &[], 30)];
        let score = &calc.compute(&[MuscleGroup::Back], &records, RecoveryModifiers::neutral(), reference())[0];
        assert_eq!(score.level, FatigueLevel::NoData);
    }

    #[test]
    fn test_poor_recovery_lengthens_tau() {
        let calc = DecayFatigueCalculator::default();
        let records = vec![session(24, &[MuscleGroup::Chest], &[], 30)];

        let neutral = &calc.compute(&[MuscleGroup::Chest], &records, RecoveryModifiers::neutral(), reference())[0];
        let poor = &calc.compute(&[MuscleGroup::Chest], &records, RecoveryModifiers::new(0.7, 0.7), reference())[0];
        let good = &calc.compute(&[MuscleGroup::Chest], &records, RecoveryModifiers::new(1.15, 1.1), reference())[0];

        assert!(poor.breakdown.effective_tau_hours > neutral.breakdown.effective_tau_hours);
        assert!(poor.raw_score > neutral.raw_score);
        assert!(good.raw_score < neutral.raw_score);
    }

    #[test]
    fn test_saturation_caps_normalized_score() {
        let calc = DecayFatigueCalculator::default();
        let records = vec![session(0, &[MuscleGroup::Calves], &[], 500)];
        let score = &calc.compute(&[MuscleGroup::Calves], &records, RecoveryModifiers::neutral(), reference())[0];

        assert_eq!(score.normalized_score, 1.0);
        assert_eq!(score.level, FatigueLevel::Overtrained);
        assert!(score.raw_score > 10.0);
    }

    #[test]
    fn test_invalid_modifiers_treated_as_neutral() {
        let calc = DecayFatigueCalculator::default();
        assert_eq!(
            calc.effective_tau_hours(MuscleGroup::Chest, RecoveryModifiers::new(f64::NAN, 0.0)),
            48.0
        );
    }

    #[test]
    fn test_extreme_modifiers_are_clamped() {
        let calc = DecayFatigueCalculator::default();
        let tau = calc.effective_tau_hours(MuscleGroup::Chest, RecoveryModifiers::new(1e-9, 1.0));
        assert!((tau - 48.0 / 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_reports_load_method() {
        let calc = DecayFatigueCalculator::default();
        let mut lifted = session(2, &[MuscleGroup::Back], &[], 4);
        lifted.total_weight = Some(2000.0);
        lifted.total_reps = Some(40.0);
        let counted = session(30, &[MuscleGroup::Back], &[], 4);

        let score = &calc.compute(&[MuscleGroup::Back], &[lifted, counted], RecoveryModifiers::neutral(), reference())[0];
        let methods: Vec<LoadMethod> = score.breakdown.contributions.iter().map(|c| c.load_method).collect();

        assert_eq!(methods, vec![LoadMethod::Resistance, LoadMethod::SetCount]);
        assert!((score.breakdown.contributions[1].session_load - 0.4).abs() < 1e-9);
    }
}
