//! Public entry point tying the calculators together
//!
//! `FatigueEngine` holds only configuration; every call recomputes from the
//! history and signals it is given.

use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use tracing::{debug, warn};

use crate::catalog::ExerciseCatalog;
use crate::config::{EngineConfig, RecommendationSettings};
use crate::error::Result;
use crate::fatigue::{DecayFatigueCalculator, MuscleFatigueScore};
use crate::models::{ExerciseRecordSnapshot, MuscleGroup};
use crate::patterns::weekday_patterns;
use crate::providers::{BiometricSignalProvider, WorkoutHistoryProvider};
use crate::recommend::{RecommendationEngine, WorkoutSuggestion};
use crate::recovery::RecoveryModifiers;
use crate::state::{self, MuscleFatigueState};

/// Muscle fatigue and workout recommendation engine
#[derive(Debug, Clone, Default)]
pub struct FatigueEngine {
    calculator: DecayFatigueCalculator,
    recommendation: RecommendationSettings,
}

impl FatigueEngine {
    /// Build an engine from validated configuration
    pub fn new(config: &EngineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            calculator: DecayFatigueCalculator::from_config(config)?,
            recommendation: config.recommendation.clone(),
        })
    }

    pub fn calculator(&self) -> &DecayFatigueCalculator {
        &self.calculator
    }

    pub fn recommendation_settings(&self) -> &RecommendationSettings {
        &self.recommendation
    }

    /// Decay fatigue scores for the given muscles at `reference`
    pub fn compute_fatigue(
        &self,
        muscles: &[MuscleGroup],
        records: &[ExerciseRecordSnapshot],
        sleep_modifier: f64,
        readiness_modifier: f64,
        reference: DateTime<Utc>,
    ) -> Vec<MuscleFatigueScore> {
        self.calculator.compute(
            muscles,
            records,
            RecoveryModifiers::new(sleep_modifier, readiness_modifier),
            reference,
        )
    }

    /// State of every muscle group as of now
    pub fn compute_states(
        &self,
        records: &[ExerciseRecordSnapshot],
        sleep_modifier: f64,
        readiness_modifier: f64,
    ) -> Vec<MuscleFatigueState> {
        self.compute_states_at(
            records,
            RecoveryModifiers::new(sleep_modifier, readiness_modifier),
            Utc::now(),
        )
    }

    pub fn compute_states_at(
        &self,
        records: &[ExerciseRecordSnapshot],
        modifiers: RecoveryModifiers,
        reference: DateTime<Utc>,
    ) -> Vec<MuscleFatigueState> {
        state::compute_states(&self.calculator, records, modifiers, reference)
    }

    /// Muscles habitually trained on today's weekday
    pub fn compute_weekday_patterns(&self, records: &[ExerciseRecordSnapshot]) -> BTreeSet<MuscleGroup> {
        self.compute_weekday_patterns_at(records, Utc::now())
    }

    pub fn compute_weekday_patterns_at(
        &self,
        records: &[ExerciseRecordSnapshot],
        reference: DateTime<Utc>,
    ) -> BTreeSet<MuscleGroup> {
        weekday_patterns(
            records,
            reference,
            self.recommendation.min_pattern_weeks,
            self.recommendation.utc_offset_minutes,
        )
    }

    /// Recommend a workout as of now with neutral recovery modifiers
    ///
    /// Returns `None` only when the catalog is empty.
    pub fn recommend<C: ExerciseCatalog + ?Sized>(
        &self,
        records: &[ExerciseRecordSnapshot],
        catalog: &C,
    ) -> Option<WorkoutSuggestion> {
        self.recommend_at(records, catalog, RecoveryModifiers::neutral(), Utc::now())
    }

    pub fn recommend_at<C: ExerciseCatalog + ?Sized>(
        &self,
        records: &[ExerciseRecordSnapshot],
        catalog: &C,
        modifiers: RecoveryModifiers,
        reference: DateTime<Utc>,
    ) -> Option<WorkoutSuggestion> {
        RecommendationEngine::new(self.calculator.clone(), self.recommendation.clone())
            .recommend(records, catalog, modifiers, reference)
    }

    /// Fetch history and signals from collaborators, then recommend
    ///
    /// A failing signal provider degrades to neutral modifiers; a failing
    /// history provider is an error.
    pub fn recommend_from_providers<H, B, C>(
        &self,
        history: &H,
        signals: &B,
        catalog: &C,
        reference: DateTime<Utc>,
    ) -> Result<Option<WorkoutSuggestion>>
    where
        H: WorkoutHistoryProvider + ?Sized,
        B: BiometricSignalProvider + ?Sized,
        C: ExerciseCatalog + ?Sized,
    {
        let window_days = self
            .recommendation
            .pattern_lookback_days
            .max(self.calculator.settings().lookback_days);
        let records = history.fetch_history(window_days)?;

        let modifiers = match signals.fetch_recovery_signals() {
            Ok(signals) => RecoveryModifiers::from_signals(&signals),
            Err(e) => {
                warn!(error = %e, "Recovery signals unavailable, using neutral modifiers");
                RecoveryModifiers::neutral()
            }
        };

        debug!(
            records = records.len(),
            window_days,
            sleep = modifiers.sleep,
            readiness = modifiers.readiness,
            "Fetched recommendation inputs"
        );

        Ok(self.recommend_at(&records, catalog, modifiers, reference))
    }
}
