//! Collaborator boundaries: where history and biometric signals come from
//!
//! The engine never fetches anything itself; callers hand it data obtained
//! through these traits (or directly).

use chrono::{DateTime, Duration, Utc};

use crate::error::Result;
use crate::models::{ExerciseRecordSnapshot, RecoverySignals};

/// Supplies past exercise records
pub trait WorkoutHistoryProvider {
    /// Records from the last `window_days` days
    fn fetch_history(&self, window_days: u16) -> Result<Vec<ExerciseRecordSnapshot>>;
}

/// Supplies sleep and readiness inputs
pub trait BiometricSignalProvider {
    fn fetch_recovery_signals(&self) -> Result<RecoverySignals>;
}

/// History held in memory, windowed relative to a fixed reference time
#[derive(Debug, Clone)]
pub struct InMemoryHistory {
    records: Vec<ExerciseRecordSnapshot>,
    reference: DateTime<Utc>,
}

impl InMemoryHistory {
    pub fn new(records: Vec<ExerciseRecordSnapshot>) -> Self {
        Self::with_reference(records, Utc::now())
    }

    pub fn with_reference(records: Vec<ExerciseRecordSnapshot>, reference: DateTime<Utc>) -> Self {
        Self { records, reference }
    }
}

impl WorkoutHistoryProvider for InMemoryHistory {
    fn fetch_history(&self, window_days: u16) -> Result<Vec<ExerciseRecordSnapshot>> {
        let start = self.reference - Duration::days(i64::from(window_days));
        Ok(self
            .records
            .iter()
            .filter(|r| r.date >= start && r.date <= self.reference)
            .cloned()
            .collect())
    }
}

/// Fixed biometric signals
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSignals(pub RecoverySignals);

impl BiometricSignalProvider for StaticSignals {
    fn fetch_recovery_signals(&self) -> Result<RecoverySignals> {
        Ok(self.0)
    }
}
