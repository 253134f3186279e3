//! Session load calculation
//!
//! Converts one historical exercise record into a scalar training load.
//! The first rule whose inputs are all present and positive wins:
//!
//! 1. Resistance work: `total_weight * total_reps / body_weight / 100`
//! 2. Distance cardio: `distance_km * sqrt(duration_min / 60) / 10`
//! 3. Timed work: `duration_min / 60`
//! 4. Fallback: `completed_set_count * 0.1`
//!
//! The result is never negative or NaN.

use serde::{Deserialize, Serialize};

use crate::models::ExerciseRecordSnapshot;

/// Default body weight used when none is configured
pub const DEFAULT_BODY_WEIGHT_KG: f64 = 70.0;

/// Load contributed by each completed set when nothing else is known
const LOAD_PER_SET: f64 = 0.1;

/// Which rule produced a session load
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMethod {
    Resistance,
    DistanceCardio,
    Duration,
    SetCount,
}

/// Session load calculator
#[derive(Debug, Clone, Copy)]
pub struct SessionLoadCalculator {
    body_weight_kg: f64,
}

impl Default for SessionLoadCalculator {
    fn default() -> Self {
        Self {
            body_weight_kg: DEFAULT_BODY_WEIGHT_KG,
        }
    }
}

impl SessionLoadCalculator {
    /// Create a calculator for the given body weight; invalid weights fall back to 70kg
    pub fn new(body_weight_kg: f64) -> Self {
        let body_weight_kg = if body_weight_kg.is_finite() && body_weight_kg > 0.0 {
            body_weight_kg
        } else {
            DEFAULT_BODY_WEIGHT_KG
        };
        Self { body_weight_kg }
    }

    pub fn body_weight_kg(&self) -> f64 {
        self.body_weight_kg
    }

    /// Training load for one record
    pub fn session_load(&self, record: &ExerciseRecordSnapshot) -> f64 {
        self.session_load_with_method(record).0
    }

    /// Training load together with the rule that produced it
    pub fn session_load_with_method(&self, record: &ExerciseRecordSnapshot) -> (f64, LoadMethod) {
        let weight = positive(record.total_weight);
        let reps = positive(record.total_reps);
        let duration = positive(record.duration_minutes);
        let distance = positive(record.distance_km);

        let (load, method) = match (weight, reps, distance, duration) {
            (Some(w), Some(r), _, _) => (w * r / self.body_weight_kg / 100.0, LoadMethod::Resistance),
            (_, _, Some(km), Some(min)) => {
                (km * (min / 60.0).sqrt() / 10.0, LoadMethod::DistanceCardio)
            }
            (_, _, _, Some(min)) => (min / 60.0, LoadMethod::Duration),
            _ => (
                record.completed_set_count.max(0) as f64 * LOAD_PER_SET,
                LoadMethod::SetCount,
            ),
        };

        if load.is_finite() && load > 0.0 {
            (load, method)
        } else {
            (0.0, method)
        }
    }
}

/// Keep only finite, strictly positive values
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record() -> ExerciseRecordSnapshot {
        ExerciseRecordSnapshot::new(Utc::now())
    }

    #[test]
    fn test_resistance_load() {
        let mut r = record();
        r.total_weight = Some(1400.0);
        r.total_reps = Some(50.0);
        r.duration_minutes = Some(30.0);

        let (load, method) = SessionLoadCalculator::default().session_load_with_method(&r);
        assert_eq!(method, LoadMethod::Resistance);
        // 1400 * 50 / 70 / 100 = 10
        assert!((load - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_body_weight_scales_resistance_load() {
        let mut r = record();
        r.total_weight = Some(1000.0);
        r.total_reps = Some(20.0);

        let light = SessionLoadCalculator::new(50.0).session_load(&r);
        let heavy = SessionLoadCalculator::new(100.0).session_load(&r);
        assert!((light - 4.0).abs() < 1e-9);
        assert!((heavy - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_distance_cardio_load() {
        let mut r = record();
        r.distance_km = Some(10.0);
        r.duration_minutes = Some(60.0);

        let (load, method) = SessionLoadCalculator::default().session_load_with_method(&r);
        assert_eq!(method, LoadMethod::DistanceCardio);
        assert!((load - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_duration_only_load() {
        let mut r = record();
        r.duration_minutes = Some(90.0);
        assert!((SessionLoadCalculator::default().session_load(&r) - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_set_count_fallback() {
        let mut r = record();
        r.completed_set_count = 5;
        let (load, method) = SessionLoadCalculator::default().session_load_with_method(&r);
        assert_eq!(method, LoadMethod::SetCount);
        assert!((load - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_zero_and_invalid_inputs_fall_through() {
        let mut r = record();
        r.total_weight = Some(0.0);
        r.total_reps = Some(30.0);
        r.distance_km = Some(f64::NAN);
        r.duration_minutes = Some(45.0);

        let (load, method) = SessionLoadCalculator::default().session_load_with_method(&r);
        assert_eq!(method, LoadMethod::Duration);
        assert!((load - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_never_negative() {
        let mut r = record();
        r.completed_set_count = -4;
        r.total_weight = Some(-100.0);
        r.total_reps = Some(10.0);
        assert_eq!(SessionLoadCalculator::default().session_load(&r), 0.0);
    }

    #[test]
    fn test_invalid_body_weight_uses_default() {
        assert_eq!(SessionLoadCalculator::new(0.0).body_weight_kg(), DEFAULT_BODY_WEIGHT_KG);
        assert_eq!(
            SessionLoadCalculator::new(f64::INFINITY).body_weight_kg(),
            DEFAULT_BODY_WEIGHT_KG
        );
    }
}
