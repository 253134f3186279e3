//! Recovery modifiers from sleep and physiological readiness
//!
//! Two independent multipliers stretch or compress the fatigue decay time
//! constant: `effective_tau = base_tau / (sleep * readiness)`. A value below
//! 1.0 means recovery is impaired and fatigue lingers; above 1.0 means the
//! athlete is recovering faster than baseline.
//!
//! # Sleep
//!
//! Sleep duration drives a monotonic curve anchored at:
//!
//! | Sleep  | Modifier |
//! |--------|----------|
//! | <= 3h  | 0.55     |
//! | 5h     | 0.70     |
//! | 7h     | 1.00     |
//! | 8h     | 1.15     |
//! | >= 9h  | 1.20     |
//!
//! Deep sleep and REM ratios each add 0.05 when notably high (>= 20% of
//! sleep) and subtract 0.05 when notably low (<= 5%). The result is clamped
//! to `[0.50, 1.25]`.
//!
//! # Readiness
//!
//! HRV is expressed as a z-score against the personal baseline; an elevated
//! z-score raises the modifier toward 1.15, a depressed one lowers it
//! toward 0.70. Resting heart rate is expressed as a delta in bpm against
//! baseline; an elevated RHR lowers the modifier (8 bpm -> 0.85) and a
//! lowered RHR raises it (-3 bpm -> 1.05).
//!
//! When RHR is elevated it caps whatever benefit a good HRV reading would
//! grant: the combined value is the lower of the two components. Otherwise
//! the two components are averaged. The result is clamped to `[0.60, 1.20]`.
//!
//! Absent or non-finite inputs always produce the neutral value 1.0.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::models::RecoverySignals;

/// Neutral modifier value
pub const NEUTRAL_MODIFIER: f64 = 1.0;

pub const SLEEP_MODIFIER_MIN: f64 = 0.50;
pub const SLEEP_MODIFIER_MAX: f64 = 1.25;
pub const READINESS_MODIFIER_MIN: f64 = 0.60;
pub const READINESS_MODIFIER_MAX: f64 = 1.20;

/// Sleep hours -> base modifier
const SLEEP_CURVE: &[(f64, f64)] = &[(3.0, 0.55), (5.0, 0.70), (7.0, 1.00), (8.0, 1.15), (9.0, 1.20)];

/// HRV z-score -> readiness component
const HRV_CURVE: &[(f64, f64)] = &[(-1.5, 0.70), (0.0, 1.00), (1.5, 1.15)];

/// RHR delta (bpm) -> readiness component
const RHR_CURVE: &[(f64, f64)] = &[(-3.0, 1.05), (0.0, 1.00), (8.0, 0.85), (16.0, 0.70)];

/// Sleep stage ratio at or above which a bonus applies
const STAGE_RATIO_HIGH: f64 = 0.20;
/// Sleep stage ratio at or below which a penalty applies
const STAGE_RATIO_LOW: f64 = 0.05;
const STAGE_ADJUSTMENT: f64 = 0.05;

/// Minimum history length for baseline statistics
const MIN_BASELINE_SAMPLES: usize = 3;

/// The pair of recovery multipliers applied to the decay constant
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RecoveryModifiers {
    pub sleep: f64,
    pub readiness: f64,
}

impl Default for RecoveryModifiers {
    fn default() -> Self {
        Self::neutral()
    }
}

impl RecoveryModifiers {
    pub fn new(sleep: f64, readiness: f64) -> Self {
        Self { sleep, readiness }
    }

    /// Both modifiers at 1.0
    pub fn neutral() -> Self {
        Self {
            sleep: NEUTRAL_MODIFIER,
            readiness: NEUTRAL_MODIFIER,
        }
    }

    /// Compute both modifiers from raw biometric signals
    pub fn from_signals(signals: &RecoverySignals) -> Self {
        Self {
            sleep: sleep_modifier(
                signals.total_sleep_minutes,
                signals.deep_ratio,
                signals.rem_ratio,
            ),
            readiness: readiness_modifier(signals.hrv_z_score, signals.rhr_delta),
        }
    }

    /// Product of both modifiers
    ///
    /// Invalid values count as neutral; valid ones are held to the range
    /// the signal curves can produce.
    pub fn combined(&self) -> f64 {
        bounded(self.sleep, SLEEP_MODIFIER_MIN, SLEEP_MODIFIER_MAX)
            * bounded(self.readiness, READINESS_MODIFIER_MIN, READINESS_MODIFIER_MAX)
    }
}

/// Neutral for non-finite or non-positive modifiers, clamped otherwise
fn bounded(modifier: f64, min: f64, max: f64) -> f64 {
    if modifier.is_finite() && modifier > 0.0 {
        modifier.clamp(min, max)
    } else {
        NEUTRAL_MODIFIER
    }
}

/// Sleep modifier from total sleep and stage ratios
///
/// # Arguments
///
/// * `total_sleep_minutes` - Total sleep time; absent, non-finite or non-positive gives 1.0
/// * `deep_ratio` - Fraction of sleep in deep sleep (optional)
/// * `rem_ratio` - Fraction of sleep in REM (optional)
///
/// # Returns
///
/// Modifier in `[0.50, 1.25]`
pub fn sleep_modifier(
    total_sleep_minutes: Option<f64>,
    deep_ratio: Option<f64>,
    rem_ratio: Option<f64>,
) -> f64 {
    let minutes = match total_sleep_minutes {
        Some(m) if m.is_finite() && m > 0.0 => m,
        _ => return NEUTRAL_MODIFIER,
    };

    let mut modifier = interpolate(SLEEP_CURVE, minutes / 60.0);
    modifier += stage_adjustment(deep_ratio);
    modifier += stage_adjustment(rem_ratio);

    modifier.clamp(SLEEP_MODIFIER_MIN, SLEEP_MODIFIER_MAX)
}

fn stage_adjustment(ratio: Option<f64>) -> f64 {
    match ratio {
        Some(r) if r.is_finite() && r >= STAGE_RATIO_HIGH => STAGE_ADJUSTMENT,
        Some(r) if r.is_finite() && r <= STAGE_RATIO_LOW => -STAGE_ADJUSTMENT,
        _ => 0.0,
    }
}

/// Readiness modifier from HRV z-score and resting heart rate delta
///
/// # Arguments
///
/// * `hrv_z_score` - Today's HRV relative to baseline in standard deviations
/// * `rhr_delta` - Resting heart rate minus baseline in bpm
///
/// # Returns
///
/// Modifier in `[0.60, 1.20]`; 1.0 when neither signal is usable
pub fn readiness_modifier(hrv_z_score: Option<f64>, rhr_delta: Option<f64>) -> f64 {
    let hrv = hrv_z_score.filter(|z| z.is_finite());
    let rhr = rhr_delta.filter(|d| d.is_finite());

    let modifier = match (hrv, rhr) {
        (None, None) => return NEUTRAL_MODIFIER,
        (Some(z), None) => interpolate(HRV_CURVE, z),
        (None, Some(d)) => interpolate(RHR_CURVE, d),
        (Some(z), Some(d)) => {
            let hrv_component = interpolate(HRV_CURVE, z);
            let rhr_component = interpolate(RHR_CURVE, d);
            if d > 0.0 {
                hrv_component.min(rhr_component)
            } else {
                (hrv_component + rhr_component) / 2.0
            }
        }
    };

    modifier.clamp(READINESS_MODIFIER_MIN, READINESS_MODIFIER_MAX)
}

/// Piecewise linear interpolation over sorted anchor points
///
/// Values outside the anchor range take the nearest end value. Anchor
/// inputs return the anchor output exactly.
fn interpolate(points: &[(f64, f64)], x: f64) -> f64 {
    let (first_x, first_y) = points[0];
    if x <= first_x {
        return first_y;
    }

    for window in points.windows(2) {
        let (x0, y0) = window[0];
        let (x1, y1) = window[1];
        if x == x1 {
            return y1;
        }
        if x < x1 {
            return y0 + (y1 - y0) * (x - x0) / (x1 - x0);
        }
    }

    points[points.len() - 1].1
}

/// HRV z-score of today's reading against a baseline history
///
/// # Algorithm
///
/// `z = (current - mean(history)) / std_dev(history)` using the sample
/// standard deviation. Non-finite history values are ignored.
///
/// # Returns
///
/// `None` with fewer than 3 usable history values, a zero spread, or a
/// non-finite current reading
pub fn hrv_z_score(current_rmssd: f64, history: &[f64]) -> Option<f64> {
    if !current_rmssd.is_finite() {
        return None;
    }

    let values = finite_values(history);
    if values.len() < MIN_BASELINE_SAMPLES {
        return None;
    }

    let mean = values.iter().mean();
    let std_dev = values.iter().std_dev();
    if !std_dev.is_finite() || std_dev <= f64::EPSILON {
        return None;
    }

    Some((current_rmssd - mean) / std_dev)
}

/// Resting heart rate delta (bpm) against the baseline mean
pub fn rhr_delta(current_rhr: f64, history: &[f64]) -> Option<f64> {
    if !current_rhr.is_finite() {
        return None;
    }

    let values = finite_values(history);
    if values.len() < MIN_BASELINE_SAMPLES {
        return None;
    }

    Some(current_rhr - values.iter().mean())
}

fn finite_values(history: &[f64]) -> Vec<f64> {
    history.iter().copied().filter(|v| v.is_finite()).collect()
}
