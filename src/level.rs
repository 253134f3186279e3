//! Fatigue level classification
//!
//! Maps a normalized fatigue score in `[0, 1]` onto ten ordered bands. A
//! separate `NoData` rank sits below all of them and is only produced when
//! a muscle has no contributing history.
//!
//! ## Bands
//! - `[0.00, 0.05)`: Fully recovered
//! - `[0.05, 0.15)`: Well rested
//! - `[0.15, 0.25)`: Light fatigue
//! - `[0.25, 0.35)`: Mild fatigue
//! - `[0.35, 0.50)`: Moderate fatigue
//! - `[0.50, 0.65)`: Notable fatigue
//! - `[0.65, 0.75)`: High fatigue
//! - `[0.75, 0.85)`: Very high fatigue
//! - `[0.85, 0.95)`: Extreme fatigue
//! - `[0.95, 1.00]`: Overtrained

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered fatigue level; comparison follows declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FatigueLevel {
    NoData,
    FullyRecovered,
    WellRested,
    LightFatigue,
    MildFatigue,
    ModerateFatigue,
    NotableFatigue,
    HighFatigue,
    VeryHighFatigue,
    ExtremeFatigue,
    Overtrained,
}

/// Lower bound of each scored band, paired with its level
const BANDS: &[(f64, FatigueLevel)] = &[
    (0.95, FatigueLevel::Overtrained),
    (0.85, FatigueLevel::ExtremeFatigue),
    (0.75, FatigueLevel::VeryHighFatigue),
    (0.65, FatigueLevel::HighFatigue),
    (0.50, FatigueLevel::NotableFatigue),
    (0.35, FatigueLevel::ModerateFatigue),
    (0.25, FatigueLevel::MildFatigue),
    (0.15, FatigueLevel::LightFatigue),
    (0.05, FatigueLevel::WellRested),
];

impl FatigueLevel {
    /// Every level, lowest rank first
    pub fn all() -> &'static [FatigueLevel] {
        &[
            FatigueLevel::NoData,
            FatigueLevel::FullyRecovered,
            FatigueLevel::WellRested,
            FatigueLevel::LightFatigue,
            FatigueLevel::MildFatigue,
            FatigueLevel::ModerateFatigue,
            FatigueLevel::NotableFatigue,
            FatigueLevel::HighFatigue,
            FatigueLevel::VeryHighFatigue,
            FatigueLevel::ExtremeFatigue,
            FatigueLevel::Overtrained,
        ]
    }

    /// Classify a normalized score
    ///
    /// The score is clamped to `[0, 1]` first. NaN and infinities map to
    /// `FullyRecovered`.
    pub fn from_score(score: f64) -> Self {
        if !score.is_finite() {
            return FatigueLevel::FullyRecovered;
        }

        let score = score.clamp(0.0, 1.0);
        BANDS
            .iter()
            .find(|(lower, _)| score >= *lower)
            .map(|(_, level)| *level)
            .unwrap_or(FatigueLevel::FullyRecovered)
    }

    /// Rank 0 (`NoData`) through 10 (`Overtrained`)
    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Training this muscle today is a good idea
    pub fn is_training_recommended(&self) -> bool {
        *self <= FatigueLevel::MildFatigue
    }

    /// This muscle should be rested
    pub fn is_rest_advised(&self) -> bool {
        *self >= FatigueLevel::VeryHighFatigue
    }

    pub fn label(&self) -> &'static str {
        match self {
            FatigueLevel::NoData => "No data",
            FatigueLevel::FullyRecovered => "Fully recovered",
            FatigueLevel::WellRested => "Well rested",
            FatigueLevel::LightFatigue => "Light fatigue",
            FatigueLevel::MildFatigue => "Mild fatigue",
            FatigueLevel::ModerateFatigue => "Moderate fatigue",
            FatigueLevel::NotableFatigue => "Notable fatigue",
            FatigueLevel::HighFatigue => "High fatigue",
            FatigueLevel::VeryHighFatigue => "Very high fatigue",
            FatigueLevel::ExtremeFatigue => "Extreme fatigue",
            FatigueLevel::Overtrained => "Overtrained",
        }
    }

    /// Get description of fatigue level
    pub fn description(&self) -> &'static str {
        match self {
            FatigueLevel::NoData => "No recent training recorded",
            FatigueLevel::FullyRecovered => "Ready for hard training",
            FatigueLevel::WellRested => "Ready to train",
            FatigueLevel::LightFatigue => "Minor residual fatigue, training is fine",
            FatigueLevel::MildFatigue => "Some fatigue, moderate training is fine",
            FatigueLevel::ModerateFatigue => "Consider lighter work for this muscle",
            FatigueLevel::NotableFatigue => "Noticeably fatigued, prefer other muscles",
            FatigueLevel::HighFatigue => "Highly fatigued, avoid direct work",
            FatigueLevel::VeryHighFatigue => "Rest advised",
            FatigueLevel::ExtremeFatigue => "Rest strongly advised",
            FatigueLevel::Overtrained => "Overreached - rest until recovered",
        }
    }
}

impl fmt::Display for FatigueLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}
