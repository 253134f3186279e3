use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::LiftRsError;
use crate::logging::LogConfig;
use crate::models::{MuscleTable, SizeClass};

/// Main engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Athlete body weight in kilograms, used to scale resistance load
    pub body_weight_kg: f64,

    /// Decay model settings
    pub fatigue: FatigueSettings,

    /// Recommendation engine settings
    pub recommendation: RecommendationSettings,

    /// Size class overrides keyed by muscle name
    pub muscle_size_overrides: BTreeMap<String, SizeClass>,

    /// Logging settings for the CLI
    pub logging: LogConfig,
}

/// Decay model settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FatigueSettings {
    /// Sessions older than this contribute no fatigue
    pub lookback_days: u16,

    /// Engagement factor for secondary-only muscles
    pub secondary_engagement: f64,

    /// Recovery fraction at which a muscle counts as recovered
    pub recovered_threshold: f64,

    /// Window for weekly set volume
    pub weekly_volume_days: u16,

    /// Per size class constants
    pub size_classes: SizeClassSettings,
}

/// Recovery constant and saturation threshold for one size class
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeClassParams {
    /// Baseline decay time constant in hours
    pub recovery_hours: f64,

    /// Raw score at which the normalized score reaches 1.0
    pub saturation_threshold: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SizeClassSettings {
    pub small: SizeClassParams,
    pub medium: SizeClassParams,
    pub large: SizeClassParams,
}

impl SizeClassSettings {
    pub fn params(&self, class: SizeClass) -> SizeClassParams {
        match class {
            SizeClass::Small => self.small,
            SizeClass::Medium => self.medium,
            SizeClass::Large => self.large,
        }
    }
}

/// Recommendation engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationSettings {
    /// Exercises per suggestion (never more than 4)
    pub max_exercises: usize,

    /// Muscles to focus on in one suggestion
    pub max_focus_muscles: usize,

    /// Distinct prior weeks needed before a weekday habit counts
    pub min_pattern_weeks: usize,

    /// History fetched for weekday pattern detection
    pub pattern_lookback_days: u16,

    /// Exercises performed within this window are passed to the catalog as recent
    pub recent_exercise_window_hours: f64,

    /// Offset applied before reading the weekday of a timestamp
    pub utc_offset_minutes: i32,
}

/// Hard ceiling on exercises in a single suggestion
pub const MAX_SUGGESTED_EXERCISES: usize = 4;

/// Longest accepted recent-exercise window (one year)
pub const MAX_RECENT_WINDOW_HOURS: f64 = 24.0 * 365.0;

const MAX_UTC_OFFSET_MINUTES: i32 = 24 * 60 - 1;

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            body_weight_kg: 70.0,
            fatigue: FatigueSettings::default(),
            recommendation: RecommendationSettings::default(),
            muscle_size_overrides: BTreeMap::new(),
            logging: LogConfig::default(),
        }
    }
}

impl Default for FatigueSettings {
    fn default() -> Self {
        FatigueSettings {
            lookback_days: 14,
            secondary_engagement: 0.5,
            recovered_threshold: 0.8,
            weekly_volume_days: 7,
            size_classes: SizeClassSettings::default(),
        }
    }
}

impl Default for SizeClassSettings {
    fn default() -> Self {
        SizeClassSettings {
            small: SizeClassParams {
                recovery_hours: 36.0,
                saturation_threshold: 10.0,
            },
            medium: SizeClassParams {
                recovery_hours: 48.0,
                saturation_threshold: 15.0,
            },
            large: SizeClassParams {
                recovery_hours: 72.0,
                saturation_threshold: 20.0,
            },
        }
    }
}

impl Default for RecommendationSettings {
    fn default() -> Self {
        RecommendationSettings {
            max_exercises: MAX_SUGGESTED_EXERCISES,
            max_focus_muscles: 3,
            min_pattern_weeks: 4,
            pattern_lookback_days: 56,
            recent_exercise_window_hours: 48.0,
            utc_offset_minutes: 0,
        }
    }
}

/// Configuration management implementation
impl EngineConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: EngineConfig =
            toml::from_str(&content).with_context(|| "Failed to parse TOML configuration")?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".liftrs")
            .join("config.toml")
    }

    /// Load configuration with fallback to defaults
    pub fn load_or_default() -> Self {
        let config_path = Self::default_config_path();

        match Self::load_from_file(&config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::debug!(
                    path = %config_path.display(),
                    error = %err,
                    "Config not loaded, using defaults"
                );
                Self::default()
            }
        }
    }

    /// Resolve the size class table, applying overrides
    pub fn muscle_table(&self) -> crate::error::Result<MuscleTable> {
        MuscleTable::with_overrides(&self.muscle_size_overrides)
    }

    /// Reject settings the calculators cannot work with
    pub fn validate(&self) -> crate::error::Result<()> {
        let invalid = |reason: String| Err(LiftRsError::Configuration(reason));

        if !self.body_weight_kg.is_finite() || self.body_weight_kg <= 0.0 {
            return invalid(format!("body_weight_kg must be positive, got {}", self.body_weight_kg));
        }
        if self.fatigue.lookback_days == 0 {
            return invalid("fatigue.lookback_days must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.fatigue.secondary_engagement) {
            return invalid("fatigue.secondary_engagement must be within [0, 1]".to_string());
        }
        if !(0.0..=1.0).contains(&self.fatigue.recovered_threshold) {
            return invalid("fatigue.recovered_threshold must be within [0, 1]".to_string());
        }
        for (name, params) in [
            ("small", self.fatigue.size_classes.small),
            ("medium", self.fatigue.size_classes.medium),
            ("large", self.fatigue.size_classes.large),
        ] {
            let usable = |v: f64| v.is_finite() && v > 0.0;
            if !(usable(params.recovery_hours) && usable(params.saturation_threshold)) {
                return invalid(format!(
                    "size class '{}' needs finite, positive recovery_hours and saturation_threshold",
                    name
                ));
            }
        }
        if self.recommendation.max_exercises == 0
            || self.recommendation.max_exercises > MAX_SUGGESTED_EXERCISES
        {
            return invalid(format!(
                "recommendation.max_exercises must be within 1..={}",
                MAX_SUGGESTED_EXERCISES
            ));
        }
        if self.recommendation.max_focus_muscles == 0 {
            return invalid("recommendation.max_focus_muscles must be at least 1".to_string());
        }
        let window = self.recommendation.recent_exercise_window_hours;
        if !(window.is_finite() && (0.0..=MAX_RECENT_WINDOW_HOURS).contains(&window)) {
            return invalid(format!(
                "recommendation.recent_exercise_window_hours must be within [0, {}], got {}",
                MAX_RECENT_WINDOW_HOURS, window
            ));
        }
        if !(-MAX_UTC_OFFSET_MINUTES..=MAX_UTC_OFFSET_MINUTES).contains(&self.recommendation.utc_offset_minutes) {
            return invalid(format!(
                "recommendation.utc_offset_minutes must be within ±{}",
                MAX_UTC_OFFSET_MINUTES
            ));
        }

        self.muscle_table()?;
        Ok(())
    }
}
