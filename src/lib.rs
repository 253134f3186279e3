// Library interface for liftrs modules
// The CLI and the integration tests both go through this crate root

pub mod catalog;
pub mod config;
pub mod engine;
pub mod error;
pub mod fatigue;
pub mod import;
pub mod level;
pub mod load;
pub mod logging;
pub mod models;
pub mod patterns;
pub mod providers;
pub mod recommend;
pub mod recovery;
pub mod state;

// Re-export commonly used types for convenience
pub use models::*;
pub use catalog::{ExerciseCatalog, ExerciseLibrary};
pub use config::{EngineConfig, FatigueSettings, RecommendationSettings};
pub use engine::FatigueEngine;
pub use error::{LiftRsError, ImportError, Result};
pub use fatigue::{DecayFatigueCalculator, MuscleFatigueScore};
pub use level::FatigueLevel;
pub use load::{LoadMethod, SessionLoadCalculator};
pub use logging::{LogConfig, LogLevel, LogFormat};
pub use providers::{BiometricSignalProvider, WorkoutHistoryProvider};
pub use recommend::{ActiveRecovery, SuggestedExercise, WorkoutSuggestion};
pub use recovery::RecoveryModifiers;
pub use state::MuscleFatigueState;
