//! Unified error hierarchy for liftrs
//!
//! Statistical inputs (loads, sleep, HRV) never produce errors: they degrade
//! to neutral values inside the calculators. The variants here cover the
//! call boundary: configuration, file import and precondition violations
//! such as an unknown muscle group name.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all liftrs operations
#[derive(Debug, Error)]
pub enum LiftRsError {
    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A muscle group name that is not part of the anatomical table
    #[error("Unknown muscle group: {name}")]
    UnknownMuscleGroup { name: String },

    /// History import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Collaborator (history/biometric provider) failures
    #[error("Provider error: {0}")]
    Provider(String),
}

/// Errors raised while importing workout history files
#[derive(Debug, Error)]
pub enum ImportError {
    /// Unsupported format
    #[error("Unsupported format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Format-specific parsing error
    #[error("Parse error in {format} at record {record}: {reason}")]
    ParseError {
        format: String,
        record: usize,
        reason: String,
    },

    /// Missing required data
    #[error("Missing required field: {field}")]
    MissingField { field: String },
}

/// Result type alias for liftrs operations
pub type Result<T> = std::result::Result<T, LiftRsError>;

impl LiftRsError {
    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LiftRsError::Validation(_) => ErrorSeverity::Warning,
            LiftRsError::Import(ImportError::MissingField { .. }) => ErrorSeverity::Warning,
            LiftRsError::Provider(_) => ErrorSeverity::Warning,
            LiftRsError::UnknownMuscleGroup { .. } => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            LiftRsError::UnknownMuscleGroup { name } => {
                format!(
                    "'{}' is not a known muscle group. Use one of: chest, shoulders, traps, back, biceps, triceps, forearms, core, quadriceps, hamstrings, glutes, calves.",
                    name
                )
            }
            LiftRsError::Import(ImportError::UnsupportedFormat { path }) => {
                format!(
                    "Could not import {}: only .json and .csv history files are supported",
                    path.display()
                )
            }
            LiftRsError::Configuration(reason) => {
                format!("Invalid configuration ({}). Check your config.toml.", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Programming error at the call boundary
    Critical,
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
}
