use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::{Path, PathBuf};
use tabled::{settings::Style, Table, Tabled};

use liftrs::catalog::ExerciseLibrary;
use liftrs::config::EngineConfig;
use liftrs::engine::FatigueEngine;
use liftrs::error::{ErrorSeverity, LiftRsError};
use liftrs::import::ImportManager;
use liftrs::level::FatigueLevel;
use liftrs::logging::{init_logging, LogFormat, LogLevel};
use liftrs::models::{ExerciseRecordSnapshot, RecoverySignals};
use liftrs::recommend::WorkoutSuggestion;
use liftrs::recovery::RecoveryModifiers;
use liftrs::state::MuscleFatigueState;

/// liftrs - Muscle fatigue and workout recommendation CLI
///
/// Estimates per-muscle fatigue from strength and cardio history and
/// suggests what to train next.
#[derive(Parser)]
#[command(name = "liftrs")]
#[command(author = "liftrs Contributors")]
#[command(version = "0.1.0")]
#[command(about = "Muscle fatigue and workout recommendation CLI", long_about = None)]
struct Cli {
    /// Sets a custom config file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Increase verbosity of output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Log level (error, warn, info, debug, trace); overrides -v
    #[arg(long, value_name = "LEVEL", global = true)]
    log_level: Option<LogLevel>,

    /// Log format (pretty, json, compact)
    #[arg(long, value_name = "FORMAT", global = true)]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the fatigue state of every muscle group
    Status {
        /// Workout history file (CSV or JSON)
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Recovery signals JSON (sleep, HRV, resting heart rate)
        #[arg(short, long, value_name = "FILE")]
        signals: Option<PathBuf>,

        /// Evaluate at this time instead of now (RFC 3339)
        #[arg(long)]
        at: Option<String>,
    },

    /// Suggest the next workout or a rest day
    Recommend {
        /// Workout history file (CSV or JSON)
        #[arg(long, value_name = "FILE")]
        history: PathBuf,

        /// Recovery signals JSON
        #[arg(short, long, value_name = "FILE")]
        signals: Option<PathBuf>,

        /// Exercise catalog JSON (built-in library if not specified)
        #[arg(long, value_name = "FILE")]
        catalog: Option<PathBuf>,

        /// Evaluate at this time instead of now (RFC 3339)
        #[arg(long)]
        at: Option<String>,

        /// Print the suggestion as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the recovery modifiers for a night of sleep and readiness data
    Modifiers {
        /// Recovery signals JSON
        #[arg(short, long, value_name = "FILE")]
        signals: Option<PathBuf>,

        /// Total sleep in minutes
        #[arg(long)]
        sleep_minutes: Option<f64>,

        /// Deep sleep ratio (0-1)
        #[arg(long)]
        deep: Option<f64>,

        /// REM sleep ratio (0-1)
        #[arg(long)]
        rem: Option<f64>,

        /// HRV z-score against baseline
        #[arg(long, allow_hyphen_values = true)]
        hrv_z: Option<f64>,

        /// Resting heart rate delta against baseline (bpm)
        #[arg(long, allow_hyphen_values = true)]
        rhr_delta: Option<f64>,
    },

    /// Configure application settings
    Config {
        /// Print the effective configuration
        #[arg(short, long)]
        list: bool,

        /// Write the default configuration to the config path
        #[arg(long)]
        init: bool,

        /// Print the config file path
        #[arg(long)]
        path: bool,
    },
}

#[derive(Tabled)]
struct StateRow {
    #[tabled(rename = "Muscle")]
    muscle: String,
    #[tabled(rename = "Level")]
    level: String,
    #[tabled(rename = "Score")]
    score: String,
    #[tabled(rename = "Recovery")]
    recovery: String,
    #[tabled(rename = "Last trained")]
    last_trained: String,
    #[tabled(rename = "Weekly sets")]
    weekly_volume: String,
    #[tabled(rename = "Ready at")]
    ready_at: String,
}

impl From<&MuscleFatigueState> for StateRow {
    fn from(state: &MuscleFatigueState) -> Self {
        Self {
            muscle: state.muscle.to_string(),
            level: colorize_level(state.level),
            score: format!("{:.2}", state.compound_score),
            recovery: format!("{:.0}%", state.recovery_percent * 100.0),
            last_trained: state
                .hours_since_last_trained
                .map(|h| format!("{:.0}h ago", h))
                .unwrap_or_else(|| "never".to_string()),
            weekly_volume: format!("{:.1}", state.weekly_volume),
            ready_at: state
                .next_ready_date
                .map(|d| d.format("%a %H:%M").to_string())
                .unwrap_or_else(|| "now".to_string()),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli) {
        match err.downcast_ref::<LiftRsError>() {
            Some(liftrs_err) => {
                match liftrs_err.severity() {
                    ErrorSeverity::Warning => tracing::warn!(error = %liftrs_err, "Command failed"),
                    _ => tracing::error!(error = %liftrs_err, "Command failed"),
                }
                eprintln!("{} {}", "Error:".red().bold(), liftrs_err.user_message());
            }
            None => eprintln!("{} {:#}", "Error:".red().bold(), err),
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load_from_file(path)?,
        None => EngineConfig::load_or_default(),
    };

    let mut log_config = config.logging.clone();
    if cli.verbose > 0 {
        log_config.level = LogLevel::from_verbosity(cli.verbose);
    }
    if let Some(level) = cli.log_level {
        log_config.level = level;
    }
    if let Some(format) = cli.log_format {
        log_config.format = format;
    }
    init_logging(&log_config)?;

    match cli.command {
        Commands::Status {
            history,
            signals,
            at,
        } => {
            let engine = FatigueEngine::new(&config)?;
            let records = load_history(&history)?;
            let modifiers = load_modifiers(signals.as_deref())?;
            let reference = parse_reference(at.as_deref())?;

            let states = engine.compute_states_at(&records, modifiers, reference);
            print_modifiers(modifiers);
            let rows: Vec<StateRow> = states.iter().map(StateRow::from).collect();
            println!("{}", Table::new(rows).with(Style::rounded()));
        }

        Commands::Recommend {
            history,
            signals,
            catalog,
            at,
            json,
        } => {
            let engine = FatigueEngine::new(&config)?;
            let records = load_history(&history)?;
            let modifiers = load_modifiers(signals.as_deref())?;
            let reference = parse_reference(at.as_deref())?;
            let library = match catalog {
                Some(path) => ExerciseLibrary::load_from_file(&path)?,
                None => ExerciseLibrary::builtin(),
            };

            match engine.recommend_at(&records, &library, modifiers, reference) {
                Some(suggestion) if json => println!("{}", serde_json::to_string_pretty(&suggestion)?),
                Some(suggestion) => print_suggestion(&suggestion),
                None => println!("{}", "The exercise catalog is empty, nothing to suggest".yellow()),
            }
        }

        Commands::Modifiers {
            signals,
            sleep_minutes,
            deep,
            rem,
            hrv_z,
            rhr_delta,
        } => {
            let mut input = match signals {
                Some(path) => load_signals(&path)?,
                None => RecoverySignals::default(),
            };
            input.total_sleep_minutes = sleep_minutes.or(input.total_sleep_minutes);
            input.deep_ratio = deep.or(input.deep_ratio);
            input.rem_ratio = rem.or(input.rem_ratio);
            input.hrv_z_score = hrv_z.or(input.hrv_z_score);
            input.rhr_delta = rhr_delta.or(input.rhr_delta);

            print_modifiers(RecoveryModifiers::from_signals(&input));
        }

        Commands::Config { list, init, path } => {
            let config_path = cli.config.unwrap_or_else(EngineConfig::default_config_path);
            if path {
                println!("{}", config_path.display());
            }
            if init {
                EngineConfig::default().save_to_file(&config_path)?;
                println!("{} {}", "✓ Wrote default configuration to".green(), config_path.display());
            }
            if list || !(path || init) {
                println!("{}", toml::to_string_pretty(&config)?);
            }
        }
    }

    Ok(())
}

fn load_history(path: &Path) -> Result<Vec<ExerciseRecordSnapshot>> {
    ImportManager::new()
        .import_file(path)
        .with_context(|| format!("Failed to load history from {}", path.display()))
}

fn load_signals(path: &Path) -> Result<RecoverySignals> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read signals file: {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| "Failed to parse recovery signals JSON")
}

fn load_modifiers(path: Option<&Path>) -> Result<RecoveryModifiers> {
    match path {
        Some(path) => Ok(RecoveryModifiers::from_signals(&load_signals(path)?)),
        None => Ok(RecoveryModifiers::neutral()),
    }
}

fn parse_reference(at: Option<&str>) -> Result<DateTime<Utc>> {
    match at {
        Some(value) => Ok(DateTime::parse_from_rfc3339(value)
            .with_context(|| format!("Invalid --at timestamp: {}", value))?
            .with_timezone(&Utc)),
        None => Ok(Utc::now()),
    }
}

fn print_modifiers(modifiers: RecoveryModifiers) {
    println!(
        "{} sleep {:.2}, readiness {:.2}, combined {:.2}",
        "Recovery modifiers:".bold(),
        modifiers.sleep,
        modifiers.readiness,
        modifiers.combined()
    );
}

fn print_suggestion(suggestion: &WorkoutSuggestion) {
    if suggestion.is_rest_day {
        println!("{}", "Rest day".yellow().bold());
        println!("{}", suggestion.reasoning);
        if let Some(muscle) = suggestion.next_ready_muscle {
            println!("  Next ready: {}", muscle.to_string().cyan());
        }
        println!("{}", "Active recovery:".bold());
        for activity in &suggestion.active_recovery_suggestions {
            println!("  • {}: {}", activity.label().green(), activity.description());
        }
        return;
    }

    let focus: Vec<String> = suggestion.focus_muscles.iter().map(|m| m.to_string()).collect();
    println!("{} {}", "Workout:".green().bold(), focus.join(", ").cyan());
    println!("{}", suggestion.reasoning);
    for (i, item) in suggestion.exercises.iter().enumerate() {
        println!(
            "  {}. {} ({} sets, {})",
            i + 1,
            item.exercise.name.bold(),
            item.suggested_sets,
            item.target_muscle
        );
    }
}

fn colorize_level(level: FatigueLevel) -> String {
    let label = level.label();
    if level == FatigueLevel::NoData {
        label.dimmed().to_string()
    } else if level.is_rest_advised() {
        label.red().to_string()
    } else if level.is_training_recommended() {
        label.green().to_string()
    } else {
        label.yellow().to_string()
    }
}
