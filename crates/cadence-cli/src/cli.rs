//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Cadence - Weekly intelligence for logged activity time
#[derive(Parser)]
#[command(name = "cadence")]
#[command(about = "Weekly forecast, explanation and risk trajectory for activity logs", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Engine config file (defaults to the data-dir override, then built-in defaults)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Print single-line JSON instead of pretty-printed JSON
    #[arg(long, global = true)]
    pub compact: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Generate a weekly report from a JSON request
    Report {
        /// Request file (weekly_daily_totals, weekly_category_totals, ...)
        #[arg(short, long)]
        input: PathBuf,

        /// Risk history file (JSON array of levels, oldest first)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Append this week's risk level to the history file
        #[arg(long, requires = "history")]
        save_history: bool,
    },

    /// Generate a weekly report from an activity CSV (date,category,minutes)
    Import {
        /// CSV file to import
        #[arg(short, long)]
        file: PathBuf,

        /// Risk history file (JSON array of levels, oldest first)
        #[arg(long)]
        history: Option<PathBuf>,

        /// Append this week's risk level to the history file
        #[arg(long, requires = "history")]
        save_history: bool,
    },

    /// Classify risk from raw signals
    ///
    /// Omit all three signals to get the insufficient-signal level (R4).
    Classify {
        /// Daily variability (fraction <= 1.0, or minutes)
        #[arg(long)]
        dv: Option<f64>,

        /// Dominance ratio
        #[arg(long)]
        dr: Option<f64>,

        /// Category balance
        #[arg(long)]
        cb: Option<f64>,
    },

    /// Evaluate a risk trajectory, oldest level first
    ///
    /// Example: cadence trajectory R0 R1 R1
    Trajectory {
        /// Risk levels (R0-R4)
        levels: Vec<String>,
    },

    /// Show the effective engine configuration
    Config {
        /// Only print the override file location
        #[arg(long)]
        path: bool,
    },
}
