//! Cadence CLI - Weekly intelligence for activity logs
//!
//! Usage:
//!   cadence report --input request.json     Report from a JSON request
//!   cadence import --file activities.csv    Report from an activity log
//!   cadence classify --dv 0.8 --dr 0.2 --cb 0.5
//!   cadence trajectory R0 R1 R1

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    // Logs go to stderr; stdout carries JSON only
    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .init();

    let output = commands::Output {
        compact: cli.compact,
    };

    match cli.command {
        Commands::Report {
            input,
            history,
            save_history,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_report(&config, &input, history.as_deref(), save_history, output)?;
        }
        Commands::Import {
            file,
            history,
            save_history,
        } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_import(&config, &file, history.as_deref(), save_history, output)?;
        }
        Commands::Classify { dv, dr, cb } => {
            let config = commands::load_config(cli.config.as_deref())?;
            commands::cmd_classify(&config, dv, dr, cb, output)?;
        }
        Commands::Trajectory { levels } => {
            commands::cmd_trajectory(&levels, output)?;
        }
        Commands::Config { path } => {
            commands::cmd_config(cli.config.as_deref(), path, output)?;
        }
    }

    Ok(())
}
