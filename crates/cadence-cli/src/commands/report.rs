//! Weekly report commands

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use cadence_core::{ActivityLog, EngineConfig, WeeklyIntelligence, WeeklyReport, WeeklyRequest};

use super::history::{append_history, read_history};
use super::Output;

/// Report from a JSON request file
pub fn cmd_report(
    config: &EngineConfig,
    input: &Path,
    history: Option<&Path>,
    save_history: bool,
    output: Output,
) -> Result<WeeklyReport> {
    let file =
        File::open(input).with_context(|| format!("Failed to open request: {}", input.display()))?;
    let request: WeeklyRequest = serde_json::from_reader(file)
        .with_context(|| format!("Failed to parse request: {}", input.display()))?;

    run_report(config, request, history, save_history, output)
}

/// Report from an activity CSV
pub fn cmd_import(
    config: &EngineConfig,
    file: &Path,
    history: Option<&Path>,
    save_history: bool,
    output: Output,
) -> Result<WeeklyReport> {
    let csv_file =
        File::open(file).with_context(|| format!("Failed to open file: {}", file.display()))?;
    let log = ActivityLog::from_csv(csv_file)
        .with_context(|| format!("Failed to import activities: {}", file.display()))?;

    tracing::info!(records = log.records().len(), file = %file.display(), "Imported activity log");

    let request = log.to_request(&config.predictor, None)?;
    run_report(config, request, history, save_history, output)
}

fn run_report(
    config: &EngineConfig,
    mut request: WeeklyRequest,
    history_path: Option<&Path>,
    save_history: bool,
    output: Output,
) -> Result<WeeklyReport> {
    let history = history_path.map(read_history).transpose()?;
    if let Some(history) = &history {
        if request.risk_history.is_some() {
            tracing::warn!("History file given; ignoring risk_history from the request");
        }
        request.risk_history = Some(history.clone());
    }

    let engine = WeeklyIntelligence::new(config.clone());
    let report = engine.run(&request);
    output.emit(&report)?;

    if !report.is_ok() {
        bail!("{}", report.status.message);
    }

    if save_history {
        if let (Some(path), Some(history), Some(risk)) = (history_path, history, &report.risk) {
            append_history(path, history, risk.verdict.risk_level)?;
        }
    }

    Ok(report)
}
