//! Risk history file
//!
//! A JSON array of risk-level strings, oldest first. The engine never
//! writes it; the CLI appends one level per saved run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::models::parse_risk_history;
use cadence_core::RiskLevel;

/// Read a history file; a missing file is an empty history
pub fn read_history(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "No history file yet");
        return Ok(vec![]);
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history: {}", path.display()))?;
    let history: Vec<String> = serde_json::from_str(&content)
        .with_context(|| format!("History is not a JSON array of levels: {}", path.display()))?;

    // Reject unknown tokens before they reach the engine
    parse_risk_history(history.as_slice())
        .with_context(|| format!("Invalid history: {}", path.display()))?;

    Ok(history)
}

/// Append a level and write the history back
pub fn append_history(path: &Path, mut history: Vec<String>, level: RiskLevel) -> Result<Vec<String>> {
    history.push(level.to_string());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    let content = serde_json::to_string_pretty(&history)?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write history: {}", path.display()))?;

    tracing::info!(path = %path.display(), level = %level, weeks = history.len(), "Saved risk history");
    Ok(history)
}
