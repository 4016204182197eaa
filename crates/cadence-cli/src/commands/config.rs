//! Configuration display

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cadence_core::config::default_config_path;
use serde_json::json;

use super::{load_config, Output};

/// Print the effective config, or just where it is read from
pub fn cmd_config(explicit: Option<&Path>, path_only: bool, output: Output) -> Result<serde_json::Value> {
    let path: Option<PathBuf> = explicit.map(Path::to_path_buf).or_else(default_config_path);
    let source = match &path {
        Some(p) if p.exists() => "file",
        _ => "embedded",
    };

    let value = if path_only {
        json!({
            "path": path.as_ref().map(|p| p.display().to_string()),
            "source": source,
        })
    } else {
        let config = load_config(explicit)?;
        json!({
            "source": source,
            "config": serde_json::to_value(&config).context("Failed to serialize config")?,
        })
    };

    output.emit(&value)?;
    Ok(value)
}
