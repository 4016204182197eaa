//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `report` - Weekly reports from JSON requests and activity CSVs
//! - `history` - Caller-owned risk history file
//! - `insights` - Standalone risk classification and trajectory evaluation
//! - `config` - Effective configuration display

pub mod config;
pub mod history;
pub mod insights;
pub mod report;

use std::path::Path;

use anyhow::{Context, Result};
use cadence_core::EngineConfig;
use serde::Serialize;

// Re-export command functions for main.rs
pub use config::*;
pub use insights::*;
pub use report::*;

/// JSON output settings shared by every command
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
    pub compact: bool,
}

impl Output {
    /// Render a value as JSON
    pub fn render<T: Serialize>(&self, value: &T) -> Result<String> {
        let rendered = if self.compact {
            serde_json::to_string(value)
        } else {
            serde_json::to_string_pretty(value)
        };
        rendered.context("Failed to serialize output")
    }

    /// Print a value as JSON on stdout
    pub fn emit<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.render(value)?);
        Ok(())
    }
}

/// Load the engine config from an explicit file or the default locations
pub fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => EngineConfig::load_from(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => EngineConfig::load().context("Failed to load config"),
    }
}
