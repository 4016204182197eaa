//! Engine configuration
//!
//! Every threshold the engine uses lives in an immutable [`EngineConfig`]
//! passed by reference into each component. Tests override values by
//! building a config directly instead of touching globals.
//!
//! ## Configuration Resolution
//!
//! Config is loaded with a two-layer resolution:
//! 1. Check for override in data dir (~/.local/share/cadence/config/engine.toml)
//! 2. Fall back to embedded defaults (compiled into binary)

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Embedded default config (compiled into binary)
const DEFAULT_CONFIG: &str = include_str!("../../../config/engine.toml");

/// Thresholds for the weekly risk classifier
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskThresholds {
    /// Variability at or below this value is read as a normalized fraction
    pub variability_scale_cutoff: f64,
    /// High-variability threshold on the normalized scale
    pub variability_high_normalized: f64,
    /// High-variability threshold on the raw minutes scale
    pub variability_high_minutes: f64,
    pub dominance_high: f64,
    pub balance_low: f64,
}

impl Default for RiskThresholds {
    fn default() -> Self {
        Self {
            variability_scale_cutoff: 1.0,
            variability_high_normalized: 0.7,
            variability_high_minutes: 90.0,
            dominance_high: 0.65,
            balance_low: 0.35,
        }
    }
}

/// Settings for the explanation generator
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplanationConfig {
    pub stable_variability_max: f64,
    pub stable_dominance_max: f64,
    pub fragile_dominance_min: f64,
    /// Drivers reported per sign
    pub max_drivers: usize,
    /// Development-time check that contributions account for the delta
    pub enforce_conservation: bool,
    /// Accepted (low, high) ratio of model delta to explained delta
    pub conservation_band: (f64, f64),
}

impl Default for ExplanationConfig {
    fn default() -> Self {
        Self {
            stable_variability_max: 30.0,
            stable_dominance_max: 0.5,
            fragile_dominance_min: 0.7,
            max_drivers: 2,
            enforce_conservation: false,
            conservation_band: (0.9, 1.1),
        }
    }
}

/// Settings for weekly windowing and model fitting
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictorConfig {
    pub days_per_week: usize,
    pub min_training_pairs: usize,
    /// Longest first-to-last date span accepted before gap-filling
    pub max_span_days: usize,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            days_per_week: 7,
            min_training_pairs: 2,
            max_span_days: 3660,
        }
    }
}

/// Complete engine configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EngineConfig {
    pub risk: RiskThresholds,
    pub explanation: ExplanationConfig,
    pub predictor: PredictorConfig,
}

impl EngineConfig {
    /// Load from the default override location, falling back to embedded defaults
    pub fn load() -> Result<Self> {
        load_config(None)
    }

    /// Load from an explicit path, which must exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        load_config(Some(path))
    }

    /// Parse TOML content layered over the built-in defaults
    pub fn from_toml(content: &str) -> Result<Self> {
        parse_config(content)
    }

    /// Reject configurations the engine cannot run with
    pub fn validate(&self) -> Result<()> {
        let risk = &self.risk;
        let explanation = &self.explanation;
        let finite = [
            ("risk.variability_scale_cutoff", risk.variability_scale_cutoff),
            (
                "risk.variability_high_normalized",
                risk.variability_high_normalized,
            ),
            ("risk.variability_high_minutes", risk.variability_high_minutes),
            ("risk.dominance_high", risk.dominance_high),
            ("risk.balance_low", risk.balance_low),
            (
                "explanation.stable_variability_max",
                explanation.stable_variability_max,
            ),
            (
                "explanation.stable_dominance_max",
                explanation.stable_dominance_max,
            ),
            (
                "explanation.fragile_dominance_min",
                explanation.fragile_dominance_min,
            ),
            ("explanation.conservation_band[0]", explanation.conservation_band.0),
            ("explanation.conservation_band[1]", explanation.conservation_band.1),
        ];
        for (name, value) in finite {
            if !value.is_finite() {
                return Err(Error::Config(format!("{} must be finite", name)));
            }
        }

        if explanation.conservation_band.0 > explanation.conservation_band.1 {
            return Err(Error::Config(
                "explanation.conservation_band must be (low, high)".into(),
            ));
        }
        if explanation.max_drivers == 0 {
            return Err(Error::Config(
                "explanation.max_drivers must be at least 1".into(),
            ));
        }
        if self.predictor.days_per_week == 0 {
            return Err(Error::Config(
                "predictor.days_per_week must be at least 1".into(),
            ));
        }
        if self.predictor.max_span_days < self.predictor.days_per_week {
            return Err(Error::Config(
                "predictor.max_span_days must cover at least one week".into(),
            ));
        }
        if self.predictor.min_training_pairs < 2 {
            return Err(Error::Config(
                "predictor.min_training_pairs must be at least 2".into(),
            ));
        }

        Ok(())
    }
}

/// Default config override path
pub fn default_config_path() -> Option<PathBuf> {
    dirs::data_local_dir().map(|d| d.join("cadence").join("config").join("engine.toml"))
}

/// Load configuration (override first, then default)
fn load_config(override_path: Option<&Path>) -> Result<EngineConfig> {
    let path = override_path
        .map(Path::to_path_buf)
        .or_else(default_config_path);

    let content = match path {
        Some(path) if path.exists() => {
            tracing::debug!(path = %path.display(), "Loading engine config override");
            fs::read_to_string(&path)
                .map_err(|e| Error::Config(format!("Failed to read config: {}", e)))?
        }
        _ => DEFAULT_CONFIG.to_string(),
    };

    parse_config(&content)
}

/// Raw config structure for TOML parsing
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    risk: Option<RawRisk>,
    explanation: Option<RawExplanation>,
    predictor: Option<RawPredictor>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRisk {
    variability_scale_cutoff: Option<f64>,
    variability_high_normalized: Option<f64>,
    variability_high_minutes: Option<f64>,
    dominance_high: Option<f64>,
    balance_low: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawExplanation {
    stable_variability_max: Option<f64>,
    stable_dominance_max: Option<f64>,
    fragile_dominance_min: Option<f64>,
    max_drivers: Option<usize>,
    enforce_conservation: Option<bool>,
    conservation_band: Option<[f64; 2]>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPredictor {
    days_per_week: Option<usize>,
    min_training_pairs: Option<usize>,
    max_span_days: Option<usize>,
}

/// Parse config from TOML content
fn parse_config(content: &str) -> Result<EngineConfig> {
    let raw: RawConfig = toml::from_str(content)
        .map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))?;

    let mut config = EngineConfig::default();

    if let Some(risk) = raw.risk {
        let target = &mut config.risk;
        if let Some(v) = risk.variability_scale_cutoff {
            target.variability_scale_cutoff = v;
        }
        if let Some(v) = risk.variability_high_normalized {
            target.variability_high_normalized = v;
        }
        if let Some(v) = risk.variability_high_minutes {
            target.variability_high_minutes = v;
        }
        if let Some(v) = risk.dominance_high {
            target.dominance_high = v;
        }
        if let Some(v) = risk.balance_low {
            target.balance_low = v;
        }
    }

    if let Some(explanation) = raw.explanation {
        let target = &mut config.explanation;
        if let Some(v) = explanation.stable_variability_max {
            target.stable_variability_max = v;
        }
        if let Some(v) = explanation.stable_dominance_max {
            target.stable_dominance_max = v;
        }
        if let Some(v) = explanation.fragile_dominance_min {
            target.fragile_dominance_min = v;
        }
        if let Some(v) = explanation.max_drivers {
            target.max_drivers = v;
        }
        if let Some(v) = explanation.enforce_conservation {
            target.enforce_conservation = v;
        }
        if let Some([low, high]) = explanation.conservation_band {
            target.conservation_band = (low, high);
        }
    }

    if let Some(predictor) = raw.predictor {
        if let Some(v) = predictor.days_per_week {
            config.predictor.days_per_week = v;
        }
        if let Some(v) = predictor.min_training_pairs {
            config.predictor.min_training_pairs = v;
        }
        if let Some(v) = predictor.max_span_days {
            config.predictor.max_span_days = v;
        }
    }

    config.validate()?;
    Ok(config)
}
