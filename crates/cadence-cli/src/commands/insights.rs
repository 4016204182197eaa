//! Standalone risk commands

use std::collections::BTreeMap;

use anyhow::{bail, Context, Result};
use cadence_core::{classify_map, evaluate_history_tokens, EngineConfig, RiskVerdict, WarningVerdict};

use super::Output;

/// Classify one week from its raw signals
pub fn cmd_classify(
    config: &EngineConfig,
    dv: Option<f64>,
    dr: Option<f64>,
    cb: Option<f64>,
    output: Output,
) -> Result<RiskVerdict> {
    let given = [dv, dr, cb].iter().filter(|v| v.is_some()).count();
    if given != 0 && given != 3 {
        bail!("Provide all of --dv, --dr and --cb, or none of them");
    }

    let signals: BTreeMap<String, f64> = [("dv", dv), ("dr", dr), ("cb", cb)]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect();

    let verdict = classify_map(&signals, &config.risk).context("Failed to classify signals")?;
    output.emit(&verdict)?;
    Ok(verdict)
}

/// Evaluate a sequence of risk levels
pub fn cmd_trajectory(levels: &[String], output: Output) -> Result<WarningVerdict> {
    let verdict = evaluate_history_tokens(levels)?;
    output.emit(&verdict)?;
    Ok(verdict)
}
