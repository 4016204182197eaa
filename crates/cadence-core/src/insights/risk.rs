//! Risk Classifier
//!
//! Maps a week's volatility, dominance and balance signals onto a discrete
//! structural risk level (`R0`..`R3`), or the `R4` sentinel when there is
//! no signal at all. Resolution is an ordered decision list where
//! variability outranks dominance, and dominance and balance weigh equally.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::RiskThresholds;
use crate::error::Result;
use crate::features::{RiskSignals, WeeklyFeatureVector};
use crate::models::{RiskLevel, RiskTransition};

/// A threshold that fired during classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskDriver {
    HighVariability,
    HighDominance,
    LowBalance,
}

impl RiskDriver {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskDriver::HighVariability => "high_variability",
            RiskDriver::HighDominance => "high_dominance",
            RiskDriver::LowBalance => "low_balance",
        }
    }
}

/// Classification of one week
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskVerdict {
    pub risk_level: RiskLevel,
    pub risk_label: String,
    /// Thresholds that fired, in evaluation order. Empty on `R0` and `R4`.
    pub drivers: Vec<RiskDriver>,
}

impl RiskVerdict {
    fn new(risk_level: RiskLevel, drivers: Vec<RiskDriver>) -> Self {
        Self {
            risk_level,
            risk_label: risk_level.label().to_string(),
            drivers,
        }
    }

    pub fn insufficient_signal() -> Self {
        Self::new(RiskLevel::R4, vec![])
    }
}

/// Variability arrives on one of two scales: values up to the cutoff are a
/// normalized fraction, anything larger is raw minutes.
fn is_high_variability(daily_variability: f64, thresholds: &RiskThresholds) -> bool {
    if daily_variability <= thresholds.variability_scale_cutoff {
        daily_variability >= thresholds.variability_high_normalized
    } else {
        daily_variability >= thresholds.variability_high_minutes
    }
}

/// Classify a week's risk signals
///
/// `None` means the week produced no signal and short-circuits to `R4`
/// before any threshold is read.
pub fn classify_weekly_risk(signals: Option<&RiskSignals>, thresholds: &RiskThresholds) -> RiskVerdict {
    let Some(signals) = signals else {
        return RiskVerdict::insufficient_signal();
    };

    let high_variability = is_high_variability(signals.daily_variability, thresholds);
    let high_dominance = signals.dominance_ratio >= thresholds.dominance_high;
    let low_balance = signals.category_balance <= thresholds.balance_low;

    let drivers: Vec<RiskDriver> = [
        (high_variability, RiskDriver::HighVariability),
        (high_dominance, RiskDriver::HighDominance),
        (low_balance, RiskDriver::LowBalance),
    ]
    .into_iter()
    .filter_map(|(fired, driver)| fired.then_some(driver))
    .collect();

    let verdict = if high_variability && high_dominance {
        RiskVerdict::new(RiskLevel::R3, drivers)
    } else if high_variability {
        RiskVerdict::new(RiskLevel::R2, drivers)
    } else if high_dominance || low_balance {
        RiskVerdict::new(RiskLevel::R1, drivers)
    } else {
        RiskVerdict::new(RiskLevel::R0, vec![])
    };

    tracing::debug!(
        level = %verdict.risk_level,
        drivers = verdict.drivers.len(),
        "Classified weekly risk"
    );
    verdict
}

/// Classify a complete feature vector
pub fn classify_features(features: &WeeklyFeatureVector, thresholds: &RiskThresholds) -> RiskVerdict {
    classify_weekly_risk(Some(&RiskSignals::from_features(features)), thresholds)
}

/// Classify a loosely keyed signal map (`daily_variability`/`dv`,
/// `dominance_ratio`/`dr`, `category_balance`/`cb`)
///
/// An empty map yields `R4`. A non-empty map missing any signal is malformed.
pub fn classify_map(map: &BTreeMap<String, f64>, thresholds: &RiskThresholds) -> Result<RiskVerdict> {
    let signals = RiskSignals::from_map(map)?;
    Ok(classify_weekly_risk(signals.as_ref(), thresholds))
}

/// Direction of movement from `previous` to `current`
///
/// Unknown when either side is missing or is the `R4` sentinel.
pub fn detect_risk_transition(
    previous: Option<RiskLevel>,
    current: Option<RiskLevel>,
) -> RiskTransition {
    let (Some(prev), Some(curr)) = (
        previous.and_then(|l| l.rank()),
        current.and_then(|l| l.rank()),
    ) else {
        return RiskTransition::Unknown;
    };

    match curr.cmp(&prev) {
        std::cmp::Ordering::Greater => RiskTransition::IncreasingRisk,
        std::cmp::Ordering::Less => RiskTransition::DecreasingRisk,
        std::cmp::Ordering::Equal => RiskTransition::Stable,
    }
}
