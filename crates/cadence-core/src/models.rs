//! Core domain types shared across the engine

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Minutes per activity category for one week
pub type CategoryTotals = BTreeMap<String, f64>;

/// Total logged minutes for one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyTotal {
    pub date: NaiveDate,
    pub minutes: f64,
}

impl DailyTotal {
    pub fn new(date: NaiveDate, minutes: f64) -> Self {
        Self { date, minutes }
    }
}

/// Structural risk level of a single week
///
/// `R0`..`R3` form an ordinal scale. `R4` is the "insufficient signal"
/// sentinel and has no rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    R0,
    R1,
    R2,
    R3,
    R4,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::R0 => "R0",
            RiskLevel::R1 => "R1",
            RiskLevel::R2 => "R2",
            RiskLevel::R3 => "R3",
            RiskLevel::R4 => "R4",
        }
    }

    /// Machine label reported next to the level
    pub fn label(&self) -> &'static str {
        match self {
            RiskLevel::R0 => "stable_trajectory",
            RiskLevel::R1 => "load_concentration_risk",
            RiskLevel::R2 => "volatility_risk",
            RiskLevel::R3 => "fragile_trajectory",
            RiskLevel::R4 => "insufficient_signal",
        }
    }

    /// Ordinal rank, `None` for the out-of-band `R4`
    pub fn rank(&self) -> Option<u8> {
        match self {
            RiskLevel::R0 => Some(0),
            RiskLevel::R1 => Some(1),
            RiskLevel::R2 => Some(2),
            RiskLevel::R3 => Some(3),
            RiskLevel::R4 => None,
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self.rank().is_none()
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskLevel {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "R0" => Ok(RiskLevel::R0),
            "R1" => Ok(RiskLevel::R1),
            "R2" => Ok(RiskLevel::R2),
            "R3" => Ok(RiskLevel::R3),
            "R4" => Ok(RiskLevel::R4),
            _ => Err(Error::MalformedInput(format!(
                "unrecognized risk level '{}'",
                s
            ))),
        }
    }
}

/// Parse a caller-supplied risk history, rejecting unknown tokens
pub fn parse_risk_history<S: AsRef<str>>(history: &[S]) -> crate::Result<Vec<RiskLevel>> {
    history.iter().map(|s| s.as_ref().parse()).collect()
}

/// Verdict of the trajectory state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningLevel {
    None,
    Early,
    Elevated,
    Critical,
}

impl WarningLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            WarningLevel::None => "none",
            WarningLevel::Early => "early",
            WarningLevel::Elevated => "elevated",
            WarningLevel::Critical => "critical",
        }
    }
}

impl fmt::Display for WarningLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Qualitative confidence attached to an explanation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    Stable,
    Moderate,
    Fragile,
}

impl Confidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            Confidence::Stable => "stable",
            Confidence::Moderate => "moderate",
            Confidence::Fragile => "fragile",
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Direction of movement between two consecutive risk levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTransition {
    IncreasingRisk,
    DecreasingRisk,
    Stable,
    Unknown,
}

impl RiskTransition {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTransition::IncreasingRisk => "increasing_risk",
            RiskTransition::DecreasingRisk => "decreasing_risk",
            RiskTransition::Stable => "stable",
            RiskTransition::Unknown => "unknown",
        }
    }
}
