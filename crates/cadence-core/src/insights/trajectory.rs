//! Risk Trajectory State Machine
//!
//! A stateless evaluator over the caller-owned risk history. Only the three
//! most recent entries are examined, as `(w2, w1, w0)` oldest to newest,
//! against an ordered decision table where the first matching rule wins.

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::{parse_risk_history, RiskLevel, WarningLevel};

/// Entries the machine looks back over
pub const WINDOW: usize = 3;

/// Warning emitted for a risk history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningVerdict {
    pub warning_level: WarningLevel,
    pub reason: Option<String>,
    /// Entries examined (the last three, or the whole history when shorter)
    pub trajectory: Vec<RiskLevel>,
    pub weeks_observed: usize,
}

impl WarningVerdict {
    fn none(trajectory: &[RiskLevel]) -> Self {
        Self::new(WarningLevel::None, None, trajectory)
    }

    fn new(warning_level: WarningLevel, reason: Option<&str>, trajectory: &[RiskLevel]) -> Self {
        Self {
            warning_level,
            reason: reason.map(str::to_string),
            trajectory: trajectory.to_vec(),
            weeks_observed: trajectory.len(),
        }
    }
}

/// The three most recent ranked levels
struct Window {
    w2: RiskLevel,
    w1: RiskLevel,
    w0: RiskLevel,
}

impl Window {
    fn is(&self, w2: RiskLevel, w1: RiskLevel, w0: RiskLevel) -> bool {
        (self.w2, self.w1, self.w0) == (w2, w1, w0)
    }

    fn last_two(&self, w1: RiskLevel, w0: RiskLevel) -> bool {
        (self.w1, self.w0) == (w1, w0)
    }
}

struct Rule {
    level: WarningLevel,
    reason: Option<&'static str>,
    matches: fn(&Window) -> bool,
}

use RiskLevel::{R0, R1, R2, R3};

fn improving(w: &Window) -> bool {
    w.w0.rank() < w.w1.rank()
}

fn oscillating(w: &Window) -> bool {
    w.w2 == w.w0 && w.w1.rank() < w.w0.rank()
}

fn sustained_fragile(w: &Window) -> bool {
    w.last_two(R3, R3)
}

fn volatility_into_sustained_fragile(w: &Window) -> bool {
    w.is(R2, R3, R3)
}

fn rapid_escalation(w: &Window) -> bool {
    w.is(R1, R2, R3)
}

fn sustained_volatility(w: &Window) -> bool {
    w.last_two(R2, R2)
}

fn moderate_into_sustained_volatility(w: &Window) -> bool {
    w.is(R1, R2, R2)
}

fn volatility_to_fragile(w: &Window) -> bool {
    w.last_two(R2, R3)
}

fn emerging_risk(w: &Window) -> bool {
    w.is(R0, R1, R1)
}

fn drift_to_volatility(w: &Window) -> bool {
    w.last_two(R1, R2)
}

const SUSTAINED_FRAGILE: &str = "Sustained fragile trajectory across multiple weeks";
const VOLATILITY_PERSISTS: &str = "Volatility persists without recovery";

/// Ordered decision table, evaluated top to bottom
///
/// The last early rule repeats the first elevated condition and can never
/// fire while elevated rules are checked first.
const RULES: &[Rule] = &[
    // Recent de-escalation always silences
    Rule {
        level: WarningLevel::None,
        reason: None,
        matches: improving,
    },
    // Dip and return
    Rule {
        level: WarningLevel::None,
        reason: None,
        matches: oscillating,
    },
    Rule {
        level: WarningLevel::Critical,
        reason: Some(SUSTAINED_FRAGILE),
        matches: sustained_fragile,
    },
    Rule {
        level: WarningLevel::Critical,
        reason: Some(SUSTAINED_FRAGILE),
        matches: volatility_into_sustained_fragile,
    },
    Rule {
        level: WarningLevel::Critical,
        reason: Some("Rapid escalation from moderate risk to fragility"),
        matches: rapid_escalation,
    },
    Rule {
        level: WarningLevel::Elevated,
        reason: Some(VOLATILITY_PERSISTS),
        matches: sustained_volatility,
    },
    Rule {
        level: WarningLevel::Elevated,
        reason: Some(VOLATILITY_PERSISTS),
        matches: moderate_into_sustained_volatility,
    },
    Rule {
        level: WarningLevel::Elevated,
        reason: Some("Transition from volatility to fragile trajectory"),
        matches: volatility_to_fragile,
    },
    Rule {
        level: WarningLevel::Early,
        reason: Some("Risk emerging across consecutive weeks"),
        matches: emerging_risk,
    },
    Rule {
        level: WarningLevel::Early,
        reason: Some("Upward drift toward volatility"),
        matches: drift_to_volatility,
    },
    Rule {
        level: WarningLevel::Early,
        reason: Some("Sustained moderate risk"),
        matches: sustained_volatility,
    },
];

/// Evaluate a risk history, oldest first
pub fn evaluate_risk_trajectory(history: &[RiskLevel]) -> WarningVerdict {
    let recent = match history {
        [.., w2, w1, w0] => [*w2, *w1, *w0],
        _ => return WarningVerdict::none(history),
    };

    // Uncertainty barrier: no warning while a recent week was unclassifiable
    if recent.iter().any(RiskLevel::is_sentinel) {
        return WarningVerdict::none(&recent);
    }

    let window = Window {
        w2: recent[0],
        w1: recent[1],
        w0: recent[2],
    };

    let verdict = RULES
        .iter()
        .find(|rule| (rule.matches)(&window))
        .map(|rule| WarningVerdict::new(rule.level, rule.reason, &recent))
        .unwrap_or_else(|| WarningVerdict::none(&recent));

    tracing::debug!(
        warning = %verdict.warning_level,
        trajectory = ?verdict.trajectory,
        "Evaluated risk trajectory"
    );
    verdict
}

/// Evaluate a history given as level tokens ("R0".."R4")
///
/// Unrecognized tokens are rejected rather than skipped.
pub fn evaluate_history_tokens<S: AsRef<str>>(history: &[S]) -> Result<WarningVerdict> {
    Ok(evaluate_risk_trajectory(&parse_risk_history(history)?))
}
