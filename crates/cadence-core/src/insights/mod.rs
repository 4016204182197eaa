//! Weekly insights
//!
//! Everything the engine says about a week beyond the raw forecast.
//!
//! ## Stages
//!
//! - **Explanation** - Additive per-feature contributions, top drivers and a
//!   confidence hint for a prediction
//! - **Risk** - Discrete structural risk level (`R0`..`R4`) and the drivers
//!   that fired
//! - **Trajectory** - Early-warning verdict over the last three risk levels
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cadence_core::insights::{classify_features, evaluate_risk_trajectory};
//!
//! let verdict = classify_features(&features, &config.risk);
//! history.push(verdict.risk_level);
//! let warning = evaluate_risk_trajectory(&history);
//! ```

pub mod explanation;
pub mod risk;
pub mod trajectory;

pub use explanation::{confidence_hint, explain_prediction, explain_week, Explanation};
pub use risk::{
    classify_features, classify_map, classify_weekly_risk, detect_risk_transition, RiskDriver,
    RiskVerdict,
};
pub use trajectory::{evaluate_history_tokens, evaluate_risk_trajectory, WarningVerdict};
