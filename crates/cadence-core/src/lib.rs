//! Cadence Core Library
//!
//! Weekly intelligence for logged activity time:
//! - Feature extraction over complete weekly windows
//! - Next-week prediction against a previous-week baseline
//! - Additive explanations with a confidence hint
//! - Structural risk classification (R0-R4)
//! - Early warnings from the recent risk trajectory
//! - CSV activity import and layered threshold configuration

pub mod config;
pub mod engine;
pub mod error;
pub mod features;
pub mod import;
pub mod insights;
pub mod models;
pub mod predictor;
pub mod report;
pub mod serde_ext;
pub mod stats;
pub mod weeks;

pub use config::{EngineConfig, ExplanationConfig, PredictorConfig, RiskThresholds};
pub use engine::{WeeklyIntelligence, WeeklyRequest};
pub use error::{Error, Result};
pub use features::{extract_weekly_features, FeatureName, RiskSignals, WeeklyFeatureVector};
pub use import::{ActivityLog, ActivityRecord};
pub use insights::{
    classify_features, classify_map, classify_weekly_risk, detect_risk_transition,
    evaluate_history_tokens, evaluate_risk_trajectory, explain_prediction, explain_week,
    Explanation, RiskDriver, RiskVerdict, WarningVerdict,
};
pub use models::{
    CategoryTotals, Confidence, DailyTotal, RiskLevel, RiskTransition, WarningLevel,
};
pub use predictor::{Coefficients, LinearRegressionModel, Prediction, WeeklyPredictor};
pub use report::{StatusState, WeeklyReport};
