//! Weekly report contract
//!
//! Field names and nesting are the compatibility surface for callers.
//! Fields may be added; existing ones are never renamed or removed. A report
//! that is not `ok` carries only its `status`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::features::FeatureName;
use crate::insights::{Explanation, RiskVerdict, WarningVerdict};
use crate::models::{Confidence, RiskTransition};
use crate::predictor::EvaluationMode;

/// Report contract version
pub const REPORT_VERSION: &str = "v2.0";

pub const SUCCESS_MESSAGE: &str = "Weekly intelligence generated successfully.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusState {
    Ok,
    Error,
    InsufficientData,
}

impl StatusState {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatusState::Ok => "ok",
            StatusState::Error => "error",
            StatusState::InsufficientData => "insufficient_data",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Status {
    pub state: StatusState,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSection {
    pub next_week_minutes: f64,
    pub previous_week_minutes: f64,
    pub baseline_prediction: f64,
    pub delta_vs_previous: f64,
    pub delta_vs_baseline: f64,
    pub model_used: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationSection {
    pub baseline_mae: f64,
    pub model_mae: Option<f64>,
    /// Model MAE strictly below baseline MAE; false without a model
    pub beats_baseline: bool,
    pub ml_used: bool,
    pub samples_used: usize,
    pub evaluation_mode: EvaluationMode,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextSection {
    /// Complete weeks consumed from the daily totals
    pub weeks_used: usize,
    pub features_used: Vec<FeatureName>,
    pub daily_variability: f64,
    pub category_balance: f64,
    pub dominance_ratio: f64,
    /// First and last day of the most recent complete week
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSection {
    #[serde(flatten)]
    pub verdict: RiskVerdict,
    pub confidence: Confidence,
    /// Movement from the last history entry to this week
    pub transition: RiskTransition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MlStatus {
    Active,
    RefusedInsufficientData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetaSection {
    pub model_type: Option<String>,
    pub explainability: String,
    pub baseline_type: String,
    pub ml_status: MlStatus,
    pub version: String,
}

impl MetaSection {
    pub fn new(model_type: Option<&str>) -> Self {
        Self {
            model_type: model_type.map(str::to_string),
            explainability: "additive".into(),
            baseline_type: "previous_week".into(),
            ml_status: if model_type.is_some() {
                MlStatus::Active
            } else {
                MlStatus::RefusedInsufficientData
            },
            version: REPORT_VERSION.into(),
        }
    }
}

/// One run's output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeeklyReport {
    pub status: Status,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prediction: Option<PredictionSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evaluation: Option<EvaluationSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ContextSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk: Option<RiskSection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<WarningVerdict>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<MetaSection>,
}

impl WeeklyReport {
    /// A status-only report for a failed run
    pub fn failure(error: &Error) -> Self {
        let state = match error {
            Error::InsufficientData(_) => StatusState::InsufficientData,
            _ => StatusState::Error,
        };
        let message = match error {
            Error::InsufficientData(msg) => msg.clone(),
            other => other.to_string(),
        };

        Self {
            status: Status { state, message },
            prediction: None,
            explanation: None,
            evaluation: None,
            context: None,
            risk: None,
            warning: None,
            meta: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status.state == StatusState::Ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_report_has_only_status() {
        let report = WeeklyReport::failure(&Error::InsufficientData(
            "At least 2 full weeks of data are required; found 1.".into(),
        ));
        assert!(!report.is_ok());

        let json = serde_json::to_value(&report).unwrap();
        let keys: Vec<&String> = json.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["status"]);
        assert_eq!(json["status"]["state"], "insufficient_data");
        assert_eq!(
            json["status"]["message"],
            "At least 2 full weeks of data are required; found 1."
        );
    }

    #[test]
    fn test_failure_state_matches_error() {
        for error in [
            Error::MalformedInput("bad".into()),
            Error::InternalConsistency("off".into()),
            Error::Config("nope".into()),
        ] {
            let report = WeeklyReport::failure(&error);
            assert_eq!(report.status.state.as_str(), error.status_state());
        }
    }

    #[test]
    fn test_meta_status() {
        let active = MetaSection::new(Some("LinearRegression"));
        assert_eq!(active.ml_status, MlStatus::Active);
        assert_eq!(active.version, "v2.0");

        let refused = serde_json::to_value(MetaSection::new(None)).unwrap();
        assert_eq!(refused["ml_status"], "refused_insufficient_data");
        assert!(refused["model_type"].is_null());
        assert_eq!(refused["baseline_type"], "previous_week");
        assert_eq!(refused["explainability"], "additive");
    }
}
