//! Weekly Intelligence - sequences the pipeline into one report per run
//!
//! Feature extraction, prediction, explanation, risk classification and the
//! trajectory warning run in that order over the caller's request. The engine
//! holds no state between runs: the risk history is read from the request
//! and the caller appends the new level for next time.

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Error, Result};
use crate::features::{extract_weekly_features, FeatureName, WeeklyFeatureVector};
use crate::insights::{
    classify_features, detect_risk_transition, evaluate_risk_trajectory, explain_week,
    WarningVerdict,
};
use crate::models::{parse_risk_history, CategoryTotals, DailyTotal, WarningLevel};
use crate::predictor::{WeeklyPredictor, MODEL_TYPE};
use crate::report::{
    ContextSection, EvaluationSection, MetaSection, PredictionSection, RiskSection, Status,
    StatusState, WeeklyReport, SUCCESS_MESSAGE,
};
use crate::weeks::{require_weeks, WeekWindow};

/// Complete weeks needed for a report
pub const MIN_WEEKS: usize = 2;

/// Input for one run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeeklyRequest {
    /// Daily totals spanning at least two full weeks, any order
    pub weekly_daily_totals: Vec<DailyTotal>,
    /// Category totals for the most recent complete week
    pub weekly_category_totals: CategoryTotals,
    /// Category totals for earlier complete weeks, oldest first, aligned so
    /// the last entry is the week before the most recent
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub category_history: Vec<CategoryTotals>,
    /// Prior risk levels, oldest first
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_history: Option<Vec<String>>,
}

/// Category totals for every week, oldest first
fn categories_per_week<'a>(request: &'a WeeklyRequest, week_count: usize) -> Vec<&'a CategoryTotals> {
    static EMPTY: CategoryTotals = CategoryTotals::new();

    let earlier = week_count.saturating_sub(1);
    let history = &request.category_history;
    let known = &history[history.len().saturating_sub(earlier)..];

    let mut per_week: Vec<&CategoryTotals> = std::iter::repeat(&EMPTY)
        .take(earlier - known.len())
        .chain(known.iter())
        .collect();
    per_week.push(&request.weekly_category_totals);
    per_week
}

/// The weekly intelligence pipeline
#[derive(Debug, Clone, Default)]
pub struct WeeklyIntelligence {
    config: EngineConfig,
}

impl WeeklyIntelligence {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the pipeline, reporting any failure through `status`
    pub fn run(&self, request: &WeeklyRequest) -> WeeklyReport {
        match self.try_run(request) {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(state = e.status_state(), error = %e, "Weekly intelligence run failed");
                WeeklyReport::failure(&e)
            }
        }
    }

    /// Run the pipeline, returning failures as errors
    pub fn try_run(&self, request: &WeeklyRequest) -> Result<WeeklyReport> {
        // Parse history up front so a bad token fails before any work
        let history = request
            .risk_history
            .as_deref()
            .map(parse_risk_history)
            .transpose()?;

        let weeks = require_weeks(
            &request.weekly_daily_totals,
            self.config.predictor.days_per_week,
            self.config.predictor.max_span_days,
            MIN_WEEKS,
        )?;
        let features = self.extract(&weeks, request)?;
        let (Some(current_week), Some(latest)) = (weeks.last(), features.last()) else {
            return Err(Error::InsufficientData("no complete week of data".into()));
        };

        let prediction = WeeklyPredictor::new(&self.config.predictor).predict(&features)?;
        let previous_week = prediction.baseline_value;

        let explanation = explain_week(
            latest,
            &prediction.coefficients,
            prediction.baseline_value,
            previous_week,
            prediction.value,
            &self.config.explanation,
        )?;

        let verdict = classify_features(latest, &self.config.risk);
        let current_level = verdict.risk_level;

        let (transition, warning) = match history {
            Some(mut history) => {
                let transition = detect_risk_transition(history.last().copied(), Some(current_level));
                history.push(current_level);
                (transition, evaluate_risk_trajectory(&history))
            }
            None => (
                detect_risk_transition(None, Some(current_level)),
                WarningVerdict {
                    warning_level: WarningLevel::None,
                    reason: None,
                    trajectory: vec![current_level],
                    weeks_observed: 1,
                },
            ),
        };

        let model_mae = prediction.mean_absolute_error_model;
        let baseline_mae = prediction.mean_absolute_error_baseline;

        tracing::info!(
            weeks = weeks.len(),
            prediction = prediction.value,
            ml_used = prediction.model_used,
            risk = %current_level,
            warning = %warning.warning_level,
            "Weekly intelligence generated"
        );

        Ok(WeeklyReport {
            status: Status {
                state: StatusState::Ok,
                message: SUCCESS_MESSAGE.into(),
            },
            prediction: Some(PredictionSection {
                next_week_minutes: prediction.value,
                previous_week_minutes: previous_week,
                baseline_prediction: prediction.baseline_value,
                delta_vs_previous: explanation.delta_vs_previous,
                delta_vs_baseline: explanation.delta_vs_baseline,
                model_used: prediction.model_used,
            }),
            evaluation: Some(EvaluationSection {
                baseline_mae,
                model_mae,
                beats_baseline: model_mae.is_some_and(|mae| mae < baseline_mae),
                ml_used: prediction.model_used,
                samples_used: prediction.samples_used,
                evaluation_mode: prediction.evaluation_mode,
            }),
            context: Some(ContextSection {
                weeks_used: weeks.len(),
                features_used: FeatureName::ALL.to_vec(),
                daily_variability: latest.get(FeatureName::DailyVariability),
                category_balance: latest.get(FeatureName::CategoryBalance),
                dominance_ratio: latest.get(FeatureName::DominanceRatio),
                week_start: current_week.start,
                week_end: current_week.end,
            }),
            risk: Some(RiskSection {
                verdict,
                confidence: explanation.confidence_hint,
                transition,
            }),
            meta: Some(MetaSection::new(prediction.model_used.then_some(MODEL_TYPE))),
            explanation: Some(explanation),
            warning: Some(warning),
        })
    }

    fn extract(&self, weeks: &[WeekWindow], request: &WeeklyRequest) -> Result<Vec<WeeklyFeatureVector>> {
        weeks
            .iter()
            .zip(categories_per_week(request, weeks.len()))
            .map(|(week, categories)| extract_weekly_features(&week.daily_minutes, categories))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{RiskLevel, RiskTransition};
    use chrono::{Duration, NaiveDate};

    fn request(weeks: &[[f64; 7]]) -> WeeklyRequest {
        let start = NaiveDate::from_ymd_opt(2026, 1, 5).unwrap();
        let weekly_daily_totals = weeks
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, m)| DailyTotal::new(start + Duration::days(i as i64), *m))
            .collect();
        let last: f64 = weeks.last().map(|w| w.iter().sum()).unwrap_or(0.0);

        WeeklyRequest {
            weekly_daily_totals,
            weekly_category_totals: [("Work".to_string(), last / 2.0), ("Study".to_string(), last / 2.0)]
                .into_iter()
                .collect(),
            category_history: vec![],
            risk_history: None,
        }
    }

    const STEADY: [f64; 7] = [60.0; 7];
    const SPIKY: [f64; 7] = [200.0, 0.0, 200.0, 0.0, 200.0, 0.0, 200.0];

    #[test]
    fn test_two_weeks_is_baseline_only() {
        let report = WeeklyIntelligence::default().run(&request(&[STEADY, STEADY]));
        assert!(report.is_ok());

        let prediction = report.prediction.unwrap();
        assert!(!prediction.model_used);
        assert_eq!(prediction.next_week_minutes, 420.0);
        assert_eq!(prediction.baseline_prediction, 420.0);
        assert_eq!(prediction.delta_vs_baseline, 0.0);

        let evaluation = report.evaluation.unwrap();
        assert!(!evaluation.ml_used);
        assert_eq!(evaluation.model_mae, None);
        assert!(!evaluation.beats_baseline);
        assert_eq!(evaluation.samples_used, 0);

        let explanation = report.explanation.unwrap();
        assert_eq!(explanation.total_contribution, 0.0);
        assert!(explanation.top_positive_drivers.is_empty());

        let meta = report.meta.unwrap();
        assert_eq!(meta.model_type, None);
        assert_eq!(report.context.unwrap().weeks_used, 2);
    }

    #[test]
    fn test_three_weeks_fits_model() {
        let report = WeeklyIntelligence::default().run(&request(&[STEADY, SPIKY, STEADY]));
        assert!(report.is_ok());

        let evaluation = report.evaluation.unwrap();
        assert!(evaluation.ml_used);
        assert_eq!(evaluation.samples_used, 2);
        assert!(evaluation.model_mae.unwrap().is_finite());
        assert_eq!(evaluation.baseline_mae, 380.0);

        let prediction = report.prediction.unwrap();
        assert!(prediction.model_used);
        assert_eq!(prediction.previous_week_minutes, 420.0);
        assert_eq!(
            prediction.delta_vs_baseline,
            prediction.next_week_minutes - prediction.baseline_prediction
        );
        assert_eq!(report.meta.unwrap().model_type.as_deref(), Some(MODEL_TYPE));
    }

    #[test]
    fn test_insufficient_data_report() {
        let mut req = request(&[STEADY, STEADY]);
        req.weekly_daily_totals.truncate(10);

        let report = WeeklyIntelligence::default().run(&req);
        assert_eq!(report.status.state, StatusState::InsufficientData);
        assert!(report.prediction.is_none());
        assert!(report.warning.is_none());
    }

    #[test]
    fn test_without_history_warning_is_quiet() {
        let report = WeeklyIntelligence::default().run(&request(&[SPIKY, SPIKY]));
        let warning = report.warning.unwrap();

        assert_eq!(warning.warning_level, WarningLevel::None);
        assert_eq!(warning.trajectory, vec![RiskLevel::R2]);
        assert_eq!(warning.weeks_observed, 1);
        assert_eq!(report.risk.unwrap().transition, RiskTransition::Unknown);
    }

    #[test]
    fn test_history_is_extended_with_current_week() {
        let mut req = request(&[STEADY, SPIKY]);
        req.risk_history = Some(vec!["R1".into(), "R2".into()]);

        let report = WeeklyIntelligence::default().try_run(&req).unwrap();
        let warning = report.warning.unwrap();
        assert_eq!(warning.warning_level, WarningLevel::Elevated);
        assert_eq!(warning.reason.as_deref(), Some("Volatility persists without recovery"));
        assert_eq!(
            warning.trajectory,
            vec![RiskLevel::R1, RiskLevel::R2, RiskLevel::R2]
        );

        let risk = report.risk.unwrap();
        assert_eq!(risk.verdict.risk_level, RiskLevel::R2);
        assert_eq!(risk.transition, RiskTransition::Stable);
    }

    #[test]
    fn test_bad_history_token_is_an_error() {
        let mut req = request(&[STEADY, STEADY]);
        req.risk_history = Some(vec!["R1".into(), "R9".into()]);

        let err = WeeklyIntelligence::default().try_run(&req).unwrap_err();
        assert!(matches!(err, Error::MalformedInput(_)));

        let report = WeeklyIntelligence::default().run(&req);
        assert_eq!(report.status.state, StatusState::Error);
        assert!(report.status.message.contains("R9"));
    }

    #[test]
    fn test_category_history_alignment() {
        let mut req = request(&[STEADY, STEADY, STEADY]);
        req.category_history = vec![[("Work".to_string(), 420.0)].into_iter().collect()];

        let per_week = categories_per_week(&req, 3);
        assert_eq!(per_week.len(), 3);
        assert!(per_week[0].is_empty());
        assert_eq!(per_week[1].get("Work"), Some(&420.0));
        assert_eq!(per_week[2], &req.weekly_category_totals);
    }

    #[test]
    fn test_stable_week_report_context() {
        let report = WeeklyIntelligence::default().run(&request(&[STEADY, STEADY]));
        let context = report.context.unwrap();

        assert_eq!(context.daily_variability, 0.0);
        assert_eq!(context.category_balance, 1.0);
        assert_eq!(context.features_used.len(), FeatureName::COUNT);
        assert_eq!(context.week_end, NaiveDate::from_ymd_opt(2026, 1, 18).unwrap());

        let risk = report.risk.unwrap();
        assert_eq!(risk.verdict.risk_level, RiskLevel::R0);
        assert_eq!(risk.confidence, crate::models::Confidence::Stable);
    }
}
