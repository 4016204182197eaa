//! Next-week prediction
//!
//! Two predictions are produced for the week after the most recent complete
//! week:
//! - **Baseline** - the most recent complete week's total, used as the
//!   accuracy floor
//! - **Learned** - an ordinary-least-squares fit of next-week totals on the
//!   weekly feature vectors, used when enough history exists
//!
//! Fitting with fewer than `min_training_pairs` (week, next-week) pairs is
//! refused with [`Error::InsufficientData`]; [`WeeklyPredictor::predict`]
//! turns that refusal into baseline-only mode.

pub mod linalg;

use serde::{Deserialize, Serialize};

use crate::config::PredictorConfig;
use crate::error::{Error, Result};
use crate::features::{FeatureName, WeeklyFeatureVector};
use crate::serde_ext::ordered_map;
use crate::stats::mean_absolute_error;

/// Model type reported in report metadata
pub const MODEL_TYPE: &str = "LinearRegression";

/// Learned weights keyed by feature name
///
/// An empty set of weights is valid and explains nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    pub intercept: f64,
    #[serde(with = "ordered_map")]
    pub weights: Vec<(FeatureName, f64)>,
}

impl Coefficients {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_weights(intercept: f64, weights: Vec<(FeatureName, f64)>) -> Self {
        Self { intercept, weights }
    }

    /// Weight for a feature, 0.0 when absent
    pub fn get(&self, name: FeatureName) -> f64 {
        self.weights
            .iter()
            .find(|(n, _)| *n == name)
            .map_or(0.0, |(_, w)| *w)
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

/// How model accuracy was measured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluationMode {
    /// Errors measured on the same pairs the model was fitted on
    InSample,
}

/// Supervised pairs: features of week `i`, total of week `i + 1`
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingSet {
    pub inputs: Vec<WeeklyFeatureVector>,
    pub targets: Vec<f64>,
}

impl TrainingSet {
    pub fn from_weeks(weeks: &[WeeklyFeatureVector]) -> Self {
        let inputs = weeks.iter().take(weeks.len().saturating_sub(1)).cloned().collect();
        let targets = weeks
            .iter()
            .skip(1)
            .map(|w| w.get(FeatureName::TotalMinutes))
            .collect();
        Self { inputs, targets }
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

/// Baseline predictions over consecutive week pairs
///
/// Returns `(y_true, y_pred)` where each prediction is the previous week's
/// total. Empty when fewer than two weeks are available.
pub fn baseline_pairs(week_totals: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if week_totals.len() < 2 {
        return (vec![], vec![]);
    }
    let y_pred = week_totals[..week_totals.len() - 1].to_vec();
    let y_true = week_totals[1..].to_vec();
    (y_true, y_pred)
}

/// Linear regression with an intercept, fitted by the normal equations
#[derive(Debug, Clone, PartialEq)]
pub struct LinearRegressionModel {
    coefficients: Coefficients,
}

impl LinearRegressionModel {
    /// Fit on a training set
    ///
    /// Requires at least `min_pairs` samples; never attempts a fit below that.
    pub fn fit(training: &TrainingSet, min_pairs: usize) -> Result<Self> {
        if training.len() < min_pairs {
            return Err(Error::InsufficientData(format!(
                "need at least {} (week, next-week) pairs to fit, found {}",
                min_pairs,
                training.len()
            )));
        }

        let design: Vec<Vec<f64>> = training
            .inputs
            .iter()
            .map(|features| {
                std::iter::once(1.0)
                    .chain(features.as_slice().iter().copied())
                    .collect()
            })
            .collect();

        let solution = linalg::least_squares(&design, &training.targets);
        if solution.iter().any(|w| !w.is_finite()) {
            return Err(Error::InternalConsistency(
                "least-squares fit produced non-finite weights".into(),
            ));
        }

        let weights = FeatureName::ALL
            .iter()
            .copied()
            .zip(solution[1..].iter().copied())
            .collect();

        Ok(Self {
            coefficients: Coefficients::from_weights(solution[0], weights),
        })
    }

    pub fn predict(&self, features: &WeeklyFeatureVector) -> f64 {
        self.coefficients.intercept
            + features
                .iter()
                .map(|(name, value)| value * self.coefficients.get(name))
                .sum::<f64>()
    }

    pub fn coefficients(&self) -> &Coefficients {
        &self.coefficients
    }
}

/// Outcome of a prediction run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub value: f64,
    pub baseline_value: f64,
    pub model_used: bool,
    pub mean_absolute_error_model: Option<f64>,
    pub mean_absolute_error_baseline: f64,
    pub evaluation_mode: EvaluationMode,
    /// Training pairs used by the model (0 in baseline-only mode)
    pub samples_used: usize,
    /// Learned weights (empty in baseline-only mode)
    pub coefficients: Coefficients,
    /// Why the learned model was not used, if it was not
    pub fallback_reason: Option<String>,
}

/// Produces next-week predictions from weekly feature history
pub struct WeeklyPredictor<'a> {
    config: &'a PredictorConfig,
}

impl<'a> WeeklyPredictor<'a> {
    pub fn new(config: &'a PredictorConfig) -> Self {
        Self { config }
    }

    /// Fit the learned model on consecutive week pairs
    pub fn fit(&self, weeks: &[WeeklyFeatureVector]) -> Result<LinearRegressionModel> {
        LinearRegressionModel::fit(
            &TrainingSet::from_weeks(weeks),
            self.config.min_training_pairs,
        )
    }

    /// Predict the week after the last entry of `weeks` (oldest first)
    ///
    /// Needs at least two complete weeks. When the model cannot be fitted
    /// the baseline is returned with `model_used = false`.
    pub fn predict(&self, weeks: &[WeeklyFeatureVector]) -> Result<Prediction> {
        let latest = match weeks {
            [.., _, latest] => latest,
            _ => {
                return Err(Error::InsufficientData(format!(
                    "At least two full weeks of data are required; found {}.",
                    weeks.len()
                )))
            }
        };

        let totals: Vec<f64> = weeks
            .iter()
            .map(|w| w.get(FeatureName::TotalMinutes))
            .collect();
        let baseline_value = latest.get(FeatureName::TotalMinutes);
        let (y_true, y_pred) = baseline_pairs(&totals);
        let baseline_mae = mean_absolute_error(&y_true, &y_pred);

        let baseline_only = |reason: String| Prediction {
            value: baseline_value,
            baseline_value,
            model_used: false,
            mean_absolute_error_model: None,
            mean_absolute_error_baseline: baseline_mae,
            evaluation_mode: EvaluationMode::InSample,
            samples_used: 0,
            coefficients: Coefficients::empty(),
            fallback_reason: Some(reason),
        };

        let model = match self.fit(weeks) {
            Ok(model) => model,
            Err(Error::InsufficientData(reason)) => {
                tracing::warn!(reason = %reason, "Learned model refused; using baseline");
                return Ok(baseline_only(reason));
            }
            Err(e) => return Err(e),
        };

        let value = model.predict(latest);
        if !value.is_finite() {
            return Err(Error::InternalConsistency(
                "learned model produced a non-finite prediction".into(),
            ));
        }

        let training = TrainingSet::from_weeks(weeks);
        let fitted: Vec<f64> = training.inputs.iter().map(|f| model.predict(f)).collect();
        let model_mae = mean_absolute_error(&training.targets, &fitted);

        tracing::debug!(
            prediction = value,
            baseline = baseline_value,
            model_mae,
            baseline_mae,
            samples = training.len(),
            "Fitted weekly model"
        );

        Ok(Prediction {
            value,
            baseline_value,
            model_used: true,
            mean_absolute_error_model: Some(model_mae),
            mean_absolute_error_baseline: baseline_mae,
            evaluation_mode: EvaluationMode::InSample,
            samples_used: training.len(),
            coefficients: model.coefficients().clone(),
            fallback_reason: None,
        })
    }
}
