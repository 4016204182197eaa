//! Explanation Generator
//!
//! Decomposes a prediction into additive per-feature contributions
//! (`value * weight`), ranks the strongest drivers of each sign, and attaches
//! a qualitative confidence hint derived from the week's volatility and
//! dominance.

use serde::{Deserialize, Serialize};

use crate::config::ExplanationConfig;
use crate::error::{Error, Result};
use crate::features::{FeatureName, WeeklyFeatureVector};
use crate::models::Confidence;
use crate::predictor::Coefficients;
use crate::serde_ext::ordered_map;

/// Structured, fully numeric explanation of one prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Explanation {
    pub prediction: f64,
    pub baseline: f64,
    pub previous_week: f64,
    pub delta_vs_baseline: f64,
    pub delta_vs_previous: f64,
    #[serde(with = "ordered_map")]
    pub feature_contributions: Vec<(FeatureName, f64)>,
    pub top_positive_drivers: Vec<(FeatureName, f64)>,
    pub top_negative_drivers: Vec<(FeatureName, f64)>,
    pub confidence_hint: Confidence,
    pub total_contribution: f64,
}

impl Explanation {
    pub fn contribution(&self, name: FeatureName) -> Option<f64> {
        self.feature_contributions
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, c)| *c)
    }
}

/// Confidence from volatility and dominance
///
/// "stable" is checked before "fragile". A week cannot satisfy both because
/// the default dominance bounds (below 0.5 vs above 0.7) do not overlap;
/// this relies on the configured bounds keeping that gap.
pub fn confidence_hint(
    daily_variability: f64,
    dominance_ratio: f64,
    config: &ExplanationConfig,
) -> Confidence {
    if daily_variability < config.stable_variability_max
        && dominance_ratio < config.stable_dominance_max
    {
        Confidence::Stable
    } else if dominance_ratio > config.fragile_dominance_min {
        Confidence::Fragile
    } else {
        Confidence::Moderate
    }
}

/// Strongest contributions of one sign, by magnitude
///
/// The sort is stable, so equal magnitudes keep their feature order.
fn top_drivers(
    contributions: &[(FeatureName, f64)],
    keep: impl Fn(f64) -> bool,
    limit: usize,
) -> Vec<(FeatureName, f64)> {
    let mut drivers: Vec<(FeatureName, f64)> = contributions
        .iter()
        .copied()
        .filter(|(_, c)| keep(*c))
        .collect();
    drivers.sort_by(|a, b| {
        b.1.abs()
            .partial_cmp(&a.1.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    drivers.truncate(limit);
    drivers
}

/// Explain a prediction from an ordered set of feature values
///
/// `features` may be partial, but must include daily variability and
/// dominance ratio for the confidence hint. Features without a coefficient
/// contribute 0.0.
pub fn explain_prediction(
    features: &[(FeatureName, f64)],
    coefficients: &Coefficients,
    baseline_value: f64,
    previous_week_value: f64,
    prediction: f64,
    config: &ExplanationConfig,
) -> Result<Explanation> {
    for (i, (name, value)) in features.iter().enumerate() {
        if !value.is_finite() {
            return Err(Error::MalformedInput(format!(
                "feature '{}' is not finite",
                name
            )));
        }
        if features[..i].iter().any(|(n, _)| n == name) {
            return Err(Error::MalformedInput(format!(
                "feature '{}' supplied more than once",
                name
            )));
        }
    }

    let lookup = |wanted: FeatureName| {
        features
            .iter()
            .find(|(n, _)| *n == wanted)
            .map(|(_, v)| *v)
            .ok_or_else(|| {
                Error::MalformedInput(format!(
                    "feature '{}' is required for the confidence hint",
                    wanted
                ))
            })
    };
    let confidence = confidence_hint(
        lookup(FeatureName::DailyVariability)?,
        lookup(FeatureName::DominanceRatio)?,
        config,
    );

    let contributions: Vec<(FeatureName, f64)> = features
        .iter()
        .map(|(name, value)| (*name, value * coefficients.get(*name)))
        .collect();
    let total_contribution: f64 = contributions.iter().map(|(_, c)| c).sum();

    if config.enforce_conservation {
        check_conservation(prediction - baseline_value, total_contribution, config)?;
    }

    Ok(Explanation {
        prediction,
        baseline: baseline_value,
        previous_week: previous_week_value,
        delta_vs_baseline: prediction - baseline_value,
        delta_vs_previous: prediction - previous_week_value,
        top_positive_drivers: top_drivers(&contributions, |c| c > 0.0, config.max_drivers),
        top_negative_drivers: top_drivers(&contributions, |c| c < 0.0, config.max_drivers),
        feature_contributions: contributions,
        confidence_hint: confidence,
        total_contribution,
    })
}

/// Explain a prediction for a complete weekly feature vector
pub fn explain_week(
    features: &WeeklyFeatureVector,
    coefficients: &Coefficients,
    baseline_value: f64,
    previous_week_value: f64,
    prediction: f64,
    config: &ExplanationConfig,
) -> Result<Explanation> {
    explain_prediction(
        &features.entries(),
        coefficients,
        baseline_value,
        previous_week_value,
        prediction,
        config,
    )
}

/// Development-time check that contributions account for the predicted delta
///
/// Skipped when nothing was explained (total contribution of zero).
fn check_conservation(
    model_delta: f64,
    explained_delta: f64,
    config: &ExplanationConfig,
) -> Result<()> {
    if explained_delta == 0.0 {
        return Ok(());
    }

    let ratio = model_delta / explained_delta;
    let (low, high) = config.conservation_band;
    if !(low..=high).contains(&ratio) {
        return Err(Error::InternalConsistency(format!(
            "prediction delta {:.4} vs explained delta {:.4} (ratio {:.4}) is outside [{}, {}]",
            model_delta, explained_delta, ratio, low, high
        )));
    }
    Ok(())
}
