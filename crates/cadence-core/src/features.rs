//! Weekly feature extraction
//!
//! Turns one week of daily totals and category totals into a fixed-name
//! [`WeeklyFeatureVector`]. Feature names are resolved once at the boundary
//! ([`FeatureName::resolve`]); everything downstream works with the enum.

use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};
use crate::models::CategoryTotals;
use crate::stats;

/// Canonical feature names
///
/// Declaration order is the insertion order used for stable tie-breaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureName {
    TotalMinutes,
    AvgDailyMinutes,
    ActiveDays,
    MaxDayMinutes,
    MinDayMinutes,
    DailyVariability,
    CategoryBalance,
    DominanceRatio,
    CategoryDominanceRatio,
}

impl FeatureName {
    pub const COUNT: usize = 9;

    pub const ALL: [FeatureName; FeatureName::COUNT] = [
        FeatureName::TotalMinutes,
        FeatureName::AvgDailyMinutes,
        FeatureName::ActiveDays,
        FeatureName::MaxDayMinutes,
        FeatureName::MinDayMinutes,
        FeatureName::DailyVariability,
        FeatureName::CategoryBalance,
        FeatureName::DominanceRatio,
        FeatureName::CategoryDominanceRatio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FeatureName::TotalMinutes => "total_minutes",
            FeatureName::AvgDailyMinutes => "avg_daily_minutes",
            FeatureName::ActiveDays => "active_days",
            FeatureName::MaxDayMinutes => "max_day_minutes",
            FeatureName::MinDayMinutes => "min_day_minutes",
            FeatureName::DailyVariability => "daily_variability",
            FeatureName::CategoryBalance => "category_balance",
            FeatureName::DominanceRatio => "dominance_ratio",
            FeatureName::CategoryDominanceRatio => "category_dominance_ratio",
        }
    }

    /// Short alias accepted at ingestion, if any
    pub fn alias(&self) -> Option<&'static str> {
        match self {
            FeatureName::DailyVariability => Some("dv"),
            FeatureName::DominanceRatio => Some("dr"),
            FeatureName::CategoryBalance => Some("cb"),
            _ => None,
        }
    }

    /// Resolve a canonical name or alias
    pub fn resolve(key: &str) -> Option<FeatureName> {
        Self::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == key || name.alias() == Some(key))
    }

    /// Features that must lie in [0, 1]
    pub fn is_unit_interval(&self) -> bool {
        matches!(
            self,
            FeatureName::CategoryBalance
                | FeatureName::DominanceRatio
                | FeatureName::CategoryDominanceRatio
        )
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for FeatureName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for FeatureName {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        FeatureName::resolve(s)
            .ok_or_else(|| Error::MalformedInput(format!("unknown feature '{}'", s)))
    }
}

/// Resolve every key of a name→value map, rejecting unknown names, keys
/// given twice through an alias, and non-finite values
fn resolve_entries(map: &BTreeMap<String, f64>) -> Result<BTreeMap<FeatureName, f64>> {
    let mut resolved = BTreeMap::new();
    for (key, value) in map {
        let name: FeatureName = key.parse()?;
        if !value.is_finite() {
            return Err(Error::MalformedInput(format!(
                "feature '{}' is not finite",
                key
            )));
        }
        if resolved.insert(name, *value).is_some() {
            return Err(Error::MalformedInput(format!(
                "feature '{}' supplied more than once",
                name
            )));
        }
    }
    Ok(resolved)
}

/// Numeric description of one week of activity
///
/// Always complete: every [`FeatureName`] has a finite value and the
/// balance/dominance features lie in [0, 1]. Immutable once built.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<String, f64>")]
pub struct WeeklyFeatureVector {
    values: [f64; FeatureName::COUNT],
}

impl WeeklyFeatureVector {
    fn new(values: [f64; FeatureName::COUNT]) -> Result<Self> {
        for name in FeatureName::ALL {
            let value = values[name.index()];
            if !value.is_finite() {
                return Err(Error::MalformedInput(format!(
                    "feature '{}' is not finite",
                    name
                )));
            }
            if name.is_unit_interval() && !(0.0..=1.0).contains(&value) {
                return Err(Error::MalformedInput(format!(
                    "feature '{}' = {} is outside [0, 1]",
                    name, value
                )));
            }
        }
        Ok(Self { values })
    }

    /// Build from a name→value map (canonical names or aliases)
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Self> {
        let resolved = resolve_entries(map)?;
        let mut values = [0.0; FeatureName::COUNT];
        for name in FeatureName::ALL {
            values[name.index()] = *resolved.get(&name).ok_or_else(|| {
                Error::MalformedInput(format!("missing required feature '{}'", name))
            })?;
        }
        Self::new(values)
    }

    pub fn get(&self, name: FeatureName) -> f64 {
        self.values[name.index()]
    }

    /// Values in canonical order, suitable as a model input row
    pub fn as_slice(&self) -> &[f64] {
        &self.values
    }

    /// (name, value) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.iter().map(move |name| (*name, self.get(*name)))
    }

    pub fn entries(&self) -> Vec<(FeatureName, f64)> {
        self.iter().collect()
    }
}

impl TryFrom<BTreeMap<String, f64>> for WeeklyFeatureVector {
    type Error = Error;

    fn try_from(map: BTreeMap<String, f64>) -> Result<Self> {
        Self::from_map(&map)
    }
}

impl Serialize for WeeklyFeatureVector {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter().map(|(name, value)| (name.as_str(), value)))
    }
}

/// Extract the feature vector for one week
///
/// `daily_minutes` holds the week's per-day totals in date order and
/// `category_minutes` the same week's per-category totals.
pub fn extract_weekly_features(
    daily_minutes: &[f64],
    category_minutes: &CategoryTotals,
) -> Result<WeeklyFeatureVector> {
    if daily_minutes.is_empty() {
        return Err(Error::MalformedInput(
            "a week needs at least one daily total".into(),
        ));
    }
    if let Some(bad) = daily_minutes.iter().find(|v| !v.is_finite() || **v < 0.0) {
        return Err(Error::MalformedInput(format!(
            "daily total {} must be a finite, non-negative number of minutes",
            bad
        )));
    }
    if let Some((category, bad)) = category_minutes
        .iter()
        .find(|(_, v)| !v.is_finite() || **v < 0.0)
    {
        return Err(Error::MalformedInput(format!(
            "category '{}' has invalid minutes {}",
            category, bad
        )));
    }

    let total: f64 = daily_minutes.iter().sum();
    let max = daily_minutes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let min = daily_minutes.iter().copied().fold(f64::INFINITY, f64::min);

    let mut values = [0.0; FeatureName::COUNT];
    values[FeatureName::TotalMinutes.index()] = total;
    values[FeatureName::AvgDailyMinutes.index()] = total / daily_minutes.len() as f64;
    values[FeatureName::ActiveDays.index()] =
        daily_minutes.iter().filter(|v| **v > 0.0).count() as f64;
    values[FeatureName::MaxDayMinutes.index()] = max;
    values[FeatureName::MinDayMinutes.index()] = min;
    values[FeatureName::DailyVariability.index()] =
        stats::population_std_dev(daily_minutes).unwrap_or(0.0);
    values[FeatureName::CategoryBalance.index()] = stats::category_balance(category_minutes);
    values[FeatureName::DominanceRatio.index()] =
        stats::dominance_ratio(daily_minutes.iter().copied());
    values[FeatureName::CategoryDominanceRatio.index()] =
        stats::dominance_ratio(category_minutes.values().copied());

    let features = WeeklyFeatureVector::new(values)?;
    tracing::debug!(
        total = features.get(FeatureName::TotalMinutes),
        variability = features.get(FeatureName::DailyVariability),
        balance = features.get(FeatureName::CategoryBalance),
        "Extracted weekly features"
    );
    Ok(features)
}

/// The three signals the risk classifier reads
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskSignals {
    pub daily_variability: f64,
    pub dominance_ratio: f64,
    pub category_balance: f64,
}

impl RiskSignals {
    pub fn from_features(features: &WeeklyFeatureVector) -> Self {
        Self {
            daily_variability: features.get(FeatureName::DailyVariability),
            dominance_ratio: features.get(FeatureName::DominanceRatio),
            category_balance: features.get(FeatureName::CategoryBalance),
        }
    }

    /// Resolve a loosely keyed map (canonical names or `dv`/`dr`/`cb`)
    ///
    /// An empty map carries no signal and yields `Ok(None)`. Otherwise all
    /// three signals are required; other canonical features are ignored.
    pub fn from_map(map: &BTreeMap<String, f64>) -> Result<Option<Self>> {
        if map.is_empty() {
            return Ok(None);
        }

        let resolved = resolve_entries(map)?;
        let require = |name: FeatureName| {
            resolved.get(&name).copied().ok_or_else(|| {
                Error::MalformedInput(format!("missing risk signal '{}'", name))
            })
        };

        Ok(Some(Self {
            daily_variability: require(FeatureName::DailyVariability)?,
            dominance_ratio: require(FeatureName::DominanceRatio)?,
            category_balance: require(FeatureName::CategoryBalance)?,
        }))
    }
}
