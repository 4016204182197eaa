//! Statistical utilities over activity minutes
//!
//! All functions are pure and operate on numeric inputs only.

use crate::models::CategoryTotals;

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population variance (divides by n)
pub fn variance(values: &[f64]) -> Option<f64> {
    let avg = mean(values)?;
    Some(values.iter().map(|x| (x - avg).powi(2)).sum::<f64>() / values.len() as f64)
}

/// Population standard deviation (divides by n, not n - 1)
pub fn population_std_dev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

/// Share of the total held by the single largest value
///
/// Returns 0.0 for empty input or a zero total.
pub fn dominance_ratio<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let (total, max) = values
        .into_iter()
        .fold((0.0_f64, f64::NEG_INFINITY), |(sum, max), v| {
            (sum + v, max.max(v))
        });

    if total <= 0.0 {
        return 0.0;
    }
    (max / total).clamp(0.0, 1.0)
}

/// Shannon entropy of the nonzero shares, normalized by `ln(count)`
///
/// Returns 0.0 when fewer than two values are nonzero.
pub fn normalized_entropy<I>(values: I) -> f64
where
    I: IntoIterator<Item = f64>,
{
    let nonzero: Vec<f64> = values.into_iter().filter(|v| *v > 0.0).collect();
    if nonzero.len() < 2 {
        return 0.0;
    }

    let total: f64 = nonzero.iter().sum();
    let entropy: f64 = nonzero
        .iter()
        .map(|v| {
            let p = v / total;
            -p * p.ln()
        })
        .sum();
    let max_entropy = (nonzero.len() as f64).ln();

    (entropy / max_entropy).clamp(0.0, 1.0)
}

/// How evenly time is spread across categories, in [0, 1]
///
/// - no recorded time: 0.0
/// - exactly one category holds all recorded time: 1.0
/// - otherwise the normalized entropy of the category shares
///
/// The single-category case overrides the "fewer than two shares" rule of
/// [`normalized_entropy`].
pub fn category_balance(category_minutes: &CategoryTotals) -> f64 {
    let total: f64 = category_minutes.values().sum();
    if total <= 0.0 {
        return 0.0;
    }

    let nonzero = category_minutes.values().filter(|v| **v > 0.0).count();
    if nonzero == 1 {
        return 1.0;
    }

    normalized_entropy(category_minutes.values().copied())
}

/// Mean absolute error between paired truths and predictions
///
/// Returns 0.0 for empty input.
pub fn mean_absolute_error(y_true: &[f64], y_pred: &[f64]) -> f64 {
    let n = y_true.len().min(y_pred.len());
    if n == 0 {
        return 0.0;
    }
    y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).abs())
        .sum::<f64>()
        / n as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn categories(pairs: &[(&str, f64)]) -> CategoryTotals {
        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }

    #[test]
    fn test_population_std_dev() {
        assert_eq!(population_std_dev(&[60.0; 7]), Some(0.0));
        // mean 5, squared deviations sum 32, n = 8
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_eq!(population_std_dev(&values), Some(2.0));
        assert_eq!(population_std_dev(&[]), None);
    }

    #[test]
    fn test_dominance_ratio() {
        assert_eq!(dominance_ratio([60.0; 7]), 60.0 / 420.0);
        assert_eq!(dominance_ratio([0.0, 0.0]), 0.0);
        assert_eq!(dominance_ratio(std::iter::empty::<f64>()), 0.0);
        assert_eq!(dominance_ratio([300.0, 0.0, 0.0]), 1.0);
    }

    #[test]
    fn test_normalized_entropy() {
        assert_eq!(normalized_entropy([5.0]), 0.0);
        assert!((normalized_entropy([1.0, 1.0, 1.0, 1.0]) - 1.0).abs() < 1e-12);
        let skewed = normalized_entropy([90.0, 10.0]);
        assert!(skewed > 0.0 && skewed < 1.0);
    }

    #[test]
    fn test_category_balance_edge_cases() {
        assert_eq!(category_balance(&CategoryTotals::new()), 0.0);
        assert_eq!(category_balance(&categories(&[("Work", 0.0)])), 0.0);
        assert_eq!(category_balance(&categories(&[("Work", 420.0)])), 1.0);
        // A zero-minute category does not change the single-category override
        assert_eq!(
            category_balance(&categories(&[("Work", 420.0), ("Leisure", 0.0)])),
            1.0
        );
        let even = category_balance(&categories(&[("Work", 100.0), ("Study", 100.0)]));
        assert!((even - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_mean_absolute_error() {
        assert_eq!(mean_absolute_error(&[], &[]), 0.0);
        assert_eq!(mean_absolute_error(&[10.0, 20.0], &[12.0, 16.0]), 3.0);
    }
}
