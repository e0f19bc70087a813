//! Descriptive statistics shared by the resampling and inference layers.
//!
//! Conventions: NaN marks missing data. Routines that aggregate a series
//! return NaN rather than erroring when the input is empty after NaN
//! removal, so batch analyses over many groups degrade per group.

use crate::math_utils::lerp;

/// Copy of `data` with NaN values removed.
pub fn nan_filtered(data: &[f64]) -> Vec<f64> {
    data.iter().copied().filter(|v| !v.is_nan()).collect()
}

/// Arithmetic mean; NaN for an empty slice.
pub fn mean(data: &[f64]) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }
    data.iter().sum::<f64>() / data.len() as f64
}

/// Sample variance (ddof = 1); NaN with fewer than two points.
pub fn sample_variance(data: &[f64]) -> f64 {
    if data.len() < 2 {
        return f64::NAN;
    }
    let m = mean(data);
    data.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (data.len() - 1) as f64
}

/// Sample standard deviation (ddof = 1); NaN with fewer than two points.
pub fn sample_std(data: &[f64]) -> f64 {
    sample_variance(data).sqrt()
}

/// Median; NaN for an empty slice.
pub fn median(data: &[f64]) -> f64 {
    percentile(data, 50.0)
}

/// Empirical percentile with linear interpolation between order
/// statistics, matching the convention of the downstream analysis stack.
///
/// # Arguments
/// * `data` - Input values (unsorted, NaN-free)
/// * `q` - Percentile in [0, 100]
pub fn percentile(data: &[f64], q: f64) -> f64 {
    if data.is_empty() {
        return f64::NAN;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let rank = (q / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        lerp(sorted[lo], sorted[hi], rank - lo as f64)
    }
}

/// Coefficient of variation of the NaN-filtered series.
///
/// Returns NaN when the series is empty or its mean is zero.
pub fn coefficient_of_variation(data: &[f64]) -> f64 {
    let clean = nan_filtered(data);
    if clean.is_empty() {
        return f64::NAN;
    }

    let mean_val = mean(&clean);
    if mean_val == 0.0 {
        return f64::NAN;
    }

    sample_std(&clean) / mean_val
}

/// Autocorrelation function of the NaN-filtered series for lags
/// `0..=max_lag`. Lag 0 is always 1.0. Returns a NaN-filled vector when
/// the clean series is shorter than `max_lag + 1`.
pub fn autocorrelation(series: &[f64], max_lag: usize) -> Vec<f64> {
    let clean = nan_filtered(series);
    if clean.len() < max_lag + 1 {
        return vec![f64::NAN; max_lag + 1];
    }

    let m = mean(&clean);
    let centered: Vec<f64> = clean.iter().map(|v| v - m).collect();
    let n = centered.len() as f64;
    let c0 = centered.iter().map(|v| v * v).sum::<f64>() / n;

    let mut acf = Vec::with_capacity(max_lag + 1);
    for lag in 0..=max_lag {
        if lag == 0 {
            acf.push(1.0);
        } else {
            let c_lag = centered[..centered.len() - lag]
                .iter()
                .zip(&centered[lag..])
                .map(|(a, b)| a * b)
                .sum::<f64>()
                / n;
            acf.push(if c0 > 0.0 { c_lag / c0 } else { f64::NAN });
        }
    }

    acf
}

/// Remove pairs where either value is NaN; returns the surviving pairs as
/// two parallel vectors.
pub fn drop_nan_pairs(x: &[f64], y: &[f64]) -> (Vec<f64>, Vec<f64>) {
    let mut x_clean = Vec::new();
    let mut y_clean = Vec::new();
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        if !xi.is_nan() && !yi.is_nan() {
            x_clean.push(xi);
            y_clean.push(yi);
        }
    }
    (x_clean, y_clean)
}
