//! Bootstrap and permutation primitives.
//!
//! Every routine takes an explicit `seed` and drives its own `StdRng`, so
//! results are reproducible and independent calls never share generator
//! state. Iteration counts are fixed up front; there is no early exit.

use crate::stats::correlation::{ols_slope, spearman};
use crate::stats::describe::{drop_nan_pairs, mean, nan_filtered, percentile};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

/// A point estimate with an empirical confidence interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CiEstimate {
    pub statistic: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

impl CiEstimate {
    /// The NaN triple returned when a routine has no usable input.
    pub fn nan() -> CiEstimate {
        CiEstimate {
            statistic: f64::NAN,
            ci_low: f64::NAN,
            ci_high: f64::NAN,
        }
    }

    pub fn is_nan(&self) -> bool {
        self.statistic.is_nan() && self.ci_low.is_nan() && self.ci_high.is_nan()
    }
}

/// Bootstrap confidence interval for an arbitrary statistic.
///
/// Draws `n_bootstrap` samples of size |data| with replacement, applies
/// `statistic` to each, and brackets the estimate with the empirical
/// 100·α/2 and 100·(1−α/2) percentiles, α = 1 − confidence.
/// Deterministic for a fixed seed.
pub fn bootstrap_ci<F>(
    data: &[f64],
    statistic: F,
    n_bootstrap: usize,
    confidence: f64,
    seed: u64,
) -> CiEstimate
where
    F: Fn(&[f64]) -> f64,
{
    let n = data.len();
    if n == 0 {
        return CiEstimate::nan();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let obs_stat = statistic(data);

    let mut bootstrap_stats = Vec::with_capacity(n_bootstrap);
    let mut sample = vec![0.0; n];
    for _ in 0..n_bootstrap {
        for slot in sample.iter_mut() {
            *slot = data[rng.random_range(0..n)];
        }
        bootstrap_stats.push(statistic(&sample));
    }

    let alpha = 1.0 - confidence;
    CiEstimate {
        statistic: obs_stat,
        ci_low: percentile(&bootstrap_stats, 100.0 * alpha / 2.0),
        ci_high: percentile(&bootstrap_stats, 100.0 * (1.0 - alpha / 2.0)),
    }
}

/// Block bootstrap for time series with short-range temporal correlation.
///
/// Samples are built by concatenating contiguous blocks of fixed
/// `block_length` starting at random positions. Blocks wrap circularly
/// past the series end; the wrap is deliberate so short series still
/// yield full-length samples. The concatenation is truncated to the
/// original length. NaN values are removed first; an empty clean series
/// yields the NaN triple.
pub fn block_bootstrap_ci<F>(
    series: &[f64],
    block_length: usize,
    statistic: F,
    n_bootstrap: usize,
    confidence: f64,
    seed: u64,
) -> CiEstimate
where
    F: Fn(&[f64]) -> f64,
{
    let clean = nan_filtered(series);
    let n = clean.len();
    if n == 0 || block_length == 0 {
        return CiEstimate::nan();
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let obs_stat = statistic(&clean);

    let mut bootstrap_stats = Vec::with_capacity(n_bootstrap);
    for _ in 0..n_bootstrap {
        let mut sample = Vec::with_capacity(n + block_length);
        while sample.len() < n {
            let start_idx = rng.random_range(0..n);
            for i in 0..block_length {
                sample.push(clean[(start_idx + i) % n]);
            }
        }
        sample.truncate(n);
        bootstrap_stats.push(statistic(&sample));
    }

    let alpha = 1.0 - confidence;
    CiEstimate {
        statistic: obs_stat,
        ci_low: percentile(&bootstrap_stats, 100.0 * alpha / 2.0),
        ci_high: percentile(&bootstrap_stats, 100.0 * (1.0 - alpha / 2.0)),
    }
}

/// The statistic a permutation test is built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermutationStatistic {
    /// Spearman rank correlation between x and y
    Correlation,
    /// mean(x) − mean(y)
    Difference,
    /// OLS slope of y on x
    Slope,
}

impl PermutationStatistic {
    /// Parse a statistic name from a configuration surface. Unknown names
    /// are a fatal configuration error.
    pub fn from_name(name: &str) -> Result<PermutationStatistic, String> {
        match name {
            "correlation" => Ok(PermutationStatistic::Correlation),
            "difference" => Ok(PermutationStatistic::Difference),
            "slope" => Ok(PermutationStatistic::Slope),
            other => Err(format!("Unknown statistic: {}", other)),
        }
    }

    fn evaluate(&self, x: &[f64], y: &[f64]) -> f64 {
        match self {
            PermutationStatistic::Correlation => spearman(x, y),
            PermutationStatistic::Difference => mean(x) - mean(y),
            PermutationStatistic::Slope => ols_slope(x, y),
        }
    }
}

/// Two-tailed permutation test for the relationship between x and y.
///
/// Permutes y independently of x `n_permutations` times and returns the
/// fraction of permuted statistics whose absolute value meets or exceeds
/// the observed absolute value. Pairs with a NaN member are removed
/// first; fewer than 3 surviving pairs yields NaN.
pub fn permutation_test(
    x: &[f64],
    y: &[f64],
    statistic: PermutationStatistic,
    n_permutations: usize,
    seed: u64,
) -> f64 {
    let (x_clean, y_clean) = drop_nan_pairs(x, y);
    if x_clean.len() < 3 {
        return f64::NAN;
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let obs_stat = statistic.evaluate(&x_clean, &y_clean);

    let mut exceed_count = 0usize;
    let mut y_perm = y_clean.clone();
    for _ in 0..n_permutations {
        y_perm.shuffle(&mut rng);
        let perm_stat = statistic.evaluate(&x_clean, &y_perm);
        if perm_stat.abs() >= obs_stat.abs() {
            exceed_count += 1;
        }
    }

    exceed_count as f64 / n_permutations as f64
}

/// Bootstrap forecast for a time series using moving (non-wrapping)
/// blocks.
///
/// Each iteration rebuilds the series past its end from random blocks and
/// averages the `forecast_horizon` values that land beyond the observed
/// range; the returned statistic is the mean forecast over all
/// iterations. A clean series shorter than `block_length` yields the NaN
/// triple.
pub fn moving_block_bootstrap_forecast(
    series: &[f64],
    forecast_horizon: usize,
    block_length: usize,
    n_bootstrap: usize,
    confidence: f64,
    seed: u64,
) -> CiEstimate {
    let clean = nan_filtered(series);
    let n = clean.len();
    if n < block_length || block_length == 0 || forecast_horizon == 0 {
        return CiEstimate::nan();
    }

    let mut rng = StdRng::seed_from_u64(seed);

    let mut forecasts = Vec::with_capacity(n_bootstrap);
    for _ in 0..n_bootstrap {
        let mut indices = Vec::with_capacity(n + forecast_horizon + block_length);
        while indices.len() < n + forecast_horizon {
            let start_idx = rng.random_range(0..=(n - block_length));
            indices.extend(start_idx..start_idx + block_length);
        }

        let horizon_mean = mean(
            &indices[n..n + forecast_horizon]
                .iter()
                .map(|&idx| clean[idx % n])
                .collect::<Vec<f64>>(),
        );
        forecasts.push(horizon_mean);
    }

    let alpha = 1.0 - confidence;
    CiEstimate {
        statistic: mean(&forecasts),
        ci_low: percentile(&forecasts, 100.0 * alpha / 2.0),
        ci_high: percentile(&forecasts, 100.0 * (1.0 - alpha / 2.0)),
    }
}
