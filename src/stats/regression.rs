//! Robust regression estimators.
//!
//! Exposure-response fits downstream run on a handful of yearly points, so
//! a single anomalous year can swing an OLS line badly. Both estimators
//! here bound that influence: Theil-Sen through pairwise-slope medians,
//! Huber through iteratively reweighted least squares. Either way the
//! reported R² comes from residuals against the fitted line.

use crate::stats::correlation::{ols_fit, r_squared};
use crate::stats::describe::{drop_nan_pairs, median, percentile};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Huber loss tuning constant (95% efficiency at the normal).
const HUBER_K: f64 = 1.345;
const HUBER_MAX_ITER: usize = 50;
const HUBER_TOL: f64 = 1e-8;
const HUBER_CI_BOOTSTRAP: usize = 1000;

/// Which robust estimator to fit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegressionMethod {
    /// Median of pairwise slopes, CI from their order statistics
    TheilSen,
    /// IRLS M-estimation with Huber weights, CI from a pair bootstrap
    Huber,
}

impl RegressionMethod {
    /// Parse a method name from a configuration surface. Unknown names are
    /// a fatal configuration error.
    pub fn from_name(name: &str) -> Result<RegressionMethod, String> {
        match name {
            "theil-sen" => Ok(RegressionMethod::TheilSen),
            "huber" => Ok(RegressionMethod::Huber),
            other => Err(format!("Unknown method: {}", other)),
        }
    }
}

/// A fitted robust regression line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RobustFit {
    pub slope: f64,
    pub intercept: f64,
    pub ci_slope_low: f64,
    pub ci_slope_high: f64,
    pub r_squared: f64,
}

impl RobustFit {
    /// The NaN-filled fit returned when fewer than 3 valid pairs remain.
    pub fn nan() -> RobustFit {
        RobustFit {
            slope: f64::NAN,
            intercept: f64::NAN,
            ci_slope_low: f64::NAN,
            ci_slope_high: f64::NAN,
            r_squared: f64::NAN,
        }
    }

    pub fn is_nan(&self) -> bool {
        self.slope.is_nan() && self.intercept.is_nan()
    }
}

/// Fit a robust regression of y on x.
///
/// Pairs with a NaN member are removed first; fewer than 3 surviving pairs
/// yields the NaN fit. The Huber confidence interval resamples pairs with
/// replacement and refits, so it needs the explicit `seed`; Theil-Sen
/// ignores it.
pub fn robust_regression(
    x: &[f64],
    y: &[f64],
    method: RegressionMethod,
    confidence: f64,
    seed: u64,
) -> RobustFit {
    let (x_clean, y_clean) = drop_nan_pairs(x, y);
    if x_clean.len() < 3 {
        return RobustFit::nan();
    }

    let (slope, intercept, ci_low, ci_high) = match method {
        RegressionMethod::TheilSen => theil_sen_fit(&x_clean, &y_clean, confidence),
        RegressionMethod::Huber => huber_fit_with_ci(&x_clean, &y_clean, confidence, seed),
    };

    RobustFit {
        slope,
        intercept,
        ci_slope_low: ci_low,
        ci_slope_high: ci_high,
        r_squared: r_squared(&x_clean, &y_clean, slope, intercept),
    }
}

/// Theil-Sen estimator: the slope is the median of all pairwise slopes,
/// the CI comes from the order statistics of that pairwise-slope
/// distribution at the configured confidence, and the intercept is the
/// median of `y − slope·x`.
fn theil_sen_fit(x: &[f64], y: &[f64], confidence: f64) -> (f64, f64, f64, f64) {
    let n = x.len();
    let mut pair_slopes = Vec::with_capacity(n * (n - 1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let dx = x[j] - x[i];
            if dx != 0.0 {
                pair_slopes.push((y[j] - y[i]) / dx);
            }
        }
    }

    if pair_slopes.is_empty() {
        return (f64::NAN, f64::NAN, f64::NAN, f64::NAN);
    }

    let slope = median(&pair_slopes);
    let residual_intercepts: Vec<f64> =
        x.iter().zip(y.iter()).map(|(&xi, &yi)| yi - slope * xi).collect();
    let intercept = median(&residual_intercepts);

    let alpha = 1.0 - confidence;
    let ci_low = percentile(&pair_slopes, 100.0 * alpha / 2.0);
    let ci_high = percentile(&pair_slopes, 100.0 * (1.0 - alpha / 2.0));

    (slope, intercept, ci_low, ci_high)
}

/// One Huber IRLS fit: start from OLS, reweight by the Huber function of
/// the scaled residuals, refit until the coefficients settle.
fn huber_irls(x: &[f64], y: &[f64]) -> (f64, f64) {
    let (mut slope, mut intercept) = ols_fit(x, y);
    if slope.is_nan() {
        return (f64::NAN, f64::NAN);
    }

    for _ in 0..HUBER_MAX_ITER {
        let residuals: Vec<f64> = x
            .iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| yi - slope * xi - intercept)
            .collect();

        // MAD-based scale, consistent for the normal
        let abs_res: Vec<f64> = residuals.iter().map(|r| r.abs()).collect();
        let scale = median(&abs_res) / 0.6745;
        if scale <= 0.0 || !scale.is_finite() {
            break; // exact fit, nothing left to reweight
        }

        let weights: Vec<f64> = residuals
            .iter()
            .map(|r| {
                let u = (r / scale).abs();
                if u <= HUBER_K { 1.0 } else { HUBER_K / u }
            })
            .collect();

        let (new_slope, new_intercept) = weighted_ols(x, y, &weights);
        if new_slope.is_nan() {
            break;
        }

        let shift = (new_slope - slope).abs() + (new_intercept - intercept).abs();
        slope = new_slope;
        intercept = new_intercept;
        if shift < HUBER_TOL {
            break;
        }
    }

    (slope, intercept)
}

fn weighted_ols(x: &[f64], y: &[f64], w: &[f64]) -> (f64, f64) {
    let w_sum: f64 = w.iter().sum();
    if w_sum <= 0.0 {
        return (f64::NAN, f64::NAN);
    }

    let mx = x.iter().zip(w).map(|(&xi, &wi)| wi * xi).sum::<f64>() / w_sum;
    let my = y.iter().zip(w).map(|(&yi, &wi)| wi * yi).sum::<f64>() / w_sum;

    let mut sxy = 0.0;
    let mut sxx = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - mx;
        sxy += w[i] * dx * (y[i] - my);
        sxx += w[i] * dx * dx;
    }

    if sxx == 0.0 {
        return (f64::NAN, f64::NAN);
    }
    let slope = sxy / sxx;
    (slope, my - slope * mx)
}

fn huber_fit_with_ci(x: &[f64], y: &[f64], confidence: f64, seed: u64) -> (f64, f64, f64, f64) {
    let (slope, intercept) = huber_irls(x, y);
    if slope.is_nan() {
        return (f64::NAN, f64::NAN, f64::NAN, f64::NAN);
    }

    let n = x.len();
    let mut rng = StdRng::seed_from_u64(seed);
    let mut boot_slopes = Vec::with_capacity(HUBER_CI_BOOTSTRAP);
    let mut x_boot = vec![0.0; n];
    let mut y_boot = vec![0.0; n];
    for _ in 0..HUBER_CI_BOOTSTRAP {
        for i in 0..n {
            let idx = rng.random_range(0..n);
            x_boot[i] = x[idx];
            y_boot[i] = y[idx];
        }
        let (boot_slope, _) = huber_irls(&x_boot, &y_boot);
        if !boot_slope.is_nan() {
            boot_slopes.push(boot_slope);
        }
    }

    let alpha = 1.0 - confidence;
    let ci_low = percentile(&boot_slopes, 100.0 * alpha / 2.0);
    let ci_high = percentile(&boot_slopes, 100.0 * (1.0 - alpha / 2.0));

    (slope, intercept, ci_low, ci_high)
}
