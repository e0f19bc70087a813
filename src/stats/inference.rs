//! Multiple-comparison correction and effect sizes.
//!
//! The exposure-response analyses test every (exposure, response) variable
//! pair in a batch, so their p-values must be adjusted jointly: FDR
//! correction sees the whole batch in one call, never one p-value at a
//! time.

use crate::stats::correlation::spearman;
use crate::stats::describe::{drop_nan_pairs, mean, sample_std};
use crate::stats::regression::{robust_regression, RegressionMethod, RobustFit};
use crate::stats::resampling::{permutation_test, PermutationStatistic};

/// Multiple-comparison correction method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FdrMethod {
    BenjaminiHochberg,
    Bonferroni,
}

impl FdrMethod {
    /// Parse a method name from a configuration surface. Unknown names are
    /// a fatal configuration error.
    pub fn from_name(name: &str) -> Result<FdrMethod, String> {
        match name {
            "benjamini-hochberg" => Ok(FdrMethod::BenjaminiHochberg),
            "bonferroni" => Ok(FdrMethod::Bonferroni),
            other => Err(format!("Unknown method: {}", other)),
        }
    }
}

/// Adjust a batch of p-values for multiple comparisons.
///
/// Benjamini-Hochberg sorts the p-values ascending, scales rank i
/// (1-indexed) by `n / i`, enforces monotonic non-increase scanning from
/// the largest rank down, caps at 1.0, and restores the input order.
/// Bonferroni multiplies by n and caps at 1.0.
///
/// Returns the adjusted p-values in input order and a parallel rejection
/// flag (`adjusted < alpha`). Empty input yields empty outputs.
pub fn fdr_correction(p_values: &[f64], alpha: f64, method: FdrMethod) -> (Vec<f64>, Vec<bool>) {
    let n = p_values.len();
    if n == 0 {
        return (Vec::new(), Vec::new());
    }

    let adjusted = match method {
        FdrMethod::Bonferroni => p_values.iter().map(|p| (p * n as f64).min(1.0)).collect(),
        FdrMethod::BenjaminiHochberg => {
            let mut order: Vec<usize> = (0..n).collect();
            order.sort_by(|&a, &b| {
                p_values[a]
                    .partial_cmp(&p_values[b])
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let mut sorted_adj: Vec<f64> = order
                .iter()
                .enumerate()
                .map(|(rank, &idx)| p_values[idx] * n as f64 / (rank + 1) as f64)
                .collect();

            // Monotonic non-increase from the largest rank down
            for i in (0..n - 1).rev() {
                sorted_adj[i] = sorted_adj[i].min(sorted_adj[i + 1]);
            }

            let mut result = vec![0.0; n];
            for (rank, &idx) in order.iter().enumerate() {
                result[idx] = sorted_adj[rank].min(1.0);
            }
            result
        }
    };

    let reject = adjusted.iter().map(|&p| p < alpha).collect();
    (adjusted, reject)
}

/// Standardized effect-size measure between two groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EffectSizeMethod {
    /// Mean difference over the pooled standard deviation
    CohenD,
    /// Cohen's d with the small-sample correction factor
    HedgesG,
    /// Mean difference over the second group's standard deviation only
    GlassDelta,
}

impl EffectSizeMethod {
    /// Parse a method name from a configuration surface. Unknown names are
    /// a fatal configuration error.
    pub fn from_name(name: &str) -> Result<EffectSizeMethod, String> {
        match name {
            "cohen_d" => Ok(EffectSizeMethod::CohenD),
            "hedges_g" => Ok(EffectSizeMethod::HedgesG),
            "glass_delta" => Ok(EffectSizeMethod::GlassDelta),
            other => Err(format!("Unknown method: {}", other)),
        }
    }
}

/// Effect size between two groups after NaN removal.
///
/// NaN when either group comes up empty or the relevant denominator is
/// zero.
pub fn calculate_effect_size(group1: &[f64], group2: &[f64], method: EffectSizeMethod) -> f64 {
    let g1: Vec<f64> = group1.iter().copied().filter(|v| !v.is_nan()).collect();
    let g2: Vec<f64> = group2.iter().copied().filter(|v| !v.is_nan()).collect();

    if g1.is_empty() || g2.is_empty() {
        return f64::NAN;
    }

    let (mean1, mean2) = (mean(&g1), mean(&g2));
    let (std1, std2) = (sample_std(&g1), sample_std(&g2));
    let (n1, n2) = (g1.len() as f64, g2.len() as f64);

    match method {
        EffectSizeMethod::CohenD => {
            let pooled = pooled_std(std1, std2, n1, n2);
            if pooled > 0.0 { (mean1 - mean2) / pooled } else { f64::NAN }
        }
        EffectSizeMethod::HedgesG => {
            let pooled = pooled_std(std1, std2, n1, n2);
            if pooled > 0.0 {
                let correction = 1.0 - 3.0 / (4.0 * (n1 + n2) - 9.0);
                (mean1 - mean2) / pooled * correction
            } else {
                f64::NAN
            }
        }
        EffectSizeMethod::GlassDelta => {
            if std2 > 0.0 { (mean1 - mean2) / std2 } else { f64::NAN }
        }
    }
}

fn pooled_std(std1: f64, std2: f64, n1: f64, n2: f64) -> f64 {
    (((n1 - 1.0) * std1 * std1 + (n2 - 1.0) * std2 * std2) / (n1 + n2 - 2.0)).sqrt()
}

/// Star notation for a p-value, as printed in result tables.
pub fn significance_stars(p_value: f64) -> &'static str {
    if p_value < 0.001 {
        "***"
    } else if p_value < 0.01 {
        "**"
    } else if p_value < 0.05 {
        "*"
    } else {
        "ns"
    }
}

/// One tested (exposure, response) pair.
///
/// `adjusted_p` stays NaN until the whole batch goes through
/// [`adjust_correlation_batch`]; adjusting pairs one at a time would lose
/// the joint rank information FDR correction depends on.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationResult {
    pub exposure: String,
    pub response: String,
    /// Valid pairs after NaN removal
    pub n: usize,
    /// Spearman rank correlation
    pub statistic: f64,
    /// Two-tailed permutation p-value
    pub raw_p: f64,
    pub adjusted_p: f64,
    pub reject: bool,
    /// Theil-Sen slope confidence interval of response on exposure
    pub ci_slope_low: f64,
    pub ci_slope_high: f64,
}

/// Test one exposure variable against one response variable.
///
/// The statistic is the Spearman rank correlation; its significance comes
/// from a two-tailed permutation test, and the slope CI from a Theil-Sen
/// fit at the given confidence. Fewer than 3 valid pairs yields NaN
/// statistics, which the batch adjustment passes through untouched.
pub fn correlate_exposure_response(
    exposure_name: &str,
    exposure: &[f64],
    response_name: &str,
    response: &[f64],
    n_permutations: usize,
    confidence: f64,
    seed: u64,
) -> CorrelationResult {
    let (x_clean, y_clean) = drop_nan_pairs(exposure, response);
    let n = x_clean.len();

    let (statistic, raw_p, fit) = if n < 3 {
        (f64::NAN, f64::NAN, RobustFit::nan())
    } else {
        (
            spearman(&x_clean, &y_clean),
            permutation_test(
                exposure,
                response,
                PermutationStatistic::Correlation,
                n_permutations,
                seed,
            ),
            robust_regression(&x_clean, &y_clean, RegressionMethod::TheilSen, confidence, seed),
        )
    };

    CorrelationResult {
        exposure: exposure_name.to_string(),
        response: response_name.to_string(),
        n,
        statistic,
        raw_p,
        adjusted_p: f64::NAN,
        reject: false,
        ci_slope_low: fit.ci_slope_low,
        ci_slope_high: fit.ci_slope_high,
    }
}

/// Adjust a batch of correlation results for multiple comparisons in one
/// call, writing `adjusted_p` and `reject` back onto each result.
///
/// NaN raw p-values (insufficient-data pairs) keep NaN adjusted p-values
/// and are never rejected; they are excluded from the joint ranking so
/// they cannot distort the correction of the valid tests.
pub fn adjust_correlation_batch(
    results: &mut [CorrelationResult],
    alpha: f64,
    method: FdrMethod,
) {
    let valid_idx: Vec<usize> = results
        .iter()
        .enumerate()
        .filter(|(_, r)| !r.raw_p.is_nan())
        .map(|(i, _)| i)
        .collect();

    let raw: Vec<f64> = valid_idx.iter().map(|&i| results[i].raw_p).collect();
    let (adjusted, reject) = fdr_correction(&raw, alpha, method);

    for (&i, (adj, rej)) in valid_idx.iter().zip(adjusted.into_iter().zip(reject)) {
        results[i].adjusted_p = adj;
        results[i].reject = rej;
    }
}
