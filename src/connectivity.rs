//! Zone-to-zone connectivity matrices and network metrics.
//!
//! A connectivity matrix counts, per origin zone, where that zone's
//! particles ended up: another tracked zone, `OUTSIDE` every tracked zone,
//! or `UNSETTLED` (never settled at all). Row normalization turns counts
//! into transport probabilities, and the network metrics read exchange
//! strength, leakage, and self-recruitment off the normalized rows.

use crate::particle::ParticleSummary;
use crate::stats::describe::{mean, percentile, sample_std};
use crate::zones::{Zone, DEST_OUTSIDE, DEST_UNSETTLED};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

/// Settlement counts (or probabilities, once normalized) between zones.
///
/// Rows are origin zones plus `OUTSIDE`; columns are the same zones plus
/// `OUTSIDE` and `UNSETTLED`. Stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectivityMatrix {
    pub origins: Vec<String>,
    pub destinations: Vec<String>,
    values: Vec<f64>,
}

impl ConnectivityMatrix {
    /// An all-zero matrix over the given zone table.
    pub fn new(zones: &[Zone]) -> ConnectivityMatrix {
        let mut origins: Vec<String> = zones.iter().map(|z| z.name.clone()).collect();
        origins.push(DEST_OUTSIDE.to_string());

        let mut destinations = origins.clone();
        destinations.push(DEST_UNSETTLED.to_string());

        let values = vec![0.0; origins.len() * destinations.len()];
        ConnectivityMatrix {
            origins,
            destinations,
            values,
        }
    }

    /// Build the matrix from terminal particle summaries: settled particles
    /// count toward their settlement zone, everything else toward
    /// `UNSETTLED`.
    pub fn from_summaries(summaries: &[ParticleSummary], zones: &[Zone]) -> ConnectivityMatrix {
        let mut matrix = ConnectivityMatrix::new(zones);
        for summary in summaries {
            if summary.settled {
                matrix.add_settlement(&summary.release_zone, &summary.settle_zone);
            } else {
                matrix.add_unsettled(&summary.release_zone);
            }
        }
        matrix
    }

    fn origin_index(&self, origin: &str) -> Option<usize> {
        self.origins.iter().position(|name| name == origin)
    }

    fn destination_index(&self, destination: &str) -> Option<usize> {
        self.destinations.iter().position(|name| name == destination)
    }

    /// Value for one (origin, destination) pair; None for unknown names.
    pub fn get(&self, origin: &str, destination: &str) -> Option<f64> {
        let row = self.origin_index(origin)?;
        let col = self.destination_index(destination)?;
        Some(self.values[row * self.destinations.len() + col])
    }

    /// Record one settled particle. Origins or destinations outside the
    /// tracked table are ignored, matching the analysis convention.
    pub fn add_settlement(&mut self, origin: &str, destination: &str) {
        if let (Some(row), Some(col)) = (self.origin_index(origin), self.destination_index(destination)) {
            self.values[row * self.destinations.len() + col] += 1.0;
        }
    }

    /// Record one particle that never settled.
    pub fn add_unsettled(&mut self, origin: &str) {
        self.add_settlement(origin, DEST_UNSETTLED);
    }

    pub fn row_sum(&self, origin: &str) -> f64 {
        match self.origin_index(origin) {
            Some(row) => {
                let w = self.destinations.len();
                self.values[row * w..(row + 1) * w].iter().sum()
            }
            None => 0.0,
        }
    }

    /// Total particles recorded in the matrix.
    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Row-normalized copy: each row becomes the probability of a particle
    /// from that origin reaching each destination. All-zero rows stay
    /// zero.
    pub fn normalized(&self) -> ConnectivityMatrix {
        let mut normalized = self.clone();
        let w = self.destinations.len();
        for row in 0..self.origins.len() {
            let row_total: f64 = self.values[row * w..(row + 1) * w].iter().sum();
            if row_total > 0.0 {
                for value in &mut normalized.values[row * w..(row + 1) * w] {
                    *value /= row_total;
                }
            }
        }
        normalized
    }

    /// Element-wise mean of a set of same-shape matrices.
    ///
    /// Err when the set is empty or the shapes disagree.
    pub fn average(matrices: &[&ConnectivityMatrix]) -> Result<ConnectivityMatrix, String> {
        let first = matrices
            .first()
            .ok_or_else(|| "No connectivity matrices given".to_string())?;
        for other in &matrices[1..] {
            if other.origins != first.origins || other.destinations != first.destinations {
                return Err("Connectivity matrices have mismatched zone tables".to_string());
            }
        }

        let mut avg = (*first).clone();
        for value in &mut avg.values {
            *value = 0.0;
        }
        for matrix in matrices {
            for (slot, value) in avg.values.iter_mut().zip(&matrix.values) {
                *slot += value;
            }
        }
        for value in &mut avg.values {
            *value /= matrices.len() as f64;
        }
        Ok(avg)
    }

    /// The tracked zone names: every origin except `OUTSIDE`.
    pub fn zone_names(&self) -> Vec<&str> {
        self.origins
            .iter()
            .map(|name| name.as_str())
            .filter(|&name| name != DEST_OUTSIDE)
            .collect()
    }
}

/// Per-zone network metrics read off a row-normalized matrix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkMetrics {
    /// Fraction of a zone's particles settling in other tracked zones
    pub source_strength: BTreeMap<String, f64>,
    /// Incoming fraction from other tracked zones
    pub sink_strength: BTreeMap<String, f64>,
    /// Fraction leaving the tracked network entirely
    pub leakage: BTreeMap<String, f64>,
    /// Diagonal: fraction settling back into the origin zone
    pub self_recruitment: BTreeMap<String, f64>,
}

/// Compute network metrics for every tracked zone.
///
/// Expects a row-normalized matrix. `include_unsettled_in_leakage`
/// decides whether particles that never settled count as leaked alongside
/// those settling outside the network.
pub fn network_metrics(
    matrix: &ConnectivityMatrix,
    include_unsettled_in_leakage: bool,
) -> NetworkMetrics {
    let zones = matrix.zone_names();
    let mut metrics = NetworkMetrics::default();

    for &origin in &zones {
        let outgoing: f64 = zones
            .iter()
            .filter(|&&other| other != origin)
            .filter_map(|&other| matrix.get(origin, other))
            .sum();
        metrics
            .source_strength
            .insert(origin.to_string(), outgoing);

        let mut leaked = matrix.get(origin, DEST_OUTSIDE).unwrap_or(0.0);
        if include_unsettled_in_leakage {
            leaked += matrix.get(origin, DEST_UNSETTLED).unwrap_or(0.0);
        }
        metrics.leakage.insert(origin.to_string(), leaked);

        metrics.self_recruitment.insert(
            origin.to_string(),
            matrix.get(origin, origin).unwrap_or(0.0),
        );
    }

    for &dest in &zones {
        let incoming: f64 = zones
            .iter()
            .filter(|&&other| other != dest)
            .filter_map(|&other| matrix.get(other, dest))
            .sum();
        metrics.sink_strength.insert(dest.to_string(), incoming);
    }

    metrics
}

/// A bootstrapped metric: point estimate with spread and percentile CI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricCi {
    pub mean: f64,
    pub std: f64,
    pub ci_low: f64,
    pub ci_high: f64,
}

/// Bootstrapped network metrics per zone.
#[derive(Debug, Clone, Default)]
pub struct BootstrapNetworkMetrics {
    pub source_strength: BTreeMap<String, MetricCi>,
    pub sink_strength: BTreeMap<String, MetricCi>,
    pub leakage: BTreeMap<String, MetricCi>,
    pub self_recruitment: BTreeMap<String, MetricCi>,
}

/// Bootstrap network metrics across a set of yearly matrices.
///
/// Each iteration resamples whole matrices with replacement, averages
/// them element-wise, and recomputes the metrics; the per-zone spread of
/// those resampled metrics gives the 95% percentile CI. Matrices should
/// already be row-normalized. Deterministic for a fixed seed; an empty
/// matrix set is an error.
pub fn bootstrap_network_metrics(
    matrices: &[ConnectivityMatrix],
    n_bootstrap: usize,
    include_unsettled_in_leakage: bool,
    seed: u64,
) -> Result<BootstrapNetworkMetrics, String> {
    if matrices.is_empty() {
        return Err("No valid connectivity matrices found".to_string());
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let n = matrices.len();

    let mut resampled_metrics = Vec::with_capacity(n_bootstrap);
    let mut draw: Vec<&ConnectivityMatrix> = Vec::with_capacity(n);
    for _ in 0..n_bootstrap {
        draw.clear();
        for _ in 0..n {
            draw.push(&matrices[rng.random_range(0..n)]);
        }
        let avg = ConnectivityMatrix::average(&draw)?;
        resampled_metrics.push(network_metrics(&avg, include_unsettled_in_leakage));
    }

    let zones: Vec<String> = matrices[0]
        .zone_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();

    let mut result = BootstrapNetworkMetrics::default();
    for zone in &zones {
        result.source_strength.insert(
            zone.clone(),
            summarize(&resampled_metrics, |m| m.source_strength.get(zone)),
        );
        result.sink_strength.insert(
            zone.clone(),
            summarize(&resampled_metrics, |m| m.sink_strength.get(zone)),
        );
        result.leakage.insert(
            zone.clone(),
            summarize(&resampled_metrics, |m| m.leakage.get(zone)),
        );
        result.self_recruitment.insert(
            zone.clone(),
            summarize(&resampled_metrics, |m| m.self_recruitment.get(zone)),
        );
    }

    Ok(result)
}

fn summarize<'a, F>(resampled: &'a [NetworkMetrics], pick: F) -> MetricCi
where
    F: Fn(&'a NetworkMetrics) -> Option<&'a f64>,
{
    let values: Vec<f64> = resampled.iter().map(|m| *pick(m).unwrap_or(&0.0)).collect();
    MetricCi {
        mean: mean(&values),
        std: sample_std(&values),
        ci_low: percentile(&values, 2.5),
        ci_high: percentile(&values, 97.5),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::zones::DEFAULT_ZONES;
    use approx::assert_abs_diff_eq;
    use more_asserts::{assert_ge, assert_le};

    /// 10 particles from MNR-7: 4 stay, 3 reach MNR-8-N, 2 settle outside,
    /// 1 never settles.
    fn sample_matrix() -> ConnectivityMatrix {
        let mut matrix = ConnectivityMatrix::new(&DEFAULT_ZONES);
        for _ in 0..4 {
            matrix.add_settlement("MNR-7", "MNR-7");
        }
        for _ in 0..3 {
            matrix.add_settlement("MNR-7", "MNR-8-N");
        }
        for _ in 0..2 {
            matrix.add_settlement("MNR-7", DEST_OUTSIDE);
        }
        matrix.add_unsettled("MNR-7");
        matrix
    }

    #[test]
    fn test_counts_and_row_sum() {
        let matrix = sample_matrix();
        assert_abs_diff_eq!(matrix.get("MNR-7", "MNR-7").unwrap(), 4.0);
        assert_abs_diff_eq!(matrix.get("MNR-7", "MNR-8-N").unwrap(), 3.0);
        assert_abs_diff_eq!(matrix.get("MNR-7", DEST_UNSETTLED).unwrap(), 1.0);
        assert_abs_diff_eq!(matrix.row_sum("MNR-7"), 10.0);
        assert_abs_diff_eq!(matrix.total(), 10.0);

        // Unknown zones are ignored, not counted
        let mut other = sample_matrix();
        other.add_settlement("ATLANTIS", "MNR-7");
        assert_abs_diff_eq!(other.total(), 10.0);
    }

    #[test]
    fn test_normalized_rows_sum_to_one() {
        let normalized = sample_matrix().normalized();

        assert_abs_diff_eq!(normalized.row_sum("MNR-7"), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(normalized.get("MNR-7", "MNR-7").unwrap(), 0.4);
        assert_abs_diff_eq!(normalized.get("MNR-7", "MNR-8-N").unwrap(), 0.3);

        // Rows with no particles stay zero instead of dividing by zero
        assert_abs_diff_eq!(normalized.row_sum("SMPA-2"), 0.0);
    }

    #[test]
    fn test_network_metrics() {
        let normalized = sample_matrix().normalized();
        let metrics = network_metrics(&normalized, false);

        assert_abs_diff_eq!(metrics.self_recruitment["MNR-7"], 0.4);
        // Outgoing to other tracked zones only
        assert_abs_diff_eq!(metrics.source_strength["MNR-7"], 0.3);
        // OUTSIDE settlements leak; UNSETTLED excluded here
        assert_abs_diff_eq!(metrics.leakage["MNR-7"], 0.2);
        // MNR-8-N receives from MNR-7
        assert_abs_diff_eq!(metrics.sink_strength["MNR-8-N"], 0.3);
        assert_abs_diff_eq!(metrics.sink_strength["MNR-7"], 0.0);

        let with_unsettled = network_metrics(&normalized, true);
        assert_abs_diff_eq!(with_unsettled.leakage["MNR-7"], 0.3);
    }

    #[test]
    fn test_metric_bounds_on_normalized_matrix() {
        let metrics = network_metrics(&sample_matrix().normalized(), true);
        for map in [
            &metrics.source_strength,
            &metrics.sink_strength,
            &metrics.leakage,
            &metrics.self_recruitment,
        ] {
            for &value in map.values() {
                assert_ge!(value, 0.0);
                assert_le!(value, 1.0 + 1e-12);
            }
        }
    }

    #[test]
    fn test_average_requires_matching_tables() {
        let a = sample_matrix();
        let b = sample_matrix();
        let avg = ConnectivityMatrix::average(&[&a, &b]).unwrap();
        assert_abs_diff_eq!(avg.get("MNR-7", "MNR-7").unwrap(), 4.0);

        let smaller = ConnectivityMatrix::new(&DEFAULT_ZONES[..2]);
        assert!(ConnectivityMatrix::average(&[&a, &smaller]).is_err());
        assert!(ConnectivityMatrix::average(&[]).is_err());
    }

    #[test]
    fn test_bootstrap_metrics_deterministic_and_bracketing() {
        // Three "years" with different retention at MNR-7
        let years: Vec<ConnectivityMatrix> = [(6.0, 4.0), (5.0, 5.0), (8.0, 2.0)]
            .iter()
            .map(|&(stay, leave)| {
                let mut m = ConnectivityMatrix::new(&DEFAULT_ZONES);
                for _ in 0..stay as usize {
                    m.add_settlement("MNR-7", "MNR-7");
                }
                for _ in 0..leave as usize {
                    m.add_settlement("MNR-7", DEST_OUTSIDE);
                }
                m.normalized()
            })
            .collect();

        let a = bootstrap_network_metrics(&years, 500, false, 42).unwrap();
        let b = bootstrap_network_metrics(&years, 500, false, 42).unwrap();
        assert_eq!(a.self_recruitment["MNR-7"], b.self_recruitment["MNR-7"]);

        let sr = a.self_recruitment["MNR-7"];
        // Yearly self-recruitment runs 0.5-0.8, so the bootstrap mean and
        // CI live inside that envelope
        assert_ge!(sr.mean, 0.5);
        assert_le!(sr.mean, 0.8);
        assert_le!(sr.ci_low, sr.mean);
        assert_ge!(sr.ci_high, sr.mean);
        assert_ge!(sr.std, 0.0);
    }

    #[test]
    fn test_bootstrap_empty_set_is_error() {
        assert!(bootstrap_network_metrics(&[], 100, false, 42).is_err());
    }
}
