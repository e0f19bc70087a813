// End-to-end dispersal analysis pipeline
// Simulates release cohorts across several "years" with an inline drift
// operator standing in for the transport engine, then runs the full
// analysis chain: particle summaries -> connectivity matrices -> network
// metrics -> bootstrap CIs -> exposure-response correlations with FDR.

use clam_drift_rust::assert_deviation;
use clam_drift_rust::config::ClamDriftConfig;
use clam_drift_rust::connectivity::{
    bootstrap_network_metrics, network_metrics, ConnectivityMatrix,
};
use clam_drift_rust::particle::{ParticleRelease, ParticleStage, ParticleSummary};
use clam_drift_rust::sim::environment::UniformEnvironment;
use clam_drift_rust::sim::sim_op::{BiologyOp, SimOp, SimOpHandle};
use clam_drift_rust::sim::{SimProps, Simulation};
use clam_drift_rust::stats::inference::{
    adjust_correlation_batch, calculate_effect_size, correlate_exposure_response,
    significance_stars, EffectSizeMethod, FdrMethod,
};
use clam_drift_rust::zones::{DEFAULT_ZONES, DEST_OUTSIDE};
use approx::assert_abs_diff_eq;
use more_asserts::{assert_ge, assert_le};

/// Stands in for the external transport engine: every third particle
/// stays put, every third drifts fast toward MNR-8-N, the rest drift
/// slowly into open water.
struct CohortDriftOp;

impl SimOp for CohortDriftOp {
    fn name(&self) -> &str {
        "cohort_drift"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let dt = sim.timestep_hours;
        for particle in sim.particles.iter_mut() {
            if !matches!(particle.stage, ParticleStage::Larva) {
                continue;
            }
            let (dlon, dlat) = match particle.id % 3 {
                0 => (0.0, 0.0),
                1 => (0.010, 0.0035),
                _ => (0.004, 0.0015),
            };
            particle.lon += dlon * dt;
            particle.lat += dlat * dt;
        }
    }
}

fn run_year(temperature_c: f64) -> Vec<ParticleSummary> {
    let mut sim = Simulation::new(SimProps {
        name: "yearly_cohort",
        config: ClamDriftConfig::default(),
        environment: Box::new(UniformEnvironment {
            temperature_c,
            sea_floor_depth_m: 20.0,
        }),
        zones: DEFAULT_ZONES.clone(),
        releases: (0..9)
            .map(|id| ParticleRelease {
                id,
                lon: 118.15,
                lat: 38.95,
                z_m: -2.0,
                release_day: 20220615,
            })
            .collect(),
        ops: vec![
            SimOpHandle::new(Box::new(CohortDriftOp)),
            BiologyOp::handle(),
        ],
        sim_steps: 200,
        timestep_hours: 1.0,
        start_hour_of_day: 0.0,
        debug: false,
    });

    sim.simulate();
    sim.summaries()
}

#[test]
fn test_reference_year_connectivity_counts() {
    // At 28°C larvae drift for 93 steps before completing: the fast
    // cohort covers 0.93° of longitude into MNR-8-N, the slow cohort
    // strands in open water, the stationary cohort self-recruits
    let summaries = run_year(28.0);
    assert!(summaries.iter().all(|s| s.settled));

    let matrix = ConnectivityMatrix::from_summaries(&summaries, &DEFAULT_ZONES);
    assert_abs_diff_eq!(matrix.total(), 9.0);
    assert_abs_diff_eq!(matrix.get("MNR-7", "MNR-7").unwrap(), 3.0);
    assert_abs_diff_eq!(matrix.get("MNR-7", "MNR-8-N").unwrap(), 3.0);
    assert_abs_diff_eq!(matrix.get("MNR-7", DEST_OUTSIDE).unwrap(), 3.0);

    let metrics = network_metrics(&matrix.normalized(), false);
    assert_abs_diff_eq!(metrics.self_recruitment["MNR-7"], 1.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.source_strength["MNR-7"], 1.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.leakage["MNR-7"], 1.0 / 3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(metrics.sink_strength["MNR-8-N"], 1.0 / 3.0, epsilon = 1e-12);

    // Settlement distances carried through to the summary rows: 93 drift
    // steps at (0.010, 0.0035) deg/h is 88 km along the great circle
    for summary in summaries.iter().filter(|s| s.settle_zone == "MNR-8-N") {
        assert_deviation!(summary.settle_distance_km, 88.0, 2.0);
        assert_abs_diff_eq!(summary.settle_distance_km, summary.final_distance_km);
    }
}

#[test]
fn test_multi_year_bootstrap_and_exposure_response() {
    let year_temps = [27.0, 28.0, 29.0];
    let yearly: Vec<Vec<ParticleSummary>> =
        year_temps.iter().map(|&t| run_year(t)).collect();

    // Normalized yearly matrices feed the metric bootstrap
    let matrices: Vec<ConnectivityMatrix> = yearly
        .iter()
        .map(|summaries| ConnectivityMatrix::from_summaries(summaries, &DEFAULT_ZONES).normalized())
        .collect();

    for matrix in &matrices {
        assert_abs_diff_eq!(matrix.row_sum("MNR-7"), 1.0, epsilon = 1e-12);
    }

    let boot = bootstrap_network_metrics(&matrices, 500, false, 42).unwrap();
    let again = bootstrap_network_metrics(&matrices, 500, false, 42).unwrap();
    assert_eq!(boot.self_recruitment["MNR-7"], again.self_recruitment["MNR-7"]);

    let sr = boot.self_recruitment["MNR-7"];
    assert_le!(sr.ci_low, sr.mean);
    assert_ge!(sr.ci_high, sr.mean);
    assert_ge!(sr.ci_low, 0.0);
    assert_le!(sr.ci_high, 1.0);
    // The stationary cohort self-recruits in every year, so resampling
    // years cannot move the estimate
    assert_deviation!(sr.mean, 1.0 / 3.0, 0.1, "self-recruitment is one third every year");

    // Exposure-response batch: yearly mean larval temperature against
    // yearly self-recruitment and leakage, adjusted jointly
    let exposure: Vec<f64> = yearly
        .iter()
        .map(|summaries| {
            let temps: Vec<f64> = summaries.iter().map(|s| s.temp_mean_larva).collect();
            temps.iter().sum::<f64>() / temps.len() as f64
        })
        .collect();
    assert_abs_diff_eq!(exposure[0], 27.0, epsilon = 1e-9);

    // Warmer years shorten the drift, so the fast cohort falls short of
    // MNR-8-N in the hottest year: source strength drops, leakage rises
    let source_strength: Vec<f64> = matrices
        .iter()
        .map(|m| network_metrics(m, false).source_strength["MNR-7"])
        .collect();
    let leakage: Vec<f64> = matrices
        .iter()
        .map(|m| network_metrics(m, false).leakage["MNR-7"])
        .collect();
    assert!(leakage[2] > leakage[0]);

    let mut results = vec![
        correlate_exposure_response(
            "temp_mean_larva",
            &exposure,
            "source_strength",
            &source_strength,
            1000,
            0.95,
            42,
        ),
        correlate_exposure_response(
            "temp_mean_larva",
            &exposure,
            "leakage",
            &leakage,
            1000,
            0.95,
            42,
        ),
    ];
    adjust_correlation_batch(&mut results, 0.05, FdrMethod::BenjaminiHochberg);

    for result in &results {
        assert_eq!(result.n, 3);
        assert!(!result.raw_p.is_nan());
        assert!(!result.adjusted_p.is_nan());
        assert_ge!(result.adjusted_p, result.raw_p);
        assert_le!(result.adjusted_p, 1.0);
        // Three points cannot clear any sensible threshold
        assert!(!result.reject);
        assert_eq!(significance_stars(result.adjusted_p), "ns");
    }
}

#[test]
fn test_cool_years_disperse_farther() {
    // Cooler water means slower development, a longer drift, and larger
    // settlement distances for the same cohort
    let cool = run_year(27.0);
    let warm = run_year(29.0);

    let distances = |summaries: &[ParticleSummary]| -> Vec<f64> {
        summaries.iter().map(|s| s.settle_distance_km).collect()
    };
    let cool_distances = distances(&cool);
    let warm_distances = distances(&warm);

    let d = calculate_effect_size(&cool_distances, &warm_distances, EffectSizeMethod::CohenD);
    assert!(!d.is_nan());
    assert!(d > 0.0, "cool-year cohort should settle farther out");

    let g = calculate_effect_size(&cool_distances, &warm_distances, EffectSizeMethod::HedgesG);
    assert!(g.abs() < d.abs(), "Hedges' g shrinks the small-sample estimate");

    // Longer pelagic duration in the cool year
    let mean_pld = |summaries: &[ParticleSummary]| -> f64 {
        summaries.iter().map(|s| s.pld_h).sum::<f64>() / summaries.len() as f64
    };
    assert_ge!(mean_pld(&cool), mean_pld(&warm) + 20.0);
}
