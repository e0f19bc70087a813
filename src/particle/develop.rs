//! Pure development and transition rules.
//!
//! Stage progression is driven entirely by accumulated degree-hours, and
//! every fate decision is a pure function of the particle's current
//! counters. Within one timestep the checks run in a fixed order:
//! egg development, then larval development (competency and settlement),
//! then cold stagnation, then heat kill. Settlement and cold stagnation are
//! mutually exclusive because one requires completed development and the
//! other requires incomplete development.

use crate::config::ClamDriftConfig;
use crate::math_utils::clamp;

/// Degree-hour increment above a development threshold, clamped at zero.
pub fn degree_hours_above(temp_c: f64, t0_c: f64, dt_h: f64) -> f64 {
    (temp_c - t0_c).max(0.0) * dt_h
}

/// Development progress as a fraction of the stage requirement, clamped to
/// [0, 1].
pub fn progress_fraction(acc_deg_h: f64, k_degree_hours: f64) -> f64 {
    clamp(acc_deg_h / k_degree_hours, 0.0, 1.0)
}

/// Whether a stage's development is complete.
pub fn development_complete(progress: f64) -> bool {
    progress >= 1.0
}

/// Fate of a drifting larva after this step's accumulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LarvalFate {
    /// Keep drifting
    Drifting,
    /// Development complete and the settlement gate passed
    Settle,
    /// Development stalled under the cold run limit
    ColdStagnant,
}

/// Decide a larva's fate from its progress, cold run, and bottom proximity.
///
/// Settlement fires only when `stop_when_larva_complete` is set, progress
/// has reached 1.0, and (when `settle_require_bottom` is set) the particle
/// is within the bottom buffer. Cold stagnation fires only while progress
/// is still below 1.0 and the configured run limit is enabled and exceeded.
pub fn larval_fate(
    progress: f64,
    cold_run_h: f64,
    near_bottom: bool,
    config: &ClamDriftConfig,
) -> LarvalFate {
    if config.stop_when_larva_complete
        && development_complete(progress)
        && (!config.settle_require_bottom || near_bottom)
    {
        return LarvalFate::Settle;
    }

    if let Some(limit_h) = config.cold_stagnant_limit_h() {
        if !development_complete(progress) && cold_run_h >= limit_h {
            return LarvalFate::ColdStagnant;
        }
    }

    LarvalFate::Drifting
}

/// Whether a vertical position is within the settlement buffer of the
/// local floor. `z_m` is negative below the surface; `floor_depth_m` is the
/// positive sea-floor depth.
pub fn is_near_bottom(z_m: f64, floor_depth_m: f64, buffer_m: f64) -> bool {
    -z_m >= floor_depth_m - buffer_m
}
