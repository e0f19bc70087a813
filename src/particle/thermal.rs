//! Per-particle thermal exposure bookkeeping.
//!
//! Every particle owns one `ThermalExposure`, updated once per timestep from
//! the temperature sampled at its position. Counters fall into four families
//! that are tracked independently:
//!
//! - lethal: hours at or above the lethal threshold, with the current and
//!   maximum consecutive run
//! - sublethal: hours at or above the sublethal threshold (total and per
//!   stage), run lengths, and the degree-hour excess above the threshold
//! - optimal band: per-stage hours inside/below/above the band and the
//!   clamped degree-hour deficit/excess against the band edges
//! - cold: larval hours at or below the development threshold, with runs
//!
//! Cumulative counters only grow; the `*_run` counters reset to zero the
//! moment their condition stops holding.

use crate::config::ClamDriftConfig;
use crate::particle::ParticleStage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThermalExposure {
    // Lethal exposure
    pub hot_hours: f64,
    pub hot_run: f64,
    pub hot_run_max: f64,

    // Sublethal exposure, tracked separately from lethal
    pub sublethal_hours_total: f64,
    pub sublethal_hours_egg: f64,
    pub sublethal_hours_larva: f64,
    pub sublethal_run: f64,
    pub sublethal_run_max: f64,
    pub sublethal_deg_h_total: f64,

    // Cold exposure (larval stage)
    pub cold_hours: f64,
    pub cold_run: f64,
    pub cold_run_max: f64,

    // Optimal band occupancy per stage
    pub opt_hours_egg: f64,
    pub opt_hours_larva: f64,
    pub opt_below_hours_egg: f64,
    pub opt_above_hours_egg: f64,
    pub opt_below_hours_larva: f64,
    pub opt_above_hours_larva: f64,

    // Degree-hour deviation integrals against the optimal band
    pub cold_deg_h_egg: f64,
    pub hot_deg_h_egg: f64,
    pub cold_deg_h_larva: f64,
    pub hot_deg_h_larva: f64,

    // Stage durations and raw temperature integrals (∫T dt)
    pub egg_hours: f64,
    pub larva_hours: f64,
    pub temp_time_sum_egg: f64,
    pub temp_time_sum_larva: f64,

    // Near-bottom occupancy during the larval stage
    pub near_bottom_hours_larva: f64,
}

impl ThermalExposure {
    pub fn new() -> ThermalExposure {
        ThermalExposure::default()
    }

    /// Update every exposure counter for one timestep and report whether a
    /// heat-kill trigger fired.
    ///
    /// # Arguments
    /// * `stage` - Current development stage (`Egg` or `Larva`; terminal
    ///   stages are never accumulated)
    /// * `temp_c` - Temperature sampled at the particle position (°C)
    /// * `dt_h` - Elapsed time this step (hours)
    /// * `near_bottom` - Whether the particle is within the settlement
    ///   buffer of the local floor (only counted for larvae)
    ///
    /// # Returns
    /// `true` when either heat-kill trigger in the config is enabled and
    /// exceeded after this step's accumulation.
    pub fn accumulate(
        &mut self,
        stage: ParticleStage,
        temp_c: f64,
        dt_h: f64,
        near_bottom: bool,
        config: &ClamDriftConfig,
    ) -> bool {
        self.accumulate_ambient(temp_c, dt_h, config);
        self.accumulate_stage(stage, temp_c, dt_h, near_bottom, config);
        self.heat_kill_triggered(config)
    }

    /// Stage-independent exposure: lethal and sublethal families. Called
    /// exactly once per particle per timestep, even when a hatch hands the
    /// same step to both stages.
    pub fn accumulate_ambient(&mut self, temp_c: f64, dt_h: f64, config: &ClamDriftConfig) {
        let is_hot = temp_c >= config.lethal_temp_c;
        if is_hot {
            self.hot_hours += dt_h;
            self.hot_run += dt_h;
        } else {
            self.hot_run = 0.0;
        }
        self.hot_run_max = self.hot_run_max.max(self.hot_run);

        // Sublethal exposure, with its own run and degree-hour integral
        let is_sublethal = temp_c >= config.sublethal_temp_c;
        if is_sublethal {
            self.sublethal_hours_total += dt_h;
            self.sublethal_run += dt_h;
        } else {
            self.sublethal_run = 0.0;
        }
        self.sublethal_run_max = self.sublethal_run_max.max(self.sublethal_run);
        self.sublethal_deg_h_total += (temp_c - config.sublethal_temp_c).max(0.0) * dt_h;
    }

    /// Stage-specific exposure: optimal band occupancy, deviation
    /// integrals, stage clocks, larval cold runs and near-bottom hours.
    pub fn accumulate_stage(
        &mut self,
        stage: ParticleStage,
        temp_c: f64,
        dt_h: f64,
        near_bottom: bool,
        config: &ClamDriftConfig,
    ) {
        let is_sublethal = temp_c >= config.sublethal_temp_c;
        match stage {
            ParticleStage::Egg => {
                self.egg_hours += dt_h;
                self.temp_time_sum_egg += temp_c * dt_h;

                let band = &config.egg;
                if temp_c < band.opt_low_c {
                    self.opt_below_hours_egg += dt_h;
                } else if temp_c > band.opt_high_c {
                    self.opt_above_hours_egg += dt_h;
                } else {
                    self.opt_hours_egg += dt_h;
                }
                self.cold_deg_h_egg += (band.opt_low_c - temp_c).max(0.0) * dt_h;
                self.hot_deg_h_egg += (temp_c - band.opt_high_c).max(0.0) * dt_h;

                if is_sublethal {
                    self.sublethal_hours_egg += dt_h;
                }
            }
            ParticleStage::Larva => {
                self.larva_hours += dt_h;
                self.temp_time_sum_larva += temp_c * dt_h;

                let band = &config.larva;
                if temp_c < band.opt_low_c {
                    self.opt_below_hours_larva += dt_h;
                } else if temp_c > band.opt_high_c {
                    self.opt_above_hours_larva += dt_h;
                } else {
                    self.opt_hours_larva += dt_h;
                }
                self.cold_deg_h_larva += (band.opt_low_c - temp_c).max(0.0) * dt_h;
                self.hot_deg_h_larva += (temp_c - band.opt_high_c).max(0.0) * dt_h;

                if is_sublethal {
                    self.sublethal_hours_larva += dt_h;
                }

                // Cold runs drive the stagnation check; the threshold is
                // the larval development threshold, not the optimal band
                let is_cold = temp_c <= config.larva.t0_c;
                if is_cold {
                    self.cold_hours += dt_h;
                    self.cold_run += dt_h;
                } else {
                    self.cold_run = 0.0;
                }
                self.cold_run_max = self.cold_run_max.max(self.cold_run);

                if near_bottom {
                    self.near_bottom_hours_larva += dt_h;
                }
            }
            ParticleStage::Settled | ParticleStage::Dead(_) => {}
        }
    }

    /// Whether either heat-kill trigger is enabled and currently exceeded.
    /// Both triggers are independent and optional; a missing trigger never
    /// fires.
    pub fn heat_kill_triggered(&self, config: &ClamDriftConfig) -> bool {
        if let Some(limit) = config.hotkill_hours {
            if limit > 0.0 && self.hot_hours >= limit {
                return true;
            }
        }
        if let Some(limit) = config.hotkill_consecutive_hours {
            if limit > 0.0 && self.hot_run >= limit {
                return true;
            }
        }
        false
    }

    /// Mean temperature over the egg stage, NaN before any egg hours accrue.
    pub fn mean_temp_egg(&self) -> f64 {
        if self.egg_hours > 0.0 {
            self.temp_time_sum_egg / self.egg_hours
        } else {
            f64::NAN
        }
    }

    /// Mean temperature over the larval stage, NaN before any larval hours accrue.
    pub fn mean_temp_larva(&self) -> f64 {
        if self.larva_hours > 0.0 {
            self.temp_time_sum_larva / self.larva_hours
        } else {
            f64::NAN
        }
    }
}
