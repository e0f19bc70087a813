//! Particle state for the individual-based drift model.
//!
//! Each particle is one simulated egg/larva. The transport engine owns the
//! particle's position; this module owns everything biological: the
//! development stage machine, the thermal exposure counters, and the
//! lifecycle event record. Stage order is strictly
//! egg → larva → settled or dead; terminal particles are never mutated
//! again.

pub mod develop;
pub mod thermal;

use crate::config::ClamDriftConfig;
use crate::geo_utils::haversine_km;
use crate::particle::develop::{
    degree_hours_above, development_complete, is_near_bottom, larval_fate, progress_fraction,
    LarvalFate,
};
use crate::particle::thermal::ThermalExposure;
use crate::zones::{settlement_zone, Zone, DEST_UNSETTLED};
use serde::{Deserialize, Serialize};

/// Why a particle was deactivated before settling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathReason {
    /// A heat-kill trigger fired (cumulative or consecutive lethal hours)
    HotKill,
    /// Development stalled through the cold stagnation limit
    LarvalColdStagnant,
}

impl DeathReason {
    /// Reason tag as it appears in output files.
    pub fn as_str(&self) -> &'static str {
        match self {
            DeathReason::HotKill => "hotkill",
            DeathReason::LarvalColdStagnant => "larval_cold_stagnant",
        }
    }
}

/// Development stage of a particle. `Settled` and `Dead` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParticleStage {
    Egg,
    Larva,
    Settled,
    Dead(DeathReason),
}

impl ParticleStage {
    /// Whether the particle still takes part in per-timestep updates.
    pub fn is_active(&self) -> bool {
        matches!(self, ParticleStage::Egg | ParticleStage::Larva)
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// Stage label as it appears in output files.
    pub fn label(&self) -> &'static str {
        match self {
            ParticleStage::Egg => "egg",
            ParticleStage::Larva => "larva",
            ParticleStage::Settled => "settled",
            ParticleStage::Dead(_) => "dead",
        }
    }
}

/// A lifecycle event emitted by the biological update for the surrounding
/// framework to persist.
#[derive(Debug, Clone, PartialEq)]
pub enum LifecycleEvent {
    Hatched {
        time_h: f64,
        lon: f64,
        lat: f64,
        distance_km: f64,
    },
    BecameCompetent {
        time_h: f64,
    },
    Settled {
        time_h: f64,
        lon: f64,
        lat: f64,
        distance_km: f64,
    },
    Died {
        time_h: f64,
        reason: DeathReason,
    },
}

/// Immutable release record for one particle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleRelease {
    pub id: u32,
    pub lon: f64,
    pub lat: f64,
    /// Depth coordinate, negative below the surface (m)
    pub z_m: f64,
    /// Release day tag (YYYYMMDD), carried through to output files
    pub release_day: i32,
}

/// Environment sample handed to the biological update for one timestep.
#[derive(Debug, Clone, Copy)]
pub struct BiologyInputs {
    pub temperature_c: f64,
    /// Local sea-floor depth, positive down (m)
    pub sea_floor_depth_m: f64,
    /// Elapsed time this step (hours)
    pub dt_hours: f64,
    /// Model time at the end of this step (hours since simulation start)
    pub hours_since_start: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Particle {
    pub id: u32,
    pub release_day: i32,
    pub release_lon: f64,
    pub release_lat: f64,

    // Position, advanced by the external transport engine
    pub lon: f64,
    pub lat: f64,
    pub z_m: f64,

    pub stage: ParticleStage,
    /// Hours since hatching (larval age)
    pub age_h: f64,
    /// Degree-hours accumulated in the current stage
    pub acc_deg_h: f64,
    /// Development progress in [0, 1], reset at hatching
    pub progress: f64,
    pub competent: bool,
    pub competent_time_h: f64,

    pub hatch_time_h: f64,
    pub hatch_lon: f64,
    pub hatch_lat: f64,
    pub hatch_distance_km: f64,

    pub settle_time_h: f64,
    pub settle_lon: f64,
    pub settle_lat: f64,
    pub settle_distance_km: f64,

    /// Great-circle distance from release, refreshed every active step
    pub final_distance_km: f64,

    pub exposure: ThermalExposure,
}

impl Particle {
    pub fn new(release: ParticleRelease) -> Particle {
        Particle {
            id: release.id,
            release_day: release.release_day,
            release_lon: release.lon,
            release_lat: release.lat,
            lon: release.lon,
            lat: release.lat,
            z_m: release.z_m,
            stage: ParticleStage::Egg,
            age_h: 0.0,
            acc_deg_h: 0.0,
            progress: 0.0,
            competent: false,
            competent_time_h: f64::NAN,
            hatch_time_h: f64::NAN,
            hatch_lon: f64::NAN,
            hatch_lat: f64::NAN,
            hatch_distance_km: f64::NAN,
            settle_time_h: f64::NAN,
            settle_lon: f64::NAN,
            settle_lat: f64::NAN,
            settle_distance_km: f64::NAN,
            final_distance_km: 0.0,
            exposure: ThermalExposure::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.stage.is_active()
    }

    pub fn settled(&self) -> bool {
        matches!(self.stage, ParticleStage::Settled)
    }

    /// Great-circle distance from the release point to the current
    /// position, in km.
    pub fn distance_from_release_km(&self) -> f64 {
        haversine_km(self.release_lon, self.release_lat, self.lon, self.lat)
    }

    /// Deactivation reason tag, once terminal.
    pub fn deactivation_reason(&self) -> Option<&'static str> {
        match self.stage {
            ParticleStage::Settled => Some("larval_complete"),
            ParticleStage::Dead(reason) => Some(reason.as_str()),
            _ => None,
        }
    }

    /// Advance the biological state by one timestep.
    ///
    /// Checks run in a fixed order: egg development, larval development
    /// (competency, then settlement), cold stagnation, heat kill. A hatch
    /// hands the remainder of the step to the larval phase, so a particle
    /// can hatch and begin accumulating larval degree-hours in the same
    /// step. A particle may record competency and settlement in one step
    /// but is deactivated exactly once; heat kill resolves last and never
    /// overrides a settlement from the same step.
    ///
    /// Returns the lifecycle events that fired, for the framework to
    /// persist. Terminal particles return no events and are not mutated.
    pub fn update_biology(
        &mut self,
        config: &ClamDriftConfig,
        inputs: &BiologyInputs,
    ) -> Vec<LifecycleEvent> {
        if !self.is_active() {
            return Vec::new();
        }

        let temp = inputs.temperature_c;
        let dt_h = inputs.dt_hours;
        let now_h = inputs.hours_since_start;
        let near_bottom = is_near_bottom(
            self.z_m,
            inputs.sea_floor_depth_m,
            config.settle_bottom_buffer_m,
        );

        let mut events = Vec::new();

        // Lethal/sublethal exposure counts once per step regardless of stage
        self.exposure.accumulate_ambient(temp, dt_h, config);

        if matches!(self.stage, ParticleStage::Egg) {
            self.exposure
                .accumulate_stage(ParticleStage::Egg, temp, dt_h, near_bottom, config);

            self.acc_deg_h += degree_hours_above(temp, config.egg.t0_c, dt_h);
            self.progress = progress_fraction(self.acc_deg_h, config.egg.k_degree_hours);

            if development_complete(self.progress) {
                let distance_km = self.distance_from_release_km();
                self.stage = ParticleStage::Larva;
                self.hatch_time_h = now_h;
                self.hatch_lon = self.lon;
                self.hatch_lat = self.lat;
                self.hatch_distance_km = distance_km;
                events.push(LifecycleEvent::Hatched {
                    time_h: now_h,
                    lon: self.lon,
                    lat: self.lat,
                    distance_km,
                });

                // Larval development starts from zero
                self.acc_deg_h = 0.0;
                self.progress = 0.0;
            }
        }

        if matches!(self.stage, ParticleStage::Larva) {
            self.age_h += dt_h;
            self.exposure
                .accumulate_stage(ParticleStage::Larva, temp, dt_h, near_bottom, config);

            self.acc_deg_h += degree_hours_above(temp, config.larva.t0_c, dt_h);
            self.progress = progress_fraction(self.acc_deg_h, config.larva.k_degree_hours);

            // Competency is a one-way flag, independent of settlement
            if !self.competent && development_complete(self.progress) {
                self.competent = true;
                self.competent_time_h = now_h;
                events.push(LifecycleEvent::BecameCompetent { time_h: now_h });
            }

            match larval_fate(self.progress, self.exposure.cold_run, near_bottom, config) {
                LarvalFate::Settle => {
                    let distance_km = self.distance_from_release_km();
                    self.stage = ParticleStage::Settled;
                    self.settle_time_h = now_h;
                    self.settle_lon = self.lon;
                    self.settle_lat = self.lat;
                    self.settle_distance_km = distance_km;
                    events.push(LifecycleEvent::Settled {
                        time_h: now_h,
                        lon: self.lon,
                        lat: self.lat,
                        distance_km,
                    });
                }
                LarvalFate::ColdStagnant => {
                    self.stage = ParticleStage::Dead(DeathReason::LarvalColdStagnant);
                    events.push(LifecycleEvent::Died {
                        time_h: now_h,
                        reason: DeathReason::LarvalColdStagnant,
                    });
                }
                LarvalFate::Drifting => {}
            }
        }

        // Heat kill resolves last; a particle deactivated above is exempt
        if self.stage.is_active() && self.exposure.heat_kill_triggered(config) {
            self.stage = ParticleStage::Dead(DeathReason::HotKill);
            events.push(LifecycleEvent::Died {
                time_h: now_h,
                reason: DeathReason::HotKill,
            });
        }

        self.final_distance_km = self.distance_from_release_km();

        events
    }

    /// Terminal per-particle summary row with zone assignments.
    pub fn summary(&self, zones: &[Zone]) -> ParticleSummary {
        let release_zone = settlement_zone(zones, self.release_lon, self.release_lat);
        let settle_zone = if self.settled() {
            settlement_zone(zones, self.settle_lon, self.settle_lat)
        } else {
            DEST_UNSETTLED.to_string()
        };

        ParticleSummary {
            id: self.id,
            release_day: self.release_day,
            release_lon: self.release_lon,
            release_lat: self.release_lat,
            release_zone,
            stage: self.stage.label().to_string(),
            settled: self.settled(),
            reason: self
                .deactivation_reason()
                .unwrap_or("active")
                .to_string(),
            hatch_time_h: self.hatch_time_h,
            hatch_lon: self.hatch_lon,
            hatch_lat: self.hatch_lat,
            hatch_distance_km: self.hatch_distance_km,
            competent_time_h: self.competent_time_h,
            settle_time_h: self.settle_time_h,
            settle_lon: self.settle_lon,
            settle_lat: self.settle_lat,
            settle_zone,
            settle_distance_km: self.settle_distance_km,
            final_distance_km: self.final_distance_km,
            egg_hours: self.exposure.egg_hours,
            larva_hours: self.exposure.larva_hours,
            pld_h: self.exposure.egg_hours + self.exposure.larva_hours,
            temp_mean_egg: self.exposure.mean_temp_egg(),
            temp_mean_larva: self.exposure.mean_temp_larva(),
            opt_hours_egg: self.exposure.opt_hours_egg,
            opt_hours_larva: self.exposure.opt_hours_larva,
            cold_deg_h_egg: self.exposure.cold_deg_h_egg,
            hot_deg_h_egg: self.exposure.hot_deg_h_egg,
            cold_deg_h_larva: self.exposure.cold_deg_h_larva,
            hot_deg_h_larva: self.exposure.hot_deg_h_larva,
            hot_hours: self.exposure.hot_hours,
            hot_run_max: self.exposure.hot_run_max,
            sublethal_hours_total: self.exposure.sublethal_hours_total,
            sublethal_run_max: self.exposure.sublethal_run_max,
            sublethal_deg_h_total: self.exposure.sublethal_deg_h_total,
            cold_hours: self.exposure.cold_hours,
            cold_run_max: self.exposure.cold_run_max,
            near_bottom_hours_larva: self.exposure.near_bottom_hours_larva,
        }
    }
}

/// One terminal summary row per particle, serialized into the
/// per-particle CSV consumed by the analysis layer. NaN fields mean the
/// event never occurred.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParticleSummary {
    pub id: u32,
    pub release_day: i32,
    pub release_lon: f64,
    pub release_lat: f64,
    pub release_zone: String,
    pub stage: String,
    pub settled: bool,
    pub reason: String,
    pub hatch_time_h: f64,
    pub hatch_lon: f64,
    pub hatch_lat: f64,
    pub hatch_distance_km: f64,
    pub competent_time_h: f64,
    pub settle_time_h: f64,
    pub settle_lon: f64,
    pub settle_lat: f64,
    pub settle_zone: String,
    pub settle_distance_km: f64,
    pub final_distance_km: f64,
    pub egg_hours: f64,
    pub larva_hours: f64,
    pub pld_h: f64,
    pub temp_mean_egg: f64,
    pub temp_mean_larva: f64,
    pub opt_hours_egg: f64,
    pub opt_hours_larva: f64,
    pub cold_deg_h_egg: f64,
    pub hot_deg_h_egg: f64,
    pub cold_deg_h_larva: f64,
    pub hot_deg_h_larva: f64,
    pub hot_hours: f64,
    pub hot_run_max: f64,
    pub sublethal_hours_total: f64,
    pub sublethal_run_max: f64,
    pub sublethal_deg_h_total: f64,
    pub cold_hours: f64,
    pub cold_run_max: f64,
    pub near_bottom_hours_larva: f64,
}
