use crate::constants::{DVM_FLOOR_CLEARANCE_M, DVM_SURFACE_CLEARANCE_M, SECONDS_PER_HOUR};
use crate::math_utils::clamp;
use crate::particle::ParticleStage;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;

/// Diel vertical migration operator.
///
/// Larvae swim downward at a constant speed before solar noon and upward
/// after it. The vertical position is clamped to stay at least 0.5 m below
/// the surface and 0.5 m above the local floor. Disabled when the config's
/// migration speed is zero. Eggs are benthic and do not migrate.
pub struct DielMigrationOp;

impl DielMigrationOp {
    pub fn new() -> DielMigrationOp {
        DielMigrationOp
    }

    pub fn handle() -> SimOpHandle {
        SimOpHandle::new(Box::new(DielMigrationOp::new()))
    }
}

impl SimOp for DielMigrationOp {
    fn name(&self) -> &str {
        "diel_migration"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let speed = sim.config.dvm_speed_m_per_s;
        if speed <= 0.0 {
            return;
        }

        let direction = if sim.hour_of_day() < 12.0 { -1.0 } else { 1.0 };
        let dz = direction * speed * sim.timestep_hours * SECONDS_PER_HOUR;
        let now_h = sim.hours_since_start();

        let Simulation {
            environment,
            particles,
            ..
        } = sim;

        for particle in particles.iter_mut() {
            if !matches!(particle.stage, ParticleStage::Larva) {
                continue;
            }

            let sample = environment.sample(particle.lon, particle.lat, particle.z_m, now_h);

            // Constrain between the surface and floor clearances
            particle.z_m = clamp(
                particle.z_m + dz,
                -(sample.sea_floor_depth_m - DVM_FLOOR_CLEARANCE_M),
                -DVM_SURFACE_CLEARANCE_M,
            );
        }
    }
}
