use crate::particle::BiologyInputs;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;

/// Biological update operator.
///
/// Runs the development stage machine and thermal accumulator for every
/// active particle, once per timestep, after transport has committed the
/// step's positions. Lifecycle events land in the simulation's event log
/// tagged with the particle id.
pub struct BiologyOp;

impl BiologyOp {
    pub fn new() -> BiologyOp {
        BiologyOp
    }

    pub fn handle() -> SimOpHandle {
        SimOpHandle::new(Box::new(BiologyOp::new()))
    }
}

impl SimOp for BiologyOp {
    fn name(&self) -> &str {
        "biology"
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        let dt_hours = sim.timestep_hours;
        let now_h = sim.hours_since_start();
        let config = sim.config.clone();

        let Simulation {
            environment,
            particles,
            event_log,
            ..
        } = sim;

        for particle in particles.iter_mut() {
            if !particle.is_active() {
                continue;
            }

            let sample = environment.sample(particle.lon, particle.lat, particle.z_m, now_h);
            let inputs = BiologyInputs {
                temperature_c: sample.temperature_c,
                sea_floor_depth_m: sample.sea_floor_depth_m,
                dt_hours,
                hours_since_start: now_h,
            };

            for event in particle.update_biology(&config, &inputs) {
                event_log.push((particle.id, event));
            }
        }
    }
}
