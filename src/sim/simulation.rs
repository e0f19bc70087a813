use crate::config::ClamDriftConfig;
use crate::geo_utils::hour_of_day;
use crate::particle::{LifecycleEvent, Particle, ParticleRelease, ParticleStage, ParticleSummary};
use crate::sim::environment::EnvironmentField;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::zones::Zone;

pub struct Simulation {
    pub name: String,
    pub config: ClamDriftConfig,
    pub environment: Box<dyn EnvironmentField>,
    pub zones: Vec<Zone>,
    pub particles: Vec<Particle>,
    pub ops: Vec<Box<dyn SimOp>>,
    pub step: i32,
    pub sim_steps: i32,
    pub timestep_hours: f64,
    /// Clock hour at model time zero, for the diel migration cycle
    pub start_hour_of_day: f64,
    pub debug: bool,
    /// Lifecycle events in firing order, tagged with the particle id
    pub event_log: Vec<(u32, LifecycleEvent)>,
}

pub struct SimProps {
    pub name: &'static str,
    pub config: ClamDriftConfig,
    pub environment: Box<dyn EnvironmentField>,
    pub zones: Vec<Zone>,
    pub releases: Vec<ParticleRelease>,
    pub ops: Vec<SimOpHandle>,
    pub sim_steps: i32,
    pub timestep_hours: f64,
    pub start_hour_of_day: f64,
    pub debug: bool,
}

impl Simulation {
    pub fn new(props: SimProps) -> Simulation {
        let ops = props.ops.into_iter().map(|handle| handle.op).collect();
        let particles = props.releases.into_iter().map(Particle::new).collect();

        Simulation {
            name: props.name.to_string(),
            config: props.config,
            environment: props.environment,
            zones: props.zones,
            particles,
            ops,
            step: -1,
            sim_steps: props.sim_steps,
            timestep_hours: props.timestep_hours,
            start_hour_of_day: props.start_hour_of_day,
            debug: props.debug,
            event_log: Vec::new(),
        }
    }

    /// Get the current simulation step number
    pub fn current_step(&self) -> i32 {
        self.step
    }

    /// Model time at the end of the current step, in hours
    pub fn hours_since_start(&self) -> f64 {
        self.step.max(0) as f64 * self.timestep_hours
    }

    /// Clock hour-of-day at the current model time, in [0, 24)
    pub fn hour_of_day(&self) -> f64 {
        hour_of_day(self.start_hour_of_day, self.hours_since_start())
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.is_active()).count()
    }

    pub fn settled_count(&self) -> usize {
        self.particles.iter().filter(|p| p.settled()).count()
    }

    pub fn dead_count(&self) -> usize {
        self.particles
            .iter()
            .filter(|p| matches!(p.stage, ParticleStage::Dead(_)))
            .count()
    }

    /// Run the full simulation. Can only execute once.
    ///
    /// Each step runs every operator in order, a strict barrier: transport
    /// state for the step is final before biology runs, and biology is
    /// final before writers observe it.
    pub fn simulate(&mut self) {
        if self.step > -1 {
            panic!("Simulation.simulate can only execute once");
        }
        self.step = 0;
        self.simulate_init();
        loop {
            self.step += 1;

            self.simulate_step();

            if self.step >= self.sim_steps {
                break;
            }
        }
        self.simulate_end();

        if self.debug {
            self.print_summary_report();
        }
    }

    fn simulate_init(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);

        for op in &mut ops {
            op.init_sim(self);
        }
        self.ops = ops;
    }

    fn simulate_step(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);

        for op in &mut ops {
            op.update_sim(self);
        }
        self.ops = ops;
    }

    fn simulate_end(&mut self) {
        let mut ops = std::mem::take(&mut self.ops);

        for op in &mut ops {
            op.after_sim(self);
        }
        self.ops = ops;
    }

    /// Terminal summary rows for every particle.
    pub fn summaries(&self) -> Vec<ParticleSummary> {
        self.particles
            .iter()
            .map(|p| p.summary(&self.zones))
            .collect()
    }

    pub fn print_summary_report(&self) {
        let total = self.particles.len();
        let settled = self.settled_count();
        let dead = self.dead_count();

        println!("\n=== {} : run summary ===", self.name);
        println!(
            "steps: {} x {:.2} h  ({:.1} days simulated)",
            self.sim_steps,
            self.timestep_hours,
            self.hours_since_start() / 24.0
        );
        println!("particles: {}", total);
        println!(
            "  settled: {} ({:.1}%)",
            settled,
            100.0 * settled as f64 / total.max(1) as f64
        );
        println!("  active at end: {}", self.active_count());
        println!("  dead: {}", dead);

        let mut hotkill = 0;
        let mut cold_stagnant = 0;
        for particle in &self.particles {
            match particle.deactivation_reason() {
                Some("hotkill") => hotkill += 1,
                Some("larval_cold_stagnant") => cold_stagnant += 1,
                _ => {}
            }
        }
        println!("    hotkill: {}", hotkill);
        println!("    larval_cold_stagnant: {}", cold_stagnant);
        println!("events recorded: {}", self.event_log.len());
        println!("=== end summary ===\n");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::environment::UniformEnvironment;
    use crate::sim::sim_op::BiologyOp;
    use crate::zones::DEFAULT_ZONES;

    fn releases(n: u32) -> Vec<ParticleRelease> {
        (0..n)
            .map(|id| ParticleRelease {
                id,
                lon: 118.15,
                lat: 38.95,
                z_m: -2.0,
                release_day: 20220615,
            })
            .collect()
    }

    #[test]
    fn creation() {
        let sim = Simulation::new(SimProps {
            name: "creation_test",
            config: ClamDriftConfig::default(),
            environment: Box::new(UniformEnvironment {
                temperature_c: 26.0,
                sea_floor_depth_m: 20.0,
            }),
            zones: DEFAULT_ZONES.clone(),
            releases: releases(100),
            ops: vec![],
            sim_steps: 10,
            timestep_hours: 1.0,
            start_hour_of_day: 0.0,
            debug: false,
        });

        assert_eq!(sim.particles.len(), 100);
        assert_eq!(sim.step, -1);
        assert_eq!(sim.active_count(), 100);
    }

    #[test]
    #[should_panic(expected = "can only execute once")]
    fn simulate_twice_panics() {
        let mut sim = Simulation::new(SimProps {
            name: "double_run",
            config: ClamDriftConfig::default(),
            environment: Box::new(UniformEnvironment {
                temperature_c: 26.0,
                sea_floor_depth_m: 20.0,
            }),
            zones: DEFAULT_ZONES.clone(),
            releases: releases(1),
            ops: vec![],
            sim_steps: 2,
            timestep_hours: 1.0,
            start_hour_of_day: 0.0,
            debug: false,
        });
        sim.simulate();
        sim.simulate();
    }

    #[test]
    fn full_lifecycle_at_constant_temperature() {
        // 28°C: eggs gain 15.1 degree-hours per hour (hatch within 18 h),
        // larvae gain 9.0 per hour (complete within 94 more)
        let mut sim = Simulation::new(SimProps {
            name: "uniform_run",
            config: ClamDriftConfig::default(),
            environment: Box::new(UniformEnvironment {
                temperature_c: 28.0,
                sea_floor_depth_m: 20.0,
            }),
            zones: DEFAULT_ZONES.clone(),
            releases: releases(10),
            ops: vec![BiologyOp::handle()],
            sim_steps: 150,
            timestep_hours: 1.0,
            start_hour_of_day: 0.0,
            debug: false,
        });

        sim.simulate();

        assert_eq!(sim.settled_count(), 10);
        assert_eq!(sim.active_count(), 0);
        for particle in &sim.particles {
            assert!(particle.competent);
            assert!(particle.settle_time_h > particle.hatch_time_h);
        }
        // Every particle hatched, became competent, and settled
        assert_eq!(sim.event_log.len(), 30);
    }
}
