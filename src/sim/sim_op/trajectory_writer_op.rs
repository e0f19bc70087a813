use crate::particle::ParticleStage;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;
use std::fs::OpenOptions;
use std::io::Write;

/// Trajectory Writer Operator
///
/// Writes one population summary row to a CSV file at each step. The CSV
/// includes columns for:
/// - step: simulation step number
/// - hours: model time at the end of the step
/// - egg_count, larva_count, settled_count, dead_count: stage census
/// - competent_count: larvae ready to settle
/// - mean_progress: mean development progress over active particles
/// - mean_distance_km: mean distance from release over all particles
pub struct TrajectoryWriterOp {
    /// Path to the CSV file to write
    pub file_path: String,

    /// Whether the header has been written
    header_written: bool,
}

impl TrajectoryWriterOp {
    pub fn new(file_path: String) -> Self {
        Self {
            file_path,
            header_written: false,
        }
    }

    pub fn handle(file_path: String) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(file_path)))
    }

    fn write_header(&mut self) -> Result<(), std::io::Error> {
        if self.header_written {
            return Ok(());
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)?;

        writeln!(
            file,
            "step,hours,egg_count,larva_count,settled_count,dead_count,competent_count,mean_progress,mean_distance_km"
        )?;

        self.header_written = true;
        Ok(())
    }

    fn write_row(&self, sim: &Simulation) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(true)
            .open(&self.file_path)?;

        let mut eggs = 0usize;
        let mut larvae = 0usize;
        let mut competent = 0usize;
        let mut progress_sum = 0.0;
        let mut distance_sum = 0.0;

        for particle in &sim.particles {
            match particle.stage {
                ParticleStage::Egg => eggs += 1,
                ParticleStage::Larva => larvae += 1,
                _ => {}
            }
            if particle.competent {
                competent += 1;
            }
            if particle.is_active() {
                progress_sum += particle.progress;
            }
            distance_sum += particle.final_distance_km;
        }

        let active = eggs + larvae;
        let mean_progress = if active > 0 {
            progress_sum / active as f64
        } else {
            f64::NAN
        };
        let mean_distance = if sim.particles.is_empty() {
            f64::NAN
        } else {
            distance_sum / sim.particles.len() as f64
        };

        writeln!(
            file,
            "{},{:.2},{},{},{},{},{},{:.4},{:.3}",
            sim.current_step(),
            sim.hours_since_start(),
            eggs,
            larvae,
            sim.settled_count(),
            sim.dead_count(),
            competent,
            mean_progress,
            mean_distance
        )?;

        Ok(())
    }
}

impl SimOp for TrajectoryWriterOp {
    fn name(&self) -> &str {
        "trajectory_writer"
    }

    fn init_sim(&mut self, sim: &mut Simulation) {
        // Write header and initial state (step 0)
        if let Err(e) = self.write_header() {
            eprintln!(
                "Warning: Failed to write CSV header to {}: {}",
                self.file_path, e
            );
            return;
        }

        if let Err(e) = self.write_row(sim) {
            eprintln!(
                "Warning: Failed to write initial CSV data to {}: {}",
                self.file_path, e
            );
        }
    }

    fn update_sim(&mut self, sim: &mut Simulation) {
        if let Err(e) = self.write_row(sim) {
            eprintln!(
                "Warning: Failed to write CSV data to {}: {}",
                self.file_path, e
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClamDriftConfig;
    use crate::particle::ParticleRelease;
    use crate::sim::environment::UniformEnvironment;
    use crate::sim::sim_op::BiologyOp;
    use crate::sim::SimProps;
    use crate::zones::DEFAULT_ZONES;
    use std::fs;
    use std::path::Path;

    #[test]
    fn test_trajectory_writer_creates_file() {
        let test_file = "test_trajectory_output.csv";

        // Clean up any existing test file
        let _ = fs::remove_file(test_file);

        let mut sim = Simulation::new(SimProps {
            name: "trajectory_writer_test",
            config: ClamDriftConfig::default(),
            environment: Box::new(UniformEnvironment {
                temperature_c: 26.0,
                sea_floor_depth_m: 20.0,
            }),
            zones: DEFAULT_ZONES.clone(),
            releases: vec![ParticleRelease {
                id: 0,
                lon: 118.15,
                lat: 38.95,
                z_m: -2.0,
                release_day: 20220601,
            }],
            ops: vec![
                BiologyOp::handle(),
                TrajectoryWriterOp::handle(test_file.to_string()),
            ],
            sim_steps: 3,
            timestep_hours: 1.0,
            start_hour_of_day: 0.0,
            debug: false,
        });

        sim.simulate();

        assert!(Path::new(test_file).exists(), "CSV file should be created");

        let content = fs::read_to_string(test_file).expect("Should be able to read CSV file");
        let lines: Vec<&str> = content.lines().collect();

        // Header + initial state + 3 simulation steps
        assert_eq!(lines.len(), 5, "Should have header + 4 data rows");
        assert!(lines[0].starts_with("step,hours,egg_count"));
        assert!(lines[1].starts_with("0,"));
        assert!(lines[4].starts_with("3,"));

        // Clean up
        let _ = fs::remove_file(test_file);
    }
}
