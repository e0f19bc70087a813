use crate::particle::ParticleSummary;
use crate::sim::sim_op::{SimOp, SimOpHandle};
use crate::sim::Simulation;
use std::fs::OpenOptions;
use std::io::Write;

/// Per-Particle Summary Writer Operator
///
/// Writes one terminal summary row per particle after the simulation ends.
/// This is the file the analysis layer consumes: one row per particle,
/// keyed by particle id, with release/settle coordinates and zones,
/// event times, dispersal distances, stage durations, mean stage
/// temperatures, and the full set of exposure counters. Events that never
/// occurred serialize as NaN.
pub struct SummaryWriterOp {
    /// Path to the CSV file to write
    pub file_path: String,
}

impl SummaryWriterOp {
    pub fn new(file_path: String) -> Self {
        Self { file_path }
    }

    pub fn handle(file_path: String) -> SimOpHandle {
        SimOpHandle::new(Box::new(Self::new(file_path)))
    }

    pub fn csv_header() -> &'static str {
        "id,release_day,release_lon,release_lat,release_zone,stage,settled,reason,\
         hatch_time_h,hatch_lon,hatch_lat,hatch_distance_km,competent_time_h,\
         settle_time_h,settle_lon,settle_lat,settle_zone,settle_distance_km,\
         final_distance_km,egg_hours,larva_hours,pld_h,temp_mean_egg,temp_mean_larva,\
         opt_hours_egg,opt_hours_larva,cold_deg_h_egg,hot_deg_h_egg,cold_deg_h_larva,\
         hot_deg_h_larva,hot_hours,hot_run_max,sublethal_hours_total,sublethal_run_max,\
         sublethal_deg_h_total,cold_hours,cold_run_max,near_bottom_hours_larva"
    }

    pub fn csv_row(summary: &ParticleSummary) -> String {
        format!(
            "{},{},{:.5},{:.5},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}",
            summary.id,
            summary.release_day,
            summary.release_lon,
            summary.release_lat,
            summary.release_zone,
            summary.stage,
            summary.settled,
            summary.reason,
            summary.hatch_time_h,
            summary.hatch_lon,
            summary.hatch_lat,
            summary.hatch_distance_km,
            summary.competent_time_h,
            summary.settle_time_h,
            summary.settle_lon,
            summary.settle_lat,
            summary.settle_zone,
            summary.settle_distance_km,
            summary.final_distance_km,
            summary.egg_hours,
            summary.larva_hours,
            summary.pld_h,
            summary.temp_mean_egg,
            summary.temp_mean_larva,
            summary.opt_hours_egg,
            summary.opt_hours_larva,
            summary.cold_deg_h_egg,
            summary.hot_deg_h_egg,
            summary.cold_deg_h_larva,
            summary.hot_deg_h_larva,
            summary.hot_hours,
            summary.hot_run_max,
            summary.sublethal_hours_total,
            summary.sublethal_run_max,
            summary.sublethal_deg_h_total,
            summary.cold_hours,
            summary.cold_run_max,
            summary.near_bottom_hours_larva
        )
    }

    fn write_summaries(&self, sim: &Simulation) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.file_path)?;

        writeln!(file, "{}", Self::csv_header())?;
        for summary in sim.summaries() {
            writeln!(file, "{}", Self::csv_row(&summary))?;
        }

        Ok(())
    }
}

impl SimOp for SummaryWriterOp {
    fn name(&self) -> &str {
        "summary_writer"
    }

    fn after_sim(&mut self, sim: &mut Simulation) {
        if let Err(e) = self.write_summaries(sim) {
            eprintln!(
                "Warning: Failed to write particle summaries to {}: {}",
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
    fn test_summary_writer_one_row_per_particle() {
        let test_file = "test_summary_output.csv";
        let _ = fs::remove_file(test_file);

        let mut sim = Simulation::new(SimProps {
            name: "summary_writer_test",
            config: ClamDriftConfig::default(),
            environment: Box::new(UniformEnvironment {
                temperature_c: 28.0,
                sea_floor_depth_m: 20.0,
            }),
            zones: DEFAULT_ZONES.clone(),
            releases: (0..4)
                .map(|id| ParticleRelease {
                    id,
                    lon: 118.15,
                    lat: 38.95,
                    z_m: -2.0,
                    release_day: 20220601,
                })
                .collect(),
            ops: vec![
                BiologyOp::handle(),
                SummaryWriterOp::handle(test_file.to_string()),
            ],
            sim_steps: 150,
            timestep_hours: 1.0,
            start_hour_of_day: 0.0,
            debug: false,
        });

        sim.simulate();

        assert!(Path::new(test_file).exists());
        let content = fs::read_to_string(test_file).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 5, "header + 4 particle rows");
        assert!(lines[0].starts_with("id,release_day,release_lon"));
        // All four settled at 28°C, in the release zone
        for line in &lines[1..] {
            assert!(line.contains("settled"));
            assert!(line.contains("MNR-7"));
        }

        let _ = fs::remove_file(test_file);
    }

    #[test]
    fn test_header_and_row_column_counts_match() {
        let header_cols = SummaryWriterOp::csv_header().split(',').count();

        let particle = crate::particle::Particle::new(ParticleRelease {
            id: 1,
            lon: 119.0,
            lat: 39.0,
            z_m: -2.0,
            release_day: 20220601,
        });
        let row = SummaryWriterOp::csv_row(&particle.summary(&DEFAULT_ZONES));
        assert_eq!(row.split(',').count(), header_cols);
    }
}
