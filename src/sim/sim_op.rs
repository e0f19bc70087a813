mod biology_op;
mod diel_migration_op;
mod summary_writer_op;
mod trajectory_writer_op;

pub use biology_op::BiologyOp;
pub use diel_migration_op::DielMigrationOp;
pub use summary_writer_op::SummaryWriterOp;
pub use trajectory_writer_op::TrajectoryWriterOp;

use crate::sim::Simulation;

/// One operation in the per-timestep pipeline.
///
/// Transport (external), vertical behavior, biology, and output writers
/// are each one operator; the simulation runs them in the order given.
/// Within a step the environment is sampled before biological state is
/// committed, so operators see a consistent snapshot.
pub trait SimOp {
    /// The name of this operator (for identification and reporting)
    fn name(&self) -> &str;

    /// Called once before the first step
    fn init_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }

    /// Called every simulation step
    fn update_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }

    /// Called once after the last step
    fn after_sim(&mut self, _sim: &mut Simulation) {
        // Default implementation does nothing
    }
}

pub struct SimOpHandle {
    pub op: Box<dyn SimOp>,
}

impl SimOpHandle {
    pub fn new(op: Box<dyn SimOp>) -> Self {
        SimOpHandle { op }
    }
}
