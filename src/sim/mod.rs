pub mod environment;
pub mod sim_op;
mod simulation;

pub use environment::{EnvironmentField, EnvironmentSample};
pub use simulation::{SimProps, Simulation};
