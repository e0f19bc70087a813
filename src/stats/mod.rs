pub mod correlation;
pub mod describe;
pub mod inference;
pub mod regression;
pub mod resampling;
