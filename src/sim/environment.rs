//! Seam to the external transport engine.
//!
//! The biological core never reads ocean model output directly: each
//! timestep it asks an `EnvironmentField` for the conditions at a particle's
//! position. Production runs wire this to the hydrodynamic engine's
//! interpolators; tests and calibration runs use the analytic fields below.

/// Environment conditions at one particle position for one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnvironmentSample {
    /// Sea water temperature at the particle position (°C)
    pub temperature_c: f64,
    /// Local sea-floor depth below sea level, positive down (m)
    pub sea_floor_depth_m: f64,
}

/// Supplies per-position environment conditions.
///
/// Implementations must be pure with respect to the simulation: sampling
/// never mutates particle state.
pub trait EnvironmentField {
    fn sample(&self, lon: f64, lat: f64, z_m: f64, hours_since_start: f64) -> EnvironmentSample;
}

/// Closure-backed fields, convenient for tests and experiments.
impl<F> EnvironmentField for F
where
    F: Fn(f64, f64, f64, f64) -> EnvironmentSample,
{
    fn sample(&self, lon: f64, lat: f64, z_m: f64, hours_since_start: f64) -> EnvironmentSample {
        self(lon, lat, z_m, hours_since_start)
    }
}

/// Spatially and temporally constant conditions.
#[derive(Debug, Clone, Copy)]
pub struct UniformEnvironment {
    pub temperature_c: f64,
    pub sea_floor_depth_m: f64,
}

impl EnvironmentField for UniformEnvironment {
    fn sample(&self, _lon: f64, _lat: f64, _z_m: f64, _hours: f64) -> EnvironmentSample {
        EnvironmentSample {
            temperature_c: self.temperature_c,
            sea_floor_depth_m: self.sea_floor_depth_m,
        }
    }
}

/// Temperature warming linearly with model time, uniform in space.
/// Used to exercise threshold crossings in calibration runs.
#[derive(Debug, Clone, Copy)]
pub struct LinearWarmingEnvironment {
    pub start_temp_c: f64,
    pub warming_c_per_hour: f64,
    pub sea_floor_depth_m: f64,
}

impl EnvironmentField for LinearWarmingEnvironment {
    fn sample(&self, _lon: f64, _lat: f64, _z_m: f64, hours: f64) -> EnvironmentSample {
        EnvironmentSample {
            temperature_c: self.start_temp_c + self.warming_c_per_hour * hours,
            sea_floor_depth_m: self.sea_floor_depth_m,
        }
    }
}
