pub const EARTH_RADIUS_KM: f64 = 6371.0;
pub const HOURS_PER_DAY: f64 = 24.0;
pub const SECONDS_PER_HOUR: f64 = 3600.0;

// Development parameters for the hard clam (Kim et al., 2010; 2011)
pub const T0_EGG_C: f64 = 12.9; // Egg development threshold
pub const K_EGG_DEGREE_HOURS: f64 = 259.0; // Egg development requirement
pub const T0_LARVA_C: f64 = 19.0; // Larval development threshold
pub const K_LARVA_DEGREE_HOURS: f64 = 840.0; // Larval development requirement

// Stage-specific optimal temperature bands
pub const TOPT_LOW_EGG_C: f64 = 25.0; // Egg optimal range: 25-27°C
pub const TOPT_HIGH_EGG_C: f64 = 27.0;
pub const TOPT_LOW_LARVA_C: f64 = 27.0; // Larval optimal range: 27-29°C
pub const TOPT_HIGH_LARVA_C: f64 = 29.0;

// Temperature stress cutoffs
pub const T_SUBLETHAL_C: f64 = 30.0; // Development success drops
pub const T_LETHAL_C: f64 = 33.0; // No survival

// default mortality / settlement settings:
pub const DEFAULT_COLD_STAGNANT_DAYS: f64 = 4.0;
pub const DEFAULT_SETTLE_BOTTOM_BUFFER_M: f64 = 1.0;

// Vertical clearances kept when migrating (m from surface / floor)
pub const DVM_SURFACE_CLEARANCE_M: f64 = 0.5;
pub const DVM_FLOOR_CLEARANCE_M: f64 = 0.5;

// Statistical defaults shared by the analysis layer
pub const DEFAULT_N_BOOTSTRAP: usize = 2000;
pub const DEFAULT_N_PERMUTATIONS: usize = 5000;
pub const DEFAULT_CONFIDENCE: f64 = 0.95;
pub const DEFAULT_BLOCK_LENGTH: usize = 5;
pub const DEFAULT_SEED: u64 = 42;
