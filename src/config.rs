//! Biological configuration for the drift model.
//!
//! Every threshold that can disable a feature is an `Option`: `None` means
//! the feature is off, never an error. Values deserialize from JSON so a
//! simulation run can be parameterized without recompiling, mirroring how
//! scenario files drive the rest of the toolchain.

use crate::constants::{
    DEFAULT_COLD_STAGNANT_DAYS, DEFAULT_SETTLE_BOTTOM_BUFFER_M, K_EGG_DEGREE_HOURS,
    K_LARVA_DEGREE_HOURS, T0_EGG_C, T0_LARVA_C, TOPT_HIGH_EGG_C, TOPT_HIGH_LARVA_C,
    TOPT_LOW_EGG_C, TOPT_LOW_LARVA_C, T_LETHAL_C, T_SUBLETHAL_C,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Temperature parameters for one development stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageProfile {
    /// Development threshold (°C); degree-hours accumulate above it
    pub t0_c: f64,
    /// Degree-hours required to complete the stage
    pub k_degree_hours: f64,
    /// Lower bound of the optimal band (°C)
    pub opt_low_c: f64,
    /// Upper bound of the optimal band (°C)
    pub opt_high_c: f64,
}

impl StageProfile {
    pub fn egg_default() -> StageProfile {
        StageProfile {
            t0_c: T0_EGG_C,
            k_degree_hours: K_EGG_DEGREE_HOURS,
            opt_low_c: TOPT_LOW_EGG_C,
            opt_high_c: TOPT_HIGH_EGG_C,
        }
    }

    pub fn larva_default() -> StageProfile {
        StageProfile {
            t0_c: T0_LARVA_C,
            k_degree_hours: K_LARVA_DEGREE_HOURS,
            opt_low_c: TOPT_LOW_LARVA_C,
            opt_high_c: TOPT_HIGH_LARVA_C,
        }
    }
}

/// Full configuration surface of the biological model.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClamDriftConfig {
    pub egg: StageProfile,
    pub larva: StageProfile,

    /// Sublethal threshold (°C): development success drops above it
    pub sublethal_temp_c: f64,
    /// Lethal threshold (°C): exposure above it can kill
    pub lethal_temp_c: f64,

    /// Kill after this many cumulative hours at or above lethal (None = disabled)
    pub hotkill_hours: Option<f64>,
    /// Kill after this many consecutive hours at or above lethal (None = disabled)
    pub hotkill_consecutive_hours: Option<f64>,
    /// Kill undeveloped larvae after this many days of consecutive cold (None = disabled)
    pub cold_stagnant_days: Option<f64>,

    /// Deactivate larvae as settled when development completes
    pub stop_when_larva_complete: bool,
    /// Require the particle to be near the floor before settlement fires
    pub settle_require_bottom: bool,
    /// Vertical buffer above the floor that counts as "near bottom" (m)
    pub settle_bottom_buffer_m: f64,

    /// Diel vertical migration speed (m/s); 0 disables migration
    pub dvm_speed_m_per_s: f64,
}

impl Default for ClamDriftConfig {
    fn default() -> ClamDriftConfig {
        ClamDriftConfig {
            egg: StageProfile::egg_default(),
            larva: StageProfile::larva_default(),
            sublethal_temp_c: T_SUBLETHAL_C,
            lethal_temp_c: T_LETHAL_C,
            hotkill_hours: None,
            hotkill_consecutive_hours: None,
            cold_stagnant_days: Some(DEFAULT_COLD_STAGNANT_DAYS),
            stop_when_larva_complete: true,
            settle_require_bottom: false,
            settle_bottom_buffer_m: DEFAULT_SETTLE_BOTTOM_BUFFER_M,
            dvm_speed_m_per_s: 0.0,
        }
    }
}

impl ClamDriftConfig {
    /// Load a configuration from a JSON file.
    ///
    /// Unset keys fall back to their defaults, so a scenario file only
    /// needs to name the parameters it overrides.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<ClamDriftConfig, String> {
        let path_ref = path.as_ref();
        let json_str = fs::read_to_string(path_ref)
            .map_err(|e| format!("Failed to read config {}: {}", path_ref.display(), e))?;
        Self::from_json_str(&json_str)
    }

    /// Parse a configuration from a JSON string.
    pub fn from_json_str(json_str: &str) -> Result<ClamDriftConfig, String> {
        serde_json::from_str(json_str).map_err(|e| format!("Failed to parse config JSON: {}", e))
    }

    /// The cold-stagnation run limit in hours, if the feature is enabled.
    pub fn cold_stagnant_limit_h(&self) -> Option<f64> {
        match self.cold_stagnant_days {
            Some(days) if days > 0.0 => Some(days * 24.0),
            _ => None,
        }
    }

    pub fn stage_profile(&self, stage_is_egg: bool) -> &StageProfile {
        if stage_is_egg { &self.egg } else { &self.larva }
    }
}
