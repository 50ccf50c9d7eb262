//! Fit configuration.
//!
//! A `FitConfig` fully describes one fitting run: operating condition,
//! measurements (or how to synthesize them), search bounds, grid resolution,
//! objective weights, and the moment calibration. Every section has defaults
//! matching the reference data set, so an empty TOML file is a valid config.
//!
//! ```toml
//! [tire]
//! vertical_load = 1500.0
//! longitudinal_slip = 0.1
//!
//! [bounds]
//! c2 = [1.0, 5000.0]
//!
//! [grid]
//! steps = 7
//! parallel = true
//! ```

pub mod loader;

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub use loader::{ConfigError, load_from_file, load_from_str};

use crate::data::reference::{
    ALIGNING_MOMENT, LATERAL_FORCE, LONGITUDINAL_SLIP, SLIP_ANGLES_DEG, VERTICAL_LOAD,
};
use crate::data::synthetic::SyntheticConfig;
use crate::domain::{AngleUnit, PARAM_COUNT, ParamBounds};
use crate::error::FitError;
use crate::fit::grid::{DEFAULT_STEPS, GridSpec, ParameterGrid};
use crate::fit::objective::ChannelWeights;
use crate::fit::search::{DEFAULT_CHUNK_SIZE, SearchOptions};
use crate::models::{MomentCalibration, TireForceModel};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct FitConfig {
    pub tire: TireConfig,
    pub data: DataConfig,
    pub bounds: ParamBounds,
    pub grid: GridConfig,
    pub objective: ChannelWeights,
    pub calibration: MomentCalibration,
}

/// Operating condition shared by every sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TireConfig {
    /// Vertical load `Fz` [N].
    pub vertical_load: f64,
    pub longitudinal_slip: f64,
}

impl Default for TireConfig {
    fn default() -> Self {
        Self {
            vertical_load: VERTICAL_LOAD,
            longitudinal_slip: LONGITUDINAL_SLIP,
        }
    }
}

/// Measurements, parallel sequences indexed by slip angle.
///
/// When `synthetic` is set, `lateral_force` / `aligning_moment` are ignored and
/// generated from the synthetic parameters at `slip_angles` instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DataConfig {
    pub angle_unit: AngleUnit,
    pub slip_angles: Vec<f64>,
    pub lateral_force: Vec<f64>,
    pub aligning_moment: Vec<f64>,
    pub synthetic: Option<SyntheticConfig>,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            angle_unit: AngleUnit::Degrees,
            slip_angles: SLIP_ANGLES_DEG.to_vec(),
            lateral_force: LATERAL_FORCE.to_vec(),
            aligning_moment: ALIGNING_MOMENT.to_vec(),
            synthetic: None,
        }
    }
}

impl DataConfig {
    /// Slip angles converted to radians.
    pub fn slip_angles_rad(&self) -> Vec<f64> {
        self.slip_angles
            .iter()
            .map(|&a| self.angle_unit.to_radians(a))
            .collect()
    }
}

/// Grid resolution and search execution settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridConfig {
    /// Points per axis.
    pub steps: usize,
    /// Per-axis override in `(E, Cy, Cx, Cz, c1, c2)` order.
    pub axis_steps: Option<[usize; PARAM_COUNT]>,
    pub parallel: bool,
    /// Abort after this many milliseconds and keep the best point so far.
    pub max_duration_ms: Option<u64>,
    pub chunk_size: usize,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            steps: DEFAULT_STEPS,
            axis_steps: None,
            parallel: true,
            max_duration_ms: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl GridConfig {
    pub fn spec(&self) -> GridSpec {
        match self.axis_steps {
            Some(steps) => GridSpec { steps },
            None => GridSpec::uniform(self.steps),
        }
    }

    pub fn search_options(&self) -> SearchOptions {
        SearchOptions {
            parallel: self.parallel,
            max_duration: self.max_duration_ms.map(Duration::from_millis),
            chunk_size: self.chunk_size,
        }
    }
}

impl FitConfig {
    pub fn model(&self) -> TireForceModel {
        TireForceModel::new(self.calibration)
    }

    /// Check everything that can be checked before a search starts.
    pub fn validate(&self) -> Result<(), FitError> {
        if !(self.tire.vertical_load.is_finite() && self.tire.vertical_load > 0.0) {
            return Err(FitError::config(format!(
                "tire.vertical_load must be finite and > 0, got {}",
                self.tire.vertical_load
            )));
        }
        if !self.tire.longitudinal_slip.is_finite() {
            return Err(FitError::config(format!(
                "tire.longitudinal_slip must be finite, got {}",
                self.tire.longitudinal_slip
            )));
        }

        let n = self.data.slip_angles.len();
        if n == 0 {
            return Err(FitError::config("data.slip_angles is empty"));
        }
        match &self.data.synthetic {
            Some(synthetic) => synthetic.validate()?,
            None => {
                if self.data.lateral_force.len() != n || self.data.aligning_moment.len() != n {
                    return Err(FitError::config(format!(
                        "data sequences differ in length: slip_angles={n}, lateral_force={}, aligning_moment={}",
                        self.data.lateral_force.len(),
                        self.data.aligning_moment.len()
                    )));
                }
            }
        }

        self.bounds.validate()?;
        ParameterGrid::new(&self.bounds, &self.grid.spec())?;
        if self.grid.chunk_size == 0 {
            return Err(FitError::config("grid.chunk_size must be >= 1"));
        }
        self.objective.validate()?;
        self.calibration.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        FitConfig::default().validate().unwrap();
    }

    #[test]
    fn inverted_bound_is_rejected_with_axis_name() {
        let mut cfg = FitConfig::default();
        cfg.bounds.cy = [3.0, 1.0];
        let err = cfg.validate().unwrap_err();
        assert!(matches!(err, FitError::Configuration(_)));
        assert!(err.to_string().contains("Cy"));
    }

    #[test]
    fn zero_resolution_is_rejected() {
        let mut cfg = FitConfig::default();
        cfg.grid.steps = 0;
        assert!(matches!(cfg.validate(), Err(FitError::Configuration(_))));
    }

    #[test]
    fn mismatched_data_is_rejected() {
        let mut cfg = FitConfig::default();
        cfg.data.aligning_moment.pop();
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("aligning_moment=18"));
    }

    #[test]
    fn synthetic_data_ignores_measurement_lengths() {
        let mut cfg = FitConfig::default();
        cfg.data.lateral_force.clear();
        cfg.data.aligning_moment.clear();
        cfg.data.synthetic = Some(SyntheticConfig::default());
        cfg.validate().unwrap();
    }

    #[test]
    fn axis_steps_override_uniform_steps() {
        let grid = GridConfig {
            axis_steps: Some([2, 3, 1, 3, 4, 5]),
            ..GridConfig::default()
        };
        assert_eq!(grid.spec().steps, [2, 3, 1, 3, 4, 5]);
        assert_eq!(GridConfig::default().spec(), GridSpec::uniform(5));
    }
}
