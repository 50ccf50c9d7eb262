//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during fitting
//! - read from TOML configuration
//! - handed to the report / plot layers unchanged

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::error::FitError;

/// Number of fitted model parameters.
pub const PARAM_COUNT: usize = 6;

/// Parameter names in vector order.
pub const PARAM_NAMES: [&str; PARAM_COUNT] = ["E", "Cy", "Cx", "Cz", "c1", "c2"];

/// Unit of the slip angles supplied as input data.
///
/// The model itself always works in radians; conversion happens once, when the
/// fit context is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum AngleUnit {
    Degrees,
    Radians,
}

impl AngleUnit {
    pub fn to_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value.to_radians(),
            AngleUnit::Radians => value,
        }
    }

    pub fn from_radians(self, value: f64) -> f64 {
        match self {
            AngleUnit::Degrees => value.to_degrees(),
            AngleUnit::Radians => value,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            AngleUnit::Degrees => "deg",
            AngleUnit::Radians => "rad",
        }
    }
}

/// Magic Formula parameter vector `(E, Cy, Cx, Cz, c1, c2)`.
///
/// - `e`: curvature factor shared by all channels
/// - `cy`, `cx`, `cz`: shape factors for lateral force, longitudinal force, aligning moment
/// - `c1`, `c2`: load-sensitivity coefficients of the stiffness factor
///
/// Config keys accept both the field names and the `PARAM_NAMES` spellings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParameterVector {
    #[serde(alias = "E")]
    pub e: f64,
    #[serde(alias = "Cy")]
    pub cy: f64,
    #[serde(alias = "Cx")]
    pub cx: f64,
    #[serde(alias = "Cz")]
    pub cz: f64,
    pub c1: f64,
    pub c2: f64,
}

impl ParameterVector {
    pub fn from_array(values: [f64; PARAM_COUNT]) -> Self {
        let [e, cy, cx, cz, c1, c2] = values;
        Self { e, cy, cx, cz, c1, c2 }
    }

    pub fn to_array(&self) -> [f64; PARAM_COUNT] {
        [self.e, self.cy, self.cx, self.cz, self.c1, self.c2]
    }

    /// `(name, value)` pairs in vector order, for reports.
    pub fn named(&self) -> [(&'static str, f64); PARAM_COUNT] {
        let values = self.to_array();
        std::array::from_fn(|i| (PARAM_NAMES[i], values[i]))
    }
}

/// Closed `[low, high]` search bounds, one pair per parameter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParamBounds {
    #[serde(alias = "E")]
    pub e: [f64; 2],
    #[serde(alias = "Cy")]
    pub cy: [f64; 2],
    #[serde(alias = "Cx")]
    pub cx: [f64; 2],
    #[serde(alias = "Cz")]
    pub cz: [f64; 2],
    pub c1: [f64; 2],
    pub c2: [f64; 2],
}

impl Default for ParamBounds {
    fn default() -> Self {
        Self {
            e: [-2.0, 1.2],
            cy: [1.0, 3.0],
            cx: [1.0, 3.0],
            cz: [1.0, 3.0],
            c1: [1000.0, 10000.0],
            c2: [1.0, 5000.0],
        }
    }
}

impl ParamBounds {
    /// Bounds as `(low, high)` pairs in parameter-vector order.
    pub fn axes(&self) -> [(f64, f64); PARAM_COUNT] {
        [self.e, self.cy, self.cx, self.cz, self.c1, self.c2].map(|[lo, hi]| (lo, hi))
    }

    /// Reject non-finite bounds and `low > high`, naming the offending axis.
    pub fn validate(&self) -> Result<(), FitError> {
        for (name, (low, high)) in PARAM_NAMES.iter().zip(self.axes()) {
            if !(low.is_finite() && high.is_finite()) {
                return Err(FitError::config(format!(
                    "bound for {name} must be finite, got [{low}, {high}]"
                )));
            }
            if low > high {
                return Err(FitError::config(format!(
                    "bound for {name} has low > high: [{low}, {high}]"
                )));
            }
        }
        Ok(())
    }

    /// The centre of the box, a naive starting guess.
    pub fn midpoint(&self) -> ParameterVector {
        ParameterVector::from_array(self.axes().map(|(lo, hi)| 0.5 * (lo + hi)))
    }

    pub fn contains(&self, params: &ParameterVector) -> bool {
        self.axes()
            .iter()
            .zip(params.to_array())
            .all(|(&(lo, hi), v)| v >= lo && v <= hi)
    }
}

/// A single measured point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExperimentalSample {
    /// Slip angle in radians.
    pub slip_angle: f64,
    pub lateral_force: f64,
    pub aligning_moment: f64,
}

/// Operating condition the model is evaluated at.
#[derive(Debug, Clone, PartialEq)]
pub struct TireState {
    /// Vertical load `Fz` [N].
    pub vertical_load: f64,
    /// Slip angles in radians.
    pub slip_angles: Vec<f64>,
    /// Longitudinal slip ratio (dimensionless).
    pub longitudinal_slip: f64,
}

impl TireState {
    pub fn new(vertical_load: f64, slip_angles: Vec<f64>, longitudinal_slip: f64) -> Self {
        Self {
            vertical_load,
            slip_angles,
            longitudinal_slip,
        }
    }

    pub fn single(vertical_load: f64, slip_angle: f64, longitudinal_slip: f64) -> Self {
        Self::new(vertical_load, vec![slip_angle], longitudinal_slip)
    }
}

/// Model channels, one value per slip angle.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ModelOutput {
    pub lateral_force: Vec<f64>,
    /// Calibrated aligning moment (see `MomentCalibration`).
    pub aligning_moment: Vec<f64>,
    /// Longitudinal force; constant across samples since the slip ratio is scalar.
    pub longitudinal_force: Vec<f64>,
}

impl ModelOutput {
    pub fn len(&self) -> usize {
        self.lateral_force.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lateral_force.is_empty()
    }
}

/// Best grid point of a search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitResult {
    pub best_params: ParameterVector,
    pub best_error: f64,
}

/// Bookkeeping of a grid search run.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SearchStats {
    /// Total number of grid points.
    pub grid_size: usize,
    /// Points the objective was called on.
    pub evaluated: usize,
    /// Points skipped because the model is undefined there.
    pub excluded: usize,
    /// The deadline expired before the whole grid was visited.
    pub timed_out: bool,
    pub elapsed: Duration,
}

impl SearchStats {
    pub fn valid(&self) -> usize {
        self.evaluated.saturating_sub(self.excluded)
    }
}

/// Immutable experimental data + operating condition for one fitting run.
///
/// Built once and shared by reference with the objective; nothing mutates it
/// during a search.
#[derive(Debug, Clone, PartialEq)]
pub struct FitContext {
    samples: Vec<ExperimentalSample>,
    state: TireState,
}

impl FitContext {
    /// Build a context from parallel sequences. `slip_angles` are radians.
    pub fn new(
        slip_angles: &[f64],
        lateral_force: &[f64],
        aligning_moment: &[f64],
        vertical_load: f64,
        longitudinal_slip: f64,
    ) -> Result<Self, FitError> {
        let n = slip_angles.len();
        if n == 0 {
            return Err(FitError::config("no experimental samples"));
        }
        if lateral_force.len() != n || aligning_moment.len() != n {
            return Err(FitError::config(format!(
                "sequence lengths differ: slip_angles={n}, lateral_force={}, aligning_moment={}",
                lateral_force.len(),
                aligning_moment.len()
            )));
        }
        if !(vertical_load.is_finite() && vertical_load > 0.0) {
            return Err(FitError::config(format!(
                "vertical_load must be finite and > 0, got {vertical_load}"
            )));
        }
        if !longitudinal_slip.is_finite() {
            return Err(FitError::config(format!(
                "longitudinal_slip must be finite, got {longitudinal_slip}"
            )));
        }

        let mut samples = Vec::with_capacity(n);
        for i in 0..n {
            let sample = ExperimentalSample {
                slip_angle: slip_angles[i],
                lateral_force: lateral_force[i],
                aligning_moment: aligning_moment[i],
            };
            if !(sample.slip_angle.is_finite()
                && sample.lateral_force.is_finite()
                && sample.aligning_moment.is_finite())
            {
                return Err(FitError::config(format!("sample {i} contains a non-finite value")));
            }
            samples.push(sample);
        }

        let state = TireState::new(vertical_load, slip_angles.to_vec(), longitudinal_slip);
        Ok(Self { samples, state })
    }

    pub fn samples(&self) -> &[ExperimentalSample] {
        &self.samples
    }

    pub fn state(&self) -> &TireState {
        &self.state
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// `(min, max)` slip angle in radians.
    pub fn slip_range(&self) -> (f64, f64) {
        self.samples
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| {
                (lo.min(s.slip_angle), hi.max(s.slip_angle))
            })
    }
}
