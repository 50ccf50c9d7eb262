//! Reference measurement set.
//!
//! 19 lateral-force / aligning-moment measurements at slip angles -9°..9° in
//! 1° steps, taken at a vertical load of 1500 N and a longitudinal slip ratio of
//! 0.1. The moment values are in the units matched by the default
//! `MomentCalibration`.

use crate::domain::{AngleUnit, FitContext};
use crate::error::FitError;

pub const VERTICAL_LOAD: f64 = 1500.0;
pub const LONGITUDINAL_SLIP: f64 = 0.1;

/// Slip angles in degrees.
pub const SLIP_ANGLES_DEG: [f64; 19] = [
    -9.0, -8.0, -7.0, -6.0, -5.0, -4.0, -3.0, -2.0, -1.0, 0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0,
    9.0,
];

/// Measured lateral force [N].
pub const LATERAL_FORCE: [f64; 19] = [
    -2300.0, -2200.0, -2060.0, -1880.0, -1680.0, -1450.0, -1190.0, -850.0, -430.0, 60.0, 520.0,
    890.0, 1170.0, 1390.0, 1580.0, 1730.0, 1890.0, 2000.0, 2090.0,
];

/// Measured self-aligning moment.
pub const ALIGNING_MOMENT: [f64; 19] = [
    -28.84, -28.68, -27.21, -26.41, -27.70, -24.21, -24.15, -15.88, -4.91, 14.72, 33.80, 43.79,
    46.93, 49.09, 50.90, 50.10, 50.81, 48.12, 48.83,
];

/// The reference set as a fit context (angles converted to radians).
pub fn reference_context() -> Result<FitContext, FitError> {
    let angles: Vec<f64> = SLIP_ANGLES_DEG
        .iter()
        .map(|&a| AngleUnit::Degrees.to_radians(a))
        .collect();
    FitContext::new(
        &angles,
        &LATERAL_FORCE,
        &ALIGNING_MOMENT,
        VERTICAL_LOAD,
        LONGITUDINAL_SLIP,
    )
}
