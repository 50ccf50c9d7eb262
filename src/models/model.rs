//! Tire force model: Magic Formula evaluation for three channels.
//!
//! Given `(E, Cy, Cx, Cz, c1, c2)` and a `TireState`:
//!
//! 1. `Cs = c1 * sin(2 * atan(Fz / c2))`
//! 2. `D = 1.5 * Fz`
//! 3. `Bk = Cs / (Ck * D)` for `k ∈ {y, x, z}`
//! 4. each channel is `magic_formula(Bk, Ck, D, E, slip)`; slip is the slip angle
//!    for lateral force / aligning moment and the longitudinal slip ratio for
//!    longitudinal force
//! 5. the moment channel is reported through `MomentCalibration`
//!
//! Every division is checked. A singular point is a `FitError::Domain`, never
//! a NaN/Inf leaking into the objective.

use serde::{Deserialize, Serialize};

use crate::domain::{ModelOutput, ParameterVector, TireState};
use crate::error::FitError;
use crate::math::{magic_formula, stiffness_factor};

/// Peak factor scaling: `D = PEAK_LOAD_FACTOR * Fz`.
pub const PEAK_LOAD_FACTOR: f64 = 1.5;

/// Affine map from the raw moment channel to the units of the measured
/// moment data: `reported = offset + raw / scale`.
///
/// The defaults (`12`, `58`) belong to the reference measurement set and have
/// no physical derivation; they are kept out of the Magic Formula math so they
/// can be replaced for another data source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MomentCalibration {
    pub offset: f64,
    pub scale: f64,
}

impl Default for MomentCalibration {
    fn default() -> Self {
        Self {
            offset: 12.0,
            scale: 58.0,
        }
    }
}

impl MomentCalibration {
    pub fn new(offset: f64, scale: f64) -> Result<Self, FitError> {
        let calibration = Self { offset, scale };
        calibration.validate()?;
        Ok(calibration)
    }

    /// No-op mapping (reports the raw channel).
    pub fn identity() -> Self {
        Self {
            offset: 0.0,
            scale: 1.0,
        }
    }

    pub fn validate(&self) -> Result<(), FitError> {
        if !self.offset.is_finite() {
            return Err(FitError::config(format!(
                "moment calibration offset must be finite, got {}",
                self.offset
            )));
        }
        if !self.scale.is_finite() || self.scale == 0.0 {
            return Err(FitError::config(format!(
                "moment calibration scale must be finite and non-zero, got {}",
                self.scale
            )));
        }
        Ok(())
    }

    #[inline]
    pub fn apply(&self, raw_moment: f64) -> f64 {
        self.offset + raw_moment / self.scale
    }
}

/// Channel values at a single slip angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelPoint {
    pub lateral_force: f64,
    /// Calibrated aligning moment.
    pub aligning_moment: f64,
    pub longitudinal_force: f64,
}

/// Per-channel Magic Formula coefficients for one `(params, Fz)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coefficients {
    pub stiffness: f64,
    pub peak: f64,
    pub curvature: f64,
    pub by: f64,
    pub bx: f64,
    pub bz: f64,
    pub cy: f64,
    pub cx: f64,
    pub cz: f64,
}

impl Coefficients {
    #[inline]
    fn lateral(&self, slip_angle: f64) -> f64 {
        magic_formula(self.by, self.cy, self.peak, self.curvature, slip_angle)
    }

    #[inline]
    fn raw_moment(&self, slip_angle: f64) -> f64 {
        magic_formula(self.bz, self.cz, self.peak, self.curvature, slip_angle)
    }

    #[inline]
    fn longitudinal(&self, longitudinal_slip: f64) -> f64 {
        magic_formula(self.bx, self.cx, self.peak, self.curvature, longitudinal_slip)
    }
}

/// The three-channel tire model.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TireForceModel {
    calibration: MomentCalibration,
}

impl TireForceModel {
    pub fn new(calibration: MomentCalibration) -> Self {
        Self { calibration }
    }

    pub fn calibration(&self) -> MomentCalibration {
        self.calibration
    }

    /// Derive `Cs`, `D`, and the per-channel `B` factors.
    pub fn coefficients(
        &self,
        params: &ParameterVector,
        vertical_load: f64,
    ) -> Result<Coefficients, FitError> {
        if params.c2 == 0.0 {
            return Err(FitError::domain("c2 is zero (atan(Fz / c2) undefined)"));
        }
        let stiffness = stiffness_factor(params.c1, params.c2, vertical_load);
        if !stiffness.is_finite() {
            return Err(FitError::domain(format!("stiffness factor is not finite: {stiffness}")));
        }

        let peak = PEAK_LOAD_FACTOR * vertical_load;
        let by = channel_stiffness(stiffness, params.cy, peak, "Cy")?;
        let bx = channel_stiffness(stiffness, params.cx, peak, "Cx")?;
        let bz = channel_stiffness(stiffness, params.cz, peak, "Cz")?;

        Ok(Coefficients {
            stiffness,
            peak,
            curvature: params.e,
            by,
            bx,
            bz,
            cy: params.cy,
            cx: params.cx,
            cz: params.cz,
        })
    }

    /// Evaluate all channels at every slip angle of `state`.
    pub fn evaluate(&self, params: &ParameterVector, state: &TireState) -> Result<ModelOutput, FitError> {
        let coeffs = self.coefficients(params, state.vertical_load)?;

        let longitudinal = checked(coeffs.longitudinal(state.longitudinal_slip), "longitudinal force")?;

        let n = state.slip_angles.len();
        let mut out = ModelOutput {
            lateral_force: Vec::with_capacity(n),
            aligning_moment: Vec::with_capacity(n),
            longitudinal_force: vec![longitudinal; n],
        };
        for &alpha in &state.slip_angles {
            out.lateral_force.push(checked(coeffs.lateral(alpha), "lateral force")?);
            let moment = self.calibration.apply(coeffs.raw_moment(alpha));
            out.aligning_moment.push(checked(moment, "aligning moment")?);
        }
        Ok(out)
    }

    /// Evaluate all channels at a single slip angle (radians).
    pub fn evaluate_point(
        &self,
        params: &ParameterVector,
        vertical_load: f64,
        slip_angle: f64,
        longitudinal_slip: f64,
    ) -> Result<ChannelPoint, FitError> {
        let coeffs = self.coefficients(params, vertical_load)?;
        Ok(ChannelPoint {
            lateral_force: checked(coeffs.lateral(slip_angle), "lateral force")?,
            aligning_moment: checked(
                self.calibration.apply(coeffs.raw_moment(slip_angle)),
                "aligning moment",
            )?,
            longitudinal_force: checked(coeffs.longitudinal(longitudinal_slip), "longitudinal force")?,
        })
    }

    /// Raw (uncalibrated) moment channel at a single slip angle.
    pub fn raw_moment(
        &self,
        params: &ParameterVector,
        vertical_load: f64,
        slip_angle: f64,
    ) -> Result<f64, FitError> {
        let coeffs = self.coefficients(params, vertical_load)?;
        checked(coeffs.raw_moment(slip_angle), "raw aligning moment")
    }
}

fn channel_stiffness(stiffness: f64, shape: f64, peak: f64, name: &str) -> Result<f64, FitError> {
    let denom = shape * peak;
    if denom == 0.0 {
        return Err(FitError::domain(format!("{name} * D is zero")));
    }
    checked(stiffness / denom, name)
}

#[inline]
fn checked(value: f64, what: &str) -> Result<f64, FitError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(FitError::domain(format!("{what} is not finite")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> ParameterVector {
        ParameterVector::from_array([-0.4, 1.3, 1.6, 2.2, 5500.0, 2500.0])
    }

    #[test]
    fn evaluate_is_bit_identical_across_calls() {
        let model = TireForceModel::default();
        let state = TireState::new(1500.0, vec![-0.1, -0.02, 0.0, 0.05, 0.15], 0.1);
        let a = model.evaluate(&params(), &state).unwrap();
        let b = model.evaluate(&params(), &state).unwrap();
        for (x, y) in a.lateral_force.iter().zip(&b.lateral_force) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        for (x, y) in a.aligning_moment.iter().zip(&b.aligning_moment) {
            assert_eq!(x.to_bits(), y.to_bits());
        }
        assert_eq!(a, b);
    }

    #[test]
    fn raw_channels_vanish_at_zero_slip() {
        let model = TireForceModel::default();
        let point = model.evaluate_point(&params(), 1500.0, 0.0, 0.0).unwrap();
        assert_eq!(point.lateral_force, 0.0);
        assert_eq!(point.longitudinal_force, 0.0);
        assert_eq!(model.raw_moment(&params(), 1500.0, 0.0).unwrap(), 0.0);
        // The reported moment is the calibration offset.
        assert_eq!(point.aligning_moment, 12.0);

        let identity = TireForceModel::new(MomentCalibration::identity());
        let point = identity.evaluate_point(&params(), 1500.0, 0.0, 0.0).unwrap();
        assert_eq!(point.aligning_moment, 0.0);
    }

    #[test]
    fn output_channels_match_slip_shape() {
        let model = TireForceModel::default();
        let state = TireState::new(1500.0, vec![-0.1, 0.0, 0.1], 0.1);
        let out = model.evaluate(&params(), &state).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out.aligning_moment.len(), 3);
        assert_eq!(out.longitudinal_force.len(), 3);
        assert!(out.longitudinal_force.iter().all(|&f| f == out.longitudinal_force[0]));
    }

    #[test]
    fn vectorized_and_pointwise_agree() {
        let model = TireForceModel::default();
        let angles = vec![-0.12, 0.03, 0.09];
        let out = model.evaluate(&params(), &TireState::new(1500.0, angles.clone(), 0.1)).unwrap();
        for (i, &a) in angles.iter().enumerate() {
            let p = model.evaluate_point(&params(), 1500.0, a, 0.1).unwrap();
            assert_eq!(p.lateral_force, out.lateral_force[i]);
            assert_eq!(p.aligning_moment, out.aligning_moment[i]);
            assert_eq!(p.longitudinal_force, out.longitudinal_force[i]);
        }
    }

    #[test]
    fn matches_hand_computed_lateral_force() {
        let p = params();
        let fz = 1500.0;
        let alpha = 0.05_f64;
        let cs = p.c1 * (2.0 * (fz / p.c2).atan()).sin();
        let d = 1.5 * fz;
        let b = cs / (p.cy * d);
        let expected = d * (p.cy * (b * alpha - p.e * (b * alpha - (b * alpha).atan())).atan()).sin();
        let got = TireForceModel::default().evaluate_point(&p, fz, alpha, 0.0).unwrap();
        assert!((got.lateral_force - expected).abs() < 1e-9);
    }

    #[test]
    fn zero_c2_is_a_domain_error() {
        let p = ParameterVector { c2: 0.0, ..params() };
        let err = TireForceModel::default()
            .evaluate(&p, &TireState::single(1500.0, 0.1, 0.1))
            .unwrap_err();
        assert!(matches!(err, FitError::Domain(_)));
    }

    #[test]
    fn zero_shape_factor_is_a_domain_error() {
        let p = ParameterVector { cz: 0.0, ..params() };
        let err = TireForceModel::default()
            .evaluate(&p, &TireState::single(1500.0, 0.1, 0.1))
            .unwrap_err();
        assert!(err.to_string().contains("Cz"));
    }

    #[test]
    fn zero_load_is_a_domain_error() {
        let err = TireForceModel::default()
            .evaluate(&params(), &TireState::single(0.0, 0.1, 0.1))
            .unwrap_err();
        assert!(matches!(err, FitError::Domain(_)));
    }

    #[test]
    fn calibration_rejects_zero_scale() {
        assert!(MomentCalibration::new(12.0, 0.0).is_err());
        assert_eq!(MomentCalibration::new(12.0, 58.0).unwrap(), MomentCalibration::default());
    }
}
