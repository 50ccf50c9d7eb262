//! Reporting: per-sample residuals and formatted terminal output.
//!
//! Nothing here affects the fit; the golden tests pin the text layout.

pub mod format;

pub use format::*;

use crate::domain::{ExperimentalSample, FitContext, ModelOutput};
use crate::error::AppError;

/// Measured vs fitted values at one slip angle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleResidual {
    pub sample: ExperimentalSample,
    pub fitted_lateral: f64,
    pub fitted_moment: f64,
    /// `measured - fitted`
    pub lateral_residual: f64,
    pub moment_residual: f64,
}

/// Pair each measurement with the fitted channels.
pub fn compute_residuals(context: &FitContext, fitted: &ModelOutput) -> Result<Vec<SampleResidual>, AppError> {
    let samples = context.samples();
    if fitted.lateral_force.len() != samples.len() || fitted.aligning_moment.len() != samples.len() {
        return Err(AppError::new(
            4,
            format!(
                "Fitted output has {} points but the data set has {}.",
                fitted.len(),
                samples.len()
            ),
        ));
    }

    let mut out = Vec::with_capacity(samples.len());
    for (i, s) in samples.iter().enumerate() {
        let fitted_lateral = fitted.lateral_force[i];
        let fitted_moment = fitted.aligning_moment[i];
        if !(fitted_lateral.is_finite() && fitted_moment.is_finite()) {
            return Err(AppError::new(4, "Non-finite model prediction during residual computation."));
        }
        out.push(SampleResidual {
            sample: *s,
            fitted_lateral,
            fitted_moment,
            lateral_residual: s.lateral_force - fitted_lateral,
            moment_residual: s.aligning_moment - fitted_moment,
        });
    }
    Ok(out)
}

/// The `top_n` samples with the largest absolute lateral-force residual.
pub fn worst_lateral(residuals: &[SampleResidual], top_n: usize) -> Vec<SampleResidual> {
    let mut sorted = residuals.to_vec();
    sorted.sort_by(|a, b| {
        b.lateral_residual
            .abs()
            .partial_cmp(&a.lateral_residual.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    sorted.into_iter().take(top_n).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> FitContext {
        FitContext::new(&[-0.1, 0.0, 0.1], &[-1000.0, 0.0, 1000.0], &[-20.0, 12.0, 40.0], 1500.0, 0.1)
            .unwrap()
    }

    #[test]
    fn compute_residuals_basic() {
        let fitted = ModelOutput {
            lateral_force: vec![-990.0, 5.0, 1000.0],
            aligning_moment: vec![-20.0, 12.0, 38.0],
            longitudinal_force: vec![0.0; 3],
        };
        let residuals = compute_residuals(&context(), &fitted).unwrap();
        assert_eq!(residuals.len(), 3);
        assert_eq!(residuals[0].lateral_residual, -10.0);
        assert_eq!(residuals[1].lateral_residual, -5.0);
        assert_eq!(residuals[2].moment_residual, 2.0);
    }

    #[test]
    fn compute_residuals_rejects_length_mismatch() {
        let fitted = ModelOutput {
            lateral_force: vec![0.0],
            aligning_moment: vec![0.0],
            longitudinal_force: vec![0.0],
        };
        assert!(compute_residuals(&context(), &fitted).is_err());
    }

    #[test]
    fn worst_lateral_orders_by_magnitude() {
        let fitted = ModelOutput {
            lateral_force: vec![-990.0, 5.0, 1030.0],
            aligning_moment: vec![-20.0, 12.0, 40.0],
            longitudinal_force: vec![0.0; 3],
        };
        let residuals = compute_residuals(&context(), &fitted).unwrap();
        let worst = worst_lateral(&residuals, 2);
        assert_eq!(worst.len(), 2);
        assert_eq!(worst[0].lateral_residual, -30.0);
        assert_eq!(worst[1].lateral_residual, -10.0);
    }
}
