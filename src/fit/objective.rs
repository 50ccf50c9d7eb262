//! Sum-of-squared-residuals objective.
//!
//! `error = w_y * Σ(Fy_fit - Fy_obs)² + w_z * Σ(Mz_fit - Mz_obs)²`
//!
//! Force and moment residuals carry different units, so with equal weights
//! the force channel dominates. The default keeps equal weights; `ChannelWeights`
//! lets a caller rebalance. The longitudinal channel has no measurements and
//! never enters the objective.

use serde::{Deserialize, Serialize};

use crate::domain::{FitContext, ModelOutput, ParameterVector};
use crate::error::FitError;
use crate::models::TireForceModel;

/// Per-channel weights of the squared residual sums.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChannelWeights {
    pub lateral: f64,
    pub moment: f64,
}

impl Default for ChannelWeights {
    fn default() -> Self {
        Self {
            lateral: 1.0,
            moment: 1.0,
        }
    }
}

impl ChannelWeights {
    pub fn validate(&self) -> Result<(), FitError> {
        for (name, w) in [("lateral", self.lateral), ("moment", self.moment)] {
            if !(w.is_finite() && w >= 0.0) {
                return Err(FitError::config(format!(
                    "{name} weight must be finite and >= 0, got {w}"
                )));
            }
        }
        if self.lateral == 0.0 && self.moment == 0.0 {
            return Err(FitError::config("at least one channel weight must be > 0"));
        }
        Ok(())
    }
}

/// Unweighted squared residual sums per channel.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelErrors {
    pub lateral_sse: f64,
    pub moment_sse: f64,
    pub n: usize,
}

impl ChannelErrors {
    pub fn total(&self, weights: &ChannelWeights) -> f64 {
        weights.lateral * self.lateral_sse + weights.moment * self.moment_sse
    }

    pub fn lateral_rmse(&self) -> f64 {
        rmse(self.lateral_sse, self.n)
    }

    pub fn moment_rmse(&self) -> f64 {
        rmse(self.moment_sse, self.n)
    }
}

fn rmse(sse: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { (sse / n as f64).sqrt() }
}

/// Scalar error function of the parameter vector over a fixed data set.
#[derive(Debug, Clone, Copy)]
pub struct Objective<'a> {
    context: &'a FitContext,
    model: TireForceModel,
    weights: ChannelWeights,
}

impl<'a> Objective<'a> {
    pub fn new(
        context: &'a FitContext,
        model: TireForceModel,
        weights: ChannelWeights,
    ) -> Result<Self, FitError> {
        weights.validate()?;
        Ok(Self {
            context,
            model,
            weights,
        })
    }

    pub fn context(&self) -> &'a FitContext {
        self.context
    }

    pub fn model(&self) -> &TireForceModel {
        &self.model
    }

    pub fn weights(&self) -> &ChannelWeights {
        &self.weights
    }

    /// Model channels at the experimental slip angles.
    pub fn predict(&self, params: &ParameterVector) -> Result<ModelOutput, FitError> {
        self.model.evaluate(params, self.context.state())
    }

    /// Weighted total error at `params`.
    pub fn evaluate(&self, params: &ParameterVector) -> Result<f64, FitError> {
        let output = self.predict(params)?;
        self.error_of_output(&output)
    }

    pub fn channel_errors(&self, params: &ParameterVector) -> Result<ChannelErrors, FitError> {
        let output = self.predict(params)?;
        self.score_output(&output)
    }

    /// Residual sums of an already evaluated output against the measurements.
    pub fn score_output(&self, output: &ModelOutput) -> Result<ChannelErrors, FitError> {
        let samples = self.context.samples();
        if output.lateral_force.len() != samples.len() || output.aligning_moment.len() != samples.len() {
            return Err(FitError::config(format!(
                "model output has {} points, data has {}",
                output.len(),
                samples.len()
            )));
        }

        let mut errors = ChannelErrors {
            n: samples.len(),
            ..ChannelErrors::default()
        };
        for (i, s) in samples.iter().enumerate() {
            let r_lat = output.lateral_force[i] - s.lateral_force;
            let r_mz = output.aligning_moment[i] - s.aligning_moment;
            errors.lateral_sse += r_lat * r_lat;
            errors.moment_sse += r_mz * r_mz;
        }
        Ok(errors)
    }

    pub fn error_of_output(&self, output: &ModelOutput) -> Result<f64, FitError> {
        let total = self.score_output(output)?.total(&self.weights);
        if total.is_finite() {
            Ok(total)
        } else {
            Err(FitError::domain(format!("objective is not finite: {total}")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn truth() -> ParameterVector {
        ParameterVector::from_array([-0.5, 1.4, 1.5, 2.0, 6000.0, 2000.0])
    }

    fn context_from(params: &ParameterVector) -> FitContext {
        let angles: Vec<f64> = (-5..=5).map(|d| (d as f64 * 2.0).to_radians()).collect();
        let model = TireForceModel::default();
        let out = model
            .evaluate(params, &crate::domain::TireState::new(1500.0, angles.clone(), 0.1))
            .unwrap();
        FitContext::new(&angles, &out.lateral_force, &out.aligning_moment, 1500.0, 0.1).unwrap()
    }

    #[test]
    fn error_is_zero_at_generating_params() {
        let ctx = context_from(&truth());
        let obj = Objective::new(&ctx, TireForceModel::default(), ChannelWeights::default()).unwrap();
        assert_eq!(obj.evaluate(&truth()).unwrap(), 0.0);
    }

    #[test]
    fn error_is_positive_away_from_truth() {
        let ctx = context_from(&truth());
        let obj = Objective::new(&ctx, TireForceModel::default(), ChannelWeights::default()).unwrap();
        let off = ParameterVector { cy: 2.5, ..truth() };
        assert!(obj.evaluate(&off).unwrap() > 0.0);
    }

    #[test]
    fn longitudinal_shape_does_not_affect_error() {
        let ctx = context_from(&truth());
        let obj = Objective::new(&ctx, TireForceModel::default(), ChannelWeights::default()).unwrap();
        let a = ParameterVector { cy: 2.0, cx: 1.0, ..truth() };
        let b = ParameterVector { cy: 2.0, cx: 3.0, ..truth() };
        assert_eq!(obj.evaluate(&a).unwrap(), obj.evaluate(&b).unwrap());
    }

    #[test]
    fn weights_scale_channel_sums() {
        let ctx = context_from(&truth());
        let off = ParameterVector { cy: 2.5, cz: 1.2, ..truth() };
        let equal = Objective::new(&ctx, TireForceModel::default(), ChannelWeights::default()).unwrap();
        let errors = equal.channel_errors(&off).unwrap();
        assert_eq!(equal.evaluate(&off).unwrap(), errors.lateral_sse + errors.moment_sse);

        let weights = ChannelWeights { lateral: 0.0, moment: 2.0 };
        let moment_only = Objective::new(&ctx, TireForceModel::default(), weights).unwrap();
        assert_eq!(moment_only.evaluate(&off).unwrap(), 2.0 * errors.moment_sse);
    }

    #[test]
    fn domain_error_propagates() {
        let ctx = context_from(&truth());
        let obj = Objective::new(&ctx, TireForceModel::default(), ChannelWeights::default()).unwrap();
        let bad = ParameterVector { c2: 0.0, ..truth() };
        assert!(matches!(obj.evaluate(&bad), Err(FitError::Domain(_))));
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let ctx = context_from(&truth());
        let weights = ChannelWeights { lateral: -1.0, moment: 1.0 };
        assert!(matches!(
            Objective::new(&ctx, TireForceModel::default(), weights),
            Err(FitError::Configuration(_))
        ));
    }

    #[test]
    fn score_output_rejects_wrong_length() {
        let ctx = context_from(&truth());
        let obj = Objective::new(&ctx, TireForceModel::default(), ChannelWeights::default()).unwrap();
        let short = ModelOutput {
            lateral_force: vec![0.0],
            aligning_moment: vec![0.0],
            longitudinal_force: vec![0.0],
        };
        assert!(obj.score_output(&short).is_err());
    }
}
