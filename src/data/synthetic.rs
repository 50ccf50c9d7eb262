//! Synthetic measurement generation.
//!
//! Measurements are the model output at a known parameter vector plus
//! independent Gaussian noise per channel. The RNG is seeded, so the same
//! settings always produce the same data set. Useful for checking that a bound
//! box and resolution can recover a known tire.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use serde::{Deserialize, Serialize};

use crate::domain::{ParameterVector, TireState};
use crate::error::FitError;
use crate::models::TireForceModel;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SyntheticConfig {
    pub seed: u64,
    /// Parameters the measurements are generated from.
    pub params: ParameterVector,
    /// Standard deviation of the lateral force noise [N].
    pub lateral_noise: f64,
    /// Standard deviation of the aligning moment noise.
    pub moment_noise: f64,
}

impl Default for SyntheticConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            params: ParameterVector::from_array([0.4, 1.5, 1.5, 2.5, 7750.0, 1250.75]),
            lateral_noise: 25.0,
            moment_noise: 1.0,
        }
    }
}

impl SyntheticConfig {
    pub fn validate(&self) -> Result<(), FitError> {
        for (name, sigma) in [("lateral_noise", self.lateral_noise), ("moment_noise", self.moment_noise)] {
            if !(sigma.is_finite() && sigma >= 0.0) {
                return Err(FitError::config(format!(
                    "synthetic {name} must be finite and >= 0, got {sigma}"
                )));
            }
        }
        Ok(())
    }
}

/// Generated measurement channels, parallel to the state's slip angles.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntheticData {
    pub lateral_force: Vec<f64>,
    pub aligning_moment: Vec<f64>,
    pub truth: ParameterVector,
}

pub fn generate_measurements(
    model: &TireForceModel,
    config: &SyntheticConfig,
    state: &TireState,
) -> Result<SyntheticData, FitError> {
    config.validate()?;
    let clean = model.evaluate(&config.params, state)?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| FitError::config(format!("failed to build noise distribution: {e}")))?;

    let mut lateral_force = Vec::with_capacity(clean.len());
    let mut aligning_moment = Vec::with_capacity(clean.len());
    for i in 0..clean.len() {
        let z_lat: f64 = normal.sample(&mut rng);
        let z_mz: f64 = normal.sample(&mut rng);
        lateral_force.push(clean.lateral_force[i] + config.lateral_noise * z_lat);
        aligning_moment.push(clean.aligning_moment[i] + config.moment_noise * z_mz);
    }

    Ok(SyntheticData {
        lateral_force,
        aligning_moment,
        truth: config.params,
    })
}
