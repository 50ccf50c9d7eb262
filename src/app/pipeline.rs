//! Shared "fit pipeline" logic used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! config -> data set -> objective -> grid search -> fitted channels
//!
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use tracing::info;

use crate::config::FitConfig;
use crate::data::synthetic::generate_measurements;
use crate::domain::{FitContext, ModelOutput, ParameterVector, SearchStats, TireState};
use crate::error::FitError;
use crate::fit::{ChannelErrors, Objective, SearchOutcome, fit_parameters};

/// The measurements a run is fitted against.
#[derive(Debug, Clone)]
pub struct DataSet {
    pub context: FitContext,
    /// Generating parameters when the data is synthetic.
    pub truth: Option<ParameterVector>,
}

/// All computed outputs of a single fit run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub config: FitConfig,
    pub data: DataSet,
    pub outcome: SearchOutcome,
    /// Model channels at the best parameters, at the measured slip angles.
    pub fitted: ModelOutput,
    pub channel_errors: ChannelErrors,
    /// Objective at the centre of the bound box, if defined there.
    pub midpoint_error: Option<f64>,
}

impl RunOutput {
    pub fn stats(&self) -> &SearchStats {
        &self.outcome.stats
    }
}

/// Build the data set described by `config.data` / `config.tire`.
pub fn build_data(config: &FitConfig) -> Result<DataSet, FitError> {
    let angles = config.data.slip_angles_rad();
    let tire = &config.tire;

    match &config.data.synthetic {
        Some(synthetic) => {
            let state = TireState::new(tire.vertical_load, angles.clone(), tire.longitudinal_slip);
            let generated = generate_measurements(&config.model(), synthetic, &state)?;
            let context = FitContext::new(
                &angles,
                &generated.lateral_force,
                &generated.aligning_moment,
                tire.vertical_load,
                tire.longitudinal_slip,
            )?;
            Ok(DataSet {
                context,
                truth: Some(generated.truth),
            })
        }
        None => {
            let context = FitContext::new(
                &angles,
                &config.data.lateral_force,
                &config.data.aligning_moment,
                tire.vertical_load,
                tire.longitudinal_slip,
            )?;
            Ok(DataSet { context, truth: None })
        }
    }
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, FitError> {
    config.validate()?;
    let data = build_data(config)?;

    let spec = config.grid.spec();
    info!(
        samples = data.context.len(),
        synthetic = data.truth.is_some(),
        steps = ?spec.steps,
        "fitting tire model"
    );

    let objective = Objective::new(&data.context, config.model(), config.objective)?;
    let outcome = fit_parameters(&objective, &config.bounds, &spec, &config.grid.search_options())?;

    let best = outcome.result.best_params;
    let fitted = objective.predict(&best)?;
    let channel_errors = objective.score_output(&fitted)?;
    let midpoint_error = objective.evaluate(&config.bounds.midpoint()).ok();

    Ok(RunOutput {
        config: config.clone(),
        data,
        outcome,
        fitted,
        channel_errors,
        midpoint_error,
    })
}

/// Evaluate a single parameter vector against the configured data set.
#[derive(Debug, Clone)]
pub struct EvalOutput {
    pub data: DataSet,
    pub params: ParameterVector,
    pub output: ModelOutput,
    pub channel_errors: ChannelErrors,
    pub error: f64,
}

pub fn run_eval(config: &FitConfig, params: &ParameterVector) -> Result<EvalOutput, FitError> {
    config.validate()?;
    let data = build_data(config)?;
    let objective = Objective::new(&data.context, config.model(), config.objective)?;
    let output = objective.predict(params)?;
    let channel_errors = objective.score_output(&output)?;
    let error = objective.error_of_output(&output)?;
    Ok(EvalOutput {
        data,
        params: *params,
        output,
        channel_errors,
        error,
    })
}
