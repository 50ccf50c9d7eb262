//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the fitted parameter vector and its search bounds (`ParameterVector`, `ParamBounds`)
//! - measured data and operating condition (`ExperimentalSample`, `TireState`, `FitContext`)
//! - model and search outputs (`ModelOutput`, `FitResult`, `SearchStats`)

pub mod types;

pub use types::*;
