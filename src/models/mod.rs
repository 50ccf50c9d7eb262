//! Tire force model.
//!
//! The fitter only needs one primitive: evaluate all channels for a parameter
//! vector and a tire state. Plots sample the same model point by point.

pub mod model;

pub use model::*;
