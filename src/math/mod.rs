//! Numerical helpers.
//!
//! - `magic`: the Magic Formula curve primitive and the load-dependent stiffness factor

pub mod magic;

pub use magic::*;
