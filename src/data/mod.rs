//! Measurement data sources.
//!
//! - `reference`: the built-in 19-point measurement set
//! - `synthetic`: seeded measurements generated from a known parameter vector

pub mod reference;
pub mod synthetic;

pub use reference::*;
pub use synthetic::*;
