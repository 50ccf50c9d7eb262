//! Parameter fitting.
//!
//! Responsibilities:
//!
//! - turn model/data discrepancy into a scalar error (`objective`)
//! - discretize the bound box into a row-major grid (`grid`)
//! - evaluate every grid point, in parallel, with a deterministic tie-break (`search`)
//! - glue the three together (`fitter`)

pub mod fitter;
pub mod grid;
pub mod objective;
pub mod search;

pub use fitter::*;
pub use grid::*;
pub use objective::*;
pub use search::*;
