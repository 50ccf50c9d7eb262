//! Magic Formula primitives.
//!
//! The generic curve is
//!
//! `y(x) = D * sin(C * atan(B*x - E*(B*x - atan(B*x))))`
//!
//! with stiffness `B`, shape `C`, peak `D`, and curvature `E`. The tire model
//! evaluates it once per channel with channel-specific `B` and `C`.

/// Evaluate the Magic Formula at `x`.
#[inline]
pub fn magic_formula(b: f64, c: f64, d: f64, e: f64, x: f64) -> f64 {
    let bx = b * x;
    d * (c * (bx - e * (bx - bx.atan())).atan()).sin()
}

/// Load-dependent stiffness factor `Cs = c1 * sin(2 * atan(Fz / c2))`.
///
/// Callers must reject `c2 == 0`: IEEE division would yield `atan(±inf)` and
/// silently produce a finite value.
#[inline]
pub fn stiffness_factor(c1: f64, c2: f64, vertical_load: f64) -> f64 {
    c1 * (2.0 * (vertical_load / c2).atan()).sin()
}
