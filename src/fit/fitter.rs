//! Fit entry point: objective + bounds + resolution -> best grid point.
//!
//! There is no refinement step after the grid search. A caller wanting more
//! precision restarts a narrower search around the returned point
//! (`refine_bounds` builds that box).

use crate::domain::{PARAM_COUNT, ParamBounds, ParameterVector};
use crate::error::FitError;
use crate::fit::grid::{GridSpec, ParameterGrid};
use crate::fit::objective::Objective;
use crate::fit::search::{SearchOptions, SearchOutcome, grid_search};

/// Minimize `objective` over the grid described by `bounds` and `spec`.
pub fn fit_parameters(
    objective: &Objective<'_>,
    bounds: &ParamBounds,
    spec: &GridSpec,
    options: &SearchOptions,
) -> Result<SearchOutcome, FitError> {
    let grid = ParameterGrid::new(bounds, spec)?;
    grid_search(&grid, options, |params| objective.evaluate(params))
}

/// A box of one grid cell around `center`, clipped to `outer`.
///
/// The cell width per axis is `(high - low) / (steps - 1)` of the outer grid.
pub fn refine_bounds(
    center: &ParameterVector,
    outer: &ParamBounds,
    spec: &GridSpec,
) -> Result<ParamBounds, FitError> {
    outer.validate()?;
    let c = center.to_array();
    let axes = outer.axes();
    let mut out = [[0.0; 2]; PARAM_COUNT];
    for i in 0..PARAM_COUNT {
        let (lo, hi) = axes[i];
        let cell = if spec.steps[i] > 1 {
            (hi - lo) / (spec.steps[i] - 1) as f64
        } else {
            0.0
        };
        out[i] = [(c[i] - cell).max(lo), (c[i] + cell).min(hi)];
    }
    let [e, cy, cx, cz, c1, c2] = out;
    let refined = ParamBounds { e, cy, cx, cz, c1, c2 };
    refined.validate()?;
    Ok(refined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FitContext, TireState};
    use crate::fit::objective::ChannelWeights;
    use crate::models::TireForceModel;

    #[test]
    fn recovers_generating_grid_point() {
        // Pick the truth on the 5-point grid so it is reachable exactly.
        let truth = ParameterVector::from_array([0.4, 1.5, 1.0, 2.5, 7750.0, 1250.75]);
        let angles: Vec<f64> = (-9..=9).map(|d| (d as f64).to_radians()).collect();
        let model = TireForceModel::default();
        let out = model
            .evaluate(&truth, &TireState::new(1500.0, angles.clone(), 0.1))
            .unwrap();
        let ctx = FitContext::new(&angles, &out.lateral_force, &out.aligning_moment, 1500.0, 0.1).unwrap();
        let objective = Objective::new(&ctx, model, ChannelWeights::default()).unwrap();

        let outcome = fit_parameters(
            &objective,
            &ParamBounds::default(),
            &GridSpec::uniform(5),
            &SearchOptions::default(),
        )
        .unwrap();

        assert!(outcome.result.best_error < 1e-6);
        let best = outcome.result.best_params;
        assert!((best.e - truth.e).abs() < 1e-9);
        assert!((best.cy - truth.cy).abs() < 1e-9);
        assert!((best.cz - truth.cz).abs() < 1e-9);
        // Cx only drives the longitudinal channel: the first grid value wins the tie.
        assert_eq!(best.cx, 1.0);
    }

    #[test]
    fn refine_bounds_stays_inside_outer_box() {
        let outer = ParamBounds::default();
        let spec = GridSpec::uniform(5);
        let center = ParameterVector::from_array([-2.0, 2.0, 3.0, 1.5, 5500.0, 1.0]);
        let refined = refine_bounds(&center, &outer, &spec).unwrap();
        assert_eq!(refined.e[0], -2.0);
        assert!((refined.e[1] + 1.2).abs() < 1e-12);
        assert_eq!(refined.cx, [2.5, 3.0]);
        assert_eq!(refined.c1, [3250.0, 7750.0]);
        assert_eq!(refined.c2[0], 1.0);
    }
}
