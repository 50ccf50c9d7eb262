//! Parameter grid generation.
//!
//! We fit the six Magic Formula parameters with a deterministic grid search over
//! a bounded box.
//!
//! Why grid search?
//! - The objective is non-convex and has singular regions (e.g. `c2 → 0`).
//! - No gradients are needed.
//! - It is deterministic given the same bounds and resolution.
//!
//! Points are enumerated row-major: `E` varies slowest, `c2` fastest. The flat
//! index of a point is its tie-break key in the search.

use crate::domain::{PARAM_COUNT, PARAM_NAMES, ParamBounds, ParameterVector};
use crate::error::FitError;

/// Default number of points per axis (5^6 = 15,625 evaluations).
pub const DEFAULT_STEPS: usize = 5;

/// Generate `steps` evenly spaced points between `low` and `high` (inclusive).
///
/// A degenerate range (`low == high`) yields the single value `low`.
pub fn lin_space(low: f64, high: f64, steps: usize) -> Result<Vec<f64>, FitError> {
    if !(low.is_finite() && high.is_finite() && low <= high) {
        return Err(FitError::config(format!(
            "invalid range: low={low}, high={high} (must be finite and low<=high)"
        )));
    }
    if steps == 0 {
        return Err(FitError::config("grid steps must be >= 1"));
    }
    if low == high {
        return Ok(vec![low]);
    }
    if steps < 2 {
        return Err(FitError::config(format!(
            "grid steps must be >= 2 to span [{low}, {high}]"
        )));
    }

    let span = high - low;
    let last = steps - 1;
    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        let v = if i == last {
            high
        } else {
            (low + span * (i as f64 / last as f64)).clamp(low, high)
        };
        out.push(v);
    }
    Ok(out)
}

/// Sampling resolution per axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridSpec {
    pub steps: [usize; PARAM_COUNT],
}

impl GridSpec {
    pub fn uniform(steps: usize) -> Self {
        Self {
            steps: [steps; PARAM_COUNT],
        }
    }
}

impl Default for GridSpec {
    fn default() -> Self {
        Self::uniform(DEFAULT_STEPS)
    }
}

/// The Cartesian product of six axes, addressed by flat index.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterGrid {
    axes: [Vec<f64>; PARAM_COUNT],
    len: usize,
}

impl ParameterGrid {
    pub fn new(bounds: &ParamBounds, spec: &GridSpec) -> Result<Self, FitError> {
        bounds.validate()?;

        let ranges = bounds.axes();
        let mut axes: [Vec<f64>; PARAM_COUNT] = Default::default();
        let mut len: usize = 1;
        for i in 0..PARAM_COUNT {
            let (low, high) = ranges[i];
            axes[i] = lin_space(low, high, spec.steps[i])
                .map_err(|e| FitError::config(format!("axis {}: {}", PARAM_NAMES[i], strip(&e))))?;
            len = len.checked_mul(axes[i].len()).ok_or_else(|| {
                FitError::config(format!("grid size overflows at axis {}", PARAM_NAMES[i]))
            })?;
        }
        Ok(Self { axes, len })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn axis(&self, i: usize) -> &[f64] {
        &self.axes[i]
    }

    /// Number of candidate values per axis.
    pub fn shape(&self) -> [usize; PARAM_COUNT] {
        std::array::from_fn(|i| self.axes[i].len())
    }

    /// Decode a flat index into a parameter vector (last axis fastest).
    ///
    /// # Panics
    /// Panics if `index >= self.len()`.
    pub fn point(&self, index: usize) -> ParameterVector {
        assert!(index < self.len, "grid index {index} out of range ({})", self.len);
        let mut rem = index;
        let mut values = [0.0; PARAM_COUNT];
        for i in (0..PARAM_COUNT).rev() {
            let n = self.axes[i].len();
            values[i] = self.axes[i][rem % n];
            rem /= n;
        }
        ParameterVector::from_array(values)
    }
}

fn strip(err: &FitError) -> String {
    match err {
        FitError::Configuration(msg) => msg.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lin_space_includes_endpoints() {
        let v = lin_space(-2.0, 1.2, 5).unwrap();
        assert_eq!(v.len(), 5);
        assert_eq!(v[0], -2.0);
        assert_eq!(v[4], 1.2);
        assert!((v[2] + 0.4).abs() < 1e-12);
    }

    #[test]
    fn lin_space_degenerate_range_is_single_point() {
        assert_eq!(lin_space(0.0, 0.0, 7).unwrap(), vec![0.0]);
    }

    #[test]
    fn lin_space_rejects_bad_input() {
        assert!(lin_space(1.0, 0.0, 5).is_err());
        assert!(lin_space(0.0, 1.0, 0).is_err());
        assert!(lin_space(0.0, 1.0, 1).is_err());
        assert!(lin_space(f64::NAN, 1.0, 3).is_err());
    }

    #[test]
    fn grid_is_row_major() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(3)).unwrap();
        assert_eq!(grid.len(), 729);

        let first = grid.point(0);
        assert_eq!(first.to_array(), [-2.0, 1.0, 1.0, 1.0, 1000.0, 1.0]);

        // c2 varies fastest.
        let second = grid.point(1);
        assert_eq!(second.e, -2.0);
        assert_eq!(second.c1, 1000.0);
        assert!((second.c2 - 2500.5).abs() < 1e-9);

        let last = grid.point(grid.len() - 1);
        assert_eq!(last.to_array(), [1.2, 3.0, 3.0, 3.0, 10000.0, 5000.0]);
    }

    #[test]
    fn every_point_lies_inside_bounds() {
        let bounds = ParamBounds::default();
        let grid = ParameterGrid::new(&bounds, &GridSpec::uniform(4)).unwrap();
        for i in 0..grid.len() {
            assert!(bounds.contains(&grid.point(i)));
        }
    }

    #[test]
    fn per_axis_steps_and_degenerate_axes() {
        let bounds = ParamBounds {
            cx: [2.0, 2.0],
            ..ParamBounds::default()
        };
        let spec = GridSpec {
            steps: [3, 2, 9, 2, 4, 5],
        };
        let grid = ParameterGrid::new(&bounds, &spec).unwrap();
        assert_eq!(grid.shape(), [3, 2, 1, 2, 4, 5]);
        assert_eq!(grid.len(), 3 * 2 * 2 * 4 * 5);
    }

    #[test]
    fn zero_steps_names_axis() {
        let spec = GridSpec {
            steps: [5, 5, 5, 0, 5, 5],
        };
        let err = ParameterGrid::new(&ParamBounds::default(), &spec).unwrap_err();
        assert!(err.to_string().contains("Cz"));
    }
}
