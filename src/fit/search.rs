//! Exhaustive grid search.
//!
//! The flat index range of a `ParameterGrid` is cut into fixed-size chunks.
//! Each chunk is evaluated independently (in parallel by default) and reduced
//! to its best point plus counters; chunks are then merged with a comparator
//! that orders by `(error, grid index)`. Because that order is total, the
//! result does not depend on which worker finishes first.
//!
//! Points where the objective reports `FitError::Domain` are excluded and
//! counted. Any other error aborts the search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::domain::{FitResult, ParameterVector, SearchStats};
use crate::error::FitError;
use crate::fit::grid::ParameterGrid;

/// Points per work unit.
pub const DEFAULT_CHUNK_SIZE: usize = 512;

/// Execution options that do not change the result (except via `max_duration`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOptions {
    /// Evaluate chunks on the rayon pool.
    pub parallel: bool,
    /// Stop early and return the best point seen so far.
    pub max_duration: Option<Duration>,
    pub chunk_size: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            max_duration: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Best point plus run bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    pub result: FitResult,
    /// Flat grid index of the best point.
    pub best_index: usize,
    pub stats: SearchStats,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Candidate {
    index: usize,
    error: f64,
}

impl Candidate {
    fn beats(&self, other: &Candidate) -> bool {
        self.error < other.error || (self.error == other.error && self.index < other.index)
    }
}

#[derive(Debug, Clone, Default)]
struct Tally {
    best: Option<Candidate>,
    evaluated: usize,
    excluded: usize,
    /// First non-domain failure, keyed by grid index.
    fatal: Option<(usize, FitError)>,
}

impl Tally {
    fn offer(&mut self, candidate: Candidate) {
        if self.best.is_none_or(|best| candidate.beats(&best)) {
            self.best = Some(candidate);
        }
    }

    fn merge(mut self, other: Tally) -> Tally {
        if let Some(c) = other.best {
            self.offer(c);
        }
        self.evaluated += other.evaluated;
        self.excluded += other.excluded;
        self.fatal = match (self.fatal.take(), other.fatal) {
            (Some(a), Some(b)) => Some(if b.0 < a.0 { b } else { a }),
            (a, b) => a.or(b),
        };
        self
    }
}

/// Evaluate `objective` at every point of `grid` and return the minimum.
///
/// Ties are broken by the lowest grid index, i.e. the first minimum in
/// row-major order wins.
pub fn grid_search<F>(
    grid: &ParameterGrid,
    options: &SearchOptions,
    objective: F,
) -> Result<SearchOutcome, FitError>
where
    F: Fn(&ParameterVector) -> Result<f64, FitError> + Sync,
{
    if options.chunk_size == 0 {
        return Err(FitError::config("chunk size must be >= 1"));
    }

    let grid_size = grid.len();
    let started = Instant::now();
    let deadline = options.max_duration.map(|d| started + d);
    let expired = AtomicBool::new(false);

    info!(grid_size, parallel = options.parallel, "starting grid search");

    let n_chunks = grid_size.div_ceil(options.chunk_size);
    let run_chunk = |chunk: usize| {
        let start = chunk * options.chunk_size;
        let end = (start + options.chunk_size).min(grid_size);
        evaluate_chunk(grid, start..end, deadline, &expired, &objective)
    };

    let tally = if options.parallel {
        (0..n_chunks)
            .into_par_iter()
            .map(run_chunk)
            .reduce(Tally::default, Tally::merge)
    } else {
        (0..n_chunks).map(run_chunk).fold(Tally::default(), Tally::merge)
    };

    let stats = SearchStats {
        grid_size,
        evaluated: tally.evaluated,
        excluded: tally.excluded,
        timed_out: expired.load(Ordering::Relaxed),
        elapsed: started.elapsed(),
    };
    debug!(?stats, "grid search finished");

    if let Some((index, err)) = tally.fatal {
        return Err(match err {
            FitError::Configuration(msg) => {
                FitError::config(format!("objective failed at grid index {index}: {msg}"))
            }
            other => other,
        });
    }
    if stats.excluded > 0 {
        warn!(
            excluded = stats.excluded,
            grid_size,
            "{} of {} grid points excluded (model undefined)",
            stats.excluded,
            grid_size
        );
    }
    if stats.timed_out {
        warn!(
            evaluated = stats.evaluated,
            grid_size, "deadline reached; returning best point found so far"
        );
    }

    let Some(best) = tally.best else {
        return Err(FitError::EmptySearchSpace {
            grid_size,
            excluded: stats.excluded,
        });
    };

    let result = FitResult {
        best_params: grid.point(best.index),
        best_error: best.error,
    };
    info!(
        best_error = result.best_error,
        best_index = best.index,
        elapsed_ms = stats.elapsed.as_millis() as u64,
        "grid search complete"
    );

    Ok(SearchOutcome {
        result,
        best_index: best.index,
        stats,
    })
}

fn evaluate_chunk<F>(
    grid: &ParameterGrid,
    range: std::ops::Range<usize>,
    deadline: Option<Instant>,
    expired: &AtomicBool,
    objective: &F,
) -> Tally
where
    F: Fn(&ParameterVector) -> Result<f64, FitError> + Sync,
{
    let mut tally = Tally::default();
    for index in range {
        if let Some(deadline) = deadline {
            if expired.load(Ordering::Relaxed) || Instant::now() >= deadline {
                expired.store(true, Ordering::Relaxed);
                break;
            }
        }

        tally.evaluated += 1;
        let params = grid.point(index);
        match objective(&params) {
            Ok(error) if error.is_finite() && error >= 0.0 => tally.offer(Candidate { index, error }),
            Ok(_) | Err(FitError::Domain(_)) => tally.excluded += 1,
            Err(err) => {
                tally.fatal = Some((index, err));
                break;
            }
        }
    }
    tally
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ParamBounds;
    use crate::fit::grid::GridSpec;

    fn bowl(target: [f64; 6]) -> impl Fn(&ParameterVector) -> Result<f64, FitError> + Sync {
        move |p: &ParameterVector| {
            let v = p.to_array();
            let scale = [1.0, 1.0, 1.0, 1.0, 1e-3, 1e-3];
            Ok((0..6).map(|i| ((v[i] - target[i]) * scale[i]).powi(2)).sum::<f64>())
        }
    }

    fn sequential() -> SearchOptions {
        SearchOptions {
            parallel: false,
            ..SearchOptions::default()
        }
    }

    #[test]
    fn finds_grid_point_at_minimum() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(5)).unwrap();
        let target = [0.4, 2.0, 1.5, 3.0, 7750.0, 1250.75];
        let out = grid_search(&grid, &SearchOptions::default(), bowl(target)).unwrap();
        for (a, b) in out.result.best_params.to_array().iter().zip(target.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
        assert!(out.result.best_error < 1e-12);
        assert_eq!(out.stats.grid_size, 15_625);
        assert_eq!(out.stats.evaluated, 15_625);
        assert_eq!(out.stats.excluded, 0);
        assert!(!out.stats.timed_out);
    }

    #[test]
    fn ties_resolve_to_lowest_grid_index() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(3)).unwrap();
        let flat = |_: &ParameterVector| -> Result<f64, FitError> { Ok(1.0) };
        let par = grid_search(&grid, &SearchOptions { chunk_size: 7, ..SearchOptions::default() }, flat)
            .unwrap();
        let seq = grid_search(&grid, &sequential(), flat).unwrap();
        assert_eq!(par.best_index, 0);
        assert_eq!(seq.best_index, 0);
        assert_eq!(par.result, seq.result);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(4)).unwrap();
        // Minimum is flat along `cx`, so many exact ties exist.
        let objective =
            |p: &ParameterVector| -> Result<f64, FitError> { Ok((p.e - 0.2).powi(2) + (p.cy - 2.0).powi(2)) };
        let a = grid_search(&grid, &SearchOptions { chunk_size: 13, ..SearchOptions::default() }, objective)
            .unwrap();
        let b = grid_search(&grid, &sequential(), objective).unwrap();
        let c = grid_search(&grid, &SearchOptions::default(), objective).unwrap();
        assert_eq!(a.best_index, b.best_index);
        assert_eq!(b.best_index, c.best_index);
        assert_eq!(a.result, b.result);
        assert_eq!(b.result.best_params.cx, 1.0);
    }

    #[test]
    fn domain_errors_are_excluded_and_counted() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(3)).unwrap();
        let objective = |p: &ParameterVector| {
            if p.e < 0.0 {
                Err(FitError::domain("negative curvature"))
            } else {
                Ok(p.cy)
            }
        };
        let out = grid_search(&grid, &SearchOptions::default(), objective).unwrap();
        // Two of the three E values are negative.
        assert_eq!(out.stats.excluded, 2 * 243);
        assert_eq!(out.stats.valid(), 243);
        assert_eq!(out.result.best_params.e, 1.2);
        assert_eq!(out.result.best_params.cy, 1.0);
    }

    #[test]
    fn non_finite_objective_values_are_excluded() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(2)).unwrap();
        let objective = |p: &ParameterVector| -> Result<f64, FitError> {
            Ok(if p.cz > 2.0 { f64::NAN } else { p.c1 })
        };
        let out = grid_search(&grid, &sequential(), objective).unwrap();
        assert_eq!(out.stats.excluded, 32);
        assert_eq!(out.result.best_params.c1, 1000.0);
    }

    #[test]
    fn all_points_excluded_is_an_error() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(2)).unwrap();
        let err = grid_search(&grid, &SearchOptions::default(), |_: &ParameterVector| {
            Err(FitError::domain("nope"))
        })
        .unwrap_err();
        assert_eq!(
            err,
            FitError::EmptySearchSpace {
                grid_size: 64,
                excluded: 64
            }
        );
    }

    #[test]
    fn configuration_errors_abort_the_search() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(2)).unwrap();
        let err = grid_search(&grid, &SearchOptions::default(), |_: &ParameterVector| {
            Err(FitError::config("broken"))
        })
        .unwrap_err();
        assert!(matches!(err, FitError::Configuration(msg) if msg.contains("grid index 0")));
    }

    #[test]
    fn zero_deadline_times_out() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(3)).unwrap();
        let options = SearchOptions {
            max_duration: Some(Duration::ZERO),
            ..sequential()
        };
        let err = grid_search(&grid, &options, |_: &ParameterVector| -> Result<f64, FitError> { Ok(1.0) })
            .unwrap_err();
        assert!(matches!(err, FitError::EmptySearchSpace { excluded: 0, .. }));
    }

    #[test]
    fn generous_deadline_does_not_change_result() {
        let grid = ParameterGrid::new(&ParamBounds::default(), &GridSpec::uniform(3)).unwrap();
        let target = [1.2, 1.0, 3.0, 2.0, 1000.0, 5000.0];
        let options = SearchOptions {
            max_duration: Some(Duration::from_secs(600)),
            ..SearchOptions::default()
        };
        let a = grid_search(&grid, &options, bowl(target)).unwrap();
        let b = grid_search(&grid, &sequential(), bowl(target)).unwrap();
        assert!(!a.stats.timed_out);
        assert_eq!(a.result, b.result);
    }
}
