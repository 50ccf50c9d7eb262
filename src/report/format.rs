//! Formatted terminal output for fit and eval runs.

use crate::app::pipeline::{EvalOutput, RunOutput};
use crate::domain::{AngleUnit, ParamBounds, ParameterVector, SearchStats};
use crate::fit::ChannelErrors;
use crate::report::SampleResidual;

/// Format the full run summary (data set + grid + search stats + best point).
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();
    let config = &run.config;
    let ctx = &run.data.context;
    let unit = config.data.angle_unit;

    out.push_str("=== tirefit - Magic Formula grid fit ===\n");
    let source = if run.data.truth.is_some() { "synthetic" } else { "measured" };
    out.push_str(&format!(
        "Data: {source} (n={}) | Fz={:.1} N | longitudinal slip={:.3}\n",
        ctx.len(),
        ctx.state().vertical_load,
        ctx.state().longitudinal_slip,
    ));
    let (lo, hi) = ctx.slip_range();
    out.push_str(&format!(
        "Slip angle: [{:.2}, {:.2}] {}\n",
        unit.from_radians(lo),
        unit.from_radians(hi),
        unit.label()
    ));

    let shape: Vec<String> = config.grid.spec().steps.iter().map(|s| s.to_string()).collect();
    out.push_str(&format!(
        "Grid: {} per axis = {} points ({})\n",
        shape.join("x"),
        run.stats().grid_size,
        if config.grid.parallel { "parallel" } else { "sequential" },
    ));
    out.push_str(&format_stats(run.stats()));

    out.push_str("\nBest parameters:\n");
    out.push_str(&format_params_with_bounds(&run.outcome.result.best_params, &config.bounds));

    out.push_str(&format!("\nBest error: {:.3}\n", run.outcome.result.best_error));
    out.push_str(&format_channel_errors(&run.channel_errors));

    if let Some(mid) = run.midpoint_error {
        let gain = if mid > 0.0 {
            100.0 * (1.0 - run.outcome.result.best_error / mid)
        } else {
            0.0
        };
        out.push_str(&format!("Midpoint error: {mid:.3} (best is {gain:.1}% lower)\n"));
    } else {
        out.push_str("Midpoint error: undefined (model singular at box centre)\n");
    }

    if let Some(truth) = &run.data.truth {
        out.push_str(&format!("Synthetic truth: {}\n", fmt_params(truth)));
    }

    out
}

/// Search counters, including the aggregate exclusion line.
pub fn format_stats(stats: &SearchStats) -> String {
    let mut out = format!(
        "Search: evaluated={} valid={} excluded={} | {} ms\n",
        stats.evaluated,
        stats.valid(),
        stats.excluded,
        stats.elapsed.as_millis()
    );
    if stats.excluded > 0 {
        out.push_str(&format!(
            "Excluded: {} of {} grid points (model undefined)\n",
            stats.excluded, stats.grid_size
        ));
    }
    if stats.timed_out {
        out.push_str(&format!(
            "Deadline reached after {} of {} points; result is the best so far\n",
            stats.evaluated, stats.grid_size
        ));
    }
    out
}

/// Format the result of evaluating one parameter vector.
pub fn format_eval(eval: &EvalOutput, residuals: &[SampleResidual], unit: AngleUnit) -> String {
    let mut out = String::new();
    out.push_str("=== tirefit - model evaluation ===\n");
    out.push_str(&format!("Parameters: {}\n", fmt_params(&eval.params)));
    out.push_str(&format!("Error: {:.3}\n", eval.error));
    out.push_str(&format_channel_errors(&eval.channel_errors));
    if let Some(fx) = eval.output.longitudinal_force.first() {
        out.push_str(&format!("Longitudinal force: {fx:.2} N\n"));
    }
    out.push('\n');
    out.push_str(&format_sample_table(residuals, unit));
    out
}

/// Per-angle table of measured vs fitted channels.
pub fn format_sample_table(rows: &[SampleResidual], unit: AngleUnit) -> String {
    let mut out = String::new();
    out.push_str(
        format!(
            "{:>8} {:>10} {:>10} {:>9} {:>9} {:>9} {:>8}\n",
            format!("slip({})", unit.label()),
            "Fy_obs",
            "Fy_fit",
            "Fy_res",
            "Mz_obs",
            "Mz_fit",
            "Mz_res"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(
        format!(
            "{:-<8} {:-<10} {:-<10} {:-<9} {:-<9} {:-<9} {:-<8}\n",
            "", "", "", "", "", "", ""
        )
        .trim_end(),
    );
    out.push('\n');

    for r in rows {
        out.push_str(
            format!(
                "{:>8.2} {:>10.1} {:>10.1} {:>9.1} {:>9.2} {:>9.2} {:>8.2}\n",
                unit.from_radians(r.sample.slip_angle),
                r.sample.lateral_force,
                r.fitted_lateral,
                r.lateral_residual,
                r.sample.aligning_moment,
                r.fitted_moment,
                r.moment_residual,
            )
            .trim_end(),
        );
        out.push('\n');
    }
    out
}

fn format_channel_errors(errors: &ChannelErrors) -> String {
    format!(
        "  lateral force : SSE={:.3} RMSE={:.3}\n  align. moment : SSE={:.3} RMSE={:.3}\n",
        errors.lateral_sse,
        errors.lateral_rmse(),
        errors.moment_sse,
        errors.moment_rmse()
    )
}

fn format_params_with_bounds(params: &ParameterVector, bounds: &ParamBounds) -> String {
    let mut out = String::new();
    for ((name, value), (lo, hi)) in params.named().iter().zip(bounds.axes()) {
        out.push_str(&format!("  {name:<3}= {value:>12.6}   in [{lo}, {hi}]\n"));
    }
    out
}

/// `E=…, Cy=…, …` on one line.
pub fn fmt_params(params: &ParameterVector) -> String {
    let parts: Vec<String> = params
        .named()
        .iter()
        .map(|(name, v)| format!("{name}={v:.6}"))
        .collect();
    parts.join(", ")
}
