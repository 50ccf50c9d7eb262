//! Terminal plots of measured vs fitted channels.

pub mod ascii;

pub use ascii::*;

use crate::domain::{AngleUnit, ExperimentalSample, FitContext, ParameterVector};
use crate::error::FitError;
use crate::models::{ChannelPoint, TireForceModel};

/// Which measured channel a plot shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Lateral,
    Moment,
}

impl Channel {
    pub fn title(self) -> &'static str {
        match self {
            Channel::Lateral => "Lateral force Fy [N]",
            Channel::Moment => "Aligning moment Mz",
        }
    }

    fn of_sample(self, s: &ExperimentalSample) -> f64 {
        match self {
            Channel::Lateral => s.lateral_force,
            Channel::Moment => s.aligning_moment,
        }
    }

    fn of_point(self, p: &ChannelPoint) -> f64 {
        match self {
            Channel::Lateral => p.lateral_force,
            Channel::Moment => p.aligning_moment,
        }
    }
}

/// Measured `(slip, value)` pairs with slip in `unit`.
pub fn observed_points(context: &FitContext, channel: Channel, unit: AngleUnit) -> Vec<(f64, f64)> {
    context
        .samples()
        .iter()
        .map(|s| (unit.from_radians(s.slip_angle), channel.of_sample(s)))
        .collect()
}

/// Sample the model curve densely across the measured slip range.
pub fn sample_curve(
    model: &TireForceModel,
    params: &ParameterVector,
    context: &FitContext,
    channel: Channel,
    unit: AngleUnit,
    n: usize,
) -> Result<Vec<(f64, f64)>, FitError> {
    let (mut lo, mut hi) = context.slip_range();
    if hi <= lo {
        // Single slip angle: show a small window around it.
        lo -= 5f64.to_radians();
        hi += 5f64.to_radians();
    }

    let state = context.state();
    let n = n.max(2);
    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let alpha = lo + u * (hi - lo);
        let point = model.evaluate_point(params, state.vertical_load, alpha, state.longitudinal_slip)?;
        out.push((unit.from_radians(alpha), channel.of_point(&point)));
    }
    Ok(out)
}

/// Both channel plots, stacked, for the given parameters.
pub fn render_fit_plots(
    context: &FitContext,
    model: &TireForceModel,
    params: &ParameterVector,
    unit: AngleUnit,
    width: usize,
    height: usize,
) -> Result<String, FitError> {
    let mut out = String::new();
    for channel in [Channel::Lateral, Channel::Moment] {
        let curve = sample_curve(model, params, context, channel, unit, width.max(2))?;
        let points = observed_points(context, channel, unit);
        out.push_str(&render_channel_plot(
            channel.title(),
            unit.label(),
            &points,
            &curve,
            width,
            height,
        ));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::reference::reference_context;

    #[test]
    fn curve_spans_measured_range() {
        let ctx = reference_context().unwrap();
        let params = ParameterVector::from_array([-2.0, 1.0, 1.0, 1.0, 10000.0, 1250.75]);
        let curve = sample_curve(
            &TireForceModel::default(),
            &params,
            &ctx,
            Channel::Lateral,
            AngleUnit::Degrees,
            50,
        )
        .unwrap();
        assert_eq!(curve.len(), 50);
        assert!((curve[0].0 - (-9.0)).abs() < 1e-9);
        assert!((curve[49].0 - 9.0).abs() < 1e-9);
    }

    #[test]
    fn render_fit_plots_has_two_panels() {
        let ctx = reference_context().unwrap();
        let params = ParameterVector::from_array([0.0, 1.5, 1.5, 2.0, 5000.0, 1500.0]);
        let txt = render_fit_plots(&ctx, &TireForceModel::default(), &params, AngleUnit::Degrees, 40, 10)
            .unwrap();
        assert_eq!(txt.matches("Plot: ").count(), 2);
        assert!(txt.contains("Lateral force"));
        assert!(txt.contains("Aligning moment"));
    }

    #[test]
    fn undefined_model_is_an_error() {
        let ctx = reference_context().unwrap();
        let params = ParameterVector::from_array([0.0, 1.5, 1.5, 2.0, 5000.0, 0.0]);
        let res = render_fit_plots(&ctx, &TireForceModel::default(), &params, AngleUnit::Degrees, 40, 10);
        assert!(matches!(res, Err(FitError::Domain(_))));
    }
}
