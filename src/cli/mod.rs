//! Command-line parsing for the tire model fitter.
//!
//! Argument parsing and command dispatch stay separate from the modeling and
//! search code. Every flag here overrides a field of the loaded `FitConfig`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{PARAM_COUNT, ParameterVector};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "tirefit",
    version,
    about = "Fit Pacejka Magic Formula tire parameters by exhaustive grid search"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit the model to the configured data set and print a report.
    Fit(FitArgs),
    /// Evaluate one parameter vector against the configured data set.
    Eval(EvalArgs),
    /// Launch the interactive TUI.
    Tui(TuiArgs),
}

/// Options shared by every subcommand.
#[derive(Debug, Args, Clone, Default)]
pub struct ConfigArgs {
    /// TOML configuration file (defaults apply when omitted).
    #[arg(short = 'c', long, value_name = "TOML")]
    pub config: Option<PathBuf>,
}

#[derive(Debug, Args, Clone, Default)]
pub struct FitArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    /// Grid points per axis.
    #[arg(short = 's', long)]
    pub steps: Option<usize>,

    /// Grid points per axis in `(E, Cy, Cx, Cz, c1, c2)` order, comma-separated.
    #[arg(long, value_delimiter = ',', conflicts_with = "steps")]
    pub axis_steps: Option<Vec<usize>>,

    /// Evaluate on the calling thread only.
    #[arg(long)]
    pub sequential: bool,

    /// Stop after this many milliseconds and report the best point so far.
    #[arg(long, value_name = "MS")]
    pub max_ms: Option<u64>,

    /// Fit against synthetic measurements instead of the configured data.
    #[arg(long)]
    pub synthetic: bool,

    /// Seed for synthetic noise (implies `--synthetic`).
    #[arg(long)]
    pub seed: Option<u64>,

    /// Lateral-force noise standard deviation for synthetic data.
    #[arg(long)]
    pub noise_lat: Option<f64>,

    /// Aligning-moment noise standard deviation for synthetic data.
    #[arg(long)]
    pub noise_mz: Option<f64>,

    /// Weight of the aligning-moment channel in the objective.
    #[arg(long)]
    pub moment_weight: Option<f64>,

    /// Print the per-sample residual table.
    #[arg(long)]
    pub table: bool,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone)]
pub struct EvalArgs {
    #[command(flatten)]
    pub common: ConfigArgs,

    /// Parameters as `E,Cy,Cx,Cz,c1,c2`.
    #[arg(short = 'p', long, value_parser = parse_params, allow_hyphen_values = true)]
    pub params: ParameterVector,

    /// Disable the terminal plots.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 80)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 20)]
    pub height: usize,
}

#[derive(Debug, Args, Clone, Default)]
pub struct TuiArgs {
    #[command(flatten)]
    pub common: ConfigArgs,
}

/// Parse `E,Cy,Cx,Cz,c1,c2` into a parameter vector.
pub fn parse_params(s: &str) -> Result<ParameterVector, String> {
    let values = s
        .split(',')
        .map(|part| {
            let part = part.trim();
            part.parse::<f64>()
                .map_err(|e| format!("invalid number '{part}': {e}"))
        })
        .collect::<Result<Vec<f64>, String>>()?;

    let values: [f64; PARAM_COUNT] = values
        .try_into()
        .map_err(|v: Vec<f64>| format!("expected {PARAM_COUNT} comma-separated values, got {}", v.len()))?;
    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(format!("parameter values must be finite, got {bad}"));
    }
    Ok(ParameterVector::from_array(values))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_params_accepts_six_values() {
        let p = parse_params("-2, 1, 1.5, 2, 10000, 1250.75").unwrap();
        assert_eq!(p.to_array(), [-2.0, 1.0, 1.5, 2.0, 10000.0, 1250.75]);
    }

    #[test]
    fn parse_params_rejects_wrong_count() {
        let err = parse_params("1,2,3").unwrap_err();
        assert!(err.contains("got 3"));
    }

    #[test]
    fn parse_params_rejects_garbage() {
        assert!(parse_params("1,2,3,4,5,x").is_err());
        assert!(parse_params("1,2,3,4,5,inf").is_err());
    }

    #[test]
    fn eval_accepts_negative_leading_param() {
        let cli = Cli::try_parse_from(["tirefit", "eval", "--params", "-2,1,1,1,10000,1250.75"]).unwrap();
        match cli.command {
            Command::Eval(args) => assert_eq!(args.params.e, -2.0),
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn fit_flags_parse() {
        let cli = Cli::try_parse_from([
            "tirefit", "fit", "--steps", "3", "--sequential", "--max-ms", "50", "--seed", "7",
        ])
        .unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.steps, Some(3));
        assert!(args.sequential);
        assert_eq!(args.max_ms, Some(50));
        assert_eq!(args.seed, Some(7));
    }

    #[test]
    fn axis_steps_parse_comma_separated() {
        let cli = Cli::try_parse_from(["tirefit", "fit", "--axis-steps", "2,3,1,4,5,6"]).unwrap();
        let Command::Fit(args) = cli.command else {
            panic!("expected fit");
        };
        assert_eq!(args.axis_steps, Some(vec![2, 3, 1, 4, 5, 6]));
        assert!(Cli::try_parse_from(["tirefit", "fit", "--axis-steps", "2,3", "--steps", "4"]).is_err());
    }
}
