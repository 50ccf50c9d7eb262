//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - loads the TOML config and applies flag overrides
//! - runs the grid search (or a single evaluation)
//! - prints reports/plots

use std::path::Path;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, EvalArgs, FitArgs, TuiArgs};
use crate::config::{FitConfig, load_from_file};
use crate::domain::PARAM_COUNT;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `tirefit` binary.
pub fn run() -> Result<(), AppError> {
    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);

    match cli.command {
        Command::Fit(args) => {
            init_tracing()?;
            handle_fit(args)
        }
        Command::Eval(args) => {
            init_tracing()?;
            handle_eval(args)
        }
        // Log lines would corrupt the alternate screen.
        Command::Tui(args) => handle_tui(args),
    }
}

/// Install the global subscriber: stderr, `RUST_LOG` filter (default `warn`),
/// pretty output unless `LOG_FORMAT=json`.
pub fn init_tracing() -> Result<(), AppError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let result = match format.as_str() {
        "json" => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
        _ => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init(),
    };

    result.map_err(|e| AppError::new(1, format!("tracing init failed: {e}")))
}

fn handle_fit(args: FitArgs) -> Result<(), AppError> {
    let mut config = load_config(args.common.config.as_deref())?;
    apply_fit_args(&mut config, &args)?;

    let run = pipeline::run_fit(&config)?;
    println!("{}", crate::report::format_run_summary(&run));

    let residuals = crate::report::compute_residuals(&run.data.context, &run.fitted)?;
    if args.table {
        println!(
            "{}",
            crate::report::format_sample_table(&residuals, config.data.angle_unit)
        );
    } else {
        let worst = crate::report::worst_lateral(&residuals, 3);
        println!("Largest lateral residuals:");
        println!(
            "{}",
            crate::report::format_sample_table(&worst, config.data.angle_unit)
        );
    }

    if !args.no_plot {
        let plots = crate::plot::render_fit_plots(
            &run.data.context,
            &config.model(),
            &run.outcome.result.best_params,
            config.data.angle_unit,
            args.width,
            args.height,
        )?;
        println!("{plots}");
    }

    Ok(())
}

fn handle_eval(args: EvalArgs) -> Result<(), AppError> {
    let config = load_config(args.common.config.as_deref())?;
    let eval = pipeline::run_eval(&config, &args.params)?;
    let residuals = crate::report::compute_residuals(&eval.data.context, &eval.output)?;

    println!(
        "{}",
        crate::report::format_eval(&eval, &residuals, config.data.angle_unit)
    );

    if !args.no_plot {
        let plots = crate::plot::render_fit_plots(
            &eval.data.context,
            &config.model(),
            &eval.params,
            config.data.angle_unit,
            args.width,
            args.height,
        )?;
        println!("{plots}");
    }
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), AppError> {
    let config = load_config(args.common.config.as_deref())?;
    crate::tui::run(config)
}

/// Load `path`, or fall back to the built-in defaults.
pub fn load_config(path: Option<&Path>) -> Result<FitConfig, AppError> {
    match path {
        Some(path) => Ok(load_from_file(path)?),
        None => Ok(FitConfig::default()),
    }
}

/// Apply `fit` flag overrides on top of a loaded config.
pub fn apply_fit_args(config: &mut FitConfig, args: &FitArgs) -> Result<(), AppError> {
    if let Some(steps) = args.steps {
        config.grid.steps = steps;
        config.grid.axis_steps = None;
    }
    if let Some(axis_steps) = &args.axis_steps {
        let steps: [usize; PARAM_COUNT] = axis_steps.as_slice().try_into().map_err(|_| {
            AppError::new(
                2,
                format!("--axis-steps needs {PARAM_COUNT} values, got {}", axis_steps.len()),
            )
        })?;
        config.grid.axis_steps = Some(steps);
    }
    if args.sequential {
        config.grid.parallel = false;
    }
    if let Some(ms) = args.max_ms {
        config.grid.max_duration_ms = Some(ms);
    }
    if let Some(w) = args.moment_weight {
        config.objective.moment = w;
    }

    let wants_synthetic =
        args.synthetic || args.seed.is_some() || args.noise_lat.is_some() || args.noise_mz.is_some();
    if wants_synthetic {
        let mut synthetic = config.data.synthetic.unwrap_or_default();
        if let Some(seed) = args.seed {
            synthetic.seed = seed;
        }
        if let Some(sigma) = args.noise_lat {
            synthetic.lateral_noise = sigma;
        }
        if let Some(sigma) = args.noise_mz {
            synthetic.moment_noise = sigma;
        }
        config.data.synthetic = Some(synthetic);
    }
    Ok(())
}

/// Rewrite argv so `tirefit` defaults to `tirefit fit`.
///
/// Rules:
/// - `tirefit`                      -> `tirefit fit`
/// - `tirefit --steps 3 ...`        -> `tirefit fit --steps 3 ...`
/// - `tirefit --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("fit".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "eval" | "tui");
    if is_subcommand {
        return argv;
    }

    // A leading flag is a `fit` flag.
    if arg1.starts_with('-') {
        argv.insert(1, "fit".to_string());
        return argv;
    }

    argv
}
