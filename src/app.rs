//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments (after loading `.env`)
//! - runs the fit pipeline
//! - prints reports/plots
//! - writes optional exports

use std::fs;
use std::path::Path;

use clap::Parser;

use crate::cli::{Cli, Command, FitArgs, PlotArgs, SimulateArgs, TuiArgs};
use crate::data::{SimulateConfig, simulate, write_measurement_file};
use crate::domain::{FitConfig, FitOptions};
use crate::error::HfsError;
use crate::params::{DEFAULT_PARAMS, parse_parameters};

pub mod pipeline;

/// Parse the command line.
///
/// `.env` is loaded first so environment defaults apply to every flag.
pub fn parse_cli() -> Cli {
    dotenvy::dotenv().ok();

    // We want `hfs` and `hfs --mode anti` to behave like `hfs tui ...`.
    //
    // Clap requires a subcommand name, so we do a small, explicit rewrite of the
    // argv list before parsing. This preserves a clean clap structure while
    // retaining the requested UX.
    let argv = rewrite_args(std::env::args().collect());
    Cli::parse_from(argv)
}

/// Execute a parsed command.
pub fn dispatch(cli: Cli) -> Result<(), HfsError> {
    match cli.command {
        Command::Fit(args) => handle_fit(args),
        Command::Plot(args) => handle_plot(args),
        Command::Simulate(args) => handle_simulate(args),
        Command::Tui(args) => handle_tui(args),
    }
}

fn handle_fit(args: FitArgs) -> Result<(), HfsError> {
    let config = fit_config_from_args(&args)?;
    let run = pipeline::run_fit(&config)?;

    println!("{}", crate::report::format_run_summary(&run));
    println!("{}", run.fit.report);

    if args.residuals > 0 {
        println!("{}", crate::report::format_residuals(&run.fit, args.residuals));
    }

    let title = crate::plot::plot_title(&run.source_name, run.constants.beam_mode.as_str());
    if config.plot {
        let plot = crate::plot::render_ascii_plot(
            &run.data_grid(),
            &run.curve,
            &title,
            config.plot_width,
            config.plot_height,
        );
        println!("{plot}");
    }

    // Optional exports.
    if let Some(path) = &config.svg {
        crate::plot::write_svg(path, &run.data_grid(), &run.curve, &title)?;
    }
    if let Some(path) = &config.export_spectrum {
        crate::io::write_spectrum_csv(path, &run.record, &run.spectrum, Some(run.fit.fitted().as_slice()))?;
    }
    if let Some(path) = &config.export_curve {
        crate::io::write_curve_json(path, &crate::io::curve_file(&run))?;
    }

    Ok(())
}

fn handle_plot(args: PlotArgs) -> Result<(), HfsError> {
    let curve = crate::io::read_curve_json(&args.curve)?;

    let plot = crate::plot::render_ascii_plot_from_curve_file(&curve, args.width, args.height);
    println!("{plot}");

    if let Some(path) = &args.svg {
        let title = crate::plot::plot_title(&curve.source_file, curve.beam_mode.as_str());
        crate::plot::write_svg(path, &curve.data, &curve.grid, &title)?;
    }
    Ok(())
}

fn handle_simulate(args: SimulateArgs) -> Result<(), HfsError> {
    let params = parse_parameters(&read_params_text(args.params.as_deref())?)?;
    let constants = args.constants.to_inputs().parse()?;
    let config = SimulateConfig {
        points: args.points,
        seed: args.seed,
        scan: args.scan_min.zip(args.scan_max),
        raw_frequency: args.raw_frequency,
        noise: !args.no_noise,
    };

    let sim = simulate(&params, &constants, &config)?;
    write_measurement_file(&args.output, &sim, &constants)?;
    println!(
        "Wrote {} rows to {} (offsets [{:.4}, {:.4}] V, laser {})",
        sim.record.len(),
        args.output.display(),
        sim.scan.0,
        sim.scan.1,
        sim.raw_frequency
    );
    Ok(())
}

fn handle_tui(args: TuiArgs) -> Result<(), HfsError> {
    crate::tui::run(args)
}

/// Read a parameter block file, or fall back to the built-in default block.
pub fn read_params_text(path: Option<&Path>) -> Result<String, HfsError> {
    match path {
        None => Ok(DEFAULT_PARAMS.to_string()),
        Some(p) => fs::read_to_string(p).map_err(|e| {
            HfsError::Parameter(format!("failed to read parameter file '{}': {e}", p.display()))
        }),
    }
}

pub fn fit_config_from_args(args: &FitArgs) -> Result<FitConfig, HfsError> {
    let data_path = match &args.file {
        Some(path) => crate::cli::picker::validate_data_path(path)?,
        None => crate::cli::picker::prompt_for_data_path()?,
    };

    Ok(FitConfig {
        data_path,
        params_text: read_params_text(args.params.as_deref())?,
        constants: args.constants.to_inputs(),
        fit: FitOptions {
            max_iter: args.max_iter,
            ..FitOptions::default()
        },
        plot: !args.no_plot,
        plot_width: args.width,
        plot_height: args.height,
        svg: args.svg.clone(),
        export_spectrum: args.export.clone(),
        export_curve: args.export_curve.clone(),
    })
}

/// Rewrite argv so `hfs` defaults to `hfs tui`.
///
/// Rules:
/// - `hfs`                      -> `hfs tui`
/// - `hfs --mode anti ...`      -> `hfs tui --mode anti ...`
/// - `hfs --help/--version/-h`  -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("tui".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    let is_subcommand = matches!(arg1.as_str(), "fit" | "plot" | "simulate" | "tui");
    if is_subcommand {
        return argv;
    }

    // If the first token is a flag, treat it as "tui flags".
    if arg1.starts_with('-') {
        argv.insert(1, "tui".to_string());
        return argv;
    }

    // Otherwise, leave as-is.
    argv
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn bare_invocation_opens_tui() {
        assert_eq!(rewrite_args(argv(&["hfs"])), argv(&["hfs", "tui"]));
        assert_eq!(
            rewrite_args(argv(&["hfs", "--mode", "anti"])),
            argv(&["hfs", "tui", "--mode", "anti"])
        );
    }

    #[test]
    fn subcommands_and_help_are_untouched() {
        assert_eq!(rewrite_args(argv(&["hfs", "fit", "-f", "a.dat"])), argv(&["hfs", "fit", "-f", "a.dat"]));
        assert_eq!(rewrite_args(argv(&["hfs", "--help"])), argv(&["hfs", "--help"]));
    }

    #[test]
    fn missing_params_file_is_parameter_error() {
        let p = std::env::temp_dir().join("beam_hfs_no_params.txt");
        assert!(matches!(read_params_text(Some(&p)), Err(HfsError::Parameter(_))));
        assert_eq!(read_params_text(None).unwrap(), DEFAULT_PARAMS);
    }
}
