//! Command-line parsing for the hyperfine fitter.
//!
//! The goal of this module is to keep **argument parsing** and **command dispatch**
//! separate from the physics/fitting code.
//!
//! Physical constants are taken as text and parsed by the core, so a typo
//! surfaces as an input validation error naming the field rather than a clap
//! usage error. Every constant may also come from the environment (or `.env`).

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{
    ConstantInputs, DEFAULT_APPLIED_VOLTAGE, DEFAULT_ATOMIC_MASS_UNIT, DEFAULT_BEAM_MODE,
    DEFAULT_FREQ_OFFSET, DEFAULT_ION_MASS, FitOptions,
};

pub mod picker;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "hfs",
    version,
    about = "Doppler-corrected hyperfine-structure fitting for collinear beam spectroscopy"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fit a measurement file, print the report, and optionally plot/export.
    Fit(FitArgs),
    /// Plot a previously exported curve JSON.
    Plot(PlotArgs),
    /// Write a synthetic measurement file from a parameter block.
    Simulate(SimulateArgs),
    /// Launch the interactive TUI.
    ///
    /// This uses the same underlying pipeline as `hfs fit`, but renders results
    /// in a terminal UI using Ratatui.
    Tui(TuiArgs),
}

/// Physical constants and beam geometry (all parsed by the core).
#[derive(Debug, Args, Clone)]
pub struct ConstantArgs {
    /// Laser frequency offset subtracted after the Doppler correction.
    #[arg(long, env = "HFS_FREQ_OFFSET", default_value = DEFAULT_FREQ_OFFSET, allow_hyphen_values = true)]
    pub freq_offset: String,

    /// Atomic mass unit (kg).
    #[arg(long = "mu", env = "HFS_MU", default_value = DEFAULT_ATOMIC_MASS_UNIT, allow_hyphen_values = true)]
    pub atomic_mass_unit: String,

    /// Ion mass number (u).
    #[arg(long = "mion", env = "HFS_MION", default_value = DEFAULT_ION_MASS, allow_hyphen_values = true)]
    pub ion_mass_number: String,

    /// Applied acceleration voltage (kV).
    #[arg(long = "voltage", env = "HFS_VOLTAGE", default_value = DEFAULT_APPLIED_VOLTAGE, allow_hyphen_values = true)]
    pub applied_voltage: String,

    /// Beam geometry: `co` or `anti`.
    #[arg(long = "mode", env = "HFS_MODE", default_value = DEFAULT_BEAM_MODE)]
    pub beam_mode: String,
}

impl ConstantArgs {
    pub fn to_inputs(&self) -> ConstantInputs {
        ConstantInputs {
            freq_offset: self.freq_offset.clone(),
            atomic_mass_unit: self.atomic_mass_unit.clone(),
            ion_mass_number: self.ion_mass_number.clone(),
            applied_voltage: self.applied_voltage.clone(),
            beam_mode: self.beam_mode.clone(),
        }
    }
}

/// Options for fitting a measurement file.
#[derive(Debug, Parser, Clone)]
pub struct FitArgs {
    /// Measurement file. When omitted, pick one interactively.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Parameter declaration file (`name = value` lines). Defaults to the built-in block.
    #[arg(long, env = "HFS_PARAMS", value_name = "FILE")]
    pub params: Option<PathBuf>,

    #[command(flatten)]
    pub constants: ConstantArgs,

    /// Disable the terminal plot.
    #[arg(long)]
    pub no_plot: bool,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Write an SVG overlay of data and fit.
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,

    /// Export the corrected spectrum to CSV.
    #[arg(long, value_name = "PATH")]
    pub export: Option<PathBuf>,

    /// Export curve (constants + params + fitted grid) to JSON.
    #[arg(long = "export-curve", value_name = "PATH")]
    pub export_curve: Option<PathBuf>,

    /// Maximum Levenberg–Marquardt iterations.
    #[arg(long, default_value_t = FitOptions::default().max_iter)]
    pub max_iter: usize,

    /// Show the N points with the largest weighted residuals.
    #[arg(long, default_value_t = 0)]
    pub residuals: usize,
}

/// Options for plotting a saved curve.
#[derive(Debug, Parser)]
pub struct PlotArgs {
    /// Curve JSON file produced by `hfs fit --export-curve`.
    #[arg(long, value_name = "JSON")]
    pub curve: PathBuf,

    /// Plot width (columns).
    #[arg(long, default_value_t = 100)]
    pub width: usize,

    /// Plot height (rows).
    #[arg(long, default_value_t = 25)]
    pub height: usize,

    /// Also write an SVG overlay.
    #[arg(long, value_name = "PATH")]
    pub svg: Option<PathBuf>,
}

/// Options for generating synthetic data.
#[derive(Debug, Parser)]
pub struct SimulateArgs {
    /// Output measurement file.
    #[arg(short = 'o', long = "output", value_name = "FILE")]
    pub output: PathBuf,

    /// Parameter declaration file used as the truth.
    #[arg(long, env = "HFS_PARAMS", value_name = "FILE")]
    pub params: Option<PathBuf>,

    #[command(flatten)]
    pub constants: ConstantArgs,

    /// Number of scan steps.
    #[arg(long, default_value_t = 200)]
    pub points: usize,

    /// Random seed for Poisson counts.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Lowest retardation offset (V). Requires `--scan-max`.
    #[arg(long, requires = "scan_max", allow_hyphen_values = true)]
    pub scan_min: Option<f64>,

    /// Highest retardation offset (V). Requires `--scan-min`.
    #[arg(long, requires = "scan_min", allow_hyphen_values = true)]
    pub scan_max: Option<f64>,

    /// Laser frequency in the file's raw unit.
    #[arg(long)]
    pub raw_frequency: Option<f64>,

    /// Write the exact model instead of Poisson counts.
    #[arg(long)]
    pub no_noise: bool,
}

/// Options for the interactive panel.
#[derive(Debug, Parser, Clone)]
pub struct TuiArgs {
    /// Measurement file to preselect.
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Parameter declaration file.
    #[arg(long, env = "HFS_PARAMS", value_name = "FILE")]
    pub params: Option<PathBuf>,

    #[command(flatten)]
    pub constants: ConstantArgs,

    /// Maximum Levenberg–Marquardt iterations.
    #[arg(long, default_value_t = FitOptions::default().max_iter)]
    pub max_iter: usize,
}
