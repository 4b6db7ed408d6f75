//! Shared fit pipeline used by both CLI and TUI front-ends.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! parameters -> constants -> records -> Doppler correction -> model -> fit -> curve
//!
//! Each stage fails fast, so an invalid beam mode or parameter block never
//! reaches the measurement data, and a bad file never reaches the engine.
//! The CLI and the TUI can then focus on presentation (printing vs widgets).

use std::path::Path;

use crate::domain::{
    ConstantInputs, CorrectedSpectrum, CurveGrid, FitConfig, HyperfineParams, MeasurementRecord,
    PhysicalConstants,
};
use crate::error::HfsError;
use crate::fit::{FitEngine, FitResult, LevenbergMarquardt, run_fit as fit_source};
use crate::io::records::{load_records, parse_records};
use crate::models::build_source;
use crate::params::parse_parameters;
use crate::physics::doppler::correct_spectrum;

/// All computed outputs of a single fit run.
#[derive(Debug)]
pub struct RunOutput {
    pub source_name: String,
    pub constants: PhysicalConstants,
    pub params: HyperfineParams,
    pub record: MeasurementRecord,
    pub spectrum: CorrectedSpectrum,
    pub fit: FitResult,
    /// Display curve (1000 points over the data range).
    pub curve: CurveGrid,
}

impl RunOutput {
    /// Corrected data as a plottable grid.
    pub fn data_grid(&self) -> CurveGrid {
        CurveGrid {
            x: self.spectrum.x.clone(),
            y: self.spectrum.y.clone(),
        }
    }
}

/// Run the pipeline on in-memory file content.
pub fn run_pipeline(
    content: &str,
    source_name: &str,
    params_text: &str,
    constants: &ConstantInputs,
    engine: &dyn FitEngine,
) -> Result<RunOutput, HfsError> {
    let params = parse_parameters(params_text)?;
    let constants = constants.parse()?;
    let record = parse_records(content)?;
    fit_record(source_name, params, constants, record, engine)
}

/// Run the pipeline for a CLI/TUI configuration (reads the data file).
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, HfsError> {
    let params = parse_parameters(&config.params_text)?;
    let constants = config.constants.parse()?;
    let record = load_records(&config.data_path)?;
    let engine = LevenbergMarquardt::new(config.fit);
    fit_record(&display_name(&config.data_path), params, constants, record, &engine)
}

/// File name shown in titles and reports.
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn fit_record(
    source_name: &str,
    params: HyperfineParams,
    constants: PhysicalConstants,
    record: MeasurementRecord,
    engine: &dyn FitEngine,
) -> Result<RunOutput, HfsError> {
    let spectrum = correct_spectrum(&record, &constants)?;
    let source = build_source(&spectrum, &params)?;
    let fit = fit_source(source, engine)?;
    let curve = fit.curve();

    Ok(RunOutput {
        source_name: source_name.to_string(),
        constants,
        params,
        record,
        spectrum,
        fit,
        curve,
    })
}
