//! Shared domain types.
//!
//! These types are intentionally kept lightweight and serializable so they can be:
//!
//! - used in-memory during correction and fitting
//! - exported to JSON/CSV
//! - reloaded later for plotting

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::HfsError;

/// Default laser frequency offset (Hz-equivalent).
pub const DEFAULT_FREQ_OFFSET: &str = "508332000.0";
/// Default atomic mass unit (kg).
pub const DEFAULT_ATOMIC_MASS_UNIT: &str = "1.660538921e-27";
/// Default ion mass number (amu).
pub const DEFAULT_ION_MASS: &str = "20.99765446";
/// Default applied acceleration voltage (kV).
pub const DEFAULT_APPLIED_VOLTAGE: &str = "19.9195";
/// Default beam geometry.
pub const DEFAULT_BEAM_MODE: &str = "co";

/// Number of points in the sampled fit curve used for display and export.
pub const CURVE_POINTS: usize = 1000;

/// Laser/ion beam geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BeamMode {
    /// Laser co-propagating with the ions (observed frequency is blue-shifted).
    Co,
    /// Laser counter-propagating ("anti") with the ions.
    Anti,
}

impl BeamMode {
    pub fn as_str(self) -> &'static str {
        match self {
            BeamMode::Co => "co",
            BeamMode::Anti => "anti",
        }
    }

    /// The opposite geometry (used to undo a correction).
    pub fn swapped(self) -> Self {
        match self {
            BeamMode::Co => BeamMode::Anti,
            BeamMode::Anti => BeamMode::Co,
        }
    }
}

impl FromStr for BeamMode {
    type Err = HfsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "co" => Ok(BeamMode::Co),
            "anti" => Ok(BeamMode::Anti),
            other => Err(HfsError::InvalidMode(other.to_string())),
        }
    }
}

impl fmt::Display for BeamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One usable line of the measurement file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeasurementRow {
    /// Retardation voltage offset (V), token 0.
    pub retardation_offset: f64,
    /// Observed counts, token 3.
    pub counts: f64,
    /// Raw laser frequency (MHz), token 5.
    pub raw_frequency: f64,
}

/// All usable rows of one measurement file, in file order.
#[derive(Debug, Clone)]
pub struct MeasurementRecord {
    pub rows: Vec<MeasurementRow>,
    /// Data lines seen after the three skipped header lines.
    pub lines_read: usize,
    /// Lines dropped for having fewer than the required number of fields.
    pub rows_dropped: usize,
}

impl MeasurementRecord {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn counts(&self) -> Vec<f64> {
        self.rows.iter().map(|r| r.counts).collect()
    }
}

/// Raw text of the physical-constant inputs, as typed by the user.
///
/// Parsing is deferred to [`ConstantInputs::parse`] so every front end reports
/// the same validation errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantInputs {
    pub freq_offset: String,
    pub atomic_mass_unit: String,
    pub ion_mass_number: String,
    pub applied_voltage: String,
    pub beam_mode: String,
}

impl Default for ConstantInputs {
    fn default() -> Self {
        Self {
            freq_offset: DEFAULT_FREQ_OFFSET.to_string(),
            atomic_mass_unit: DEFAULT_ATOMIC_MASS_UNIT.to_string(),
            ion_mass_number: DEFAULT_ION_MASS.to_string(),
            applied_voltage: DEFAULT_APPLIED_VOLTAGE.to_string(),
            beam_mode: DEFAULT_BEAM_MODE.to_string(),
        }
    }
}

impl ConstantInputs {
    /// Validate and convert every field.
    ///
    /// Numeric fields are checked first (`InputValidation`), then the beam
    /// mode (`InvalidMode`).
    pub fn parse(&self) -> Result<PhysicalConstants, HfsError> {
        let freq_offset = parse_field("freq_offset", &self.freq_offset)?;
        let atomic_mass_unit = parse_field("m_u", &self.atomic_mass_unit)?;
        let ion_mass_number = parse_field("m_ion", &self.ion_mass_number)?;
        let applied_voltage = parse_field("appl_V", &self.applied_voltage)?;
        let beam_mode = self.beam_mode.parse::<BeamMode>()?;

        Ok(PhysicalConstants {
            freq_offset,
            atomic_mass_unit,
            ion_mass_number,
            applied_voltage,
            beam_mode,
        })
    }
}

fn parse_field(field: &str, raw: &str) -> Result<f64, HfsError> {
    let v = raw
        .trim()
        .parse::<f64>()
        .map_err(|e| HfsError::input(field, format!("'{}': {e}", raw.trim())))?;
    if !v.is_finite() {
        return Err(HfsError::input(field, format!("'{}' is not finite", raw.trim())));
    }
    Ok(v)
}

/// Validated physical constants for one fit invocation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PhysicalConstants {
    /// Laser frequency offset subtracted after correction (Hz-equivalent).
    pub freq_offset: f64,
    /// Atomic mass unit (kg).
    pub atomic_mass_unit: f64,
    /// Ion mass in atomic mass units.
    pub ion_mass_number: f64,
    /// Acceleration voltage (kV).
    pub applied_voltage: f64,
    pub beam_mode: BeamMode,
}

/// Initial hyperfine model parameters, as declared by the user.
///
/// Per-level vectors are ordered `[lower, upper]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperfineParams {
    pub spin: f64,
    pub j: Vec<f64>,
    pub a: Vec<f64>,
    pub b: Vec<f64>,
    pub c: Vec<f64>,
    pub fwhm_gaussian: f64,
    pub fwhm_lorentzian: f64,
    pub centroid: f64,
    pub background: f64,
    pub scale: f64,
}

/// Rest-frame spectrum ready for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectedSpectrum {
    /// Offset-subtracted rest-frame frequency.
    pub x: Vec<f64>,
    /// Observed counts.
    pub y: Vec<f64>,
    /// Per-row velocity fraction used for the correction.
    pub beta: Vec<f64>,
}

impl CorrectedSpectrum {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    pub fn x_range(&self) -> Option<(f64, f64)> {
        min_max(&self.x)
    }

    pub fn y_range(&self) -> Option<(f64, f64)> {
        min_max(&self.y)
    }

    pub fn beta_range(&self) -> Option<(f64, f64)> {
        min_max(&self.beta)
    }
}

fn min_max(values: &[f64]) -> Option<(f64, f64)> {
    let mut it = values.iter().copied().filter(|v| v.is_finite());
    let first = it.next()?;
    Some(it.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
}

/// Fitting engine settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitOptions {
    /// Maximum number of Levenberg–Marquardt iterations.
    pub max_iter: usize,
    /// Relative χ² change below which the fit is converged.
    pub ftol: f64,
    /// Relative parameter step below which the fit is converged.
    pub xtol: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iter: 500,
            ftol: 1e-10,
            xtol: 1e-10,
        }
    }
}

/// One fitted (or fixed) parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterEstimate {
    /// Fully-qualified name, e.g. `HFS_fitdata:Al`.
    pub name: String,
    pub value: f64,
    /// Standard error; `None` for fixed parameters or a singular covariance.
    pub stderr: Option<f64>,
    pub init: f64,
    pub vary: bool,
}

/// Goodness-of-fit statistics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitStatistics {
    pub ndata: usize,
    pub nvarys: usize,
    pub nfev: usize,
    pub iterations: usize,
    pub chisqr: f64,
    pub redchi: f64,
    pub aic: f64,
    pub bic: f64,
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults and environment).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub data_path: PathBuf,
    /// Parameter declaration block (text, not a path).
    pub params_text: String,
    pub constants: ConstantInputs,
    pub fit: FitOptions,

    pub plot: bool,
    pub plot_width: usize,
    pub plot_height: usize,
    pub svg: Option<PathBuf>,

    pub export_spectrum: Option<PathBuf>,
    pub export_curve: Option<PathBuf>,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub generated: DateTime<Utc>,
    pub source_file: String,
    pub beam_mode: BeamMode,
    pub constants: PhysicalConstants,
    pub parameters: Vec<ParameterEstimate>,
    pub statistics: FitStatistics,
    /// Corrected data the curve was fitted to.
    pub data: CurveGrid,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn beam_mode_parses_known_values_only() {
        assert_eq!("co".parse::<BeamMode>().unwrap(), BeamMode::Co);
        assert_eq!(" anti ".parse::<BeamMode>().unwrap(), BeamMode::Anti);
        let err = "side".parse::<BeamMode>().unwrap_err();
        assert_eq!(err, HfsError::InvalidMode("side".to_string()));
        assert_eq!(BeamMode::Co.swapped(), BeamMode::Anti);
    }

    #[test]
    fn default_constants_parse() {
        let c = ConstantInputs::default().parse().unwrap();
        assert_eq!(c.beam_mode, BeamMode::Co);
        assert!((c.applied_voltage - 19.9195).abs() < 1e-12);
        assert!((c.freq_offset - 508_332_000.0).abs() < 1e-6);
    }

    #[test]
    fn bad_numeric_field_is_input_validation_error() {
        let inputs = ConstantInputs {
            ion_mass_number: "twenty".to_string(),
            ..ConstantInputs::default()
        };
        match inputs.parse() {
            Err(HfsError::InputValidation { field, .. }) => assert_eq!(field, "m_ion"),
            other => panic!("expected InputValidation, got {other:?}"),
        }

        let inputs = ConstantInputs {
            applied_voltage: "inf".to_string(),
            ..ConstantInputs::default()
        };
        assert!(matches!(inputs.parse(), Err(HfsError::InputValidation { .. })));
    }

    #[test]
    fn bad_mode_is_invalid_mode_error() {
        let inputs = ConstantInputs {
            beam_mode: "side".to_string(),
            ..ConstantInputs::default()
        };
        assert_eq!(inputs.parse().unwrap_err(), HfsError::InvalidMode("side".into()));
    }

    #[test]
    fn spectrum_ranges_ignore_non_finite() {
        let s = CorrectedSpectrum {
            x: vec![3.0, f64::NAN, -1.0, 2.0],
            y: vec![1.0, 2.0, 3.0, 4.0],
            beta: vec![0.1, 0.2, 0.3, 0.4],
        };
        assert_eq!(s.x_range(), Some((-1.0, 3.0)));
        assert_eq!(s.y_range(), Some((1.0, 4.0)));
    }
}
