//! Read/write curve JSON files.
//!
//! Curve JSON is the "portable" representation of a fit:
//! - constants, beam mode and fitted parameters
//! - goodness-of-fit statistics
//! - the corrected data and a precomputed fitted grid for quick plotting
//!
//! The schema is defined by `domain::CurveFile`.

use std::fs::File;
use std::path::Path;

use crate::app::pipeline::RunOutput;
use crate::domain::{CurveFile, CurveGrid};
use crate::error::HfsError;

/// Assemble the curve file for a finished run.
pub fn curve_file(run: &RunOutput) -> CurveFile {
    CurveFile {
        tool: "hfs".to_string(),
        generated: chrono::Utc::now(),
        source_file: run.source_name.clone(),
        beam_mode: run.constants.beam_mode,
        constants: run.constants,
        parameters: run.fit.parameters.clone(),
        statistics: run.fit.statistics.clone(),
        data: CurveGrid {
            x: run.spectrum.x.clone(),
            y: run.spectrum.y.clone(),
        },
        grid: run.curve.clone(),
    }
}

/// Write a curve JSON file.
pub fn write_curve_json(path: &Path, curve: &CurveFile) -> Result<(), HfsError> {
    let file = File::create(path)
        .map_err(|e| HfsError::Io(format!("Failed to create curve JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, curve)
        .map_err(|e| HfsError::Io(format!("Failed to write curve JSON: {e}")))?;
    log::info!("wrote curve JSON to '{}'", path.display());
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, HfsError> {
    let file = File::open(path).map_err(|e| {
        HfsError::DataFormat(format!("Failed to open curve JSON '{}': {e}", path.display()))
    })?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| HfsError::DataFormat(format!("Invalid curve JSON: {e}")))?;
    if curve.grid.x.len() != curve.grid.y.len() || curve.data.x.len() != curve.data.y.len() {
        return Err(HfsError::DataFormat(
            "curve JSON has mismatched x/y lengths".into(),
        ));
    }
    Ok(curve)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BeamMode, ConstantInputs, FitStatistics, ParameterEstimate};

    #[test]
    fn write_then_read_keeps_grid() {
        let constants = ConstantInputs::default().parse().unwrap();
        let n = 1000;
        let curve = CurveFile {
            tool: "hfs".into(),
            generated: chrono::Utc::now(),
            source_file: "scan.dat".into(),
            beam_mode: BeamMode::Co,
            constants,
            parameters: vec![ParameterEstimate {
                name: "bkg_fitdata:p0".into(),
                value: 7.1,
                stderr: Some(0.2),
                init: 7.0,
                vary: true,
            }],
            statistics: FitStatistics {
                ndata: 10,
                nvarys: 1,
                nfev: 4,
                iterations: 2,
                chisqr: 9.0,
                redchi: 1.0,
                aic: 1.0,
                bic: 1.3,
            },
            data: CurveGrid {
                x: vec![0.0, 1.0],
                y: vec![7.0, 8.0],
            },
            grid: CurveGrid {
                x: (0..n).map(|i| i as f64).collect(),
                y: vec![7.1; n],
            },
        };

        let path = std::env::temp_dir().join("beam_hfs_curve_roundtrip.json");
        write_curve_json(&path, &curve).unwrap();
        let back = read_curve_json(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        assert_eq!(back.grid.x.len(), n);
        assert_eq!(back.grid.y.len(), n);
        assert_eq!(back.beam_mode, BeamMode::Co);
        assert_eq!(back.parameters[0].stderr, Some(0.2));
    }

    #[test]
    fn missing_curve_is_data_format_error() {
        let path = std::env::temp_dir().join("beam_hfs_no_such_curve.json");
        assert!(matches!(read_curve_json(&path), Err(HfsError::DataFormat(_))));
    }
}
