//! Export the corrected spectrum to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::domain::{CorrectedSpectrum, MeasurementRecord};
use crate::error::HfsError;

/// Write one row per measurement: raw inputs, β, corrected frequency, counts,
/// weight and (if given) the fitted model value.
pub fn write_spectrum_csv(
    path: &Path,
    record: &MeasurementRecord,
    spectrum: &CorrectedSpectrum,
    fitted: Option<&[f64]>,
) -> Result<(), HfsError> {
    let file = File::create(path)
        .map_err(|e| HfsError::Io(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    let mut w = BufWriter::new(file);

    writeln!(w, "retardation_offset,raw_frequency,beta,frequency,counts,weight,fit")
        .map_err(|e| HfsError::Io(format!("Failed to write export CSV header: {e}")))?;

    for (i, row) in record.rows.iter().enumerate() {
        let fit = fitted
            .and_then(|f| f.get(i))
            .map(|v| format!("{v:.6}"))
            .unwrap_or_default();
        writeln!(
            w,
            "{},{},{:.10e},{:.6},{},{:.6},{}",
            row.retardation_offset,
            row.raw_frequency,
            spectrum.beta[i],
            spectrum.x[i],
            spectrum.y[i],
            crate::models::weight(spectrum.y[i]),
            fit,
        )
        .map_err(|e| HfsError::Io(format!("Failed to write export CSV row: {e}")))?;
    }

    w.flush()
        .map_err(|e| HfsError::Io(format!("Failed to flush export CSV: {e}")))?;
    log::info!("wrote {} rows to '{}'", record.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MeasurementRow;

    #[test]
    fn writes_header_and_one_line_per_row() {
        let record = MeasurementRecord {
            rows: (0..4)
                .map(|i| MeasurementRow {
                    retardation_offset: i as f64,
                    counts: 4.0,
                    raw_frequency: 509.06,
                })
                .collect(),
            lines_read: 4,
            rows_dropped: 0,
        };
        let spectrum = CorrectedSpectrum {
            x: vec![1.0, 2.0, 3.0, 4.0],
            y: vec![4.0; 4],
            beta: vec![1.4e-3; 4],
        };
        let path = std::env::temp_dir().join("beam_hfs_export_test.csv");
        write_spectrum_csv(&path, &record, &spectrum, Some(&[3.5, 3.6, 3.7, 3.8])).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let _ = std::fs::remove_file(&path);

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert!(lines[0].starts_with("retardation_offset,"));
        assert!(lines[1].ends_with(",0.500000,3.500000"));
    }
}
