//! Synthetic measurement files.
//!
//! A fixed laser frequency is scanned across the multiplet by stepping the
//! retardation offset: each offset gives a β, the lab frequency is moved into
//! the rest frame, and the counts are drawn from a Poisson distribution around
//! the model at that frequency.
//!
//! Without explicit settings the laser frequency is chosen so that offset 0
//! lands on the centroid, and the scan covers `centroid ± DEFAULT_HALF_SPAN`.

use std::fs;
use std::path::Path;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Poisson;

use crate::domain::{
    CorrectedSpectrum, HyperfineParams, MeasurementRecord, MeasurementRow, PhysicalConstants,
};
use crate::error::HfsError;
use crate::io::records::MIN_ROWS;
use crate::models::build_source;
use crate::physics::doppler::{
    FREQUENCY_SCALE, beta, beta_for_shift, correct_spectrum, inverse_doppler_shift, offset_for_beta,
};

/// Half-width (MHz) of the default scan around the centroid.
pub const DEFAULT_HALF_SPAN: f64 = 3000.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulateConfig {
    pub points: usize,
    pub seed: u64,
    /// Retardation offset range `(min, max)`; derived from the centroid if unset.
    pub scan: Option<(f64, f64)>,
    /// Laser (lab-frame) frequency in the file's raw unit; derived if unset.
    pub raw_frequency: Option<f64>,
    /// Draw Poisson counts (otherwise write the exact model).
    pub noise: bool,
}

impl Default for SimulateConfig {
    fn default() -> Self {
        Self {
            points: 200,
            seed: 42,
            scan: None,
            raw_frequency: None,
            noise: true,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simulation {
    pub record: MeasurementRecord,
    pub spectrum: CorrectedSpectrum,
    pub raw_frequency: f64,
    pub scan: (f64, f64),
}

pub fn simulate(
    params: &HyperfineParams,
    constants: &PhysicalConstants,
    config: &SimulateConfig,
) -> Result<Simulation, HfsError> {
    if config.points < MIN_ROWS {
        return Err(HfsError::input(
            "points",
            format!("need at least {MIN_ROWS} points, got {}", config.points),
        ));
    }

    let mode = constants.beam_mode;
    let raw_frequency = match config.raw_frequency {
        Some(f) if f.is_finite() && f > 0.0 => f,
        Some(f) => return Err(HfsError::input("raw_frequency", format!("must be > 0, got {f}"))),
        None => {
            let rest = (params.centroid + constants.freq_offset) / FREQUENCY_SCALE;
            inverse_doppler_shift(rest, beta(0.0, constants)?, mode)
        }
    };

    let scan = match config.scan {
        Some((lo, hi)) if lo.is_finite() && hi.is_finite() && hi > lo => (lo, hi),
        Some((lo, hi)) => {
            return Err(HfsError::input("scan", format!("invalid range [{lo}, {hi}]")));
        }
        None => {
            let offset_at = |x: f64| {
                let rest = (x + constants.freq_offset) / FREQUENCY_SCALE;
                offset_for_beta(beta_for_shift(raw_frequency, rest, mode), constants)
            };
            let a = offset_at(params.centroid - DEFAULT_HALF_SPAN)?;
            let b = offset_at(params.centroid + DEFAULT_HALF_SPAN)?;
            (a.min(b), a.max(b))
        }
    };

    let n = config.points;
    let step = (scan.1 - scan.0) / (n - 1) as f64;
    let mut rows: Vec<MeasurementRow> = (0..n)
        .map(|i| MeasurementRow {
            retardation_offset: scan.0 + step * i as f64,
            counts: 0.0,
            raw_frequency,
        })
        .collect();

    let mut record = MeasurementRecord {
        rows: rows.clone(),
        lines_read: n,
        rows_dropped: 0,
    };
    let mut spectrum = correct_spectrum(&record, constants)?;
    spectrum.y = vec![1.0; n];
    let expected = build_source(&spectrum, params)?.evaluate(&spectrum.x);

    let mut rng = StdRng::seed_from_u64(config.seed);
    for (row, lambda) in rows.iter_mut().zip(&expected) {
        row.counts = if !config.noise {
            *lambda
        } else if *lambda > 0.0 {
            let dist = Poisson::new(*lambda)
                .map_err(|e| HfsError::Fit(format!("Poisson rate {lambda}: {e}")))?;
            dist.sample(&mut rng)
        } else {
            0.0
        };
    }

    spectrum.y = rows.iter().map(|r| r.counts).collect();
    record.rows = rows;

    log::info!(
        "simulated {n} rows: offsets [{:.4}, {:.4}] V, laser {raw_frequency}",
        scan.0,
        scan.1
    );

    Ok(Simulation {
        record,
        spectrum,
        raw_frequency,
        scan,
    })
}

/// Render a simulation in the measurement file layout read by `io::records`.
pub fn format_measurement_file(sim: &Simulation, constants: &PhysicalConstants) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# synthetic scan: {} rows, mode {}, laser {}\n",
        sim.record.len(),
        constants.beam_mode,
        sim.raw_frequency
    ));
    out.push_str(&format!(
        "# applied voltage {} kV, m_ion {}, freq offset {}\n",
        constants.applied_voltage, constants.ion_mass_number, constants.freq_offset
    ));
    out.push_str("offset_V step scan counts beta frequency_MHz x_MHz\n");

    for (i, row) in sim.record.rows.iter().enumerate() {
        out.push_str(&format!(
            "{} {i} 0 {} {:.9e} {} {:.4}\n",
            row.retardation_offset, row.counts, sim.spectrum.beta[i], row.raw_frequency, sim.spectrum.x[i]
        ));
    }
    out
}

/// Write a simulation to `path`.
pub fn write_measurement_file(
    path: &Path,
    sim: &Simulation,
    constants: &PhysicalConstants,
) -> Result<(), HfsError> {
    fs::write(path, format_measurement_file(sim, constants))
        .map_err(|e| HfsError::Io(format!("failed to write '{}': {e}", path.display())))?;
    log::info!("wrote synthetic data to '{}'", path.display());
    Ok(())
}
