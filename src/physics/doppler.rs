//! Relativistic velocity and Doppler correction.
//!
//! For an ion of mass `m = m_u · m_ion` accelerated through
//! `U = 1000 · (V_appl − V_off)` volts, the total energy is `e·U + m·c²`, so
//!
//! ```text
//! β = sqrt(1 − (m·c²)² / (e·U + m·c²)²)
//! ```
//!
//! The measured (lab-frame) frequency is moved to the ion rest frame with
//!
//! - co-propagating:      `f_rest = f · sqrt((1 − β)/(1 + β))`
//! - counter-propagating: `f_rest = f · sqrt((1 + β)/(1 − β))`
//!
//! and finally expressed relative to the laser offset:
//! `x = f_rest · 1e6 − freq_offset`.

use crate::domain::{BeamMode, CorrectedSpectrum, MeasurementRecord, PhysicalConstants};
use crate::error::HfsError;

/// Elementary charge (C).
pub const ELEMENTARY_CHARGE: f64 = 1.60217653e-19;
/// Speed of light (m/s).
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
/// Fixed unit factor applied to raw frequencies before the offset is subtracted.
pub const FREQUENCY_SCALE: f64 = 1e6;

/// Velocity fraction β for one record.
pub fn beta(retardation_offset: f64, constants: &PhysicalConstants) -> Result<f64, HfsError> {
    let c2 = SPEED_OF_LIGHT * SPEED_OF_LIGHT;
    let rest_energy = constants.atomic_mass_unit * constants.ion_mass_number * c2;
    let kinetic = ELEMENTARY_CHARGE * 1000.0 * (constants.applied_voltage - retardation_offset);
    let total = kinetic + rest_energy;

    let radicand = 1.0 - (rest_energy * rest_energy) / (total * total);
    if !radicand.is_finite() || radicand < 0.0 {
        return Err(HfsError::PhysicsDomain(format!(
            "beta radicand {radicand:e} for applied voltage {} kV and offset {retardation_offset} V",
            constants.applied_voltage
        )));
    }

    let b = radicand.sqrt();
    if b >= 1.0 {
        return Err(HfsError::PhysicsDomain(format!(
            "beta = {b} is not below 1 for offset {retardation_offset} V"
        )));
    }
    Ok(b)
}

/// Shift a lab-frame frequency into the ion rest frame.
pub fn doppler_shift(frequency: f64, beta: f64, mode: BeamMode) -> f64 {
    match mode {
        BeamMode::Co => frequency * ((1.0 - beta) / (1.0 + beta)).sqrt(),
        BeamMode::Anti => frequency * ((1.0 + beta) / (1.0 - beta)).sqrt(),
    }
}

/// Undo [`doppler_shift`] (rest frame back to lab frame).
pub fn inverse_doppler_shift(frequency: f64, beta: f64, mode: BeamMode) -> f64 {
    doppler_shift(frequency, beta, mode.swapped())
}

/// Express a rest-frame frequency relative to the laser offset.
pub fn to_offset_frame(rest_frequency: f64, freq_offset: f64) -> f64 {
    rest_frequency * FREQUENCY_SCALE - freq_offset
}

/// Velocity fraction that maps `lab` onto `rest` for the given geometry.
///
/// Inverse of [`doppler_shift`] with respect to β.
pub fn beta_for_shift(lab: f64, rest: f64, mode: BeamMode) -> f64 {
    let r2 = (rest / lab).powi(2);
    match mode {
        BeamMode::Co => (1.0 - r2) / (1.0 + r2),
        BeamMode::Anti => (r2 - 1.0) / (r2 + 1.0),
    }
}

/// Retardation offset that produces velocity fraction `beta`.
///
/// Inverse of [`beta`] with respect to the offset.
pub fn offset_for_beta(beta: f64, constants: &PhysicalConstants) -> Result<f64, HfsError> {
    if !(0.0..1.0).contains(&beta) {
        return Err(HfsError::PhysicsDomain(format!("beta = {beta} outside [0, 1)")));
    }
    let rest_energy = constants.atomic_mass_unit
        * constants.ion_mass_number
        * SPEED_OF_LIGHT
        * SPEED_OF_LIGHT;
    let gamma_minus_one = 1.0 / (1.0 - beta * beta).sqrt() - 1.0;
    Ok(constants.applied_voltage - gamma_minus_one * rest_energy / (ELEMENTARY_CHARGE * 1000.0))
}

/// Correct every record into the rest frame.
pub fn correct_spectrum(
    record: &MeasurementRecord,
    constants: &PhysicalConstants,
) -> Result<CorrectedSpectrum, HfsError> {
    let mut x = Vec::with_capacity(record.len());
    let mut betas = Vec::with_capacity(record.len());

    for (i, row) in record.rows.iter().enumerate() {
        let b = beta(row.retardation_offset, constants)
            .map_err(|e| match e {
                HfsError::PhysicsDomain(msg) => HfsError::PhysicsDomain(format!("row {i}: {msg}")),
                other => other,
            })?;
        let rest = doppler_shift(row.raw_frequency, b, constants.beam_mode);
        x.push(to_offset_frame(rest, constants.freq_offset));
        betas.push(b);
    }

    let spectrum = CorrectedSpectrum {
        x,
        y: record.counts(),
        beta: betas,
    };
    if let Some((lo, hi)) = spectrum.beta_range() {
        log::debug!("beta range [{lo:.6e}, {hi:.6e}] ({} mode)", constants.beam_mode);
    }
    Ok(spectrum)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ConstantInputs, MeasurementRow};

    fn constants(mode: BeamMode) -> PhysicalConstants {
        let mut c = ConstantInputs::default().parse().unwrap();
        c.beam_mode = mode;
        c
    }

    #[test]
    fn beta_in_unit_interval_for_typical_beam() {
        let c = constants(BeamMode::Co);
        for off in [-50.0, -5.0, 0.0, 5.0, 10.0] {
            let b = beta(off, &c).unwrap();
            assert!(b.is_finite());
            assert!((0.0..1.0).contains(&b), "beta={b} for offset {off}");
        }
        // ~20 kV Na-21 beam: beta is about 1.4e-3.
        let b = beta(0.0, &c).unwrap();
        assert!((b - 1.4e-3).abs() < 1e-4, "beta={b}");
    }

    #[test]
    fn beta_vanishes_without_residual_energy() {
        let c = constants(BeamMode::Co);
        let b = beta(c.applied_voltage, &c).unwrap();
        assert!(b.abs() < 1e-12);
    }

    #[test]
    fn negative_radicand_is_physics_domain_error() {
        let c = constants(BeamMode::Co);
        // Offset far above the applied voltage: total energy below rest energy.
        let e = beta(c.applied_voltage + 1e6, &c).unwrap_err();
        assert!(matches!(e, HfsError::PhysicsDomain(_)));
    }

    #[test]
    fn co_then_anti_round_trips() {
        for &b in &[0.0, 1e-4, 1.4e-3, 0.3, 0.9] {
            let f = 508_332.123_456;
            let rest = doppler_shift(f, b, BeamMode::Co);
            let back = doppler_shift(rest, b, BeamMode::Anti);
            assert!(((back - f) / f).abs() < 1e-9);
            let back = inverse_doppler_shift(rest, b, BeamMode::Co);
            assert!(((back - f) / f).abs() < 1e-9);
        }
    }

    #[test]
    fn inverse_helpers_undo_forward_transforms() {
        let c = constants(BeamMode::Co);
        for off in [-0.2, 0.0, 0.1] {
            let b = beta(off, &c).unwrap();
            let back = offset_for_beta(b, &c).unwrap();
            assert!((back - off).abs() < 1e-6, "offset {off} -> {back}");
        }
        for mode in [BeamMode::Co, BeamMode::Anti] {
            let lab = 509.06;
            let rest = doppler_shift(lab, 1.4e-3, mode);
            assert!((beta_for_shift(lab, rest, mode) - 1.4e-3).abs() < 1e-12);
        }
        assert!(offset_for_beta(1.0, &c).is_err());
    }

    #[test]
    fn co_lowers_and_anti_raises_frequency() {
        let f = 500_000.0;
        assert!(doppler_shift(f, 0.01, BeamMode::Co) < f);
        assert!(doppler_shift(f, 0.01, BeamMode::Anti) > f);
        assert_eq!(doppler_shift(f, 0.0, BeamMode::Co), f);
    }

    #[test]
    fn correct_spectrum_applies_scale_and_offset() {
        let c = constants(BeamMode::Co);
        let rows: Vec<MeasurementRow> = (0..10)
            .map(|i| MeasurementRow {
                retardation_offset: -5.0 + i as f64,
                counts: 10.0 + i as f64,
                raw_frequency: 509.058 + i as f64 * 1e-4,
            })
            .collect();
        let record = MeasurementRecord {
            rows: rows.clone(),
            lines_read: 10,
            rows_dropped: 0,
        };
        let s = correct_spectrum(&record, &c).unwrap();
        assert_eq!(s.len(), 10);
        for (i, r) in rows.iter().enumerate() {
            let b = beta(r.retardation_offset, &c).unwrap();
            let expected = r.raw_frequency * ((1.0 - b) / (1.0 + b)).sqrt() * 1e6 - c.freq_offset;
            assert!((s.x[i] - expected).abs() < 1e-6);
            assert!(s.x[i] < r.raw_frequency * 1e6 - c.freq_offset);
            assert_eq!(s.y[i], r.counts);
        }
    }
}
