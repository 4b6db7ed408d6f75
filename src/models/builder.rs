//! Assemble the fit model from a corrected spectrum and parameter set.

use super::hfs::{HfsInit, HfsModel};
use super::polynomial::Polynomial;
use super::Source;
use crate::domain::{CorrectedSpectrum, HyperfineParams};
use crate::error::HfsError;

/// Name of the single data source.
pub const SOURCE_NAME: &str = "fitdata";

/// Residual weight for an observed count.
///
/// `1/sqrt(v)` for positive counts; zero or negative counts get weight 1.
/// This is only an approximation of Poisson uncertainty at low counts.
pub fn weight(v: f64) -> f64 {
    if v > 0.0 { 1.0 / v.sqrt() } else { 1.0 }
}

/// Build `HFS_fitdata + bkg_fitdata` over the corrected spectrum.
pub fn build_source(
    spectrum: &CorrectedSpectrum,
    params: &HyperfineParams,
) -> Result<Source, HfsError> {
    let init = HfsInit {
        spin: params.spin,
        j: pair(&params.j, "J")?,
        a: pair(&params.a, "A")?,
        b: pair(&params.b, "B")?,
        c: pair(&params.c, "C")?,
        centroid: params.centroid,
        fwhm_gaussian: params.fwhm_gaussian,
        fwhm_lorentzian: params.fwhm_lorentzian,
        scale: params.scale,
    };

    let mut source = Source::new(SOURCE_NAME, spectrum.x.clone(), spectrum.y.clone())?;
    source.add_model(Box::new(HfsModel::new(format!("HFS_{SOURCE_NAME}"), &init)?));
    source.add_model(Box::new(Polynomial::new(
        format!("bkg_{SOURCE_NAME}"),
        &[params.background],
    )));
    Ok(source)
}

fn pair(v: &[f64], name: &str) -> Result<[f64; 2], HfsError> {
    match v {
        [lower, upper] => Ok([*lower, *upper]),
        _ => Err(HfsError::Parameter(format!(
            "{name} needs exactly 2 values (lower, upper level), got {}",
            v.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{DEFAULT_PARAMS, parse_parameters};

    fn spectrum() -> CorrectedSpectrum {
        let x: Vec<f64> = (0..50).map(|i| -2500.0 + 100.0 * i as f64).collect();
        let y = vec![7.0; x.len()];
        CorrectedSpectrum {
            beta: vec![1.4e-3; x.len()],
            x,
            y,
        }
    }

    #[test]
    fn weight_floor() {
        assert!((weight(4.0) - 0.5).abs() < 1e-12);
        assert_eq!(weight(0.0), 1.0);
        assert_eq!(weight(-3.0), 1.0);
    }

    #[test]
    fn builds_named_submodels() {
        let p = parse_parameters(DEFAULT_PARAMS).unwrap();
        let s = build_source(&spectrum(), &p).unwrap();
        assert_eq!(s.name, "fitdata");
        let names: Vec<String> = s.parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names.len(), 11);
        assert_eq!(names[0], "HFS_fitdata:Al");
        assert_eq!(names[6], "HFS_fitdata:centroid");
        assert_eq!(names[10], "bkg_fitdata:p0");
        assert_eq!(s.values()[10], 7.0);
        assert_eq!(s.values()[9], 60.0);
    }

    #[test]
    fn background_dominates_far_from_lines() {
        let p = parse_parameters(DEFAULT_PARAMS).unwrap();
        let s = build_source(&spectrum(), &p).unwrap();
        let far = s.evaluate(&[1e6]);
        assert!((far[0] - 7.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_wrong_level_count() {
        let mut p = parse_parameters(DEFAULT_PARAMS).unwrap();
        p.j = vec![0.5];
        assert!(matches!(build_source(&spectrum(), &p), Err(HfsError::Parameter(_))));
    }
}
