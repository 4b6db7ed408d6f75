//! Parameter declaration parser.
//!
//! Turns a free-form block such as
//!
//! ```text
//! spin = 1.5
//! J = [0.5, 0.5]
//! A = [953.7, 102.6]
//! ```
//!
//! into a validated [`HyperfineParams`]. Values are evaluated by the restricted
//! language in [`expr`]; the set of names is closed.

use std::collections::BTreeMap;

use crate::domain::HyperfineParams;
use crate::error::HfsError;

pub mod expr;

pub use expr::{Assignment, Value, parse_block};

/// Every name a declaration block must bind.
pub const PARAM_NAMES: [&str; 10] = [
    "spin", "J", "A", "B", "C", "FWHMG", "FWHML", "centroid", "bkg", "scale",
];

/// Declaration block used when the user does not supply one.
pub const DEFAULT_PARAMS: &str = "spin = 1.5
J = [0.5, 0.5]
A = [953.7, 102.6]
B = [0, 0]
C = [0.5, 1.5]
FWHMG = 220
FWHML = 20
centroid = 250
bkg = 7
scale = 60";

/// Largest nuclear spin or level J accepted. Known nuclei stay below 10.
pub const MAX_ANGULAR_MOMENTUM: f64 = 50.0;

/// Number of atomic levels (lower, upper) the per-level arrays describe.
const LEVELS: usize = 2;

/// Parse and validate a parameter declaration block.
pub fn parse_parameters(text: &str) -> Result<HyperfineParams, HfsError> {
    let mut bound: BTreeMap<&'static str, Value> = BTreeMap::new();

    for stmt in parse_block(text)? {
        let Some(&name) = PARAM_NAMES.iter().find(|n| **n == stmt.name) else {
            return Err(HfsError::Parameter(format!(
                "line {}: unknown parameter '{}' (expected one of: {})",
                stmt.line,
                stmt.name,
                PARAM_NAMES.join(", ")
            )));
        };
        // Later assignments replace earlier ones.
        bound.insert(name, stmt.value);
    }

    let missing: Vec<&str> = PARAM_NAMES
        .iter()
        .copied()
        .filter(|n| !bound.contains_key(n))
        .collect();
    if !missing.is_empty() {
        return Err(HfsError::Parameter(format!(
            "missing required parameter(s): {}",
            missing.join(", ")
        )));
    }

    let params = HyperfineParams {
        spin: scalar(&bound, "spin")?,
        j: sequence(&bound, "J")?,
        a: sequence(&bound, "A")?,
        b: sequence(&bound, "B")?,
        c: sequence(&bound, "C")?,
        fwhm_gaussian: scalar(&bound, "FWHMG")?,
        fwhm_lorentzian: scalar(&bound, "FWHML")?,
        centroid: scalar(&bound, "centroid")?,
        background: scalar(&bound, "bkg")?,
        scale: scalar(&bound, "scale")?,
    };

    validate(&params)?;
    Ok(params)
}

fn scalar(bound: &BTreeMap<&'static str, Value>, name: &str) -> Result<f64, HfsError> {
    match bound.get(name) {
        Some(Value::Scalar(v)) => Ok(*v),
        Some(Value::Sequence(_)) => Err(HfsError::Parameter(format!(
            "'{name}' must be a number, not a sequence"
        ))),
        None => Err(HfsError::Parameter(format!("missing required parameter(s): {name}"))),
    }
}

fn sequence(bound: &BTreeMap<&'static str, Value>, name: &str) -> Result<Vec<f64>, HfsError> {
    match bound.get(name) {
        Some(Value::Sequence(v)) => Ok(v.clone()),
        Some(Value::Scalar(_)) => Err(HfsError::Parameter(format!(
            "'{name}' must be a sequence with one value per level, e.g. {name} = [lower, upper]"
        ))),
        None => Err(HfsError::Parameter(format!("missing required parameter(s): {name}"))),
    }
}

fn is_half_integer(v: f64) -> bool {
    v >= 0.0 && ((2.0 * v) - (2.0 * v).round()).abs() < 1e-9
}

fn validate(p: &HyperfineParams) -> Result<(), HfsError> {
    let all = [p.spin, p.fwhm_gaussian, p.fwhm_lorentzian, p.centroid, p.background, p.scale];
    if all
        .iter()
        .chain(p.j.iter())
        .chain(p.a.iter())
        .chain(p.b.iter())
        .chain(p.c.iter())
        .any(|v| !v.is_finite())
    {
        return Err(HfsError::Parameter("all parameter values must be finite".into()));
    }

    let lens = [p.j.len(), p.a.len(), p.b.len(), p.c.len()];
    if lens.iter().any(|&n| n != lens[0]) {
        return Err(HfsError::Parameter(format!(
            "J, A, B and C must have equal length (got {}, {}, {}, {})",
            lens[0], lens[1], lens[2], lens[3]
        )));
    }
    if lens[0] != LEVELS {
        return Err(HfsError::Parameter(format!(
            "J, A, B and C need exactly {LEVELS} values (lower, upper level), got {}",
            lens[0]
        )));
    }

    if !is_half_integer(p.spin) {
        return Err(HfsError::Parameter(format!(
            "spin must be a non-negative multiple of 1/2, got {}",
            p.spin
        )));
    }
    if let Some(j) = p.j.iter().find(|j| !is_half_integer(**j)) {
        return Err(HfsError::Parameter(format!(
            "J values must be non-negative multiples of 1/2, got {j}"
        )));
    }
    if let Some(v) = std::iter::once(&p.spin)
        .chain(p.j.iter())
        .find(|v| **v > MAX_ANGULAR_MOMENTUM)
    {
        return Err(HfsError::Parameter(format!(
            "spin and J must not exceed {MAX_ANGULAR_MOMENTUM}, got {v}"
        )));
    }
    if p.fwhm_gaussian < 0.0 || p.fwhm_lorentzian < 0.0 {
        return Err(HfsError::Parameter("FWHMG and FWHML must be >= 0".into()));
    }
    if p.fwhm_gaussian + p.fwhm_lorentzian <= 0.0 {
        return Err(HfsError::Parameter("FWHMG and FWHML cannot both be zero".into()));
    }
    if p.scale <= 0.0 {
        return Err(HfsError::Parameter(format!("scale must be > 0, got {}", p.scale)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_block_parses() {
        let p = parse_parameters(DEFAULT_PARAMS).unwrap();
        assert_eq!(p.spin, 1.5);
        assert_eq!(p.j, vec![0.5, 0.5]);
        assert_eq!(p.a, vec![953.7, 102.6]);
        assert_eq!(p.b, vec![0.0, 0.0]);
        assert_eq!(p.c, vec![0.5, 1.5]);
        assert_eq!(p.fwhm_gaussian, 220.0);
        assert_eq!(p.fwhm_lorentzian, 20.0);
        assert_eq!(p.centroid, 250.0);
        assert_eq!(p.background, 7.0);
        assert_eq!(p.scale, 60.0);
    }

    #[test]
    fn inline_statements_give_equal_length_levels() {
        let text = "spin = 1.5; J = [0.5, 0.5]; A = [953.7, 102.6]\n\
                    B = [0, 0]; C = [0.5, 1.5]; FWHMG = 220; FWHML = 20\n\
                    centroid = 250; bkg = 7; scale = 60";
        let p = parse_parameters(text).unwrap();
        assert_eq!(p.spin, 1.5);
        assert_eq!(p.j.len(), 2);
        assert_eq!(p.a.len(), 2);
        assert_eq!(p.b.len(), 2);
        assert_eq!(p.c.len(), 2);
    }

    #[test]
    fn missing_scale_is_parameter_error() {
        let text = DEFAULT_PARAMS.replace("scale = 60", "");
        match parse_parameters(&text) {
            Err(HfsError::Parameter(msg)) => assert!(msg.contains("scale"), "{msg}"),
            other => panic!("expected ParameterError, got {other:?}"),
        }
    }

    #[test]
    fn unknown_names_are_rejected() {
        let text = format!("{DEFAULT_PARAMS}\nimport_os = 1");
        assert!(matches!(parse_parameters(&text), Err(HfsError::Parameter(_))));
    }

    #[test]
    fn last_assignment_wins() {
        let text = format!("{DEFAULT_PARAMS}\nscale = 80");
        assert_eq!(parse_parameters(&text).unwrap().scale, 80.0);
    }

    #[test]
    fn shape_and_range_checks() {
        let uneven = DEFAULT_PARAMS.replace("A = [953.7, 102.6]", "A = [953.7]");
        assert!(parse_parameters(&uneven).is_err());

        let scalar_j = DEFAULT_PARAMS.replace("J = [0.5, 0.5]", "J = 0.5");
        assert!(parse_parameters(&scalar_j).is_err());

        let seq_spin = DEFAULT_PARAMS.replace("spin = 1.5", "spin = [1.5]");
        assert!(parse_parameters(&seq_spin).is_err());

        let bad_spin = DEFAULT_PARAMS.replace("spin = 1.5", "spin = 1.3");
        assert!(parse_parameters(&bad_spin).is_err());

        let neg_scale = DEFAULT_PARAMS.replace("scale = 60", "scale = -1");
        assert!(parse_parameters(&neg_scale).is_err());

        let zero_width = DEFAULT_PARAMS
            .replace("FWHMG = 220", "FWHMG = 0")
            .replace("FWHML = 20", "FWHML = 0");
        assert!(parse_parameters(&zero_width).is_err());
    }

    #[test]
    fn huge_angular_momenta_are_rejected() {
        let big_spin = DEFAULT_PARAMS.replace("spin = 1.5", "spin = 1e6");
        match parse_parameters(&big_spin) {
            Err(HfsError::Parameter(msg)) => assert!(msg.contains("must not exceed"), "{msg}"),
            other => panic!("expected ParameterError, got {other:?}"),
        }

        let big_j = DEFAULT_PARAMS.replace("J = [0.5, 0.5]", "J = [0.5, 1e12]");
        assert!(matches!(parse_parameters(&big_j), Err(HfsError::Parameter(_))));

        let edge = DEFAULT_PARAMS.replace("spin = 1.5", "spin = 50");
        assert!(parse_parameters(&edge).is_ok());
    }

    #[test]
    fn deeply_nested_value_is_parameter_error() {
        let text = DEFAULT_PARAMS.replace("scale = 60", &format!("scale = {}60", "-".repeat(100_000)));
        assert!(matches!(parse_parameters(&text), Err(HfsError::Parameter(_))));
    }

    #[test]
    fn fractions_are_accepted_for_spins() {
        let text = DEFAULT_PARAMS
            .replace("spin = 1.5", "spin = 3/2")
            .replace("J = [0.5, 0.5]", "J = [1/2, 3/2]");
        let p = parse_parameters(&text).unwrap();
        assert_eq!(p.spin, 1.5);
        assert_eq!(p.j, vec![0.5, 1.5]);
    }
}
