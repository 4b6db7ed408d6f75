//! Composite spectral model.
//!
//! A [`Source`] owns one data set and the submodels whose sum describes it.
//! Parameters are addressed by a flat vector in submodel order, so the fitting
//! engine never needs to know which submodel a value belongs to. Full names are
//! `<submodel>:<parameter>`, e.g. `HFS_fitdata:centroid`.

use crate::error::HfsError;

pub mod builder;
pub mod hfs;
pub mod polynomial;

pub use builder::*;
pub use hfs::HfsModel;
pub use polynomial::Polynomial;

/// One adjustable model parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub name: String,
    pub value: f64,
    pub vary: bool,
    pub min: f64,
    pub max: f64,
}

impl Parameter {
    pub fn free(name: &str, value: f64) -> Self {
        Self {
            name: name.to_string(),
            value,
            vary: true,
            min: f64::NEG_INFINITY,
            max: f64::INFINITY,
        }
    }

    pub fn non_negative(name: &str, value: f64) -> Self {
        Self {
            min: 0.0,
            ..Self::free(name, value)
        }
    }

    pub fn fixed(name: &str, value: f64) -> Self {
        Self {
            vary: false,
            ..Self::free(name, value)
        }
    }

    /// Clamp a candidate value into `[min, max]`.
    pub fn project(&self, v: f64) -> f64 {
        v.clamp(self.min, self.max)
    }
}

/// A term of the composite model.
///
/// `eval_into` adds the term's contribution at every `x` to `out`, using
/// `values` (same order as [`Submodel::params`]) rather than the stored values,
/// so trial points can be evaluated concurrently.
pub trait Submodel: std::fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
    fn params(&self) -> &[Parameter];
    fn params_mut(&mut self) -> &mut [Parameter];
    fn eval_into(&self, values: &[f64], x: &[f64], out: &mut [f64]);
}

/// Data set plus the submodels fitted to it.
#[derive(Debug)]
pub struct Source {
    pub name: String,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
    weights: Vec<f64>,
    submodels: Vec<Box<dyn Submodel>>,
}

impl Source {
    /// Create a source; `x` and `y` must have equal, non-zero length.
    pub fn new(name: impl Into<String>, x: Vec<f64>, y: Vec<f64>) -> Result<Self, HfsError> {
        if x.len() != y.len() {
            return Err(HfsError::Fit(format!(
                "x and y differ in length ({} vs {})",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(HfsError::Fit("cannot fit an empty spectrum".into()));
        }
        let weights = y.iter().map(|v| weight(*v)).collect();
        Ok(Self {
            name: name.into(),
            x,
            y,
            weights,
            submodels: Vec::new(),
        })
    }

    pub fn add_model(&mut self, model: Box<dyn Submodel>) {
        self.submodels.push(model);
    }

    pub fn submodels(&self) -> &[Box<dyn Submodel>] {
        &self.submodels
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Per-point weights (`weight(y_i)`).
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Every parameter with its full `<submodel>:<name>` label.
    pub fn parameters(&self) -> Vec<(String, Parameter)> {
        self.submodels
            .iter()
            .flat_map(|m| {
                m.params()
                    .iter()
                    .map(move |p| (format!("{}:{}", m.name(), p.name), p.clone()))
            })
            .collect()
    }

    /// Current parameter values, flat.
    pub fn values(&self) -> Vec<f64> {
        self.submodels
            .iter()
            .flat_map(|m| m.params().iter().map(|p| p.value))
            .collect()
    }

    /// Overwrite the stored parameter values from a flat vector.
    pub fn set_values(&mut self, values: &[f64]) {
        let mut it = values.iter();
        for m in &mut self.submodels {
            for p in m.params_mut() {
                if let Some(v) = it.next() {
                    p.value = *v;
                }
            }
        }
    }

    /// Model at `x` for a flat parameter vector.
    pub fn evaluate_with(&self, values: &[f64], x: &[f64]) -> Vec<f64> {
        let mut out = vec![0.0; x.len()];
        let mut offset = 0;
        for m in &self.submodels {
            let n = m.params().len();
            m.eval_into(&values[offset..offset + n], x, &mut out);
            offset += n;
        }
        out
    }

    /// Model at `x` for the stored parameter values.
    pub fn evaluate(&self, x: &[f64]) -> Vec<f64> {
        self.evaluate_with(&self.values(), x)
    }

    /// Weighted residuals `(y − model)·weight(y)` for a flat parameter vector.
    pub fn residuals_with(&self, values: &[f64]) -> Vec<f64> {
        let model = self.evaluate_with(values, &self.x);
        self.y
            .iter()
            .zip(&model)
            .zip(&self.weights)
            .map(|((y, m), w)| (y - m) * w)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_source() -> Source {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let y = vec![1.0, 3.0, 5.0, 7.0];
        let mut s = Source::new("line", x, y).unwrap();
        s.add_model(Box::new(Polynomial::new("bkg_line", &[1.0, 2.0])));
        s
    }

    #[test]
    fn rejects_mismatched_or_empty_data() {
        assert!(Source::new("s", vec![1.0], vec![]).is_err());
        assert!(Source::new("s", vec![], vec![]).is_err());
    }

    #[test]
    fn exact_model_has_zero_residuals() {
        let s = line_source();
        assert!(s.residuals_with(&s.values()).iter().all(|r| r.abs() < 1e-12));
    }

    #[test]
    fn residuals_are_weighted_by_counts() {
        let s = line_source();
        let r = s.residuals_with(&[0.0, 2.0]);
        // y - model = 1 everywhere; weight = 1/sqrt(y).
        for (ri, yi) in r.iter().zip(&s.y) {
            assert!((ri - 1.0 / yi.sqrt()).abs() < 1e-12);
        }
    }

    #[test]
    fn parameters_carry_full_names_and_round_trip() {
        let mut s = line_source();
        let names: Vec<String> = s.parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["bkg_line:p0", "bkg_line:p1"]);
        s.set_values(&[4.0, 5.0]);
        assert_eq!(s.values(), vec![4.0, 5.0]);
        assert_eq!(s.evaluate(&[2.0]), vec![14.0]);
    }

    #[test]
    fn projection_respects_bounds() {
        let p = Parameter::non_negative("FWHMG", 1.0);
        assert_eq!(p.project(-3.0), 0.0);
        assert_eq!(p.project(3.0), 3.0);
    }
}
