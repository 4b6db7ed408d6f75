//! Fitting engine capability.
//!
//! The orchestrator only needs "minimise the weighted residuals of this source
//! and tell me where you ended up". Anything that can do that (the bundled
//! Levenberg–Marquardt, or a stub in tests) implements [`FitEngine`].

use crate::error::HfsError;
use crate::models::Source;

/// Raw result of one minimisation.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutcome {
    /// Best-fit values for every parameter (fixed ones unchanged), flat.
    pub values: Vec<f64>,
    /// Standard errors, flat; `None` for fixed parameters or when the
    /// covariance could not be estimated.
    pub stderr: Vec<Option<f64>>,
    /// Sum of squared weighted residuals at `values`.
    pub chisqr: f64,
    pub nfev: usize,
    pub iterations: usize,
}

pub trait FitEngine {
    /// Short method label used in the report.
    fn method(&self) -> &str;

    /// Minimise the weighted residuals of `source`, starting from its stored
    /// parameter values.
    fn fit(&self, source: &Source) -> Result<FitOutcome, HfsError>;
}
