//! Drive one fit and package the result.
//!
//! `run_fit` hands the source to a [`FitEngine`], writes the best-fit values
//! back into the source, computes the goodness-of-fit statistics and renders
//! the text report. On any engine failure nothing is produced.

use crate::domain::{CURVE_POINTS, CurveGrid, FitStatistics, ParameterEstimate};
use crate::error::HfsError;
use crate::models::Source;
use crate::report::format_fit_report;

use super::engine::FitEngine;

/// Fitted model plus everything needed to present it.
#[derive(Debug)]
pub struct FitResult {
    pub source: Source,
    pub method: String,
    pub statistics: FitStatistics,
    pub parameters: Vec<ParameterEstimate>,
    pub report: String,
}

impl FitResult {
    /// Fitted model value at a single frequency.
    pub fn evaluate(&self, x: f64) -> f64 {
        self.source.evaluate(&[x])[0]
    }

    /// `n` evenly spaced points over the data range (n is raised to 2).
    pub fn sample_curve(&self, n: usize) -> CurveGrid {
        let n = n.max(2);
        let (lo, hi) = data_range(&self.source.x);
        let step = (hi - lo) / (n - 1) as f64;
        let mut x: Vec<f64> = (0..n).map(|i| lo + step * i as f64).collect();
        // Pin the last point to the exact maximum.
        x[n - 1] = hi;
        let y = self.source.evaluate(&x);
        CurveGrid { x, y }
    }

    /// Display curve at the default resolution.
    pub fn curve(&self) -> CurveGrid {
        self.sample_curve(CURVE_POINTS)
    }

    /// Fitted model at each data point.
    pub fn fitted(&self) -> Vec<f64> {
        self.source.evaluate(&self.source.x)
    }

    /// Look up a fitted parameter by full name.
    pub fn parameter(&self, name: &str) -> Option<&ParameterEstimate> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

fn data_range(x: &[f64]) -> (f64, f64) {
    let lo = x.iter().cloned().fold(f64::INFINITY, f64::min);
    let hi = x.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    (lo, hi)
}

/// Fit `source` with `engine`.
pub fn run_fit(mut source: Source, engine: &dyn FitEngine) -> Result<FitResult, HfsError> {
    let initial = source.parameters();
    let outcome = engine.fit(&source)?;

    if outcome.values.len() != initial.len() || outcome.stderr.len() != initial.len() {
        return Err(HfsError::Fit(format!(
            "engine returned {} values for {} parameters",
            outcome.values.len(),
            initial.len()
        )));
    }
    if !outcome.chisqr.is_finite() || outcome.values.iter().any(|v| !v.is_finite()) {
        return Err(HfsError::Fit("engine returned non-finite results".into()));
    }

    source.set_values(&outcome.values);

    let parameters: Vec<ParameterEstimate> = initial
        .into_iter()
        .zip(outcome.values.iter().zip(&outcome.stderr))
        .map(|((name, p), (value, stderr))| ParameterEstimate {
            name,
            value: *value,
            stderr: *stderr,
            init: p.value,
            vary: p.vary,
        })
        .collect();

    let statistics = statistics(
        source.len(),
        parameters.iter().filter(|p| p.vary).count(),
        outcome.chisqr,
        outcome.nfev,
        outcome.iterations,
    );

    let method = engine.method().to_string();
    let report = format_fit_report(&source.name, &method, &statistics, &parameters);
    log::info!(
        "fit converged: chisqr {:.4} redchi {:.4} after {} evaluations",
        statistics.chisqr,
        statistics.redchi,
        statistics.nfev
    );

    Ok(FitResult {
        source,
        method,
        statistics,
        parameters,
        report,
    })
}

/// χ², reduced χ², AIC and BIC for a weighted least-squares fit.
pub fn statistics(
    ndata: usize,
    nvarys: usize,
    chisqr: f64,
    nfev: usize,
    iterations: usize,
) -> FitStatistics {
    let nfree = ndata.saturating_sub(nvarys).max(1);
    let n = ndata.max(1) as f64;
    // Floor keeps the log finite for exact fits.
    let neg2_log_like = n * (chisqr.max(1e-250) / n).ln();
    FitStatistics {
        ndata,
        nvarys,
        nfev,
        iterations,
        chisqr,
        redchi: chisqr / nfree as f64,
        aic: neg2_log_like + 2.0 * nvarys as f64,
        bic: neg2_log_like + n.ln() * nvarys as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fit::engine::FitOutcome;
    use crate::models::Polynomial;

    /// Returns fixed values without looking at the data.
    struct Canned(Vec<f64>);

    impl FitEngine for Canned {
        fn method(&self) -> &str {
            "canned"
        }

        fn fit(&self, source: &Source) -> Result<FitOutcome, HfsError> {
            let chisqr = if self.0.len() == source.values().len() {
                source.residuals_with(&self.0).iter().map(|r| r * r).sum()
            } else {
                0.0
            };
            Ok(FitOutcome {
                values: self.0.clone(),
                stderr: vec![Some(0.1); self.0.len()],
                chisqr,
                nfev: 3,
                iterations: 1,
            })
        }
    }

    struct Failing;

    impl FitEngine for Failing {
        fn method(&self) -> &str {
            "failing"
        }

        fn fit(&self, _source: &Source) -> Result<FitOutcome, HfsError> {
            Err(HfsError::Fit("boom".into()))
        }
    }

    fn source() -> Source {
        let x = vec![-10.0, -5.0, 0.0, 5.0, 10.0];
        let y = x.iter().map(|v| 3.0 + 0.5 * v).collect();
        let mut s = Source::new("fitdata", x, y).unwrap();
        s.add_model(Box::new(Polynomial::new("bkg_fitdata", &[1.0, 0.0])));
        s
    }

    #[test]
    fn result_carries_values_and_report() {
        let r = run_fit(source(), &Canned(vec![3.0, 0.5])).unwrap();
        assert!(r.statistics.chisqr < 1e-20);
        assert_eq!(r.statistics.ndata, 5);
        assert_eq!(r.statistics.nvarys, 2);
        let p0 = r.parameter("bkg_fitdata:p0").unwrap();
        assert_eq!(p0.value, 3.0);
        assert_eq!(p0.init, 1.0);
        assert!(r.report.contains("bkg_fitdata:p0"));
        assert!(r.report.contains("canned"));
        assert!((r.evaluate(2.0) - 4.0).abs() < 1e-12);
    }

    #[test]
    fn sample_curve_spans_data_range() {
        let r = run_fit(source(), &Canned(vec![3.0, 0.5])).unwrap();
        let c = r.sample_curve(1000);
        assert_eq!(c.x.len(), 1000);
        assert_eq!(c.y.len(), 1000);
        assert_eq!(c.x[0], -10.0);
        assert_eq!(c.x[999], 10.0);
        assert!(c.x.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(r.sample_curve(0).x.len(), 2);
    }

    #[test]
    fn engine_failure_produces_nothing() {
        assert!(matches!(run_fit(source(), &Failing), Err(HfsError::Fit(_))));
    }

    #[test]
    fn wrong_value_count_is_rejected() {
        assert!(matches!(
            run_fit(source(), &Canned(vec![3.0])),
            Err(HfsError::Fit(_))
        ));
    }

    #[test]
    fn information_criteria() {
        let s = statistics(100, 4, 50.0, 10, 3);
        assert!((s.redchi - 50.0 / 96.0).abs() < 1e-12);
        let base = 100.0 * (0.5f64).ln();
        assert!((s.aic - (base + 8.0)).abs() < 1e-9);
        assert!((s.bic - (base + 100f64.ln() * 4.0)).abs() < 1e-9);
    }
}
