//! Bounded Levenberg–Marquardt.
//!
//! Each iteration:
//!
//! 1. forward-difference Jacobian `J` of the weighted residuals (one column
//!    per free parameter, evaluated in parallel)
//! 2. damped step from the augmented least-squares problem
//!    `[J; sqrt(λ)·D] δ ≈ [−r; 0]` with `D = diag(‖J_k‖)`
//! 3. project the trial point into the parameter bounds; accept it if χ²
//!    drops (λ ↓), otherwise raise λ and retry
//!
//! Convergence: relative χ² decrease below `ftol`, or relative step below
//! `xtol`. Standard errors come from `(JᵀJ)⁺ · χ²/(n − k)` at the solution.

use nalgebra::{DMatrix, DVector};
use rayon::prelude::*;

use super::engine::{FitEngine, FitOutcome};
use crate::domain::FitOptions;
use crate::error::HfsError;
use crate::math::{numerical_rank, pseudo_inverse, solve_least_squares};
use crate::models::{Parameter, Source};

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-12;
const LAMBDA_MAX: f64 = 1e12;
const RANK_TOL: f64 = 1e-12;

#[derive(Debug, Clone, Default)]
pub struct LevenbergMarquardt {
    pub options: FitOptions,
}

impl LevenbergMarquardt {
    pub fn new(options: FitOptions) -> Self {
        Self { options }
    }
}

/// Free parameters of a source and how to embed them in the full vector.
struct Problem<'a> {
    source: &'a Source,
    template: Vec<f64>,
    params: Vec<Parameter>,
    free: Vec<usize>,
}

impl<'a> Problem<'a> {
    fn new(source: &'a Source) -> Self {
        let params: Vec<Parameter> = source.parameters().into_iter().map(|(_, p)| p).collect();
        let free = params
            .iter()
            .enumerate()
            .filter(|(_, p)| p.vary)
            .map(|(i, _)| i)
            .collect();
        Self {
            source,
            template: params.iter().map(|p| p.value).collect(),
            params,
            free,
        }
    }

    fn start(&self) -> Vec<f64> {
        self.free
            .iter()
            .map(|&i| self.params[i].project(self.template[i]))
            .collect()
    }

    fn project(&self, p: &mut [f64]) {
        for (v, &i) in p.iter_mut().zip(&self.free) {
            *v = self.params[i].project(*v);
        }
    }

    fn full(&self, p: &[f64]) -> Vec<f64> {
        let mut v = self.template.clone();
        for (x, &i) in p.iter().zip(&self.free) {
            v[i] = *x;
        }
        v
    }

    fn residuals(&self, p: &[f64]) -> Vec<f64> {
        self.source.residuals_with(&self.full(p))
    }

    /// Forward differences; steps that would leave the bounds go backwards.
    fn jacobian(&self, p: &[f64], r0: &[f64]) -> DMatrix<f64> {
        let n = r0.len();
        let columns: Vec<Vec<f64>> = (0..p.len())
            .into_par_iter()
            .map(|k| {
                let bound = &self.params[self.free[k]];
                let mut h = f64::EPSILON.sqrt() * p[k].abs().max(1.0);
                if p[k] + h > bound.max {
                    h = -h;
                }
                let mut trial = p.to_vec();
                trial[k] += h;
                let r = self.residuals(&trial);
                r.iter().zip(r0).map(|(a, b)| (a - b) / h).collect()
            })
            .collect();

        DMatrix::from_fn(n, p.len(), |i, k| columns[k][i])
    }
}

fn sum_sq(r: &[f64]) -> f64 {
    r.iter().map(|v| v * v).sum()
}

fn norm(v: &[f64]) -> f64 {
    sum_sq(v).sqrt()
}

impl FitEngine for LevenbergMarquardt {
    fn method(&self) -> &str {
        "leastsq (Levenberg-Marquardt)"
    }

    fn fit(&self, source: &Source) -> Result<FitOutcome, HfsError> {
        let opts = &self.options;
        let problem = Problem::new(source);
        let m = problem.free.len();

        let mut p = problem.start();
        let mut r = problem.residuals(&p);
        let mut chisqr = sum_sq(&r);
        let mut nfev = 1usize;
        if !chisqr.is_finite() {
            return Err(HfsError::Fit(
                "model is not finite at the initial parameter values".into(),
            ));
        }

        if m == 0 {
            log::warn!("no free parameters; reporting the initial model");
            return Ok(FitOutcome {
                values: problem.full(&p),
                stderr: vec![None; problem.params.len()],
                chisqr,
                nfev,
                iterations: 0,
            });
        }

        let n = r.len();
        let mut lambda = LAMBDA_INIT;
        let mut converged = false;
        let mut iterations = 0usize;

        while iterations < opts.max_iter {
            iterations += 1;
            let jac = problem.jacobian(&p, &r);
            nfev += m;

            let scale: Vec<f64> = (0..m)
                .map(|k| {
                    let c = jac.column(k).norm();
                    if c > 0.0 { c } else { 1.0 }
                })
                .collect();

            let mut accepted = None;
            while lambda <= LAMBDA_MAX {
                let mut a = DMatrix::zeros(n + m, m);
                a.view_mut((0, 0), (n, m)).copy_from(&jac);
                for k in 0..m {
                    a[(n + k, k)] = lambda.sqrt() * scale[k];
                }
                let mut b = DVector::zeros(n + m);
                for i in 0..n {
                    b[i] = -r[i];
                }

                let Some(delta) = solve_least_squares(&a, &b) else {
                    return Err(HfsError::Fit(format!(
                        "damped step could not be solved at iteration {iterations}"
                    )));
                };

                let mut trial: Vec<f64> = p.iter().zip(delta.iter()).map(|(x, d)| x + d).collect();
                problem.project(&mut trial);
                let r_trial = problem.residuals(&trial);
                nfev += 1;
                let chi_trial = sum_sq(&r_trial);

                if chi_trial.is_finite() && chi_trial < chisqr {
                    lambda = (lambda / 10.0).max(LAMBDA_MIN);
                    accepted = Some((trial, r_trial, chi_trial));
                    break;
                }
                lambda *= 10.0;
            }

            let Some((trial, r_trial, chi_trial)) = accepted else {
                // No downhill step at any damping: already at the minimum.
                converged = true;
                break;
            };

            let step: Vec<f64> = trial.iter().zip(&p).map(|(a, b)| a - b).collect();
            let rel_chi = (chisqr - chi_trial) / chisqr.max(f64::MIN_POSITIVE);
            let rel_step = norm(&step) / (norm(&p) + opts.xtol);

            log::debug!("lm iter {iterations}: chisqr {chi_trial:.6e} lambda {lambda:.1e}");
            p = trial;
            r = r_trial;
            chisqr = chi_trial;

            if rel_chi <= opts.ftol || rel_step <= opts.xtol || chisqr == 0.0 {
                converged = true;
                break;
            }
        }

        if !converged {
            return Err(HfsError::Fit(format!(
                "no convergence within {} iterations (chisqr = {chisqr:.6e})",
                opts.max_iter
            )));
        }

        let jac = problem.jacobian(&p, &r);
        nfev += m;
        let jtj = jac.transpose() * &jac;
        let nfree = n.saturating_sub(m).max(1);
        let redchi = chisqr / nfree as f64;

        let mut stderr = vec![None; problem.params.len()];
        if numerical_rank(&jtj, RANK_TOL) < m {
            log::warn!("singular covariance matrix; standard errors not estimated");
        } else if let Some(cov) = pseudo_inverse(&jtj, RANK_TOL) {
            for (k, &i) in problem.free.iter().enumerate() {
                let var = cov[(k, k)] * redchi;
                stderr[i] = (var.is_finite() && var >= 0.0).then(|| var.sqrt());
            }
        }

        Ok(FitOutcome {
            values: problem.full(&p),
            stderr,
            chisqr,
            nfev,
            iterations,
        })
    }
}
