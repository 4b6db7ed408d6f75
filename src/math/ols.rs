//! Dense least squares helpers.
//!
//! The Levenberg–Marquardt step is posed as an augmented least-squares problem
//!
//! ```text
//! minimize ‖ [J; sqrt(λ)·D] δ − [r; 0] ‖²
//! ```
//!
//! which is tall (more rows than columns), so we solve it with SVD.
//! (Nalgebra's `QR::solve` is intended for square systems and will panic for
//! non-square matrices.)

use nalgebra::{DMatrix, DVector};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Moore–Penrose pseudo-inverse of a symmetric matrix (e.g. `JᵀJ`).
///
/// Singular values below `rel_tol · σ_max` are treated as zero.
pub fn pseudo_inverse(m: &DMatrix<f64>, rel_tol: f64) -> Option<DMatrix<f64>> {
    let svd = m.clone().svd(true, true);
    let smax = svd.singular_values.iter().cloned().fold(0.0_f64, f64::max);
    if !smax.is_finite() {
        return None;
    }
    let inv = svd.pseudo_inverse(rel_tol * smax.max(f64::MIN_POSITIVE)).ok()?;
    inv.iter().all(|v| v.is_finite()).then_some(inv)
}

/// Number of singular values above `rel_tol · σ_max`.
pub fn numerical_rank(m: &DMatrix<f64>, rel_tol: f64) -> usize {
    let sv = m.clone().singular_values();
    let smax = sv.iter().cloned().fold(0.0_f64, f64::max);
    if smax <= 0.0 {
        return 0;
    }
    sv.iter().filter(|s| **s > rel_tol * smax).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn pseudo_inverse_of_diagonal() {
        let m = DMatrix::from_row_slice(2, 2, &[4.0, 0.0, 0.0, 0.5]);
        let inv = pseudo_inverse(&m, 1e-12).unwrap();
        assert!((inv[(0, 0)] - 0.25).abs() < 1e-12);
        assert!((inv[(1, 1)] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn pseudo_inverse_drops_null_direction() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 1.0, 1.0, 1.0]);
        let inv = pseudo_inverse(&m, 1e-12).unwrap();
        // pinv of [[1,1],[1,1]] is [[1/4,1/4],[1/4,1/4]].
        for v in inv.iter() {
            assert!((v - 0.25).abs() < 1e-12);
        }
        assert_eq!(numerical_rank(&m, 1e-12), 1);
    }
}
