//! Line profiles.
//!
//! Every hyperfine component is drawn as a peak-normalised pseudo-Voigt:
//! a mixture of a Gaussian and a Lorentzian sharing one total width, with the
//! width and mixing fraction from the Thompson–Cox–Hastings approximation.
//!
//! ```text
//! f⁵ = fG⁵ + 2.69269 fG⁴fL + 2.42843 fG³fL² + 4.47163 fG²fL³ + 0.07842 fG fL⁴ + fL⁵
//! η  = 1.36603 r − 0.47719 r² + 0.11116 r³,   r = fL / f
//! V(dx) = η·L(dx; f) + (1 − η)·G(dx; f)
//! ```
//!
//! `G` and `L` are both 1 at `dx = 0` and 1/2 at `|dx| = f/2`, so the profile
//! height equals the line amplitude.

use std::f64::consts::LN_2;

/// Total FWHM and Lorentzian fraction of the pseudo-Voigt.
pub fn voigt_width(fwhm_gaussian: f64, fwhm_lorentzian: f64) -> (f64, f64) {
    let g = fwhm_gaussian.max(0.0);
    let l = fwhm_lorentzian.max(0.0);

    let f5 = g.powi(5)
        + 2.69269 * g.powi(4) * l
        + 2.42843 * g.powi(3) * l.powi(2)
        + 4.47163 * g.powi(2) * l.powi(3)
        + 0.07842 * g * l.powi(4)
        + l.powi(5);
    let f = f5.powf(0.2);
    if f <= 0.0 {
        return (0.0, 0.0);
    }

    let r = l / f;
    let eta = (1.36603 * r - 0.47719 * r * r + 0.11116 * r * r * r).clamp(0.0, 1.0);
    (f, eta)
}

/// Peak-normalised Gaussian with full width `fwhm`.
pub fn gaussian(dx: f64, fwhm: f64) -> f64 {
    (-4.0 * LN_2 * dx * dx / (fwhm * fwhm)).exp()
}

/// Peak-normalised Lorentzian with full width `fwhm`.
pub fn lorentzian(dx: f64, fwhm: f64) -> f64 {
    1.0 / (1.0 + 4.0 * dx * dx / (fwhm * fwhm))
}

/// Peak-normalised pseudo-Voigt at distance `dx` from the line centre.
pub fn pseudo_voigt(dx: f64, fwhm_gaussian: f64, fwhm_lorentzian: f64) -> f64 {
    let (f, eta) = voigt_width(fwhm_gaussian, fwhm_lorentzian);
    if f <= 0.0 {
        // Zero width: a spike only exactly on the line.
        return if dx == 0.0 { 1.0 } else { 0.0 };
    }
    eta * lorentzian(dx, f) + (1.0 - eta) * gaussian(dx, f)
}
