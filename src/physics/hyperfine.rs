//! Hyperfine level energies and Racah line intensities.
//!
//! A level with electronic angular momentum `J` coupled to nuclear spin `I`
//! splits into `F = |I − J| … I + J`. With `K = F(F+1) − I(I+1) − J(J+1)` the
//! shift of each `F` is linear in the coupling constants:
//!
//! ```text
//! E(F) = A·kA(F) + B·kB(F) + C·kC(F)
//! ```
//!
//! where the quadrupole (`B`) and octupole (`C`) coefficients vanish when the
//! level cannot carry the moment (`I, J < 1` resp. `I, J < 3/2`).
//!
//! Relative line strengths of `F_l → F_u` follow the Racah formula
//! `(2F_l + 1)(2F_u + 1) · {F_u F_l 1; J_l J_u I}²`.

use wigner_symbols::Wigner6j;

/// Twice a half-integer quantum number, as used by the 6j routines.
fn twice(v: f64) -> i32 {
    (2.0 * v).round() as i32
}

/// Allowed total angular momenta `F` for spin `I` and level `J`, ascending.
pub fn f_values(spin: f64, j: f64) -> Vec<f64> {
    let ti = twice(spin);
    let tj = twice(j);
    let lo = (ti - tj).abs();
    let hi = ti + tj;
    (lo..=hi).step_by(2).map(|tf| f64::from(tf) / 2.0).collect()
}

/// Coefficients `(kA, kB, kC)` of the level shift for one `F`.
pub fn energy_coefficients(spin: f64, j: f64, f: f64) -> [f64; 3] {
    let ii = spin * (spin + 1.0);
    let jj = j * (j + 1.0);
    let k = f * (f + 1.0) - ii - jj;

    let ka = k / 2.0;

    let kb = if spin >= 1.0 && j >= 1.0 {
        let denom = 2.0 * spin * (2.0 * spin - 1.0) * j * (2.0 * j - 1.0);
        (0.75 * k * (k + 1.0) - ii * jj) / denom
    } else {
        0.0
    };

    let kc = if spin >= 1.5 && j >= 1.5 {
        let denom = spin * (spin - 1.0) * (2.0 * spin - 1.0) * j * (j - 1.0) * (2.0 * j - 1.0);
        let num = 1.25 * k.powi(3) + 5.0 * k * k + k * (ii + jj + 3.0 - 3.0 * ii * jj) - 5.0 * ii * jj;
        num / denom
    } else {
        0.0
    };

    [ka, kb, kc]
}

/// Whether the level can carry a quadrupole (`B`) moment.
pub fn has_quadrupole(spin: f64, j: f64) -> bool {
    spin >= 1.0 && j >= 1.0
}

/// Whether the level can carry an octupole (`C`) moment.
pub fn has_octupole(spin: f64, j: f64) -> bool {
    spin >= 1.5 && j >= 1.5
}

/// Level shift of `F` for coupling constants `A`, `B`, `C`.
pub fn level_energy(spin: f64, j: f64, f: f64, a: f64, b: f64, c: f64) -> f64 {
    let [ka, kb, kc] = energy_coefficients(spin, j, f);
    a * ka + b * kb + c * kc
}

/// Unnormalised Racah strength of the `F_l → F_u` line.
pub fn racah_intensity(spin: f64, j_lower: f64, j_upper: f64, f_lower: f64, f_upper: f64) -> f64 {
    if !dipole_allowed(f_lower, f_upper) || !dipole_allowed(j_lower, j_upper) {
        return 0.0;
    }
    let w: f64 = Wigner6j {
        tj1: twice(f_upper),
        tj2: twice(f_lower),
        tj3: 2,
        tj4: twice(j_lower),
        tj5: twice(j_upper),
        tj6: twice(spin),
    }
    .value()
    .into();
    (2.0 * f_lower + 1.0) * (2.0 * f_upper + 1.0) * w * w
}

fn dipole_allowed(lower: f64, upper: f64) -> bool {
    let d = (twice(upper) - twice(lower)).abs();
    d <= 2 && !(twice(upper) == 0 && twice(lower) == 0)
}

/// One hyperfine component of the multiplet.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transition {
    pub f_lower: f64,
    pub f_upper: f64,
    /// Racah strength relative to the strongest component (max = 1).
    pub intensity: f64,
    /// Shift coefficients of the lower level.
    pub lower: [f64; 3],
    /// Shift coefficients of the upper level.
    pub upper: [f64; 3],
}

impl Transition {
    /// Line position relative to the centroid.
    pub fn offset(&self, lower_abc: [f64; 3], upper_abc: [f64; 3]) -> f64 {
        let e = |k: [f64; 3], abc: [f64; 3]| k[0] * abc[0] + k[1] * abc[1] + k[2] * abc[2];
        e(self.upper, upper_abc) - e(self.lower, lower_abc)
    }
}

/// All non-zero components between the lower and upper level.
///
/// Returns an empty list when no dipole line connects the two levels.
pub fn transitions(spin: f64, j_lower: f64, j_upper: f64) -> Vec<Transition> {
    let mut out = Vec::new();
    for f_lower in f_values(spin, j_lower) {
        for f_upper in f_values(spin, j_upper) {
            let s = racah_intensity(spin, j_lower, j_upper, f_lower, f_upper);
            if s <= 1e-14 {
                continue;
            }
            out.push(Transition {
                f_lower,
                f_upper,
                intensity: s,
                lower: energy_coefficients(spin, j_lower, f_lower),
                upper: energy_coefficients(spin, j_upper, f_upper),
            });
        }
    }

    let max = out.iter().map(|t| t.intensity).fold(0.0_f64, f64::max);
    if max > 0.0 {
        for t in &mut out {
            t.intensity /= max;
        }
    }
    out
}
