//! Hyperfine multiplet submodel.
//!
//! Parameters, in order: `Al, Au, Bl, Bu, Cl, Cu, centroid, FWHMG, FWHML, scale`
//! (`l` = lower level, `u` = upper level). Line amplitudes are fixed by the
//! Racah intensities, so only `scale` sets the overall height.

use super::{Parameter, Submodel};
use crate::error::HfsError;
use crate::math::pseudo_voigt;
use crate::physics::hyperfine::{self, Transition};

const AL: usize = 0;
const AU: usize = 1;
const BL: usize = 2;
const BU: usize = 3;
const CL: usize = 4;
const CU: usize = 5;
const CENTROID: usize = 6;
const FWHMG: usize = 7;
const FWHML: usize = 8;
const SCALE: usize = 9;

/// Initial values for the multiplet.
#[derive(Debug, Clone, PartialEq)]
pub struct HfsInit {
    pub spin: f64,
    /// `[J_lower, J_upper]`
    pub j: [f64; 2],
    pub a: [f64; 2],
    pub b: [f64; 2],
    pub c: [f64; 2],
    pub centroid: f64,
    pub fwhm_gaussian: f64,
    pub fwhm_lorentzian: f64,
    pub scale: f64,
}

#[derive(Debug, Clone)]
pub struct HfsModel {
    name: String,
    lines: Vec<Transition>,
    params: Vec<Parameter>,
}

impl HfsModel {
    /// Build the multiplet with Racah intensities.
    ///
    /// Fails when no dipole line connects the two levels.
    pub fn new(name: impl Into<String>, init: &HfsInit) -> Result<Self, HfsError> {
        let name = name.into();
        let [jl, ju] = init.j;
        let lines = hyperfine::transitions(init.spin, jl, ju);
        if lines.is_empty() {
            return Err(HfsError::Parameter(format!(
                "no allowed transitions between J = {jl} and J = {ju} for spin {}",
                init.spin
            )));
        }

        let mut params = vec![
            Parameter::free("Al", init.a[0]),
            Parameter::free("Au", init.a[1]),
            Parameter::free("Bl", init.b[0]),
            Parameter::free("Bu", init.b[1]),
            Parameter::free("Cl", init.c[0]),
            Parameter::free("Cu", init.c[1]),
            Parameter::free("centroid", init.centroid),
            Parameter::non_negative("FWHMG", init.fwhm_gaussian),
            Parameter::non_negative("FWHML", init.fwhm_lorentzian),
            Parameter::non_negative("scale", init.scale),
        ];

        // A constant that cannot shift any level has no effect on the model.
        let spin = init.spin;
        for (idx, j) in [(BL, jl), (BU, ju)] {
            if !hyperfine::has_quadrupole(spin, j) {
                fix(&name, &mut params[idx], "quadrupole", spin, j);
            }
        }
        for (idx, j) in [(CL, jl), (CU, ju)] {
            if !hyperfine::has_octupole(spin, j) {
                fix(&name, &mut params[idx], "octupole", spin, j);
            }
        }

        log::debug!("{name}: {} hyperfine components", lines.len());
        Ok(Self {
            name,
            lines,
            params,
        })
    }

    pub fn lines(&self) -> &[Transition] {
        &self.lines
    }

    /// Line centres for a parameter vector.
    pub fn positions(&self, values: &[f64]) -> Vec<f64> {
        let lower = [values[AL], values[BL], values[CL]];
        let upper = [values[AU], values[BU], values[CU]];
        self.lines
            .iter()
            .map(|t| values[CENTROID] + t.offset(lower, upper))
            .collect()
    }
}

fn fix(model: &str, p: &mut Parameter, moment: &str, spin: f64, j: f64) {
    p.vary = false;
    if p.value != 0.0 {
        log::warn!(
            "{model}:{} = {} held fixed: no {moment} shift for I = {spin}, J = {j}",
            p.name,
            p.value
        );
    }
}

impl Submodel for HfsModel {
    fn name(&self) -> &str {
        &self.name
    }

    fn params(&self) -> &[Parameter] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [Parameter] {
        &mut self.params
    }

    fn eval_into(&self, values: &[f64], x: &[f64], out: &mut [f64]) {
        let positions = self.positions(values);
        let (fg, fl, scale) = (values[FWHMG], values[FWHML], values[SCALE]);
        for (o, xi) in out.iter_mut().zip(x) {
            *o += self
                .lines
                .iter()
                .zip(&positions)
                .map(|(t, pos)| scale * t.intensity * pseudo_voigt(xi - pos, fg, fl))
                .sum::<f64>();
        }
    }
}
