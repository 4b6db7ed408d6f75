//! Polynomial background `p0 + p1·x + …`.

use super::{Parameter, Submodel};

#[derive(Debug, Clone)]
pub struct Polynomial {
    name: String,
    params: Vec<Parameter>,
}

impl Polynomial {
    pub fn new(name: impl Into<String>, coefficients: &[f64]) -> Self {
        let params = coefficients
            .iter()
            .enumerate()
            .map(|(k, c)| Parameter::free(&format!("p{k}"), *c))
            .collect();
        Self {
            name: name.into(),
            params,
        }
    }
}

impl Submodel for Polynomial {
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
        for (o, xi) in out.iter_mut().zip(x) {
            // Horner.
            *o += values.iter().rev().fold(0.0, |acc, c| acc * xi + c);
        }
    }
}
