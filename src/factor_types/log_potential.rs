use crate::numeric::{cartesian::assignments, log_space::LOG_EPSILON};

use super::factor_trait::Factor;

// Log of a potential value, with non-positive values replaced by the `LOG_EPSILON` floor
pub fn floored_ln(value: f64) -> f64 {
    if value > 0. {
        value.ln()
    } else {
        LOG_EPSILON
    }
}

// Precomputed log-potential over every assignment of a factor's scope,
// stored in the same row-major order as `FunctionTable`
#[derive(Debug, Clone, PartialEq)]
pub struct LogPotential {
    strides: Vec<usize>,
    values: Vec<f64>,
}

impl LogPotential {
    pub fn new<F: Factor + ?Sized>(factor: &F, domain_sizes: &[usize]) -> Self {
        let mut strides = vec![1; domain_sizes.len()];
        for index in (0..domain_sizes.len().saturating_sub(1)).rev() {
            strides[index] = strides[index + 1] * domain_sizes[index + 1];
        }

        let values = assignments(domain_sizes)
            .iter()
            .map(|assignment| floored_ln(factor.value(assignment, domain_sizes)))
            .collect();

        LogPotential { strides, values }
    }

    pub fn log_value(&self, assignment: &[usize]) -> f64 {
        let index: usize = assignment
            .iter()
            .zip(self.strides.iter())
            .map(|(label, stride)| label * stride)
            .sum();
        self.values[index]
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
