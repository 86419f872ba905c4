use std::fmt::Display;

use super::factor_trait::Factor;

// Potential with the same value for every assignment (carries no information)
#[derive(Debug, Clone, PartialEq)]
pub struct UniformConstant {
    value: f64,
}

impl UniformConstant {
    pub fn new(value: f64) -> Self {
        UniformConstant { value }
    }
}

impl Factor for UniformConstant {
    fn arity(&self) -> Option<usize> {
        None
    }

    fn value(&self, _assignment: &[usize], _domain_sizes: &[usize]) -> f64 {
        self.value
    }
}

impl Display for UniformConstant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "uniform({})", self.value)
    }
}
