use std::fmt::Display;

use super::factor_trait::Factor;

// Potential that only depends on whether all arguments agree
#[derive(Debug, Clone, PartialEq)]
pub struct Potts {
    value_equal: f64,
    value_different: f64,
}

impl Potts {
    pub fn new(value_equal: f64, value_different: f64) -> Self {
        Potts {
            value_equal,
            value_different,
        }
    }
}

impl Factor for Potts {
    fn arity(&self) -> Option<usize> {
        None
    }

    fn value(&self, assignment: &[usize], _domain_sizes: &[usize]) -> f64 {
        if assignment.windows(2).all(|w| w[0] == w[1]) {
            self.value_equal
        } else {
            self.value_different
        }
    }
}

impl Display for Potts {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "potts(equal: {}, different: {})",
            self.value_equal, self.value_different
        )
    }
}
