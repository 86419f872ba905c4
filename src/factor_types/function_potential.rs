use std::fmt::{Debug, Display};

use super::factor_trait::Factor;

type PotentialFn = Box<dyn Fn(&[usize]) -> f64>;

// Potential given as an arbitrary function of the assignment
pub struct FunctionPotential {
    arity: Option<usize>,
    function: PotentialFn,
}

impl FunctionPotential {
    pub fn new(function: impl Fn(&[usize]) -> f64 + 'static) -> Self {
        FunctionPotential {
            arity: None,
            function: Box::new(function),
        }
    }

    // Same as `new`, but the factor graph rejects scopes of any other arity
    pub fn with_arity(arity: usize, function: impl Fn(&[usize]) -> f64 + 'static) -> Self {
        FunctionPotential {
            arity: Some(arity),
            function: Box::new(function),
        }
    }
}

impl Factor for FunctionPotential {
    fn arity(&self) -> Option<usize> {
        self.arity
    }

    fn value(&self, assignment: &[usize], _domain_sizes: &[usize]) -> f64 {
        (self.function)(assignment)
    }
}

impl Display for FunctionPotential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.arity {
            Some(arity) => write!(f, "function(arity {})", arity),
            None => write!(f, "function"),
        }
    }
}

impl Debug for FunctionPotential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FunctionPotential({})", self)
    }
}
