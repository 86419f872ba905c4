use std::fmt::Display;

use crate::errors::GraphError;

// Interface for discrete potential functions
pub trait Factor: Display {
    // Returns the arity this potential is defined for, `None` if it accepts any arity
    fn arity(&self) -> Option<usize>;

    // Returns the number of entries a complete function table over the given domains has
    fn function_table_len(&self, domain_sizes: &[usize]) -> usize {
        domain_sizes.iter().product()
    }

    // Returns the non-negative compatibility score of a full assignment,
    // one value index per variable in neighbor order
    fn value(&self, assignment: &[usize], domain_sizes: &[usize]) -> f64;

    // Checks that this potential can be evaluated over variables with the given domain sizes
    fn check_scope(&self, name: &str, domain_sizes: &[usize]) -> Result<(), GraphError> {
        match self.arity() {
            Some(arity) if arity != domain_sizes.len() => Err(GraphError::ScopeMismatch {
                factor: name.to_string(),
                expected: arity,
                actual: domain_sizes.len(),
            }),
            _ => Ok(()),
        }
    }
}

// Interface for factor payloads that need to know their neighbors before inference starts
// (neighbor order is fixed only once the factor graph is normalized)
pub trait FactorModel<V>: Sized {
    type Bound;

    // Consumes the raw factor description and produces its computable form,
    // `scope` holds the neighboring variables in neighbor order
    fn bind(self, name: &str, scope: &[&V]) -> Result<Self::Bound, GraphError>;
}
