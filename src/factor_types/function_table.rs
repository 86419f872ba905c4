use std::fmt::Display;

use crate::errors::GraphError;

use super::{factor_trait::Factor, factor_type::vec_to_string};

// Explicit potential table in row-major order: the first neighbor varies slowest,
// matching the order in which `cartesian_product` enumerates assignments
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionTable {
    value: Vec<f64>,
}

impl FunctionTable {
    pub fn new(value: Vec<f64>) -> Self {
        FunctionTable { value }
    }

    // Computes the position of an assignment in the table
    fn table_index(assignment: &[usize], domain_sizes: &[usize]) -> usize {
        assignment
            .iter()
            .zip(domain_sizes.iter())
            .fold(0, |index, (label, domain_size)| index * domain_size + label)
    }

    pub fn len(&self) -> usize {
        self.value.len()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }
}

impl Factor for FunctionTable {
    fn arity(&self) -> Option<usize> {
        None
    }

    fn value(&self, assignment: &[usize], domain_sizes: &[usize]) -> f64 {
        self.value[Self::table_index(assignment, domain_sizes)]
    }

    fn check_scope(&self, name: &str, domain_sizes: &[usize]) -> Result<(), GraphError> {
        let expected = self.function_table_len(domain_sizes);
        if expected != self.value.len() {
            return Err(GraphError::ScopeMismatch {
                factor: name.to_string(),
                expected: self.value.len(),
                actual: expected,
            });
        }
        if let Some(entry) = self.value.iter().find(|entry| !(**entry >= 0.)) {
            return Err(GraphError::InvalidParameter {
                node: name.to_string(),
                reason: format!("potential entries must be non-negative, found {}", entry),
            });
        }
        Ok(())
    }
}

impl Display for FunctionTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", vec_to_string(&self.value))
    }
}

impl From<Vec<f64>> for FunctionTable {
    fn from(value: Vec<f64>) -> Self {
        FunctionTable::new(value)
    }
}
