use log::debug;
use ndarray::{Array1, Array2};

use crate::{errors::GraphError, factor_graph::graph_description::GaussianVariable};

use super::factor_trait::FactorModel;

/// Joint Gaussian potential over a factor's neighbors in canonical (information) form.
/// Row/column `i` of the precision matrix belongs to the `i`-th neighbor.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalFactor {
    precision: Array2<f64>,
    mean: Array1<f64>,
    information: Array1<f64>, // precision * mean, filled in when the factor is bound
}

impl CanonicalFactor {
    pub fn new(precision: Array2<f64>, mean: Array1<f64>) -> Self {
        CanonicalFactor {
            precision,
            mean,
            information: Array1::zeros(0),
        }
    }

    // Single-variable factor N(mean, variance), e.g. a prior or a noisy measurement
    pub fn unary(mean: f64, variance: f64) -> Self {
        CanonicalFactor::new(
            Array2::from_elem((1, 1), 1. / variance),
            Array1::from_elem(1, mean),
        )
    }

    pub fn precision(&self) -> &Array2<f64> {
        &self.precision
    }

    pub fn mean(&self) -> &Array1<f64> {
        &self.mean
    }

    pub fn information(&self) -> &Array1<f64> {
        &self.information
    }

    pub fn arity(&self) -> usize {
        self.mean.len()
    }
}

impl FactorModel<GaussianVariable> for CanonicalFactor {
    type Bound = CanonicalFactor;

    fn bind(
        mut self,
        name: &str,
        scope: &[&GaussianVariable],
    ) -> Result<CanonicalFactor, GraphError> {
        let arity = scope.len();
        if self.precision.dim() != (arity, arity) {
            return Err(GraphError::ScopeMismatch {
                factor: name.to_string(),
                expected: self.precision.len(),
                actual: arity * arity,
            });
        }
        if self.mean.len() != arity {
            return Err(GraphError::ScopeMismatch {
                factor: name.to_string(),
                expected: self.mean.len(),
                actual: arity,
            });
        }
        if let Some(diagonal) = self
            .precision
            .diag()
            .iter()
            .find(|value| !(value.is_finite() && **value >= 0.))
        {
            return Err(GraphError::InvalidParameter {
                node: name.to_string(),
                reason: format!(
                    "diagonal precisions must be finite and non-negative, found {}",
                    diagonal
                ),
            });
        }

        self.information = self.precision.dot(&self.mean);
        debug!(
            "Bound gaussian factor {} with arity {} and information vector {}",
            name, arity, self.information
        );
        Ok(self)
    }
}
