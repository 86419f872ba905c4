use std::fmt::Display;

use log::debug;

use crate::{errors::GraphError, factor_graph::graph_description::DiscreteVariable};

use super::{
    factor_trait::{Factor, FactorModel},
    function_potential::FunctionPotential,
    function_table::FunctionTable,
    log_potential::LogPotential,
    potts::Potts,
    uniform_constant::UniformConstant,
};

// Formats a slice as space-separated values
pub fn vec_to_string<T: Display>(values: &[T]) -> String {
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// The ways a discrete potential can be supplied.
#[derive(Debug)]
pub enum Potential {
    Table(FunctionTable),
    Potts(Potts),
    Uniform(UniformConstant),
    Function(FunctionPotential),
}

macro_rules! match_potential_action {
    ($potential:ident, $potential_match:ident, $action:expr) => {
        match $potential {
            Potential::Table($potential_match) => $action,
            Potential::Potts($potential_match) => $action,
            Potential::Uniform($potential_match) => $action,
            Potential::Function($potential_match) => $action,
        }
    };
}

impl Potential {
    pub fn table(value: Vec<f64>) -> Self {
        Potential::Table(FunctionTable::new(value))
    }

    pub fn potts(value_equal: f64, value_different: f64) -> Self {
        Potential::Potts(Potts::new(value_equal, value_different))
    }

    pub fn uniform(value: f64) -> Self {
        Potential::Uniform(UniformConstant::new(value))
    }

    pub fn function(function: impl Fn(&[usize]) -> f64 + 'static) -> Self {
        Potential::Function(FunctionPotential::new(function))
    }
}

impl Factor for Potential {
    fn arity(&self) -> Option<usize> {
        match_potential_action!(self, potential, potential.arity())
    }

    fn value(&self, assignment: &[usize], domain_sizes: &[usize]) -> f64 {
        match_potential_action!(self, potential, potential.value(assignment, domain_sizes))
    }

    fn check_scope(&self, name: &str, domain_sizes: &[usize]) -> Result<(), GraphError> {
        match_potential_action!(self, potential, potential.check_scope(name, domain_sizes))
    }
}

impl Display for Potential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match_potential_action!(self, potential, potential.fmt(f))
    }
}

/// A potential bound to the domains of its neighbors, kept as its precomputed log-potential.
#[derive(Debug)]
pub struct DiscreteFactor {
    log_potential: LogPotential,
    domain_sizes: Vec<usize>,
}

impl DiscreteFactor {
    // Log-potential of a full assignment, floored at `LOG_EPSILON` for non-positive scores
    pub fn log_potential(&self, assignment: &[usize]) -> f64 {
        self.log_potential.log_value(assignment)
    }

    // Domain sizes of the neighboring variables, in neighbor order
    pub fn domain_sizes(&self) -> &[usize] {
        &self.domain_sizes
    }

    pub fn arity(&self) -> usize {
        self.domain_sizes.len()
    }
}

impl FactorModel<DiscreteVariable> for Potential {
    type Bound = DiscreteFactor;

    fn bind(self, name: &str, scope: &[&DiscreteVariable]) -> Result<DiscreteFactor, GraphError> {
        let domain_sizes: Vec<usize> = scope
            .iter()
            .map(|variable| variable.domain_size())
            .collect();
        self.check_scope(name, &domain_sizes)?;

        debug!(
            "Binding factor {} ({}) to domains {:?}",
            name, self, domain_sizes
        );
        let log_potential = LogPotential::new(&self, &domain_sizes);

        Ok(DiscreteFactor {
            log_potential,
            domain_sizes,
        })
    }
}
