pub mod errors;

pub mod numeric {
    pub mod cartesian;
    pub mod damping;
    pub mod log_space;
}

pub mod data_structures {
    pub mod jagged_arrays;
}

pub mod factor_types {
    pub mod canonical_factor;
    pub mod factor_trait;
    pub mod factor_type;
    pub mod function_potential;
    pub mod function_table;
    pub mod log_potential;
    pub mod potts;
    pub mod uniform_constant;
}

pub mod factor_graph {
    pub mod factor_graph;
    pub mod graph_description;
}

pub mod message {
    pub mod messages;
}

pub mod bp {
    pub mod discrete;
    pub mod evidence;
    pub mod gaussian;
    pub mod solver;
}

pub use bp::{
    discrete::DiscreteBP,
    gaussian::{GaussianBP, GaussianBelief},
    solver::{BeliefPropagation, RunStatus, SolverOptions},
};
pub use errors::{BpError, GraphError};
pub use factor_graph::graph_description::{
    DiscreteGraph, DiscreteVariable, GaussianGraph, GaussianVariable,
};
pub use factor_types::{canonical_factor::CanonicalFactor, factor_type::Potential};
