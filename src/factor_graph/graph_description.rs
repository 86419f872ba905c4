use std::collections::HashMap;

use log::{debug, warn};

use crate::factor_types::{canonical_factor::CanonicalFactor, factor_type::Potential};

/// Suffix of the unary factor created by `DiscreteGraph::add_variable_with_prior`.
pub const PRIOR_SUFFIX: &str = "::prior";

// Stores information about a finite-valued variable (values are indices 0..domain_size)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscreteVariable {
    domain_size: usize,
}

impl DiscreteVariable {
    pub fn new(domain_size: usize) -> Self {
        DiscreteVariable { domain_size }
    }

    pub fn domain_size(&self) -> usize {
        self.domain_size
    }
}

// Stores the prior of a scalar Gaussian variable
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianVariable {
    mean: f64,
    variance: f64,
}

impl GaussianVariable {
    pub fn new(mean: f64, variance: f64) -> Self {
        GaussianVariable { mean, variance }
    }

    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn variance(&self) -> f64 {
        self.variance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Variable,
    Factor,
}

// Tagged description of a single node as supplied by the user
#[derive(Debug)]
pub enum NodeDescription<V, F> {
    Variable(V),
    Factor(F),
}

impl<V, F> NodeDescription<V, F> {
    pub fn kind(&self) -> NodeKind {
        match self {
            NodeDescription::Variable(_) => NodeKind::Variable,
            NodeDescription::Factor(_) => NodeKind::Factor,
        }
    }
}

/// Named nodes plus named edges, the raw input of factor graph normalization.
/// Nodes keep their insertion order; it becomes the order of dense node ids.
#[derive(Debug)]
pub struct GraphDescription<V, F> {
    nodes: Vec<(String, NodeDescription<V, F>)>,
    positions: HashMap<String, usize>,
    edges: Vec<(String, String)>,
}

pub type DiscreteGraph = GraphDescription<DiscreteVariable, Potential>;
pub type GaussianGraph = GraphDescription<GaussianVariable, CanonicalFactor>;

impl<V, F> GraphDescription<V, F> {
    // Creates an empty graph description
    pub fn new() -> Self {
        GraphDescription {
            nodes: Vec::new(),
            positions: HashMap::new(),
            edges: Vec::new(),
        }
    }

    // Adds a node, a repeated name overwrites the earlier description but keeps its position
    pub fn add_node(&mut self, name: &str, description: NodeDescription<V, F>) -> &mut Self {
        match self.positions.get(name) {
            Some(&position) => {
                warn!("Node {} is defined twice, keeping the last definition", name);
                self.nodes[position].1 = description;
            }
            None => {
                debug!("Add {:?} node {}", description.kind(), name);
                self.positions.insert(name.to_string(), self.nodes.len());
                self.nodes.push((name.to_string(), description));
            }
        }
        self
    }

    pub fn add_variable(&mut self, name: &str, variable: V) -> &mut Self {
        self.add_node(name, NodeDescription::Variable(variable))
    }

    pub fn add_factor(&mut self, name: &str, factor: F) -> &mut Self {
        self.add_node(name, NodeDescription::Factor(factor))
    }

    // Adds an undirected edge; names are resolved during normalization
    pub fn add_edge(&mut self, a: &str, b: &str) -> &mut Self {
        self.edges.push((a.to_string(), b.to_string()));
        self
    }

    // Adds a factor together with edges to the given variables, in this order
    // (the order fixes the position of each variable in the factor's arguments)
    pub fn connect(&mut self, name: &str, factor: F, variables: &[&str]) -> &mut Self {
        self.add_factor(name, factor);
        for variable in variables {
            self.add_edge(name, variable);
        }
        self
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    // Returns an iterator over node names and kinds in insertion order
    pub fn nodes_iter(&self) -> impl Iterator<Item = (&str, NodeKind)> {
        self.nodes
            .iter()
            .map(|(name, description)| (name.as_str(), description.kind()))
    }

    pub fn edges(&self) -> &[(String, String)] {
        &self.edges
    }

    pub(crate) fn into_parts(
        self,
    ) -> (Vec<(String, NodeDescription<V, F>)>, Vec<(String, String)>) {
        (self.nodes, self.edges)
    }
}

impl<V, F> Default for GraphDescription<V, F> {
    fn default() -> Self {
        Self::new()
    }
}

impl DiscreteGraph {
    // Adds a variable whose belief prior is expressed as a unary table factor
    // named `<name>::prior`, connected to the variable
    pub fn add_variable_with_prior(&mut self, name: &str, prior: Vec<f64>) -> &mut Self {
        let prior_name = format!("{}{}", name, PRIOR_SUFFIX);
        self.add_variable(name, DiscreteVariable::new(prior.len()));
        self.connect(&prior_name, Potential::table(prior), &[name])
    }
}
