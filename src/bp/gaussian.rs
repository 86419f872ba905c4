use std::fmt::Display;

use log::{debug, warn};

use crate::{
    errors::{BpError, GraphError},
    factor_graph::{
        factor_graph::{FactorGraph, NodeId, NormalizationReport},
        graph_description::{GaussianGraph, GaussianVariable},
    },
    factor_types::canonical_factor::CanonicalFactor,
    message::messages::{GaussianMessages, MessageBuffers},
    numeric::damping::gaussian_damp_message,
};

use super::{
    evidence::Evidence,
    solver::{validate_damping, BeliefPropagation, DEFAULT_DAMPING_FACTOR},
};

/// Variance assigned to an observation made with `GaussianBelief::observed`.
pub const DEFAULT_EVIDENCE_VARIANCE: f64 = 1e-6;

// Added to the total incoming precision before inverting it
const PRECISION_GUARD: f64 = 1e-10;

pub type GaussianFactorGraph = FactorGraph<GaussianVariable, CanonicalFactor>;

/// Mean and variance of a scalar gaussian, used both for beliefs and for observations.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GaussianBelief {
    pub mean: f64,
    pub variance: f64,
}

impl GaussianBelief {
    pub fn new(mean: f64, variance: f64) -> Self {
        GaussianBelief { mean, variance }
    }

    // Near-certain observation of `mean`
    pub fn observed(mean: f64) -> Self {
        GaussianBelief::new(mean, DEFAULT_EVIDENCE_VARIANCE)
    }

    pub fn precision(&self) -> f64 {
        1. / self.variance
    }

    fn is_valid(&self) -> bool {
        self.mean.is_finite() && self.variance.is_finite() && self.variance > 0.
    }
}

impl Default for GaussianBelief {
    fn default() -> Self {
        GaussianBelief::new(0., 1.)
    }
}

impl Display for GaussianBelief {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "N({}, {})", self.mean, self.variance)
    }
}

impl From<&GaussianVariable> for GaussianBelief {
    fn from(variable: &GaussianVariable) -> Self {
        GaussianBelief::new(variable.mean(), variable.variance())
    }
}

// Absolute change of a message component, NaN slots are skipped like in damping
fn component_change(new: f64, old: f64) -> f64 {
    if new.is_nan() || old.is_nan() {
        0.
    } else {
        (new - old).abs()
    }
}

/// Gaussian belief propagation over scalar variables and canonical-form factors.
pub struct GaussianBP {
    graph: GaussianFactorGraph,
    report: NormalizationReport,
    messages: MessageBuffers<GaussianMessages>,
    priors: Vec<GaussianBelief>,  // indexed by node id, factors keep the default
    beliefs: Vec<GaussianBelief>, // same layout as priors
    evidence: Evidence<GaussianBelief>,
    damping_factor: f64,
}

impl GaussianBP {
    // Normalizes the graph, starts every belief at its prior and every message at (0, 0)
    pub fn new(description: GaussianGraph, damping_factor: f64) -> Result<Self, BpError> {
        let damping_factor = validate_damping(damping_factor)?;
        let (graph, report) = GaussianFactorGraph::new(description)?;

        let priors: Vec<GaussianBelief> = graph
            .nodes_iter()
            .map(|node| node.variable().map(GaussianBelief::from).unwrap_or_default())
            .collect();
        if let Some(node) = graph
            .variables_iter()
            .find(|node| !priors[node.id()].is_valid())
        {
            return Err(GraphError::InvalidParameter {
                node: node.name().to_string(),
                reason: format!(
                    "prior {} needs a finite mean and a finite positive variance",
                    priors[node.id()]
                ),
            }
            .into());
        }

        debug!(
            "Initialized gaussian BP with {} nodes, {} directed edges, damping factor {}",
            graph.num_nodes(),
            graph.num_edges(),
            damping_factor
        );

        Ok(GaussianBP {
            messages: MessageBuffers::new(GaussianMessages::zeros(graph.num_nodes())),
            evidence: Evidence::new(graph.num_nodes()),
            beliefs: priors.clone(),
            priors,
            graph,
            report,
            damping_factor,
        })
    }

    pub fn with_default_damping(description: GaussianGraph) -> Result<Self, BpError> {
        Self::new(description, DEFAULT_DAMPING_FACTOR)
    }

    pub fn graph(&self) -> &GaussianFactorGraph {
        &self.graph
    }

    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }

    pub fn damping_factor(&self) -> f64 {
        self.damping_factor
    }

    pub fn evidence(&self) -> &Evidence<GaussianBelief> {
        &self.evidence
    }

    pub fn is_evidenced(&self, name: &str) -> bool {
        self.graph
            .variable_id(name)
            .is_ok_and(|id| self.evidence.is_clamped(id))
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.graph.variables_iter().map(|node| node.name())
    }

    // Returns the (mean, precision) message currently stored from one named node to another
    pub fn message(&self, from: &str, to: &str) -> Option<(f64, f64)> {
        let from = self.graph.node_id(from)?;
        let to = self.graph.node_id(to)?;
        self.graph.edge_id(from, to)?;
        Some(self.messages.current().get(from, to))
    }

    // Precision-weighted combination of the messages sent to a variable by every
    // neighboring factor except `excluded`, as (precision, precision * mean)
    fn combine_incoming(&self, variable: NodeId, excluded: Option<NodeId>) -> (f64, f64) {
        let current = self.messages.current();
        self.graph
            .node(variable)
            .neighbors()
            .iter()
            .filter(|&&factor| Some(factor) != excluded)
            .map(|&factor| current.get(factor, variable))
            .fold((0., 0.), |(precision, weighted), (m, p)| {
                (precision + p, weighted + p * m)
            })
    }

    fn variable_to_factor(&self, variable: NodeId, factor: NodeId) -> (f64, f64) {
        if let Some(observed) = self.evidence.get(variable) {
            return (observed.mean, observed.precision());
        }

        let (precision, weighted) = self.combine_incoming(variable, Some(factor));
        if precision > 0. {
            (weighted / precision, precision)
        } else {
            (0., 0.)
        }
    }

    // Conditions the factor on the current means of its other neighbors and projects
    // it onto the neighbor at position `i`
    fn factor_to_variable(&self, factor: NodeId, i: usize) -> (f64, f64) {
        let node = self.graph.node(factor);
        let Some(canonical) = node.factor() else {
            return (0., 0.);
        };
        let precision = canonical.precision();

        let lii = precision[[i, i]];
        if lii <= 0. {
            return (0., 0.);
        }

        let current = self.messages.current();
        let mut information = canonical.information()[i];
        for (j, &other) in node.neighbors().iter().enumerate() {
            if j != i {
                information -= precision[[i, j]] * current.mean[[other, factor]];
            }
        }

        (information / lii, lii)
    }

    fn update_beliefs(&mut self) -> f64 {
        let mut max_change: f64 = 0.;

        for node in self.graph.variables_iter() {
            let id = node.id();
            if self.evidence.is_clamped(id) {
                continue;
            }

            let (precision, weighted) = self.combine_incoming(id, None);
            let belief = if precision <= 0. {
                self.priors[id]
            } else {
                let guarded = precision + PRECISION_GUARD;
                GaussianBelief::new(weighted / guarded, 1. / guarded)
            };

            let old = self.beliefs[id];
            max_change = max_change
                .max((belief.mean - old.mean).abs())
                .max((belief.variance - old.variance).abs());
            self.beliefs[id] = belief;
        }

        max_change
    }
}

impl BeliefPropagation for GaussianBP {
    type Observation = GaussianBelief;
    type Belief = GaussianBelief;

    // Clamps a variable to the observed (mean, variance) and fixes its outgoing
    // messages to (mean, 1 / variance) in both buffers
    fn set_evidence(&mut self, name: &str, observation: GaussianBelief) {
        let id = match self.graph.variable_id(name) {
            Ok(id) => id,
            Err(error) => {
                warn!("Ignoring evidence {} = {}: {}", name, observation, error);
                return;
            }
        };
        if !observation.is_valid() {
            warn!(
                "Ignoring evidence {} = {}: the variance must be finite and positive",
                name, observation
            );
            return;
        }

        debug!("Setting evidence {} = {}", name, observation);
        self.evidence.set(id, observation);
        self.beliefs[id] = observation;

        let message = (observation.mean, observation.precision());
        let neighbors = self.graph.node(id).neighbors();
        self.messages.update_both(|messages| {
            for &factor in neighbors {
                messages.set(id, factor, message);
            }
        });
    }

    fn get_beliefs(&self, name: &str) -> Result<GaussianBelief, BpError> {
        let id = self.graph.variable_id(name)?;
        Ok(self.beliefs[id])
    }

    // Same stopping rule as the discrete engine: both messages and beliefs must be stationary
    fn sweep(&mut self) -> f64 {
        let current = self.messages.current();
        let mut message_change: f64 = 0.;
        let mut updates = Vec::with_capacity(self.graph.num_edges());
        for node in self.graph.nodes_iter() {
            let sender = node.id();
            for (k, &receiver) in node.neighbors().iter().enumerate() {
                let message = if node.is_variable() {
                    self.variable_to_factor(sender, receiver)
                } else {
                    self.factor_to_variable(sender, k)
                };
                let message = if self.evidence.is_clamped(sender) {
                    message
                } else {
                    gaussian_damp_message(
                        message,
                        current.get(sender, receiver),
                        self.damping_factor,
                    )
                };
                let (old_mean, old_precision) = current.get(sender, receiver);
                message_change = message_change
                    .max(component_change(message.0, old_mean))
                    .max(component_change(message.1, old_precision));
                updates.push((sender, receiver, message));
            }
        }

        let next = self.messages.next_mut();
        for (sender, receiver, message) in updates {
            next.set(sender, receiver, message);
        }
        self.messages.exchange();

        let belief_change = self.update_beliefs();
        debug!(
            "Sweep changes: messages {}, beliefs {}",
            message_change, belief_change
        );
        message_change.max(belief_change)
    }
}
