use log::{debug, warn};

use crate::{
    errors::{BpError, GraphError},
    factor_graph::{
        factor_graph::{FactorGraph, NodeId, NormalizationReport},
        graph_description::{DiscreteGraph, DiscreteVariable},
    },
    factor_types::factor_type::DiscreteFactor,
    message::messages::{DiscreteMessages, MessageBuffers},
    numeric::{
        cartesian::assignments,
        damping::damp_message,
        log_space::{ln_vec, log_sum_exp, normalize, normalize_log, LOG_EPSILON},
    },
};

use super::{
    evidence::Evidence,
    solver::{validate_damping, BeliefPropagation, DEFAULT_DAMPING_FACTOR},
};

pub type DiscreteFactorGraph = FactorGraph<DiscreteVariable, DiscreteFactor>;

fn uniform(domain_size: usize) -> Vec<f64> {
    vec![1. / domain_size as f64; domain_size]
}

fn one_hot(domain_size: usize, value: usize) -> Vec<f64> {
    let mut vector = vec![0.; domain_size];
    vector[value] = 1.;
    vector
}

/// Sum-product belief propagation over finite-valued variables, computed in log space.
pub struct DiscreteBP {
    graph: DiscreteFactorGraph,
    report: NormalizationReport,
    messages: MessageBuffers<DiscreteMessages>, // one row per directed edge
    beliefs: Vec<Vec<f64>>,                     // indexed by node id, empty for factors
    log_beliefs: Vec<Vec<f64>>,
    evidence: Evidence<usize>,
    damping_factor: f64,
}

impl DiscreteBP {
    // Normalizes the graph and initializes uniform beliefs and messages
    pub fn new(description: DiscreteGraph, damping_factor: f64) -> Result<Self, BpError> {
        let damping_factor = validate_damping(damping_factor)?;
        let (graph, report) = DiscreteFactorGraph::new(description)?;

        if let Some(node) = graph
            .variables_iter()
            .find(|node| node.variable().map_or(0, |v| v.domain_size()) == 0)
        {
            return Err(GraphError::InvalidParameter {
                node: node.name().to_string(),
                reason: "domain must contain at least one value".to_string(),
            }
            .into());
        }

        let beliefs: Vec<Vec<f64>> = graph
            .nodes_iter()
            .map(|node| match node.variable() {
                Some(variable) => uniform(variable.domain_size()),
                None => Vec::new(),
            })
            .collect();
        let log_beliefs = beliefs.iter().map(|belief| ln_vec(belief)).collect();

        // Variable -> factor messages start uniform, factor -> variable messages start
        // as the identity (all ones) until their first update
        let initial_messages: Vec<Vec<f64>> = graph
            .edges()
            .iter()
            .map(|&(from, to)| match graph.node(from).variable() {
                Some(variable) => uniform(variable.domain_size()),
                None => {
                    let domain_size = graph
                        .node(to)
                        .variable()
                        .map_or(0, |variable| variable.domain_size());
                    vec![1.; domain_size]
                }
            })
            .collect();

        debug!(
            "Initialized discrete BP with {} nodes, {} directed edges, damping factor {}",
            graph.num_nodes(),
            graph.num_edges(),
            damping_factor
        );

        Ok(DiscreteBP {
            evidence: Evidence::new(graph.num_nodes()),
            messages: MessageBuffers::new(DiscreteMessages::from(initial_messages)),
            graph,
            report,
            beliefs,
            log_beliefs,
            damping_factor,
        })
    }

    pub fn with_default_damping(description: DiscreteGraph) -> Result<Self, BpError> {
        Self::new(description, DEFAULT_DAMPING_FACTOR)
    }

    pub fn graph(&self) -> &DiscreteFactorGraph {
        &self.graph
    }

    pub fn report(&self) -> &NormalizationReport {
        &self.report
    }

    pub fn damping_factor(&self) -> f64 {
        self.damping_factor
    }

    pub fn evidence(&self) -> &Evidence<usize> {
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

    // Returns the log-probability vector of a variable (-inf exactly where the belief is 0)
    pub fn get_log_beliefs(&self, name: &str) -> Result<Vec<f64>, BpError> {
        let id = self.graph.variable_id(name)?;
        Ok(self.log_beliefs[id].clone())
    }

    // Returns the message currently stored on the directed edge between two named nodes
    pub fn message(&self, from: &str, to: &str) -> Option<&[f64]> {
        let edge = self
            .graph
            .edge_id(self.graph.node_id(from)?, self.graph.node_id(to)?)?;
        Some(self.messages.current().row(edge))
    }

    // Message from a variable to the factor at position `k` of its neighbor list:
    // the variable's marginal divided by what that factor sent, renormalized
    fn variable_to_factor(&self, variable: NodeId, k: usize) -> Vec<f64> {
        let node = self.graph.node(variable);
        let current = self.messages.current();

        if self.evidence.is_clamped(variable) {
            return current.row(node.outgoing()[k]).to_vec();
        }

        let mut message: Vec<f64> = self.beliefs[variable]
            .iter()
            .zip(current.row(node.incoming()[k]))
            .map(|(marginal, incoming)| marginal / incoming.max(LOG_EPSILON))
            .collect();
        normalize(&mut message);
        message
    }

    // Message from a factor to the variable at position `target` of its neighbor list:
    // marginalizes the factor times all other incoming messages over every joint
    // assignment of the other neighbors, in log space
    fn factor_to_variable(&self, factor: NodeId, target: usize) -> Vec<f64> {
        let node = self.graph.node(factor);
        let current = self.messages.current();
        let Some(bound) = node.factor() else {
            return Vec::new();
        };
        let domain_sizes = bound.domain_sizes();

        let others: Vec<usize> = (0..bound.arity()).filter(|&j| j != target).collect();
        let other_domains: Vec<usize> = others.iter().map(|&j| domain_sizes[j]).collect();
        let other_assignments = assignments(&other_domains);

        let mut full_assignment = vec![0; bound.arity()];
        let mut terms = Vec::with_capacity(other_assignments.len());
        let mut log_scores = Vec::with_capacity(domain_sizes[target]);
        for value in 0..domain_sizes[target] {
            full_assignment[target] = value;
            terms.clear();
            for assignment in other_assignments.iter() {
                let mut log_incoming = 0.;
                for (&j, &label) in others.iter().zip(assignment.iter()) {
                    full_assignment[j] = label;
                    log_incoming += current[[node.incoming()[j], label]].ln();
                }
                terms.push(bound.log_potential(&full_assignment) + log_incoming);
            }
            log_scores.push(log_sum_exp(&terms));
        }

        normalize_log(&log_scores)
    }

    // Recomputes beliefs of non-evidenced variables from the current factor messages,
    // returns the largest absolute change of a belief entry
    fn update_beliefs(&mut self) -> f64 {
        let current = self.messages.current();
        let mut max_change: f64 = 0.;

        for node in self.graph.variables_iter() {
            let id = node.id();
            if self.evidence.is_clamped(id) {
                continue;
            }

            let mut log_marginal = vec![0.; self.beliefs[id].len()];
            for &edge in node.incoming() {
                for (log_value, &incoming) in log_marginal.iter_mut().zip(current.row(edge)) {
                    *log_value += if incoming > 0. { incoming.ln() } else { 0. };
                }
            }

            let belief = damp_message(
                &normalize_log(&log_marginal),
                &self.beliefs[id],
                self.damping_factor,
            );
            for (new, old) in belief.iter().zip(self.beliefs[id].iter()) {
                max_change = max_change.max((new - old).abs());
            }

            self.log_beliefs[id] = ln_vec(&belief);
            self.beliefs[id] = belief;
        }

        max_change
    }
}

impl BeliefPropagation for DiscreteBP {
    type Observation = usize;
    type Belief = Vec<f64>;

    // Clamps a variable to the value with the given index: its belief becomes one-hot
    // and so do its outgoing messages in both buffers
    fn set_evidence(&mut self, name: &str, value: usize) {
        let id = match self.graph.variable_id(name) {
            Ok(id) => id,
            Err(error) => {
                warn!("Ignoring evidence {} = {}: {}", name, value, error);
                return;
            }
        };
        let domain_size = self.beliefs[id].len();
        if value >= domain_size {
            warn!(
                "Ignoring evidence {} = {}: the domain has {} values",
                name, value, domain_size
            );
            return;
        }

        debug!("Setting evidence {} = {}", name, value);
        self.evidence.set(id, value);

        let clamped = one_hot(domain_size, value);
        self.log_beliefs[id] = ln_vec(&clamped);
        let outgoing = self.graph.node(id).outgoing();
        self.messages.update_both(|messages| {
            for &edge in outgoing {
                messages.set_row(edge, &clamped);
            }
        });
        self.beliefs[id] = clamped;
    }

    fn get_beliefs(&self, name: &str) -> Result<Vec<f64>, BpError> {
        let id = self.graph.variable_id(name)?;
        Ok(self.beliefs[id].clone())
    }

    // Messages still in flight count as change: on a tree a belief can stay put for a
    // sweep while information is crossing a factor
    fn sweep(&mut self) -> f64 {
        let current = self.messages.current();
        let mut message_change: f64 = 0.;
        let mut updates = Vec::with_capacity(self.graph.num_edges());
        for node in self.graph.nodes_iter() {
            for (k, &edge) in node.outgoing().iter().enumerate() {
                let message = if node.is_variable() {
                    self.variable_to_factor(node.id(), k)
                } else {
                    self.factor_to_variable(node.id(), k)
                };
                for (new, old) in message.iter().zip(current.row(edge)) {
                    message_change = message_change.max((new - old).abs());
                }
                updates.push((edge, message));
            }
        }

        let next = self.messages.next_mut();
        for (edge, message) in updates.iter() {
            next.set_row(*edge, message);
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
