use std::{collections::HashMap, fmt::Display};

use bitvec::{order::LocalBits, vec::BitVec};
use log::{debug, warn};
use petgraph::{
    algo::{connected_components, is_cyclic_undirected},
    graph::{DiGraph, NodeIndex, UnGraph},
};

use crate::{
    errors::{BpError, GraphError},
    factor_types::factor_trait::FactorModel,
};

use super::graph_description::{GraphDescription, NodeDescription, NodeKind};

pub type NodeId = usize;
pub type EdgeId = usize; // index of a directed edge, also the index of its message slot

// Payload of a normalized node
#[derive(Debug)]
pub enum NodeData<V, B> {
    Variable(V),
    Factor(B),
}

// A node of the normalized graph; `outgoing[k]` and `incoming[k]` are the directed
// edges to and from `neighbors[k]`
#[derive(Debug)]
pub struct Node<V, B> {
    name: String,
    id: NodeId,
    data: NodeData<V, B>,
    neighbors: Vec<NodeId>,
    outgoing: Vec<EdgeId>,
    incoming: Vec<EdgeId>,
}

impl<V, B> Node<V, B> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn kind(&self) -> NodeKind {
        match self.data {
            NodeData::Variable(_) => NodeKind::Variable,
            NodeData::Factor(_) => NodeKind::Factor,
        }
    }

    pub fn is_variable(&self) -> bool {
        self.kind() == NodeKind::Variable
    }

    pub fn variable(&self) -> Option<&V> {
        match &self.data {
            NodeData::Variable(variable) => Some(variable),
            NodeData::Factor(_) => None,
        }
    }

    pub fn factor(&self) -> Option<&B> {
        match &self.data {
            NodeData::Variable(_) => None,
            NodeData::Factor(factor) => Some(factor),
        }
    }

    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    pub fn outgoing(&self) -> &[EdgeId] {
        &self.outgoing
    }

    pub fn incoming(&self) -> &[EdgeId] {
        &self.incoming
    }

    // Returns the position of a neighbor in this node's neighbor list
    pub fn position_of(&self, neighbor: NodeId) -> Option<usize> {
        self.neighbors.iter().position(|&node| node == neighbor)
    }
}

/// Recoverable structural problem found while normalizing edges.
#[derive(Debug, Clone, PartialEq)]
pub enum EdgeDiagnostic {
    // The edge names a node that does not exist; the edge is dropped
    UnknownNode {
        from: String,
        to: String,
        missing: String,
    },
    // Both endpoints are variables or both are factors; reported once per direction
    SameKind {
        from: String,
        to: String,
        kind: NodeKind,
    },
    // The same variable-factor pair is already connected; reported once per direction
    Duplicate { from: String, to: String },
}

impl Display for EdgeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EdgeDiagnostic::UnknownNode { from, to, missing } => write!(
                f,
                "edge {} - {} references unknown node {}",
                from, to, missing
            ),
            EdgeDiagnostic::SameKind { from, to, kind } => write!(
                f,
                "invalid edge {} -> {}: both endpoints are of kind {:?}",
                from, to, kind
            ),
            EdgeDiagnostic::Duplicate { from, to } => {
                write!(f, "duplicate edge {} -> {}", from, to)
            }
        }
    }
}

/// Outcome of normalization: how many directed edges were accepted and what was rejected.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    accepted_edges: usize,
    diagnostics: Vec<EdgeDiagnostic>,
}

impl NormalizationReport {
    pub fn accepted_edges(&self) -> usize {
        self.accepted_edges
    }

    pub fn diagnostics(&self) -> &[EdgeDiagnostic] {
        &self.diagnostics
    }

    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    fn reject(&mut self, diagnostic: EdgeDiagnostic) {
        warn!("Rejected edge: {}", diagnostic);
        self.diagnostics.push(diagnostic);
    }
}

/// Normalized bipartite factor graph: an arena of nodes with dense ids and explicit
/// bidirectional adjacency. Directed edges come in pairs, `2k` and `2k + 1` being
/// the two directions of the same undirected edge.
#[derive(Debug)]
pub struct FactorGraph<V, B> {
    nodes: Vec<Node<V, B>>,
    edges: Vec<(NodeId, NodeId)>,
    index: HashMap<String, NodeId>,
    graph: DiGraph<NodeKind, (), usize>,
}

impl<V, B> FactorGraph<V, B> {
    // Normalizes a graph description: assigns dense ids, expands and validates edges,
    // and binds every factor to its (ordered) neighboring variables
    pub fn new<F>(
        description: GraphDescription<V, F>,
    ) -> Result<(Self, NormalizationReport), GraphError>
    where
        F: FactorModel<V, Bound = B>,
    {
        let (descriptions, raw_edges) = description.into_parts();
        let num_nodes = descriptions.len();
        debug!(
            "In FactorGraph::new() with {} nodes and {} edges",
            num_nodes,
            raw_edges.len()
        );

        let index: HashMap<String, NodeId> = descriptions
            .iter()
            .enumerate()
            .map(|(id, (name, _))| (name.clone(), id))
            .collect();
        let kinds: Vec<NodeKind> = descriptions
            .iter()
            .map(|(_, description)| description.kind())
            .collect();

        let mut graph: DiGraph<NodeKind, (), usize> =
            DiGraph::with_capacity(num_nodes, 2 * raw_edges.len());
        for kind in kinds.iter() {
            graph.add_node(*kind);
        }

        let mut report = NormalizationReport::default();
        let mut edges = Vec::with_capacity(2 * raw_edges.len());
        let mut neighbors = vec![Vec::new(); num_nodes];
        let mut outgoing = vec![Vec::new(); num_nodes];
        let mut incoming = vec![Vec::new(); num_nodes];
        let mut is_connected = BitVec::<usize, LocalBits>::repeat(false, num_nodes * num_nodes);

        for (name_a, name_b) in raw_edges.iter() {
            let (a, b) = match (index.get(name_a), index.get(name_b)) {
                (Some(&a), Some(&b)) => (a, b),
                (a, _) => {
                    let missing = if a.is_none() { name_a } else { name_b };
                    report.reject(EdgeDiagnostic::UnknownNode {
                        from: name_a.clone(),
                        to: name_b.clone(),
                        missing: missing.clone(),
                    });
                    continue;
                }
            };

            // Expand into both directions; the bipartite check is made per direction
            if kinds[a] == kinds[b] {
                for (from, to) in [(a, b), (b, a)] {
                    report.reject(EdgeDiagnostic::SameKind {
                        from: descriptions[from].0.clone(),
                        to: descriptions[to].0.clone(),
                        kind: kinds[from],
                    });
                }
                continue;
            }

            if is_connected[a * num_nodes + b] {
                for (from, to) in [(a, b), (b, a)] {
                    report.reject(EdgeDiagnostic::Duplicate {
                        from: descriptions[from].0.clone(),
                        to: descriptions[to].0.clone(),
                    });
                }
                continue;
            }

            for (from, to) in [(a, b), (b, a)] {
                let edge = edges.len();
                debug!("Accepted edge {} from node {} to node {}", edge, from, to);
                is_connected.set(from * num_nodes + to, true);
                edges.push((from, to));
                graph.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
                neighbors[from].push(to);
                outgoing[from].push(edge);
                // the reverse direction is the other edge of the pair
                incoming[from].push(edge ^ 1);
            }
        }
        report.accepted_edges = edges.len();

        // Bind factors to their scopes before moving variables into the arena
        let mut variables: Vec<Option<V>> = Vec::with_capacity(num_nodes);
        let mut factors: Vec<Option<(String, F)>> = Vec::with_capacity(num_nodes);
        let mut names = Vec::with_capacity(num_nodes);
        for (name, description) in descriptions {
            match description {
                NodeDescription::Variable(variable) => {
                    variables.push(Some(variable));
                    factors.push(None);
                }
                NodeDescription::Factor(factor) => {
                    variables.push(None);
                    factors.push(Some((name.clone(), factor)));
                }
            }
            names.push(name);
        }

        let mut bound_factors: Vec<Option<B>> = Vec::with_capacity(num_nodes);
        for (id, factor) in factors.into_iter().enumerate() {
            bound_factors.push(match factor {
                Some((name, factor)) => {
                    let scope: Vec<&V> = neighbors[id]
                        .iter()
                        .filter_map(|&neighbor| variables[neighbor].as_ref())
                        .collect();
                    Some(factor.bind(&name, &scope)?)
                }
                None => None,
            });
        }

        let nodes = names
            .into_iter()
            .zip(variables.into_iter().zip(bound_factors))
            .zip(neighbors.into_iter().zip(outgoing.into_iter().zip(incoming)))
            .enumerate()
            .filter_map(
                |(id, ((name, (variable, factor)), (neighbors, (outgoing, incoming))))| {
                    let data = match (variable, factor) {
                        (Some(variable), _) => NodeData::Variable(variable),
                        (None, Some(factor)) => NodeData::Factor(factor),
                        (None, None) => return None,
                    };
                    Some(Node {
                        name,
                        id,
                        data,
                        neighbors,
                        outgoing,
                        incoming,
                    })
                },
            )
            .collect();

        debug!(
            "Normalization complete: {} directed edges accepted, {} rejected",
            report.accepted_edges,
            report.diagnostics.len()
        );

        Ok((
            FactorGraph {
                nodes,
                edges,
                index,
                graph,
            },
            report,
        ))
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    // Returns the number of directed edges
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    pub fn node(&self, id: NodeId) -> &Node<V, B> {
        &self.nodes[id]
    }

    pub fn nodes_iter(&self) -> impl Iterator<Item = &Node<V, B>> {
        self.nodes.iter()
    }

    pub fn variables_iter(&self) -> impl Iterator<Item = &Node<V, B>> {
        self.nodes.iter().filter(|node| node.is_variable())
    }

    // Returns the directed edge list as (from, to) pairs, indexed by edge id
    pub fn edges(&self) -> &[(NodeId, NodeId)] {
        &self.edges
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.index.get(name).copied()
    }

    // Resolves a name that must refer to a variable
    pub fn variable_id(&self, name: &str) -> Result<NodeId, BpError> {
        let id = self
            .node_id(name)
            .ok_or_else(|| BpError::UnknownNode(name.to_string()))?;
        if self.nodes[id].is_variable() {
            Ok(id)
        } else {
            Err(BpError::NotAVariable(name.to_string()))
        }
    }

    // Returns the id of the directed edge from `from` to `to`, if they are adjacent
    pub fn edge_id(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.graph
            .find_edge(NodeIndex::new(from), NodeIndex::new(to))
            .map(|edge| edge.index())
    }

    pub fn graph(&self) -> &DiGraph<NodeKind, (), usize> {
        &self.graph
    }

    // Undirected view with one edge per variable-factor pair
    fn undirected(&self) -> UnGraph<NodeKind, (), usize> {
        let mut undirected: UnGraph<NodeKind, (), usize> =
            UnGraph::with_capacity(self.nodes.len(), self.edges.len() / 2);
        for node in self.nodes.iter() {
            undirected.add_node(node.kind());
        }
        for &(from, to) in self.edges.iter().step_by(2) {
            undirected.add_edge(NodeIndex::new(from), NodeIndex::new(to), ());
        }
        undirected
    }

    // Checks if the graph is a tree or a forest, where belief propagation is exact
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_undirected(&self.undirected())
    }

    pub fn component_count(&self) -> usize {
        connected_components(&self.undirected())
    }
}
