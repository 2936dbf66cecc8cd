//! Labeled, weighted, undirected graph used for both sides of an alignment.
//!
//! Nodes are registered by label and addressed through dense `NodeId`s; edges
//! carry a single real weight (a coexpression correlation for the networks we
//! align). Edge existence is a hash lookup on the canonical node pair.

use anyhow::{bail, Result};
use indexmap::IndexSet;
use std::collections::HashMap;
use std::fmt;

/// Dense node handle, valid only for the graph that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Dense edge handle, valid only for the graph that issued it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl EdgeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Default, Clone)]
pub struct Graph {
    /// Human readable name ("query", "target", a species...)
    name: String,

    /// Node labels; the position in the set is the node id
    labels: IndexSet<String>,

    /// Edge weights indexed by `EdgeId`
    weights: Vec<f64>,

    /// Canonical (min, max) node pair -> edge
    adjacency: HashMap<(NodeId, NodeId), EdgeId>,

    self_loops: usize,
}

fn canonical(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Graph {
    pub fn new(name: impl Into<String>) -> Self {
        Graph {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get or assign the node for a label
    pub fn add_node(&mut self, label: &str) -> NodeId {
        if let Some(idx) = self.labels.get_index_of(label) {
            return NodeId(idx as u32);
        }
        let (idx, _) = self.labels.insert_full(label.to_string());
        NodeId(idx as u32)
    }

    /// Look up a node by label
    pub fn node(&self, label: &str) -> Option<NodeId> {
        self.labels.get_index_of(label).map(|idx| NodeId(idx as u32))
    }

    /// Insert an undirected edge. A second edge between the same pair is an error.
    pub fn add_edge(&mut self, a: NodeId, b: NodeId, weight: f64) -> Result<EdgeId> {
        if a.index() >= self.labels.len() || b.index() >= self.labels.len() {
            bail!(
                "Edge ({}, {}) refers to a node outside graph '{}'",
                a.0,
                b.0,
                self.name
            );
        }

        let key = canonical(a, b);
        if self.adjacency.contains_key(&key) {
            bail!(
                "Duplicate edge {} - {} in graph '{}'",
                self.label(a),
                self.label(b),
                self.name
            );
        }

        let id = EdgeId(self.weights.len() as u32);
        self.weights.push(weight);
        self.adjacency.insert(key, id);
        if a == b {
            self.self_loops += 1;
        }
        Ok(id)
    }

    /// Convenience for building graphs by label
    pub fn add_labeled_edge(&mut self, a: &str, b: &str, weight: f64) -> Result<EdgeId> {
        let a = self.add_node(a);
        let b = self.add_node(b);
        self.add_edge(a, b, weight)
    }

    /// The edge joining `a` and `b`, in either orientation
    pub fn edge_between(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.adjacency.get(&canonical(a, b)).copied()
    }

    pub fn label(&self, node: NodeId) -> &str {
        &self.labels[node.index()]
    }

    pub fn weight(&self, edge: EdgeId) -> f64 {
        self.weights[edge.index()]
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn edge_count(&self) -> usize {
        self.weights.len()
    }

    pub fn self_loop_count(&self) -> usize {
        self.self_loops
    }

    /// Nodes in insertion order
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.labels.len()).map(|idx| NodeId(idx as u32))
    }
}

impl fmt::Display for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} nodes, {} edges)",
            self.name,
            self.node_count(),
            self.edge_count()
        )
    }
}
