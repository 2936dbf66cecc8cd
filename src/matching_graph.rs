//! Bipartite matching graph between a query and a target graph
//!
//! Red nodes mirror query nodes and blue nodes mirror target nodes. Bipartite
//! edges are the candidate correspondences (e.g. sequence similarity bit
//! scores). A `MatchingMap` selects a one-to-one subset of them.

use anyhow::{bail, Result};
use ordered_float::OrderedFloat;
use std::collections::HashMap;

use crate::graph::{EdgeId, Graph, NodeId};

/// Query-side node of the bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RedNode(pub u32);

/// Target-side node of the bipartite graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlueNode(pub u32);

/// Bipartite (candidate match) edge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BpEdge(pub u32);

impl RedNode {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BlueNode {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl BpEdge {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, Copy)]
struct BpEdgeRecord {
    red: RedNode,
    blue: BlueNode,
    weight: f64,
}

#[derive(Debug)]
pub struct MatchingGraph {
    query: Graph,
    target: Graph,

    /// Origin of each red node in the query graph (None for placeholders)
    red_origin: Vec<Option<NodeId>>,
    /// Origin of each blue node in the target graph (None for placeholders)
    blue_origin: Vec<Option<NodeId>>,

    edges: Vec<BpEdgeRecord>,
    edge_index: HashMap<(RedNode, BlueNode), BpEdge>,
}

impl MatchingGraph {
    /// Create the bipartite graph with one red node per query node and one
    /// blue node per target node, both in graph enumeration order.
    pub fn new(query: Graph, target: Graph) -> Self {
        let red_origin = query.nodes().map(Some).collect();
        let blue_origin = target.nodes().map(Some).collect();
        MatchingGraph {
            query,
            target,
            red_origin,
            blue_origin,
            edges: Vec::new(),
            edge_index: HashMap::new(),
        }
    }

    pub fn query(&self) -> &Graph {
        &self.query
    }

    pub fn target(&self) -> &Graph {
        &self.target
    }

    /// Add a red node with no query counterpart (padding for square solvers)
    pub fn add_red_placeholder(&mut self) -> RedNode {
        self.red_origin.push(None);
        RedNode(self.red_origin.len() as u32 - 1)
    }

    /// Add a blue node with no target counterpart
    pub fn add_blue_placeholder(&mut self) -> BlueNode {
        self.blue_origin.push(None);
        BlueNode(self.blue_origin.len() as u32 - 1)
    }

    pub fn add_edge(&mut self, red: RedNode, blue: BlueNode, weight: f64) -> Result<BpEdge> {
        if red.index() >= self.red_origin.len() {
            bail!("Red node {} does not exist", red.0);
        }
        if blue.index() >= self.blue_origin.len() {
            bail!("Blue node {} does not exist", blue.0);
        }
        if self.edge_index.contains_key(&(red, blue)) {
            bail!(
                "Duplicate candidate edge {} - {}",
                self.red_label(red).unwrap_or("<placeholder>"),
                self.blue_label(blue).unwrap_or("<placeholder>")
            );
        }

        let id = BpEdge(self.edges.len() as u32);
        self.edges.push(BpEdgeRecord { red, blue, weight });
        self.edge_index.insert((red, blue), id);
        Ok(id)
    }

    /// Red counterpart of a query node
    pub fn red_for_query(&self, node: NodeId) -> RedNode {
        // Red nodes are created from the query graph first, so ids coincide
        RedNode(node.0)
    }

    /// Blue counterpart of a target node
    pub fn blue_for_target(&self, node: NodeId) -> BlueNode {
        BlueNode(node.0)
    }

    pub fn map_red_to_query(&self, red: RedNode) -> Option<NodeId> {
        self.red_origin[red.index()]
    }

    pub fn map_blue_to_target(&self, blue: BlueNode) -> Option<NodeId> {
        self.blue_origin[blue.index()]
    }

    pub fn red_endpoint(&self, edge: BpEdge) -> RedNode {
        self.edges[edge.index()].red
    }

    pub fn blue_endpoint(&self, edge: BpEdge) -> BlueNode {
        self.edges[edge.index()].blue
    }

    pub fn weight(&self, edge: BpEdge) -> f64 {
        self.edges[edge.index()].weight
    }

    pub fn edge_between(&self, red: RedNode, blue: BlueNode) -> Option<BpEdge> {
        self.edge_index.get(&(red, blue)).copied()
    }

    pub fn red_nodes(&self) -> impl Iterator<Item = RedNode> + '_ {
        (0..self.red_origin.len()).map(|idx| RedNode(idx as u32))
    }

    pub fn blue_nodes(&self) -> impl Iterator<Item = BlueNode> + '_ {
        (0..self.blue_origin.len()).map(|idx| BlueNode(idx as u32))
    }

    pub fn red_count(&self) -> usize {
        self.red_origin.len()
    }

    pub fn blue_count(&self) -> usize {
        self.blue_origin.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// (min, max) over all bipartite edge weights, None if there are no edges
    pub fn weight_range(&self) -> Option<(f64, f64)> {
        let weights = || self.edges.iter().map(|e| OrderedFloat(e.weight));
        let min = weights().min()?;
        let max = weights().max()?;
        Some((min.into_inner(), max.into_inner()))
    }

    pub fn red_label(&self, red: RedNode) -> Option<&str> {
        self.map_red_to_query(red).map(|n| self.query.label(n))
    }

    pub fn blue_label(&self, blue: BlueNode) -> Option<&str> {
        self.map_blue_to_target(blue).map(|n| self.target.label(n))
    }

    /// Edge between two query nodes
    pub fn query_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.query.edge_between(a, b)
    }

    /// Edge between two target nodes
    pub fn target_edge(&self, a: NodeId, b: NodeId) -> Option<EdgeId> {
        self.target.edge_between(a, b)
    }
}

/// One-to-one selection of bipartite edges, indexed by red node
#[derive(Debug, Clone)]
pub struct MatchingMap {
    by_red: Vec<Option<BpEdge>>,
    by_blue: Vec<Option<RedNode>>,
    len: usize,
}

impl MatchingMap {
    /// Empty matching sized for `graph`
    pub fn new(graph: &MatchingGraph) -> Self {
        MatchingMap {
            by_red: vec![None; graph.red_count()],
            by_blue: vec![None; graph.blue_count()],
            len: 0,
        }
    }

    /// Build a matching from a list of bipartite edges
    pub fn from_edges<I>(graph: &MatchingGraph, edges: I) -> Result<Self>
    where
        I: IntoIterator<Item = BpEdge>,
    {
        let mut matching = MatchingMap::new(graph);
        for edge in edges {
            matching.insert(graph, edge)?;
        }
        Ok(matching)
    }

    /// Add an edge to the matching. Fails if either endpoint is already matched.
    pub fn insert(&mut self, graph: &MatchingGraph, edge: BpEdge) -> Result<()> {
        let red = graph.red_endpoint(edge);
        let blue = graph.blue_endpoint(edge);
        let describe_red = || graph.red_label(red).unwrap_or("<placeholder>").to_string();
        let describe_blue = || graph.blue_label(blue).unwrap_or("<placeholder>").to_string();

        if red.index() >= self.by_red.len() || blue.index() >= self.by_blue.len() {
            bail!("Matching was sized for a different matching graph");
        }
        if let Some(existing) = self.by_red[red.index()] {
            if existing == edge {
                return Ok(());
            }
            bail!("Query node {} is matched more than once", describe_red());
        }
        if let Some(other) = self.by_blue[blue.index()] {
            bail!(
                "Target node {} is matched to both {} and {}",
                describe_blue(),
                graph.red_label(other).unwrap_or("<placeholder>"),
                describe_red()
            );
        }

        self.by_red[red.index()] = Some(edge);
        self.by_blue[blue.index()] = Some(red);
        self.len += 1;
        Ok(())
    }

    /// The bipartite edge matching `red`, if any
    pub fn matched_edge(&self, red: RedNode) -> Option<BpEdge> {
        self.by_red.get(red.index()).copied().flatten()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> MatchingGraph {
        let mut query = Graph::new("query");
        query.add_labeled_edge("A", "B", 0.8).unwrap();
        let mut target = Graph::new("target");
        target.add_labeled_edge("X", "Y", 0.9).unwrap();
        MatchingGraph::new(query, target)
    }

    #[test]
    fn test_red_blue_mirror_graphs() {
        let gm = square();
        assert_eq!(gm.red_count(), 2);
        assert_eq!(gm.blue_count(), 2);

        let b = gm.query().node("B").unwrap();
        let red = gm.red_for_query(b);
        assert_eq!(gm.map_red_to_query(red), Some(b));
        assert_eq!(gm.red_label(red), Some("B"));

        let y = gm.target().node("Y").unwrap();
        assert_eq!(gm.blue_label(gm.blue_for_target(y)), Some("Y"));
    }

    #[test]
    fn test_placeholders_have_no_origin() {
        let mut gm = square();
        let red = gm.add_red_placeholder();
        let blue = gm.add_blue_placeholder();
        assert_eq!(red, RedNode(2));
        assert_eq!(blue, BlueNode(2));
        assert_eq!(gm.map_red_to_query(red), None);
        assert_eq!(gm.map_blue_to_target(blue), None);
    }

    #[test]
    fn test_weight_range() {
        let mut gm = square();
        assert_eq!(gm.weight_range(), None);

        gm.add_edge(RedNode(0), BlueNode(0), 5.0).unwrap();
        gm.add_edge(RedNode(1), BlueNode(1), 6.0).unwrap();
        gm.add_edge(RedNode(0), BlueNode(1), 2.5).unwrap();
        assert_eq!(gm.weight_range(), Some((2.5, 6.0)));
    }

    #[test]
    fn test_duplicate_candidate_rejected() {
        let mut gm = square();
        gm.add_edge(RedNode(0), BlueNode(0), 5.0).unwrap();
        assert!(gm.add_edge(RedNode(0), BlueNode(0), 1.0).is_err());
        assert!(gm.add_edge(RedNode(9), BlueNode(0), 1.0).is_err());
    }

    #[test]
    fn test_matching_is_injective() {
        let mut gm = square();
        let ax = gm.add_edge(RedNode(0), BlueNode(0), 5.0).unwrap();
        let bx = gm.add_edge(RedNode(1), BlueNode(0), 4.0).unwrap();
        let ay = gm.add_edge(RedNode(0), BlueNode(1), 3.0).unwrap();
        let by = gm.add_edge(RedNode(1), BlueNode(1), 6.0).unwrap();

        let mut matching = MatchingMap::new(&gm);
        matching.insert(&gm, ax).unwrap();

        // Blue X already taken by A
        let err = matching.insert(&gm, bx).unwrap_err();
        assert!(err.to_string().contains("matched to both"));

        // Red A already matched
        assert!(matching.insert(&gm, ay).is_err());

        // Re-inserting the same edge is a no-op
        matching.insert(&gm, ax).unwrap();

        matching.insert(&gm, by).unwrap();
        assert_eq!(matching.len(), 2);
        assert_eq!(matching.matched_edge(RedNode(1)), Some(by));
    }
}
