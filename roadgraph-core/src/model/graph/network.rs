//! Road network graph with node lookup by id

use hashbrown::HashMap;
use petgraph::graph::{EdgeIndex, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use super::components::{GraphNode, RoadEdge};

/// Undirected, simple road graph.
///
/// Every edge joins two distinct nodes; edges without a weight stay in the
/// graph but are never traversed by route search.
#[derive(Debug, Clone, Default)]
pub struct RoadGraph {
    pub(crate) graph: UnGraph<GraphNode, RoadEdge>,
    index: HashMap<String, NodeIndex>,
}

/// Counts reported after a build or snapshot load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub nodes: usize,
    pub places: usize,
    pub edges: usize,
    pub missing_geometry: usize,
}

impl RoadGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node unless one with the same id exists; returns its index
    pub fn add_node(&mut self, node: GraphNode) -> NodeIndex {
        if let Some(&idx) = self.index.get(node.id()) {
            return idx;
        }
        let id = node.id().to_string();
        let idx = self.graph.add_node(node);
        self.index.insert(id, idx);
        idx
    }

    /// Connects two nodes, replacing any edge already between them.
    ///
    /// Returns `None` without touching the graph when `a == b`.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, edge: RoadEdge) -> Option<EdgeIndex> {
        if a == b {
            return None;
        }
        Some(self.graph.update_edge(a, b, edge))
    }

    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.index.get(id).copied()
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// All edges with both endpoint nodes
    pub fn edges(&self) -> impl Iterator<Item = (EdgeIndex, &GraphNode, &GraphNode, &RoadEdge)> {
        self.graph.edge_references().map(|edge| {
            (
                edge.id(),
                &self.graph[edge.source()],
                &self.graph[edge.target()],
                edge.weight(),
            )
        })
    }

    pub fn edge_mut(&mut self, idx: EdgeIndex) -> Option<&mut RoadEdge> {
        self.graph.edge_weight_mut(idx)
    }

    /// Edge between two nodes given by id
    pub fn edge_between(&self, a: &str, b: &str) -> Option<&RoadEdge> {
        let edge = self
            .graph
            .find_edge(self.node_index(a)?, self.node_index(b)?)?;
        self.graph.edge_weight(edge)
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            nodes: self.node_count(),
            places: self.nodes().filter(|node| node.is_place()).count(),
            edges: self.edge_count(),
            missing_geometry: self
                .graph
                .edge_weights()
                .filter(|edge| edge.weight.is_none())
                .count(),
        }
    }
}
