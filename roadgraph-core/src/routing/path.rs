//! Shortest route expansion over [`RoadGraph`]

use log::debug;

use super::dijkstra::shortest_path;
use crate::{
    Error,
    model::{RoadGraph, Route, Step},
};

impl RoadGraph {
    /// Cheapest route between two nodes, one [`Step`] per visited node.
    ///
    /// Each step carries the id and name of the edge leaving it; the terminal
    /// step has none. Edges with unresolved geometry are never traversed.
    pub fn shortest_route(&self, source_id: &str, target_id: &str) -> Result<Route, Error> {
        let source = self
            .node_index(source_id)
            .ok_or_else(|| Error::UnknownNode(source_id.to_string()))?;
        let target = self
            .node_index(target_id)
            .ok_or_else(|| Error::UnknownNode(target_id.to_string()))?;

        let (cost, nodes) = shortest_path(self, source, target).ok_or_else(|| Error::NoPath {
            from: source_id.to_string(),
            to: target_id.to_string(),
        })?;
        debug!(
            "Route {source_id} -> {target_id}: {} nodes, cost {cost:.1}",
            nodes.len()
        );

        let mut steps = Vec::with_capacity(nodes.len());
        for (pos, &idx) in nodes.iter().enumerate() {
            let next_edge = nodes
                .get(pos + 1)
                .and_then(|&next| self.graph.find_edge(idx, next))
                .and_then(|edge| self.graph.edge_weight(edge));
            steps.push(Step::new(&self.graph[idx], next_edge));
        }

        Ok(Route { steps })
    }
}
