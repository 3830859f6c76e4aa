use std::sync::Arc;

use geo::Point;
use hashbrown::HashMap;

use crate::{
    Error,
    loading::GeometryLookup,
    model::{GraphNode, RoadEdge, RoadGeometry, RoadGraph, RoadSegment},
};

#[derive(Default)]
pub(crate) struct MemoryLookup {
    pub roads: HashMap<String, Arc<RoadGeometry>>,
    pub centroids: HashMap<String, Point<f64>>,
}

impl GeometryLookup for MemoryLookup {
    fn road_geometry(&self, road_id: &str) -> Result<Option<Arc<RoadGeometry>>, Error> {
        Ok(self.roads.get(road_id).cloned())
    }

    fn place_centroid(&self, place_id: &str) -> Result<Option<Point<f64>>, Error> {
        Ok(self.centroids.get(place_id).copied())
    }
}

/// A(0,0) - B(0,1) - C(0,2) along "Main St", weights 100 and 150
pub(crate) fn main_street_graph() -> RoadGraph {
    let mut graph = RoadGraph::new();
    let mut node = |id: &str, y: f64| {
        graph.add_node(GraphNode::Intersection {
            id: id.to_string(),
            position: Point::new(0.0, y),
        })
    };
    let (a, b, c) = (node("A", 0.0), node("B", 1.0), node("C", 2.0));
    let main = RoadSegment {
        id: "1101".to_string(),
        name: "Main St".to_string(),
    };
    for (from, to, weight) in [(a, b, 100.0), (b, c, 150.0)] {
        let mut edge = RoadEdge::pending(&main);
        edge.weight = Some(weight);
        edge.length = Some(weight);
        graph.add_edge(from, to, edge);
    }
    graph
}
