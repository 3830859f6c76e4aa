//! Road graph components - nodes and edges

use geo::{LineString, Point};

use crate::geometry::haversine_length;
use crate::model::road::{RoadClass, RoadSegment};
use crate::{Meters, NodeId, RoadId};

/// Road graph node
#[derive(Debug, Clone, PartialEq)]
pub enum GraphNode {
    /// Crossing of two roads
    Intersection { id: NodeId, position: Point<f64> },
    /// City or town attached to the road it overlaps most
    Place {
        id: NodeId,
        city_name: String,
        position: Point<f64>,
    },
}

impl GraphNode {
    pub fn id(&self) -> &str {
        match self {
            GraphNode::Intersection { id, .. } | GraphNode::Place { id, .. } => id,
        }
    }

    /// Node coordinates (x = lon, y = lat)
    pub fn position(&self) -> Point<f64> {
        match self {
            GraphNode::Intersection { position, .. } | GraphNode::Place { position, .. } => {
                *position
            }
        }
    }

    pub fn city_name(&self) -> Option<&str> {
        match self {
            GraphNode::Place { city_name, .. } => Some(city_name),
            GraphNode::Intersection { .. } => None,
        }
    }

    pub fn is_place(&self) -> bool {
        matches!(self, GraphNode::Place { .. })
    }
}

/// Road graph edge: the stretch of one road between two nodes
#[derive(Debug, Clone, PartialEq)]
pub struct RoadEdge {
    pub road_id: RoadId,
    pub name: String,
    pub class: RoadClass,
    /// Routing cost; `None` when the travelled geometry could not be resolved
    pub weight: Option<f64>,
    /// Metric length of `geometry`
    pub length: Option<Meters>,
    pub geometry: Option<LineString<f64>>,
}

impl RoadEdge {
    /// Edge whose geometry and weight are not resolved yet
    pub fn pending(road: &RoadSegment) -> Self {
        Self {
            road_id: road.id.clone(),
            name: road.name.clone(),
            class: RoadClass::default(),
            weight: None,
            length: None,
            geometry: None,
        }
    }

    /// Attaches the resolved geometry, deriving length and class-scaled weight
    pub fn resolve(&mut self, class: RoadClass, geometry: Option<LineString<f64>>) {
        self.class = class;
        self.length = geometry.as_ref().map(haversine_length);
        self.weight = self.length.map(|length| length * class.weight_factor());
        self.geometry = geometry;
    }

    pub fn is_routable(&self) -> bool {
        self.weight.is_some_and(|w| w.is_finite() && w >= 0.0)
    }
}
