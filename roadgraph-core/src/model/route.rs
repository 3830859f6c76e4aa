//! Per-query route types: raw steps, merged legs and display distances

use geo::{LineString, Point};
use serde::{Deserialize, Serialize};

use super::graph::{GraphNode, RoadEdge};
use crate::geometry::{BoundingBox, haversine_length};
use crate::{Meters, NodeId, RoadId};

/// Ordered steps of one shortest route
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Route {
    pub steps: Vec<Step>,
}

/// A node on a route together with the edge leaving it.
///
/// The terminal step has no outgoing edge.
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub node_id: NodeId,
    /// x = lon, y = lat
    pub position: Point<f64>,
    pub next_edge_id: Option<RoadId>,
    pub next_edge_name: Option<String>,
    pub city_name: Option<String>,
    /// Portion of the outgoing road travelled from this step to the next
    pub trimmed_geometry: Option<LineString<f64>>,
    /// Build-time metric length of the outgoing edge
    pub edge_length: Option<Meters>,
}

impl Step {
    pub fn new(node: &GraphNode, next_edge: Option<&RoadEdge>) -> Self {
        Self {
            node_id: node.id().to_string(),
            position: node.position(),
            next_edge_id: next_edge.map(|edge| edge.road_id.clone()),
            next_edge_name: next_edge.map(|edge| edge.name.clone()),
            city_name: node.city_name().map(str::to_string),
            trimmed_geometry: None,
            edge_length: next_edge.and_then(|edge| edge.length),
        }
    }

    pub fn lat(&self) -> f64 {
        self.position.y()
    }

    pub fn lon(&self) -> f64 {
        self.position.x()
    }

    /// Metres travelled from this step: the trimmed geometry when resolved,
    /// otherwise the build-time edge length
    pub fn distance(&self) -> Meters {
        self.trimmed_geometry
            .as_ref()
            .map(haversine_length)
            .or(self.edge_length)
            .unwrap_or(0.0)
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        self.trimmed_geometry.as_ref().and_then(BoundingBox::of_line)
    }
}

/// Consecutive steps travelling the same named road
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub lat: f64,
    pub lon: f64,
    pub name: String,
    pub distance: Meters,
    pub bbox: Option<BoundingBox>,
    /// Positions of the constituent steps in the route
    pub step_ids: Vec<usize>,
}

/// Unit of a formatted [`Distance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    Feet,
    Miles,
}

/// Human readable distance, e.g. `{"val": "820.21", "unit": "feet"}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Distance {
    pub val: String,
    pub unit: DistanceUnit,
}

impl Distance {
    /// Distances below one mile are shown in feet
    pub const MILE_THRESHOLD: Meters = 1609.34;
    pub const FEET_PER_METER: f64 = 3.280_839_895;
    pub const MILES_PER_METER: f64 = 0.000_621_371;

    pub fn from_meters(meters: Meters) -> Self {
        if meters < Self::MILE_THRESHOLD {
            Self {
                val: format!("{:.2}", meters * Self::FEET_PER_METER),
                unit: DistanceUnit::Feet,
            }
        } else {
            Self {
                val: format!("{:.2}", meters * Self::MILES_PER_METER),
                unit: DistanceUnit::Miles,
            }
        }
    }
}
