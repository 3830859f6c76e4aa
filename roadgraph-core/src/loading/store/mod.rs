//! Contract of the spatial store the graph is built from

mod csv_store;

use std::sync::Arc;

use geo::Point;
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};

pub use csv_store::CsvStore;

use crate::{
    Error, NodeId, RoadId,
    model::{RoadGeometry, RoadSegment},
};

/// Crossing point of two roads
#[derive(Debug, Clone, PartialEq)]
pub struct RoadIntersection {
    pub road_a: RoadSegment,
    pub road_b: RoadSegment,
    pub point: Point<f64>,
}

/// A place and the road it overlaps most
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceAttachment {
    pub id: NodeId,
    pub name: String,
    pub host_road: RoadSegment,
    /// Where the place meets its host road
    pub location: Point<f64>,
}

/// Place search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub id: NodeId,
    pub city_name: String,
    pub state_name: String,
}

/// Source of road facts for a graph build.
///
/// Paged queries must use a stable order so that any offset can be resumed.
pub trait SpatialStore: Send + Sync {
    fn road_intersections(&self, offset: usize, limit: usize)
    -> Result<Vec<RoadIntersection>, Error>;

    fn place_attachments(&self, offset: usize, limit: usize)
    -> Result<Vec<PlaceAttachment>, Error>;

    /// Full geometry of every road, keyed by road id
    fn road_geometries(&self) -> Result<HashMap<RoadId, Arc<RoadGeometry>>, Error>;

    /// Places whose name starts with `partial_name`, ignoring case
    fn search_places(&self, partial_name: &str) -> Result<Vec<PlaceSummary>, Error>;
}

/// Per-query geometry access used while assembling routes
pub trait GeometryLookup {
    fn road_geometry(&self, road_id: &str) -> Result<Option<Arc<RoadGeometry>>, Error>;

    fn place_centroid(&self, place_id: &str) -> Result<Option<Point<f64>>, Error>;
}
