//! Road graph construction and route resolution.
//!
//! Intersection and place facts gathered from a spatial store are assembled
//! into an undirected weighted [`RoadGraph`]; the travelled geometry of every
//! edge is resolved in parallel by localizing its endpoints on the road
//! polyline. Shortest routes are expanded into steps and merged into
//! presentable legs.

pub mod error;
pub mod geometry;
pub mod loading;
pub mod model;
pub mod prelude;
pub mod routing;

pub use error::Error;
pub use loading::{BuildReport, GraphBuildConfig, build_road_graph};
pub use model::{GraphNode, RoadEdge, RoadGraph, Route, Step};

/// Identifier of a road segment in the spatial store
pub type RoadId = String;
/// Identifier of a graph node (intersection or place)
pub type NodeId = String;
/// Distance in metres
pub type Meters = f64;
