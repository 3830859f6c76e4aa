//! Data model for road graph routing
//!
//! Contains road facts from the spatial store, the graph built from them,
//! its persisted snapshot schema and per-query route types.

pub mod graph;
pub mod road;
pub mod route;
pub mod snapshot;

pub use graph::{GraphNode, GraphStats, RoadEdge, RoadGraph};
pub use road::{RoadClass, RoadGeometry, RoadSegment, intersection_node_id};
pub use route::{Distance, DistanceUnit, Leg, Route, Step};
pub use snapshot::{EdgeRecord, GraphSnapshot, NodeRecord};
