//! Road network graph

pub mod components;
pub mod network;

pub use components::{GraphNode, RoadEdge};
pub use network::{GraphStats, RoadGraph};
