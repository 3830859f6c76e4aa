// Re-export key components
pub use crate::geometry::{BoundingBox, haversine_length, locate, trim};
pub use crate::loading::{
    BuildReport, CsvStore, GeometryLookup, GraphBuildConfig, PlaceSummary, SpatialStore,
    build_road_graph,
};
pub use crate::model::{
    Distance, DistanceUnit, GraphNode, GraphStats, Leg, RoadClass, RoadEdge, RoadGraph, Route,
    Step, intersection_node_id,
};
pub use crate::routing::{AssembledRoute, RouteAssembler, RouteResponse, merge_legs};

pub use crate::Error;
pub use crate::{Meters, NodeId, RoadId};
