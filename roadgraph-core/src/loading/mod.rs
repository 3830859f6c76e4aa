//! This module is responsible for gathering road facts from a spatial store
//! and building the weighted road graph from them.

mod builder;
mod config;
pub mod dispatch;
pub mod gather;
mod store;

#[cfg(test)]
pub(crate) mod fixtures;

pub use builder::{BuildReport, build_road_graph};
pub use config::GraphBuildConfig;
pub use dispatch::{DispatchOptions, WorkUnit, resolve_all, resolve_all_with};
pub use gather::{GatherStage, RawRoadFacts, gather_road_facts};
pub use store::{
    CsvStore, GeometryLookup, PlaceAttachment, PlaceSummary, RoadIntersection, SpatialStore,
};
