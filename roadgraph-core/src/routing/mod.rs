//! Shortest route search and route presentation

mod assembler;
mod dijkstra;
mod path;
mod response;

mod itinerary {
    mod to_geojson;
}

#[cfg(test)]
pub(crate) mod fixtures;

pub use assembler::{AssembledRoute, RouteAssembler, Traversal, merge_legs};
pub use response::{LegResponse, RouteResponse};
