use roadgraph_core::{RoadGraph, loading::CsvStore};

/// Shared, read-only state of the query service
pub struct AppState {
    pub graph: RoadGraph,
    pub store: CsvStore,
    pub on_line_tolerance: f64,
}
