use thiserror::Error;

use crate::NodeId;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No path between {from} and {to}")]
    NoPath { from: NodeId, to: NodeId },
    #[error("Unknown node: {0}")]
    UnknownNode(NodeId),
    #[error("Points do not share a line part ({parts} parts checked)")]
    SameLineViolation { parts: usize },
    #[error("Geometry worker failed on unit {unit}: {reason}")]
    WorkerFailure { unit: usize, reason: String },
    #[error("Invalid data: {0}")]
    InvalidData(String),
    #[error("Spatial store error: {0}")]
    Store(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("WKT error: {0}")]
    Wkt(String),
    #[error("Unsupported snapshot version {found}, expected {expected}")]
    SnapshotVersion { found: u32, expected: u32 },
    #[error("GeoJSON error: {0}")]
    GeoJson(String),
}
