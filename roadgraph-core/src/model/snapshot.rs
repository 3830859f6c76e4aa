//! Durable graph snapshot: a node table and an edge table referencing
//! node ids, serialized as JSON.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use geo::{Coord, LineString, Point};
use hashbrown::HashSet;
use log::info;
use serde::{Deserialize, Serialize};

use super::graph::{GraphNode, RoadEdge, RoadGraph};
use super::road::RoadClass;
use crate::{Error, Meters, NodeId, RoadId};

/// Bumped whenever the snapshot schema changes
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub version: u32,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

/// Serialized node; also used for the node facts gathered before a build
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NodeRecord {
    Intersection {
        id: NodeId,
        lat: f64,
        lon: f64,
    },
    Place {
        id: NodeId,
        city_name: String,
        lat: f64,
        lon: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub road_id: RoadId,
    pub endpoint_a: NodeId,
    pub endpoint_b: NodeId,
    pub name: String,
    pub class: RoadClass,
    pub weight: Option<f64>,
    pub length: Option<Meters>,
    /// `[lon, lat]` pairs
    pub geometry: Option<Vec<[f64; 2]>>,
}

impl NodeRecord {
    pub fn id(&self) -> &str {
        match self {
            NodeRecord::Intersection { id, .. } | NodeRecord::Place { id, .. } => id,
        }
    }
}

impl From<&NodeRecord> for GraphNode {
    fn from(record: &NodeRecord) -> Self {
        match record {
            NodeRecord::Intersection { id, lat, lon } => GraphNode::Intersection {
                id: id.clone(),
                position: Point::new(*lon, *lat),
            },
            NodeRecord::Place {
                id,
                city_name,
                lat,
                lon,
            } => GraphNode::Place {
                id: id.clone(),
                city_name: city_name.clone(),
                position: Point::new(*lon, *lat),
            },
        }
    }
}

impl From<&GraphNode> for NodeRecord {
    fn from(node: &GraphNode) -> Self {
        match node {
            GraphNode::Intersection { id, position } => NodeRecord::Intersection {
                id: id.clone(),
                lat: position.y(),
                lon: position.x(),
            },
            GraphNode::Place {
                id,
                city_name,
                position,
            } => NodeRecord::Place {
                id: id.clone(),
                city_name: city_name.clone(),
                lat: position.y(),
                lon: position.x(),
            },
        }
    }
}

impl GraphSnapshot {
    pub fn from_graph(graph: &RoadGraph) -> Self {
        let nodes = graph.nodes().map(NodeRecord::from).collect();
        let edges = graph
            .edges()
            .map(|(_, a, b, edge)| EdgeRecord {
                road_id: edge.road_id.clone(),
                endpoint_a: a.id().to_string(),
                endpoint_b: b.id().to_string(),
                name: edge.name.clone(),
                class: edge.class,
                weight: edge.weight,
                length: edge.length,
                geometry: edge
                    .geometry
                    .as_ref()
                    .map(|line| line.coords().map(|c| [c.x, c.y]).collect()),
            })
            .collect();

        Self {
            version: SNAPSHOT_VERSION,
            nodes,
            edges,
        }
    }

    /// Rebuilds the graph, rejecting edges that reference unknown nodes or
    /// loop back onto their own node
    pub fn into_graph(self) -> Result<RoadGraph, Error> {
        if self.version != SNAPSHOT_VERSION {
            return Err(Error::SnapshotVersion {
                found: self.version,
                expected: SNAPSHOT_VERSION,
            });
        }

        let mut graph = RoadGraph::new();
        let mut seen = HashSet::with_capacity(self.nodes.len());
        for record in &self.nodes {
            if !seen.insert(record.id().to_string()) {
                return Err(Error::InvalidData(format!(
                    "Duplicate node {} in snapshot",
                    record.id()
                )));
            }
            graph.add_node(GraphNode::from(record));
        }

        for record in self.edges {
            let endpoint = |id: &str| {
                graph
                    .node_index(id)
                    .ok_or_else(|| Error::InvalidData(format!("Edge references unknown node {id}")))
            };
            let a = endpoint(&record.endpoint_a)?;
            let b = endpoint(&record.endpoint_b)?;

            let edge = RoadEdge {
                road_id: record.road_id,
                name: record.name,
                class: record.class,
                weight: record.weight,
                length: record.length,
                geometry: record.geometry.map(|coords| {
                    LineString::new(coords.into_iter().map(|[x, y]| Coord { x, y }).collect())
                }),
            };
            if graph.add_edge(a, b, edge).is_none() {
                return Err(Error::InvalidData(format!(
                    "Self-loop on node {} in snapshot",
                    record.endpoint_a
                )));
            }
        }

        Ok(graph)
    }

    /// Writes to a sibling temporary file first, then renames over `path`
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        let tmp_path = path.with_extension("tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp_path)?);
            serde_json::to_writer(&mut writer, self)?;
            writer.flush()?;
        }
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let reader = BufReader::new(File::open(path).map_err(|e| {
            std::io::Error::new(
                e.kind(),
                format!("Failed to open snapshot '{}': {}", path.display(), e),
            )
        })?);
        Ok(serde_json::from_reader(reader)?)
    }
}

impl RoadGraph {
    /// Persists the graph as a snapshot at `path`
    pub fn save(&self, path: &Path) -> Result<(), Error> {
        GraphSnapshot::from_graph(self).save(path)?;
        info!(
            "Saved graph snapshot with {} nodes and {} edges to {}",
            self.node_count(),
            self.edge_count(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let graph = GraphSnapshot::load(path)?.into_graph()?;
        let stats = graph.stats();
        info!(
            "Loaded graph snapshot: {} nodes ({} places), {} edges, {} without geometry",
            stats.nodes, stats.places, stats.edges, stats.missing_geometry
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::road::RoadSegment;
    use geo::line_string;

    fn sample_graph() -> RoadGraph {
        let mut graph = RoadGraph::new();
        let a = graph.add_node(GraphNode::Intersection {
            id: "1101_1102".to_string(),
            position: Point::new(-90.123_456_789_012_3, 30.1),
        });
        let b = graph.add_node(GraphNode::Place {
            id: "100".to_string(),
            city_name: "Springfield".to_string(),
            position: Point::new(-90.2, 30.000_000_000_000_004),
        });
        let c = graph.add_node(GraphNode::Intersection {
            id: "1101_1103".to_string(),
            position: Point::new(-90.3, 30.3),
        });

        let main = RoadSegment {
            id: "1101".to_string(),
            name: "Main St".to_string(),
        };
        let mut resolved = RoadEdge::pending(&main);
        resolved.resolve(
            RoadClass::LimitedAccess,
            Some(line_string![
                (x: -90.123_456_789_012_3, y: 30.1),
                (x: -90.15, y: 30.05),
                (x: -90.2, y: 30.000_000_000_000_004),
            ]),
        );
        graph.add_edge(a, b, resolved);
        graph.add_edge(b, c, RoadEdge::pending(&main));
        graph
    }

    #[test]
    fn snapshot_round_trips_exactly() {
        let graph = sample_graph();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("snapshot.json");

        graph.save(&path).unwrap();
        let loaded = RoadGraph::load(&path).unwrap();
        assert!(!path.with_extension("tmp").exists());

        assert_eq!(GraphSnapshot::from_graph(&loaded), GraphSnapshot::from_graph(&graph));
        assert_eq!(loaded.node("100"), graph.node("100"));
        assert_eq!(
            loaded.edge_between("1101_1102", "100"),
            graph.edge_between("1101_1102", "100")
        );
        assert_eq!(loaded.stats(), graph.stats());
    }

    #[test]
    fn rejects_dangling_edges() {
        let mut snapshot = GraphSnapshot::from_graph(&sample_graph());
        snapshot.edges[0].endpoint_b = "missing".to_string();
        assert!(matches!(snapshot.into_graph(), Err(Error::InvalidData(_))));
    }

    #[test]
    fn rejects_other_versions() {
        let mut snapshot = GraphSnapshot::from_graph(&sample_graph());
        snapshot.version = SNAPSHOT_VERSION + 1;
        assert!(matches!(
            snapshot.into_graph(),
            Err(Error::SnapshotVersion { .. })
        ));
    }
}
