use std::sync::Arc;

use hashbrown::HashMap;
use itertools::Itertools;
use log::{info, warn};

use super::config::GraphBuildConfig;
use super::dispatch::{DispatchOptions, WorkUnit, resolve_all};
use super::gather::{RawRoadFacts, gather_road_facts};
use super::store::SpatialStore;
use crate::{
    Error, RoadId,
    model::{GraphNode, GraphStats, RoadClass, RoadEdge, RoadGeometry, RoadGraph},
};

/// Outcome of [`build_road_graph`]
#[derive(Debug)]
pub struct BuildReport {
    pub graph: RoadGraph,
    /// Edges whose travelled geometry could not be resolved
    pub missing_geometry: usize,
    pub stats: GraphStats,
}

/// Builds the road graph from the facts in `store` and writes its snapshot
/// to `config.snapshot_path`.
///
/// # Errors
///
/// Returns an error if the configuration is invalid, the store fails, or
/// the snapshot cannot be written. Gathered facts are cached before a store
/// failure is returned.
pub fn build_road_graph(
    store: &dyn SpatialStore,
    config: &GraphBuildConfig,
) -> Result<BuildReport, Error> {
    config.validate()?;

    let facts = gather_road_facts(store, config)?;
    let mut graph = synthesize_graph(&facts);
    info!(
        "Synthesized graph with {} nodes and {} edges",
        graph.node_count(),
        graph.edge_count()
    );

    info!("Loading road geometries");
    let geometries = store.road_geometries()?;
    let options = DispatchOptions {
        workers: config.workers,
        poll_interval: config.poll_interval(),
        tolerance: config.on_line_tolerance,
    };
    resolve_edge_geometry(&mut graph, &geometries, &options);

    graph.save(&config.snapshot_path)?;

    let stats = graph.stats();
    info!(
        "Road graph built: {} nodes ({} places), {} edges, {} without geometry",
        stats.nodes, stats.places, stats.edges, stats.missing_geometry
    );
    if stats.missing_geometry > 0 {
        warn!(
            "{} of {} edges have no resolved geometry and will not be routed over",
            stats.missing_geometry, stats.edges
        );
    }

    // Fact gathering and WKT parsing leave large freed allocations behind.
    // This returns free memory at the tail of the heap to the system.
    //
    // # Safety
    //
    // This call is safe to use on linux with glibc implementation
    // which is checked by the cfg attribute in compile time.
    #[cfg(all(target_os = "linux", target_env = "gnu"))]
    unsafe {
        if libc::malloc_trim(0) == 0 {
            log::warn!("Memory trimming failed - continuing anyway");
        } else {
            log::debug!("Successfully trimmed unused heap memory");
        }
    }

    Ok(BuildReport {
        missing_geometry: stats.missing_geometry,
        stats,
        graph,
    })
}

/// One edge per unordered pair of nodes sharing a road; geometry and
/// weight are left pending
pub(crate) fn synthesize_graph(facts: &RawRoadFacts) -> RoadGraph {
    let mut graph = RoadGraph::new();
    for (road_id, nodes) in &facts.road_nodes {
        let Some(road) = facts.roads.get(road_id) else {
            warn!("Nodes recorded for unknown road {road_id}");
            continue;
        };
        for (a, b) in nodes.iter().tuple_combinations() {
            if a.id() == b.id() {
                continue;
            }
            let a = graph.add_node(GraphNode::from(a));
            let b = graph.add_node(GraphNode::from(b));
            graph.add_edge(a, b, RoadEdge::pending(road));
        }
    }
    graph
}

/// Resolves the travelled geometry of every edge and derives its weight.
/// Returns the number of edges left without geometry.
pub(crate) fn resolve_edge_geometry(
    graph: &mut RoadGraph,
    geometries: &HashMap<RoadId, Arc<RoadGeometry>>,
    options: &DispatchOptions,
) -> usize {
    let mut units = Vec::with_capacity(graph.edge_count());
    for (idx, a, b, edge) in graph.edges() {
        match geometries.get(&edge.road_id) {
            Some(geometry) => units.push(WorkUnit {
                id: idx.index(),
                from: a.position(),
                road_id: edge.road_id.clone(),
                to: b.position(),
                geometry: Arc::clone(geometry),
            }),
            None => warn!("No geometry stored for road {}", edge.road_id),
        }
    }

    let mut resolved = resolve_all(units, options);

    let mut missing = 0;
    let indices: Vec<_> = graph.graph.edge_indices().collect();
    for idx in indices {
        let Some(edge) = graph.edge_mut(idx) else {
            continue;
        };
        let class = geometries
            .get(&edge.road_id)
            .map_or(RoadClass::Ordinary, |geometry| geometry.class);
        edge.resolve(class, resolved.remove(&idx.index()).flatten());
        if !edge.is_routable() {
            missing += 1;
        }
    }
    missing
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::geometry::haversine_length;
    use crate::loading::CsvStore;
    use crate::loading::fixtures::write_sample_store;
    use crate::loading::gather::GatherStage;
    use crate::model::{NodeRecord, RoadSegment};
    use crate::routing::RouteAssembler;

    fn config(dir: &std::path::Path) -> GraphBuildConfig {
        GraphBuildConfig {
            snapshot_path: dir.join("graph.json"),
            raw_facts_path: dir.join("facts.json"),
            page_size: 2,
            workers: 3,
            poll_interval: 5,
            ..GraphBuildConfig::default()
        }
    }

    #[test]
    fn rebuild_reuses_gathered_facts() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_store(dir.path());
        let store = CsvStore::open(dir.path()).unwrap();
        let config = config(dir.path());

        let first = build_road_graph(&store, &config).unwrap();
        let second = build_road_graph(&store, &config).unwrap();
        assert_eq!(second.stats, first.stats);
        assert!(RawRoadFacts::load(&config.raw_facts_path).unwrap().unwrap().is_complete());
    }

    #[test]
    fn snapshot_cannot_share_the_fact_cache_path() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_store(dir.path());
        let store = CsvStore::open(dir.path()).unwrap();
        let config = GraphBuildConfig {
            raw_facts_path: dir.path().join("graph.json"),
            ..config(dir.path())
        };

        assert!(matches!(build_road_graph(&store, &config), Err(Error::InvalidData(_))));
        assert!(!dir.path().join("graph.json").exists());
    }

    #[test]
    fn builds_the_sample_ladder() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_store(dir.path());
        let store = CsvStore::open(dir.path()).unwrap();
        let config = config(dir.path());

        let report = build_road_graph(&store, &config).unwrap();
        let graph = &report.graph;

        assert_eq!(report.stats.nodes, 7);
        assert_eq!(report.stats.places, 3);
        assert_eq!(report.stats.edges, 10);
        // Shelbyville and the Elm St / I-10 corner snap to the same vertex
        assert_eq!(report.missing_geometry, 1);
        assert!(!graph.edge_between("102", "1102_1104").unwrap().is_routable());

        for (_, a, b, _) in graph.edges() {
            assert_ne!(a.id(), b.id());
        }

        let main = graph.edge_between("1101_1102", "1101_1103").unwrap();
        assert_eq!(main.name, "Main St");
        assert_eq!(main.geometry.as_ref().map(|g| g.0.len()), Some(3));

        let interstate = graph.edge_between("1102_1104", "1103_1104").unwrap();
        let length = haversine_length(interstate.geometry.as_ref().unwrap());
        assert_eq!(interstate.class, RoadClass::LimitedAccess);
        assert_eq!(interstate.weight, Some(length * 5.0));

        let reloaded = RoadGraph::load(&config.snapshot_path).unwrap();
        assert_eq!(reloaded.stats(), report.stats);
    }

    #[test]
    fn routes_over_the_built_graph() {
        let dir = tempfile::tempdir().unwrap();
        write_sample_store(dir.path());
        let store = CsvStore::open(dir.path()).unwrap();
        let report = build_road_graph(&store, &config(dir.path())).unwrap();

        let route = report.graph.shortest_route("100", "1103_1104").unwrap();
        let assembled = RouteAssembler::new(&store).assemble(route);

        let names: Vec<_> = assembled.legs.iter().map(|leg| leg.name.as_str()).collect();
        assert_eq!(names, ["Main St", "Oak Ave"]);
        assert_eq!(
            assembled.steps[0].trimmed_geometry.as_ref().map(|g| g.0.len()),
            Some(2)
        );
        let one_degree = 111_195.0;
        assert!((assembled.distance() - 2.0 * one_degree).abs() < 200.0);
    }

    #[test]
    fn pairs_on_one_node_are_not_connected() {
        let node = NodeRecord::Intersection {
            id: "1_2".to_string(),
            lat: 0.0,
            lon: 0.0,
        };
        let other = NodeRecord::Intersection {
            id: "1_3".to_string(),
            lat: 0.0,
            lon: 1.0,
        };
        let facts = RawRoadFacts {
            stage: GatherStage::Complete,
            roads: BTreeMap::from([(
                "1".to_string(),
                RoadSegment {
                    id: "1".to_string(),
                    name: "Main St".to_string(),
                },
            )]),
            road_nodes: BTreeMap::from([
                ("1".to_string(), vec![node.clone(), node, other]),
                ("9".to_string(), Vec::new()),
            ]),
        };

        let graph = synthesize_graph(&facts);
        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.stats().missing_geometry, 1);
    }

    #[test]
    fn edges_of_roads_without_geometry_stay_unweighted() {
        let facts = RawRoadFacts {
            stage: GatherStage::Complete,
            roads: BTreeMap::from([(
                "1".to_string(),
                RoadSegment {
                    id: "1".to_string(),
                    name: "Main St".to_string(),
                },
            )]),
            road_nodes: BTreeMap::from([(
                "1".to_string(),
                vec![
                    NodeRecord::Intersection {
                        id: "1_2".to_string(),
                        lat: 0.0,
                        lon: 0.0,
                    },
                    NodeRecord::Intersection {
                        id: "1_3".to_string(),
                        lat: 0.0,
                        lon: 1.0,
                    },
                ],
            )]),
        };
        let mut graph = synthesize_graph(&facts);

        let missing = resolve_edge_geometry(&mut graph, &HashMap::new(), &DispatchOptions::default());
        assert_eq!(missing, 1);
        assert!(matches!(
            graph.shortest_route("1_2", "1_3"),
            Err(Error::NoPath { .. })
        ));
    }
}
