//! Paged gathering of road facts with a resumable on-disk cache

use std::{
    collections::BTreeMap,
    fs::{self, File},
    io::{BufReader, BufWriter, Write},
    path::Path,
};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::{GraphBuildConfig, SpatialStore};
use crate::{
    Error, RoadId,
    model::{NodeRecord, RoadSegment, intersection_node_id},
};

/// How far gathering got; paging restarts from `next_offset`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatherStage {
    Intersections { next_offset: usize },
    Places { next_offset: usize },
    Complete,
}

/// Roads and the nodes lying on each of them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRoadFacts {
    pub stage: GatherStage,
    pub roads: BTreeMap<RoadId, RoadSegment>,
    pub road_nodes: BTreeMap<RoadId, Vec<NodeRecord>>,
}

impl Default for RawRoadFacts {
    fn default() -> Self {
        Self {
            stage: GatherStage::Intersections { next_offset: 0 },
            roads: BTreeMap::new(),
            road_nodes: BTreeMap::new(),
        }
    }
}

impl RawRoadFacts {
    /// Cached facts at `path`, `None` when nothing was cached yet
    pub fn load(path: &Path) -> Result<Option<Self>, Error> {
        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        Ok(Some(serde_json::from_reader(BufReader::new(file))?))
    }

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

    pub fn is_complete(&self) -> bool {
        self.stage == GatherStage::Complete
    }

    pub fn node_count(&self) -> usize {
        self.road_nodes.values().map(Vec::len).sum()
    }

    fn attach(&mut self, road: &RoadSegment, node: NodeRecord) {
        self.roads
            .entry(road.id.clone())
            .or_insert_with(|| road.clone());
        let nodes = self.road_nodes.entry(road.id.clone()).or_default();
        if !nodes.iter().any(|known| known.id() == node.id()) {
            nodes.push(node);
        }
    }

    /// Pulls pages from the store until both tables are exhausted.
    ///
    /// `stage` only advances past a page once all its rows are recorded, so
    /// an error leaves `self` resumable.
    fn gather(&mut self, store: &dyn SpatialStore, page_size: usize) -> Result<(), Error> {
        loop {
            match self.stage {
                GatherStage::Intersections { next_offset } => {
                    info!("Gathering road intersections from offset {next_offset}");
                    let page = store.road_intersections(next_offset, page_size)?;
                    if page.is_empty() {
                        self.stage = GatherStage::Places { next_offset: 0 };
                        continue;
                    }
                    for row in &page {
                        if row.road_a.id == row.road_b.id {
                            warn!("Skipping self-intersection of road {}", row.road_a.id);
                            continue;
                        }
                        let node = NodeRecord::Intersection {
                            id: intersection_node_id(&row.road_a.id, &row.road_b.id),
                            lat: row.point.y(),
                            lon: row.point.x(),
                        };
                        self.attach(&row.road_a, node.clone());
                        self.attach(&row.road_b, node);
                    }
                    self.stage = GatherStage::Intersections {
                        next_offset: next_offset + page.len(),
                    };
                }
                GatherStage::Places { next_offset } => {
                    info!("Gathering places from offset {next_offset}");
                    let page = store.place_attachments(next_offset, page_size)?;
                    if page.is_empty() {
                        self.stage = GatherStage::Complete;
                        continue;
                    }
                    for place in &page {
                        let node = NodeRecord::Place {
                            id: place.id.clone(),
                            city_name: place.name.clone(),
                            lat: place.location.y(),
                            lon: place.location.x(),
                        };
                        self.attach(&place.host_road, node);
                    }
                    self.stage = GatherStage::Places {
                        next_offset: next_offset + page.len(),
                    };
                }
                GatherStage::Complete => return Ok(()),
            }
        }
    }
}

/// Gathers all road facts, reusing or resuming the cache at
/// `config.raw_facts_path`.
///
/// The cache is written when gathering completes and also when the store
/// fails part way, so a rerun continues where this one stopped.
pub fn gather_road_facts(
    store: &dyn SpatialStore,
    config: &GraphBuildConfig,
) -> Result<RawRoadFacts, Error> {
    let path = config.raw_facts_path.as_path();
    let mut facts = match RawRoadFacts::load(path)? {
        Some(facts) if facts.is_complete() => {
            info!(
                "Reusing gathered facts from {}: {} roads, {} road nodes",
                path.display(),
                facts.roads.len(),
                facts.node_count()
            );
            return Ok(facts);
        }
        Some(facts) => {
            info!("Resuming fact gathering at {:?}", facts.stage);
            facts
        }
        None => RawRoadFacts::default(),
    };

    if let Err(err) = facts.gather(store, config.page_size) {
        warn!(
            "Gathering stopped at {:?}: {err}; saving partial facts to {}",
            facts.stage,
            path.display()
        );
        facts.save(path)?;
        return Err(err);
    }

    facts.save(path)?;
    info!(
        "Gathered {} roads with {} road nodes",
        facts.roads.len(),
        facts.node_count()
    );
    Ok(facts)
}
