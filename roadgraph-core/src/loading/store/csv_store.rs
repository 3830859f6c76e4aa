//! Spatial store backed by CSV exports with WKT geometry columns

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use geo::{Geometry, MultiLineString, Point};
use hashbrown::HashMap;
use log::{info, warn};
use rayon::prelude::*;
use serde::Deserialize;
use wkt::TryFromWkt;

use super::{GeometryLookup, PlaceAttachment, PlaceSummary, RoadIntersection, SpatialStore};
use crate::{
    Error, NodeId, RoadId,
    model::{RoadClass, RoadGeometry, RoadSegment},
};

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawRoad {
    linearid: String,
    fullname: String,
    rttyp: String,
    mtfcc: String,
    geom: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawIntersection {
    r1id: String,
    r1name: String,
    r2id: String,
    r2name: String,
    intersection_point: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawPlace {
    gid: String,
    name: String,
    state_name: String,
    host_road_id: String,
    location: String,
    centroid: String,
}

#[derive(Debug)]
struct RoadRecord {
    segment: RoadSegment,
    geometry: Arc<RoadGeometry>,
}

#[derive(Debug)]
struct PlaceRecord {
    attachment: PlaceAttachment,
    state_name: String,
    centroid: Point<f64>,
}

/// Read-only store loaded from `roads.csv`, `road_intersections.csv` and
/// `places.csv` in one directory.
///
/// Rows that fail to parse are logged and skipped.
#[derive(Debug)]
pub struct CsvStore {
    dir: PathBuf,
    roads: HashMap<RoadId, RoadRecord>,
    /// Sorted by `(road_a.id, road_b.id)`
    intersections: Vec<RoadIntersection>,
    /// Sorted by place id
    places: Vec<PlaceRecord>,
    place_index: HashMap<NodeId, usize>,
}

impl CsvStore {
    pub const ROADS_FILE: &'static str = "roads.csv";
    pub const INTERSECTIONS_FILE: &'static str = "road_intersections.csv";
    pub const PLACES_FILE: &'static str = "places.csv";

    pub fn open(dir: impl AsRef<Path>) -> Result<Self, Error> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(Error::Store(format!(
                "Store directory not found: {}",
                dir.display()
            )));
        }

        let roads = load_roads(&dir.join(Self::ROADS_FILE))?;
        let intersections = load_intersections(&dir.join(Self::INTERSECTIONS_FILE))?;
        let places = load_places(&dir.join(Self::PLACES_FILE), &roads)?;
        let place_index = places
            .iter()
            .enumerate()
            .map(|(idx, place)| (place.attachment.id.clone(), idx))
            .collect();

        info!(
            "Opened store {}: {} roads, {} intersections, {} places",
            dir.display(),
            roads.len(),
            intersections.len(),
            places.len()
        );

        Ok(Self {
            dir: dir.to_path_buf(),
            roads,
            intersections,
            places,
            place_index,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn road(&self, road_id: &str) -> Option<&RoadSegment> {
        self.roads.get(road_id).map(|road| &road.segment)
    }
}

impl SpatialStore for CsvStore {
    fn road_intersections(
        &self,
        offset: usize,
        limit: usize,
    ) -> Result<Vec<RoadIntersection>, Error> {
        Ok(page(&self.intersections, offset, limit).to_vec())
    }

    fn place_attachments(&self, offset: usize, limit: usize) -> Result<Vec<PlaceAttachment>, Error> {
        Ok(page(&self.places, offset, limit)
            .iter()
            .map(|place| place.attachment.clone())
            .collect())
    }

    fn road_geometries(&self) -> Result<HashMap<RoadId, Arc<RoadGeometry>>, Error> {
        Ok(self
            .roads
            .iter()
            .map(|(id, road)| (id.clone(), Arc::clone(&road.geometry)))
            .collect())
    }

    fn search_places(&self, partial_name: &str) -> Result<Vec<PlaceSummary>, Error> {
        let prefix = partial_name.to_lowercase();
        let mut hits: Vec<_> = self
            .places
            .iter()
            .filter(|place| place.attachment.name.to_lowercase().starts_with(&prefix))
            .map(|place| PlaceSummary {
                id: place.attachment.id.clone(),
                city_name: place.attachment.name.clone(),
                state_name: place.state_name.clone(),
            })
            .collect();
        hits.sort_by(|a, b| a.city_name.cmp(&b.city_name).then_with(|| a.id.cmp(&b.id)));
        Ok(hits)
    }
}

impl GeometryLookup for CsvStore {
    fn road_geometry(&self, road_id: &str) -> Result<Option<Arc<RoadGeometry>>, Error> {
        Ok(self.roads.get(road_id).map(|road| Arc::clone(&road.geometry)))
    }

    fn place_centroid(&self, place_id: &str) -> Result<Option<Point<f64>>, Error> {
        Ok(self
            .place_index
            .get(place_id)
            .map(|&idx| self.places[idx].centroid))
    }
}

fn page<T>(rows: &[T], offset: usize, limit: usize) -> &[T] {
    let start = offset.min(rows.len());
    let end = offset.saturating_add(limit).min(rows.len());
    &rows[start..end]
}

fn read_rows<T>(path: &Path) -> Result<Vec<T>, Error>
where
    T: for<'de> serde::Deserialize<'de>,
{
    let mut reader = csv::Reader::from_path(path).map_err(|e| {
        Error::Store(format!("Failed to open file '{}': {e}", path.display()))
    })?;
    Ok(reader
        .deserialize()
        .enumerate()
        .filter_map(|(row, result)| match result {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("{}: skipping row {}: {e}", path.display(), row + 1);
                None
            }
        })
        .collect())
}

fn load_roads(path: &Path) -> Result<HashMap<RoadId, RoadRecord>, Error> {
    let raw: Vec<RawRoad> = read_rows(path)?;
    Ok(raw
        .into_par_iter()
        .filter_map(|raw| match parse_lines(&raw.geom) {
            Ok(lines) => {
                let record = RoadRecord {
                    segment: RoadSegment {
                        id: raw.linearid.clone(),
                        name: raw.fullname,
                    },
                    geometry: Arc::new(RoadGeometry {
                        class: RoadClass::from_codes(&raw.rttyp, &raw.mtfcc),
                        lines,
                    }),
                };
                Some((raw.linearid, record))
            }
            Err(e) => {
                warn!("Road {}: {e}", raw.linearid);
                None
            }
        })
        .collect::<Vec<_>>()
        .into_iter()
        .collect())
}

fn load_intersections(path: &Path) -> Result<Vec<RoadIntersection>, Error> {
    let raw: Vec<RawIntersection> = read_rows(path)?;
    let mut intersections: Vec<RoadIntersection> = raw
        .into_par_iter()
        .filter_map(|raw| match parse_point(&raw.intersection_point) {
            Ok(point) => Some(RoadIntersection {
                road_a: RoadSegment {
                    id: raw.r1id,
                    name: raw.r1name,
                },
                road_b: RoadSegment {
                    id: raw.r2id,
                    name: raw.r2name,
                },
                point,
            }),
            Err(e) => {
                warn!("Intersection of {} and {}: {e}", raw.r1id, raw.r2id);
                None
            }
        })
        .collect();
    intersections.sort_by(|a, b| {
        a.road_a
            .id
            .cmp(&b.road_a.id)
            .then_with(|| a.road_b.id.cmp(&b.road_b.id))
    });
    Ok(intersections)
}

fn load_places(
    path: &Path,
    roads: &HashMap<RoadId, RoadRecord>,
) -> Result<Vec<PlaceRecord>, Error> {
    let raw: Vec<RawPlace> = read_rows(path)?;
    let mut places: Vec<PlaceRecord> = raw
        .into_par_iter()
        .filter_map(|raw| {
            let Some(host) = roads.get(&raw.host_road_id) else {
                warn!("Place {}: unknown host road {}", raw.gid, raw.host_road_id);
                return None;
            };
            let location = parse_point(&raw.location);
            let centroid = (!raw.centroid.trim().is_empty()).then(|| parse_point(&raw.centroid));
            match (location, centroid.transpose()) {
                (Ok(location), Ok(centroid)) => Some(PlaceRecord {
                    attachment: PlaceAttachment {
                        id: raw.gid,
                        name: raw.name,
                        host_road: host.segment.clone(),
                        location,
                    },
                    state_name: raw.state_name,
                    centroid: centroid.unwrap_or(location),
                }),
                (Err(e), _) | (_, Err(e)) => {
                    warn!("Place {}: {e}", raw.gid);
                    None
                }
            }
        })
        .collect();
    places.sort_by(|a, b| a.attachment.id.cmp(&b.attachment.id));
    Ok(places)
}

fn parse_geometry(wkt: &str) -> Result<Geometry<f64>, Error> {
    Geometry::try_from_wkt_str(wkt).map_err(|e| Error::Wkt(format!("{e}: '{wkt}'")))
}

/// `LINESTRING` or `MULTILINESTRING`
fn parse_lines(wkt: &str) -> Result<MultiLineString<f64>, Error> {
    match parse_geometry(wkt)? {
        Geometry::LineString(line) => Ok(MultiLineString::new(vec![line])),
        Geometry::MultiLineString(lines) => Ok(lines),
        _ => Err(Error::Wkt(format!("expected a line geometry: '{wkt}'"))),
    }
}

/// `POINT`, or the first point of a `MULTIPOINT`
fn parse_point(wkt: &str) -> Result<Point<f64>, Error> {
    match parse_geometry(wkt)? {
        Geometry::Point(point) => Ok(point),
        Geometry::MultiPoint(points) => points
            .0
            .first()
            .copied()
            .ok_or_else(|| Error::Wkt(format!("empty multipoint: '{wkt}'"))),
        _ => Err(Error::Wkt(format!("expected a point geometry: '{wkt}'"))),
    }
}
