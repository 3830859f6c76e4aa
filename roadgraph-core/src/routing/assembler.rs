//! Route presentation: per-step geometry trimming and leg merging

use geo::{LineString, Point};
use itertools::Itertools;
use log::{debug, warn};

use crate::{
    Error, Meters,
    geometry::{BoundingBox, DEFAULT_ON_LINE_TOLERANCE, trim_with_tolerance},
    loading::GeometryLookup,
    model::{Leg, Route, Step},
};

/// Something travelled along one named road, mergeable into a [`Leg`]
pub trait Traversal {
    /// Name of the road travelled; `None` for the terminal step
    fn edge_name(&self) -> Option<&str>;
    fn origin(&self) -> Point<f64>;
    fn distance_meters(&self) -> Meters;
    fn bbox(&self) -> Option<BoundingBox>;
    /// Route step positions covered, given this item's own position
    fn step_ids(&self, position: usize) -> Vec<usize>;
}

impl Traversal for Step {
    fn edge_name(&self) -> Option<&str> {
        self.next_edge_name.as_deref()
    }

    fn origin(&self) -> Point<f64> {
        self.position
    }

    fn distance_meters(&self) -> Meters {
        self.distance()
    }

    fn bbox(&self) -> Option<BoundingBox> {
        Step::bbox(self)
    }

    fn step_ids(&self, position: usize) -> Vec<usize> {
        vec![position]
    }
}

impl Traversal for Leg {
    fn edge_name(&self) -> Option<&str> {
        Some(&self.name)
    }

    fn origin(&self) -> Point<f64> {
        Point::new(self.lon, self.lat)
    }

    fn distance_meters(&self) -> Meters {
        self.distance
    }

    fn bbox(&self) -> Option<BoundingBox> {
        self.bbox
    }

    fn step_ids(&self, _position: usize) -> Vec<usize> {
        self.step_ids.clone()
    }
}

/// Folds runs of consecutive items travelling the same road name into legs.
///
/// Items without a road name close the current run and open none.
pub fn merge_legs<T: Traversal>(items: &[T]) -> Vec<Leg> {
    let runs = items
        .iter()
        .enumerate()
        .map(|(pos, item)| (pos, item.edge_name(), item))
        .chunk_by(|(_, name, _)| *name);

    let mut legs = Vec::new();
    for (name, run) in &runs {
        let Some(name) = name else {
            continue;
        };
        let run: Vec<_> = run.collect();
        let Some(&(_, _, first)) = run.first() else {
            continue;
        };
        let origin = first.origin();
        legs.push(Leg {
            lat: origin.y(),
            lon: origin.x(),
            name: name.to_string(),
            distance: run.iter().map(|(_, _, item)| item.distance_meters()).sum(),
            bbox: BoundingBox::union_all(run.iter().filter_map(|(_, _, item)| item.bbox())),
            step_ids: run
                .iter()
                .flat_map(|(pos, _, item)| item.step_ids(*pos))
                .collect(),
        });
    }
    legs
}

/// A route with trimmed step geometry and merged legs
#[derive(Debug, Clone, PartialEq)]
pub struct AssembledRoute {
    pub steps: Vec<Step>,
    pub legs: Vec<Leg>,
}

impl AssembledRoute {
    /// Total metres over all legs
    pub fn distance(&self) -> Meters {
        self.legs.iter().map(|leg| leg.distance).sum()
    }

    /// Extent of every resolved leg geometry
    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::union_all(self.legs.iter().filter_map(|leg| leg.bbox))
    }
}

/// Turns a raw [`Route`] into an [`AssembledRoute`] using road geometry
/// from a [`GeometryLookup`]
pub struct RouteAssembler<'a, G: GeometryLookup + ?Sized> {
    lookup: &'a G,
    tolerance: f64,
}

impl<'a, G: GeometryLookup + ?Sized> RouteAssembler<'a, G> {
    pub fn new(lookup: &'a G) -> Self {
        Self::with_tolerance(lookup, DEFAULT_ON_LINE_TOLERANCE)
    }

    pub fn with_tolerance(lookup: &'a G, tolerance: f64) -> Self {
        Self { lookup, tolerance }
    }

    pub fn assemble(&self, route: Route) -> AssembledRoute {
        let mut steps = route.steps;
        self.trim_steps(&mut steps);
        let legs = merge_legs(&steps);
        AssembledRoute { steps, legs }
    }

    /// Attaches to every step the part of its outgoing road travelled up to
    /// the next step, starting from the origin place's centroid when known.
    fn trim_steps(&self, steps: &mut [Step]) {
        let Some(origin) = steps.first() else {
            return;
        };
        let mut current = self.start_position(origin);

        for i in 0..steps.len().saturating_sub(1) {
            let target = steps[i + 1].position;
            if let Some(road_id) = steps[i].next_edge_id.clone() {
                match self.trim_road(&road_id, current, target) {
                    Ok(trimmed) => steps[i].trimmed_geometry = trimmed,
                    Err(err) => warn!(
                        "Step {} ({}) on road {road_id}: {err}",
                        i, steps[i].node_id
                    ),
                }
            }
            current = target;
        }
    }

    fn start_position(&self, origin: &Step) -> Point<f64> {
        if origin.city_name.is_none() {
            return origin.position;
        }
        match self.lookup.place_centroid(&origin.node_id) {
            Ok(Some(centroid)) => centroid,
            Ok(None) => origin.position,
            Err(err) => {
                warn!("Centroid of place {}: {err}", origin.node_id);
                origin.position
            }
        }
    }

    fn trim_road(
        &self,
        road_id: &str,
        from: Point<f64>,
        to: Point<f64>,
    ) -> Result<Option<LineString<f64>>, Error> {
        let Some(road) = self.lookup.road_geometry(road_id)? else {
            debug!("No geometry for road {road_id}");
            return Ok(None);
        };
        trim_with_tolerance(&road.lines, from, to, self.tolerance)
    }
}
