//! JSON shape of a route answer

use serde::{Deserialize, Serialize};

use super::assembler::AssembledRoute;
use crate::{
    geometry::BoundingBox,
    model::{Distance, Leg},
};

/// Route answer: merged legs plus route-wide extent and distance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteResponse {
    pub route_id: String,
    pub steps: Vec<LegResponse>,
    pub minx: Option<f64>,
    pub miny: Option<f64>,
    pub maxx: Option<f64>,
    pub maxy: Option<f64>,
    pub distance: Distance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegResponse {
    pub lat: f64,
    pub lon: f64,
    pub next_edge_name: String,
    pub distance: Distance,
    pub steps: Vec<usize>,
    pub minx: Option<f64>,
    pub miny: Option<f64>,
    pub maxx: Option<f64>,
    pub maxy: Option<f64>,
}

impl RouteResponse {
    pub fn new(route_id: impl Into<String>, route: &AssembledRoute) -> Self {
        let (minx, miny, maxx, maxy) = bounds(route.bbox());
        Self {
            route_id: route_id.into(),
            steps: route.legs.iter().map(LegResponse::from).collect(),
            minx,
            miny,
            maxx,
            maxy,
            distance: Distance::from_meters(route.distance()),
        }
    }
}

impl From<&Leg> for LegResponse {
    fn from(leg: &Leg) -> Self {
        let (minx, miny, maxx, maxy) = bounds(leg.bbox);
        Self {
            lat: leg.lat,
            lon: leg.lon,
            next_edge_name: leg.name.clone(),
            distance: Distance::from_meters(leg.distance),
            steps: leg.step_ids.clone(),
            minx,
            miny,
            maxx,
            maxy,
        }
    }
}

fn bounds(bbox: Option<BoundingBox>) -> (Option<f64>, Option<f64>, Option<f64>, Option<f64>) {
    match bbox {
        Some(b) => (Some(b.min_x), Some(b.min_y), Some(b.max_x), Some(b.max_y)),
        None => (None, None, None, None),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn legs_without_geometry_have_null_bounds() {
        let route = AssembledRoute {
            steps: Vec::new(),
            legs: vec![
                Leg {
                    lat: 0.0,
                    lon: 0.0,
                    name: "Main St".to_string(),
                    distance: 250.0,
                    bbox: None,
                    step_ids: vec![0, 1],
                },
                Leg {
                    lat: 2.0,
                    lon: 0.0,
                    name: "Oak Ave".to_string(),
                    distance: 2000.0,
                    bbox: Some(BoundingBox {
                        min_x: 0.0,
                        min_y: 2.0,
                        max_x: 1.0,
                        max_y: 3.0,
                    }),
                    step_ids: vec![2],
                },
            ],
        };

        let value = serde_json::to_value(RouteResponse::new("r-1", &route)).unwrap();
        assert_eq!(
            value,
            json!({
                "route_id": "r-1",
                "steps": [
                    {
                        "lat": 0.0,
                        "lon": 0.0,
                        "next_edge_name": "Main St",
                        "distance": {"val": "820.21", "unit": "feet"},
                        "steps": [0, 1],
                        "minx": null,
                        "miny": null,
                        "maxx": null,
                        "maxy": null
                    },
                    {
                        "lat": 2.0,
                        "lon": 0.0,
                        "next_edge_name": "Oak Ave",
                        "distance": {"val": "1.24", "unit": "miles"},
                        "steps": [2],
                        "minx": 0.0,
                        "miny": 2.0,
                        "maxx": 1.0,
                        "maxy": 3.0
                    }
                ],
                "minx": 0.0,
                "miny": 2.0,
                "maxx": 1.0,
                "maxy": 3.0,
                "distance": {"val": "1.40", "unit": "miles"}
            })
        );
    }
}
