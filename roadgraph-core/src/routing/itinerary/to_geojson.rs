use geo::{Coord, LineString};
use geojson::{Feature, FeatureCollection, Geometry, Value as GeoJsonValue};
use serde_json::json;

use crate::{
    Error,
    model::{Distance, Leg},
    routing::AssembledRoute,
};

impl AssembledRoute {
    /// Converts the route to a `GeoJSON` `FeatureCollection`: the origin as a
    /// point, then one line per leg whose step geometry was resolved.
    pub fn to_geojson(&self) -> Result<FeatureCollection, Error> {
        let mut features = Vec::new();

        if let Some(origin) = self.steps.first() {
            let geometry = Geometry::new(GeoJsonValue::from(&origin.position));
            let value = json!({
                "type": "Feature",
                "geometry": geometry,
                "properties": {
                    "kind": "origin",
                    "node_id": origin.node_id,
                    "city_name": origin.city_name,
                }
            });
            features.push(
                Feature::from_json_value(value).map_err(|e| Error::GeoJson(e.to_string()))?,
            );
        }

        for (idx, leg) in self.legs.iter().enumerate() {
            if let Some(line) = self.leg_line(leg) {
                features.push(create_leg_feature(idx, leg, &line)?);
            }
        }

        Ok(FeatureCollection {
            features,
            bbox: None,
            foreign_members: None,
        })
    }

    pub fn to_geojson_string(&self) -> Result<String, Error> {
        serde_json::to_string(&self.to_geojson()?).map_err(|e| Error::GeoJson(e.to_string()))
    }

    /// Trimmed geometries of the leg's steps joined end to end
    fn leg_line(&self, leg: &Leg) -> Option<LineString<f64>> {
        let mut coords: Vec<Coord<f64>> = Vec::new();
        for line in leg
            .step_ids
            .iter()
            .filter_map(|&id| self.steps.get(id)?.trimmed_geometry.as_ref())
        {
            let skip = usize::from(coords.last() == line.0.first());
            coords.extend(line.0.iter().skip(skip));
        }
        (coords.len() > 1).then(|| LineString::new(coords))
    }
}

fn create_leg_feature(leg_idx: usize, leg: &Leg, line: &LineString<f64>) -> Result<Feature, Error> {
    let geometry = Geometry::new(GeoJsonValue::from(line));
    let distance = Distance::from_meters(leg.distance);

    let value = json!({
        "type": "Feature",
        "geometry": geometry,
        "properties": {
            "kind": "leg",
            "leg_index": leg_idx,
            "name": leg.name,
            "distance_m": leg.distance,
            "distance": distance,
            "steps": leg.step_ids,
        }
    });

    Feature::from_json_value(value).map_err(|e| Error::GeoJson(e.to_string()))
}

#[cfg(test)]
mod tests {
    use geo::{Point, line_string};

    use super::*;
    use crate::model::Step;
    use crate::routing::merge_legs;

    fn step(id: &str, y: f64, line: Option<LineString<f64>>) -> Step {
        Step {
            node_id: id.to_string(),
            position: Point::new(0.0, y),
            next_edge_id: line.as_ref().map(|_| "1101".to_string()),
            next_edge_name: line.as_ref().map(|_| "Main St".to_string()),
            city_name: None,
            trimmed_geometry: line,
            edge_length: None,
        }
    }

    #[test]
    fn origin_point_and_joined_leg_line() {
        let steps = vec![
            step("A", 0.0, Some(line_string![(x: 0.0, y: 0.0), (x: 0.0, y: 1.0)])),
            step("B", 1.0, Some(line_string![(x: 0.0, y: 1.0), (x: 0.0, y: 2.0)])),
            step("C", 2.0, None),
        ];
        let legs = merge_legs(&steps);
        let route = AssembledRoute { steps, legs };

        let collection = route.to_geojson().unwrap();
        assert_eq!(collection.features.len(), 2);

        let parsed: serde_json::Value =
            serde_json::from_str(&route.to_geojson_string().unwrap()).unwrap();
        assert_eq!(parsed["type"], "FeatureCollection");

        let origin = &parsed["features"][0];
        assert_eq!(origin["geometry"]["type"], "Point");
        assert_eq!(origin["properties"]["node_id"], "A");

        let leg = &parsed["features"][1];
        assert_eq!(leg["geometry"]["type"], "LineString");
        assert_eq!(
            leg["geometry"]["coordinates"],
            json!([[0.0, 0.0], [0.0, 1.0], [0.0, 2.0]])
        );
        assert_eq!(leg["properties"]["name"], "Main St");
        assert_eq!(leg["properties"]["steps"], json!([0, 1]));
    }

    #[test]
    fn legs_without_geometry_are_left_out() {
        let mut first = step("A", 0.0, None);
        first.next_edge_id = Some("1101".to_string());
        first.next_edge_name = Some("Main St".to_string());
        let steps = vec![first, step("B", 1.0, None)];
        let legs = merge_legs(&steps);
        let route = AssembledRoute { steps, legs };

        assert_eq!(route.to_geojson().unwrap().features.len(), 1);
    }
}
