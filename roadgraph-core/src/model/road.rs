//! Immutable road facts sourced from the spatial store

use geo::MultiLineString;
use serde::{Deserialize, Serialize};

use crate::{NodeId, RoadId};

/// Road classification relevant to edge weighting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoadClass {
    /// Motorways and interstates
    LimitedAccess,
    #[default]
    Ordinary,
}

impl RoadClass {
    /// Multiplier applied to the metric length of limited-access edges
    pub const LIMITED_ACCESS_FACTOR: f64 = 5.0;

    pub fn weight_factor(self) -> f64 {
        match self {
            RoadClass::LimitedAccess => Self::LIMITED_ACCESS_FACTOR,
            RoadClass::Ordinary => 1.0,
        }
    }

    /// Classifies a road from its route type code (`rttyp`) and feature class
    /// code (`mtfcc`). Interstates (`I`), primary roads (`S1100`) and roads
    /// tagged `motorway`/`interstate` are limited-access.
    pub fn from_codes(route_type: &str, feature_class: &str) -> Self {
        let is_limited = |code: &str| {
            let code = code.trim();
            code.eq_ignore_ascii_case("I")
                || code.eq_ignore_ascii_case("S1100")
                || code.eq_ignore_ascii_case("motorway")
                || code.eq_ignore_ascii_case("interstate")
        };

        if is_limited(route_type) || is_limited(feature_class) {
            RoadClass::LimitedAccess
        } else {
            RoadClass::Ordinary
        }
    }
}

/// Road metadata gathered alongside intersections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadSegment {
    pub id: RoadId,
    pub name: String,
}

/// Full geometry of one road, possibly made of several parts
#[derive(Debug, Clone, PartialEq)]
pub struct RoadGeometry {
    pub class: RoadClass,
    pub lines: MultiLineString<f64>,
}

/// Deterministic node id of the intersection between two roads.
///
/// The two road ids are sorted before joining, so the same physical
/// intersection maps to one node whichever road pair is processed first.
pub fn intersection_node_id(road_a: &str, road_b: &str) -> NodeId {
    let (lo, hi) = if road_a <= road_b {
        (road_a, road_b)
    } else {
        (road_b, road_a)
    };
    format!("{lo}_{hi}")
}
