use geo::{LineString, MultiLineString, Point};

use super::locate::{DEFAULT_ON_LINE_TOLERANCE, locate_with_tolerance, touches};
use crate::Error;

/// Cuts the part of a (possibly multi-part) road line lying between two
/// points on it.
///
/// The first part touching both points is used. Both points are localized
/// to vertex indices and the inclusive vertex range between them is
/// returned in the part's own direction.
///
/// Returns `Ok(None)` when both points localize to the same vertex, and
/// [`Error::SameLineViolation`] when no single part touches both points.
pub fn trim(
    parts: &MultiLineString<f64>,
    point_a: Point<f64>,
    point_b: Point<f64>,
) -> Result<Option<LineString<f64>>, Error> {
    trim_with_tolerance(parts, point_a, point_b, DEFAULT_ON_LINE_TOLERANCE)
}

/// [`trim`] with an explicit on-line tolerance
pub fn trim_with_tolerance(
    parts: &MultiLineString<f64>,
    point_a: Point<f64>,
    point_b: Point<f64>,
    tolerance: f64,
) -> Result<Option<LineString<f64>>, Error> {
    let part = parts
        .iter()
        .find(|part| touches(&part.0, point_a, tolerance) && touches(&part.0, point_b, tolerance))
        .ok_or(Error::SameLineViolation {
            parts: parts.0.len(),
        })?;

    let (Some(a), Some(b)) = (
        locate_with_tolerance(part, point_a, tolerance),
        locate_with_tolerance(part, point_b, tolerance),
    ) else {
        return Ok(None);
    };

    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    if lo == hi {
        return Ok(None);
    }

    Ok(Some(LineString::new(part.0[lo..=hi].to_vec())))
}
