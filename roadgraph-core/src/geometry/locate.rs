use geo::{Coord, Distance, Euclidean, Line, LineString, Point};

/// Distance (in coordinate units) within which a point counts as lying on a line
pub const DEFAULT_ON_LINE_TOLERANCE: f64 = 1e-9;

/// Finds the index of the vertex of `line` nearest to `point`.
///
/// `point` is expected to lie on the line already (callers check this with
/// an intersection test first). The search bisects the index range: the left
/// half is kept when its sub-polyline touches the point, otherwise the right
/// half is searched unless the point sits on the segment joining the two
/// halves. This assumes the polyline does not revisit its own
/// path, so results on self-intersecting geometry are approximate.
///
/// The halving takes O(log N) steps, but each step scans the left
/// sub-polyline segment by segment, so one call costs O(N) distance tests.
///
/// Returns `None` only for an empty line.
pub fn locate(line: &LineString<f64>, point: Point<f64>) -> Option<usize> {
    locate_with_tolerance(line, point, DEFAULT_ON_LINE_TOLERANCE)
}

/// [`locate`] with an explicit on-line tolerance
pub fn locate_with_tolerance(
    line: &LineString<f64>,
    point: Point<f64>,
    tolerance: f64,
) -> Option<usize> {
    let coords = line.0.as_slice();
    if coords.is_empty() {
        return None;
    }

    let (mut lo, mut hi) = (0, coords.len() - 1);
    loop {
        match hi - lo {
            0 => return Some(lo),
            1 => return Some(nearer(coords, point, lo, hi)),
            width => {
                let pivot = lo + width / 2;
                if touches(&coords[lo..=pivot], point, tolerance) {
                    hi = pivot;
                } else if touches(&coords[pivot..=pivot + 1], point, tolerance) {
                    // The segment bridging both halves belongs to neither
                    return Some(nearer(coords, point, pivot, pivot + 1));
                } else {
                    lo = pivot + 1;
                }
            }
        }
    }
}

/// Whether any segment of the polyline formed by `coords` passes within
/// `tolerance` of `point`
pub(crate) fn touches(coords: &[Coord<f64>], point: Point<f64>, tolerance: f64) -> bool {
    coords
        .windows(2)
        .any(|pair| Euclidean.distance(&point, &Line::new(pair[0], pair[1])) <= tolerance)
}

// Ties go to the upper index
fn nearer(coords: &[Coord<f64>], point: Point<f64>, lo: usize, hi: usize) -> usize {
    let to_lo = Euclidean.distance(&Point::from(coords[lo]), &point);
    let to_hi = Euclidean.distance(&Point::from(coords[hi]), &point);
    if to_lo < to_hi { lo } else { hi }
}
