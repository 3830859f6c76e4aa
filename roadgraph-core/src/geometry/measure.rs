use geo::{BoundingRect, Distance, Haversine, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::Meters;

/// Great-circle length of a lon/lat polyline in metres
pub fn haversine_length(line: &LineString<f64>) -> Meters {
    line.lines()
        .map(|segment| Haversine.distance(Point::from(segment.start), Point::from(segment.end)))
        .sum()
}

/// Axis-aligned extent of one or more geometries
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn of_line(line: &LineString<f64>) -> Option<Self> {
        line.bounding_rect().map(|rect| Self {
            min_x: rect.min().x,
            min_y: rect.min().y,
            max_x: rect.max().x,
            max_y: rect.max().y,
        })
    }

    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Union of every box in `boxes`, `None` when the iterator is empty
    pub fn union_all<I>(boxes: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        boxes.into_iter().reduce(Self::union)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::line_string;

    #[test]
    fn one_degree_of_longitude_on_the_equator() {
        let line = line_string![(x: 0.0, y: 0.0), (x: 0.5, y: 0.0), (x: 1.0, y: 0.0)];
        let length = haversine_length(&line);
        assert!((length - 111_195.0).abs() < 100.0, "got {length}");
    }

    #[test]
    fn union_of_boxes() {
        let a = BoundingBox::of_line(&line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 2.0)]).unwrap();
        let b = BoundingBox::of_line(&line_string![(x: -1.0, y: 1.0), (x: 0.5, y: 3.0)]).unwrap();
        assert_eq!(
            BoundingBox::union_all([a, b]),
            Some(BoundingBox {
                min_x: -1.0,
                min_y: 0.0,
                max_x: 1.0,
                max_y: 3.0,
            })
        );
        assert_eq!(BoundingBox::union_all(std::iter::empty()), None);
    }
}
