//! Point-on-polyline localization, sub-polyline trimming and the
//! measures used for edge weights and route extents.

mod locate;
mod measure;
mod trim;

pub use locate::{DEFAULT_ON_LINE_TOLERANCE, locate, locate_with_tolerance};
pub use measure::{BoundingBox, haversine_length};
pub use trim::{trim, trim_with_tolerance};
