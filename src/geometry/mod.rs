//! Domain-space geometry: bounding boxes and grid axes.

mod axis;
mod bbox;

pub use axis::Axis;
pub use bbox::BoundingBox;
