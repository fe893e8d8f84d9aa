//! Axis-aligned rectangles in domain coordinates.

use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Rectangle `[xmin, xmax] x [ymin, ymax]` in domain space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub xmax: f32,
    pub ymin: f32,
    pub ymax: f32,
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::unit()
    }
}

impl BoundingBox {
    pub const fn new(xmin: f32, xmax: f32, ymin: f32, ymax: f32) -> Self {
        Self {
            xmin,
            xmax,
            ymin,
            ymax,
        }
    }

    /// The unit square `[0, 1] x [0, 1]`.
    pub const fn unit() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }

    pub fn width(&self) -> f32 {
        self.xmax - self.xmin
    }

    pub fn height(&self) -> f32 {
        self.ymax - self.ymin
    }

    /// Returns true if both extents are finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        let finite = [self.xmin, self.xmax, self.ymin, self.ymax]
            .iter()
            .all(|v| v.is_finite());
        finite && self.width() > 0.0 && self.height() > 0.0
    }

    /// Sub-rectangle at normalized offset `shift` with normalized size
    /// `scale`, both relative to this box.
    pub fn sub_box(&self, shift: Vec2, scale: Vec2) -> Self {
        let w = self.width();
        let h = self.height();
        Self {
            xmin: self.xmin + shift.x * w,
            xmax: self.xmin + (shift.x + scale.x) * w,
            ymin: self.ymin + shift.y * h,
            ymax: self.ymin + (shift.y + scale.y) * h,
        }
    }

    /// Maps a normalized position in `[0, 1]^2` into this box.
    pub fn to_domain(&self, uv: Vec2) -> Vec2 {
        Vec2::new(
            self.xmin + uv.x * self.width(),
            self.ymin + uv.y * self.height(),
        )
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}, {}, {}, {}}}",
            self.xmin, self.xmax, self.ymin, self.ymax
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unit_square() {
        let b = BoundingBox::default();
        assert_eq!(b, BoundingBox::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(b.width(), 1.0);
        assert!(b.is_valid());
    }

    #[test]
    fn test_sub_box() {
        let b = BoundingBox::new(-2.0, 2.0, 0.0, 10.0);
        let s = b.sub_box(Vec2::new(0.25, 0.5), Vec2::new(0.5, 0.5));
        assert_eq!(s, BoundingBox::new(-1.0, 1.0, 5.0, 10.0));
    }

    #[test]
    fn test_invalid_boxes() {
        assert!(!BoundingBox::new(1.0, 1.0, 0.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.0, 1.0, 2.0, 1.0).is_valid());
        assert!(!BoundingBox::new(0.0, f32::NAN, 0.0, 1.0).is_valid());
    }

    #[test]
    fn test_to_domain() {
        let b = BoundingBox::new(10.0, 20.0, -1.0, 1.0);
        assert_eq!(b.to_domain(Vec2::new(0.5, 0.5)), Vec2::new(15.0, 0.0));
    }
}
