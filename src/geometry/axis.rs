//! Grid axis identification.

use std::fmt;

use glam::UVec2;
use serde::{Deserialize, Serialize};

/// One of the two grid axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal axis (`i` index).
    X,
    /// Vertical axis (`j` index).
    Y,
}

impl Axis {
    /// Returns both axes in pass order.
    pub const fn all() -> [Axis; 2] {
        [Axis::X, Axis::Y]
    }

    /// Picks this axis' component from an integer pair.
    pub fn of(self, v: UVec2) -> u32 {
        match self {
            Axis::X => v.x,
            Axis::Y => v.y,
        }
    }

    pub const fn short_name(self) -> &'static str {
        match self {
            Axis::X => "x",
            Axis::Y => "y",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}
