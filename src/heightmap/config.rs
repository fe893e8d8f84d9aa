//! Tiling configuration.

use glam::UVec2;
use serde::{Deserialize, Serialize};

use super::layout::{self, GeometryError};
use crate::geometry::BoundingBox;

/// Geometry parameters of a tiled heightmap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Logical size in samples.
    pub shape: UVec2,
    /// Number of tiles per axis.
    pub tiling: UVec2,
    /// Buffer ratio of the base tile size shared with each neighbor.
    pub overlap: f32,
    /// Domain rectangle covered by the heightmap.
    pub bbox: BoundingBox,
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self {
            shape: UVec2::new(256, 256),
            tiling: UVec2::ONE,
            overlap: 0.0,
            bbox: BoundingBox::unit(),
        }
    }
}

impl TilingConfig {
    /// Creates a configuration over the unit square.
    pub fn new(shape: UVec2, tiling: UVec2, overlap: f32) -> Self {
        Self {
            shape,
            tiling,
            overlap,
            ..Default::default()
        }
    }

    /// A multi-core friendly preset: 4x4 tiles with a 25% overlap.
    pub fn distributed(shape: UVec2) -> Self {
        Self::new(shape, UVec2::new(4, 4), 0.25)
    }

    /// Checks that the configuration describes a valid tiling.
    pub fn validate(&self) -> Result<(), GeometryError> {
        layout::validate(self.shape, self.tiling, self.overlap)?;
        if !self.bbox.is_valid() {
            return Err(GeometryError::InvalidBoundingBox(self.bbox));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TilingConfig::default();
        assert_eq!(config.shape, UVec2::new(256, 256));
        assert_eq!(config.tiling, UVec2::ONE);
        assert_eq!(config.overlap, 0.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_distributed_preset() {
        let config = TilingConfig::distributed(UVec2::new(1024, 512));
        assert_eq!(config.tiling, UVec2::new(4, 4));
        assert!(config.validate().is_ok());
        assert!(TilingConfig::distributed(UVec2::new(1022, 512)).validate().is_err());
    }
}
