//! The tiled heightmap coordinator.

use std::fmt;

use glam::UVec2;
use log::debug;

use super::config::TilingConfig;
use super::layout::{self, GeometryError};
use super::tile::Tile;
use crate::dispatch::{self, DispatchError};
use crate::geometry::BoundingBox;

/// A logical heightmap split into overlapping tiles.
///
/// Tiles are stored as a flat arena indexed by `it + jt * tiling.x`; every
/// tile owns its samples exclusively.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightMap {
    shape: UVec2,
    tiling: UVec2,
    overlap: f32,
    bbox: BoundingBox,
    tiles: Vec<Tile>,
}

impl HeightMap {
    /// Creates a zero-filled heightmap over the unit square.
    ///
    /// # Arguments
    /// * `shape` - Logical size in samples
    /// * `tiling` - Number of tiles per axis (must divide `shape` exactly)
    /// * `overlap` - Buffer ratio in `[0, 1)` of the base tile size
    pub fn new(shape: UVec2, tiling: UVec2, overlap: f32) -> Result<Self, GeometryError> {
        Self::with_bbox(shape, tiling, overlap, BoundingBox::unit())
    }

    /// Creates a zero-filled heightmap covering `bbox`.
    pub fn with_bbox(
        shape: UVec2,
        tiling: UVec2,
        overlap: f32,
        bbox: BoundingBox,
    ) -> Result<Self, GeometryError> {
        let mut heightmap = Self {
            shape,
            tiling,
            overlap,
            bbox,
            tiles: Vec::new(),
        };
        heightmap.update_tile_parameters()?;
        Ok(heightmap)
    }

    /// Creates a heightmap with every sample set to `value`.
    pub fn with_fill_value(
        shape: UVec2,
        tiling: UVec2,
        overlap: f32,
        value: f32,
    ) -> Result<Self, DispatchError> {
        let mut heightmap = Self::new(shape, tiling, overlap)?;
        dispatch::transform(&mut heightmap, move |grid| {
            grid.fill(value);
            Ok(())
        })?;
        Ok(heightmap)
    }

    /// Creates a zero-filled heightmap from a tiling configuration.
    pub fn from_config(config: &TilingConfig) -> Result<Self, GeometryError> {
        Self::with_bbox(config.shape, config.tiling, config.overlap, config.bbox)
    }

    /// Rebuilds every tile from the current shape, tiling, overlap and
    /// bounding box. Previous tile contents are discarded.
    pub fn update_tile_parameters(&mut self) -> Result<(), GeometryError> {
        let layouts = layout::compute_layouts(self.shape, self.tiling, self.overlap, self.bbox)?;
        self.tiles = layouts.iter().map(Tile::new).collect();
        debug!(
            "tile geometry rebuilt: shape {}, tiling {}, overlap {}, buffers {}",
            self.shape,
            self.tiling,
            self.overlap,
            self.buffer_widths()
        );
        Ok(())
    }

    /// Applies new geometry, restoring the previous one if it is invalid.
    fn reconfigure(
        &mut self,
        shape: UVec2,
        tiling: UVec2,
        overlap: f32,
        bbox: BoundingBox,
    ) -> Result<(), GeometryError> {
        let previous = (self.shape, self.tiling, self.overlap, self.bbox);
        (self.shape, self.tiling, self.overlap, self.bbox) = (shape, tiling, overlap, bbox);
        if let Err(e) = self.update_tile_parameters() {
            (self.shape, self.tiling, self.overlap, self.bbox) = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn set_shape(&mut self, shape: UVec2) -> Result<(), GeometryError> {
        self.reconfigure(shape, self.tiling, self.overlap, self.bbox)
    }

    pub fn set_tiling(&mut self, tiling: UVec2) -> Result<(), GeometryError> {
        self.reconfigure(self.shape, tiling, self.overlap, self.bbox)
    }

    pub fn set_overlap(&mut self, overlap: f32) -> Result<(), GeometryError> {
        self.reconfigure(self.shape, self.tiling, overlap, self.bbox)
    }

    pub fn set_bbox(&mut self, bbox: BoundingBox) -> Result<(), GeometryError> {
        self.reconfigure(self.shape, self.tiling, self.overlap, bbox)
    }

    /// Sets shape, tiling and overlap at once. Tiles are only rebuilt if
    /// one of them actually changes.
    pub fn set_sto(&mut self, shape: UVec2, tiling: UVec2, overlap: f32) -> Result<(), GeometryError> {
        if shape != self.shape || tiling != self.tiling || overlap != self.overlap {
            self.reconfigure(shape, tiling, overlap, self.bbox)?;
        }
        Ok(())
    }

    pub fn shape(&self) -> UVec2 {
        self.shape
    }

    pub fn tiling(&self) -> UVec2 {
        self.tiling
    }

    pub fn overlap(&self) -> f32 {
        self.overlap
    }

    pub fn bbox(&self) -> BoundingBox {
        self.bbox
    }

    /// Number of tiles.
    pub fn ntiles(&self) -> usize {
        self.tiles.len()
    }

    /// Flat index of tile `(it, jt)`.
    pub fn tile_index(&self, it: u32, jt: u32) -> usize {
        (it + jt * self.tiling.x) as usize
    }

    /// Tile at position `(it, jt)`, if it exists.
    pub fn tile(&self, it: u32, jt: u32) -> Option<&Tile> {
        if it < self.tiling.x && jt < self.tiling.y {
            self.tiles.get(self.tile_index(it, jt))
        } else {
            None
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub(crate) fn tiles_mut(&mut self) -> &mut [Tile] {
        &mut self.tiles
    }

    /// Non-buffered tile size per axis.
    pub fn base_tile_shape(&self) -> UVec2 {
        layout::base_tile_shape(self.shape, self.tiling)
    }

    /// Buffer width shared across each interior edge, per axis.
    pub fn buffer_widths(&self) -> UVec2 {
        layout::buffer_widths(self.shape, self.tiling, self.overlap)
    }

    /// Returns true if `other` has the same shape, tiling and overlap, so
    /// tiles can be paired by index.
    pub fn is_compatible(&self, other: &HeightMap) -> bool {
        self.shape == other.shape && self.tiling == other.tiling && self.overlap == other.overlap
    }
}

impl fmt::Display for HeightMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "HeightMap, shape: {}, tiling: {}, overlap: {}, bbox: {}, tiles: {}",
            self.shape,
            self.tiling,
            self.overlap,
            self.bbox,
            self.tiles.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heightmap_creation() {
        let h = HeightMap::new(UVec2::new(512, 256), UVec2::new(4, 2), 0.25).unwrap();
        assert_eq!(h.ntiles(), 8);
        assert_eq!(h.tiles().len(), (h.tiling().x * h.tiling().y) as usize);
        assert_eq!(h.base_tile_shape(), UVec2::new(128, 128));
        assert_eq!(h.buffer_widths(), UVec2::new(32, 32));
        assert_eq!(h.bbox(), BoundingBox::unit());
    }

    #[test]
    fn test_tile_index_is_column_fastest() {
        let h = HeightMap::new(UVec2::new(64, 64), UVec2::new(4, 2), 0.0).unwrap();
        assert_eq!(h.tile_index(3, 0), 3);
        assert_eq!(h.tile_index(1, 1), 5);
        for (k, tile) in h.tiles().iter().enumerate() {
            let p = tile.position();
            assert_eq!(h.tile_index(p.x, p.y), k);
        }
        assert!(h.tile(4, 0).is_none());
        assert_eq!(h.tile(2, 1).map(|t| t.position()), Some(UVec2::new(2, 1)));
    }

    #[test]
    fn test_with_fill_value() {
        let h = HeightMap::with_fill_value(UVec2::new(64, 32), UVec2::new(2, 2), 0.1, 7.0).unwrap();
        assert!(h.tiles().iter().all(|t| t.as_slice().iter().all(|&v| v == 7.0)));
    }

    #[test]
    fn test_setters_rebuild_tiles() {
        let mut h = HeightMap::new(UVec2::new(64, 64), UVec2::ONE, 0.0).unwrap();
        h.set_tiling(UVec2::new(2, 4)).unwrap();
        assert_eq!(h.ntiles(), 8);
        h.set_shape(UVec2::new(128, 128)).unwrap();
        assert_eq!(h.tiles()[0].shape(), UVec2::new(64, 32));
        h.set_overlap(0.5).unwrap();
        assert_eq!(h.buffer_widths(), UVec2::new(32, 16));
    }

    #[test]
    fn test_invalid_setter_keeps_previous_geometry() {
        let mut h = HeightMap::new(UVec2::new(64, 64), UVec2::new(2, 2), 0.0).unwrap();
        assert!(h.set_tiling(UVec2::new(3, 2)).is_err());
        assert_eq!(h.tiling(), UVec2::new(2, 2));
        assert_eq!(h.ntiles(), 4);
    }

    #[test]
    fn test_set_sto_only_rebuilds_on_change() {
        let mut h = HeightMap::with_fill_value(UVec2::new(32, 32), UVec2::new(2, 2), 0.0, 1.0).unwrap();
        h.set_sto(UVec2::new(32, 32), UVec2::new(2, 2), 0.0).unwrap();
        assert_eq!(h.tiles()[0][(0, 0)], 1.0);
        h.set_sto(UVec2::new(32, 32), UVec2::new(2, 2), 0.25).unwrap();
        assert_eq!(h.tiles()[0][(0, 0)], 0.0);
    }

    #[test]
    fn test_with_bbox() {
        let bbox = BoundingBox::new(0.0, 10.0, 0.0, 5.0);
        let h = HeightMap::with_bbox(UVec2::new(64, 64), UVec2::new(2, 1), 0.0, bbox).unwrap();
        assert_eq!(h.tiles()[1].bbox, BoundingBox::new(5.0, 10.0, 0.0, 5.0));
        assert!(HeightMap::with_bbox(UVec2::new(64, 64), UVec2::ONE, 0.0, BoundingBox::new(1.0, 0.0, 0.0, 1.0)).is_err());
    }

    #[test]
    fn test_compatibility() {
        let a = HeightMap::new(UVec2::new(64, 64), UVec2::new(2, 2), 0.25).unwrap();
        let b = HeightMap::new(UVec2::new(64, 64), UVec2::new(2, 2), 0.25).unwrap();
        let c = HeightMap::new(UVec2::new(64, 64), UVec2::new(4, 2), 0.25).unwrap();
        assert!(a.is_compatible(&b));
        assert!(!a.is_compatible(&c));
    }
}
