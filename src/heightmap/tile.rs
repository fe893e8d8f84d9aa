//! A single tile: grid storage plus its placement in the logical domain.

use std::fmt;
use std::ops::{Deref, DerefMut};

use glam::{UVec2, Vec2};

use super::layout::TileLayout;
use crate::array::{Grid, GridError};
use crate::geometry::BoundingBox;

/// One rectangular, exclusively owned sub-grid of a [`HeightMap`].
///
/// Dereferences to its [`Grid`], so samples are read and written with the
/// usual `tile[(i, j)]` indexing.
///
/// [`HeightMap`]: super::HeightMap
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    grid: Grid,
    /// Normalized lower-left corner in the domain, buffers included.
    pub shift: Vec2,
    /// Normalized size in the domain, buffers included.
    pub scale: Vec2,
    /// Absolute domain rectangle covered by the tile.
    pub bbox: BoundingBox,
    position: UVec2,
    origin: UVec2,
    lead_buffer: UVec2,
    base_shape: UVec2,
}

impl Tile {
    /// Creates a zero-filled tile for the given layout.
    pub fn new(layout: &TileLayout) -> Self {
        Self {
            grid: Grid::new(layout.shape),
            shift: layout.shift,
            scale: layout.scale,
            bbox: layout.bbox,
            position: layout.position,
            origin: layout.origin,
            lead_buffer: layout.lead_buffer,
            base_shape: layout.base_shape,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Tile position `(it, jt)` in the tiling.
    pub fn position(&self) -> UVec2 {
        self.position
    }

    /// Lower-left sample of this tile in the logical grid.
    pub fn origin(&self) -> UVec2 {
        self.origin
    }

    /// Leading (left/bottom) buffer width per axis.
    pub fn lead_buffer(&self) -> UVec2 {
        self.lead_buffer
    }

    /// Size of the non-buffered region.
    pub fn base_shape(&self) -> UVec2 {
        self.base_shape
    }

    /// Replaces the samples, keeping the placement.
    pub fn set_grid(&mut self, grid: Grid) -> Result<(), GridError> {
        if grid.shape() != self.grid.shape() {
            return Err(GridError::ShapeMismatch(self.grid.shape(), grid.shape()));
        }
        self.grid = grid;
        Ok(())
    }

    /// Copy of the non-buffered region.
    pub fn base_region(&self) -> Result<Grid, GridError> {
        self.grid.copy_window(self.lead_buffer, self.base_shape)
    }

    /// Size of the window, starting at local `(0, 0)`, that is still visible
    /// after reassembly.
    ///
    /// The upper/right neighbor is written later and covers this tile's
    /// trailing buffer plus as many base samples again with its leading
    /// buffer.
    pub fn visible_shape(&self) -> UVec2 {
        let trailing = self.grid.shape().saturating_sub(self.lead_buffer + self.base_shape);
        (self.lead_buffer + self.base_shape).saturating_sub(trailing)
    }

    /// Samples of [`visible_shape`](Self::visible_shape), row by row.
    pub fn visible_samples(&self) -> impl Iterator<Item = f32> + '_ {
        let shape = self.grid.shape();
        let visible = self.visible_shape();
        self.grid
            .as_slice()
            .chunks(shape.x.max(1) as usize)
            .take(visible.y as usize)
            .flat_map(move |row| row.iter().take(visible.x as usize).copied())
    }

    /// Fractional sample positions in `array` covered by this tile, one per
    /// tile column (x) and row (y). End points are excluded.
    fn sample_positions(&self, array_shape: UVec2) -> (Vec<f32>, Vec<f32>) {
        let shape = self.grid.shape();
        let span = |start: f32, size: f32, n: u32, len: u32| -> Vec<f32> {
            let last = len.saturating_sub(1) as f32;
            (0..n)
                .map(|k| (start + size * k as f32 / n as f32) * last)
                .collect()
        };
        (
            span(self.shift.x, self.scale.x, shape.x, array_shape.x),
            span(self.shift.y, self.scale.y, shape.y, array_shape.y),
        )
    }

    /// Fills the tile by nearest-neighbor sampling of a full-domain array.
    pub fn from_array_interp_nearest(&mut self, array: &Grid) {
        let (x, y) = self.sample_positions(array.shape());
        for (j, &yj) in y.iter().enumerate() {
            for (i, &xi) in x.iter().enumerate() {
                self.grid[(i as u32, j as u32)] = array.sample_nearest(xi, yj);
            }
        }
    }

    /// Fills the tile by bilinear sampling of a full-domain array.
    pub fn from_array_interp_bilinear(&mut self, array: &Grid) {
        let (x, y) = self.sample_positions(array.shape());
        for (j, &yj) in y.iter().enumerate() {
            for (i, &xi) in x.iter().enumerate() {
                self.grid[(i as u32, j as u32)] = array.sample_bilinear(xi, yj);
            }
        }
    }
}

impl Deref for Tile {
    type Target = Grid;

    fn deref(&self) -> &Grid {
        &self.grid
    }
}

impl DerefMut for Tile {
    fn deref_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tile ({}, {}), shape: {}, shift: {}, scale: {}, bbox: {}",
            self.position.x,
            self.position.y,
            self.grid.shape(),
            self.shift,
            self.scale,
            self.bbox
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::heightmap::layout::compute_layouts;

    fn layouts() -> Vec<TileLayout> {
        compute_layouts(
            UVec2::new(32, 16),
            UVec2::new(2, 1),
            0.25,
            BoundingBox::unit(),
        )
        .unwrap()
    }

    #[test]
    fn test_tile_from_layout() {
        let layouts = layouts();
        let tile = Tile::new(&layouts[1]);
        assert_eq!(tile.shape(), UVec2::new(20, 16));
        assert_eq!(tile.origin(), UVec2::new(12, 0));
        assert_eq!(tile.lead_buffer(), UVec2::new(4, 0));
        assert_eq!(tile.base_shape(), UVec2::new(16, 16));
        assert!(tile.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_set_grid_checks_shape() {
        let mut tile = Tile::new(&layouts()[0]);
        assert!(tile.set_grid(Grid::new(UVec2::new(3, 3))).is_err());
        assert!(tile.set_grid(Grid::filled(UVec2::new(20, 16), 2.0)).is_ok());
        assert_eq!(tile[(19, 15)], 2.0);
    }

    #[test]
    fn test_base_region() {
        let mut tile = Tile::new(&layouts()[1]);
        for j in 0..16 {
            for i in 0..20 {
                tile[(i, j)] = i as f32;
            }
        }
        let base = tile.base_region().unwrap();
        assert_eq!(base.shape(), UVec2::new(16, 16));
        assert_eq!(base[(0, 0)], 4.0);
    }

    #[test]
    fn test_visible_shape() {
        let layouts = layouts();
        // left tile: base 16, trailing 4, right neighbor starts at x = 12
        let left = Tile::new(&layouts[0]);
        assert_eq!(left.shape(), UVec2::new(20, 16));
        assert_eq!(left.visible_shape(), UVec2::new(12, 16));
        // last tile along x keeps everything
        let right = Tile::new(&layouts[1]);
        assert_eq!(right.visible_shape(), UVec2::new(20, 16));

        let mut left = left;
        for j in 0..16 {
            for i in 0..20 {
                left[(i, j)] = i as f32;
            }
        }
        let samples: Vec<f32> = left.visible_samples().collect();
        assert_eq!(samples.len(), 12 * 16);
        assert_eq!(samples.iter().copied().fold(f32::MIN, f32::max), 11.0);
    }

    #[test]
    fn test_from_array_interp_nearest_full_tile() {
        let layouts =
            compute_layouts(UVec2::new(8, 8), UVec2::ONE, 0.0, BoundingBox::unit()).unwrap();
        let mut tile = Tile::new(&layouts[0]);
        let array = Grid::filled(UVec2::new(4, 4), 3.5);
        tile.from_array_interp_nearest(&array);
        assert!(tile.as_slice().iter().all(|&v| v == 3.5));
        tile.from_array_interp_bilinear(&Grid::filled(UVec2::new(4, 4), -1.0));
        assert!(tile.as_slice().iter().all(|&v| v == -1.0));
    }
}
