//! Reassembly of tiles into single grids, global reductions and sampling.

use glam::{UVec2, Vec2};
use rayon::prelude::*;

use super::layout::GeometryError;
use super::map::HeightMap;
use crate::array::Grid;

impl HeightMap {
    /// Flattens the tiles into one grid of the logical shape.
    pub fn to_array(&self) -> Grid {
        let mut array = Grid::new(self.shape());
        self.decimate_into(&mut array, UVec2::ONE);
        array
    }

    /// Flattens the tiles into a grid of shape `target` by decimation with
    /// stride `shape / target` per axis.
    ///
    /// Tiles are written column by column, so where buffers overlap the
    /// upper/right neighbor wins.
    pub fn to_array_shape(&self, target: UVec2) -> Result<Grid, GeometryError> {
        let shape = self.shape();
        if target.x == 0 || target.y == 0 || target.x > shape.x || target.y > shape.y {
            return Err(GeometryError::InvalidTargetShape { target, shape });
        }
        let mut array = Grid::new(target);
        self.decimate_into(&mut array, shape / target);
        Ok(array)
    }

    fn decimate_into(&self, array: &mut Grid, step: UVec2) {
        let target = array.shape();
        for it in 0..self.tiling().x {
            for jt in 0..self.tiling().y {
                let tile = &self.tiles()[self.tile_index(it, jt)];
                let origin = tile.origin();
                let ts = tile.shape();

                for q in 0..ts.y {
                    let gy = origin.y + q;
                    if gy % step.y != 0 || gy / step.y >= target.y {
                        continue;
                    }
                    for p in 0..ts.x {
                        let gx = origin.x + p;
                        if gx % step.x != 0 || gx / step.x >= target.x {
                            continue;
                        }
                        array[(gx / step.x, gy / step.y)] = tile[(p, q)];
                    }
                }
            }
        }
    }

    /// Global maximum over the samples [`to_array`](Self::to_array) keeps.
    pub fn max(&self) -> f32 {
        let per_tile: Vec<f32> = self
            .tiles()
            .par_iter()
            .map(|t| t.visible_samples().fold(f32::MIN, f32::max))
            .collect();
        per_tile.into_iter().fold(f32::MIN, f32::max)
    }

    /// Global minimum over the samples [`to_array`](Self::to_array) keeps.
    pub fn min(&self) -> f32 {
        let per_tile: Vec<f32> = self
            .tiles()
            .par_iter()
            .map(|t| t.visible_samples().fold(f32::MAX, f32::min))
            .collect();
        per_tile.into_iter().fold(f32::MAX, f32::min)
    }

    /// Sum over the logical grid; each sample is counted once through the
    /// base region of the tile that owns it.
    pub fn sum(&self) -> Result<f32, GeometryError> {
        let per_tile: Vec<Result<f32, GeometryError>> = self
            .tiles()
            .par_iter()
            .map(|t| -> Result<f32, GeometryError> { Ok(t.base_region()?.sum()) })
            .collect();
        per_tile.into_iter().sum()
    }

    pub fn mean(&self) -> Result<f32, GeometryError> {
        let shape = self.shape();
        Ok(self.sum()? / (shape.x as f32 * shape.y as f32))
    }

    /// Sorted, deduplicated values over every tile sample.
    pub fn unique_values(&self) -> Vec<f32> {
        let per_tile: Vec<Vec<f32>> = self.tiles().par_iter().map(|t| t.unique_values()).collect();
        let mut values: Vec<f32> = per_tile.into_iter().flatten().collect();
        values.sort_by(f32::total_cmp);
        values.dedup();
        values
    }

    /// Locates the tile holding normalized position `(x, y)` and returns its
    /// index with the fractional position inside that tile's grid.
    fn locate(&self, x: f32, y: f32) -> (usize, Vec2) {
        let tiling = self.tiling();
        let it = ((x * tiling.x as f32).max(0.0) as u32).min(tiling.x - 1);
        let jt = ((y * tiling.y as f32).max(0.0) as u32).min(tiling.y - 1);
        let k = self.tile_index(it, jt);
        let tile = &self.tiles()[k];

        // tile.shape / tile.scale is the logical shape
        let local = (Vec2::new(x, y) - tile.shift) * self.shape().as_vec2();
        (k, local)
    }

    /// Nearest-neighbor value at normalized coordinates in `[0, 1)`.
    pub fn value_nearest(&self, x: f32, y: f32) -> f32 {
        let (k, local) = self.locate(x, y);
        self.tiles()[k].sample_nearest(local.x, local.y)
    }

    /// Bilinear value at normalized coordinates in `[0, 1)`.
    pub fn value_bilinear(&self, x: f32, y: f32) -> f32 {
        let (k, local) = self.locate(x, y);
        self.tiles()[k].sample_bilinear(local.x, local.y)
    }

    /// Splits a grid of the logical shape into the tiles, buffers included.
    pub fn from_array(&mut self, array: &Grid) -> Result<(), GeometryError> {
        if array.shape() != self.shape() {
            return Err(GeometryError::ShapeMismatch {
                expected: self.shape(),
                found: array.shape(),
            });
        }
        let results: Vec<Result<(), GeometryError>> = self
            .tiles_mut()
            .par_iter_mut()
            .map(|tile| -> Result<(), GeometryError> {
                let window = array.copy_window(tile.origin(), tile.shape())?;
                tile.set_grid(window)?;
                Ok(())
            })
            .collect();
        results.into_iter().collect()
    }

    /// Resamples an array of any shape onto the tiles (nearest neighbor).
    pub fn from_array_interp_nearest(&mut self, array: &Grid) {
        self.tiles_mut()
            .par_iter_mut()
            .for_each(|tile| tile.from_array_interp_nearest(array));
    }

    /// Resamples an array of any shape onto the tiles (bilinear).
    pub fn from_array_interp_bilinear(&mut self, array: &Grid) {
        self.tiles_mut()
            .par_iter_mut()
            .for_each(|tile| tile.from_array_interp_bilinear(array));
    }

    /// 8-bit grayscale image, row 0 at the top of the domain.
    pub fn to_grayscale_8bit(&self) -> Vec<u8> {
        self.to_grayscale(|v| (v * 255.0) as u8)
    }

    /// 16-bit grayscale image, row 0 at the top of the domain.
    pub fn to_grayscale_16bit(&self) -> Vec<u16> {
        self.to_grayscale(|v| (v * 65535.0) as u16)
    }

    fn to_grayscale<T: Send + Default + Clone>(&self, quantize: impl Fn(f32) -> T + Sync) -> Vec<T> {
        let array = self.to_array();
        let shape = array.shape();
        let vmin = array.min();
        let vmax = array.max();
        let inv_range = if vmax > vmin { 1.0 / (vmax - vmin) } else { 0.0 };

        let width = shape.x as usize;
        let mut img = vec![T::default(); width * shape.y as usize];
        img.par_chunks_mut(width.max(1))
            .enumerate()
            .for_each(|(row, pixels)| {
                let j = shape.y - 1 - row as u32;
                for (i, px) in pixels.iter_mut().enumerate() {
                    *px = quantize((array[(i as u32, j)] - vmin) * inv_range);
                }
            });
        img
    }
}
