//! Dense 2D grid of `f32` samples.

use std::ops::{AddAssign, Index, IndexMut, MulAssign, Neg, SubAssign};

use glam::UVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by fallible grid operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Data length {found} does not match shape {shape} (expected {expected})")]
    DataLength {
        shape: UVec2,
        expected: usize,
        found: usize,
    },
    #[error("Window at {origin} with size {size} exceeds grid shape {shape}")]
    WindowOutOfBounds {
        origin: UVec2,
        size: UVec2,
        shape: UVec2,
    },
    #[error("Shape mismatch: {0} vs {1}")]
    ShapeMismatch(UVec2, UVec2),
}

/// A dense 2D array of samples stored in row-major order.
///
/// Sample `(i, j)` lives at `j * nx + i`, so `i` runs along x and `j`
/// along y.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Grid {
    shape: UVec2,
    data: Vec<f32>,
}

impl Grid {
    /// Creates a grid of the given shape filled with zeros.
    pub fn new(shape: UVec2) -> Self {
        Self::filled(shape, 0.0)
    }

    /// Creates a grid of the given shape filled with `value`.
    pub fn filled(shape: UVec2, value: f32) -> Self {
        Self {
            shape,
            data: vec![value; shape.x as usize * shape.y as usize],
        }
    }

    /// Wraps existing row-major samples.
    pub fn from_vec(shape: UVec2, data: Vec<f32>) -> Result<Self, GridError> {
        let expected = shape.x as usize * shape.y as usize;
        if data.len() != expected {
            return Err(GridError::DataLength {
                shape,
                expected,
                found: data.len(),
            });
        }
        Ok(Self { shape, data })
    }

    /// Builds a grid by evaluating `f(i, j)` for every sample.
    pub fn from_fn(shape: UVec2, mut f: impl FnMut(u32, u32) -> f32) -> Self {
        let mut data = Vec::with_capacity(shape.x as usize * shape.y as usize);
        for j in 0..shape.y {
            for i in 0..shape.x {
                data.push(f(i, j));
            }
        }
        Self { shape, data }
    }

    pub fn shape(&self) -> UVec2 {
        self.shape
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }

    pub fn as_mut_slice(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.data
    }

    #[inline]
    fn offset(&self, i: u32, j: u32) -> usize {
        j as usize * self.shape.x as usize + i as usize
    }

    /// Returns the sample at `(i, j)`, or `None` when out of bounds.
    pub fn get(&self, i: u32, j: u32) -> Option<f32> {
        if i < self.shape.x && j < self.shape.y {
            Some(self.data[self.offset(i, j)])
        } else {
            None
        }
    }

    /// Sets every sample to `value`.
    pub fn fill(&mut self, value: f32) {
        self.data.fill(value);
    }

    /// Minimum sample value (`f32::MAX` for an empty grid).
    pub fn min(&self) -> f32 {
        self.data.iter().copied().fold(f32::MAX, f32::min)
    }

    /// Maximum sample value (`f32::MIN` for an empty grid).
    pub fn max(&self) -> f32 {
        self.data.iter().copied().fold(f32::MIN, f32::max)
    }

    pub fn sum(&self) -> f32 {
        self.data.iter().sum()
    }

    /// Arithmetic mean of all samples (0.0 for an empty grid).
    pub fn mean(&self) -> f32 {
        if self.data.is_empty() {
            0.0
        } else {
            self.sum() / self.data.len() as f32
        }
    }

    /// Linearly maps `[from_min, from_max]` onto `[vmin, vmax]`.
    ///
    /// A degenerate source range collapses every sample to `vmin`.
    pub fn remap(&mut self, vmin: f32, vmax: f32, from_min: f32, from_max: f32) {
        if from_min == from_max {
            self.fill(vmin);
            return;
        }
        let scale = (vmax - vmin) / (from_max - from_min);
        for v in &mut self.data {
            *v = vmin + (*v - from_min) * scale;
        }
    }

    pub fn clamp(&mut self, lo: f32, hi: f32) {
        for v in &mut self.data {
            *v = v.clamp(lo, hi);
        }
    }

    /// Applies `f` to every sample in place.
    pub fn map_inplace(&mut self, f: impl Fn(f32) -> f32) {
        for v in &mut self.data {
            *v = f(*v);
        }
    }

    /// Combines this grid with `other` sample by sample.
    pub fn zip_apply(&mut self, other: &Grid, f: impl Fn(f32, f32) -> f32) -> Result<(), GridError> {
        if self.shape != other.shape {
            return Err(GridError::ShapeMismatch(self.shape, other.shape));
        }
        for (a, &b) in self.data.iter_mut().zip(other.data.iter()) {
            *a = f(*a, b);
        }
        Ok(())
    }

    /// Copies the `size` window starting at `origin` into a new grid.
    pub fn copy_window(&self, origin: UVec2, size: UVec2) -> Result<Grid, GridError> {
        self.check_window(origin, size)?;
        let mut out = Grid::new(size);
        for j in 0..size.y {
            let src = self.offset(origin.x, origin.y + j);
            let dst = out.offset(0, j);
            out.data[dst..dst + size.x as usize]
                .copy_from_slice(&self.data[src..src + size.x as usize]);
        }
        Ok(out)
    }

    /// Writes `src` into this grid with its lower-left corner at `origin`.
    pub fn paste_window(&mut self, origin: UVec2, src: &Grid) -> Result<(), GridError> {
        self.check_window(origin, src.shape)?;
        for j in 0..src.shape.y {
            let s = src.offset(0, j);
            let d = self.offset(origin.x, origin.y + j);
            self.data[d..d + src.shape.x as usize]
                .copy_from_slice(&src.data[s..s + src.shape.x as usize]);
        }
        Ok(())
    }

    fn check_window(&self, origin: UVec2, size: UVec2) -> Result<(), GridError> {
        let end = origin.as_u64vec2() + size.as_u64vec2();
        if end.x > self.shape.x as u64 || end.y > self.shape.y as u64 {
            return Err(GridError::WindowOutOfBounds {
                origin,
                size,
                shape: self.shape,
            });
        }
        Ok(())
    }

    /// Nearest sample to the fractional grid position `(x, y)`, clamped to
    /// the grid.
    pub fn sample_nearest(&self, x: f32, y: f32) -> f32 {
        let i = (x.max(0.0) as u32).min(self.shape.x.saturating_sub(1));
        let j = (y.max(0.0) as u32).min(self.shape.y.saturating_sub(1));
        self[(i, j)]
    }

    /// Bilinear interpolation at the fractional grid position `(x, y)`,
    /// clamped to the grid.
    pub fn sample_bilinear(&self, x: f32, y: f32) -> f32 {
        let max_i = self.shape.x.saturating_sub(1);
        let max_j = self.shape.y.saturating_sub(1);
        let x = x.clamp(0.0, max_i as f32);
        let y = y.clamp(0.0, max_j as f32);

        let i = (x as u32).min(max_i);
        let j = (y as u32).min(max_j);
        let i1 = (i + 1).min(max_i);
        let j1 = (j + 1).min(max_j);
        let u = x - i as f32;
        let v = y - j as f32;

        let f00 = self[(i, j)];
        let f10 = self[(i1, j)];
        let f01 = self[(i, j1)];
        let f11 = self[(i1, j1)];

        let a = f00 + (f10 - f00) * u;
        let b = f01 + (f11 - f01) * u;
        a + (b - a) * v
    }

    /// Sorted, deduplicated sample values.
    pub fn unique_values(&self) -> Vec<f32> {
        let mut values = self.data.clone();
        values.sort_by(f32::total_cmp);
        values.dedup();
        values
    }
}

impl Index<(u32, u32)> for Grid {
    type Output = f32;

    /// # Panics
    /// Panics if `(i, j)` lies outside the grid.
    fn index(&self, (i, j): (u32, u32)) -> &f32 {
        assert!(
            i < self.shape.x && j < self.shape.y,
            "index ({i}, {j}) out of bounds for grid of shape {}",
            self.shape
        );
        &self.data[self.offset(i, j)]
    }
}

impl IndexMut<(u32, u32)> for Grid {
    fn index_mut(&mut self, (i, j): (u32, u32)) -> &mut f32 {
        assert!(
            i < self.shape.x && j < self.shape.y,
            "index ({i}, {j}) out of bounds for grid of shape {}",
            self.shape
        );
        let k = self.offset(i, j);
        &mut self.data[k]
    }
}

impl AddAssign<f32> for Grid {
    fn add_assign(&mut self, rhs: f32) {
        self.data.iter_mut().for_each(|v| *v += rhs);
    }
}

impl SubAssign<f32> for Grid {
    fn sub_assign(&mut self, rhs: f32) {
        self.data.iter_mut().for_each(|v| *v -= rhs);
    }
}

impl MulAssign<f32> for Grid {
    fn mul_assign(&mut self, rhs: f32) {
        self.data.iter_mut().for_each(|v| *v *= rhs);
    }
}

// Element-wise forms panic on shape mismatch; use `zip_apply` for a
// checked variant.
impl AddAssign<&Grid> for Grid {
    fn add_assign(&mut self, rhs: &Grid) {
        assert_eq!(self.shape, rhs.shape, "grid shape mismatch");
        self.data.iter_mut().zip(&rhs.data).for_each(|(a, b)| *a += b);
    }
}

impl SubAssign<&Grid> for Grid {
    fn sub_assign(&mut self, rhs: &Grid) {
        assert_eq!(self.shape, rhs.shape, "grid shape mismatch");
        self.data.iter_mut().zip(&rhs.data).for_each(|(a, b)| *a -= b);
    }
}

impl MulAssign<&Grid> for Grid {
    fn mul_assign(&mut self, rhs: &Grid) {
        assert_eq!(self.shape, rhs.shape, "grid shape mismatch");
        self.data.iter_mut().zip(&rhs.data).for_each(|(a, b)| *a *= b);
    }
}

impl Neg for Grid {
    type Output = Grid;

    fn neg(mut self) -> Grid {
        self.data.iter_mut().for_each(|v| *v = -*v);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grid_creation() {
        let g = Grid::new(UVec2::new(4, 3));
        assert_eq!(g.shape(), UVec2::new(4, 3));
        assert_eq!(g.len(), 12);
        assert!(g.as_slice().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_from_vec_rejects_bad_length() {
        let err = Grid::from_vec(UVec2::new(2, 2), vec![0.0; 3]).unwrap_err();
        assert!(matches!(err, GridError::DataLength { expected: 4, found: 3, .. }));
    }

    #[test]
    fn test_row_major_layout() {
        let g = Grid::from_fn(UVec2::new(3, 2), |i, j| (i + 10 * j) as f32);
        assert_eq!(g.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(g[(2, 1)], 12.0);
        assert_eq!(g.get(3, 0), None);
    }

    #[test]
    #[should_panic]
    fn test_index_out_of_bounds_panics() {
        let g = Grid::new(UVec2::new(2, 2));
        let _ = g[(0, 2)];
    }

    #[test]
    fn test_reductions() {
        let g = Grid::from_vec(UVec2::new(2, 2), vec![-1.0, 2.0, 0.5, 4.5]).unwrap();
        assert_eq!(g.min(), -1.0);
        assert_eq!(g.max(), 4.5);
        assert_eq!(g.sum(), 6.0);
        assert_eq!(g.mean(), 1.5);
    }

    #[test]
    fn test_remap() {
        let mut g = Grid::from_vec(UVec2::new(3, 1), vec![2.0, 3.0, 4.0]).unwrap();
        g.remap(0.0, 1.0, 2.0, 4.0);
        assert_eq!(g.as_slice(), &[0.0, 0.5, 1.0]);

        let mut flat = Grid::filled(UVec2::new(2, 2), 3.0);
        flat.remap(-1.0, 1.0, 3.0, 3.0);
        assert!(flat.as_slice().iter().all(|&v| v == -1.0));
    }

    #[test]
    fn test_window_copy_and_paste() {
        let g = Grid::from_fn(UVec2::new(4, 4), |i, j| (i + 4 * j) as f32);
        let w = g.copy_window(UVec2::new(1, 2), UVec2::new(2, 2)).unwrap();
        assert_eq!(w.as_slice(), &[9.0, 10.0, 13.0, 14.0]);

        let mut dst = Grid::new(UVec2::new(4, 4));
        dst.paste_window(UVec2::new(2, 0), &w).unwrap();
        assert_eq!(dst[(2, 0)], 9.0);
        assert_eq!(dst[(3, 1)], 14.0);

        assert!(g.copy_window(UVec2::new(3, 3), UVec2::new(2, 1)).is_err());
    }

    #[test]
    fn test_bilinear_sampling() {
        let g = Grid::from_vec(UVec2::new(2, 2), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        assert!((g.sample_bilinear(0.5, 0.5) - 1.5).abs() < 1e-6);
        assert_eq!(g.sample_bilinear(1.0, 1.0), 3.0);
        assert_eq!(g.sample_nearest(0.9, 0.2), 0.0);
        assert_eq!(g.sample_nearest(5.0, 5.0), 3.0);
    }

    #[test]
    fn test_arithmetic() {
        let mut a = Grid::filled(UVec2::new(2, 2), 1.0);
        let b = Grid::filled(UVec2::new(2, 2), 2.0);
        a += &b;
        a *= 2.0;
        a -= 1.0;
        assert!(a.as_slice().iter().all(|&v| v == 5.0));
        let n = -a;
        assert_eq!(n.max(), -5.0);
    }

    #[test]
    fn test_zip_apply_shape_mismatch() {
        let mut a = Grid::new(UVec2::new(2, 2));
        let b = Grid::new(UVec2::new(3, 2));
        assert!(matches!(a.zip_apply(&b, |x, y| x + y), Err(GridError::ShapeMismatch(..))));
    }

    #[test]
    fn test_unique_values() {
        let g = Grid::from_vec(UVec2::new(4, 1), vec![3.0, 1.0, 3.0, 2.0]).unwrap();
        assert_eq!(g.unique_values(), vec![1.0, 2.0, 3.0]);
    }
}
