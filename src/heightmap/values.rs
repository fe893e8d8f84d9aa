//! Whole-heightmap value transforms built on the dispatch layer.

use super::map::HeightMap;
use crate::dispatch::{self, DispatchError};

impl HeightMap {
    /// Rescales values from the current global range to `[vmin, vmax]`.
    pub fn remap(&mut self, vmin: f32, vmax: f32) -> Result<(), DispatchError> {
        let from_min = self.min();
        let from_max = self.max();
        self.remap_from(vmin, vmax, from_min, from_max)
    }

    /// Rescales values from `[from_min, from_max]` to `[vmin, vmax]`.
    pub fn remap_from(
        &mut self,
        vmin: f32,
        vmax: f32,
        from_min: f32,
        from_max: f32,
    ) -> Result<(), DispatchError> {
        dispatch::transform(self, move |grid| {
            grid.remap(vmin, vmax, from_min, from_max);
            Ok(())
        })
    }

    /// Mirrors values about the global maximum: `h <- max - h`.
    pub fn inverse(&mut self) -> Result<(), DispatchError> {
        let hmax = self.max();
        dispatch::transform(self, move |grid| {
            grid.map_inplace(|v| hmax - v);
            Ok(())
        })
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;
    use crate::array::Grid;

    fn ramp() -> HeightMap {
        let mut h = HeightMap::new(UVec2::new(64, 32), UVec2::new(2, 2), 0.25).unwrap();
        let full = h.shape().as_vec2();
        dispatch::fill_with_geometry(&mut h, move |shape, shift, _| {
            let x0 = (shift.x * full.x).round();
            Ok(Grid::from_fn(shape, |i, _| x0 + i as f32))
        })
        .unwrap();
        h
    }

    #[test]
    fn test_remap_to_unit_range() {
        let mut h = ramp();
        assert_eq!((h.min(), h.max()), (0.0, 63.0));
        h.remap(0.0, 1.0).unwrap();
        assert_eq!(h.min(), 0.0);
        assert!((h.max() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_remap_from_explicit_range() {
        let mut h = HeightMap::with_fill_value(UVec2::new(16, 16), UVec2::ONE, 0.0, 5.0).unwrap();
        h.remap_from(0.0, 2.0, 0.0, 10.0).unwrap();
        assert_eq!(h.max(), 1.0);
    }

    #[test]
    fn test_inverse() {
        let mut h = ramp();
        h.inverse().unwrap();
        assert_eq!(h.max(), 63.0);
        assert_eq!(h.min(), 0.0);
        assert_eq!(h.to_array()[(0, 0)], 63.0);
    }
}
