//! Simple fill and value transforms usable as tile operators.

use glam::UVec2;

use crate::array::{Grid, GridError};
use crate::dispatch::OpResult;

/// Tile generator filling every sample with `value`.
pub fn constant(value: f32) -> impl Fn(UVec2) -> OpResult<Grid> + Send + Sync {
    move |shape: UVec2| -> OpResult<Grid> { Ok(Grid::filled(shape, value)) }
}

/// Linear rescale from `[from_min, from_max]` to `[vmin, vmax]`.
///
/// The source range must be global (e.g. the heightmap min/max) for the
/// result to be consistent across tiles.
pub fn remap_op(
    vmin: f32,
    vmax: f32,
    from_min: f32,
    from_max: f32,
) -> impl Fn(&mut Grid) -> OpResult<()> + Send + Sync {
    move |grid: &mut Grid| -> OpResult<()> {
        grid.remap(vmin, vmax, from_min, from_max);
        Ok(())
    }
}

pub fn clamp_op(lo: f32, hi: f32) -> impl Fn(&mut Grid) -> OpResult<()> + Send + Sync {
    move |grid: &mut Grid| -> OpResult<()> {
        if lo > hi {
            return Err(format!("invalid clamp range [{lo}, {hi}]").into());
        }
        grid.clamp(lo, hi);
        Ok(())
    }
}

pub fn add_op(value: f32) -> impl Fn(&mut Grid) -> OpResult<()> + Send + Sync {
    move |grid: &mut Grid| -> OpResult<()> {
        *grid += value;
        Ok(())
    }
}

/// `a <- a + t * (b - a)`; `b` is left untouched.
pub fn lerp_op(t: f32) -> impl Fn(&mut Grid, &mut Grid) -> OpResult<()> + Send + Sync {
    move |a: &mut Grid, b: &mut Grid| -> OpResult<()> {
        a.zip_apply(b, |x, y| x + t * (y - x))?;
        Ok(())
    }
}

/// `a <- a + m * (b - a)` with the mask `m` clamped to `[0, 1]`.
pub fn mix_by_mask_op() -> impl Fn(&mut Grid, &mut Grid, &mut Grid) -> OpResult<()> + Send + Sync {
    |a: &mut Grid, b: &mut Grid, mask: &mut Grid| -> OpResult<()> {
        for other in [b.shape(), mask.shape()] {
            if other != a.shape() {
                return Err(GridError::ShapeMismatch(a.shape(), other).into());
            }
        }
        let values = a.as_mut_slice().iter_mut();
        for ((v, &w), &m) in values.zip(b.as_slice()).zip(mask.as_slice()) {
            let m = m.clamp(0.0, 1.0);
            *v += m * (w - *v);
        }
        Ok(())
    }
}
