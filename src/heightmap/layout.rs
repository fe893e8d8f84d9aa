//! Tile geometry: buffered shapes, shifts, scales and bounding boxes.

use glam::{UVec2, Vec2};
use thiserror::Error;

use crate::array::GridError;
use crate::geometry::{Axis, BoundingBox};

/// Errors raised when a shape/tiling/overlap combination cannot be tiled.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Shape {0} has an empty axis")]
    EmptyShape(UVec2),
    #[error("Tiling {0} has an empty axis")]
    EmptyTiling(UVec2),
    #[error("Shape {size} along {axis} is not divisible by {tiles} tiles")]
    NotDivisible { axis: Axis, size: u32, tiles: u32 },
    #[error("Overlap {0} outside [0, 1)")]
    InvalidOverlap(f32),
    #[error("Buffer of {buffer} samples along {axis} exceeds half the base tile size {base}")]
    BufferTooWide { axis: Axis, buffer: u32, base: u32 },
    #[error("Invalid bounding box {0}")]
    InvalidBoundingBox(BoundingBox),
    #[error("Target shape {target} invalid for heightmap shape {shape}")]
    InvalidTargetShape { target: UVec2, shape: UVec2 },
    #[error("Array shape {found} does not match heightmap shape {expected}")]
    ShapeMismatch { expected: UVec2, found: UVec2 },
    #[error("Grid error: {0}")]
    Grid(#[from] GridError),
}

/// Placement of one tile inside the logical grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileLayout {
    /// Tile position `(it, jt)` in the tiling.
    pub position: UVec2,
    /// Buffered tile shape in samples.
    pub shape: UVec2,
    /// Lower-left sample of the buffered tile in the logical grid.
    pub origin: UVec2,
    /// Width of the leading (left/bottom) buffer per axis.
    pub lead_buffer: UVec2,
    /// Non-buffered tile size per axis.
    pub base_shape: UVec2,
    /// Normalized lower-left corner, buffers included.
    pub shift: Vec2,
    /// Normalized size, buffers included.
    pub scale: Vec2,
    /// Absolute domain rectangle covered by the buffered tile.
    pub bbox: BoundingBox,
}

/// Checks that the logical shape can be split into `tiling` tiles with the
/// given overlap.
pub fn validate(shape: UVec2, tiling: UVec2, overlap: f32) -> Result<(), GeometryError> {
    if shape.x == 0 || shape.y == 0 {
        return Err(GeometryError::EmptyShape(shape));
    }
    if tiling.x == 0 || tiling.y == 0 {
        return Err(GeometryError::EmptyTiling(tiling));
    }
    for axis in Axis::all() {
        let size = axis.of(shape);
        let tiles = axis.of(tiling);
        if size % tiles != 0 {
            return Err(GeometryError::NotDivisible { axis, size, tiles });
        }
    }
    if !(0.0..1.0).contains(&overlap) {
        return Err(GeometryError::InvalidOverlap(overlap));
    }
    let base = base_tile_shape(shape, tiling);
    let buffer = buffer_widths(shape, tiling, overlap);
    for axis in Axis::all() {
        if 2 * axis.of(buffer) > axis.of(base) {
            return Err(GeometryError::BufferTooWide {
                axis,
                buffer: axis.of(buffer),
                base: axis.of(base),
            });
        }
    }
    Ok(())
}

/// Non-buffered tile size per axis.
pub fn base_tile_shape(shape: UVec2, tiling: UVec2) -> UVec2 {
    shape / tiling
}

/// Buffer width shared across each interior edge, per axis.
pub fn buffer_widths(shape: UVec2, tiling: UVec2, overlap: f32) -> UVec2 {
    UVec2::new(
        (overlap * shape.x as f32 / tiling.x as f32) as u32,
        (overlap * shape.y as f32 / tiling.y as f32) as u32,
    )
}

/// Computes the layout of every tile, indexed by `it + jt * tiling.x`.
pub fn compute_layouts(
    shape: UVec2,
    tiling: UVec2,
    overlap: f32,
    bbox: BoundingBox,
) -> Result<Vec<TileLayout>, GeometryError> {
    validate(shape, tiling, overlap)?;
    if !bbox.is_valid() {
        return Err(GeometryError::InvalidBoundingBox(bbox));
    }

    let base = base_tile_shape(shape, tiling);
    let delta = buffer_widths(shape, tiling, overlap);
    let shape_f = shape.as_vec2();

    let mut layouts = Vec::with_capacity((tiling.x * tiling.y) as usize);
    for jt in 0..tiling.y {
        for it in 0..tiling.x {
            let position = UVec2::new(it, jt);

            // buffers only on edges shared with another tile
            let lead = UVec2::new(
                if it > 0 { delta.x } else { 0 },
                if jt > 0 { delta.y } else { 0 },
            );
            let trail = UVec2::new(
                if it + 1 < tiling.x { delta.x } else { 0 },
                if jt + 1 < tiling.y { delta.y } else { 0 },
            );

            let tile_shape = base + lead + trail;
            let origin = position * base - lead;

            let mut shift = position.as_vec2() / tiling.as_vec2();
            if it > 0 {
                shift.x -= delta.x as f32 / shape_f.x;
            }
            if jt > 0 {
                shift.y -= delta.y as f32 / shape_f.y;
            }
            let scale = tile_shape.as_vec2() / shape_f;

            layouts.push(TileLayout {
                position,
                shape: tile_shape,
                origin,
                lead_buffer: lead,
                base_shape: base,
                shift,
                scale,
                bbox: bbox.sub_box(shift, scale),
            });
        }
    }

    Ok(layouts)
}
