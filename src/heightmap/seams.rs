//! Seam reconciliation between adjacent tiles.
//!
//! Adjacent tiles share a strip of `B` samples: the leading buffer of the
//! upper/right tile and the last `B` base samples of the lower/left one.
//! Both copies are replaced by a quintic-smoothstep blend so the two tiles
//! agree exactly in that strip.

use log::{debug, warn};

use super::map::HeightMap;
use crate::geometry::Axis;

/// Quintic smoothstep `r^3 (r (6r - 15) + 10)`.
#[inline]
pub fn smootherstep(r: f32) -> f32 {
    (r * (r * 6.0 - 15.0) + 10.0) * r * r * r
}

/// Blend weight of strip sample `p` for a buffer of width `buffer`.
#[inline]
fn blend_weight(p: u32, buffer: u32) -> f32 {
    if buffer == 1 {
        return 0.5;
    }
    smootherstep(p as f32 / (buffer - 1) as f32)
}

impl HeightMap {
    /// Blends the shared buffer strips of adjacent tiles, x pass then y pass.
    ///
    /// The y pass reads values already written by the x pass; cells in the
    /// corner of four tiles are blended twice.
    pub fn smooth_overlap_buffers(&mut self) {
        let buffers = self.buffer_widths();
        if self.overlap() > 0.0 && (buffers.x == 0 || buffers.y == 0) {
            warn!(
                "overlap {} yields buffers {}, seams along an empty axis are left untouched",
                self.overlap(),
                buffers
            );
        }
        for axis in Axis::all() {
            self.blend_pass(axis);
        }
    }

    /// Runs the blend along one axis for every adjacent tile pair.
    pub(crate) fn blend_pass(&mut self, axis: Axis) {
        let buffer = axis.of(self.buffer_widths());
        let tiling = self.tiling();
        if buffer == 0 {
            return;
        }
        debug!("seam pass along {axis}: buffer {buffer}");

        let (pairs_x, pairs_y) = match axis {
            Axis::X => (tiling.x - 1, tiling.y),
            Axis::Y => (tiling.x, tiling.y - 1),
        };

        for it in 0..pairs_x {
            for jt in 0..pairs_y {
                let k = self.tile_index(it, jt);
                let kn = match axis {
                    Axis::X => self.tile_index(it + 1, jt),
                    Axis::Y => self.tile_index(it, jt + 1),
                };

                // kn > k, so both tiles can be borrowed mutably at once
                let (lower, upper) = self.tiles_mut().split_at_mut(kn);
                let tile = &mut lower[k];
                let next = &mut upper[0];
                let shape = tile.shape();

                match axis {
                    Axis::X => {
                        for p in 0..buffer {
                            let r = blend_weight(p, buffer);
                            let pbuf = shape.x - 2 * buffer + p;
                            for q in 0..shape.y {
                                let v = (1.0 - r) * tile[(pbuf, q)] + r * next[(p, q)];
                                next[(p, q)] = v;
                                tile[(pbuf, q)] = v;
                            }
                        }
                    }
                    Axis::Y => {
                        for q in 0..buffer {
                            let r = blend_weight(q, buffer);
                            let qbuf = shape.y - 2 * buffer + q;
                            for p in 0..shape.x {
                                let v = (1.0 - r) * tile[(p, qbuf)] + r * next[(p, q)];
                                next[(p, q)] = v;
                                tile[(p, qbuf)] = v;
                            }
                        }
                    }
                }
            }
        }
    }
}
