//! Ready-made tile operators: fills, fractal noise and value transforms.
//!
//! These are ordinary closures for the dispatch layer; the heightmap core
//! does not depend on them.

mod filters;
mod fractal;

pub use filters::{add_op, clamp_op, constant, lerp_op, mix_by_mask_op, remap_op};
pub use fractal::{domain_position, fbm, fbm_warped, FractalNoise, FractalNoiseConfig};
