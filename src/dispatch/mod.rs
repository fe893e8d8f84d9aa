//! Dispatch layer: applies per-tile operators across the tiles of one or
//! more heightmaps.
//!
//! The free functions below run on a default distributed [`Dispatcher`];
//! build a dispatcher from a [`DispatchConfig`] for a dedicated pool or
//! another [`TransformMode`].

mod config;
mod dispatcher;
mod op;

pub use config::{DispatchConfig, TransformMode};
pub use dispatcher::{DispatchError, Dispatcher, NoiseMaps};
pub use op::{
    BinaryFn, GeometryFn, NoiseFn, NoiseTiles, NullaryFn, OpError, OpResult, TernaryFn, TileOp,
    UnaryFn,
};

use glam::{UVec2, Vec2};

use crate::array::Grid;
use crate::heightmap::HeightMap;

/// Fills every tile with `f(shape)`.
pub fn fill<F>(h: &mut HeightMap, f: F) -> Result<(), DispatchError>
where
    F: Fn(UVec2) -> OpResult<Grid> + Send + Sync,
{
    Dispatcher::default().run(&TileOp::nullary(f), &mut [h], NoiseMaps::none())
}

/// Fills every tile with `f(shape, shift, scale)`.
pub fn fill_with_geometry<F>(h: &mut HeightMap, f: F) -> Result<(), DispatchError>
where
    F: Fn(UVec2, Vec2, Vec2) -> OpResult<Grid> + Send + Sync,
{
    Dispatcher::default().run(&TileOp::with_geometry(f), &mut [h], NoiseMaps::none())
}

/// Fills every tile with `f(shape, shift, scale, noise)`, where `noise`
/// holds the tiles of `noise_x`/`noise_y` at the same index.
///
/// # Arguments
/// * `h` - Target heightmap
/// * `noise_x` - Optional heightmap with the same tiling as `h`
/// * `noise_y` - Optional heightmap with the same tiling as `h`
/// * `f` - Tile generator
pub fn fill_with_noise<F>(
    h: &mut HeightMap,
    noise_x: Option<&HeightMap>,
    noise_y: Option<&HeightMap>,
    f: F,
) -> Result<(), DispatchError>
where
    F: Fn(UVec2, Vec2, Vec2, NoiseTiles<'_>) -> OpResult<Grid> + Send + Sync,
{
    Dispatcher::default().run(
        &TileOp::with_noise(f),
        &mut [h],
        NoiseMaps::new(noise_x, noise_y),
    )
}

/// Applies `f` in place to every tile.
pub fn transform<F>(h: &mut HeightMap, f: F) -> Result<(), DispatchError>
where
    F: Fn(&mut Grid) -> OpResult<()> + Send + Sync,
{
    Dispatcher::default().run(&TileOp::unary(f), &mut [h], NoiseMaps::none())
}

/// Applies `f` to tile pairs of two heightmaps.
pub fn transform_binary<F>(
    h1: &mut HeightMap,
    h2: &mut HeightMap,
    f: F,
) -> Result<(), DispatchError>
where
    F: Fn(&mut Grid, &mut Grid) -> OpResult<()> + Send + Sync,
{
    Dispatcher::default().run(&TileOp::binary(f), &mut [h1, h2], NoiseMaps::none())
}

/// Applies `f` to tile triples of three heightmaps.
pub fn transform_ternary<F>(
    h1: &mut HeightMap,
    h2: &mut HeightMap,
    h3: &mut HeightMap,
    f: F,
) -> Result<(), DispatchError>
where
    F: Fn(&mut Grid, &mut Grid, &mut Grid) -> OpResult<()> + Send + Sync,
{
    Dispatcher::default().run(&TileOp::ternary(f), &mut [h1, h2, h3], NoiseMaps::none())
}
