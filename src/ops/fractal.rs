//! Multi-octave fractal Brownian motion (fBm) tile generators.

use glam::{UVec2, Vec2};
use noise::{NoiseFn as _, Perlin};
use serde::{Deserialize, Serialize};

use crate::array::Grid;
use crate::dispatch::{NoiseTiles, OpResult};
use crate::geometry::BoundingBox;

/// Configuration for multi-octave fractal noise generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FractalNoiseConfig {
    /// Number of noise octaves (4-8 typical).
    pub octaves: u8,
    /// Base frequency over the domain (1.0-8.0 typical for the unit square).
    pub frequency: f32,
    /// Frequency multiplier per octave (typically 2.0).
    pub lacunarity: f32,
    /// Amplitude decay per octave (0.4-0.6 typical).
    pub persistence: f32,
    /// Random seed for reproducible generation.
    pub seed: i32,
}

impl Default for FractalNoiseConfig {
    fn default() -> Self {
        Self {
            octaves: 6,
            frequency: 4.0,
            lacunarity: 2.0,
            persistence: 0.5,
            seed: 42,
        }
    }
}

impl FractalNoiseConfig {
    /// Creates a new noise configuration with the given seed.
    pub fn with_seed(seed: i32) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Rugged terrain: many octaves with slow amplitude decay.
    pub fn mountains(seed: i32) -> Self {
        Self {
            octaves: 8,
            frequency: 3.0,
            lacunarity: 2.1,
            persistence: 0.55,
            seed,
        }
    }

    /// Smooth, low-detail terrain.
    pub fn hills(seed: i32) -> Self {
        Self {
            octaves: 4,
            frequency: 2.0,
            lacunarity: 2.0,
            persistence: 0.4,
            seed,
        }
    }
}

/// A seeded fBm sampler over 2D domain coordinates.
///
/// Each octave uses its own Perlin generator so octaves stay decorrelated.
#[derive(Debug, Clone)]
pub struct FractalNoise {
    config: FractalNoiseConfig,
    octaves: Vec<Perlin>,
}

impl FractalNoise {
    pub fn new(config: &FractalNoiseConfig) -> Self {
        let octaves = (0..config.octaves)
            .map(|octave| {
                let seed = config.seed.wrapping_add(octave as i32 * 31337);
                Perlin::new(seed as u32)
            })
            .collect();
        Self {
            config: config.clone(),
            octaves,
        }
    }

    pub fn config(&self) -> &FractalNoiseConfig {
        &self.config
    }

    /// Samples the noise at a domain position.
    ///
    /// # Returns
    /// A value in approximately `[-1, 1]` (normalized by the amplitude sum)
    pub fn sample(&self, p: Vec2) -> f32 {
        let mut total = 0.0f64;
        let mut amplitude = 1.0f64;
        let mut frequency = self.config.frequency as f64;
        let mut max_amplitude = 0.0f64;

        for perlin in &self.octaves {
            total += perlin.get([p.x as f64 * frequency, p.y as f64 * frequency]) * amplitude;
            max_amplitude += amplitude;
            amplitude *= self.config.persistence as f64;
            frequency *= self.config.lacunarity as f64;
        }

        if max_amplitude > 0.0 {
            (total / max_amplitude) as f32
        } else {
            0.0
        }
    }
}

/// Domain position of sample `(i, j)` of a tile placed at `shift`/`scale`.
///
/// Samples sit on the global lattice `k / n`, so neighbouring tiles agree
/// on the positions of their shared samples.
pub fn domain_position(
    bbox: &BoundingBox,
    shape: UVec2,
    shift: Vec2,
    scale: Vec2,
    i: u32,
    j: u32,
) -> Vec2 {
    let step = scale / shape.max(UVec2::ONE).as_vec2();
    bbox.to_domain(shift + Vec2::new(i as f32, j as f32) * step)
}

/// Tile generator producing fBm noise continuous across tiles.
///
/// # Arguments
/// * `config` - Noise parameters
/// * `bbox` - Domain covered by the heightmap
///
/// # Returns
/// An operator for [`TileOp::with_geometry`](crate::dispatch::TileOp::with_geometry)
pub fn fbm(
    config: &FractalNoiseConfig,
    bbox: BoundingBox,
) -> impl Fn(UVec2, Vec2, Vec2) -> OpResult<Grid> + Send + Sync {
    let noise = FractalNoise::new(config);
    move |shape: UVec2, shift: Vec2, scale: Vec2| -> OpResult<Grid> {
        Ok(Grid::from_fn(shape, |i, j| {
            noise.sample(domain_position(&bbox, shape, shift, scale, i, j))
        }))
    }
}

/// Tile generator producing domain-warped fBm noise.
///
/// The sample position is displaced by `amplitude` times the values of the
/// noise tiles (x displacement from `noise.x`, y from `noise.y`). Missing
/// noise tiles mean no displacement along that axis.
pub fn fbm_warped(
    config: &FractalNoiseConfig,
    bbox: BoundingBox,
    amplitude: f32,
) -> impl Fn(UVec2, Vec2, Vec2, NoiseTiles<'_>) -> OpResult<Grid> + Send + Sync {
    let noise = FractalNoise::new(config);
    move |shape: UVec2, shift: Vec2, scale: Vec2, warp: NoiseTiles<'_>| -> OpResult<Grid> {
        for tile in [warp.x, warp.y].into_iter().flatten() {
            if tile.shape() != shape {
                return Err(format!(
                    "warp tile shape {} does not match tile shape {shape}",
                    tile.shape()
                )
                .into());
            }
        }
        Ok(Grid::from_fn(shape, |i, j| {
            let dx = warp.x.map_or(0.0, |g| g[(i, j)]);
            let dy = warp.y.map_or(0.0, |g| g[(i, j)]);
            let p = domain_position(&bbox, shape, shift, scale, i, j);
            noise.sample(p + amplitude * Vec2::new(dx, dy))
        }))
    }
}
