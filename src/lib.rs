//! Tiled heightmap engine.
//!
//! A logical heightmap is split into overlapping rectangular tiles so that
//! per-tile operators can run concurrently. Overlap buffers between
//! neighbouring tiles are reconciled with a smooth blend, and the tiles
//! can be reassembled into a single grid at full or reduced resolution.

pub mod array;
pub mod config;
pub mod dispatch;
pub mod export;
pub mod geometry;
pub mod heightmap;
pub mod ops;
pub mod pipeline;

pub use array::{Grid, GridError};
pub use config::{ConfigError, EngineConfig};
pub use dispatch::{DispatchConfig, DispatchError, Dispatcher, TileOp, TransformMode};
pub use geometry::{Axis, BoundingBox};
pub use heightmap::{GeometryError, HeightMap, Tile, TilingConfig};
pub use ops::FractalNoiseConfig;
pub use pipeline::{GenerationStage, Pipeline, StageConfig};
