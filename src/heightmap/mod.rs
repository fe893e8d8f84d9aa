//! Tiled heightmaps.
//!
//! A [`HeightMap`] splits a logical grid into overlapping [`Tile`]s so
//! per-tile work can run concurrently, then blends the shared buffers and
//! reassembles the tiles into a single [`Grid`](crate::array::Grid).

mod config;
pub mod layout;
mod map;
mod reassembly;
mod seams;
mod tile;
mod values;

pub use config::TilingConfig;
pub use layout::{GeometryError, TileLayout};
pub use map::HeightMap;
pub use seams::smootherstep;
pub use tile::Tile;
