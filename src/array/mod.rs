//! Dense 2D sample storage shared by tiles and reassembled heightmaps.

mod grid;

pub use grid::{Grid, GridError};
