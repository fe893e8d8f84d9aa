//! Per-tile operator variants.

use glam::{UVec2, Vec2};

use crate::array::Grid;

/// Error type returned by caller-supplied operators.
pub type OpError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by caller-supplied operators.
pub type OpResult<T> = Result<T, OpError>;

/// Per-tile slices of the auxiliary noise heightmaps, if any.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseTiles<'a> {
    pub x: Option<&'a Grid>,
    pub y: Option<&'a Grid>,
}

pub type NullaryFn<'op> = Box<dyn Fn(UVec2) -> OpResult<Grid> + Send + Sync + 'op>;
pub type GeometryFn<'op> = Box<dyn Fn(UVec2, Vec2, Vec2) -> OpResult<Grid> + Send + Sync + 'op>;
pub type NoiseFn<'op> =
    Box<dyn Fn(UVec2, Vec2, Vec2, NoiseTiles<'_>) -> OpResult<Grid> + Send + Sync + 'op>;
pub type UnaryFn<'op> = Box<dyn Fn(&mut Grid) -> OpResult<()> + Send + Sync + 'op>;
pub type BinaryFn<'op> = Box<dyn Fn(&mut Grid, &mut Grid) -> OpResult<()> + Send + Sync + 'op>;
pub type TernaryFn<'op> =
    Box<dyn Fn(&mut Grid, &mut Grid, &mut Grid) -> OpResult<()> + Send + Sync + 'op>;

/// An operator applied once per tile.
///
/// Nullary variants produce a new grid of the tile shape; the others
/// mutate tiles of one, two or three heightmaps paired by tile index.
pub enum TileOp<'op> {
    /// `f(shape) -> Grid`
    Nullary(NullaryFn<'op>),
    /// `f(shape, shift, scale) -> Grid`
    NullaryWithGeometry(GeometryFn<'op>),
    /// `f(shape, shift, scale, noise) -> Grid`
    NullaryWithNoise(NoiseFn<'op>),
    /// `f(&mut a)`
    Unary(UnaryFn<'op>),
    /// `f(&mut a, &mut b)`
    Binary(BinaryFn<'op>),
    /// `f(&mut a, &mut b, &mut c)`
    Ternary(TernaryFn<'op>),
}

impl<'op> TileOp<'op> {
    pub fn nullary(f: impl Fn(UVec2) -> OpResult<Grid> + Send + Sync + 'op) -> Self {
        TileOp::Nullary(Box::new(f))
    }

    pub fn with_geometry(f: impl Fn(UVec2, Vec2, Vec2) -> OpResult<Grid> + Send + Sync + 'op) -> Self {
        TileOp::NullaryWithGeometry(Box::new(f))
    }

    pub fn with_noise(
        f: impl Fn(UVec2, Vec2, Vec2, NoiseTiles<'_>) -> OpResult<Grid> + Send + Sync + 'op,
    ) -> Self {
        TileOp::NullaryWithNoise(Box::new(f))
    }

    pub fn unary(f: impl Fn(&mut Grid) -> OpResult<()> + Send + Sync + 'op) -> Self {
        TileOp::Unary(Box::new(f))
    }

    pub fn binary(f: impl Fn(&mut Grid, &mut Grid) -> OpResult<()> + Send + Sync + 'op) -> Self {
        TileOp::Binary(Box::new(f))
    }

    pub fn ternary(
        f: impl Fn(&mut Grid, &mut Grid, &mut Grid) -> OpResult<()> + Send + Sync + 'op,
    ) -> Self {
        TileOp::Ternary(Box::new(f))
    }

    /// Number of heightmaps the operator works on.
    pub fn arity(&self) -> usize {
        match self {
            TileOp::Nullary(_)
            | TileOp::NullaryWithGeometry(_)
            | TileOp::NullaryWithNoise(_)
            | TileOp::Unary(_) => 1,
            TileOp::Binary(_) => 2,
            TileOp::Ternary(_) => 3,
        }
    }

    /// Returns true for variants that produce tile contents from scratch.
    pub fn is_fill(&self) -> bool {
        matches!(
            self,
            TileOp::Nullary(_) | TileOp::NullaryWithGeometry(_) | TileOp::NullaryWithNoise(_)
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            TileOp::Nullary(_) => "nullary",
            TileOp::NullaryWithGeometry(_) => "nullary-geometry",
            TileOp::NullaryWithNoise(_) => "nullary-noise",
            TileOp::Unary(_) => "unary",
            TileOp::Binary(_) => "binary",
            TileOp::Ternary(_) => "ternary",
        }
    }
}

impl std::fmt::Debug for TileOp<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TileOp::{}", self.name())
    }
}
