//! Fan-out/fan-in execution of tile operators.

use glam::{UVec2, Vec2};
use log::{debug, trace, warn};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use thiserror::Error;

use super::config::{DispatchConfig, TransformMode};
use super::op::{NoiseTiles, OpError, TileOp};
use crate::array::Grid;
use crate::heightmap::{GeometryError, HeightMap, Tile};

/// Errors raised by a dispatch call.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Operator '{op}' works on {expected} heightmap(s), got {found}")]
    Arity {
        op: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("Tiling mismatch: expected {expected}, found {found}")]
    TilingMismatch { expected: UVec2, found: UVec2 },
    #[error("Heightmap {index} differs in shape or overlap from the first heightmap")]
    LayoutMismatch { index: usize },
    #[error("Operator failed on tile {tile}: {source}")]
    OperatorFailed {
        tile: usize,
        #[source]
        source: OpError,
    },
    #[error("Operator produced shape {found} on tile {tile}, expected {expected}")]
    OutputShape {
        tile: usize,
        expected: UVec2,
        found: UVec2,
    },
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
    #[error("Thread pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Optional auxiliary heightmaps whose tiles feed noise-driven operators.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoiseMaps<'a> {
    pub x: Option<&'a HeightMap>,
    pub y: Option<&'a HeightMap>,
}

impl<'a> NoiseMaps<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(x: Option<&'a HeightMap>, y: Option<&'a HeightMap>) -> Self {
        Self { x, y }
    }

    fn tiles_at(&self, k: usize) -> NoiseTiles<'a> {
        NoiseTiles {
            x: self.x.and_then(|h| h.tiles().get(k)).map(Tile::grid),
            y: self.y.and_then(|h| h.tiles().get(k)).map(Tile::grid),
        }
    }
}

/// Where the operator is applied: the tile (or whole-domain) placement.
#[derive(Debug, Clone, Copy)]
struct Placement {
    index: usize,
    shape: UVec2,
    shift: Vec2,
    scale: Vec2,
}

/// Runs [`TileOp`]s over one to three heightmaps.
///
/// In distributed mode every tile index becomes one task; the call returns
/// once all tasks have finished. A failing task does not cancel the others,
/// and the first error (by tile index) is returned. The participating
/// heightmaps must then be treated as invalid.
#[derive(Debug, Default)]
pub struct Dispatcher {
    mode: TransformMode,
    pool: Option<ThreadPool>,
}

impl Dispatcher {
    /// Builds a dispatcher, creating a dedicated thread pool if requested.
    pub fn new(config: &DispatchConfig) -> Result<Self, DispatchError> {
        let pool = match config.threads {
            Some(threads) => Some(
                ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("tile-worker-{i}"))
                    .build()?,
            ),
            None => None,
        };
        Ok(Self {
            mode: config.mode,
            pool,
        })
    }

    /// Distributed dispatcher on the global rayon pool.
    pub fn distributed() -> Self {
        Self::default()
    }

    pub fn sequential() -> Self {
        Self {
            mode: TransformMode::Sequential,
            pool: None,
        }
    }

    pub fn single_array() -> Self {
        Self {
            mode: TransformMode::SingleArray,
            pool: None,
        }
    }

    pub fn mode(&self) -> TransformMode {
        self.mode
    }

    /// Applies `op` to `maps`, pairing tiles by index.
    ///
    /// # Arguments
    /// * `op` - The operator; its arity must equal `maps.len()`
    /// * `maps` - Target heightmaps, all with identical geometry
    /// * `noise` - Auxiliary heightmaps for [`TileOp::NullaryWithNoise`]
    pub fn run(
        &self,
        op: &TileOp<'_>,
        maps: &mut [&mut HeightMap],
        noise: NoiseMaps<'_>,
    ) -> Result<(), DispatchError> {
        self.check(op, maps, noise)?;
        debug!(
            "dispatch {} ({}) over {} tile(s)",
            op.name(),
            self.mode.name(),
            maps[0].ntiles()
        );

        match self.mode {
            TransformMode::Distributed => match &self.pool {
                Some(pool) => pool.install(|| run_tiles(op, maps, noise, true)),
                None => run_tiles(op, maps, noise, true),
            },
            TransformMode::Sequential => run_tiles(op, maps, noise, false),
            TransformMode::SingleArray => run_single_array(op, maps, noise),
        }
    }

    /// Preconditions shared by every mode.
    fn check(
        &self,
        op: &TileOp<'_>,
        maps: &[&mut HeightMap],
        noise: NoiseMaps<'_>,
    ) -> Result<(), DispatchError> {
        if maps.len() != op.arity() {
            return Err(DispatchError::Arity {
                op: op.name(),
                expected: op.arity(),
                found: maps.len(),
            });
        }
        let first = &*maps[0];
        let mut others: Vec<&HeightMap> = maps[1..].iter().map(|h| &**h).collect();
        if let Some(h) = noise.x {
            others.push(h);
        }
        if let Some(h) = noise.y {
            others.push(h);
        }
        for (offset, other) in others.into_iter().enumerate() {
            if other.tiling() != first.tiling() {
                return Err(DispatchError::TilingMismatch {
                    expected: first.tiling(),
                    found: other.tiling(),
                });
            }
            if !first.is_compatible(other) {
                return Err(DispatchError::LayoutMismatch { index: offset + 1 });
            }
        }
        Ok(())
    }
}

/// Runs one task per tile index, in parallel or in index order.
fn run_tiles(
    op: &TileOp<'_>,
    maps: &mut [&mut HeightMap],
    noise: NoiseMaps<'_>,
    parallel: bool,
) -> Result<(), DispatchError> {
    let ntiles = maps[0].ntiles();

    // transpose [map][tile] into [tile][map]
    let mut columns: Vec<_> = maps.iter_mut().map(|h| h.tiles_mut().iter_mut()).collect();
    let groups: Vec<Vec<&mut Tile>> = (0..ntiles)
        .map(|_| columns.iter_mut().filter_map(|c| c.next()).collect())
        .collect();

    let task = |(k, mut group): (usize, Vec<&mut Tile>)| -> Result<(), DispatchError> {
        trace!("tile {k}: {}", op.name());
        let placement = Placement {
            index: k,
            shape: group[0].shape(),
            shift: group[0].shift,
            scale: group[0].scale,
        };
        let mut grids: Vec<&mut Grid> = group.iter_mut().map(|t| t.grid_mut()).collect();
        apply(op, placement, &mut grids, noise.tiles_at(k))
    };

    // every task runs to completion before errors are inspected
    let results: Vec<Result<(), DispatchError>> = if parallel {
        groups.into_par_iter().enumerate().map(task).collect()
    } else {
        groups.into_iter().enumerate().map(task).collect()
    };

    first_error(results)
}

/// Reassembles every map, applies the operator once over the whole domain
/// and splits the results back into tiles.
fn run_single_array(
    op: &TileOp<'_>,
    maps: &mut [&mut HeightMap],
    noise: NoiseMaps<'_>,
) -> Result<(), DispatchError> {
    let mut arrays: Vec<Grid> = maps.iter().map(|h| h.to_array()).collect();
    let noise_x = noise.x.map(HeightMap::to_array);
    let noise_y = noise.y.map(HeightMap::to_array);

    let placement = Placement {
        index: 0,
        shape: maps[0].shape(),
        shift: Vec2::ZERO,
        scale: Vec2::ONE,
    };
    let mut grids: Vec<&mut Grid> = arrays.iter_mut().collect();
    apply(
        op,
        placement,
        &mut grids,
        NoiseTiles {
            x: noise_x.as_ref(),
            y: noise_y.as_ref(),
        },
    )?;

    for (map, array) in maps.iter_mut().zip(&arrays) {
        map.from_array(array)?;
    }
    Ok(())
}

/// Applies `op` to the grids of one placement.
fn apply(
    op: &TileOp<'_>,
    placement: Placement,
    grids: &mut [&mut Grid],
    noise: NoiseTiles<'_>,
) -> Result<(), DispatchError> {
    let k = placement.index;
    let failed = |source: OpError| DispatchError::OperatorFailed { tile: k, source };

    let produced = match op {
        TileOp::Nullary(f) => Some(f(placement.shape).map_err(failed)?),
        TileOp::NullaryWithGeometry(f) => {
            Some(f(placement.shape, placement.shift, placement.scale).map_err(failed)?)
        }
        TileOp::NullaryWithNoise(f) => {
            Some(f(placement.shape, placement.shift, placement.scale, noise).map_err(failed)?)
        }
        TileOp::Unary(f) => match grids {
            [a] => {
                f(&mut **a).map_err(failed)?;
                None
            }
            _ => return Err(arity_error(op, grids.len())),
        },
        TileOp::Binary(f) => match grids {
            [a, b] => {
                f(&mut **a, &mut **b).map_err(failed)?;
                None
            }
            _ => return Err(arity_error(op, grids.len())),
        },
        TileOp::Ternary(f) => match grids {
            [a, b, c] => {
                f(&mut **a, &mut **b, &mut **c).map_err(failed)?;
                None
            }
            _ => return Err(arity_error(op, grids.len())),
        },
    };

    if let Some(grid) = produced {
        check_shape(k, placement.shape, grid.shape())?;
        match grids.first_mut() {
            Some(target) => **target = grid,
            None => return Err(arity_error(op, 0)),
        }
    }

    // in-place operators must not resize the tile
    for grid in grids.iter() {
        check_shape(k, placement.shape, grid.shape())?;
    }
    Ok(())
}

fn check_shape(tile: usize, expected: UVec2, found: UVec2) -> Result<(), DispatchError> {
    if expected != found {
        return Err(DispatchError::OutputShape {
            tile,
            expected,
            found,
        });
    }
    Ok(())
}

fn arity_error(op: &TileOp<'_>, found: usize) -> DispatchError {
    DispatchError::Arity {
        op: op.name(),
        expected: op.arity(),
        found,
    }
}

fn first_error(results: Vec<Result<(), DispatchError>>) -> Result<(), DispatchError> {
    let mut errors = results.into_iter().filter_map(Result::err);
    match errors.next() {
        Some(first) => {
            let others = errors.count();
            if others > 0 {
                warn!("{} more tile task(s) failed after: {first}", others);
            }
            Err(first)
        }
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn map(tiling: UVec2) -> HeightMap {
        HeightMap::new(UVec2::new(64, 64), tiling, 0.25).unwrap()
    }

    #[test]
    fn test_nullary_fill_every_tile() {
        let mut h = map(UVec2::new(2, 2));
        let op = TileOp::nullary(|shape| Ok(Grid::filled(shape, 1.5)));
        Dispatcher::distributed().run(&op, &mut [&mut h], NoiseMaps::none()).unwrap();
        assert!(h.tiles().iter().all(|t| t.as_slice().iter().all(|&v| v == 1.5)));
    }

    #[test]
    fn test_geometry_op_receives_tile_placement() {
        let mut h = map(UVec2::new(2, 2));
        let op = TileOp::with_geometry(|shape, shift, scale| {
            Ok(Grid::filled(shape, shift.x * 10.0 + scale.y))
        });
        Dispatcher::sequential().run(&op, &mut [&mut h], NoiseMaps::none()).unwrap();
        for tile in h.tiles() {
            assert_eq!(tile[(0, 0)], tile.shift.x * 10.0 + tile.scale.y);
        }
    }

    #[test]
    fn test_arity_mismatch() {
        let mut a = map(UVec2::new(2, 2));
        let op = TileOp::binary(|_, _| Ok(()));
        let err = Dispatcher::distributed().run(&op, &mut [&mut a], NoiseMaps::none()).unwrap_err();
        assert!(matches!(err, DispatchError::Arity { expected: 2, found: 1, .. }));
    }

    #[test]
    fn test_tiling_mismatch_fails_fast() {
        let calls = AtomicUsize::new(0);
        let mut a = map(UVec2::new(2, 2));
        let mut b = map(UVec2::new(4, 2));
        let op = TileOp::binary(|_, _| {
            calls.fetch_add(1, Ordering::Relaxed);
            Ok(())
        });
        let err = Dispatcher::distributed()
            .run(&op, &mut [&mut a, &mut b], NoiseMaps::none())
            .unwrap_err();
        assert!(matches!(err, DispatchError::TilingMismatch { .. }));
        assert_eq!(calls.load(Ordering::Relaxed), 0);

        let mut c = HeightMap::new(UVec2::new(64, 64), UVec2::new(2, 2), 0.0).unwrap();
        let err = Dispatcher::distributed()
            .run(&op, &mut [&mut a, &mut c], NoiseMaps::none())
            .unwrap_err();
        assert!(matches!(err, DispatchError::LayoutMismatch { index: 1 }));
    }

    #[test]
    fn test_failure_lets_other_tasks_finish() {
        let calls = AtomicUsize::new(0);
        let mut h = map(UVec2::new(4, 4));
        let op = TileOp::with_geometry(|shape, shift, _| {
            calls.fetch_add(1, Ordering::Relaxed);
            if shift == Vec2::ZERO {
                Err("boom".into())
            } else {
                Ok(Grid::new(shape))
            }
        });
        let err = Dispatcher::distributed().run(&op, &mut [&mut h], NoiseMaps::none()).unwrap_err();
        assert!(matches!(err, DispatchError::OperatorFailed { tile: 0, .. }));
        assert_eq!(calls.load(Ordering::Relaxed), 16);
    }

    #[test]
    fn test_wrong_output_shape() {
        let mut h = map(UVec2::new(2, 1));
        let op = TileOp::nullary(|_| Ok(Grid::new(UVec2::new(3, 3))));
        let err = Dispatcher::distributed().run(&op, &mut [&mut h], NoiseMaps::none()).unwrap_err();
        assert!(matches!(err, DispatchError::OutputShape { .. }));

        let resize = TileOp::unary(|g| {
            *g = Grid::new(UVec2::ONE);
            Ok(())
        });
        let err = Dispatcher::sequential().run(&resize, &mut [&mut h], NoiseMaps::none()).unwrap_err();
        assert!(matches!(err, DispatchError::OutputShape { .. }));
    }

    #[test]
    fn test_ternary_pairs_tiles_by_index() {
        let mut a = map(UVec2::new(2, 2));
        let mut b = HeightMap::with_fill_value(UVec2::new(64, 64), UVec2::new(2, 2), 0.25, 2.0).unwrap();
        let mut c = HeightMap::with_fill_value(UVec2::new(64, 64), UVec2::new(2, 2), 0.25, 3.0).unwrap();
        let op = TileOp::ternary(|a, b, c| {
            a.fill(1.0);
            *a += &*b;
            *a *= &*c;
            Ok(())
        });
        Dispatcher::distributed()
            .run(&op, &mut [&mut a, &mut b, &mut c], NoiseMaps::none())
            .unwrap();
        assert_eq!((a.min(), a.max()), (9.0, 9.0));
    }

    #[test]
    fn test_noise_tiles_are_paired() {
        let nx = HeightMap::with_fill_value(UVec2::new(64, 64), UVec2::new(2, 2), 0.25, 0.5).unwrap();
        let mut h = map(UVec2::new(2, 2));
        let op = TileOp::with_noise(|shape, _, _, noise| {
            let dx = noise.x.ok_or("missing noise")?;
            assert!(noise.y.is_none());
            let mut g = Grid::new(shape);
            g.zip_apply(dx, |_, n| n * 4.0)?;
            Ok(g)
        });
        Dispatcher::distributed()
            .run(&op, &mut [&mut h], NoiseMaps::new(Some(&nx), None))
            .unwrap();
        assert_eq!((h.min(), h.max()), (2.0, 2.0));

        let bad = map(UVec2::new(4, 4));
        let err = Dispatcher::distributed()
            .run(&op, &mut [&mut h], NoiseMaps::new(Some(&bad), None))
            .unwrap_err();
        assert!(matches!(err, DispatchError::TilingMismatch { .. }));
    }

    #[test]
    fn test_single_array_mode() {
        let mut h = map(UVec2::new(2, 2));
        let op = TileOp::with_geometry(|shape, shift, scale| {
            assert_eq!(shape, UVec2::new(64, 64));
            assert_eq!((shift, scale), (Vec2::ZERO, Vec2::ONE));
            Ok(Grid::from_fn(shape, |i, j| (i + j) as f32))
        });
        Dispatcher::single_array().run(&op, &mut [&mut h], NoiseMaps::none()).unwrap();
        let array = h.to_array();
        assert_eq!(array[(10, 20)], 30.0);
        // buffers carry the neighbor's values
        let t = h.tile(1, 1).unwrap();
        assert_eq!(t[(0, 0)], (t.origin().x + t.origin().y) as f32);
    }

    #[test]
    fn test_dedicated_pool() {
        let dispatcher = Dispatcher::new(&DispatchConfig::with_threads(2)).unwrap();
        let mut h = map(UVec2::new(4, 4));
        let op = TileOp::nullary(|shape| {
            let name = std::thread::current().name().map(str::to_owned).unwrap_or_default();
            assert!(name.starts_with("tile-worker-"));
            Ok(Grid::filled(shape, 1.0))
        });
        dispatcher.run(&op, &mut [&mut h], NoiseMaps::none()).unwrap();
        assert_eq!(h.min(), 1.0);
    }

    #[test]
    fn test_distributed_fill_is_deterministic() {
        let op = TileOp::with_geometry(|shape, shift, scale| {
            Ok(Grid::from_fn(shape, |i, j| {
                (shift.x + i as f32 * scale.x).sin() * (shift.y + j as f32 * scale.y).cos()
            }))
        });
        let mut a = map(UVec2::new(4, 4));
        let mut b = map(UVec2::new(4, 4));
        Dispatcher::distributed().run(&op, &mut [&mut a], NoiseMaps::none()).unwrap();
        Dispatcher::distributed().run(&op, &mut [&mut b], NoiseMaps::none()).unwrap();
        assert_eq!(a, b);
    }
}
