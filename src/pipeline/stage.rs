//! Generation stage trait and pipeline orchestration.

use std::collections::HashMap;

use log::{debug, info};
use thiserror::Error;

use crate::dispatch::{DispatchConfig, DispatchError, Dispatcher, NoiseMaps, TileOp};
use crate::heightmap::{GeometryError, HeightMap};
use crate::ops::{self, FractalNoiseConfig};

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Fill with coherent fractal noise.
    Noise,
    /// Re-fill with domain-warped fractal noise.
    Warp,
    /// Seam reconciliation between neighbouring tiles.
    Seams,
    /// Rescale to a target value range.
    Remap,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Noise => "noise",
            StageId::Warp => "warp",
            StageId::Seams => "seams",
            StageId::Remap => "remap",
        }
    }
}

/// Configuration passed to each generation stage.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Noise configuration for terrain generation.
    pub noise: FractalNoiseConfig,
    /// How tile operators are dispatched.
    pub dispatch: DispatchConfig,
    /// Additional stage-specific parameters.
    pub params: HashMap<String, f32>,
}

impl StageConfig {
    /// Creates a new configuration with the given noise settings.
    pub fn with_noise(noise: FractalNoiseConfig) -> Self {
        Self {
            noise,
            ..Default::default()
        }
    }

    /// Sets a stage parameter.
    pub fn set_param(&mut self, key: &str, value: f32) -> &mut Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Gets a stage parameter, returning a default if not set.
    pub fn get_param(&self, key: &str, default: f32) -> f32 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error("Dispatch error: {0}")]
    Dispatch(#[from] DispatchError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Trait for implementing generation stages.
///
/// Each stage transforms the heightmap in place, building upon previous
/// stages.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, modifying the heightmap in place.
    ///
    /// # Arguments
    /// * `heightmap` - The heightmap to modify
    /// * `config` - Stage configuration parameters
    /// * `dispatcher` - Runs the stage's tile operators
    fn execute(
        &self,
        heightmap: &mut HeightMap,
        config: &StageConfig,
        dispatcher: &Dispatcher,
    ) -> Result<(), PipelineError>;

    /// Optional progress callback for long-running stages.
    ///
    /// # Arguments
    /// * `progress` - Value from 0.0 to 1.0 indicating completion
    fn on_progress(&self, _progress: f32) {}
}

/// Orchestrates generation stages over one heightmap.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: StageConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Executes all stages in order on the given heightmap.
    pub fn run(&self, heightmap: &mut HeightMap) -> Result<(), PipelineError> {
        self.run_with_callbacks(heightmap, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages with progress callbacks.
    ///
    /// # Arguments
    /// * `heightmap` - The heightmap to generate
    /// * `on_stage_start` - Called when each stage begins
    /// * `on_stage_complete` - Called when each stage finishes
    pub fn run_with_callbacks<F1, F2>(
        &self,
        heightmap: &mut HeightMap,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let dispatcher = Dispatcher::new(&self.config.dispatch)?;
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            on_stage_start(stage.name(), i, total);
            info!("[{}/{}] {}", i + 1, total, stage.name());

            stage.execute(heightmap, &self.config, &dispatcher)?;
            stage.on_progress(1.0);
            completed.push(stage.id());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Fills the heightmap with coherent fractal noise.
pub struct NoiseStage;

impl GenerationStage for NoiseStage {
    fn id(&self) -> StageId {
        StageId::Noise
    }

    fn name(&self) -> &str {
        "Noise Generation"
    }

    fn execute(
        &self,
        heightmap: &mut HeightMap,
        config: &StageConfig,
        dispatcher: &Dispatcher,
    ) -> Result<(), PipelineError> {
        let op = TileOp::with_geometry(ops::fbm(&config.noise, heightmap.bbox()));
        dispatcher.run(&op, &mut [heightmap], NoiseMaps::none())?;
        Ok(())
    }
}

/// Re-fills the heightmap with domain-warped noise.
///
/// Two auxiliary heightmaps with the same tiling hold the x and y
/// displacement fields; their seeds are derived from the base seed.
pub struct WarpStage {
    /// Displacement scale in domain units.
    pub amplitude: f32,
}

impl WarpStage {
    pub fn new(amplitude: f32) -> Self {
        Self { amplitude }
    }
}

impl Default for WarpStage {
    fn default() -> Self {
        Self::new(0.1)
    }
}

impl GenerationStage for WarpStage {
    fn id(&self) -> StageId {
        StageId::Warp
    }

    fn name(&self) -> &str {
        "Domain Warping"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Noise]
    }

    fn execute(
        &self,
        heightmap: &mut HeightMap,
        config: &StageConfig,
        dispatcher: &Dispatcher,
    ) -> Result<(), PipelineError> {
        let amplitude = config.get_param("warp_amplitude", self.amplitude);
        let bbox = heightmap.bbox();

        let mut warp = Vec::with_capacity(2);
        for k in 1..=2 {
            let mut field = HeightMap::with_bbox(
                heightmap.shape(),
                heightmap.tiling(),
                heightmap.overlap(),
                bbox,
            )?;
            let noise = FractalNoiseConfig {
                seed: config.noise.seed.wrapping_add(k * 7919),
                ..config.noise.clone()
            };
            let op = TileOp::with_geometry(ops::fbm(&noise, bbox));
            dispatcher.run(&op, &mut [&mut field], NoiseMaps::none())?;
            warp.push(field);
        }
        debug!("warp fields ready, amplitude {amplitude}");

        let op = TileOp::with_noise(ops::fbm_warped(&config.noise, bbox, amplitude));
        let noise = NoiseMaps::new(warp.first(), warp.get(1));
        dispatcher.run(&op, &mut [heightmap], noise)?;
        Ok(())
    }
}

/// Reconciles the overlap buffers of neighbouring tiles.
pub struct SeamStage;

impl GenerationStage for SeamStage {
    fn id(&self) -> StageId {
        StageId::Seams
    }

    fn name(&self) -> &str {
        "Seam Reconciliation"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Noise]
    }

    fn execute(
        &self,
        heightmap: &mut HeightMap,
        _config: &StageConfig,
        _dispatcher: &Dispatcher,
    ) -> Result<(), PipelineError> {
        heightmap.smooth_overlap_buffers();
        Ok(())
    }
}

/// Rescales the heightmap to `[vmin, vmax]`.
pub struct RemapStage {
    pub vmin: f32,
    pub vmax: f32,
}

impl RemapStage {
    pub fn new(vmin: f32, vmax: f32) -> Self {
        Self { vmin, vmax }
    }
}

impl Default for RemapStage {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

impl GenerationStage for RemapStage {
    fn id(&self) -> StageId {
        StageId::Remap
    }

    fn name(&self) -> &str {
        "Remap"
    }

    fn execute(
        &self,
        heightmap: &mut HeightMap,
        _config: &StageConfig,
        dispatcher: &Dispatcher,
    ) -> Result<(), PipelineError> {
        if self.vmin > self.vmax {
            return Err(PipelineError::StageFailed(
                self.name().to_string(),
                format!("empty target range [{}, {}]", self.vmin, self.vmax),
            ));
        }
        let (from_min, from_max) = (heightmap.min(), heightmap.max());
        let op = TileOp::unary(ops::remap_op(self.vmin, self.vmax, from_min, from_max));
        dispatcher.run(&op, &mut [heightmap], NoiseMaps::none())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;
    use crate::dispatch::TransformMode;

    fn heightmap() -> HeightMap {
        HeightMap::new(UVec2::new(64, 64), UVec2::new(4, 4), 0.25).unwrap()
    }

    #[test]
    fn test_stage_config() {
        let mut config = StageConfig::default();
        config.set_param("warp_amplitude", 0.5);

        assert_eq!(config.get_param("warp_amplitude", 0.0), 0.5);
        assert_eq!(config.get_param("missing", 1.0), 1.0);
    }

    #[test]
    fn test_pipeline_execution() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline
            .add_stage(NoiseStage)
            .add_stage(SeamStage)
            .add_stage(RemapStage::default());
        assert_eq!(pipeline.stage_count(), 3);

        let mut h = heightmap();
        pipeline.run(&mut h).unwrap();

        assert!((h.min() - 0.0).abs() < 1e-6);
        assert!((h.max() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_missing_dependency() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(SeamStage);

        let err = pipeline.run(&mut heightmap()).unwrap_err();
        match err {
            PipelineError::MissingDependency(stage, dep) => {
                assert_eq!(stage, "Seam Reconciliation");
                assert_eq!(dep, "noise");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_warp_changes_field() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(NoiseStage);
        let mut plain = heightmap();
        pipeline.run(&mut plain).unwrap();

        pipeline.add_stage(WarpStage::new(0.2));
        let mut warped = heightmap();
        pipeline.run(&mut warped).unwrap();

        assert_ne!(plain.to_array(), warped.to_array());
    }

    #[test]
    fn test_modes_agree() {
        let run = |mode: TransformMode| {
            let config = StageConfig {
                dispatch: DispatchConfig {
                    mode,
                    threads: Some(2),
                },
                ..Default::default()
            };
            let mut pipeline = Pipeline::new(config);
            pipeline.add_stage(NoiseStage);
            let mut h = heightmap();
            pipeline.run(&mut h).unwrap();
            h.to_array()
        };

        let distributed = run(TransformMode::Distributed);
        let sequential = run(TransformMode::Sequential);
        assert_eq!(distributed, sequential);

        let single = run(TransformMode::SingleArray);
        for (a, b) in distributed.as_slice().iter().zip(single.as_slice()) {
            assert!((a - b).abs() < 1e-4);
        }
    }

    #[test]
    fn test_invalid_remap_range() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(RemapStage::new(1.0, 0.0));
        assert!(matches!(
            pipeline.run(&mut heightmap()),
            Err(PipelineError::StageFailed(..))
        ));
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(NoiseStage);

        let mut started = false;
        let mut completed = false;
        pipeline
            .run_with_callbacks(
                &mut heightmap(),
                |name, _, _| {
                    assert_eq!(name, "Noise Generation");
                    started = true;
                },
                |name, _, total| {
                    assert_eq!(total, 1);
                    assert_eq!(name, "Noise Generation");
                    completed = true;
                },
            )
            .unwrap();

        assert!(started);
        assert!(completed);
    }
}
