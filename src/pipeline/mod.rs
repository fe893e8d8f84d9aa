//! Pipeline module for orchestrating heightmap generation stages.
//!
//! Stages are composed into a [`Pipeline`] that checks their declared
//! dependencies and runs them in order on a single [`HeightMap`](crate::HeightMap).

mod stage;

pub use stage::{
    GenerationStage, NoiseStage, Pipeline, PipelineError, RemapStage, SeamStage, StageConfig,
    StageId, WarpStage,
};
