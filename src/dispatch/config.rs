//! Dispatch configuration.

use serde::{Deserialize, Serialize};

/// How a dispatch call distributes work over the tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformMode {
    /// One task per tile on the thread pool, joined before returning.
    #[default]
    Distributed,
    /// Tiles processed one after the other on the calling thread.
    Sequential,
    /// Tiles reassembled into one grid, processed once, then split back.
    SingleArray,
}

impl TransformMode {
    pub fn name(&self) -> &'static str {
        match self {
            TransformMode::Distributed => "distributed",
            TransformMode::Sequential => "sequential",
            TransformMode::SingleArray => "single_array",
        }
    }
}

/// Parameters of a [`Dispatcher`](super::Dispatcher).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub mode: TransformMode,
    /// Worker threads of a dedicated pool; `None` uses the global rayon pool.
    pub threads: Option<usize>,
}

impl DispatchConfig {
    pub fn with_threads(threads: usize) -> Self {
        Self {
            threads: Some(threads),
            ..Default::default()
        }
    }

    pub fn sequential() -> Self {
        Self {
            mode: TransformMode::Sequential,
            threads: None,
        }
    }
}
