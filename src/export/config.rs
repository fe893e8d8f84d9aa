//! Export settings and heightmap-level export entry point.

use std::path::Path;

use glam::UVec2;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::png::{export_grid_png, PngExportError, PngExportOptions};
use super::raw::{export_grid_raw, RawExportError, RawFormat};
use crate::heightmap::{GeometryError, HeightMap};

/// Errors that can occur while exporting a heightmap.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("PNG export failed: {0}")]
    Png(#[from] PngExportError),
    #[error("RAW export failed: {0}")]
    Raw(#[from] RawExportError),
    #[error("Geometry error: {0}")]
    Geometry(#[from] GeometryError),
}

/// Output file format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    /// 16-bit grayscale PNG.
    #[default]
    Png,
    /// 16-bit little-endian RAW.
    R16,
    /// 16-bit big-endian RAW.
    R16Be,
    /// 32-bit float RAW.
    R32,
}

impl ExportFormat {
    /// File extension for the format.
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            _ => "raw",
        }
    }

    fn raw_format(&self) -> Option<RawFormat> {
        match self {
            ExportFormat::Png => None,
            ExportFormat::R16 => Some(RawFormat::R16LittleEndian),
            ExportFormat::R16Be => Some(RawFormat::R16BigEndian),
            ExportFormat::R32 => Some(RawFormat::R32Float),
        }
    }
}

/// How a heightmap is written to disk.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub format: ExportFormat,
    /// Normalization range; the heightmap's own range when unset.
    pub min_height: Option<f32>,
    pub max_height: Option<f32>,
    /// Output resolution, decimated from the heightmap; full resolution
    /// when unset.
    pub shape: Option<UVec2>,
}

impl ExportConfig {
    pub fn new(format: ExportFormat) -> Self {
        Self {
            format,
            ..Default::default()
        }
    }
}

/// Reassembles `heightmap` and writes it to `path`.
///
/// # Arguments
/// * `heightmap` - The heightmap to export
/// * `path` - Output file path
/// * `config` - Format, normalization range and output resolution
pub fn export_heightmap(
    heightmap: &HeightMap,
    path: &Path,
    config: &ExportConfig,
) -> Result<(), ExportError> {
    let grid = match config.shape {
        Some(shape) => heightmap.to_array_shape(shape)?,
        None => heightmap.to_array(),
    };

    let detected = PngExportOptions::auto_range(&grid);
    let min = config.min_height.unwrap_or(detected.min_height);
    let mut max = config.max_height.unwrap_or(detected.max_height);
    if config.max_height.is_none() && max <= min {
        // flat field: export as all zeros
        max = min + 1.0;
    }

    info!(
        "exporting {} ({}) to {}",
        grid.shape(),
        config.format.extension(),
        path.display()
    );

    match config.format.raw_format() {
        None => {
            let options = PngExportOptions {
                min_height: min,
                max_height: max,
                ..detected
            };
            export_grid_png(&grid, path, &options)?;
        }
        Some(format) => export_grid_raw(&grid, path, format, min, max)?,
    }

    Ok(())
}
