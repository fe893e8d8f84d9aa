//! RAW format export for game engine compatibility.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use glam::UVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::png::quantize_u16;
use crate::array::Grid;

/// Errors that can occur during RAW export.
#[derive(Error, Debug)]
pub enum RawExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
}

/// RAW export format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawFormat {
    /// 16-bit unsigned integer, little-endian (Unity default).
    #[default]
    R16LittleEndian,
    /// 16-bit unsigned integer, big-endian.
    R16BigEndian,
    /// 32-bit float, little-endian (high precision).
    R32Float,
}

impl RawFormat {
    pub fn bytes_per_sample(&self) -> u64 {
        match self {
            RawFormat::R16LittleEndian | RawFormat::R16BigEndian => 2,
            RawFormat::R32Float => 4,
        }
    }
}

/// Size in bytes of a RAW file for a grid of `shape`.
pub fn expected_file_size(shape: UVec2, format: RawFormat) -> u64 {
    shape.x as u64 * shape.y as u64 * format.bytes_per_sample()
}

/// Exports a grid as a headerless RAW heightmap.
///
/// Rows are written top row first (largest `j`), matching the PNG export.
///
/// # Arguments
/// * `grid` - The grid to export
/// * `path` - Output file path
/// * `format` - RAW format (R16 or R32)
/// * `min_height` - Minimum height for normalization (R16 only)
/// * `max_height` - Maximum height for normalization (R16 only)
///
/// # Returns
/// `Ok(())` on success, or an error if export fails
pub fn export_grid_raw(
    grid: &Grid,
    path: &Path,
    format: RawFormat,
    min_height: f32,
    max_height: f32,
) -> Result<(), RawExportError> {
    if format != RawFormat::R32Float && min_height >= max_height {
        return Err(RawExportError::InvalidHeightRange(min_height, max_height));
    }

    let mut writer = BufWriter::new(File::create(path)?);
    let range = max_height - min_height;
    let nx = grid.shape().x.max(1) as usize;

    for row in grid.as_slice().chunks_exact(nx).rev() {
        for &height in row {
            match format {
                RawFormat::R16LittleEndian => {
                    writer.write_all(&quantize_u16(height, min_height, range).to_le_bytes())?
                }
                RawFormat::R16BigEndian => {
                    writer.write_all(&quantize_u16(height, min_height, range).to_be_bytes())?
                }
                RawFormat::R32Float => writer.write_all(&height.to_le_bytes())?,
            }
        }
    }

    writer.flush()?;
    Ok(())
}
