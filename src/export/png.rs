//! PNG export functionality for heightmaps.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::ImageEncoder;
use thiserror::Error;

use crate::array::Grid;

/// Errors that can occur during PNG export.
#[derive(Error, Debug)]
pub enum PngExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
    #[error("Cannot export an empty grid")]
    EmptyGrid,
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Minimum height value for normalization.
    pub min_height: f32,
    /// Maximum height value for normalization.
    pub max_height: f32,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_height: 0.0,
            max_height: 1.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options with the height range detected from the grid.
    pub fn auto_range(grid: &Grid) -> Self {
        Self {
            min_height: grid.min(),
            max_height: grid.max(),
            ..Default::default()
        }
    }
}

/// Quantizes `height` from `[min, min + range]` to the full `u16` range.
pub(crate) fn quantize_u16(height: f32, min: f32, range: f32) -> u16 {
    let normalized = ((height - min) / range).clamp(0.0, 1.0);
    (normalized * 65535.0).round() as u16
}

/// Exports a grid as a 16-bit grayscale PNG.
///
/// Image row 0 is the top of the domain (largest `j`).
///
/// # Arguments
/// * `grid` - The grid to export
/// * `path` - Output file path
/// * `options` - Export options including height range for normalization
///
/// # Returns
/// `Ok(())` on success, or an error if export fails
pub fn export_grid_png(
    grid: &Grid,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), PngExportError> {
    let min = options.min_height;
    let max = options.max_height;

    if min >= max {
        return Err(PngExportError::InvalidHeightRange(min, max));
    }
    if grid.is_empty() {
        return Err(PngExportError::EmptyGrid);
    }

    let shape = grid.shape();
    let range = max - min;

    let pixels: Vec<u16> = grid
        .as_slice()
        .chunks_exact(shape.x as usize)
        .rev()
        .flatten()
        .map(|&h| quantize_u16(h, min, range))
        .collect();

    let writer = BufWriter::new(File::create(path)?);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    let byte_slice: &[u8] = bytemuck::cast_slice(&pixels);
    encoder.write_image(byte_slice, shape.x, shape.y, image::ExtendedColorType::L16)?;

    Ok(())
}
