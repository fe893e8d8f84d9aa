//! Engine configuration loaded from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::DispatchConfig;
use crate::export::ExportConfig;
use crate::heightmap::{GeometryError, TilingConfig};
use crate::ops::FractalNoiseConfig;

/// Errors raised while loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid tiling: {0}")]
    Geometry(#[from] GeometryError),
}

/// Everything needed to generate and export a heightmap.
///
/// ```toml
/// [tiling]
/// shape = [512, 512]
/// tiling = [4, 4]
/// overlap = 0.25
///
/// [dispatch]
/// mode = "distributed"
/// threads = 8
///
/// [noise]
/// octaves = 6
/// seed = 1
///
/// [export]
/// format = "png"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub tiling: TilingConfig,
    pub dispatch: DispatchConfig,
    pub noise: FractalNoiseConfig,
    pub export: ExportConfig,
}

impl EngineConfig {
    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = toml::from_str(s)?;
        config.tiling.validate()?;
        Ok(config)
    }

    /// Reads a configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let s = std::fs::read_to_string(path)?;
        Self::from_toml_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use glam::UVec2;

    use super::*;
    use crate::dispatch::TransformMode;
    use crate::export::ExportFormat;

    #[test]
    fn test_empty_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn test_full_config() {
        let config = EngineConfig::from_toml_str(
            r#"
            [tiling]
            shape = [512, 256]
            tiling = [4, 2]
            overlap = 0.25

            [dispatch]
            mode = "single_array"
            threads = 3

            [noise]
            octaves = 5
            seed = -7

            [export]
            format = "r16_be"
            shape = [128, 64]
            "#,
        )
        .unwrap();

        assert_eq!(config.tiling.shape, UVec2::new(512, 256));
        assert_eq!(config.tiling.tiling, UVec2::new(4, 2));
        assert_eq!(config.dispatch.mode, TransformMode::SingleArray);
        assert_eq!(config.dispatch.threads, Some(3));
        assert_eq!(config.noise.octaves, 5);
        assert_eq!(config.noise.seed, -7);
        assert_eq!(config.noise.lacunarity, FractalNoiseConfig::default().lacunarity);
        assert_eq!(config.export.format, ExportFormat::R16Be);
        assert_eq!(config.export.shape, Some(UVec2::new(128, 64)));
    }

    #[test]
    fn test_invalid_tiling_rejected() {
        let err = EngineConfig::from_toml_str(
            r#"
            [tiling]
            shape = [100, 100]
            tiling = [3, 3]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Geometry(GeometryError::NotDivisible { .. })));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            EngineConfig::from_toml_str("[tiling]\nshape = \"big\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let path = std::env::temp_dir().join("tilemap-config-does-not-exist.toml");
        assert!(matches!(EngineConfig::load(&path), Err(ConfigError::Io(_))));
    }
}
