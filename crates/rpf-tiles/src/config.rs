//! Tile source configuration.

use crate::{Result, TileError};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default tile edge used by [`crate::TileSource::tile_rect`].
pub const DEFAULT_TILE_DIM: u32 = 128;

/// Default number of opened frames kept in the frame cache.
pub const DEFAULT_CACHE_CAPACITY: usize = 16;

/// Configuration for a [`crate::TileSource`].
///
/// Loadable from YAML; omitted fields take their defaults:
///
/// ```yaml
/// tile_width: 256
/// tile_height: 256
/// cache_capacity: 32
/// strict: false
/// skip_empty_check: false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileSourceConfig {
    /// Width of the default tile grid.
    pub tile_width: u32,
    /// Height of the default tile grid.
    pub tile_height: u32,
    /// Opened frames to keep cached. Zero disables the cache.
    pub cache_capacity: usize,
    /// Surface unreadable or corrupt frames as errors instead of blanking them.
    pub strict: bool,
    /// List catalog entries without checking that any of their frames exist.
    pub skip_empty_check: bool,
}

impl Default for TileSourceConfig {
    fn default() -> Self {
        TileSourceConfig {
            tile_width: DEFAULT_TILE_DIM,
            tile_height: DEFAULT_TILE_DIM,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            strict: false,
            skip_empty_check: false,
        }
    }
}

impl TileSourceConfig {
    /// Parse and validate a YAML configuration.
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: TileSourceConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a YAML configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    /// Serialize to YAML.
    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        if self.tile_width == 0 || self.tile_height == 0 {
            return Err(TileError::Configuration(format!(
                "tile size must be non-zero, got {}x{}",
                self.tile_width, self.tile_height
            )));
        }
        Ok(())
    }

    /// Builder: enable or disable strict frame validation.
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Builder: set the frame cache capacity.
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Builder: set the default tile size.
    pub fn with_tile_size(mut self, width: u32, height: u32) -> Self {
        self.tile_width = width;
        self.tile_height = height;
        self
    }

    /// Builder: list entries even when none of their frames exist.
    pub fn with_skip_empty_check(mut self, skip: bool) -> Self {
        self.skip_empty_check = skip;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config = TileSourceConfig::from_yaml_str("strict: true\ncache_capacity: 4\n").unwrap();
        assert!(config.strict);
        assert_eq!(config.cache_capacity, 4);
        assert_eq!(config.tile_width, DEFAULT_TILE_DIM);
        assert!(!config.skip_empty_check);
    }

    #[test]
    fn test_zero_tile_size_rejected() {
        let err = TileSourceConfig::from_yaml_str("tile_width: 0").unwrap_err();
        assert!(matches!(err, TileError::Configuration(_)));
    }

    #[test]
    fn test_malformed_yaml() {
        let err = TileSourceConfig::from_yaml_str("tile_width: [1, 2]").unwrap_err();
        assert!(matches!(err, TileError::ConfigParse(_)));
    }

    #[test]
    fn test_yaml_round_trip_through_file() {
        let config = TileSourceConfig::default()
            .with_tile_size(256, 512)
            .with_strict(true);
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), config.to_yaml_string().unwrap()).unwrap();
        assert_eq!(TileSourceConfig::from_file(file.path()).unwrap(), config);
    }
}
