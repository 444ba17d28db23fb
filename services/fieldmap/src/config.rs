//! Map session configuration.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use field_common::{Coordinate, CrsCode, ProjectionRegistry};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Initial view, raster CRS default and export location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// `[lat, lng]` of the initial view.
    pub center: [f64; 2],
    pub zoom: u8,
    /// EPSG code assumed for rasters without a GeoKey directory.
    pub default_crs: u32,
    pub export_dir: PathBuf,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            center: [51.1642292, 10.4541194],
            zoom: 6,
            default_crs: 4326,
            export_dir: PathBuf::from("export"),
        }
    }
}

impl MapConfig {
    /// Load from a YAML file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: MapConfig = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        debug!(path = %path.display(), zoom = config.zoom, "Loaded map config");
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let [lat, lng] = self.center;
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            bail!("map center [{}, {}] is not a valid [lat, lng]", lat, lng);
        }
        if self.zoom > 22 {
            bail!("zoom {} is out of range", self.zoom);
        }
        CrsCode::from_epsg(self.default_crs)?;
        Ok(())
    }

    pub fn center_coordinate(&self) -> Coordinate {
        Coordinate::new(self.center[1], self.center[0])
    }

    /// Registry accepting both supported CRSs with the configured default.
    pub fn registry(&self) -> Result<ProjectionRegistry> {
        let default_crs = CrsCode::from_epsg(self.default_crs)?;
        Ok(ProjectionRegistry::new(default_crs)
            .register(CrsCode::Epsg4326)
            .register(CrsCode::Epsg3857))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_center_on_germany() {
        let config = MapConfig::default();
        let center = config.center_coordinate();
        assert_eq!(center.lat, 51.1642292);
        assert_eq!(center.lng, 10.4541194);
        assert_eq!(config.zoom, 6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config: MapConfig = serde_yaml::from_str("zoom: 12\ndefault_crs: 3857\n").unwrap();
        assert_eq!(config.zoom, 12);
        assert_eq!(config.center, MapConfig::default().center);
        assert_eq!(config.registry().unwrap().default_crs(), CrsCode::Epsg3857);
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("map.yaml");
        std::fs::write(&path, "center: [48.8, 12.5]\nexport_dir: out\n").unwrap();

        let config = MapConfig::load(Some(&path)).unwrap();

        assert_eq!(config.center, [48.8, 12.5]);
        assert_eq!(config.export_dir, PathBuf::from("out"));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let config = MapConfig {
            center: [120.0, 10.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
        let config = MapConfig {
            default_crs: 32632,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
