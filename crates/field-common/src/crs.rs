//! Coordinate reference systems understood by the raster pipeline.
//!
//! NDVI rasters arrive either in geographic degrees (EPSG:4326) or in Web
//! Mercator meters (EPSG:3857). The [`ProjectionRegistry`] is built once at
//! startup and handed to whatever decodes rasters; there is no process-wide
//! projection state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::bbox::BoundingBox;
use crate::coordinate::Coordinate;
use crate::error::{FieldMapError, FieldMapResult};

/// WGS84 semi-major axis used by spherical Web Mercator.
const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Well-known CRS codes supported by the raster decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CrsCode {
    /// WGS84 Geographic (lon/lat in degrees)
    Epsg4326,
    /// Web Mercator (meters)
    Epsg3857,
}

impl CrsCode {
    /// Look up a CRS by its numeric EPSG code.
    pub fn from_epsg(code: u32) -> FieldMapResult<Self> {
        match code {
            4326 => Ok(CrsCode::Epsg4326),
            3857 | 900913 => Ok(CrsCode::Epsg3857),
            _ => Err(FieldMapError::UnsupportedCrs(format!("EPSG:{}", code))),
        }
    }

    /// Parse strings like "EPSG:4326", "epsg:3857" or "CRS:84".
    pub fn parse(s: &str) -> FieldMapResult<Self> {
        let normalized = s.trim().to_uppercase();
        if normalized == "CRS:84" {
            return Ok(CrsCode::Epsg4326);
        }
        normalized
            .strip_prefix("EPSG:")
            .and_then(|code| code.parse::<u32>().ok())
            .ok_or_else(|| FieldMapError::UnsupportedCrs(s.to_string()))
            .and_then(Self::from_epsg)
    }

    pub fn epsg(&self) -> u32 {
        match self {
            CrsCode::Epsg4326 => 4326,
            CrsCode::Epsg3857 => 3857,
        }
    }

    pub fn is_geographic(&self) -> bool {
        matches!(self, CrsCode::Epsg4326)
    }

    /// Convert a position in this CRS to lng/lat degrees.
    pub fn to_lng_lat(&self, x: f64, y: f64) -> Coordinate {
        match self {
            CrsCode::Epsg4326 => Coordinate::new(x, y),
            CrsCode::Epsg3857 => {
                let lng = (x / EARTH_RADIUS_M).to_degrees();
                let lat = (2.0 * (y / EARTH_RADIUS_M).exp().atan() - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                Coordinate::new(lng, lat)
            }
        }
    }

    /// Convert lng/lat degrees into this CRS.
    pub fn from_lng_lat(&self, coordinate: Coordinate) -> (f64, f64) {
        match self {
            CrsCode::Epsg4326 => (coordinate.lng, coordinate.lat),
            CrsCode::Epsg3857 => {
                let x = coordinate.lng.to_radians() * EARTH_RADIUS_M;
                let y = (std::f64::consts::FRAC_PI_4 + coordinate.lat.to_radians() / 2.0)
                    .tan()
                    .ln()
                    * EARTH_RADIUS_M;
                (x, y)
            }
        }
    }
}

impl fmt::Display for CrsCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg())
    }
}

/// The set of CRSs a session accepts, plus the one assumed when a raster carries none.
#[derive(Debug, Clone)]
pub struct ProjectionRegistry {
    registered: Vec<CrsCode>,
    default_crs: CrsCode,
}

impl ProjectionRegistry {
    /// Registry holding only `default_crs`.
    pub fn new(default_crs: CrsCode) -> Self {
        Self {
            registered: vec![default_crs],
            default_crs,
        }
    }

    /// Geographic default with Web Mercator also accepted.
    pub fn with_defaults() -> Self {
        Self::new(CrsCode::Epsg4326).register(CrsCode::Epsg3857)
    }

    pub fn register(mut self, code: CrsCode) -> Self {
        if !self.registered.contains(&code) {
            self.registered.push(code);
        }
        self
    }

    pub fn default_crs(&self) -> CrsCode {
        self.default_crs
    }

    pub fn is_registered(&self, code: CrsCode) -> bool {
        self.registered.contains(&code)
    }

    /// Resolve an optional EPSG code; `None` falls back to the default CRS.
    pub fn resolve(&self, epsg: Option<u32>) -> FieldMapResult<CrsCode> {
        let code = match epsg {
            Some(code) => CrsCode::from_epsg(code)?,
            None => return Ok(self.default_crs),
        };
        if !self.is_registered(code) {
            return Err(FieldMapError::UnsupportedCrs(code.to_string()));
        }
        Ok(code)
    }

    /// Project a box given in `crs` units into lng/lat degrees.
    pub fn bounds_to_lng_lat(
        &self,
        crs: CrsCode,
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    ) -> BoundingBox {
        let lower = crs.to_lng_lat(min_x, min_y);
        let upper = crs.to_lng_lat(max_x, max_y);
        BoundingBox::new(lower.lng, lower.lat, upper.lng, upper.lat)
    }
}

impl Default for ProjectionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_crs() {
        assert_eq!(CrsCode::parse("EPSG:4326").unwrap(), CrsCode::Epsg4326);
        assert_eq!(CrsCode::parse("epsg:3857").unwrap(), CrsCode::Epsg3857);
        assert_eq!(CrsCode::parse("CRS:84").unwrap(), CrsCode::Epsg4326);
        assert!(CrsCode::parse("EPSG:32632").is_err());
        assert!(CrsCode::parse("garbage").is_err());
    }

    #[test]
    fn test_web_mercator_round_trip() {
        let straubing = Coordinate::new(12.5731, 48.8817);
        let (x, y) = CrsCode::Epsg3857.from_lng_lat(straubing);
        let back = CrsCode::Epsg3857.to_lng_lat(x, y);
        assert!((back.lng - straubing.lng).abs() < 1e-9);
        assert!((back.lat - straubing.lat).abs() < 1e-9);
    }

    #[test]
    fn test_registry_resolution() {
        let registry = ProjectionRegistry::new(CrsCode::Epsg4326);
        assert_eq!(registry.resolve(None).unwrap(), CrsCode::Epsg4326);
        assert!(registry.resolve(Some(3857)).is_err());

        let registry = registry.register(CrsCode::Epsg3857);
        assert_eq!(registry.resolve(Some(3857)).unwrap(), CrsCode::Epsg3857);
    }
}
