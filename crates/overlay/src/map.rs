//! The map surface overlays are installed on.
//!
//! Controllers never share keys: the raster controller owns
//! [`OverlayKey::Raster`], the vector controller owns the entity keys and the
//! draw controller owns [`OverlayKey::Draft`]. A surface holds at most one
//! overlay per key and refuses a second install until the first is removed.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use field_common::{BoundingBox, Coordinate, Coordinates, FieldId, MeasurementId, SubfieldId};
use renderer::{Color, ColorizedRaster};
use serde::Serialize;
use tracing::debug;

use crate::error::{OverlayError, OverlayResult};

/// Identity of one installed overlay.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum OverlayKey {
    /// Colored NDVI raster, keyed by raster id.
    Raster(String),
    /// Field boundary polygon.
    Boundary(FieldId),
    /// Subfield polygon of one measurement.
    Subfield(SubfieldId),
    /// Measurement position marker.
    Marker(MeasurementId),
    /// The region of interest being drawn.
    Draft,
}

/// Which controller may touch a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyNamespace {
    Raster,
    Vector,
    Draw,
}

impl OverlayKey {
    pub fn namespace(&self) -> KeyNamespace {
        match self {
            OverlayKey::Raster(_) => KeyNamespace::Raster,
            OverlayKey::Boundary(_) | OverlayKey::Subfield(_) | OverlayKey::Marker(_) => KeyNamespace::Vector,
            OverlayKey::Draft => KeyNamespace::Draw,
        }
    }
}

impl fmt::Display for OverlayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OverlayKey::Raster(id) => write!(f, "raster:{}", id),
            OverlayKey::Boundary(id) => write!(f, "boundary:{}", id),
            OverlayKey::Subfield(id) => write!(f, "subfield:{}", id),
            OverlayKey::Marker(id) => write!(f, "marker:{}", id),
            OverlayKey::Draft => f.write_str("draft"),
        }
    }
}

/// Fill and stroke of a polygon overlay.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PolygonStyle {
    pub fill: Color,
    pub fill_opacity: f64,
    pub stroke: Option<Color>,
}

impl PolygonStyle {
    /// Outline only, used for field boundaries and the drawn region.
    pub fn outline(color: Color) -> Self {
        Self {
            fill: color,
            fill_opacity: 0.0,
            stroke: Some(color),
        }
    }

    /// Filled without a stroke, used for subfields.
    pub fn filled(color: Color, opacity: f64) -> Self {
        Self {
            fill: color,
            fill_opacity: opacity,
            stroke: None,
        }
    }
}

/// A drawable the map knows how to show.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    /// Pixel grid stretched over `bounds`.
    Raster(Arc<ColorizedRaster>),
    Polygon {
        coordinates: Coordinates,
        style: PolygonStyle,
    },
    Marker {
        position: Coordinate,
        label: Option<String>,
    },
}

impl Overlay {
    pub fn bounds(&self) -> Option<BoundingBox> {
        match self {
            Overlay::Raster(raster) => Some(raster.bounds),
            Overlay::Polygon { coordinates, .. } => coordinates.bounds(),
            Overlay::Marker { position, .. } => Some(BoundingBox::from_point(*position)),
        }
    }
}

/// Identifies one installation; a replaced overlay gets a new instance.
pub type InstanceId = u64;

/// What the map currently shows for a key.
#[derive(Debug, Clone)]
pub struct InstalledOverlay {
    pub instance: InstanceId,
    pub overlay: Overlay,
}

/// A map widget that overlays can be added to and removed from.
///
/// Methods are synchronous so a controller can tear overlays down on the
/// same turn its state changes.
pub trait MapSurface: Send + Sync {
    /// Install `overlay` under `key`. Fails if `key` is already installed.
    fn add_overlay(&self, key: OverlayKey, overlay: Overlay) -> OverlayResult<InstanceId>;

    /// Remove the overlay under `key`; returns whether one was installed.
    fn remove_overlay(&self, key: &OverlayKey) -> bool;

    /// Move the viewport so `bounds` is fully visible.
    fn fit_bounds(&self, bounds: BoundingBox);

    fn contains(&self, key: &OverlayKey) -> bool;
}

/// Viewport of a [`MemoryMap`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: u8,
    /// Last bounds the map was fitted to.
    pub fitted: Option<BoundingBox>,
}

#[derive(Debug)]
struct MapState {
    overlays: BTreeMap<OverlayKey, InstalledOverlay>,
    next_instance: InstanceId,
    viewport: Viewport,
    fit_count: usize,
}

/// Headless [`MapSurface`] that records installed overlays and the viewport.
#[derive(Debug)]
pub struct MemoryMap {
    state: Mutex<MapState>,
}

impl MemoryMap {
    pub fn new(center: Coordinate, zoom: u8) -> Self {
        Self {
            state: Mutex::new(MapState {
                overlays: BTreeMap::new(),
                next_instance: 1,
                viewport: Viewport {
                    center,
                    zoom,
                    fitted: None,
                },
                fit_count: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MapState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn keys(&self) -> Vec<OverlayKey> {
        self.lock().overlays.keys().cloned().collect()
    }

    pub fn get(&self, key: &OverlayKey) -> Option<InstalledOverlay> {
        self.lock().overlays.get(key).cloned()
    }

    pub fn instance(&self, key: &OverlayKey) -> Option<InstanceId> {
        self.lock().overlays.get(key).map(|installed| installed.instance)
    }

    /// Everything installed, in key order.
    pub fn snapshot(&self) -> Vec<(OverlayKey, InstalledOverlay)> {
        self.lock()
            .overlays
            .iter()
            .map(|(key, installed)| (key.clone(), installed.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.lock().overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn viewport(&self) -> Viewport {
        self.lock().viewport
    }

    /// How many times the viewport was fitted.
    pub fn fit_count(&self) -> usize {
        self.lock().fit_count
    }
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new(Coordinate::new(10.4541194, 51.1642292), 6)
    }
}

impl MapSurface for MemoryMap {
    fn add_overlay(&self, key: OverlayKey, overlay: Overlay) -> OverlayResult<InstanceId> {
        let mut state = self.lock();
        if state.overlays.contains_key(&key) {
            return Err(OverlayError::DuplicateOverlay(key));
        }
        let instance = state.next_instance;
        state.next_instance += 1;
        debug!(key = %key, instance = instance, "Overlay installed");
        state.overlays.insert(key, InstalledOverlay { instance, overlay });
        Ok(instance)
    }

    fn remove_overlay(&self, key: &OverlayKey) -> bool {
        let removed = self.lock().overlays.remove(key).is_some();
        if removed {
            debug!(key = %key, "Overlay removed");
        }
        removed
    }

    fn fit_bounds(&self, bounds: BoundingBox) {
        let mut state = self.lock();
        state.viewport.center = bounds.center();
        state.viewport.fitted = Some(bounds);
        state.fit_count += 1;
    }

    fn contains(&self, key: &OverlayKey) -> bool {
        self.lock().overlays.contains_key(key)
    }
}
