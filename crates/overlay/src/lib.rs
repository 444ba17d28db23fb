//! Overlay lifecycle for the field map.
//!
//! Three controllers share one [`MapSurface`], each owning a disjoint set of
//! overlay keys:
//! - [`RasterOverlayController`]: the NDVI raster of the selected field and season
//! - [`VectorOverlayController`]: field boundaries, subfields and measurement markers
//! - [`DrawController`]: the region of interest being drawn
//!
//! Every controller tears its overlays down on `detach` and on drop.

pub mod config;
pub mod draw;
pub mod error;
pub mod layers;
pub mod map;
pub mod notify;
pub mod raster;
pub mod vector;
pub mod visibility;

pub use config::{OverlayConfig, SubfieldColoring};
pub use draw::{normalize_shape, DrawController, DrawEvent, LatLng, WidgetShape};
pub use error::{OverlayError, OverlayResult};
pub use layers::{boundary_overlay, measurement_overlays, subfield_color, subfield_legend, SubfieldLegend};
pub use map::{InstalledOverlay, InstanceId, MapSurface, MemoryMap, Overlay, OverlayKey, PolygonStyle, Viewport};
pub use notify::{ChannelNotifier, LogNotifier, Notification, Notifier};
pub use raster::{RasterDisplay, RasterOverlayController, RasterSource};
pub use vector::{DesiredSet, ReconcileReport, VectorOverlayController};
pub use visibility::{Visibility, VisibilitySet};
