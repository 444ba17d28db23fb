//! Region-of-interest drawing.
//!
//! Wraps the events of a polygon draw/edit widget. At most one drawn shape
//! exists at any time: starting a new drawing discards the previous one.
//! The normalized shape is published on a watch channel as the current
//! region of interest; registering it as a field is left to the caller.

use std::sync::Arc;

use field_common::{Coordinate, Coordinates};
use renderer::Color;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::OverlayConfig;
use crate::error::{OverlayError, OverlayResult};
use crate::map::{MapSurface, Overlay, OverlayKey, PolygonStyle};

/// Outline color of the drawn region.
pub const DRAFT_COLOR: Color = Color::rgb(0xf3, 0x9c, 0x12);

/// A vertex as the widget reports it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Rings of one widget shape, exterior first.
pub type WidgetShape = Vec<Vec<LatLng>>;

#[derive(Debug, Clone, PartialEq)]
pub enum DrawEvent {
    DrawStart,
    Created(WidgetShape),
    /// Shapes touched by one edit session; only the first is kept.
    Edited(Vec<WidgetShape>),
    Deleted,
}

/// Convert a widget shape into polygon [`Coordinates`].
///
/// A closing vertex repeating the first one is dropped. Every ring needs at
/// least three vertices.
pub fn normalize_shape(shape: &[Vec<LatLng>]) -> OverlayResult<Coordinates> {
    if shape.is_empty() {
        return Err(OverlayError::InvalidGeometry("shape has no rings".into()));
    }
    let rings = shape
        .iter()
        .map(|ring| normalize_ring(ring))
        .collect::<OverlayResult<Vec<_>>>()?;
    Ok(Coordinates::Polygon(rings))
}

fn normalize_ring(ring: &[LatLng]) -> OverlayResult<Vec<Coordinate>> {
    let mut coordinates = ring
        .iter()
        .map(|v| Coordinate::from_position(&[v.lng, v.lat]))
        .collect::<Result<Vec<_>, _>>()?;
    if coordinates.len() > 1 && coordinates.first() == coordinates.last() {
        coordinates.pop();
    }
    if coordinates.len() < 3 {
        return Err(OverlayError::InvalidGeometry(format!(
            "ring needs at least 3 vertices, got {}",
            coordinates.len()
        )));
    }
    Ok(coordinates)
}

pub struct DrawController {
    map: Arc<dyn MapSurface>,
    fit_on_show: bool,
    region: watch::Sender<Option<Coordinates>>,
}

impl DrawController {
    pub fn new(map: Arc<dyn MapSurface>, config: &OverlayConfig) -> Self {
        let (region, _) = watch::channel(None);
        Self {
            map,
            fit_on_show: config.fit_on_show,
            region,
        }
    }

    /// Receiver that sees every change of the region of interest.
    pub fn subscribe(&self) -> watch::Receiver<Option<Coordinates>> {
        self.region.subscribe()
    }

    pub fn region(&self) -> Option<Coordinates> {
        self.region.borrow().clone()
    }

    /// Apply one widget event.
    ///
    /// An invalid shape leaves no drawn region behind.
    pub fn handle(&self, event: DrawEvent) -> OverlayResult<()> {
        match event {
            DrawEvent::DrawStart | DrawEvent::Deleted => {
                self.clear();
                Ok(())
            }
            DrawEvent::Created(shape) => self.replace(&shape),
            DrawEvent::Edited(shapes) => {
                let shape = shapes
                    .first()
                    .ok_or_else(|| OverlayError::InvalidGeometry("edit without shapes".into()))?;
                self.replace(shape)
            }
        }
    }

    fn replace(&self, shape: &[Vec<LatLng>]) -> OverlayResult<()> {
        self.map.remove_overlay(&OverlayKey::Draft);
        let coordinates = match normalize_shape(shape) {
            Ok(coordinates) => coordinates,
            Err(err) => {
                self.region.send_replace(None);
                return Err(err);
            }
        };

        self.map.add_overlay(
            OverlayKey::Draft,
            Overlay::Polygon {
                coordinates: coordinates.clone(),
                style: PolygonStyle::outline(DRAFT_COLOR),
            },
        )?;
        if let (true, Some(bounds)) = (self.fit_on_show, coordinates.bounds()) {
            self.map.fit_bounds(bounds);
        }
        info!(vertices = coordinates.len(), "Region of interest drawn");
        self.region.send_replace(Some(coordinates));
        Ok(())
    }

    /// Remove the drawn region. Safe to call when nothing is drawn.
    pub fn clear(&self) {
        let removed = self.map.remove_overlay(&OverlayKey::Draft);
        self.region.send_if_modified(|region| region.take().is_some());
        if removed {
            debug!("Region of interest cleared");
        }
    }

    pub fn detach(&self) {
        self.clear();
    }
}

impl Drop for DrawController {
    fn drop(&mut self) {
        self.detach();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LatLng> {
        vec![
            LatLng::new(48.0, 12.0),
            LatLng::new(48.0, 12.1),
            LatLng::new(48.1, 12.1),
            LatLng::new(48.1, 12.0),
        ]
    }

    #[test]
    fn test_normalize_swaps_order() {
        let coordinates = normalize_shape(&[square()]).unwrap();
        let ring = coordinates.exterior_ring().unwrap();
        assert_eq!(ring[1], Coordinate::new(12.1, 48.0));
        assert_eq!(coordinates.depth(), 2);
    }

    #[test]
    fn test_normalize_strips_closing_vertex() {
        let mut ring = square();
        ring.push(ring[0]);
        let coordinates = normalize_shape(&[ring]).unwrap();
        assert_eq!(coordinates.len(), 4);
    }

    #[test]
    fn test_normalize_rejects_degenerate() {
        let ring = vec![LatLng::new(48.0, 12.0), LatLng::new(48.0, 12.1), LatLng::new(48.0, 12.0)];
        assert!(matches!(normalize_shape(&[ring]), Err(OverlayError::InvalidGeometry(_))));
        assert!(normalize_shape(&[]).is_err());
        let bad = vec![LatLng::new(f64::NAN, 12.0), LatLng::new(48.0, 12.1), LatLng::new(48.1, 12.1)];
        assert!(normalize_shape(&[bad]).is_err());
    }
}
