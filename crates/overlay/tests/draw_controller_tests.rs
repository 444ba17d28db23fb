//! Tests for region-of-interest drawing.

use std::sync::Arc;

use field_common::{Coordinate, Coordinates};
use overlay::{DrawController, DrawEvent, LatLng, MemoryMap, OverlayConfig, OverlayKey};

fn ring(lat: f64, lng: f64, size: f64) -> Vec<LatLng> {
    vec![
        LatLng::new(lat, lng),
        LatLng::new(lat, lng + size),
        LatLng::new(lat + size, lng + size),
        LatLng::new(lat + size, lng),
    ]
}

fn setup() -> (Arc<MemoryMap>, DrawController) {
    let map = Arc::new(MemoryMap::default());
    let controller = DrawController::new(map.clone(), &OverlayConfig::default());
    (map, controller)
}

#[test]
fn test_new_draw_replaces_previous() {
    let (map, controller) = setup();
    controller.handle(DrawEvent::DrawStart).unwrap();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.1)])).unwrap();
    controller.handle(DrawEvent::DrawStart).unwrap();
    controller.handle(DrawEvent::Created(vec![ring(50.0, 10.0, 0.2)])).unwrap();

    assert_eq!(map.keys(), vec![OverlayKey::Draft]);
    let region = controller.region().unwrap();
    assert_eq!(region.len(), 4);
    assert_eq!(region.exterior_ring().unwrap()[0], Coordinate::new(10.0, 50.0));
}

#[test]
fn test_created_without_draw_start_still_replaces() {
    let (map, controller) = setup();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.1)])).unwrap();
    controller.handle(DrawEvent::Created(vec![ring(50.0, 10.0, 0.2)])).unwrap();
    assert_eq!(map.len(), 1);
    assert_eq!(
        controller.region().unwrap().exterior_ring().unwrap()[0],
        Coordinate::new(10.0, 50.0)
    );
}

#[test]
fn test_draw_start_clears_region() {
    let (map, controller) = setup();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.1)])).unwrap();
    controller.handle(DrawEvent::DrawStart).unwrap();
    assert!(controller.region().is_none());
    assert!(map.is_empty());
}

#[test]
fn test_edit_keeps_first_shape() {
    let (_map, controller) = setup();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.1)])).unwrap();
    controller
        .handle(DrawEvent::Edited(vec![vec![ring(48.0, 12.0, 0.3)], vec![ring(1.0, 1.0, 1.0)]]))
        .unwrap();
    let bounds = controller.region().unwrap().bounds().unwrap();
    assert!((bounds.max_lng - 12.3).abs() < 1e-9);
}

#[test]
fn test_delete_publishes_none() {
    let (map, controller) = setup();
    let mut rx = controller.subscribe();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.1)])).unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(matches!(*rx.borrow_and_update(), Some(Coordinates::Polygon(_))));

    controller.handle(DrawEvent::Deleted).unwrap();
    assert!(rx.has_changed().unwrap());
    assert!(rx.borrow_and_update().is_none());
    assert!(map.is_empty());

    // Deleting again changes nothing
    controller.handle(DrawEvent::Deleted).unwrap();
    assert!(!rx.has_changed().unwrap());
}

#[test]
fn test_invalid_shape_leaves_nothing() {
    let (map, controller) = setup();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.1)])).unwrap();
    let degenerate = vec![vec![LatLng::new(48.0, 12.0), LatLng::new(48.1, 12.1)]];
    assert!(controller.handle(DrawEvent::Created(degenerate)).is_err());
    assert!(controller.region().is_none());
    assert!(map.is_empty());
}

#[test]
fn test_draw_fits_viewport() {
    let (map, controller) = setup();
    controller.handle(DrawEvent::Created(vec![ring(48.0, 12.0, 0.2)])).unwrap();
    let viewport = map.viewport();
    assert!((viewport.center.lng - 12.1).abs() < 1e-9);
    assert!((viewport.center.lat - 48.1).abs() < 1e-9);
}
