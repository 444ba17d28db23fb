//! Tests for vector overlay reconciliation.

use std::sync::Arc;

use field_common::{BoundingBox, Coordinate, Coordinates};
use overlay::{
    DesiredSet, MemoryMap, Overlay, OverlayConfig, OverlayError, OverlayKey, PolygonStyle,
    VectorOverlayController,
};
use renderer::Color;

fn marker(id: i64) -> (OverlayKey, Overlay) {
    (
        OverlayKey::Marker(id),
        Overlay::Marker {
            position: Coordinate::new(12.5 + id as f64 * 0.001, 48.8),
            label: None,
        },
    )
}

fn subfield(id: i64, color: Color) -> (OverlayKey, Overlay) {
    let x = 12.5 + id as f64 * 0.01;
    (
        OverlayKey::Subfield(id),
        Overlay::Polygon {
            coordinates: Coordinates::Polygon(vec![vec![
                Coordinate::new(x, 48.80),
                Coordinate::new(x + 0.01, 48.80),
                Coordinate::new(x + 0.01, 48.81),
            ]]),
            style: PolygonStyle::filled(color, 0.7),
        },
    )
}

fn markers(ids: &[i64]) -> DesiredSet {
    ids.iter().map(|id| marker(*id)).collect()
}

fn setup() -> (Arc<MemoryMap>, VectorOverlayController) {
    let map = Arc::new(MemoryMap::default());
    let controller = VectorOverlayController::new(map.clone(), &OverlayConfig::default());
    (map, controller)
}

// ============================================================================
// Reconciliation
// ============================================================================

#[test]
fn test_reconcile_delta() {
    let (map, controller) = setup();
    controller.reconcile(markers(&[1, 2, 3])).unwrap();
    let before_2 = map.instance(&OverlayKey::Marker(2)).unwrap();
    let before_3 = map.instance(&OverlayKey::Marker(3)).unwrap();

    let report = controller.reconcile(markers(&[2, 3, 4])).unwrap();
    assert_eq!(report.removed, vec![OverlayKey::Marker(1)]);
    assert_eq!(report.added, vec![OverlayKey::Marker(4)]);
    assert!(report.replaced.is_empty());
    assert_eq!(report.unchanged, vec![OverlayKey::Marker(2), OverlayKey::Marker(3)]);

    // Same instances, not recreated
    assert_eq!(map.instance(&OverlayKey::Marker(2)), Some(before_2));
    assert_eq!(map.instance(&OverlayKey::Marker(3)), Some(before_3));
    assert_eq!(
        map.keys(),
        vec![OverlayKey::Marker(2), OverlayKey::Marker(3), OverlayKey::Marker(4)]
    );
}

#[test]
fn test_changed_content_is_replaced() {
    let (map, controller) = setup();
    let desired: DesiredSet = [subfield(7, Color::RED)].into_iter().collect();
    controller.reconcile(desired.clone()).unwrap();
    let before = map.instance(&OverlayKey::Subfield(7)).unwrap();

    // Equal by value, even though freshly built
    let report = controller.reconcile([subfield(7, Color::RED)].into_iter().collect()).unwrap();
    assert!(report.is_noop());
    assert_eq!(map.instance(&OverlayKey::Subfield(7)), Some(before));

    let report = controller.reconcile([subfield(7, Color::LIME)].into_iter().collect()).unwrap();
    assert_eq!(report.replaced, vec![OverlayKey::Subfield(7)]);
    assert_ne!(map.instance(&OverlayKey::Subfield(7)), Some(before));
    assert_eq!(map.len(), 1);
}

#[test]
fn test_empty_desired_clears() {
    let (map, controller) = setup();
    controller.reconcile(markers(&[1, 2])).unwrap();
    let report = controller.reconcile(DesiredSet::new()).unwrap();
    assert_eq!(report.removed.len(), 2);
    assert!(map.is_empty());
    assert!(controller.installed_keys().is_empty());
}

#[test]
fn test_foreign_keys_rejected() {
    let (map, controller) = setup();
    let mut desired = markers(&[1]);
    desired.insert(
        OverlayKey::Draft,
        Overlay::Marker {
            position: Coordinate::new(0.0, 0.0),
            label: None,
        },
    );
    let result = controller.reconcile(desired);
    assert!(matches!(result, Err(OverlayError::ForeignKey(OverlayKey::Draft))));
    assert!(map.is_empty());
}

// ============================================================================
// Viewport and anchoring
// ============================================================================

#[test]
fn test_fit_only_when_becoming_non_empty() {
    let (map, controller) = setup();
    let boundary = BoundingBox::new(12.40, 48.70, 12.60, 48.90);
    controller.set_anchor(Some(1), Some(boundary));

    let report = controller.reconcile(markers(&[1])).unwrap();
    assert!(report.fitted);
    assert_eq!(map.viewport().fitted, Some(boundary));

    let report = controller.reconcile(markers(&[1, 2])).unwrap();
    assert!(!report.fitted);
    assert_eq!(map.fit_count(), 1);
}

#[test]
fn test_fit_covers_overlays_outside_boundary() {
    let (map, controller) = setup();
    let boundary = BoundingBox::new(12.50, 48.80, 12.51, 48.81);
    controller.set_anchor(Some(1), Some(boundary));
    controller.reconcile([subfield(5, Color::RED)].into_iter().collect()).unwrap();

    let fitted = map.viewport().fitted.unwrap();
    assert_eq!(fitted.min_lng, 12.50);
    assert!((fitted.max_lng - 12.56).abs() < 1e-9);
}

#[test]
fn test_anchor_change_clears() {
    let (map, controller) = setup();
    controller.set_anchor(Some(1), None);
    controller.reconcile(markers(&[1, 2])).unwrap();

    assert!(!controller.set_anchor(Some(1), None));
    assert_eq!(map.len(), 2);

    assert!(controller.set_anchor(Some(2), None));
    assert!(map.is_empty());
    assert_eq!(controller.anchor(), Some(2));
}

#[test]
fn test_drop_clears_map() {
    let (map, controller) = setup();
    controller.reconcile(markers(&[1, 2, 3])).unwrap();
    drop(controller);
    assert!(map.is_empty());
}
