//! Tests for coordinate parsing at the wire boundary.

use field_common::{
    deparse_coordinates, parse_coordinates, Coordinate, Coordinates, Field, FieldMapError,
};
use serde_json::json;
use test_utils::{bbox, field_json, ring_json};

fn square(min: f64, max: f64) -> Vec<Coordinate> {
    vec![
        Coordinate::new(min, min),
        Coordinate::new(max, min),
        Coordinate::new(max, max),
        Coordinate::new(min, max),
        Coordinate::new(min, min),
    ]
}

// ============================================================================
// Round-trip tests
// ============================================================================

#[test]
fn test_round_trip_polygon_with_hole() {
    let polygon = Coordinates::Polygon(vec![square(0.0, 10.0), square(4.0, 6.0)]);
    let wire = deparse_coordinates(&polygon);
    assert_eq!(wire[1][2], json!([6.0, 6.0]));

    let parsed = parse_coordinates(&wire).unwrap();
    assert_eq!(parsed, polygon);
    assert_eq!(parsed.depth(), 2);
}

#[test]
fn test_round_trip_single_ring() {
    let ring = Coordinates::Ring(square(12.5, 12.6));
    let parsed = parse_coordinates(&deparse_coordinates(&ring)).unwrap();
    assert_eq!(parsed, ring);
    assert_eq!(parsed.depth(), 1);
}

#[test]
fn test_round_trip_multi_polygon() {
    let multi = Coordinates::MultiPolygon(vec![
        vec![square(0.0, 1.0)],
        vec![square(2.0, 3.0), square(2.2, 2.4)],
    ]);
    assert_eq!(parse_coordinates(&deparse_coordinates(&multi)).unwrap(), multi);
}

#[test]
fn test_serde_matches_deparse() {
    let ring = Coordinates::Ring(square(1.0, 2.0));
    assert_eq!(serde_json::to_value(&ring).unwrap(), deparse_coordinates(&ring));
}

// ============================================================================
// Order and depth
// ============================================================================

#[test]
fn test_longitude_comes_first() {
    let parsed = parse_coordinates(&ring_json(bbox::STRAUBING_FIELD)).unwrap();
    let first = parsed.iter().next().copied().unwrap();
    assert_eq!(first, Coordinate::new(12.50, 48.80));
}

#[test]
fn test_bounds_cover_all_rings() {
    let polygon = Coordinates::Polygon(vec![square(0.0, 10.0), square(4.0, 6.0)]);
    let bounds = polygon.bounds().unwrap();
    assert_eq!(bounds.to_lat_lng_corners(), [[0.0, 0.0], [10.0, 10.0]]);
}

// ============================================================================
// Rejection
// ============================================================================

#[test]
fn test_rejects_empty_nested_sequences() {
    for value in [json!([]), json!([[]]), json!([[[]]])] {
        assert!(
            matches!(parse_coordinates(&value), Err(FieldMapError::InvalidCoordinates(_))),
            "{} should be rejected",
            value
        );
    }
}

#[test]
fn test_rejects_non_numeric_positions() {
    assert!(parse_coordinates(&json!([["12", "48"]])).is_err());
    assert!(parse_coordinates(&json!([[12.0, null]])).is_err());
}

#[test]
fn test_field_with_bad_boundary_fails_whole_field() {
    let mut payload = field_json(1, "North", bbox::STRAUBING_FIELD);
    payload["coordinates"] = json!([[12.0]]);
    assert!(Field::parse(&payload).is_err());
}
