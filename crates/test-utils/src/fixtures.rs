//! Common test fixtures: wire payloads shaped like the backend's responses.

use serde_json::{json, Value};

/// Bounding boxes as `(min_lng, min_lat, max_lng, max_lat)`.
pub mod bbox {
    /// A small field south of Straubing.
    pub const STRAUBING_FIELD: (f64, f64, f64, f64) = (12.50, 48.80, 12.52, 48.81);

    /// A neighbouring field, used where two rasters must be told apart.
    pub const NEIGHBOUR_FIELD: (f64, f64, f64, f64) = (12.53, 48.82, 12.56, 48.84);

    /// Germany, the default map extent.
    pub const GERMANY: (f64, f64, f64, f64) = (5.87, 47.27, 15.04, 55.06);
}

/// Known season ids.
pub mod seasons {
    pub const SPRING_2024: &str = "20240315";
    pub const SPRING_2023: &str = "20230401";
}

/// A field payload whose boundary is the outline of `bbox`.
pub fn field_json(id: i64, name: &str, bbox: (f64, f64, f64, f64)) -> Value {
    json!({
        "id": id,
        "name": name,
        "coordinates": [ring_json(bbox)],
        "straubing_distance": 4.2,
        "area": 3.5
    })
}

/// A closed `[lng, lat]` ring around `bbox`.
pub fn ring_json(bbox: (f64, f64, f64, f64)) -> Value {
    let (min_lng, min_lat, max_lng, max_lat) = bbox;
    json!([
        [min_lng, min_lat],
        [max_lng, min_lat],
        [max_lng, max_lat],
        [min_lng, max_lat],
        [min_lng, min_lat]
    ])
}

pub fn measurement_json(id: i64, lng: f64, lat: f64, ndvi: f64, subfield_id: i64) -> Value {
    json!({
        "id": id,
        "field_id": 1,
        "season_id": seasons::SPRING_2024,
        "longitude": lng,
        "latitude": lat,
        "ndvi": ndvi,
        "subfield_id": subfield_id
    })
}

pub fn subfield_json(id: i64, measurement_id: i64, bbox: (f64, f64, f64, f64), ndvi: f64) -> Value {
    json!({
        "id": id,
        "measurement_id": measurement_id,
        "coordinates": [ring_json(bbox)],
        "area": 0.4,
        "ndvi": ndvi,
        "recommended_fertilizer_amount": null
    })
}

/// Three measurements with their subfields, splitting `STRAUBING_FIELD` west to east.
pub fn measurement_set() -> (Value, Value) {
    let (min_lng, min_lat, max_lng, max_lat) = bbox::STRAUBING_FIELD;
    let step = (max_lng - min_lng) / 3.0;
    let mut measurements = Vec::new();
    let mut subfields = Vec::new();
    for i in 0..3i64 {
        let west = min_lng + step * i as f64;
        let sub_bbox = (west, min_lat, west + step, max_lat);
        let ndvi = 0.3 + 0.2 * i as f64;
        measurements.push(measurement_json(
            i + 1,
            west + step / 2.0,
            (min_lat + max_lat) / 2.0,
            ndvi,
            100 + i + 1,
        ));
        subfields.push(subfield_json(100 + i + 1, i + 1, sub_bbox, ndvi));
    }
    (Value::Array(measurements), Value::Array(subfields))
}

pub fn metadata_json() -> Value {
    json!({
        "data": {
            "max_recommended_fertilizer": 200.0,
            "crops": ["winter wheat", "barley"],
            "soils": ["loam", "clay"],
            "varieties": ["Julius"],
            "fertilizers": ["KAS"],
            "fertilizer_types": ["mineral"],
            "crop_protections": ["fungicide"],
            "soil_tillages": ["plough"],
            "soil_conditions": ["dry", "wet"]
        }
    })
}

/// One event-stream frame carrying `{"type": kind, "payload": payload}`.
pub fn sse_frame(kind: &str, payload: Value) -> String {
    format!("data: {}\n\n", json!({ "type": kind, "payload": payload }))
}
