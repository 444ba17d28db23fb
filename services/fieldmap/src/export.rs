//! Writing the map state to files: raster PNG, vector GeoJSON and legend SVGs.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use field_common::{Coordinate, Coordinates};
use overlay::{MemoryMap, Overlay, OverlayKey};
use serde_json::{json, Value};
use tracing::info;

/// GeoJSON geometry for a coordinate set. A bare ring is closed into a polygon.
fn geometry(coordinates: &Coordinates) -> Value {
    fn position(c: &Coordinate) -> Value {
        json!([c.lng, c.lat])
    }
    fn ring(ring: &[Coordinate]) -> Value {
        let mut positions: Vec<Value> = ring.iter().map(position).collect();
        if let (Some(first), Some(last)) = (ring.first(), ring.last()) {
            if first != last {
                positions.push(position(first));
            }
        }
        Value::Array(positions)
    }
    fn polygon(rings: &[Vec<Coordinate>]) -> Value {
        Value::Array(rings.iter().map(|r| ring(r)).collect())
    }

    match coordinates {
        Coordinates::Point(c) => json!({"type": "Point", "coordinates": position(c)}),
        Coordinates::Ring(r) => json!({"type": "Polygon", "coordinates": [ring(r)]}),
        Coordinates::Polygon(p) => json!({"type": "Polygon", "coordinates": polygon(p)}),
        Coordinates::MultiPolygon(m) => json!({
            "type": "MultiPolygon",
            "coordinates": m.iter().map(|p| polygon(p)).collect::<Vec<_>>()
        }),
    }
}

/// Every vector overlay on the map as a FeatureCollection. Rasters are skipped.
pub fn feature_collection(map: &MemoryMap) -> Value {
    let features: Vec<Value> = map
        .snapshot()
        .into_iter()
        .filter_map(|(key, installed)| feature(&key, &installed.overlay))
        .collect();
    json!({"type": "FeatureCollection", "features": features})
}

fn feature(key: &OverlayKey, overlay: &Overlay) -> Option<Value> {
    match overlay {
        Overlay::Raster(_) => None,
        Overlay::Polygon { coordinates, style } => Some(json!({
            "type": "Feature",
            "id": key.to_string(),
            "geometry": geometry(coordinates),
            "properties": {
                "fill": style.fill.to_hex(),
                "fill-opacity": style.fill_opacity,
                "stroke": style.stroke.map(|c| c.to_hex()),
            }
        })),
        Overlay::Marker { position, label } => Some(json!({
            "type": "Feature",
            "id": key.to_string(),
            "geometry": {"type": "Point", "coordinates": [position.lng, position.lat]},
            "properties": {"label": label}
        })),
    }
}

/// Encode the installed raster overlay, if any.
pub fn raster_png(map: &MemoryMap) -> Result<Option<(String, Vec<u8>)>> {
    let raster = map.snapshot().into_iter().find_map(|(key, installed)| match (key, installed.overlay) {
        (OverlayKey::Raster(id), Overlay::Raster(raster)) => Some((id, raster)),
        _ => None,
    });
    let Some((id, raster)) = raster else {
        return Ok(None);
    };
    let png = raster.to_png().with_context(|| format!("Failed to encode raster {}", id))?;
    Ok(Some((id, png)))
}

/// Legends to write next to the overlays, as `(file stem, svg)`.
pub type Legends = Vec<(&'static str, String)>;

/// Write `overlays.geojson`, `ndvi.png` when a raster is shown, and one SVG per legend.
pub fn write_all(map: &MemoryMap, legends: &Legends, dir: &Path) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    let mut written = Vec::new();

    let geojson = dir.join("overlays.geojson");
    let body = serde_json::to_vec_pretty(&feature_collection(map))?;
    std::fs::write(&geojson, body).with_context(|| format!("Failed to write {}", geojson.display()))?;
    written.push(geojson);

    if let Some((raster_id, png)) = raster_png(map)? {
        let path = dir.join("ndvi.png");
        std::fs::write(&path, &png).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(raster = %raster_id, bytes = png.len(), "Raster exported");
        written.push(path);
    }

    for (stem, svg) in legends {
        let path = dir.join(format!("{}.svg", stem));
        std::fs::write(&path, svg).with_context(|| format!("Failed to write {}", path.display()))?;
        written.push(path);
    }

    info!(dir = %dir.display(), files = written.len(), "Map exported");
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use field_common::BoundingBox;
    use overlay::{MapSurface, PolygonStyle};
    use renderer::{Color, ColorizedRaster, ValueRange};

    fn map_with_overlays() -> MemoryMap {
        let map = MemoryMap::default();
        map.add_overlay(
            OverlayKey::Subfield(101),
            Overlay::Polygon {
                coordinates: Coordinates::Polygon(vec![vec![
                    Coordinate::new(12.50, 48.80),
                    Coordinate::new(12.51, 48.80),
                    Coordinate::new(12.51, 48.81),
                ]]),
                style: PolygonStyle::filled(Color::rgb(128, 128, 0), 0.7),
            },
        )
        .unwrap();
        map.add_overlay(
            OverlayKey::Marker(1),
            Overlay::Marker {
                position: Coordinate::new(12.505, 48.805),
                label: Some("NDVI 0.300".into()),
            },
        )
        .unwrap();
        map
    }

    #[test]
    fn test_feature_collection_closes_rings() {
        let collection = feature_collection(&map_with_overlays());

        let features = collection["features"].as_array().unwrap();
        assert_eq!(features.len(), 2);
        let polygon = features.iter().find(|f| f["id"] == "subfield:101").unwrap();
        let ring = polygon["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(polygon["properties"]["fill"], "#808000ff");
        assert_eq!(polygon["properties"]["stroke"], Value::Null);
    }

    #[test]
    fn test_write_all() {
        let map = map_with_overlays();
        map.add_overlay(
            OverlayKey::Raster("r1".into()),
            Overlay::Raster(Arc::new(ColorizedRaster {
                width: 2,
                height: 1,
                pixels: vec![255, 0, 0, 255, 0, 0, 0, 0],
                bounds: BoundingBox::new(12.50, 48.80, 12.52, 48.81),
                range: Some(ValueRange::new(0.0, 0.0)),
            })),
        )
        .unwrap();
        let dir = tempfile::tempdir().unwrap();

        let written = write_all(&map, &vec![("legend", "<svg/>".to_string())], dir.path()).unwrap();

        assert_eq!(written.len(), 3);
        let png = std::fs::read(dir.path().join("ndvi.png")).unwrap();
        assert_eq!(&png[1..4], b"PNG");
        assert_eq!(std::fs::read_to_string(dir.path().join("legend.svg")).unwrap(), "<svg/>");
    }

    #[test]
    fn test_no_raster_no_png() {
        assert!(raster_png(&map_with_overlays()).unwrap().is_none());
    }
}
