//! Coordinates and the nested coordinate sequences exchanged with the backend.
//!
//! The backend always sends positions as `[longitude, latitude]` arrays, nested
//! to the depth of the geometry:
//!
//! ```text
//! [lng, lat]                      -> Point
//! [[lng, lat], ...]               -> Ring
//! [[[lng, lat], ...], ...]        -> Polygon (exterior ring first, then holes)
//! [[[[lng, lat], ...], ...], ...] -> MultiPolygon
//! ```
//!
//! Inside the workspace positions are [`Coordinate`] values with named
//! `lng`/`lat` fields. The depth is decided by looking at whether the first
//! element is a number or a further array; a sequence that mixes depths is
//! rejected instead of being half-parsed.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bbox::BoundingBox;
use crate::error::{FieldMapError, FieldMapResult};

/// A single geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lng: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    /// Build from a wire position. Ordinates past the second (altitude) are ignored.
    pub fn from_position(position: &[f64]) -> FieldMapResult<Self> {
        match position {
            [lng, lat, ..] if lng.is_finite() && lat.is_finite() => Ok(Self::new(*lng, *lat)),
            [_, _, ..] => Err(FieldMapError::InvalidCoordinates(format!(
                "non-finite position {:?}",
                position
            ))),
            _ => Err(FieldMapError::InvalidCoordinates(format!(
                "position needs 2 numbers, got {}",
                position.len()
            ))),
        }
    }

    /// Wire position, `[lng, lat]`.
    pub fn to_position(self) -> [f64; 2] {
        [self.lng, self.lat]
    }
}

/// A position or a nested sequence of positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireCoordinates", into = "WireCoordinates")]
pub enum Coordinates {
    Point(Coordinate),
    Ring(Vec<Coordinate>),
    Polygon(Vec<Vec<Coordinate>>),
    MultiPolygon(Vec<Vec<Vec<Coordinate>>>),
}

impl Coordinates {
    /// Nesting depth: 0 for a point up to 3 for a multi-polygon.
    pub fn depth(&self) -> usize {
        match self {
            Coordinates::Point(_) => 0,
            Coordinates::Ring(_) => 1,
            Coordinates::Polygon(_) => 2,
            Coordinates::MultiPolygon(_) => 3,
        }
    }

    /// Iterate every position regardless of depth.
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Coordinate> + '_> {
        match self {
            Coordinates::Point(c) => Box::new(std::iter::once(c)),
            Coordinates::Ring(ring) => Box::new(ring.iter()),
            Coordinates::Polygon(rings) => Box::new(rings.iter().flatten()),
            Coordinates::MultiPolygon(polygons) => Box::new(polygons.iter().flatten().flatten()),
        }
    }

    /// Number of positions across all rings.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn bounds(&self) -> Option<BoundingBox> {
        BoundingBox::from_coordinates(self.iter())
    }

    /// Outer ring of the (first) polygon. Points have no ring.
    pub fn exterior_ring(&self) -> Option<&[Coordinate]> {
        match self {
            Coordinates::Point(_) => None,
            Coordinates::Ring(ring) => Some(ring),
            Coordinates::Polygon(rings) => rings.first().map(Vec::as_slice),
            Coordinates::MultiPolygon(polygons) => polygons
                .first()
                .and_then(|rings| rings.first())
                .map(Vec::as_slice),
        }
    }
}

/// Parse a loosely-typed wire value (`[lng, lat]` nested arrays) into [`Coordinates`].
pub fn parse_coordinates(value: &Value) -> FieldMapResult<Coordinates> {
    Coordinates::deserialize(value).map_err(|e| FieldMapError::InvalidCoordinates(e.to_string()))
}

/// Convert [`Coordinates`] back into the wire representation.
pub fn deparse_coordinates(coordinates: &Coordinates) -> Value {
    fn position(c: &Coordinate) -> Value {
        Value::from(c.to_position().to_vec())
    }
    fn ring(r: &[Coordinate]) -> Value {
        Value::Array(r.iter().map(position).collect())
    }
    fn polygon(p: &[Vec<Coordinate>]) -> Value {
        Value::Array(p.iter().map(|r| ring(r)).collect())
    }

    match coordinates {
        Coordinates::Point(c) => position(c),
        Coordinates::Ring(r) => ring(r),
        Coordinates::Polygon(p) => polygon(p),
        Coordinates::MultiPolygon(m) => Value::Array(m.iter().map(|p| polygon(p)).collect()),
    }
}

// Untagged variants are tried in order, so the shallowest shape that fits wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum WireCoordinates {
    Point(Vec<f64>),
    Ring(Vec<Vec<f64>>),
    Polygon(Vec<Vec<Vec<f64>>>),
    MultiPolygon(Vec<Vec<Vec<Vec<f64>>>>),
}

fn non_empty<T>(items: Vec<T>, what: &str) -> FieldMapResult<Vec<T>> {
    if items.is_empty() {
        return Err(FieldMapError::InvalidCoordinates(format!("empty {}", what)));
    }
    Ok(items)
}

fn ring_from_wire(positions: Vec<Vec<f64>>) -> FieldMapResult<Vec<Coordinate>> {
    non_empty(positions, "ring")?
        .iter()
        .map(|p| Coordinate::from_position(p))
        .collect()
}

fn polygon_from_wire(rings: Vec<Vec<Vec<f64>>>) -> FieldMapResult<Vec<Vec<Coordinate>>> {
    non_empty(rings, "polygon")?
        .into_iter()
        .map(ring_from_wire)
        .collect()
}

impl TryFrom<WireCoordinates> for Coordinates {
    type Error = FieldMapError;

    fn try_from(wire: WireCoordinates) -> Result<Self, Self::Error> {
        Ok(match wire {
            WireCoordinates::Point(p) => Coordinates::Point(Coordinate::from_position(&p)?),
            WireCoordinates::Ring(r) => Coordinates::Ring(ring_from_wire(r)?),
            WireCoordinates::Polygon(p) => Coordinates::Polygon(polygon_from_wire(p)?),
            WireCoordinates::MultiPolygon(m) => Coordinates::MultiPolygon(
                non_empty(m, "multi-polygon")?
                    .into_iter()
                    .map(polygon_from_wire)
                    .collect::<FieldMapResult<_>>()?,
            ),
        })
    }
}

impl From<Coordinates> for WireCoordinates {
    fn from(coordinates: Coordinates) -> Self {
        fn pos(c: Coordinate) -> Vec<f64> {
            c.to_position().to_vec()
        }
        fn ring(r: Vec<Coordinate>) -> Vec<Vec<f64>> {
            r.into_iter().map(pos).collect()
        }
        fn polygon(p: Vec<Vec<Coordinate>>) -> Vec<Vec<Vec<f64>>> {
            p.into_iter().map(ring).collect()
        }

        match coordinates {
            Coordinates::Point(c) => WireCoordinates::Point(pos(c)),
            Coordinates::Ring(r) => WireCoordinates::Ring(ring(r)),
            Coordinates::Polygon(p) => WireCoordinates::Polygon(polygon(p)),
            Coordinates::MultiPolygon(m) => {
                WireCoordinates::MultiPolygon(m.into_iter().map(polygon).collect())
            }
        }
    }
}
