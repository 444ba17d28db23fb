//! Geographic bounding boxes in longitude/latitude degrees.

use serde::{Deserialize, Serialize};

use crate::coordinate::Coordinate;

/// An axis-aligned lng/lat bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> Self {
        Self {
            min_lng,
            min_lat,
            max_lng,
            max_lat,
        }
    }

    /// Degenerate box covering a single position.
    pub fn from_point(coordinate: Coordinate) -> Self {
        Self::new(coordinate.lng, coordinate.lat, coordinate.lng, coordinate.lat)
    }

    /// Smallest box enclosing every coordinate, or `None` for an empty sequence.
    pub fn from_coordinates<'a>(coordinates: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        let mut iter = coordinates.into_iter();
        let mut bbox = Self::from_point(*iter.next()?);
        for coordinate in iter {
            bbox.extend(coordinate);
        }
        Some(bbox)
    }

    /// Grow the box so it contains `coordinate`.
    pub fn extend(&mut self, coordinate: &Coordinate) {
        self.min_lng = self.min_lng.min(coordinate.lng);
        self.min_lat = self.min_lat.min(coordinate.lat);
        self.max_lng = self.max_lng.max(coordinate.lng);
        self.max_lat = self.max_lat.max(coordinate.lat);
    }

    /// Smallest box enclosing both boxes.
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lng: self.min_lng.min(other.min_lng),
            min_lat: self.min_lat.min(other.min_lat),
            max_lng: self.max_lng.max(other.max_lng),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }

    /// Width of the box in degrees of longitude.
    pub fn width(&self) -> f64 {
        self.max_lng - self.min_lng
    }

    /// Height of the box in degrees of latitude.
    pub fn height(&self) -> f64 {
        self.max_lat - self.min_lat
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.min_lng + self.max_lng) / 2.0,
            (self.min_lat + self.max_lat) / 2.0,
        )
    }

    /// Check if this bbox intersects another.
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_lng <= other.max_lng
            && self.max_lng >= other.min_lng
            && self.min_lat <= other.max_lat
            && self.max_lat >= other.min_lat
    }

    /// Check if a position is contained within this bbox (edges inclusive).
    pub fn contains(&self, coordinate: &Coordinate) -> bool {
        coordinate.lng >= self.min_lng
            && coordinate.lng <= self.max_lng
            && coordinate.lat >= self.min_lat
            && coordinate.lat <= self.max_lat
    }

    /// `[[min_lat, min_lng], [max_lat, max_lng]]`, the corner order map widgets expect for fit-bounds.
    pub fn to_lat_lng_corners(&self) -> [[f64; 2]; 2] {
        [[self.min_lat, self.min_lng], [self.max_lat, self.max_lng]]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_coordinates() {
        let coords = [
            Coordinate::new(12.0, 48.0),
            Coordinate::new(12.5, 48.9),
            Coordinate::new(11.8, 48.2),
        ];
        let bbox = BoundingBox::from_coordinates(&coords).unwrap();
        assert_eq!(bbox, BoundingBox::new(11.8, 48.0, 12.5, 48.9));
        assert!(BoundingBox::from_coordinates(&Vec::<Coordinate>::new()).is_none());
    }

    #[test]
    fn test_union() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, -5.0, 15.0, 5.0);

        let union = a.union(&b);
        assert_eq!(union, BoundingBox::new(0.0, -5.0, 15.0, 10.0));
        assert!(a.intersects(&b));
        assert!(union.contains(&b.center()));
    }
}
