//! Registered fields.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::coordinate::{Coordinate, Coordinates};
use crate::error::{FieldMapError, FieldMapResult};

pub type FieldId = i64;

/// A registered field with its boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    pub coordinates: Coordinates,
    /// Distance to the Straubing reference site, as computed by the backend.
    pub straubing_distance: f64,
    pub area: f64,
}

impl Field {
    /// Parse a field payload. Missing or mistyped attributes fail the whole field.
    pub fn parse(value: &Value) -> FieldMapResult<Self> {
        Self::deserialize(value).map_err(|e| FieldMapError::invalid_payload("field", e))
    }
}

/// Entry of the field picker (`GET field`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOption {
    pub id: FieldId,
    pub name: String,
}

/// Body for `POST field/register`: a name and the exterior ring of the drawn region.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRegistration {
    pub name: String,
    pub ring: Vec<Coordinate>,
}

impl FieldRegistration {
    pub fn new(name: impl Into<String>, region: &Coordinates) -> FieldMapResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(FieldMapError::invalid_payload("field", "name must not be empty"));
        }
        let ring = region
            .exterior_ring()
            .filter(|ring| ring.len() >= 3)
            .ok_or_else(|| {
                FieldMapError::InvalidCoordinates("a field needs a ring of at least 3 positions".into())
            })?;
        Ok(Self {
            name,
            ring: ring.to_vec(),
        })
    }

    pub fn deparse(&self) -> Value {
        let ring: Vec<[f64; 2]> = self.ring.iter().map(|c| c.to_position()).collect();
        json!({ "name": self.name, "coordinates": ring })
    }
}
