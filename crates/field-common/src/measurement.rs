//! Nutrient measurements and the subfields they represent.
//!
//! The backend splits a field into subfields by NDVI and places one
//! measurement position in each. Measurements reference their subfield by
//! `subfield_id`; subfields point back through `measurement_id`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::coordinate::{Coordinate, Coordinates};
use crate::error::{FieldMapError, FieldMapResult};

pub type MeasurementId = i64;
pub type SubfieldId = i64;

/// Lab values a user records for a measurement. All optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeasurementValues {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nitrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phosphor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub charge: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stadium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_condition: Option<String>,
}

impl MeasurementValues {
    /// Wire body for `measurement/upgister/{id}`.
    pub fn deparse(&self) -> FieldMapResult<Value> {
        serde_json::to_value(self).map_err(|e| FieldMapError::invalid_payload("measurement", e))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Measurement {
    pub id: MeasurementId,
    pub position: Coordinate,
    pub ndvi: f64,
    pub values: MeasurementValues,
    pub sample_image: Option<String>,
    pub subfield_id: Option<SubfieldId>,
}

#[derive(Deserialize)]
struct MeasurementWire {
    id: MeasurementId,
    longitude: f64,
    latitude: f64,
    ndvi: f64,
    #[serde(flatten)]
    values: MeasurementValues,
    #[serde(default)]
    sample_image: Option<String>,
    #[serde(default)]
    subfield_id: Option<SubfieldId>,
}

impl Measurement {
    pub fn parse(value: &Value) -> FieldMapResult<Self> {
        let wire = MeasurementWire::deserialize(value)
            .map_err(|e| FieldMapError::invalid_payload("measurement", e))?;
        let position = Coordinate::from_position(&[wire.longitude, wire.latitude])?;
        Ok(Self {
            id: wire.id,
            position,
            ndvi: wire.ndvi,
            values: wire.values,
            sample_image: wire.sample_image,
            subfield_id: wire.subfield_id,
        })
    }

    /// Wire body for `measurement/position/{id}`.
    pub fn deparse_position(&self) -> Value {
        json!({ "longitude": self.position.lng, "latitude": self.position.lat })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subfield {
    pub id: SubfieldId,
    pub measurement_id: MeasurementId,
    pub coordinates: Coordinates,
    pub area: f64,
    pub ndvi: f64,
    /// Unset until the measurement's lab values have been recorded.
    #[serde(default)]
    pub recommended_fertilizer_amount: Option<f64>,
}

impl Subfield {
    pub fn parse(value: &Value) -> FieldMapResult<Self> {
        Self::deserialize(value).map_err(|e| FieldMapError::invalid_payload("subfield", e))
    }
}

/// Parse every element of a JSON array with `parse`, failing on the first bad element.
pub fn parse_all<T>(
    value: &Value,
    entity: &'static str,
    parse: impl Fn(&Value) -> FieldMapResult<T>,
) -> FieldMapResult<Vec<T>> {
    value
        .as_array()
        .ok_or_else(|| FieldMapError::invalid_payload(entity, "expected an array"))?
        .iter()
        .map(parse)
        .collect()
}
