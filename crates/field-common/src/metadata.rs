//! Category enumerations and fertilizer bounds served by `GET metadata`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldMapError, FieldMapResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Upper bound for per-subfield fertilizer recommendations, used to scale their colors.
    pub max_recommended_fertilizer: f64,
    #[serde(default)]
    pub crops: Vec<String>,
    #[serde(default)]
    pub soils: Vec<String>,
    #[serde(default)]
    pub varieties: Vec<String>,
    #[serde(default)]
    pub fertilizers: Vec<String>,
    #[serde(default)]
    pub fertilizer_types: Vec<String>,
    #[serde(default)]
    pub crop_protections: Vec<String>,
    #[serde(default)]
    pub soil_tillages: Vec<String>,
    #[serde(default)]
    pub soil_conditions: Vec<String>,
}

impl Metadata {
    /// Parse the `{"data": {...}}` envelope.
    pub fn parse(value: &Value) -> FieldMapResult<Self> {
        let data = value
            .get("data")
            .ok_or_else(|| FieldMapError::invalid_payload("metadata", "missing data envelope"))?;
        Self::deserialize(data).map_err(|e| FieldMapError::invalid_payload("metadata", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_metadata() {
        let metadata = Metadata::parse(&json!({
            "data": {
                "max_recommended_fertilizer": 180.0,
                "crops": ["wheat", "barley"],
                "soil_tillages": ["plough"]
            }
        }))
        .unwrap();
        assert_eq!(metadata.max_recommended_fertilizer, 180.0);
        assert_eq!(metadata.crops.len(), 2);
        assert!(metadata.fertilizers.is_empty());

        assert!(Metadata::parse(&json!({"max_recommended_fertilizer": 1.0})).is_err());
    }
}
