//! Cropping seasons.
//!
//! Seasons are keyed by their start date written as `YYYYMMDD`. The same id
//! selects the NDVI raster and the measurement set of a field.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldMapError, FieldMapResult};
use crate::field::FieldId;

const SEASON_ID_FORMAT: &str = "%Y%m%d";
const SEASON_LABEL_FORMAT: &str = "%d-%m-%Y";

/// A validated `YYYYMMDD` season id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SeasonId(NaiveDate);

impl SeasonId {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Human label, `DD-MM-YYYY`.
    pub fn label(&self) -> String {
        self.0.format(SEASON_LABEL_FORMAT).to_string()
    }
}

impl FromStr for SeasonId {
    type Err = FieldMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldMapError::InvalidSeasonId(s.to_string()));
        }
        NaiveDate::parse_from_str(s, SEASON_ID_FORMAT)
            .map(SeasonId)
            .map_err(|_| FieldMapError::InvalidSeasonId(s.to_string()))
    }
}

impl fmt::Display for SeasonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(SEASON_ID_FORMAT))
    }
}

impl Serialize for SeasonId {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SeasonId {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Entry of the season picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeasonOption {
    pub id: SeasonId,
    pub label: String,
}

impl SeasonOption {
    pub fn new(id: SeasonId) -> Self {
        Self {
            label: id.label(),
            id,
        }
    }

    /// Build picker entries from the raw ids returned by `GET season/{field}`,
    /// newest first. A single malformed id fails the whole list.
    pub fn from_ids<S: AsRef<str>>(ids: &[S]) -> FieldMapResult<Vec<SeasonOption>> {
        let mut options = ids
            .iter()
            .map(|id| id.as_ref().parse().map(SeasonOption::new))
            .collect::<FieldMapResult<Vec<_>>>()?;
        options.sort_by(|a, b| b.id.cmp(&a.id));
        options.dedup_by(|a, b| a.id == b.id);
        Ok(options)
    }
}

/// Agronomic record of one season. Every attribute is optional on the wire.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Season {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field_id: Option<FieldId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season_id: Option<SeasonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intercrop: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variety: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_density: Option<f64>,
    #[serde(default, rename = "yield", skip_serializing_if = "Option::is_none")]
    pub harvest_yield: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_allowed_fertilizer: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_fertilizer_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_fertilizer_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommended_fertilizer_amount: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_soil_tillage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_soil_tillage: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_crop_protection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub second_crop_protection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nitrate: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phosphor: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub potassium: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph: Option<f64>,
}

impl Season {
    /// Parse a season payload. Present attributes must carry the right type.
    pub fn parse(value: &Value) -> FieldMapResult<Self> {
        Self::deserialize(value).map_err(|e| FieldMapError::invalid_payload("season", e))
    }

    /// Wire body for `season/upgister`. The selection keys travel in the URL.
    pub fn deparse(&self) -> FieldMapResult<Value> {
        let body = Season {
            field_id: None,
            season_id: None,
            ..self.clone()
        };
        serde_json::to_value(body).map_err(|e| FieldMapError::invalid_payload("season", e))
    }

    /// Whether this record belongs to the given selection.
    pub fn is_for(&self, field_id: FieldId, season_id: SeasonId) -> bool {
        self.field_id == Some(field_id) && self.season_id == Some(season_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_season_id_label() {
        let id: SeasonId = "20240315".parse().unwrap();
        assert_eq!(id.label(), "15-03-2024");
        assert_eq!(id.to_string(), "20240315");
    }

    #[test]
    fn test_invalid_season_ids() {
        assert!("2024031".parse::<SeasonId>().is_err());
        assert!("20241315".parse::<SeasonId>().is_err());
        assert!("2024-03-15".parse::<SeasonId>().is_err());
    }

    #[test]
    fn test_options_sorted_newest_first() {
        let options = SeasonOption::from_ids(&["20230401", "20240315", "20230401"]).unwrap();
        let labels: Vec<_> = options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(labels, vec!["15-03-2024", "01-04-2023"]);
        assert!(SeasonOption::from_ids(&["20240315", "bad"]).is_err());
    }

    #[test]
    fn test_parse_and_deparse_season() {
        let season = Season::parse(&json!({
            "field_id": 4,
            "season_id": "20240315",
            "variety": "Julius",
            "yield": 8.1,
            "intercrop": false
        }))
        .unwrap();
        assert_eq!(season.harvest_yield, Some(8.1));
        assert!(season.is_for(4, "20240315".parse().unwrap()));

        let body = season.deparse().unwrap();
        assert_eq!(body, json!({"variety": "Julius", "yield": 8.1, "intercrop": false}));
    }

    #[test]
    fn test_mistyped_attribute_fails() {
        assert!(Season::parse(&json!({"seed_density": "many"})).is_err());
    }
}
