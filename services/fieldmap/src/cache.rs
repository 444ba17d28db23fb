//! Measurements and subfields of the selected field and season.
//!
//! Loaded once on selection and kept current from `measurement.*` events:
//! - `create`: the backend placed new measurements; replaces everything
//! - `update_measurement`: new lab values plus recommended fertilizer per subfield
//! - `update_position`: a measurement moved
//! - `delete`: a measurement was removed
//!
//! Events for any other field or season are ignored.

use std::collections::BTreeMap;

use field_common::{
    parse_all, EntityKind, FieldId, FieldMapError, FieldMapResult, Measurement, MeasurementId, SeasonId,
    ServerEvent, Subfield, SubfieldId,
};
use serde_json::Value;
use tracing::{debug, warn};

/// What an event did to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheChange {
    Unchanged,
    /// Existing entries changed.
    Updated,
    /// The whole set was replaced.
    Replaced,
}

#[derive(Debug, Default)]
pub struct MeasurementCache {
    selection: Option<(FieldId, SeasonId)>,
    measurements: BTreeMap<MeasurementId, Measurement>,
    subfields: BTreeMap<SubfieldId, Subfield>,
}

impl MeasurementCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&mut self, selection: (FieldId, SeasonId), measurements: Vec<Measurement>, subfields: Vec<Subfield>) {
        self.selection = Some(selection);
        self.replace(measurements, subfields);
    }

    fn replace(&mut self, measurements: Vec<Measurement>, subfields: Vec<Subfield>) {
        self.measurements = measurements.into_iter().map(|m| (m.id, m)).collect();
        self.subfields = subfields.into_iter().map(|s| (s.id, s)).collect();
        let orphans = self
            .measurements
            .values()
            .filter(|m| m.subfield_id.map_or(false, |id| !self.subfields.contains_key(&id)))
            .count();
        if orphans > 0 {
            warn!(orphans = orphans, "Measurements reference unknown subfields");
        }
    }

    pub fn clear(&mut self) {
        self.selection = None;
        self.measurements.clear();
        self.subfields.clear();
    }

    pub fn measurements(&self) -> Vec<Measurement> {
        self.measurements.values().cloned().collect()
    }

    pub fn measurement_ids(&self) -> Vec<MeasurementId> {
        self.measurements.keys().copied().collect()
    }

    pub fn subfields(&self) -> Vec<Subfield> {
        self.subfields.values().cloned().collect()
    }

    /// The subfield a measurement represents.
    pub fn subfield_of(&self, measurement_id: MeasurementId) -> Option<&Subfield> {
        let subfield_id = self.measurements.get(&measurement_id)?.subfield_id?;
        self.subfields.get(&subfield_id)
    }

    pub fn len(&self) -> usize {
        self.measurements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.measurements.is_empty()
    }

    /// Apply a server event. Malformed payloads for the selection are errors
    /// and leave the cache as it was.
    pub fn apply(&mut self, event: &ServerEvent) -> FieldMapResult<CacheChange> {
        if event.entity != EntityKind::Measurement || self.selection.is_none() || event.selection() != self.selection {
            return Ok(CacheChange::Unchanged);
        }

        let change = match event.action.as_str() {
            "create" => {
                let measurements = parse_all(field(&event.payload, "measurements")?, "measurement", Measurement::parse)?;
                let subfields = parse_all(field(&event.payload, "subfields")?, "subfield", Subfield::parse)?;
                self.replace(measurements, subfields);
                CacheChange::Replaced
            }
            "update_measurement" => {
                let measurement = Measurement::parse(field(&event.payload, "measurement")?)?;
                let amounts = fertilizer_amounts(event.payload.get("subfield_recommended_fertilizer"))?;
                for (subfield_id, amount) in amounts {
                    if let Some(subfield) = self.subfields.get_mut(&subfield_id) {
                        subfield.recommended_fertilizer_amount = Some(amount);
                    }
                }
                self.merge(measurement)
            }
            "update_position" => {
                let measurement = Measurement::parse(field(&event.payload, "measurement")?)?;
                self.merge(measurement)
            }
            "delete" => {
                let id = event
                    .payload
                    .get("id")
                    .and_then(Value::as_i64)
                    .ok_or_else(|| FieldMapError::invalid_payload("measurement", "missing id"))?;
                match self.measurements.remove(&id) {
                    Some(_) => CacheChange::Updated,
                    None => CacheChange::Unchanged,
                }
            }
            other => {
                debug!(action = other, "Ignoring measurement event");
                CacheChange::Unchanged
            }
        };
        debug!(action = %event.action, change = ?change, count = self.measurements.len(), "Measurement cache updated");
        Ok(change)
    }

    /// Insert or replace one measurement, keeping its subfield link when the update omits it.
    fn merge(&mut self, mut measurement: Measurement) -> CacheChange {
        if let Some(existing) = self.measurements.get(&measurement.id) {
            if measurement.subfield_id.is_none() {
                measurement.subfield_id = existing.subfield_id;
            }
            if *existing == measurement {
                return CacheChange::Unchanged;
            }
        }
        self.measurements.insert(measurement.id, measurement);
        CacheChange::Updated
    }
}

fn field<'a>(payload: &'a Value, name: &str) -> FieldMapResult<&'a Value> {
    payload
        .get(name)
        .ok_or_else(|| FieldMapError::invalid_payload("measurement", format!("missing '{}'", name)))
}

/// `{"<subfield id>": amount}`; keys arrive as strings.
fn fertilizer_amounts(value: Option<&Value>) -> FieldMapResult<Vec<(SubfieldId, f64)>> {
    let Some(Value::Object(map)) = value else {
        return Ok(Vec::new());
    };
    map.iter()
        .map(|(key, amount)| {
            let id = key
                .parse()
                .map_err(|_| FieldMapError::invalid_payload("subfield", format!("bad subfield id '{}'", key)))?;
            let amount = amount
                .as_f64()
                .ok_or_else(|| FieldMapError::invalid_payload("subfield", "fertilizer amount is not a number"))?;
            Ok((id, amount))
        })
        .collect()
}
