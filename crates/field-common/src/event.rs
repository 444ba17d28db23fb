//! Server-sent event envelopes.
//!
//! Every message on the event stream is a JSON object
//! `{"type": "<entity>.<action>", "payload": {...}}`. Actions are free-form
//! (`update`, `delete`, `create`, `update_measurement`, `update_position`, ...)
//! so they stay strings; the entity is closed over the kinds the client
//! displays.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{FieldMapError, FieldMapResult};
use crate::field::FieldId;
use crate::season::SeasonId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Field,
    Season,
    Measurement,
    User,
}

impl FromStr for EntityKind {
    type Err = FieldMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "field" => Ok(EntityKind::Field),
            "season" => Ok(EntityKind::Season),
            "measurement" => Ok(EntityKind::Measurement),
            "user" => Ok(EntityKind::User),
            other => Err(FieldMapError::UnknownEntity(other.to_string())),
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Field => "field",
            EntityKind::Season => "season",
            EntityKind::Measurement => "measurement",
            EntityKind::User => "user",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ServerEvent {
    pub entity: EntityKind,
    pub action: String,
    pub payload: Value,
}

#[derive(Deserialize)]
struct EventEnvelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

impl ServerEvent {
    /// Parse the `data` of one event-stream message.
    pub fn parse(data: &str) -> FieldMapResult<Self> {
        let envelope: EventEnvelope =
            serde_json::from_str(data).map_err(|e| FieldMapError::InvalidEvent(e.to_string()))?;
        let (entity, action) = envelope
            .kind
            .split_once('.')
            .ok_or_else(|| FieldMapError::InvalidEvent(format!("malformed type '{}'", envelope.kind)))?;
        Ok(Self {
            entity: entity.parse()?,
            action: action.to_string(),
            payload: envelope.payload,
        })
    }

    pub fn is_create(&self) -> bool {
        self.action == "create"
    }

    /// `update` and its specialised forms (`update_position`, ...).
    pub fn is_update(&self) -> bool {
        self.action == "update" || self.action.starts_with("update_")
    }

    pub fn is_delete(&self) -> bool {
        self.action == "delete"
    }

    /// `(field_id, season_id)` carried by season and measurement payloads.
    pub fn selection(&self) -> Option<(FieldId, SeasonId)> {
        let field_id = self.payload.get("field_id")?.as_i64()?;
        let season_id = self.payload.get("season_id")?.as_str()?.parse().ok()?;
        Some((field_id, season_id))
    }
}
