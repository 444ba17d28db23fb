//! User profile payloads.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{FieldMapError, FieldMapResult};

/// Account data shown and edited on the profile page.
///
/// The backend never returns the password; it is only sent when a user changes it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_size: Option<u32>,
}

impl UserProfile {
    pub fn parse(value: &Value) -> FieldMapResult<Self> {
        Self::deserialize(value).map_err(|e| FieldMapError::invalid_payload("user", e))
    }

    pub fn deparse(&self) -> FieldMapResult<Value> {
        serde_json::to_value(self).map_err(|e| FieldMapError::invalid_payload("user", e))
    }
}
