use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rendering used by the upstream dataset for a missing scalar.
pub const ABSENT_VALUE: &str = "None";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChargerStatus {
    Available,
    Offline,
}

impl ChargerStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Available => "Available",
            Self::Offline => "Offline",
        }
    }
}

impl fmt::Display for ChargerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChargerStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Available" => Ok(Self::Available),
            "Offline" => Ok(Self::Offline),
            other => Err(format!("unknown charger status: {other}")),
        }
    }
}

/// Canonical charger row as persisted and served.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargerRecord {
    #[serde(rename = "chargerId")]
    pub id: String,
    pub town: String,
    pub title: Option<String>,
    pub latitude: String,
    pub longitude: String,
    pub status: ChargerStatus,
    /// Unix seconds.
    pub expires_at: i64,
}

/// A point of interest as returned by the Open Charge Map API.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawCharger {
    #[serde(rename = "ID", default)]
    pub id: Value,
    #[serde(default)]
    pub address_info: Option<AddressInfo>,
    #[serde(default)]
    pub status_type: Option<StatusType>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AddressInfo {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub town: Option<String>,
    #[serde(default)]
    pub state_or_province: Option<String>,
    #[serde(default)]
    pub postcode: Option<Value>,
    #[serde(default)]
    pub latitude: Option<Value>,
    #[serde(default)]
    pub longitude: Option<Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct StatusType {
    #[serde(default)]
    pub is_operational: Option<bool>,
}

impl RawCharger {
    pub fn address(&self) -> AddressInfo {
        self.address_info.clone().unwrap_or_default()
    }

    pub fn is_operational(&self) -> Option<bool> {
        self.status_type
            .as_ref()
            .and_then(|status| status.is_operational)
    }

    /// Identifier coerced to text; never empty.
    pub fn id_text(&self) -> String {
        value_text(Some(&self.id))
    }
}

impl AddressInfo {
    pub fn postcode_text(&self) -> Option<String> {
        match self.postcode.as_ref()? {
            Value::Null => None,
            Value::String(text) if text.is_empty() => None,
            value => Some(value_text(Some(value))),
        }
    }
}

pub fn value_text(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => ABSENT_VALUE.to_string(),
        Some(Value::String(text)) => text.clone(),
        Some(other) => other.to_string(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncRunStatus {
    Succeeded,
    Failed,
}

impl SyncRunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewSyncRunRecord {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: SyncRunStatus,
    pub synced: i64,
    pub deleted: i64,
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SyncRunRecord {
    pub run_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub status: String,
    pub synced: i64,
    pub deleted: i64,
    pub error: Option<String>,
}
