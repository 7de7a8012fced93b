// Persisted dashboard envelope
use super::widget::Widget;
use crate::error::DashboardError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Schema version assumed for payloads written before the field existed.
pub const LEGACY_STATE_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u32>,
    pub widgets: Vec<Widget>,
    pub last_updated: DateTime<Utc>,
}

impl DashboardState {
    pub fn snapshot(widgets: Vec<Widget>, version: u32) -> Self {
        Self {
            version: Some(version),
            widgets,
            last_updated: Utc::now(),
        }
    }

    /// Parses and validates a stored payload.
    pub fn parse(payload: &str, supported_version: u32) -> Result<Self, DashboardError> {
        let state: DashboardState = serde_json::from_str(payload)
            .map_err(|e| DashboardError::CorruptState(e.to_string()))?;

        let found = state.version.unwrap_or(LEGACY_STATE_VERSION);
        if found > supported_version {
            return Err(DashboardError::UnsupportedVersion {
                found,
                supported: supported_version,
            });
        }

        let mut seen = HashSet::new();
        for widget in &state.widgets {
            if !seen.insert(widget.id.as_str()) {
                return Err(DashboardError::CorruptState(format!(
                    "duplicate widget id {}",
                    widget.id
                )));
            }
        }

        Ok(state)
    }

    pub fn to_json(&self) -> Result<String, DashboardError> {
        Ok(serde_json::to_string(self)?)
    }
}
