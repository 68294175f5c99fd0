//! Northbound snapshots.
//!
//! A snapshot is a plain dump of the three tables, stored as JSON or YAML.
//! The format is picked from the file extension: `.yaml` and `.yml` are
//! read as YAML, anything else as JSON.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, StoreError};
use crate::records::{GatewayChassis, LogicalRouter, LogicalRouterPort};

/// The contents of a northbound database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NbSnapshot {
    /// `Logical_Router` rows.
    #[serde(default)]
    pub logical_routers: Vec<LogicalRouter>,
    /// `Logical_Router_Port` rows.
    #[serde(default)]
    pub logical_router_ports: Vec<LogicalRouterPort>,
    /// `Gateway_Chassis` rows.
    #[serde(default)]
    pub gateway_chassis: Vec<GatewayChassis>,
}

impl NbSnapshot {
    /// Load a snapshot from disk.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Snapshot` if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| StoreError::Snapshot(format!("{}: {e}", path.display())))?;

        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));

        let snapshot = if is_yaml {
            Self::from_yaml_str(&content)
        } else {
            Self::from_json_str(&content)
        };
        snapshot.map_err(|e| match e {
            StoreError::Snapshot(msg) => StoreError::Snapshot(format!("{}: {msg}", path.display())),
            other => other,
        })
    }

    /// Parse a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Snapshot` on malformed input.
    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|e| StoreError::Snapshot(e.to_string()))
    }

    /// Parse a YAML snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Snapshot` on malformed input.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| StoreError::Snapshot(e.to_string()))
    }
}
