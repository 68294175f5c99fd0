//! Northbound row types.
//!
//! Only the columns routerctl reads or writes are modeled. Maps use
//! `BTreeMap` so that rendering and snapshots are deterministic.

use std::collections::BTreeMap;

use routerctl_core::RowUuid;
use serde::{Deserialize, Serialize};

use crate::ops::{Operation, Row};
use crate::schema::{column, status, Table};

/// A `Logical_Router` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRouter {
    /// Row UUID.
    pub uuid: RowUuid,
    /// Record name, `neutron-<router id>` for Neutron routers.
    pub name: String,
    /// Free-form metadata written by the CMS.
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
    /// References to `Logical_Router_Port` rows.
    #[serde(default)]
    pub ports: Vec<RowUuid>,
    /// Administrative state. Absent means enabled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
}

/// A `Logical_Router_Port` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalRouterPort {
    /// Row UUID.
    pub uuid: RowUuid,
    /// Record name, `lrp-<port id>` for Neutron ports.
    pub name: String,
    /// Free-form metadata written by the CMS.
    #[serde(default)]
    pub external_ids: BTreeMap<String, String>,
    /// References to `Gateway_Chassis` rows.
    #[serde(default)]
    pub gateway_chassis: Vec<RowUuid>,
    /// Status written by northd, including `hosting-chassis`.
    #[serde(default)]
    pub status: BTreeMap<String, String>,
    /// Addresses in CIDR notation.
    #[serde(default)]
    pub networks: Vec<String>,
}

impl LogicalRouterPort {
    /// The chassis northd reports as hosting this port, if any.
    ///
    /// An empty value is treated the same as an absent key.
    #[must_use]
    pub fn hosting_chassis(&self) -> Option<&str> {
        self.status
            .get(status::HOSTING_CHASSIS)
            .map(String::as_str)
            .filter(|chassis| !chassis.is_empty())
    }
}

/// A `Gateway_Chassis` row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayChassis {
    /// Row UUID.
    pub uuid: RowUuid,
    /// Record name.
    pub name: String,
    /// Name of the physical chassis.
    pub chassis_name: String,
    /// Scheduling priority. The highest priority candidate hosts the port.
    pub priority: i64,
}

impl GatewayChassis {
    /// Build the operation that sets the priority of a `Gateway_Chassis` row.
    #[must_use]
    pub fn priority_update(uuid: RowUuid, priority: i64) -> Operation {
        let mut row = Row::new();
        row.insert(column::PRIORITY.to_string(), priority.into());
        Operation::Update {
            table: Table::GatewayChassis,
            uuid,
            row,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn port(status: &[(&str, &str)]) -> LogicalRouterPort {
        LogicalRouterPort {
            uuid: RowUuid::generate(),
            name: "lrp-1".to_string(),
            external_ids: BTreeMap::new(),
            gateway_chassis: Vec::new(),
            status: status
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            networks: Vec::new(),
        }
    }

    #[test]
    fn hosting_chassis_reads_status() {
        assert_eq!(
            port(&[("hosting-chassis", "node1")]).hosting_chassis(),
            Some("node1")
        );
        assert_eq!(port(&[]).hosting_chassis(), None);
        assert_eq!(port(&[("hosting-chassis", "")]).hosting_chassis(), None);
    }

    #[test]
    fn priority_update_targets_single_row() {
        let uuid = RowUuid::generate();
        let Operation::Update { table, uuid: target, row } = GatewayChassis::priority_update(uuid, 3);
        assert_eq!(table, Table::GatewayChassis);
        assert_eq!(target, uuid);
        assert_eq!(row.len(), 1);
        assert_eq!(row.get("priority"), Some(&serde_json::Value::from(3)));
    }

    #[test]
    fn snapshot_style_deserialization_fills_defaults() {
        let json = r#"{
            "uuid": "aa3fd293-3f8c-42f9-9d72-4afa984727b3",
            "name": "neutron-r1"
        }"#;
        let router: LogicalRouter = serde_json::from_str(json).unwrap();
        assert!(router.ports.is_empty());
        assert!(router.external_ids.is_empty());
        assert_eq!(router.enabled, None);
    }
}
