//! Northbound schema names.
//!
//! Table names, column names and the well-known map keys the core reads.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Northbound tables used by routerctl.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Table {
    /// `Logical_Router`
    #[serde(rename = "Logical_Router")]
    LogicalRouter,
    /// `Logical_Router_Port`
    #[serde(rename = "Logical_Router_Port")]
    LogicalRouterPort,
    /// `Gateway_Chassis`
    #[serde(rename = "Gateway_Chassis")]
    GatewayChassis,
}

impl Table {
    /// The table name as it appears in the database schema.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::LogicalRouter => "Logical_Router",
            Self::LogicalRouterPort => "Logical_Router_Port",
            Self::GatewayChassis => "Gateway_Chassis",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Column names.
pub mod column {
    /// `Gateway_Chassis.priority`
    pub const PRIORITY: &str = "priority";

    /// `Gateway_Chassis.chassis_name`
    pub const CHASSIS_NAME: &str = "chassis_name";

    /// `Logical_Router_Port.status`
    pub const STATUS: &str = "status";
}

/// Keys of the `external_ids` maps written by Neutron.
pub mod external_ids {
    /// Set to `"True"` on a router's external gateway port.
    pub const IS_EXT_GW: &str = "neutron:is_ext_gw";

    /// Human-readable router name.
    pub const ROUTER_NAME: &str = "neutron:router_name";

    /// The literal value Neutron writes for a true flag.
    pub const TRUE: &str = "True";
}

/// Keys of the `Logical_Router_Port.status` map written by northd.
pub mod status {
    /// The chassis currently hosting the port.
    pub const HOSTING_CHASSIS: &str = "hosting-chassis";
}
