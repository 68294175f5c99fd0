//! Mapping between Neutron identifiers and northbound record names.
//!
//! Neutron names its northbound rows by prefixing its own IDs:
//! `Logical_Router.name = "neutron-" + router_id` and
//! `Logical_Router_Port.name = "lrp-" + port_id`. Every caller that needs
//! to go from one to the other goes through this module.

use crate::error::IdError;
use crate::ids::{PortUid, RouterUid};

/// Prefix of `Logical_Router` names created by Neutron.
pub const ROUTER_PREFIX: &str = "neutron-";

/// Prefix of `Logical_Router_Port` names created by Neutron.
pub const PORT_PREFIX: &str = "lrp-";

/// Recover the router UID from a `Logical_Router` name.
///
/// # Errors
///
/// Returns [`IdError::MissingPrefix`] if the name is not Neutron-owned, and
/// [`IdError::Empty`] if nothing follows the prefix. Rejecting foreign
/// names keeps the mapping injective: `"x"` and `"neutron-x"` can never
/// both map to the UID `x`.
pub fn router_uid_from_name(name: &str) -> Result<RouterUid, IdError> {
    let uid = name
        .strip_prefix(ROUTER_PREFIX)
        .ok_or_else(|| IdError::MissingPrefix {
            name: name.to_string(),
            prefix: ROUTER_PREFIX,
        })?;

    if uid.is_empty() {
        return Err(IdError::Empty);
    }

    Ok(RouterUid::new(uid))
}

/// Build the `Logical_Router` name for a router UID.
#[must_use]
pub fn router_record_name(uid: &RouterUid) -> String {
    format!("{ROUTER_PREFIX}{uid}")
}

/// Recover the port UID from a `Logical_Router_Port` name.
///
/// Ports not created by Neutron keep their name unchanged.
#[must_use]
pub fn port_uid_from_name(name: &str) -> PortUid {
    PortUid::new(name.strip_prefix(PORT_PREFIX).unwrap_or(name))
}
