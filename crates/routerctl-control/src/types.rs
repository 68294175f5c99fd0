//! Domain types for routers.
//!
//! These are built fresh from northbound records on every call and never
//! cached. Serialized field names follow the camelCase convention of the
//! rendered `RouterList` documents.

use routerctl_core::{PortUid, RouterUid, RowUuid};
use serde::{Deserialize, Serialize};

/// `kind` of a rendered router list.
pub const ROUTER_LIST_KIND: &str = "RouterList";

/// `apiVersion` of a rendered router list.
pub const API_VERSION: &str = "routerctl.io/v1alpha1";

/// A Neutron router as seen through the northbound database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Router {
    /// Neutron router ID.
    pub uid: RouterUid,
    /// Neutron router name, or the UID when unnamed.
    pub name: String,
    /// Administrative state.
    pub enabled: bool,
    /// Observed state.
    pub status: RouterStatus,
}

impl Router {
    /// Gateway ports, in record order.
    pub fn gateway_ports(&self) -> impl Iterator<Item = &PortInfo> {
        self.status.ports.iter().filter(|port| port.is_gateway)
    }

    /// A label for progress output: the name, with the UID when they differ.
    #[must_use]
    pub fn display_name(&self) -> String {
        if self.name == self.uid.as_str() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.uid)
        }
    }
}

/// Observed state of a router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterStatus {
    /// Chassis hosting the router, when all gateway ports agree on one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    /// Addresses of the gateway ports, in port order.
    #[serde(rename = "externalIPs", default, skip_serializing_if = "Vec::is_empty")]
    pub external_ips: Vec<String>,
    /// All router ports, in record order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortInfo>,
    /// Row UUID of the `Logical_Router`.
    #[serde(rename = "internalUUID")]
    pub internal_uuid: RowUuid,
}

/// A router port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortInfo {
    /// Neutron port ID.
    #[serde(rename = "uuid")]
    pub uid: PortUid,
    /// Whether this is the router's external gateway port.
    #[serde(default)]
    pub is_gateway: bool,
    /// Row UUID of the `Logical_Router_Port`.
    #[serde(rename = "internalUUID")]
    pub internal_uuid: RowUuid,
}

/// A list of routers in the shape rendered as JSON or YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterList {
    /// Always [`ROUTER_LIST_KIND`].
    pub kind: String,
    /// Always [`API_VERSION`].
    pub api_version: String,
    /// The routers, sorted by UID.
    pub items: Vec<Router>,
}

impl RouterList {
    /// Wrap routers in a list, sorting them by UID.
    #[must_use]
    pub fn new(mut items: Vec<Router>) -> Self {
        items.sort_by(|a, b| a.uid.cmp(&b.uid));
        Self {
            kind: ROUTER_LIST_KIND.to_string(),
            api_version: API_VERSION.to_string(),
            items,
        }
    }

    /// Number of routers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find a router by UID.
    #[must_use]
    pub fn get(&self, uid: &RouterUid) -> Option<&Router> {
        self.items.iter().find(|router| &router.uid == uid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(uid: &str, name: &str) -> Router {
        Router {
            uid: RouterUid::new(uid),
            name: name.to_string(),
            enabled: true,
            status: RouterStatus {
                agent: None,
                external_ips: Vec::new(),
                ports: Vec::new(),
                internal_uuid: RowUuid::generate(),
            },
        }
    }

    #[test]
    fn list_sorted_by_uid() {
        let list = RouterList::new(vec![router("b", "b"), router("a", "a")]);
        let uids: Vec<_> = list.items.iter().map(|r| r.uid.as_str()).collect();
        assert_eq!(uids, ["a", "b"]);
        assert!(list.get(&RouterUid::new("b")).is_some());
    }

    #[test]
    fn display_name_includes_uid_when_named() {
        assert_eq!(router("r1", "r1").display_name(), "r1");
        assert_eq!(router("r1", "edge").display_name(), "edge (r1)");
    }

    #[test]
    fn json_shape() {
        let mut r = router("r1", "edge");
        r.status.agent = Some("node1".to_string());
        r.status.external_ips = vec!["172.24.4.10/24".to_string()];
        let json = serde_json::to_value(RouterList::new(vec![r])).unwrap();

        assert_eq!(json["kind"], "RouterList");
        assert_eq!(json["apiVersion"], API_VERSION);
        let item = &json["items"][0];
        assert_eq!(item["uid"], "r1");
        assert_eq!(item["status"]["agent"], "node1");
        assert_eq!(item["status"]["externalIPs"][0], "172.24.4.10/24");
        assert!(item["status"].get("ports").is_none());
    }
}
