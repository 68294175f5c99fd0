//! Topology builder for unit tests.

use std::collections::BTreeMap;

use routerctl_core::RowUuid;
use routerctl_store::{
    ControllerMode, GatewayChassis, LogicalRouter, LogicalRouterPort, MemoryNbClient, NbSnapshot,
};

/// Network assigned to every gateway port.
pub const GW: &str = "172.24.4.10/24";

pub struct Topology {
    snapshot: NbSnapshot,
    controller: ControllerMode,
}

impl Topology {
    pub fn new() -> Self {
        Self::with_controller(ControllerMode::Immediate)
    }

    pub fn with_controller(controller: ControllerMode) -> Self {
        Self {
            snapshot: NbSnapshot::default(),
            controller,
        }
    }

    pub fn router(&mut self, uid: &str, name: Option<&str>) -> RouterBuilder<'_> {
        let mut external_ids = BTreeMap::new();
        if let Some(name) = name {
            external_ids.insert("neutron:router_name".to_string(), name.to_string());
        }
        RouterBuilder {
            topo: self,
            uid: uid.to_string(),
            record: LogicalRouter {
                uuid: RowUuid::generate(),
                name: format!("neutron-{uid}"),
                external_ids,
                ports: Vec::new(),
                enabled: None,
            },
            gateways: 0,
            internals: 0,
        }
    }

    pub fn client(&self) -> MemoryNbClient {
        MemoryNbClient::from_snapshot(self.snapshot.clone(), self.controller)
    }
}

pub struct RouterBuilder<'a> {
    topo: &'a mut Topology,
    uid: String,
    record: LogicalRouter,
    gateways: usize,
    internals: usize,
}

impl RouterBuilder<'_> {
    pub fn internal(mut self, network: &str) -> Self {
        let port = LogicalRouterPort {
            uuid: RowUuid::generate(),
            name: format!("lrp-{}-int{}", self.uid, self.internals),
            external_ids: BTreeMap::new(),
            gateway_chassis: Vec::new(),
            status: BTreeMap::new(),
            networks: vec![network.to_string()],
        };
        self.internals += 1;
        self.record.ports.push(port.uuid);
        self.topo.snapshot.logical_router_ports.push(port);
        self
    }

    /// Add a gateway port scheduled on `(chassis, priority)` candidates.
    pub fn gateway(mut self, candidates: &[(&str, i64)]) -> Self {
        let port_name = format!("lrp-{}-gw{}", self.uid, self.gateways);
        let mut gateway_chassis = Vec::new();
        for (chassis, priority) in candidates {
            let gc = GatewayChassis {
                uuid: RowUuid::generate(),
                name: format!("{port_name}_{chassis}"),
                chassis_name: (*chassis).to_string(),
                priority: *priority,
            };
            gateway_chassis.push(gc.uuid);
            self.topo.snapshot.gateway_chassis.push(gc);
        }

        let mut external_ids = BTreeMap::new();
        external_ids.insert("neutron:is_ext_gw".to_string(), "True".to_string());
        let port = LogicalRouterPort {
            uuid: RowUuid::generate(),
            name: port_name,
            external_ids,
            gateway_chassis,
            status: BTreeMap::new(),
            networks: vec![GW.to_string()],
        };
        self.gateways += 1;
        self.record.ports.push(port.uuid);
        self.topo.snapshot.logical_router_ports.push(port);
        self
    }

    pub fn disabled(mut self) -> Self {
        self.record.enabled = Some(false);
        self
    }

    pub fn build(self) -> LogicalRouter {
        self.topo.snapshot.logical_routers.push(self.record.clone());
        self.record
    }
}

/// Current priority of every gateway chassis row of a router, keyed by
/// `<port>_<chassis>` row name.
pub fn priorities(client: &MemoryNbClient, router: &LogicalRouter) -> BTreeMap<String, i64> {
    let mut priorities = BTreeMap::new();
    for port in &router.ports {
        let port = client.logical_router_port(port).unwrap();
        for gc in &port.gateway_chassis {
            let gc = client.gateway_chassis(gc).unwrap();
            priorities.insert(gc.name, gc.priority);
        }
    }
    priorities
}
