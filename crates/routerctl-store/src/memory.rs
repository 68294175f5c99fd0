//! In-memory northbound database.
//!
//! [`MemoryNbClient`] keeps the three tables routerctl touches behind a
//! single lock and commits transactions atomically. It can also play the
//! part of northd: after a `Gateway_Chassis` change, every port referencing
//! that chassis gets its `hosting-chassis` status recomputed from the
//! highest-priority candidate, either immediately or after a delay measured
//! on the tokio clock (so paused-time tests can step through convergence).

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use routerctl_core::RowUuid;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Result, StoreError};
use crate::ops::{Operation, OperationResult, Row};
use crate::records::{GatewayChassis, LogicalRouter, LogicalRouterPort};
use crate::schema::{column, status, Table};
use crate::snapshot::NbSnapshot;
use crate::{ChassisFilter, NorthboundClient};

/// How the simulated northd reacts to `Gateway_Chassis` changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerMode {
    /// Status is never recomputed.
    Disabled,
    /// Status is recomputed as part of the commit.
    #[default]
    Immediate,
    /// Status is recomputed once the delay has elapsed.
    Delayed(Duration),
}

#[derive(Debug, Default)]
struct Tables {
    routers: BTreeMap<RowUuid, LogicalRouter>,
    ports: BTreeMap<RowUuid, LogicalRouterPort>,
    chassis: BTreeMap<RowUuid, GatewayChassis>,
    pending: Vec<PendingStatus>,
}

#[derive(Debug)]
struct PendingStatus {
    port: RowUuid,
    ready_at: Instant,
}

#[derive(Debug, Default)]
struct Faults {
    next_transaction: Option<String>,
    port_read_failures: usize,
}

/// Validated column changes for one `Gateway_Chassis` row.
#[derive(Debug, Default)]
struct ChassisPatch {
    priority: Option<i64>,
    chassis_name: Option<String>,
}

impl ChassisPatch {
    fn parse(row: &Row) -> std::result::Result<Self, String> {
        let mut patch = Self::default();
        for (name, value) in row {
            match name.as_str() {
                column::PRIORITY => {
                    let priority = value
                        .as_i64()
                        .ok_or_else(|| format!("{name}: expected integer, got {value}"))?;
                    patch.priority = Some(priority);
                }
                column::CHASSIS_NAME => {
                    let chassis_name = value
                        .as_str()
                        .ok_or_else(|| format!("{name}: expected string, got {value}"))?;
                    patch.chassis_name = Some(chassis_name.to_string());
                }
                other => return Err(format!("unknown column {other}")),
            }
        }
        Ok(patch)
    }

    fn apply(self, gc: &mut GatewayChassis) {
        if let Some(priority) = self.priority {
            gc.priority = priority;
        }
        if let Some(chassis_name) = self.chassis_name {
            gc.chassis_name = chassis_name;
        }
    }
}

impl Tables {
    /// The chassis northd would elect for a port: the highest priority
    /// candidate, first one wins on ties.
    fn elect(&self, port: &LogicalRouterPort) -> Option<String> {
        let mut selected: Option<&GatewayChassis> = None;
        for gc in port
            .gateway_chassis
            .iter()
            .filter_map(|uuid| self.chassis.get(uuid))
        {
            match selected {
                Some(current) if gc.priority <= current.priority => {}
                _ => selected = Some(gc),
            }
        }
        selected.map(|gc| gc.chassis_name.clone())
    }

    fn realize(&mut self, port_uuid: &RowUuid) {
        let Some(port) = self.ports.get(port_uuid) else {
            return;
        };
        let elected = self.elect(port);
        let Some(port) = self.ports.get_mut(port_uuid) else {
            return;
        };
        match elected {
            Some(chassis) => {
                debug!(port = %port.name, chassis = %chassis, "Hosting chassis elected");
                port.status
                    .insert(status::HOSTING_CHASSIS.to_string(), chassis);
            }
            None => {
                port.status.remove(status::HOSTING_CHASSIS);
            }
        }
    }

    fn ports_referencing(&self, chassis: &[RowUuid]) -> Vec<RowUuid> {
        self.ports
            .values()
            .filter(|port| port.gateway_chassis.iter().any(|gc| chassis.contains(gc)))
            .map(|port| port.uuid)
            .collect()
    }

    fn settle(&mut self, now: Instant) {
        if self.pending.is_empty() {
            return;
        }
        let (due, waiting): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|pending| pending.ready_at <= now);
        self.pending = waiting;
        for pending in due {
            self.realize(&pending.port);
        }
    }
}

/// An in-memory northbound database with an optional northd simulation.
#[derive(Debug, Default)]
pub struct MemoryNbClient {
    tables: RwLock<Tables>,
    controller: ControllerMode,
    faults: Mutex<Faults>,
    transactions: AtomicUsize,
}

impl MemoryNbClient {
    /// Create an empty database.
    #[must_use]
    pub fn new(controller: ControllerMode) -> Self {
        Self {
            controller,
            ..Self::default()
        }
    }

    /// Create a database from a snapshot.
    ///
    /// Unless the controller is disabled, every port's `hosting-chassis` is
    /// brought in line with its gateway chassis priorities on load.
    #[must_use]
    pub fn from_snapshot(snapshot: NbSnapshot, controller: ControllerMode) -> Self {
        let client = Self::new(controller);
        {
            let mut tables = client.tables.write();
            for router in snapshot.logical_routers {
                tables.routers.insert(router.uuid, router);
            }
            for port in snapshot.logical_router_ports {
                tables.ports.insert(port.uuid, port);
            }
            for gc in snapshot.gateway_chassis {
                tables.chassis.insert(gc.uuid, gc);
            }
        }
        if controller != ControllerMode::Disabled {
            client.reconcile();
        }
        client
    }

    /// Insert or replace a `Logical_Router` row.
    pub fn insert_logical_router(&self, router: LogicalRouter) {
        self.tables.write().routers.insert(router.uuid, router);
    }

    /// Insert or replace a `Logical_Router_Port` row.
    pub fn insert_logical_router_port(&self, port: LogicalRouterPort) {
        self.tables.write().ports.insert(port.uuid, port);
    }

    /// Insert or replace a `Gateway_Chassis` row.
    pub fn insert_gateway_chassis(&self, gc: GatewayChassis) {
        self.tables.write().chassis.insert(gc.uuid, gc);
    }

    /// Recompute `hosting-chassis` for every port with gateway chassis.
    pub fn reconcile(&self) {
        let mut tables = self.tables.write();
        let ports: Vec<RowUuid> = tables
            .ports
            .values()
            .filter(|port| !port.gateway_chassis.is_empty())
            .map(|port| port.uuid)
            .collect();
        for port in &ports {
            tables.realize(port);
        }
    }

    /// Overwrite a port's `hosting-chassis` status, bypassing the controller.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the port doesn't exist.
    pub fn set_hosting_chassis(&self, port: &RowUuid, chassis: &str) -> Result<()> {
        let mut tables = self.tables.write();
        let row = tables.ports.get_mut(port).ok_or(StoreError::NotFound {
            table: Table::LogicalRouterPort,
            uuid: *port,
        })?;
        row.status
            .insert(status::HOSTING_CHASSIS.to_string(), chassis.to_string());
        Ok(())
    }

    /// Read a `Gateway_Chassis` row directly.
    #[must_use]
    pub fn gateway_chassis(&self, uuid: &RowUuid) -> Option<GatewayChassis> {
        self.tables.read().chassis.get(uuid).cloned()
    }

    /// Read a `Logical_Router_Port` row directly, applying any due status updates.
    #[must_use]
    pub fn logical_router_port(&self, uuid: &RowUuid) -> Option<LogicalRouterPort> {
        self.settle();
        self.tables.read().ports.get(uuid).cloned()
    }

    /// Reject the next transaction with an operation-level error.
    ///
    /// Nothing from the rejected transaction is applied.
    pub fn fail_next_transaction(&self, reason: impl Into<String>) {
        self.faults.lock().next_transaction = Some(reason.into());
    }

    /// Fail the next `count` port reads with a database error.
    pub fn fail_port_reads(&self, count: usize) {
        self.faults.lock().port_read_failures = count;
    }

    /// Number of transactions submitted so far, including rejected ones.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.transactions.load(Ordering::SeqCst)
    }

    /// Export the current contents as a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> NbSnapshot {
        self.settle();
        let tables = self.tables.read();
        NbSnapshot {
            logical_routers: tables.routers.values().cloned().collect(),
            logical_router_ports: tables.ports.values().cloned().collect(),
            gateway_chassis: tables.chassis.values().cloned().collect(),
        }
    }

    fn settle(&self) {
        let now = Instant::now();
        let mut tables = self.tables.write();
        tables.settle(now);
    }

    fn schedule_status(&self, tables: &mut Tables, chassis: &[RowUuid]) {
        let ports = tables.ports_referencing(chassis);
        match self.controller {
            ControllerMode::Disabled => {}
            ControllerMode::Immediate => {
                for port in &ports {
                    tables.realize(port);
                }
            }
            ControllerMode::Delayed(delay) => {
                let ready_at = Instant::now() + delay;
                tables.pending.retain(|pending| !ports.contains(&pending.port));
                tables
                    .pending
                    .extend(ports.into_iter().map(|port| PendingStatus { port, ready_at }));
            }
        }
    }
}

#[async_trait]
impl NorthboundClient for MemoryNbClient {
    async fn get_logical_router_port(&self, uuid: &RowUuid) -> Result<LogicalRouterPort> {
        {
            let mut faults = self.faults.lock();
            if faults.port_read_failures > 0 {
                faults.port_read_failures -= 1;
                return Err(StoreError::Database(format!(
                    "injected read failure for port {uuid}"
                )));
            }
        }

        self.logical_router_port(uuid).ok_or(StoreError::NotFound {
            table: Table::LogicalRouterPort,
            uuid: *uuid,
        })
    }

    async fn list_logical_routers(&self) -> Result<Vec<LogicalRouter>> {
        Ok(self.tables.read().routers.values().cloned().collect())
    }

    async fn find_logical_routers_by_name(&self, name: &str) -> Result<Vec<LogicalRouter>> {
        Ok(self
            .tables
            .read()
            .routers
            .values()
            .filter(|router| router.name == name)
            .cloned()
            .collect())
    }

    fn cached_gateway_chassis(&self, filter: ChassisFilter<'_>) -> Result<Vec<GatewayChassis>> {
        Ok(self
            .tables
            .read()
            .chassis
            .values()
            .filter(|gc| filter(gc))
            .cloned()
            .collect())
    }

    async fn transact(&self, operations: &[Operation]) -> Result<Vec<OperationResult>> {
        self.transactions.fetch_add(1, Ordering::SeqCst);

        let mut results = vec![OperationResult::default(); operations.len()];

        if let Some(reason) = self.faults.lock().next_transaction.take() {
            warn!(reason = %reason, "Rejecting transaction");
            if let Some(first) = results.first_mut() {
                *first = OperationResult::failed("constraint violation", reason);
            }
            return Ok(results);
        }

        let mut tables = self.tables.write();
        tables.settle(Instant::now());

        let mut patches = Vec::with_capacity(operations.len());
        for (index, op) in operations.iter().enumerate() {
            let Operation::Update { table, uuid, row } = op;
            if *table != Table::GatewayChassis {
                results[index] =
                    OperationResult::failed("not supported", format!("updates to {table}"));
                return Ok(results);
            }
            match ChassisPatch::parse(row) {
                Ok(patch) => patches.push((*uuid, patch)),
                Err(details) => {
                    results[index] = OperationResult::failed("constraint violation", details);
                    return Ok(results);
                }
            }
        }

        let mut touched = Vec::with_capacity(patches.len());
        for (index, (uuid, patch)) in patches.into_iter().enumerate() {
            if let Some(gc) = tables.chassis.get_mut(&uuid) {
                patch.apply(gc);
                touched.push(uuid);
                results[index] = OperationResult::updated(1);
            } else {
                results[index] = OperationResult::updated(0);
            }
        }

        debug!(operations = operations.len(), "Transaction committed");
        self.schedule_status(&mut tables, &touched);

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::check_operation_results;

    struct Fixture {
        client: MemoryNbClient,
        port: RowUuid,
        gc_a: RowUuid,
        gc_b: RowUuid,
    }

    fn fixture(controller: ControllerMode) -> Fixture {
        let gc_a = RowUuid::generate();
        let gc_b = RowUuid::generate();
        let port = RowUuid::generate();
        let snapshot = NbSnapshot {
            logical_routers: vec![LogicalRouter {
                uuid: RowUuid::generate(),
                name: "neutron-r1".to_string(),
                external_ids: BTreeMap::new(),
                ports: vec![port],
                enabled: None,
            }],
            logical_router_ports: vec![LogicalRouterPort {
                uuid: port,
                name: "lrp-p1".to_string(),
                external_ids: BTreeMap::new(),
                gateway_chassis: vec![gc_a, gc_b],
                status: BTreeMap::new(),
                networks: vec!["172.24.4.10/24".to_string()],
            }],
            gateway_chassis: vec![
                GatewayChassis {
                    uuid: gc_a,
                    name: "lrp-p1_node1".to_string(),
                    chassis_name: "node1".to_string(),
                    priority: 2,
                },
                GatewayChassis {
                    uuid: gc_b,
                    name: "lrp-p1_node2".to_string(),
                    chassis_name: "node2".to_string(),
                    priority: 1,
                },
            ],
        };
        Fixture {
            client: MemoryNbClient::from_snapshot(snapshot, controller),
            port,
            gc_a,
            gc_b,
        }
    }

    fn swap(f: &Fixture) -> Vec<Operation> {
        vec![
            GatewayChassis::priority_update(f.gc_a, 1),
            GatewayChassis::priority_update(f.gc_b, 2),
        ]
    }

    fn hosting(f: &Fixture) -> Option<String> {
        f.client
            .logical_router_port(&f.port)
            .and_then(|port| port.hosting_chassis().map(str::to_string))
    }

    #[test]
    fn snapshot_load_elects_hosting_chassis() {
        let f = fixture(ControllerMode::Immediate);
        assert_eq!(hosting(&f).as_deref(), Some("node1"));
    }

    #[test]
    fn disabled_controller_leaves_status_alone() {
        let f = fixture(ControllerMode::Disabled);
        assert_eq!(hosting(&f), None);
    }

    #[tokio::test]
    async fn immediate_controller_follows_priorities() {
        let f = fixture(ControllerMode::Immediate);
        let ops = swap(&f);
        let results = f.client.transact(&ops).await.unwrap();
        check_operation_results(&results, &ops).unwrap();

        assert_eq!(f.client.gateway_chassis(&f.gc_a).unwrap().priority, 1);
        assert_eq!(f.client.gateway_chassis(&f.gc_b).unwrap().priority, 2);
        assert_eq!(hosting(&f).as_deref(), Some("node2"));
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_controller_converges_after_delay() {
        let f = fixture(ControllerMode::Delayed(Duration::from_secs(2)));
        f.client.transact(&swap(&f)).await.unwrap();

        assert_eq!(hosting(&f).as_deref(), Some("node1"));
        tokio::time::advance(Duration::from_millis(1999)).await;
        assert_eq!(hosting(&f).as_deref(), Some("node1"));
        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(hosting(&f).as_deref(), Some("node2"));
    }

    #[tokio::test]
    async fn rejected_transaction_applies_nothing() {
        let f = fixture(ControllerMode::Immediate);
        f.client.fail_next_transaction("priority out of range");
        let ops = swap(&f);
        let results = f.client.transact(&ops).await.unwrap();

        assert!(check_operation_results(&results, &ops).is_err());
        assert_eq!(f.client.gateway_chassis(&f.gc_a).unwrap().priority, 2);
        assert_eq!(f.client.transaction_count(), 1);

        // Only the next transaction is affected.
        let results = f.client.transact(&ops).await.unwrap();
        assert!(check_operation_results(&results, &ops).is_ok());
    }

    #[tokio::test]
    async fn invalid_column_rolls_back_whole_transaction() {
        let f = fixture(ControllerMode::Immediate);
        let mut bad = Row::new();
        bad.insert("priority".to_string(), serde_json::Value::from("high"));
        let ops = vec![
            GatewayChassis::priority_update(f.gc_a, 7),
            Operation::Update {
                table: Table::GatewayChassis,
                uuid: f.gc_b,
                row: bad,
            },
        ];
        let results = f.client.transact(&ops).await.unwrap();

        assert!(check_operation_results(&results, &ops).is_err());
        assert_eq!(f.client.gateway_chassis(&f.gc_a).unwrap().priority, 2);
    }

    #[tokio::test]
    async fn update_of_missing_row_counts_zero() {
        let f = fixture(ControllerMode::Immediate);
        let ops = vec![GatewayChassis::priority_update(RowUuid::generate(), 1)];
        let results = f.client.transact(&ops).await.unwrap();
        assert_eq!(results[0].count, Some(0));
    }

    #[tokio::test]
    async fn port_read_faults_are_consumed() {
        let f = fixture(ControllerMode::Immediate);
        f.client.fail_port_reads(1);

        let err = f.client.get_logical_router_port(&f.port).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert!(f.client.get_logical_router_port(&f.port).await.is_ok());
    }

    #[tokio::test]
    async fn missing_port_is_not_found() {
        let f = fixture(ControllerMode::Immediate);
        let err = f
            .client
            .get_logical_router_port(&RowUuid::generate())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn cached_chassis_filter() {
        let f = fixture(ControllerMode::Immediate);
        let gc_a = f.gc_a;
        let found = f
            .client
            .cached_gateway_chassis(&move |gc: &GatewayChassis| gc.uuid == gc_a)
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].chassis_name, "node1");
    }
}
