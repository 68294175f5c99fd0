//! Northbound database access for routerctl.
//!
//! This crate models the subset of the OVN northbound schema that routerctl
//! reads and writes, and defines the [`NorthboundClient`] trait through which
//! the control layer talks to the database.
//!
//! # Tables
//!
//! - `Logical_Router`: one row per Neutron router, named `neutron-<id>`
//! - `Logical_Router_Port`: router ports, with northd's `hosting-chassis`
//!   in their `status` map
//! - `Gateway_Chassis`: candidate chassis for a gateway port, with priorities
//!
//! # Example
//!
//! ```
//! use routerctl_store::{ControllerMode, MemoryNbClient, NbSnapshot, NorthboundClient};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MemoryNbClient::from_snapshot(NbSnapshot::default(), ControllerMode::Immediate);
//! let routers = client.list_logical_routers().await?;
//! assert!(routers.is_empty());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod memory;
pub mod ops;
pub mod records;
pub mod schema;
pub mod snapshot;

pub use error::{Result, StoreError};
pub use memory::{ControllerMode, MemoryNbClient};
pub use ops::{check_operation_results, Operation, OperationResult, Row};
pub use records::{GatewayChassis, LogicalRouter, LogicalRouterPort};
pub use schema::Table;
pub use snapshot::NbSnapshot;

use async_trait::async_trait;
use routerctl_core::RowUuid;

/// Predicate used to select rows from the local `Gateway_Chassis` cache.
pub type ChassisFilter<'a> = &'a (dyn Fn(&GatewayChassis) -> bool + Send + Sync);

/// Access to the OVN northbound database.
///
/// Implementations must be safe to share between tasks. Reads may be
/// served from a local replica of the database, but `transact` always goes
/// to the server and commits atomically.
#[async_trait]
pub trait NorthboundClient: Send + Sync {
    // =========================================================================
    // Reads
    // =========================================================================

    /// Fetch a `Logical_Router_Port` by row UUID.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the row doesn't exist, or a
    /// database error if the read fails.
    async fn get_logical_router_port(&self, uuid: &RowUuid) -> Result<LogicalRouterPort>;

    /// List every `Logical_Router` row.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_logical_routers(&self) -> Result<Vec<LogicalRouter>>;

    /// List the `Logical_Router` rows whose name equals `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn find_logical_routers_by_name(&self, name: &str) -> Result<Vec<LogicalRouter>>;

    /// Select `Gateway_Chassis` rows from the local cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the cache is unavailable.
    fn cached_gateway_chassis(&self, filter: ChassisFilter<'_>) -> Result<Vec<GatewayChassis>>;

    // =========================================================================
    // Writes
    // =========================================================================

    /// Submit a transaction and return one result per operation.
    ///
    /// Operation-level failures are reported in the results, not as an
    /// `Err`; pass them through [`check_operation_results`].
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Transaction` if the transaction could not be
    /// submitted at all.
    async fn transact(&self, operations: &[Operation]) -> Result<Vec<OperationResult>>;
}
