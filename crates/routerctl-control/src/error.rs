//! Error types for router queries and failover.
//!
//! Every variant names the router it concerns so that batch reports and
//! CLI output stay readable without extra context.

use routerctl_core::{IdError, PortUid, RouterUid, RowUuid};
use routerctl_store::StoreError;
use thiserror::Error;

use crate::context::DoneReason;

/// A result type using `ControlError`.
pub type Result<T> = std::result::Result<T, ControlError>;

/// Broad classification of a [`ControlError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A router, port or chassis does not exist.
    NotFound,
    /// The database content is inconsistent with itself.
    DataConsistency,
    /// The router is not in a state where failover makes sense.
    PreconditionFailed,
    /// The database rejected a transaction.
    TransactionFailure,
    /// A deadline elapsed.
    Timeout,
    /// The operation was cancelled.
    Cancelled,
    /// Some routers in a batch failed.
    Partial,
    /// The database could not be reached or read.
    Unavailable,
}

/// Errors that can occur in router query and failover operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// No router with this UID exists.
    #[error("router with UUID \"{0}\" not found")]
    RouterNotFound(RouterUid),

    /// A `Logical_Router` name does not follow the Neutron convention.
    #[error("invalid router record {name}: {source}")]
    InvalidRouterName {
        /// The record name.
        name: String,
        /// Why it was rejected.
        #[source]
        source: IdError,
    },

    /// A port referenced by a router could not be read.
    #[error("failed to read port {port} of router {router}: {source}")]
    PortLookup {
        /// The router being read.
        router: RouterUid,
        /// The referenced port row.
        port: RowUuid,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },

    /// The router's gateway ports reference no gateway chassis.
    #[error("no gateway chassis found for router {0}")]
    NoGatewayChassis(RouterUid),

    /// The router has a single gateway chassis, so there is nowhere to move to.
    #[error("router {router} has only one gateway chassis ({chassis}), cannot failover")]
    SingleGatewayChassis {
        /// The router.
        router: RouterUid,
        /// The only candidate.
        chassis: String,
    },

    /// The highest and lowest priority candidates cannot be told apart.
    #[error("cannot determine failover target for router {router}: all gateway chassis have priority {priority}")]
    SwapUndetermined {
        /// The router.
        router: RouterUid,
        /// The shared priority.
        priority: i64,
    },

    /// A gateway port carries no `hosting-chassis` status.
    #[error("gateway port {port} of router {router} has no hosting-chassis status")]
    HostingChassisMissing {
        /// The router.
        router: RouterUid,
        /// The port without status.
        port: PortUid,
    },

    /// Gateway ports disagree on the hosting chassis.
    #[error("gateway ports of router {router} report different hosting chassis: {hosts:?}")]
    HostingChassisConflict {
        /// The router.
        router: RouterUid,
        /// Distinct values reported, in port order.
        hosts: Vec<String>,
    },

    /// No hosting chassis could be determined.
    #[error("no hosting chassis found for router {0}")]
    NoHostingChassis(RouterUid),

    /// The priority swap transaction failed.
    #[error("failover transaction for router {router} failed: {source}")]
    Transaction {
        /// The router.
        router: RouterUid,
        /// The underlying store error.
        #[source]
        source: StoreError,
    },

    /// The swap committed but the router did not move in time.
    #[error("timeout waiting for router {router} to move to {expected_host}: {reason}")]
    ConvergenceTimeout {
        /// The router.
        router: RouterUid,
        /// The chassis the router should have moved to.
        expected_host: String,
        /// Whether the deadline passed or the operation was cancelled.
        reason: DoneReason,
    },

    /// The operation context finished while a database call was in flight.
    #[error("operation interrupted: {reason}")]
    Interrupted {
        /// Whether the deadline passed or the operation was cancelled.
        reason: DoneReason,
    },

    /// Some routers in a batch failed.
    #[error("{failed} router(s) failed to failover")]
    BatchIncomplete {
        /// Number of failed routers.
        failed: usize,
        /// Number of routers attempted.
        total: usize,
    },

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

impl ControlError {
    /// Classify this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::RouterNotFound(_) | Self::NoGatewayChassis(_) => ErrorKind::NotFound,
            Self::PortLookup { source, .. } | Self::Store(source) => {
                if source.is_not_found() {
                    ErrorKind::NotFound
                } else {
                    ErrorKind::Unavailable
                }
            }
            Self::InvalidRouterName { .. }
            | Self::HostingChassisMissing { .. }
            | Self::HostingChassisConflict { .. }
            | Self::NoHostingChassis(_) => ErrorKind::DataConsistency,
            Self::SingleGatewayChassis { .. } | Self::SwapUndetermined { .. } => {
                ErrorKind::PreconditionFailed
            }
            Self::Transaction { .. } => ErrorKind::TransactionFailure,
            Self::ConvergenceTimeout { reason, .. } | Self::Interrupted { reason } => match reason {
                DoneReason::DeadlineExceeded => ErrorKind::Timeout,
                DoneReason::Cancelled => ErrorKind::Cancelled,
            },
            Self::BatchIncomplete { .. } => ErrorKind::Partial,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    ///
    /// A convergence timeout is not retriable: the swap already committed,
    /// and running the failover again would swap the priorities back.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::Unavailable | ErrorKind::TransactionFailure
        ) || matches!(
            self,
            Self::Interrupted {
                reason: DoneReason::DeadlineExceeded
            }
        )
    }
}
