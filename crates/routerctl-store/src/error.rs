//! Error types for the northbound store layer.

use routerctl_core::RowUuid;
use thiserror::Error;

use crate::schema::Table;

/// A result type using `StoreError`.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur during northbound database operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested row was not found.
    #[error("{table} row {uuid} not found")]
    NotFound {
        /// Table that was queried.
        table: Table,
        /// Row that was requested.
        uuid: RowUuid,
    },

    /// The transaction could not be submitted or was rejected as a whole.
    #[error("transaction failed: {0}")]
    Transaction(String),

    /// A database or connection error occurred.
    #[error("database error: {0}")]
    Database(String),

    /// A snapshot could not be read or parsed.
    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl StoreError {
    /// Returns true if this error reports a missing row.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
