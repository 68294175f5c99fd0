//! Transaction operations and result checking.
//!
//! A transaction is a list of [`Operation`]s committed atomically. The
//! database answers with one [`OperationResult`] per operation, followed by
//! an extra result carrying the commit error when the transaction as a
//! whole was rejected.

use std::collections::BTreeMap;
use std::fmt;

use routerctl_core::RowUuid;
use serde::Serialize;

use crate::error::{Result, StoreError};
use crate::schema::Table;

/// Column values to write, keyed by column name.
pub type Row = BTreeMap<String, serde_json::Value>;

/// A single operation within a transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Operation {
    /// Update the given columns of one row, selected by UUID.
    Update {
        /// Target table.
        table: Table,
        /// Target row.
        #[serde(rename = "where")]
        uuid: RowUuid,
        /// New column values.
        row: Row,
    },
}

impl Operation {
    /// Short name of the operation kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Update { .. } => "update",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Update { table, uuid, .. } => write!(f, "update {table} {uuid}"),
        }
    }
}

/// The database's answer to one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    /// Rows affected, for updates.
    pub count: Option<u64>,
    /// Error tag, if the operation failed.
    pub error: Option<String>,
    /// Human-readable error details.
    pub details: Option<String>,
}

impl OperationResult {
    /// A successful result affecting `count` rows.
    #[must_use]
    pub const fn updated(count: u64) -> Self {
        Self {
            count: Some(count),
            error: None,
            details: None,
        }
    }

    /// A failed result.
    #[must_use]
    pub fn failed(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            count: None,
            error: Some(error.into()),
            details: Some(details.into()),
        }
    }

    fn describe_error(&self) -> Option<String> {
        self.error.as_ref().map(|error| match &self.details {
            Some(details) if !details.is_empty() => format!("{error}: {details}"),
            _ => error.clone(),
        })
    }
}

/// Validate the results of a transaction against the operations submitted.
///
/// # Errors
///
/// Returns [`StoreError::Transaction`] if fewer results than operations were
/// returned, if any result carries an error (including the trailing commit
/// error), or if an update matched no rows.
pub fn check_operation_results(results: &[OperationResult], operations: &[Operation]) -> Result<()> {
    if results.len() < operations.len() {
        return Err(StoreError::Transaction(format!(
            "expected {} results, got {}",
            operations.len(),
            results.len()
        )));
    }

    for (index, result) in results.iter().enumerate() {
        let Some(error) = result.describe_error() else {
            continue;
        };
        return Err(match operations.get(index) {
            Some(op) => StoreError::Transaction(format!("operation {index} ({op}) failed: {error}")),
            None => StoreError::Transaction(format!("commit failed: {error}")),
        });
    }

    for (index, (result, op)) in results.iter().zip(operations).enumerate() {
        if matches!(op, Operation::Update { .. }) && result.count == Some(0) {
            return Err(StoreError::Transaction(format!(
                "operation {index} ({op}) matched no rows"
            )));
        }
    }

    Ok(())
}
