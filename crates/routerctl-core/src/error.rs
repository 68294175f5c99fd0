//! Common error types for routerctl.
//!
//! Identifier parsing and record-name mapping errors shared across crates.

use thiserror::Error;

/// Errors that can occur when parsing identifiers or mapping record names.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input is not a valid UUID.
    #[error("invalid UUID format: {0}")]
    InvalidUuid(String),

    /// An identifier was empty.
    #[error("identifier must not be empty")]
    Empty,

    /// A record name does not carry the expected naming prefix.
    #[error("record name {name:?} does not start with {prefix:?}")]
    MissingPrefix {
        /// The record name that was inspected.
        name: String,
        /// The prefix that was expected.
        prefix: &'static str,
    },
}
