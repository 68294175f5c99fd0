//! Core types and utilities for routerctl.
//!
//! This crate provides the foundational types used throughout the workspace:
//!
//! - **Identifiers**: strongly-typed IDs for northbound rows and Neutron objects
//! - **Naming**: the mapping between Neutron IDs and northbound record names
//! - **Error types**: identifier parsing errors shared across crates
//!
//! # Example
//!
//! ```
//! use routerctl_core::{naming, RouterUid};
//!
//! let uid = naming::router_uid_from_name("neutron-266b4831").unwrap();
//! assert_eq!(uid, RouterUid::new("266b4831"));
//! assert_eq!(naming::router_record_name(&uid), "neutron-266b4831");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod ids;
pub mod naming;

pub use error::IdError;
pub use ids::{PortUid, RouterUid, RowUuid};
