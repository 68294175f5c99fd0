//! Router queries and gateway failover for OVN-backed Neutron routers.
//!
//! This crate is the only part of routerctl that reasons about northbound
//! database content. It turns raw records into [`Router`] values, resolves
//! which chassis hosts a router, and moves routers between gateway chassis.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      routerctl (CLI)                        │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       BatchFailover                         │
//! │               sequential, per-router deadline               │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      FailoverEngine                         │
//! │    ┌────────────────┐  ┌──────────┐  ┌─────────────────┐    │
//! │    │ Candidate      │  │ Priority │  │ Convergence     │    │
//! │    │ collection     │  │ swap     │  │ poll            │    │
//! │    └────────────────┘  └──────────┘  └─────────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │            query (get / list / hosting agent)               │
//! │                 convert (records → Router)                  │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    NorthboundClient                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```no_run
//! use std::time::Duration;
//! use routerctl_control::{query, FailoverConfig, FailoverEngine, OpContext};
//! use routerctl_core::RouterUid;
//! use routerctl_store::{ControllerMode, MemoryNbClient, NbSnapshot};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let snapshot = NbSnapshot::load("nb.yaml")?;
//! let client = MemoryNbClient::from_snapshot(snapshot, ControllerMode::Immediate);
//!
//! let ctx = OpContext::with_timeout(Duration::from_secs(30));
//! let router = query::get_by_uid(&ctx, &client, &RouterUid::new("266b4831")).await?;
//!
//! let engine = FailoverEngine::new(FailoverConfig::default());
//! let receipt = engine.failover(&ctx, &client, &router).await?;
//! println!("{} moved to {}", receipt.router, receipt.to_host);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod batch;
pub mod config;
pub mod context;
pub mod convert;
pub mod error;
pub mod failover;
pub mod query;
pub mod types;

#[cfg(test)]
mod testing;

pub use batch::{BatchFailover, BatchObserver, BatchReport, BatchTarget, NoopObserver, RouterOutcome};
pub use config::FailoverConfig;
pub use context::{DoneReason, OpContext};
pub use convert::convert;
pub use error::{ControlError, ErrorKind, Result};
pub use failover::{FailoverEngine, FailoverReceipt};
pub use types::{PortInfo, Router, RouterList, RouterStatus};
