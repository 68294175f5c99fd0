//! Gateway failover by priority swap.
//!
//! A router's gateway port is hosted on whichever of its gateway chassis has
//! the highest priority. To move it, the engine swaps the priorities of the
//! highest and lowest ranked candidates in a single transaction and then
//! polls `hosting-chassis` until northd reports the new placement.
//!
//! The engine never writes `hosting-chassis` itself, and a swap that has
//! committed is not rolled back when convergence times out.
//!
//! With three or more candidates, draining nodes one after another can move
//! a router back onto a node drained earlier, since only the extremes swap.

use std::time::Duration;

use routerctl_core::{RouterUid, RowUuid};
use routerctl_store::{check_operation_results, GatewayChassis, NorthboundClient};
use tokio::time::{Instant, MissedTickBehavior};

use crate::config::FailoverConfig;
use crate::context::OpContext;
use crate::error::{ControlError, Result};
use crate::query::hosting_agent;
use crate::types::Router;

/// What a successful failover did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailoverReceipt {
    /// The router that moved.
    pub router: RouterUid,
    /// Chassis that held the highest priority before the swap.
    pub from_host: String,
    /// Chassis now hosting the router.
    pub to_host: String,
    /// `Gateway_Chassis` row demoted to the lowest priority.
    pub from_chassis: RowUuid,
    /// `Gateway_Chassis` row promoted to the highest priority.
    pub to_chassis: RowUuid,
    /// Time from commit until the new placement was observed.
    pub waited: Duration,
}

/// Moves routers between gateway chassis.
///
/// Holds only configuration and can be shared freely. Failing over the same
/// router from two tasks at once is not safe: the swap has no
/// compare-and-set, so callers must serialize per router.
#[derive(Debug, Clone, Default)]
pub struct FailoverEngine {
    config: FailoverConfig,
}

impl FailoverEngine {
    /// Create an engine with the given configuration.
    #[must_use]
    pub const fn new(config: FailoverConfig) -> Self {
        Self { config }
    }

    /// The engine's configuration.
    #[must_use]
    pub const fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// Move a router to its lowest-priority gateway chassis.
    ///
    /// # Errors
    ///
    /// - `ControlError::NoGatewayChassis` / `SingleGatewayChassis` /
    ///   `SwapUndetermined` if there is no distinct chassis to move to;
    ///   nothing is written in these cases
    /// - `ControlError::PortLookup` if a gateway port cannot be read
    /// - `ControlError::Transaction` if the swap is rejected
    /// - `ControlError::Interrupted` if the context finishes before the swap
    ///   commits
    /// - `ControlError::ConvergenceTimeout` if the context finishes after the
    ///   swap committed but before the router moved
    pub async fn failover<C>(
        &self,
        ctx: &OpContext,
        client: &C,
        router: &Router,
    ) -> Result<FailoverReceipt>
    where
        C: NorthboundClient + ?Sized,
    {
        let candidates = collect_candidates(ctx, client, router).await?;
        let (current, next) = pick_swap(&router.uid, candidates)?;

        tracing::info!(
            router = %router.uid,
            from = %current.chassis_name,
            to = %next.chassis_name,
            from_priority = current.priority,
            to_priority = next.priority,
            "Swapping gateway chassis priorities"
        );

        let operations = [
            GatewayChassis::priority_update(current.uuid, next.priority),
            GatewayChassis::priority_update(next.uuid, current.priority),
        ];
        let results = ctx
            .guard(client.transact(&operations))
            .await?
            .map_err(|source| ControlError::Transaction {
                router: router.uid.clone(),
                source,
            })?;
        check_operation_results(&results, &operations).map_err(|source| {
            ControlError::Transaction {
                router: router.uid.clone(),
                source,
            }
        })?;

        let waited = self
            .await_convergence(ctx, client, router, &next.chassis_name)
            .await?;

        tracing::info!(
            router = %router.uid,
            host = %next.chassis_name,
            waited_ms = u64::try_from(waited.as_millis()).unwrap_or(u64::MAX),
            "Router failed over"
        );

        Ok(FailoverReceipt {
            router: router.uid.clone(),
            from_host: current.chassis_name,
            to_host: next.chassis_name,
            from_chassis: current.uuid,
            to_chassis: next.uuid,
            waited,
        })
    }

    /// Poll until `hosting_agent` reports `expected` or the context is done.
    ///
    /// The first probe happens one interval after the call. Probe errors are
    /// expected while northd catches up and are only logged.
    async fn await_convergence<C>(
        &self,
        ctx: &OpContext,
        client: &C,
        router: &Router,
        expected: &str,
    ) -> Result<Duration>
    where
        C: NorthboundClient + ?Sized,
    {
        let started = Instant::now();
        let period = self
            .config
            .poll_interval
            .max(Duration::from_millis(1));
        let mut ticker = tokio::time::interval_at(started + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                reason = ctx.done() => {
                    tracing::warn!(
                        router = %router.uid,
                        expected_host = %expected,
                        reason = %reason,
                        "Gave up waiting for router to move"
                    );
                    return Err(ControlError::ConvergenceTimeout {
                        router: router.uid.clone(),
                        expected_host: expected.to_string(),
                        reason,
                    });
                }
                _ = ticker.tick() => {
                    match hosting_agent(ctx, client, router).await {
                        Ok(host) if host == expected => return Ok(started.elapsed()),
                        Ok(host) => {
                            tracing::debug!(
                                router = %router.uid,
                                host = %host,
                                expected_host = %expected,
                                "Router not moved yet"
                            );
                        }
                        Err(e) => {
                            tracing::debug!(
                                router = %router.uid,
                                error = %e,
                                "Convergence probe failed"
                            );
                        }
                    }
                }
            }
        }
    }
}

/// Gather the distinct gateway chassis referenced by a router's gateway
/// ports, in the order they are first referenced.
async fn collect_candidates<C>(
    ctx: &OpContext,
    client: &C,
    router: &Router,
) -> Result<Vec<GatewayChassis>>
where
    C: NorthboundClient + ?Sized,
{
    let mut referenced: Vec<RowUuid> = Vec::new();
    for port in router.gateway_ports() {
        let record = ctx
            .guard(client.get_logical_router_port(&port.internal_uuid))
            .await?
            .map_err(|source| ControlError::PortLookup {
                router: router.uid.clone(),
                port: port.internal_uuid,
                source,
            })?;
        for gc in record.gateway_chassis {
            if !referenced.contains(&gc) {
                referenced.push(gc);
            }
        }
    }

    if referenced.is_empty() {
        return Err(ControlError::NoGatewayChassis(router.uid.clone()));
    }

    let mut chassis =
        client.cached_gateway_chassis(&|gc: &GatewayChassis| referenced.contains(&gc.uuid))?;
    chassis.sort_by_key(|gc| referenced.iter().position(|uuid| *uuid == gc.uuid));
    Ok(chassis)
}

/// Pick the `(current, next)` pair to swap: highest and lowest priority.
fn pick_swap(
    router: &RouterUid,
    mut chassis: Vec<GatewayChassis>,
) -> Result<(GatewayChassis, GatewayChassis)> {
    if chassis.len() == 1 {
        return Err(ControlError::SingleGatewayChassis {
            router: router.clone(),
            chassis: chassis.remove(0).chassis_name,
        });
    }

    // Stable: among equal priorities the first referenced row stays first.
    chassis.sort_by_key(|gc| gc.priority);
    let (Some(next), Some(current)) = (chassis.first(), chassis.last()) else {
        return Err(ControlError::NoGatewayChassis(router.clone()));
    };

    if current.priority == next.priority {
        return Err(ControlError::SwapUndetermined {
            router: router.clone(),
            priority: current.priority,
        });
    }

    Ok((current.clone(), next.clone()))
}
