//! Batch failover.
//!
//! Runs the failover engine over a set of routers one at a time. Each
//! router gets its own deadline, bounded by the batch context; a failure
//! is recorded and the batch moves on to the next router.

use routerctl_core::RouterUid;
use routerctl_store::NorthboundClient;

use crate::config::FailoverConfig;
use crate::context::OpContext;
use crate::error::{ControlError, Result};
use crate::failover::{FailoverEngine, FailoverReceipt};
use crate::query;
use crate::types::Router;

/// Which routers a batch covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchTarget {
    /// Every router in the database.
    All,
    /// The given routers, in order. Duplicates are processed once.
    Routers(Vec<RouterUid>),
}

/// The result of failing over one router.
#[derive(Debug)]
pub struct RouterOutcome {
    /// The router as it was resolved before the failover.
    pub router: Router,
    /// The receipt, or why the failover failed.
    pub result: Result<FailoverReceipt>,
}

impl RouterOutcome {
    /// Whether the failover succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.result.is_ok()
    }
}

/// Progress callbacks for a running batch.
///
/// Both methods default to doing nothing.
pub trait BatchObserver: Send + Sync {
    /// Called before a router's failover starts. `index` is zero-based.
    fn on_start(&self, router: &Router, index: usize, total: usize) {
        let _ = (router, index, total);
    }

    /// Called after a router's failover finishes.
    fn on_outcome(&self, outcome: &RouterOutcome) {
        let _ = outcome;
    }
}

/// An observer that ignores all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl BatchObserver for NoopObserver {}

/// Outcomes of a batch, in processing order.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// One entry per router attempted.
    pub outcomes: Vec<RouterOutcome>,
}

impl BatchReport {
    /// Number of routers attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of routers that failed over.
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    /// Number of routers that did not fail over.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }

    /// Whether every router failed over.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(RouterOutcome::is_success)
    }

    /// The failed outcomes.
    pub fn failures(&self) -> impl Iterator<Item = &RouterOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }

    /// Turn the report into an error if any router failed.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::BatchIncomplete` if any router failed.
    pub fn into_result(self) -> Result<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(ControlError::BatchIncomplete {
                failed: self.failed(),
                total: self.total(),
            })
        }
    }
}

/// Fails over a set of routers sequentially.
#[derive(Debug, Clone, Default)]
pub struct BatchFailover {
    engine: FailoverEngine,
}

impl BatchFailover {
    /// Create a batch runner with the given configuration.
    #[must_use]
    pub const fn new(config: FailoverConfig) -> Self {
        Self {
            engine: FailoverEngine::new(config),
        }
    }

    /// The engine used for each router.
    #[must_use]
    pub const fn engine(&self) -> &FailoverEngine {
        &self.engine
    }

    /// Fail over every router in `target`.
    ///
    /// Routers are resolved from a single listing before anything is
    /// written. Individual failures are recorded in the report, which is
    /// returned even when some routers failed; use
    /// [`BatchReport::into_result`] to turn that into an error.
    ///
    /// # Errors
    ///
    /// Returns `ControlError::RouterNotFound` if a requested router does not
    /// exist, or any error from [`query::list`]. No router has been touched
    /// in either case.
    pub async fn run<C, O>(
        &self,
        ctx: &OpContext,
        client: &C,
        target: &BatchTarget,
        observer: &O,
    ) -> Result<BatchReport>
    where
        C: NorthboundClient + ?Sized,
        O: BatchObserver + ?Sized,
    {
        let routers = resolve_targets(ctx, client, target).await?;
        let total = routers.len();
        let timeout = self.engine.config().router_timeout;

        tracing::info!(routers = total, "Starting batch failover");

        let mut report = BatchReport {
            outcomes: Vec::with_capacity(total),
        };
        for (index, router) in routers.into_iter().enumerate() {
            observer.on_start(&router, index, total);

            let router_ctx = ctx.child_with_timeout(timeout);
            let result = self.engine.failover(&router_ctx, client, &router).await;
            if let Err(e) = &result {
                tracing::warn!(router = %router.uid, error = %e, "Router failover failed");
            }

            let outcome = RouterOutcome { router, result };
            observer.on_outcome(&outcome);
            report.outcomes.push(outcome);
        }

        tracing::info!(
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Batch failover complete"
        );
        Ok(report)
    }
}

async fn resolve_targets<C>(ctx: &OpContext, client: &C, target: &BatchTarget) -> Result<Vec<Router>>
where
    C: NorthboundClient + ?Sized,
{
    let list = query::list(ctx, client).await?;

    match target {
        BatchTarget::All => Ok(list.items),
        BatchTarget::Routers(uids) => {
            let mut routers: Vec<Router> = Vec::with_capacity(uids.len());
            for uid in uids {
                if routers.iter().any(|router| &router.uid == uid) {
                    tracing::debug!(router = %uid, "Ignoring duplicate router");
                    continue;
                }
                let router = list
                    .get(uid)
                    .ok_or_else(|| ControlError::RouterNotFound(uid.clone()))?;
                routers.push(router.clone());
            }
            Ok(routers)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    use crate::testing::{priorities, Topology};
    use routerctl_store::ControllerMode;
    use tokio::time::Instant;

    fn uids(list: &[&str]) -> BatchTarget {
        BatchTarget::Routers(list.iter().map(|uid| RouterUid::new(*uid)).collect())
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<String>>,
    }

    impl BatchObserver for Recorder {
        fn on_start(&self, router: &Router, index: usize, total: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("start {} {}/{}", router.uid, index + 1, total));
        }

        fn on_outcome(&self, outcome: &RouterOutcome) {
            let status = if outcome.is_success() { "ok" } else { "failed" };
            self.events
                .lock()
                .unwrap()
                .push(format!("{} {}", status, outcome.router.uid));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn partial_failure_continues() {
        let mut topo = Topology::new();
        topo.router("x", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        topo.router("y", None).gateway(&[("node1", 1)]).build();
        topo.router("z", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        let client = topo.client();
        let recorder = Recorder::default();

        let report = BatchFailover::default()
            .run(&OpContext::background(), &client, &uids(&["x", "y", "z"]), &recorder)
            .await
            .unwrap();

        assert_eq!(report.succeeded(), 2);
        assert_eq!(report.failed(), 1);
        let failed: Vec<_> = report.failures().map(|o| o.router.uid.as_str()).collect();
        assert_eq!(failed, ["y"]);
        assert_eq!(
            *recorder.events.lock().unwrap(),
            [
                "start x 1/3",
                "ok x",
                "start y 2/3",
                "failed y",
                "start z 3/3",
                "ok z"
            ]
        );

        let err = report.into_result().unwrap_err();
        assert!(matches!(
            err,
            ControlError::BatchIncomplete {
                failed: 1,
                total: 3
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn unknown_router_aborts_before_any_failover() {
        let mut topo = Topology::new();
        let x = topo.router("x", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        let client = topo.client();
        let before = priorities(&client, &x);

        let err = BatchFailover::default()
            .run(&OpContext::background(), &client, &uids(&["x", "missing"]), &NoopObserver)
            .await
            .unwrap_err();

        assert!(matches!(err, ControlError::RouterNotFound(uid) if uid.as_str() == "missing"));
        assert_eq!(client.transaction_count(), 0);
        assert_eq!(priorities(&client, &x), before);
    }

    #[tokio::test(start_paused = true)]
    async fn huge_router_timeout_means_no_deadline() {
        let mut topo = Topology::new();
        topo.router("x", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        let client = topo.client();
        let config = FailoverConfig::default().with_router_timeout(Duration::from_secs(u64::MAX));

        let report = BatchFailover::new(config)
            .run(&OpContext::background(), &client, &uids(&["x"]), &NoopObserver)
            .await
            .unwrap();

        assert!(report.is_success());
        assert_eq!(report.outcomes[0].result.as_ref().unwrap().to_host, "node2");
    }

    #[tokio::test(start_paused = true)]
    async fn all_routers_in_uid_order() {
        let mut topo = Topology::new();
        for uid in ["c", "a", "b"] {
            topo.router(uid, None).gateway(&[("node1", 2), ("node2", 1)]).build();
        }
        let client = topo.client();

        let report = BatchFailover::default()
            .run(&OpContext::background(), &client, &BatchTarget::All, &NoopObserver)
            .await
            .unwrap()
            .into_result()
            .unwrap();

        let order: Vec<_> = report.outcomes.iter().map(|o| o.router.uid.as_str()).collect();
        assert_eq!(order, ["a", "b", "c"]);
        for outcome in &report.outcomes {
            assert_eq!(outcome.result.as_ref().unwrap().to_host, "node2");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn duplicates_processed_once() {
        let mut topo = Topology::new();
        topo.router("x", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        let client = topo.client();

        let report = BatchFailover::default()
            .run(&OpContext::background(), &client, &uids(&["x", "x"]), &NoopObserver)
            .await
            .unwrap();

        assert_eq!(report.total(), 1);
        assert_eq!(client.transaction_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn per_router_timeout() {
        let mut topo = Topology::with_controller(ControllerMode::Delayed(Duration::from_secs(60)));
        topo.router("x", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        topo.router("y", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        let client = topo.client();
        let batch = BatchFailover::new(
            FailoverConfig::default().with_router_timeout(Duration::from_secs(2)),
        );
        let started = Instant::now();

        let report = batch
            .run(&OpContext::background(), &client, &BatchTarget::All, &NoopObserver)
            .await
            .unwrap();

        assert_eq!(report.failed(), 2);
        assert_eq!(started.elapsed(), Duration::from_secs(4));
        for outcome in &report.outcomes {
            assert!(matches!(
                outcome.result,
                Err(ControlError::ConvergenceTimeout { .. })
            ));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn parent_deadline_bounds_routers() {
        let mut topo = Topology::with_controller(ControllerMode::Delayed(Duration::from_secs(60)));
        topo.router("x", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        topo.router("y", None).gateway(&[("node1", 2), ("node2", 1)]).build();
        let client = topo.client();
        let ctx = OpContext::with_timeout(Duration::from_secs(3));
        let started = Instant::now();

        let report = BatchFailover::default()
            .run(&ctx, &client, &BatchTarget::All, &NoopObserver)
            .await
            .unwrap();

        // The first router uses up the whole batch deadline; the second is
        // interrupted before it writes anything.
        assert_eq!(started.elapsed(), Duration::from_secs(3));
        assert!(matches!(
            report.outcomes[0].result,
            Err(ControlError::ConvergenceTimeout { .. })
        ));
        assert!(matches!(
            report.outcomes[1].result,
            Err(ControlError::Interrupted { .. })
        ));
        assert_eq!(client.transaction_count(), 1);
    }

    #[tokio::test]
    async fn empty_selection() {
        let topo = Topology::new();
        let client = topo.client();

        let report = BatchFailover::default()
            .run(&OpContext::background(), &client, &BatchTarget::All, &NoopObserver)
            .await
            .unwrap();
        assert_eq!(report.total(), 0);
        assert!(report.is_success());
    }
}
