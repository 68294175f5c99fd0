//! Failover configuration.

use std::time::Duration;

/// Default interval between convergence probes.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Default time allowed for one router to fail over.
pub const DEFAULT_ROUTER_TIMEOUT: Duration = Duration::from_secs(30);

/// Shortest accepted poll interval.
const MIN_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the failover engine and batch orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FailoverConfig {
    /// Interval between `hosting-chassis` probes after the swap commits.
    pub poll_interval: Duration,
    /// Time allowed per router in a batch, from swap to convergence.
    pub router_timeout: Duration,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            router_timeout: DEFAULT_ROUTER_TIMEOUT,
        }
    }
}

impl FailoverConfig {
    /// Load configuration from environment variables.
    ///
    /// - `ROUTERCTL_POLL_INTERVAL_MS`: probe interval in milliseconds
    /// - `ROUTERCTL_FAILOVER_TIMEOUT_SECS`: per-router timeout in seconds
    ///
    /// Unset or unparsable values keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    fn from_vars(get: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = get("ROUTERCTL_POLL_INTERVAL_MS").and_then(|v| v.trim().parse().ok()) {
            config = config.with_poll_interval(Duration::from_millis(ms));
        }
        if let Some(secs) =
            get("ROUTERCTL_FAILOVER_TIMEOUT_SECS").and_then(|v| v.trim().parse().ok())
        {
            config = config.with_router_timeout(Duration::from_secs(secs));
        }

        config
    }

    /// Set the poll interval. Intervals below one millisecond are raised to it.
    #[must_use]
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    /// Set the per-router timeout.
    #[must_use]
    pub const fn with_router_timeout(mut self, timeout: Duration) -> Self {
        self.router_timeout = timeout;
        self
    }
}
