//! Configuration file handling for routerctl.
//!
//! The file is TOML with two optional sections:
//!
//! ```toml
//! [northbound]
//! snapshot = "/var/lib/routerctl/nb.yaml"
//! namespace = "openstack"
//!
//! [failover]
//! timeout_secs = 60
//! poll_interval_ms = 250
//! ```
//!
//! Failover settings are layered: built-in defaults, then the
//! `ROUTERCTL_*` environment variables, then the file, then command-line
//! flags.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use routerctl_control::FailoverConfig;
use serde::{Deserialize, Serialize};

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG: &str = "routerctl.toml";

/// System-wide config file.
pub const SYSTEM_CONFIG: &str = "/etc/routerctl/routerctl.toml";

/// Configuration for the CLI tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    /// Where to find the northbound database.
    pub northbound: NorthboundConfig,
    /// Failover tuning.
    pub failover: FailoverSection,
}

/// The `[northbound]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NorthboundConfig {
    /// Snapshot file to load instead of connecting to a live database.
    pub snapshot: Option<PathBuf>,
    /// Namespace where OVN is deployed.
    pub namespace: String,
    /// Explicit endpoints; generated from the statefulset when empty.
    pub endpoints: Vec<String>,
    /// Name of the northbound database statefulset.
    pub statefulset: String,
    /// Northbound database port.
    pub port: u16,
}

impl Default for NorthboundConfig {
    fn default() -> Self {
        Self {
            snapshot: None,
            namespace: "openstack".to_string(),
            endpoints: Vec::new(),
            statefulset: "ovn-ovsdb-nb".to_string(),
            port: 6641,
        }
    }
}

impl NorthboundConfig {
    /// Number of database replicas the generated endpoints cover.
    const REPLICAS: usize = 3;

    /// The northbound endpoints: the configured ones, or one per replica of
    /// the statefulset.
    #[must_use]
    pub fn endpoints(&self) -> Vec<String> {
        if !self.endpoints.is_empty() {
            return self.endpoints.clone();
        }
        (0..Self::REPLICAS)
            .map(|i| {
                format!(
                    "tcp:{sts}-{i}.{sts}.{ns}.svc.cluster.local:{port}",
                    sts = self.statefulset,
                    ns = self.namespace,
                    port = self.port
                )
            })
            .collect()
    }
}

/// The `[failover]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailoverSection {
    /// Per-router timeout in seconds.
    pub timeout_secs: Option<u64>,
    /// Convergence poll interval in milliseconds.
    pub poll_interval_ms: Option<u64>,
}

impl FailoverSection {
    /// Apply this section on top of `base`.
    #[must_use]
    pub fn apply(&self, mut base: FailoverConfig) -> FailoverConfig {
        if let Some(secs) = self.timeout_secs {
            base = base.with_router_timeout(Duration::from_secs(secs));
        }
        if let Some(ms) = self.poll_interval_ms {
            base = base.with_poll_interval(Duration::from_millis(ms));
        }
        base
    }
}

impl CliConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist. Otherwise `routerctl.toml` in the working
    /// directory is tried, then `/etc/routerctl/routerctl.toml`; if neither
    /// exists the defaults are used.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        for candidate in [Path::new(LOCAL_CONFIG), Path::new(SYSTEM_CONFIG)] {
            if candidate.exists() {
                tracing::debug!(path = %candidate.display(), "Using config file");
                return Self::load_from(candidate);
            }
        }
        Ok(Self::default())
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Merge command-line values over the file.
    #[must_use]
    pub fn merge_with_args(
        mut self,
        snapshot: Option<&Path>,
        namespace: Option<&str>,
        endpoints: &[String],
    ) -> Self {
        if let Some(snapshot) = snapshot {
            self.northbound.snapshot = Some(snapshot.to_path_buf());
        }
        if let Some(namespace) = namespace {
            self.northbound.namespace = namespace.to_string();
        }
        if !endpoints.is_empty() {
            self.northbound.endpoints = endpoints.to_vec();
        }
        self
    }

    /// The failover configuration: environment, then this file.
    #[must_use]
    pub fn failover_config(&self) -> FailoverConfig {
        self.failover.apply(FailoverConfig::from_env())
    }
}
