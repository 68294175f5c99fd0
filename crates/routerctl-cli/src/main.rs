//! routerctl - inspect OVN routers and move them between gateway chassis
//!
//! Reads the OVN northbound database, lists Neutron routers with their
//! hosting chassis, and triggers gateway failover by swapping chassis
//! priorities.

mod commands;
mod config;
mod output;

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use routerctl_store::{ControllerMode, MemoryNbClient, NbSnapshot};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::CliConfig;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(name = "routerctl")]
#[command(author, version, about = "OVN router inspection and failover")]
#[command(propagate_version = true)]
struct Cli {
    /// Configuration file path
    #[arg(long, global = true, env = "ROUTERCTL_CONFIG")]
    config: Option<PathBuf>,

    /// Northbound database snapshot (JSON or YAML)
    #[arg(long, global = true, env = "ROUTERCTL_NB_SNAPSHOT")]
    nb_snapshot: Option<PathBuf>,

    /// Namespace where OVN is deployed
    #[arg(long, global = true)]
    ovn_namespace: Option<String>,

    /// OVN database endpoints (default: generated from namespace and statefulset)
    #[arg(long, global = true, value_delimiter = ',')]
    ovn_endpoints: Vec<String>,

    /// Verbose logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display one or many resources
    ///
    /// Examples:
    ///   routerctl get routers
    ///   routerctl get router/550e8400-e29b-41d4-a716-446655440000
    ///   routerctl get routers uuid1,uuid2 -o yaml
    Get {
        /// Resource type, optionally followed by UUIDs
        #[arg(value_name = "RESOURCE")]
        args: Vec<String>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        output: OutputFormat,

        /// Don't print headers in table output
        #[arg(long)]
        no_headers: bool,
    },

    /// Trigger failover for one or more routers
    ///
    /// Moves each router from its current hosting chassis by swapping the
    /// highest and lowest gateway chassis priorities, then waits until the
    /// router is hosted on the promoted chassis.
    Failover {
        /// Router UUIDs, space or comma separated
        #[arg(value_name = "ROUTER_UUID")]
        uids: Vec<String>,

        /// Failover all routers
        #[arg(long)]
        all: bool,

        /// Timeout for each router failover (e.g. 30s, 2m) [default: 30s]
        #[arg(long, value_parser = commands::failover::parse_duration)]
        timeout: Option<Duration>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    let default_filter = if cli.debug { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();

    let config = CliConfig::load(cli.config.as_deref())?.merge_with_args(
        cli.nb_snapshot.as_deref(),
        cli.ovn_namespace.as_deref(),
        &cli.ovn_endpoints,
    );

    let client = connect(&config)?;

    match &cli.command {
        Commands::Get {
            args,
            output,
            no_headers,
        } => {
            commands::get(&client, args, *output, *no_headers).await?;
        }

        Commands::Failover { uids, all, timeout } => {
            commands::failover(&client, uids, *all, *timeout, config.failover_config()).await?;
        }
    }

    Ok(())
}

/// Open the northbound database described by `config`.
fn connect(config: &CliConfig) -> Result<MemoryNbClient> {
    let endpoints = config.northbound.endpoints();
    tracing::debug!(
        namespace = %config.northbound.namespace,
        endpoints = ?endpoints,
        "Northbound endpoints"
    );

    let path = config.northbound.snapshot.as_deref().context(
        "no northbound snapshot configured; pass --nb-snapshot or set northbound.snapshot",
    )?;
    let snapshot = NbSnapshot::load(path)
        .with_context(|| format!("Failed to load northbound snapshot: {}", path.display()))?;

    tracing::info!(
        path = %path.display(),
        routers = snapshot.logical_routers.len(),
        "Loaded northbound snapshot"
    );
    Ok(MemoryNbClient::from_snapshot(snapshot, ControllerMode::Immediate))
}
