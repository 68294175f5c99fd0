//! Failover command - move routers to another gateway chassis

use std::io::Write;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use parking_lot::Mutex;
use routerctl_control::{
    BatchFailover, BatchObserver, BatchReport, BatchTarget, FailoverConfig, OpContext, Router,
    RouterOutcome,
};
use routerctl_core::RouterUid;
use routerctl_store::NorthboundClient;

use crate::commands::split_names;

/// Build the batch target from positional UIDs and `--all`.
pub fn parse_target(args: &[String], all: bool) -> Result<BatchTarget> {
    match (all, args.is_empty()) {
        (false, true) => bail!("you must specify router UUIDs or use --all flag"),
        (true, false) => bail!("cannot specify router UUIDs when using --all flag"),
        (true, true) => Ok(BatchTarget::All),
        (false, false) => {
            let mut names = Vec::new();
            for arg in args {
                split_names(arg, &mut names);
            }
            if names.is_empty() {
                bail!("you must specify router UUIDs or use --all flag");
            }
            Ok(BatchTarget::Routers(
                names.into_iter().map(RouterUid::new).collect(),
            ))
        }
    }
}

/// Parse a timeout such as `30`, `30s`, `500ms`, `2m` or `1h`. A bare number
/// is seconds.
pub fn parse_duration(input: &str) -> Result<Duration> {
    let input = input.trim();
    let split = input
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(input.len());
    let (digits, unit) = input.split_at(split);
    let value: u64 = digits
        .parse()
        .with_context(|| format!("invalid duration: {input:?}"))?;

    let duration = match unit {
        "" | "s" => Duration::from_secs(value),
        "ms" => Duration::from_millis(value),
        "m" => Duration::from_secs(value.saturating_mul(60)),
        "h" => Duration::from_secs(value.saturating_mul(3600)),
        other => bail!("invalid duration unit {other:?} in {input:?}"),
    };
    if duration.is_zero() {
        bail!("duration must be greater than zero");
    }
    Ok(duration)
}

/// Prints per-router progress lines as the batch runs.
pub struct ProgressPrinter<W> {
    out: Mutex<W>,
    announce_total: bool,
}

impl<W: Write + Send> ProgressPrinter<W> {
    /// Print to `out`. With `announce_total` the number of routers is printed
    /// before the first one starts.
    pub fn new(out: W, announce_total: bool) -> Self {
        Self {
            out: Mutex::new(out),
            announce_total,
        }
    }

    /// Print the closing summary line.
    pub fn summary(&self, report: &BatchReport) {
        let mut out = self.out.lock();
        if report.total() == 0 {
            let _ = writeln!(out, "No routers to failover");
            return;
        }
        let _ = writeln!(
            out,
            "\nFailover complete: {} succeeded, {} failed",
            report.succeeded(),
            report.failed()
        );
    }

    /// Recover the writer.
    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

// Write errors on the progress stream are not worth aborting a batch over.
impl<W: Write + Send> BatchObserver for ProgressPrinter<W> {
    fn on_start(&self, router: &Router, index: usize, total: usize) {
        let mut out = self.out.lock();
        if index == 0 && self.announce_total {
            let _ = writeln!(out, "Found {total} routers to failover");
        }
        let _ = write!(out, "Triggering failover for router {}... ", router.display_name());
        let _ = out.flush();
    }

    fn on_outcome(&self, outcome: &RouterOutcome) {
        let mut out = self.out.lock();
        let _ = match &outcome.result {
            Ok(_) => writeln!(out, "SUCCESS"),
            Err(e) => writeln!(out, "FAILED: {e}"),
        };
    }
}

/// Run a batch and print progress to `out`.
pub async fn run_batch<C, W>(
    ctx: &OpContext,
    client: &C,
    target: &BatchTarget,
    config: FailoverConfig,
    out: W,
) -> Result<(BatchReport, W)>
where
    C: NorthboundClient + ?Sized,
    W: Write + Send,
{
    let printer = ProgressPrinter::new(out, matches!(target, BatchTarget::All));
    let report = BatchFailover::new(config)
        .run(ctx, client, target, &printer)
        .await?;
    printer.summary(&report);
    Ok((report, printer.into_inner()))
}

/// Trigger failover for one or more routers
pub async fn failover<C>(
    client: &C,
    args: &[String],
    all: bool,
    timeout: Option<Duration>,
    mut config: FailoverConfig,
) -> Result<()>
where
    C: NorthboundClient + ?Sized,
{
    let target = parse_target(args, all)?;
    if let Some(timeout) = timeout {
        config = config.with_router_timeout(timeout);
    }

    let ctx = OpContext::background();
    let interrupt = ctx.clone();
    let signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, abandoning remaining routers");
            interrupt.cancel();
        }
    });

    let result = run_batch(&ctx, client, &target, config, std::io::stdout()).await;
    signal.abort();

    let (report, _) = result?;
    report.into_result()?;
    Ok(())
}
