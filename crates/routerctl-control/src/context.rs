//! Operation context: a deadline plus a cancellation signal.
//!
//! Every query and failover call takes an [`OpContext`]. Database calls are
//! raced against it with [`OpContext::guard`], and the failover engine's
//! convergence poll races its ticker against [`OpContext::done`].
//!
//! Deadlines are measured on the tokio clock, so tests can pause and
//! advance time.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::{ControlError, Result};

/// Why an [`OpContext`] finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// The deadline elapsed.
    DeadlineExceeded,
    /// The context was cancelled.
    Cancelled,
}

impl fmt::Display for DoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeadlineExceeded => f.write_str("deadline exceeded"),
            Self::Cancelled => f.write_str("cancelled"),
        }
    }
}

/// Deadline and cancellation scope for one operation.
///
/// Cloning shares the cancellation signal. Child contexts are cancelled
/// with their parent and never outlive its deadline.
#[derive(Debug, Clone)]
pub struct OpContext {
    deadline: Option<Instant>,
    token: CancellationToken,
}

impl Default for OpContext {
    fn default() -> Self {
        Self::background()
    }
}

impl OpContext {
    /// A context without deadline that is only done when cancelled.
    #[must_use]
    pub fn background() -> Self {
        Self {
            deadline: None,
            token: CancellationToken::new(),
        }
    }

    /// A root context that expires after `timeout`. A timeout too large to
    /// represent as an instant means no deadline.
    #[must_use]
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            deadline: Instant::now().checked_add(timeout),
            token: CancellationToken::new(),
        }
    }

    /// A child context that expires after `timeout` or with its parent,
    /// whichever comes first.
    #[must_use]
    pub fn child_with_timeout(&self, timeout: Duration) -> Self {
        let deadline = match (self.deadline, Instant::now().checked_add(timeout)) {
            (Some(parent), Some(own)) => Some(parent.min(own)),
            (parent, None) => parent,
            (None, own) => own,
        };
        Self {
            deadline,
            token: self.token.child_token(),
        }
    }

    /// Cancel this context and all of its children.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, if any.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Why the context is done, or `None` if it is still live.
    #[must_use]
    pub fn done_reason(&self) -> Option<DoneReason> {
        if self.token.is_cancelled() {
            return Some(DoneReason::Cancelled);
        }
        match self.deadline {
            Some(deadline) if deadline <= Instant::now() => Some(DoneReason::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolve once the context is done.
    pub async fn done(&self) -> DoneReason {
        if let Some(reason) = self.done_reason() {
            return reason;
        }
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    () = self.token.cancelled() => DoneReason::Cancelled,
                    () = tokio::time::sleep_until(deadline) => DoneReason::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                DoneReason::Cancelled
            }
        }
    }

    /// Run `fut` unless the context finishes first.
    ///
    /// # Errors
    ///
    /// Returns [`ControlError::Interrupted`] if the context is done before
    /// `fut` completes. A context that is already done never polls `fut`.
    pub async fn guard<F: Future>(&self, fut: F) -> Result<F::Output> {
        tokio::select! {
            biased;
            reason = self.done() => Err(ControlError::Interrupted { reason }),
            output = fut => Ok(output),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn deadline_expires() {
        let ctx = OpContext::with_timeout(Duration::from_secs(1));
        assert_eq!(ctx.done_reason(), None);

        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(ctx.done_reason(), Some(DoneReason::DeadlineExceeded));
        assert_eq!(ctx.done().await, DoneReason::DeadlineExceeded);
    }

    #[tokio::test(start_paused = true)]
    async fn done_waits_for_deadline() {
        let ctx = OpContext::with_timeout(Duration::from_secs(5));
        let start = Instant::now();
        assert_eq!(ctx.done().await, DoneReason::DeadlineExceeded);
        assert_eq!(start.elapsed(), Duration::from_secs(5));
    }

    #[tokio::test(start_paused = true)]
    async fn child_never_outlives_parent() {
        let parent = OpContext::with_timeout(Duration::from_secs(2));
        let child = parent.child_with_timeout(Duration::from_secs(30));
        assert_eq!(child.deadline(), parent.deadline());

        let short = parent.child_with_timeout(Duration::from_secs(1));
        assert!(short.deadline() < parent.deadline());
    }

    #[tokio::test]
    async fn unrepresentable_timeout_keeps_parent_deadline() {
        let root = OpContext::with_timeout(Duration::MAX);
        assert_eq!(root.deadline(), None);
        assert_eq!(root.done_reason(), None);

        let parent = OpContext::with_timeout(Duration::from_secs(2));
        let child = parent.child_with_timeout(Duration::from_secs(u64::MAX));
        assert_eq!(child.deadline(), parent.deadline());

        let unbounded = OpContext::background().child_with_timeout(Duration::MAX);
        assert_eq!(unbounded.deadline(), None);
        assert_eq!(unbounded.done_reason(), None);
    }

    #[tokio::test]
    async fn parent_cancellation_reaches_child() {
        let parent = OpContext::background();
        let child = parent.child_with_timeout(Duration::from_secs(30));
        parent.cancel();
        assert_eq!(child.done().await, DoneReason::Cancelled);
    }

    #[tokio::test]
    async fn child_cancellation_stays_local() {
        let parent = OpContext::background();
        let child = parent.child_with_timeout(Duration::from_secs(30));
        child.cancel();
        assert_eq!(parent.done_reason(), None);
    }

    #[tokio::test]
    async fn guard_passes_output_through() {
        let ctx = OpContext::background();
        assert_eq!(ctx.guard(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn guard_on_done_context_skips_future() {
        let ctx = OpContext::background();
        ctx.cancel();
        let result = ctx.guard(async { unreachable!("must not be polled") }).await;
        assert!(matches!(
            result,
            Err(ControlError::Interrupted {
                reason: DoneReason::Cancelled
            })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn guard_interrupts_slow_future() {
        let ctx = OpContext::with_timeout(Duration::from_millis(100));
        let result = ctx
            .guard(tokio::time::sleep(Duration::from_secs(10)))
            .await;
        assert!(matches!(
            result,
            Err(ControlError::Interrupted {
                reason: DoneReason::DeadlineExceeded
            })
        ));
    }
}
