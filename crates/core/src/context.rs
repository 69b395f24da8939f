//! Per-request cancellation and deadline context.
//!
//! Every store operation takes a [`RequestContext`]. Callers cancel it
//! explicitly through its token or give it a deadline; operations check it
//! before touching the backend and race the backend call against it.

use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::errors::{Cancellation, Error, Result};

/// Cancellation token plus optional deadline for a single request.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl RequestContext {
    /// A context that is never cancelled unless [`cancel`](Self::cancel) is called.
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose deadline is `timeout` from now.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self::with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            token: CancellationToken::new(),
            deadline: Some(deadline),
        }
    }

    /// Wraps an existing token, e.g. one owned by a server's shutdown logic.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// A child context: cancelled when `self` is, with the earlier of the two deadlines.
    pub fn child(&self, timeout: Option<Duration>) -> Self {
        let own = timeout.map(|t| Instant::now() + t);
        let deadline = match (self.deadline, own) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };
        Self {
            token: self.token.child_token(),
            deadline,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Returns why the context is done, or `None` while it is still live.
    pub fn state(&self) -> Option<Cancellation> {
        if self.token.is_cancelled() {
            return Some(Cancellation::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(Cancellation::DeadlineExceeded),
            _ => None,
        }
    }

    /// Fails with [`Error::Cancelled`] once the context is done.
    pub fn check(&self) -> Result<()> {
        match self.state() {
            Some(reason) => Err(Error::Cancelled(reason)),
            None => Ok(()),
        }
    }

    /// Resolves when the context is cancelled or its deadline elapses.
    pub async fn done(&self) -> Cancellation {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    biased;
                    _ = self.token.cancelled() => Cancellation::Cancelled,
                    _ = tokio::time::sleep_until(deadline) => Cancellation::DeadlineExceeded,
                }
            }
            None => {
                self.token.cancelled().await;
                Cancellation::Cancelled
            }
        }
    }

    /// Runs `fut` unless the context finishes first.
    ///
    /// An already-finished context never polls `fut`.
    pub async fn run<F, T>(&self, fut: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            reason = self.done() => Err(Error::Cancelled(reason)),
            out = fut => out,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_fresh_context_is_live() {
        let ctx = RequestContext::new();
        assert!(ctx.check().is_ok());
        assert_eq!(ctx.state(), None);
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn test_cancel_reports_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancel();
        assert_eq!(ctx.state(), Some(Cancellation::Cancelled));
        assert!(matches!(
            ctx.check(),
            Err(Error::Cancelled(Cancellation::Cancelled))
        ));
    }

    #[tokio::test]
    async fn test_elapsed_deadline_reports_deadline_exceeded() {
        let ctx = RequestContext::with_deadline(Instant::now() - Duration::from_millis(1));
        assert!(matches!(
            ctx.check(),
            Err(Error::Cancelled(Cancellation::DeadlineExceeded))
        ));
    }

    #[tokio::test]
    async fn test_child_follows_parent_cancellation() {
        let parent = RequestContext::new();
        let child = parent.child(None);
        parent.cancel();
        assert!(child.is_cancelled());
    }

    #[tokio::test]
    async fn test_child_takes_earlier_deadline() {
        let parent = RequestContext::with_timeout(Duration::from_secs(60));
        let child = parent.child(Some(Duration::from_secs(1)));
        assert!(child.deadline().unwrap() < parent.deadline().unwrap());

        let loose = parent.child(Some(Duration::from_secs(3600)));
        assert_eq!(loose.deadline(), parent.deadline());
    }

    #[tokio::test]
    async fn test_run_skips_work_when_already_cancelled() {
        let ctx = RequestContext::new();
        ctx.cancel();
        let polled = Arc::new(AtomicBool::new(false));
        let flag = polled.clone();

        let result = ctx
            .run(async move {
                flag.store(true, Ordering::SeqCst);
                Ok(1)
            })
            .await;

        assert!(matches!(result, Err(Error::Cancelled(Cancellation::Cancelled))));
        assert!(!polled.load(Ordering::SeqCst));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_aborts_slow_work_at_deadline() {
        let ctx = RequestContext::with_timeout(Duration::from_millis(50));
        let result: Result<()> = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(10)).await;
                Ok(())
            })
            .await;
        assert!(matches!(
            result,
            Err(Error::Cancelled(Cancellation::DeadlineExceeded))
        ));
    }

    #[tokio::test]
    async fn test_run_returns_output_of_live_work() {
        let ctx = RequestContext::with_timeout(Duration::from_secs(5));
        let value = ctx.run(async { Ok(42) }).await.unwrap();
        assert_eq!(value, 42);
    }
}
