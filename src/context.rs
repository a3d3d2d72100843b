//! Caller-supplied cancellation and deadline signal.

use std::time::Duration;

use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;

use crate::{ClientError, Result};

/// Cancellation signal threaded through every attempt of a call.
///
/// A context fires when its [`CancellationToken`] is cancelled or when its
/// deadline passes, whichever happens first. [`Context::background`] never
/// fires. Clones share the same token.
#[derive(Clone, Debug, Default)]
pub struct Context {
    token: CancellationToken,
    deadline: Option<Instant>,
}

impl Context {
    /// A context that is never cancelled and has no deadline.
    pub fn background() -> Self {
        Self::default()
    }

    /// A context driven by an existing cancellation token.
    pub fn with_cancellation(token: CancellationToken) -> Self {
        Self {
            token,
            deadline: None,
        }
    }

    /// Sets an absolute deadline. An earlier deadline already present wins.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(current) => current.min(deadline),
            None => deadline,
        });
        self
    }

    /// Sets a deadline `timeout` from now. A timeout too large to represent
    /// leaves the current deadline, if any, unchanged.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.token
    }

    /// Cancels this context and every clone of it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_done(&self) -> bool {
        self.check().is_err()
    }

    /// Returns the cancellation error if the context has already fired.
    pub fn check(&self) -> Result<()> {
        if self.token.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(ClientError::DeadlineExceeded),
            _ => Ok(()),
        }
    }

    /// Resolves once the context fires, yielding the matching error.
    pub(crate) async fn done(&self) -> ClientError {
        match self.deadline {
            Some(deadline) => tokio::select! {
                biased;
                _ = self.token.cancelled() => ClientError::Cancelled,
                _ = sleep_until(deadline) => ClientError::DeadlineExceeded,
            },
            None => {
                self.token.cancelled().await;
                ClientError::Cancelled
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::Instant;
    use tokio_util::sync::CancellationToken;

    use super::Context;
    use crate::ClientError;

    #[test]
    fn background_is_never_done() {
        let ctx = Context::background();
        assert!(ctx.check().is_ok());
        assert!(ctx.deadline().is_none());
    }

    #[test]
    fn cancelled_token_is_done() {
        let token = CancellationToken::new();
        let ctx = Context::with_cancellation(token.clone());
        token.cancel();
        assert!(matches!(ctx.check(), Err(ClientError::Cancelled)));
    }

    #[tokio::test(start_paused = true)]
    async fn past_deadline_is_done() {
        let ctx = Context::background().with_timeout(Duration::from_millis(10));
        assert!(!ctx.is_done());
        tokio::time::advance(Duration::from_millis(11)).await;
        assert!(matches!(ctx.check(), Err(ClientError::DeadlineExceeded)));
    }

    #[tokio::test(start_paused = true)]
    async fn earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = Context::background()
            .with_deadline(now + Duration::from_secs(1))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn done_resolves_on_deadline() {
        let ctx = Context::background().with_timeout(Duration::from_secs(3));
        let err = ctx.done().await;
        assert!(matches!(err, ClientError::DeadlineExceeded));
    }

    #[tokio::test]
    async fn done_resolves_on_cancel_from_clone() {
        let ctx = Context::background();
        let handle = ctx.clone();
        let waiter = tokio::spawn(async move { handle.done().await });
        ctx.cancel();
        let err = waiter.await.expect("waiter must not panic");
        assert!(matches!(err, ClientError::Cancelled));
    }

    #[test]
    fn unrepresentable_timeout_keeps_current_deadline() {
        let ctx = Context::background().with_timeout(Duration::MAX);
        assert!(ctx.deadline().is_none());
        assert!(ctx.check().is_ok());

        let ctx = Context::background().with_timeout(Duration::from_secs(5));
        let deadline = ctx.deadline();
        assert_eq!(ctx.with_timeout(Duration::MAX).deadline(), deadline);
    }
}
