//! Per-request context: deadline and cooperative cancellation.
//!
//! Every identity fetch receives a [`RequestContext`]. When the caller
//! cancels it or its deadline passes, the in-flight request is dropped.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::Instant;

/// Handle used to cancel the requests observing its receivers.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    sender: Arc<watch::Sender<bool>>,
}

/// Observer side of a [`CancellationToken`].
#[derive(Debug, Clone)]
pub struct CancellationReceiver {
    receiver: watch::Receiver<bool>,
}

impl CancellationToken {
    /// Creates a token together with its first receiver.
    #[must_use]
    pub fn new() -> (Self, CancellationReceiver) {
        let (sender, receiver) = watch::channel(false);
        (
            Self {
                sender: Arc::new(sender),
            },
            CancellationReceiver { receiver },
        )
    }

    /// Another receiver for the same token.
    #[must_use]
    pub fn receiver(&self) -> CancellationReceiver {
        CancellationReceiver {
            receiver: self.sender.subscribe(),
        }
    }

    /// Cancels; every receiver observes it.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// Returns true once [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }
}

impl CancellationReceiver {
    /// Resolves once the token is cancelled.
    ///
    /// Never resolves if the token is dropped without being cancelled.
    pub async fn cancelled(&mut self) {
        if self.receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Returns true if the token has been cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Why a context finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContextDone {
    /// The caller cancelled.
    Cancelled,
    /// The deadline passed.
    DeadlineExceeded,
}

/// Deadline and cancellation carried into each fetch.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    deadline: Option<Instant>,
    cancellation: Option<CancellationReceiver>,
}

impl RequestContext {
    /// A context that never finishes on its own.
    #[must_use]
    pub fn background() -> Self {
        Self::default()
    }

    /// Sets the deadline to `timeout` from now.
    #[must_use]
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Sets an absolute deadline, keeping the earlier one if already set.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(self.deadline.map_or(deadline, |d| d.min(deadline)));
        self
    }

    /// Observes the given cancellation receiver.
    #[must_use]
    pub fn with_cancellation(mut self, receiver: CancellationReceiver) -> Self {
        self.cancellation = Some(receiver);
        self
    }

    /// The deadline, if any.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the deadline; zero once it passed.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|d| d.saturating_duration_since(Instant::now()))
    }

    /// Returns true if the context was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationReceiver::is_cancelled)
    }

    /// Returns why the context finished, if it already has.
    #[must_use]
    pub fn check(&self) -> Option<ContextDone> {
        if self.is_cancelled() {
            return Some(ContextDone::Cancelled);
        }
        if self.deadline.is_some_and(|d| d <= Instant::now()) {
            return Some(ContextDone::DeadlineExceeded);
        }
        None
    }

    /// Resolves when the context is cancelled or its deadline passes.
    pub async fn done(&self) -> ContextDone {
        let cancellation = self.cancellation.clone();
        let cancelled = async move {
            match cancellation {
                Some(mut receiver) => receiver.cancelled().await,
                None => std::future::pending().await,
            }
        };
        let deadline = self.deadline;
        let expired = async move {
            match deadline {
                Some(at) => tokio::time::sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => ContextDone::Cancelled,
            () = expired => ContextDone::DeadlineExceeded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_background_context() {
        let ctx = RequestContext::background();
        assert!(ctx.deadline().is_none());
        assert!(ctx.remaining().is_none());
        assert!(!ctx.is_cancelled());
        assert_eq!(ctx.check(), None);
    }

    #[test]
    fn test_cancellation_visible_to_all_receivers() {
        let (token, first) = CancellationToken::new();
        let second = token.receiver();
        assert!(!first.is_cancelled());

        token.cancel();
        assert!(token.is_cancelled());
        assert!(first.is_cancelled());
        assert!(second.is_cancelled());

        let ctx = RequestContext::background().with_cancellation(first);
        assert_eq!(ctx.check(), Some(ContextDone::Cancelled));
    }

    #[test]
    fn test_earlier_deadline_wins() {
        let now = Instant::now();
        let ctx = RequestContext::background()
            .with_deadline(now + Duration::from_secs(10))
            .with_deadline(now + Duration::from_secs(5));
        assert_eq!(ctx.deadline(), Some(now + Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn test_done_on_cancel() {
        let (token, receiver) = CancellationToken::new();
        let ctx = RequestContext::background()
            .with_timeout(Duration::from_secs(30))
            .with_cancellation(receiver);

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            token.cancel();
        });

        assert_eq!(ctx.done().await, ContextDone::Cancelled);
    }

    #[tokio::test]
    async fn test_done_on_deadline() {
        let ctx = RequestContext::background().with_timeout(Duration::from_millis(10));
        assert_eq!(ctx.done().await, ContextDone::DeadlineExceeded);
        assert_eq!(ctx.remaining(), Some(Duration::ZERO));
        assert_eq!(ctx.check(), Some(ContextDone::DeadlineExceeded));
    }
}
