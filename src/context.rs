//! Cancellation and deadline for a single logical call.

use std::future;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};

use crate::AtlassianError;

/// Cloneable handle that cancels every call carrying it.
#[derive(Clone, Debug)]
pub struct CancelToken {
    notify: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self {
            notify: Arc::new(tx),
        }
    }

    pub fn cancel(&self) {
        self.notify.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.notify.borrow()
    }

    /// Resolves once [`CancelToken::cancel`] has been called.
    pub async fn cancelled(&self) {
        let mut rx = self.notify.subscribe();
        while !*rx.borrow_and_update() {
            if rx.changed().await.is_err() {
                // The sender lives as long as `self`.
                future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Cancellation signal and optional deadline attached to a request.
///
/// The call pipeline observes it while waiting out a rate limit; the
/// remaining time before the deadline also bounds each transport attempt.
#[derive(Clone, Debug, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: Option<CancelToken>,
}

impl CallContext {
    /// A context that is never cancelled and has no deadline.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(match self.deadline {
            Some(existing) => existing.min(deadline),
            None => deadline,
        });
        self
    }

    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    /// Returns the error the context is already in, if any.
    ///
    /// Cancellation takes precedence over an expired deadline.
    pub fn err(&self) -> Option<AtlassianError> {
        if self.cancel.as_ref().is_some_and(CancelToken::is_cancelled) {
            return Some(AtlassianError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(AtlassianError::DeadlineExceeded),
            _ => None,
        }
    }

    /// Resolves with the cancellation or deadline error, whichever comes first.
    /// Never resolves for a background context.
    pub async fn done(&self) -> AtlassianError {
        let cancelled = async {
            match &self.cancel {
                Some(token) => token.cancelled().await,
                None => future::pending::<()>().await,
            }
        };
        let expired = async {
            match self.deadline {
                Some(deadline) => sleep_until(deadline).await,
                None => future::pending::<()>().await,
            }
        };

        tokio::select! {
            biased;
            () = cancelled => AtlassianError::Cancelled,
            () = expired => AtlassianError::DeadlineExceeded,
        }
    }
}
