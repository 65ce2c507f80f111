//! Process-wide, one-shot cancellation
//!
//! A `Cancellation` is created once at startup and cloned into every stage
//! that needs to observe it. It moves from untriggered to triggered exactly
//! once and is never reset; the first reason wins.

use std::sync::{Arc, OnceLock};
use tokio::sync::Notify;
use tracing::{debug, info};

#[derive(Debug, Default)]
struct Inner {
    reason: OnceLock<String>,
    notify: Notify,
}

#[derive(Debug, Clone, Default)]
pub struct Cancellation {
    inner: Arc<Inner>,
}

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trigger cancellation. Returns false if it was already triggered.
    pub fn cancel(&self, reason: impl Into<String>) -> bool {
        let reason = reason.into();
        match self.inner.reason.set(reason) {
            Ok(()) => {
                info!("Cancellation requested: {}", self.reason().unwrap_or_default());
                self.inner.notify.notify_waiters();
                true
            }
            Err(ignored) => {
                debug!("Cancellation already requested, ignoring: {}", ignored);
                false
            }
        }
    }

    #[inline]
    pub fn is_cancelled(&self) -> bool {
        self.inner.reason.get().is_some()
    }

    pub fn reason(&self) -> Option<String> {
        self.inner.reason.get().cloned()
    }

    /// Resolves once cancellation has been triggered.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            // Register before checking so a concurrent cancel is not missed
            notified.as_mut().enable();

            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}
