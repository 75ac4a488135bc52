//! Cooperative shutdown signalling for the daemon's long-running tasks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// A handle to stop the server and ingest loops.
///
/// This is a lightweight, cloneable handle; every clone shares one signal.
/// Triggering is idempotent and cannot be undone.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    triggered: AtomicBool,
    notify: Notify,
}

impl ShutdownHandle {
    /// Create a new, untriggered handle.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal every holder of this handle to stop.
    pub fn trigger(&self) {
        if !self.inner.triggered.swap(true, Ordering::SeqCst) {
            self.inner.notify.notify_waiters();
        }
    }

    /// Check if the stop signal has been sent.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.inner.triggered.load(Ordering::SeqCst)
    }

    /// Wait until the stop signal has been sent.
    ///
    /// Returns immediately if it already was.
    pub async fn wait(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if self.is_triggered() {
                return;
            }
            notified.await;
        }
    }
}
