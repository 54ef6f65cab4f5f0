//! Shared run state
//!
//! `sent` is written only by the sender and `received` only by the receiver.
//! Other tasks read them with `Acquire` and may see a value one update
//! behind, which at worst delays shutdown by one wake-up.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::futures::Notified;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

pub struct RunState {
    sent: AtomicU64,
    received: AtomicU64,
    started_at: Instant,
    receiver_failed: AtomicBool,
    progress: Notify,
    shutdown: CancellationToken,
}

impl RunState {
    pub fn new(started_at: Instant, shutdown: CancellationToken) -> Self {
        Self {
            sent: AtomicU64::new(0),
            received: AtomicU64::new(0),
            started_at,
            receiver_failed: AtomicBool::new(false),
            progress: Notify::new(),
            shutdown,
        }
    }

    pub fn sent(&self) -> u64 {
        self.sent.load(Ordering::Acquire)
    }

    pub fn received(&self) -> u64 {
        self.received.load(Ordering::Acquire)
    }

    pub fn started_at(&self) -> Instant {
        self.started_at
    }

    pub fn receiver_failed(&self) -> bool {
        self.receiver_failed.load(Ordering::Acquire)
    }

    /// Sender only. Must happen before the probe becomes matchable.
    pub(crate) fn record_sent(&self) -> u64 {
        self.sent.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Receiver only
    pub(crate) fn record_received(&self) -> u64 {
        let received = self.received.fetch_add(1, Ordering::AcqRel) + 1;
        self.progress.notify_one();
        received
    }

    pub(crate) fn mark_receiver_failed(&self) {
        self.receiver_failed.store(true, Ordering::Release);
        self.progress.notify_one();
    }

    /// Wake the lifecycle monitor to re-check its conditions
    pub(crate) fn notify_progress(&self) {
        self.progress.notify_one();
    }

    /// Resolves after the next counter change (or immediately if one is pending)
    pub(crate) fn progress(&self) -> Notified<'_> {
        self.progress.notified()
    }

    pub fn shutdown(&self) -> &CancellationToken {
        &self.shutdown
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Idempotent
    pub(crate) fn request_shutdown(&self) {
        self.shutdown.cancel();
    }
}
