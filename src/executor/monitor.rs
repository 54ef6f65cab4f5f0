//! Lifecycle monitor: decides when a run is over

use super::state::RunState;
use crate::models::RunConfig;
use crate::types::ShutdownReason;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep_until, Instant};

/// Watches the run counters and timers and fires the shutdown token once
/// any termination condition holds
///
/// Conditions, checked in this order:
/// 1. the receiver failed
/// 2. the deadline elapsed
/// 3. `count` probes were sent and every one was answered, or one more
///    interval has passed since the last of them went out
///
/// An outside cancellation of the token ends the run as
/// [`ShutdownReason::Interrupted`].
pub struct LifecycleMonitor {
    state: Arc<RunState>,
    count: Option<u64>,
    deadline_at: Option<Instant>,
    linger: Duration,
}

impl LifecycleMonitor {
    /// `scheduled_start` anchors the deadline on the runtime clock
    ///
    /// A deadline too far out to represent as an `Instant` never fires.
    pub fn new(state: Arc<RunState>, config: &RunConfig, scheduled_start: Instant) -> Self {
        Self {
            state,
            count: config.count,
            deadline_at: config.deadline.and_then(|deadline| scheduled_start.checked_add(deadline)),
            linger: config.interval,
        }
    }

    pub async fn run(self) -> ShutdownReason {
        let shutdown = self.state.shutdown().clone();
        let mut linger_until: Option<Instant> = None;

        loop {
            if shutdown.is_cancelled() {
                return ShutdownReason::Interrupted;
            }

            if let Some(reason) = self.evaluate(Instant::now(), &mut linger_until) {
                self.state.request_shutdown();
                return reason;
            }

            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = self.state.progress() => {}
                _ = sleep_until_some(self.deadline_at) => {}
                _ = sleep_until_some(linger_until) => {}
            }
        }
    }

    fn evaluate(&self, now: Instant, linger_until: &mut Option<Instant>) -> Option<ShutdownReason> {
        if self.state.receiver_failed() {
            return Some(ShutdownReason::ReceiverFailed);
        }

        if self.deadline_at.is_some_and(|deadline_at| now >= deadline_at) {
            return Some(ShutdownReason::DeadlineElapsed);
        }

        let count = self.count?;
        let sent = self.state.sent();
        if sent < count {
            return None;
        }
        if self.state.received() >= sent {
            return Some(ShutdownReason::CountReached);
        }

        let until = linger_until.or_else(|| now.checked_add(self.linger))?;
        *linger_until = Some(until);
        (now >= until).then_some(ShutdownReason::CountReached)
    }
}

async fn sleep_until_some(at: Option<Instant>) {
    match at {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}
