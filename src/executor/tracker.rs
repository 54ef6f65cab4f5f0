//! In-flight probe table shared by the sender and receiver

use crate::models::Probe;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::Instant;

/// Probes awaiting a reply, keyed by their 16-bit wire sequence
///
/// A probe is matched at most once: [`RequestTracker::take_elapsed`] removes
/// the entry it answers. Recording a probe whose wire sequence is still
/// present (after the counter wrapped) replaces the older entry.
#[derive(Debug, Default)]
pub struct RequestTracker {
    inflight: Mutex<HashMap<u16, Probe>>,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `probe`
    pub fn record(&self, probe: Probe) {
        self.inflight.lock().insert(probe.wire_sequence(), probe);
    }

    /// Remove the probe for `wire_sequence` and return its run sequence and
    /// the time elapsed until `now`
    pub fn take_elapsed(&self, wire_sequence: u16, now: Instant) -> Option<(u64, Duration)> {
        let probe = self.inflight.lock().remove(&wire_sequence)?;
        Some((probe.sequence, now.saturating_duration_since(probe.sent_at)))
    }

    /// Drop a probe that never made it onto the wire
    pub fn forget(&self, wire_sequence: u16) {
        self.inflight.lock().remove(&wire_sequence);
    }

    /// Drop every probe sent before `cutoff`; returns how many were dropped
    pub fn evict_older_than(&self, cutoff: Instant) -> usize {
        let mut inflight = self.inflight.lock();
        let before = inflight.len();
        inflight.retain(|_, probe| probe.sent_at >= cutoff);
        before - inflight.len()
    }

    pub fn len(&self) -> usize {
        self.inflight.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inflight.lock().is_empty()
    }
}
