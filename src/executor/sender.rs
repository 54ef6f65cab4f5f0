//! Echo request sender

use super::state::RunState;
use super::tracker::RequestTracker;
use crate::clock::Clock;
use crate::error::AppError;
use crate::models::{Probe, RunConfig};
use crate::transport::{IcmpMessage, PacketTransport};
use crate::types::IpVersion;
use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// An echo request that was counted as sent but never reached the wire
#[derive(Debug, Error)]
#[error("icmp_seq={sequence}: {source}")]
pub struct SendError {
    pub sequence: u64,
    pub source: AppError,
}

/// Writes one echo request per call, numbering them from 0
pub struct Sender<T: PacketTransport + ?Sized> {
    transport: Arc<T>,
    tracker: Arc<RequestTracker>,
    state: Arc<RunState>,
    clock: Arc<dyn Clock>,
    destination: IpAddr,
    version: IpVersion,
    payload_size: usize,
    retention: Duration,
    identifier: u16,
    next_sequence: u64,
}

impl<T: PacketTransport + ?Sized> Sender<T> {
    pub fn new(
        config: &RunConfig,
        identifier: u16,
        transport: Arc<T>,
        tracker: Arc<RequestTracker>,
        state: Arc<RunState>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            tracker,
            state,
            clock,
            destination: config.destination,
            version: config.ip_version(),
            payload_size: config.payload_size,
            retention: config.tracker_retention(),
            identifier,
            next_sequence: 0,
        }
    }

    /// Sequence the next call to [`Sender::send_one`] will use
    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    /// Send the next probe
    ///
    /// The attempt is counted as sent whether or not the write succeeds. A
    /// failed write is not tracked, so nothing can match it later.
    pub async fn send_one(&mut self) -> Result<Probe, SendError> {
        let sequence = self.next_sequence;
        self.next_sequence += 1;

        let request = IcmpMessage::echo_request(
            self.identifier,
            crate::models::metrics::wire_sequence(sequence),
            self.payload_size,
        );
        let packet = request.encode(self.version);

        let sent_at = self.clock.now();
        if let Some(cutoff) = sent_at.checked_sub(self.retention) {
            self.tracker.evict_older_than(cutoff);
        }

        let probe = Probe {
            sequence,
            sent_at,
            payload_size: self.payload_size,
        };

        // Counted and tracked before the write so a fast reply always finds it
        self.state.record_sent();
        self.tracker.record(probe);

        let result = self.transport.send_to(&packet, self.destination).await;
        self.state.notify_progress();

        match result {
            Ok(_) => Ok(probe),
            Err(e) => {
                self.tracker.forget(probe.wire_sequence());
                Err(SendError {
                    sequence,
                    source: AppError::transport(format!("Failed to send to {}: {}", self.destination, e)),
                })
            }
        }
    }
}
