//! Probe, observation and run report data models

use crate::types::ShutdownReason;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;
use tokio::time::Instant;

/// One echo request as the sender saw it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Probe {
    /// Run-wide sequence number, starting at 0
    pub sequence: u64,
    /// When the probe was handed to the transport
    pub sent_at: Instant,
    /// Echo payload size in bytes
    pub payload_size: usize,
}

impl Probe {
    /// Sequence as carried in the 16-bit ICMP header field
    pub fn wire_sequence(&self) -> u16 {
        wire_sequence(self.sequence)
    }
}

/// Truncate a run sequence number to the ICMP header field
pub fn wire_sequence(sequence: u64) -> u16 {
    (sequence & 0xffff) as u16
}

/// A matched echo reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    /// Sequence of the probe this reply answers
    pub sequence: u64,

    /// Time between sending the probe and receiving the reply
    pub round_trip: Duration,

    /// Received TTL / hop limit, when the platform exposes it
    pub ttl: Option<u8>,

    /// Size of the ICMP message received
    pub bytes: usize,

    /// Address the reply came from
    pub source: IpAddr,
}

impl Observation {
    /// Round-trip time in milliseconds
    pub fn round_trip_ms(&self) -> f64 {
        self.round_trip.as_secs_f64() * 1000.0
    }
}

/// Everything the statistics reducer needs once every task has exited
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Probes handed to the transport, failed writes included
    pub sent: u64,

    /// Replies matched to a tracked probe
    pub received: u64,

    /// When the run started
    pub started_at: Instant,

    /// Matched replies in arrival order
    pub observations: Vec<Observation>,

    /// Which termination condition fired
    pub reason: ShutdownReason,

    /// Fatal read error that stopped the receiver, if any
    pub receive_error: Option<String>,
}
