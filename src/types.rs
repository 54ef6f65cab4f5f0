//! Type definitions and aliases

use std::fmt;
use std::net::IpAddr;
use std::time::Duration;
use serde::{Deserialize, Serialize};

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// IP version of the probed destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum IpVersion {
    V4,
    V6,
}

impl IpVersion {
    /// Version of an address
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => Self::V4,
            IpAddr::V6(_) => Self::V6,
        }
    }

    /// Name of the ICMP flavour spoken over this version
    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::V4 => "ICMP",
            Self::V6 => "ICMPv6",
        }
    }
}

/// Restriction on which address family a host name may resolve to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AddressFamily {
    /// Take the first address the resolver returns
    #[default]
    Any,
    /// IPv4 only (`-4`)
    V4Only,
    /// IPv6 only (`-6`)
    V6Only,
}

impl AddressFamily {
    /// Whether `addr` is acceptable under this restriction
    pub fn accepts(&self, addr: &IpAddr) -> bool {
        match self {
            Self::Any => true,
            Self::V4Only => addr.is_ipv4(),
            Self::V6Only => addr.is_ipv6(),
        }
    }
}

/// Why a run stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShutdownReason {
    /// The requested number of probes was sent and answered or lingered on
    CountReached,
    /// The run deadline elapsed
    DeadlineElapsed,
    /// An outside actor (usually Ctrl-C) cancelled the run
    Interrupted,
    /// The receive loop died on a read error
    ReceiverFailed,
}

impl fmt::Display for ShutdownReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::CountReached => "count reached",
            Self::DeadlineElapsed => "deadline elapsed",
            Self::Interrupted => "interrupted",
            Self::ReceiverFailed => "receiver failed",
        };
        f.write_str(text)
    }
}

/// Something the engine wants the user to see while a run is in progress
#[derive(Debug, Clone, PartialEq)]
pub enum ProbeEvent {
    /// A matched echo reply
    Reply {
        bytes: usize,
        source: IpAddr,
        sequence: u64,
        round_trip: Duration,
        ttl: Option<u8>,
    },
    /// No datagram arrived within one read deadline
    Timeout,
    /// A well-formed ICMP message that is not an echo reply
    Unexpected { icmp_type: u8, code: u8, source: IpAddr },
    /// Bytes that did not decode as ICMP
    Malformed { source: IpAddr, reason: String },
    /// A probe could not be written
    SendFailed { sequence: u64, reason: String },
    /// The receive loop stopped on a read error
    ReceiveFailed { reason: String },
}
