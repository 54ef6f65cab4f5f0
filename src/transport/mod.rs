//! Packet transport boundary
//!
//! The engine talks to the network through [`PacketTransport`]: write a
//! datagram to an address, read the next datagram with whatever per-packet
//! metadata the platform offers. [`IcmpSocket`] is the raw-socket
//! implementation; [`MemoryTransport`] stands in for it in tests.

pub mod icmp;
pub mod memory;
pub mod socket;

pub use icmp::{CodecError, Echo, IcmpMessage, ICMP_HEADER_SIZE};
pub use memory::{MemoryTransport, ReplyMode};
pub use socket::IcmpSocket;

use async_trait::async_trait;
use std::io;
use std::net::IpAddr;

/// One received ICMP message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Datagram {
    /// ICMP message bytes, IP header removed
    pub data: Vec<u8>,
    /// Sender of the datagram
    pub source: IpAddr,
    /// TTL / hop limit of the received packet, when the platform exposes it
    pub ttl: Option<u8>,
}

/// A duplex datagram channel carrying ICMP messages
///
/// Implementations must allow `send_to` and `recv` to run concurrently
/// from different tasks.
#[async_trait]
pub trait PacketTransport: Send + Sync {
    /// Write one ICMP message to `destination`
    async fn send_to(&self, packet: &[u8], destination: IpAddr) -> io::Result<usize>;

    /// Wait for the next datagram; read deadlines are applied by the caller
    async fn recv(&self) -> io::Result<Datagram>;
}
