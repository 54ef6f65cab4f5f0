//! In-memory transport used by tests and benchmarks

use super::icmp::{Echo, IcmpMessage};
use super::{Datagram, PacketTransport};
use crate::types::IpVersion;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;

/// How the fake peer answers echo requests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyMode {
    /// Never answer
    Silent,
    /// Answer every request immediately with a matching reply
    Echo,
    /// Answer with a reply carrying this identifier instead of the request's
    EchoWithIdentifier(u16),
}

/// Loopback transport: records what is sent and replays injected datagrams
pub struct MemoryTransport {
    version: IpVersion,
    reply_mode: Mutex<ReplyMode>,
    reply_ttl: Option<u8>,
    sent: Mutex<Vec<(Vec<u8>, IpAddr)>>,
    fail_sends: AtomicBool,
    inbox_tx: mpsc::UnboundedSender<io::Result<Datagram>>,
    inbox_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<io::Result<Datagram>>>,
}

impl MemoryTransport {
    pub fn new(version: IpVersion, reply_mode: ReplyMode) -> Self {
        let (inbox_tx, inbox_rx) = mpsc::unbounded_channel();
        Self {
            version,
            reply_mode: Mutex::new(reply_mode),
            reply_ttl: Some(64),
            sent: Mutex::new(Vec::new()),
            fail_sends: AtomicBool::new(false),
            inbox_tx,
            inbox_rx: tokio::sync::Mutex::new(inbox_rx),
        }
    }

    /// TTL reported with generated replies
    pub fn with_reply_ttl(mut self, ttl: Option<u8>) -> Self {
        self.reply_ttl = ttl;
        self
    }

    pub fn set_reply_mode(&self, mode: ReplyMode) {
        *self.reply_mode.lock() = mode;
    }

    /// Make every following `send_to` fail
    pub fn set_fail_sends(&self, fail: bool) {
        self.fail_sends.store(fail, Ordering::SeqCst);
    }

    /// Queue a datagram for the next `recv`
    pub fn inject(&self, datagram: Datagram) {
        let _ = self.inbox_tx.send(Ok(datagram));
    }

    /// Encode and queue a message as if `source` had sent it
    pub fn inject_message(&self, message: &IcmpMessage, source: IpAddr) {
        self.inject(Datagram {
            data: message.encode(self.version),
            source,
            ttl: self.reply_ttl,
        });
    }

    /// Make a pending or future `recv` fail with `error`
    pub fn inject_error(&self, error: io::Error) {
        let _ = self.inbox_tx.send(Err(error));
    }

    /// Packets written so far, in order
    pub fn sent_packets(&self) -> Vec<(Vec<u8>, IpAddr)> {
        self.sent.lock().clone()
    }

    pub fn sent_count(&self) -> usize {
        self.sent.lock().len()
    }
}

#[async_trait]
impl PacketTransport for MemoryTransport {
    async fn send_to(&self, packet: &[u8], destination: IpAddr) -> io::Result<usize> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "simulated send failure"));
        }
        self.sent.lock().push((packet.to_vec(), destination));

        let mode = *self.reply_mode.lock();
        if let Ok(IcmpMessage::EchoRequest(request)) = IcmpMessage::decode(self.version, packet) {
            let identifier = match mode {
                ReplyMode::Silent => None,
                ReplyMode::Echo => Some(request.identifier),
                ReplyMode::EchoWithIdentifier(id) => Some(id),
            };
            if let Some(identifier) = identifier {
                let reply = IcmpMessage::EchoReply(Echo { identifier, ..request });
                self.inject_message(&reply, destination);
            }
        }
        Ok(packet.len())
    }

    async fn recv(&self) -> io::Result<Datagram> {
        let mut inbox = self.inbox_rx.lock().await;
        match inbox.recv().await {
            Some(result) => result,
            None => Err(io::Error::new(io::ErrorKind::BrokenPipe, "transport closed")),
        }
    }
}
