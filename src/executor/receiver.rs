//! Echo reply receiver

use super::state::RunState;
use super::tracker::RequestTracker;
use crate::clock::Clock;
use crate::error::AppError;
use crate::logging::Logger;
use crate::models::Observation;
use crate::transport::{Datagram, IcmpMessage, PacketTransport};
use crate::types::{IpVersion, ProbeEvent};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

/// What the receive loop hands back when it exits
#[derive(Debug, Default)]
pub struct ReceiverOutcome {
    /// Matched replies in arrival order
    pub observations: Vec<Observation>,
    /// Set when the loop stopped on a read error rather than on shutdown
    pub error: Option<AppError>,
}

/// Reads datagrams until shutdown, matching echo replies to tracked probes
pub struct Receiver<T: PacketTransport + ?Sized> {
    transport: Arc<T>,
    tracker: Arc<RequestTracker>,
    state: Arc<RunState>,
    clock: Arc<dyn Clock>,
    events: mpsc::UnboundedSender<ProbeEvent>,
    logger: Arc<Logger>,
    identifier: u16,
    version: IpVersion,
    read_deadline: Duration,
}

impl<T: PacketTransport + ?Sized> Receiver<T> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identifier: u16,
        version: IpVersion,
        read_deadline: Duration,
        transport: Arc<T>,
        tracker: Arc<RequestTracker>,
        state: Arc<RunState>,
        clock: Arc<dyn Clock>,
        events: mpsc::UnboundedSender<ProbeEvent>,
        logger: Arc<Logger>,
    ) -> Self {
        Self {
            transport,
            tracker,
            state,
            clock,
            events,
            logger,
            identifier,
            version,
            read_deadline,
        }
    }

    /// Run until the shutdown token fires or a read fails
    ///
    /// Each read waits at most one read deadline; an expired deadline is
    /// reported as [`ProbeEvent::Timeout`] and the loop keeps going.
    pub async fn run(self) -> ReceiverOutcome {
        let shutdown = self.state.shutdown().clone();
        let mut outcome = ReceiverOutcome::default();

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let read = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                read = tokio::time::timeout(self.read_deadline, self.transport.recv()) => read,
            };

            match read {
                Err(_elapsed) => self.emit(ProbeEvent::Timeout),
                Ok(Ok(datagram)) => {
                    if let Some(observation) = self.handle_datagram(datagram) {
                        outcome.observations.push(observation);
                    }
                }
                Ok(Err(e)) if e.kind() == io::ErrorKind::Interrupted => continue,
                Ok(Err(e)) => {
                    let error = AppError::transport(format!("Failed to read from socket: {}", e));
                    self.logger
                        .error("Receive loop stopped")
                        .error_info(&error)
                        .field("reason", e.to_string())
                        .log();
                    self.emit(ProbeEvent::ReceiveFailed {
                        reason: e.to_string(),
                    });
                    self.state.mark_receiver_failed();
                    outcome.error = Some(error);
                    break;
                }
            }
        }

        outcome
    }

    /// Classify one datagram; returns the observation when it matched a probe
    fn handle_datagram(&self, datagram: Datagram) -> Option<Observation> {
        let message = match IcmpMessage::decode(self.version, &datagram.data) {
            Ok(message) => message,
            Err(e) => {
                let reason = e.to_string();
                let error = AppError::from(e);
                self.logger
                    .debug("Malformed datagram")
                    .error_info(&error)
                    .field("source", datagram.source.to_string())
                    .field("reason", &reason)
                    .location(file!(), line!())
                    .log();
                self.emit(ProbeEvent::Malformed {
                    source: datagram.source,
                    reason,
                });
                return None;
            }
        };

        match message {
            IcmpMessage::EchoReply(echo) => {
                if echo.identifier != self.identifier {
                    // Another process's probe; raw sockets see every reply
                    return None;
                }

                let now = self.clock.now();
                let Some((sequence, round_trip)) = self.tracker.take_elapsed(echo.sequence, now) else {
                    crate::log_debug!(
                        self.logger,
                        "Untracked reply icmp_seq={} from {} (late, duplicate or evicted)",
                        echo.sequence,
                        datagram.source
                    );
                    return None;
                };

                let observation = Observation {
                    sequence,
                    round_trip,
                    ttl: datagram.ttl,
                    bytes: datagram.data.len(),
                    source: datagram.source,
                };
                self.state.record_received();
                self.logger.trace("Reply matched").observation(&observation).log();
                self.emit(ProbeEvent::Reply {
                    bytes: observation.bytes,
                    source: observation.source,
                    sequence,
                    round_trip,
                    ttl: observation.ttl,
                });
                Some(observation)
            }
            // Our own requests loop back on some platforms
            IcmpMessage::EchoRequest(_) => None,
            IcmpMessage::Other { icmp_type, code } => {
                self.emit(ProbeEvent::Unexpected {
                    icmp_type,
                    code,
                    source: datagram.source,
                });
                None
            }
        }
    }

    fn emit(&self, event: ProbeEvent) {
        // The printer may already be gone during teardown
        let _ = self.events.send(event);
    }
}
