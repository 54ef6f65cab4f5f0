//! Probe execution engine
//!
//! A run is four concurrent parts sharing one [`RunState`]:
//! - the tick loop in [`Pinger::run`] drives the [`Sender`] once per interval
//! - the [`Receiver`] matches replies against the [`RequestTracker`]
//! - the [`LifecycleMonitor`] fires the shutdown token when the run is over
//! - whoever holds [`Pinger::shutdown_token`] can stop the run early
//!
//! Once every task has exited the counters and observations are folded
//! into a [`RunReport`].

pub mod monitor;
pub mod receiver;
pub mod sender;
pub mod state;
pub mod tracker;

pub use monitor::LifecycleMonitor;
pub use receiver::{Receiver, ReceiverOutcome};
pub use sender::{SendError, Sender};
pub use state::RunState;
pub use tracker::RequestTracker;

use crate::clock::{Clock, MonotonicClock};
use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::models::{RunConfig, RunReport};
use crate::transport::PacketTransport;
use crate::types::ProbeEvent;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Pick a per-run echo identifier
pub fn random_identifier() -> u16 {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    u16::from_be_bytes([bytes[0], bytes[1]])
}

/// One ping run against a resolved destination
pub struct Pinger<T: PacketTransport + 'static> {
    config: RunConfig,
    transport: Arc<T>,
    clock: Arc<dyn Clock>,
    identifier: u16,
    shutdown: CancellationToken,
    events: mpsc::UnboundedSender<ProbeEvent>,
    logger: Arc<Logger>,
}

impl<T: PacketTransport + 'static> Pinger<T> {
    pub fn new(config: RunConfig, transport: Arc<T>, events: mpsc::UnboundedSender<ProbeEvent>) -> Self {
        Self {
            config,
            transport,
            clock: Arc::new(MonotonicClock),
            identifier: random_identifier(),
            shutdown: CancellationToken::new(),
            events,
            logger: Arc::new(Logger::quiet("ENGINE")),
        }
    }

    /// Measure round trips with `clock` instead of the runtime clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn with_logger(mut self, logger: Arc<Logger>) -> Self {
        self.logger = logger;
        self
    }

    /// Echo identifier carried by every probe of this run
    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Cancelling this token ends the run; cancelling it again is a no-op
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Drive the run to completion
    ///
    /// Sends the first probe immediately and one more every interval until
    /// `count` probes have gone out or the run is shut down, then waits for
    /// the receiver and monitor to exit.
    pub async fn run(self) -> Result<RunReport> {
        let state = Arc::new(RunState::new(self.clock.now(), self.shutdown.clone()));
        let tracker = Arc::new(RequestTracker::new());

        self.logger
            .info("Run started")
            .field("destination", self.config.destination.to_string())
            .field("identifier", self.identifier)
            .field("count", self.config.count)
            .field("interval_ms", self.config.interval.as_millis() as u64)
            .log();

        let receiver = Receiver::new(
            self.identifier,
            self.config.ip_version(),
            self.config.interval,
            self.transport.clone(),
            tracker.clone(),
            state.clone(),
            self.clock.clone(),
            self.events.clone(),
            self.logger.clone(),
        );
        let receiver_handle = tokio::spawn(receiver.run());

        let monitor = LifecycleMonitor::new(state.clone(), &self.config, Instant::now());
        let monitor_handle = tokio::spawn(monitor.run());

        let mut sender = Sender::new(
            &self.config,
            self.identifier,
            self.transport.clone(),
            tracker,
            state.clone(),
            self.clock.clone(),
        );

        let mut ticker = tokio::time::interval(self.config.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if self.config.count.is_some_and(|count| state.sent() >= count) {
                self.shutdown.cancelled().await;
                break;
            }

            tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = sender.send_one().await {
                        crate::log_debug!(self.logger, "Send failed {}", e);
                        let _ = self.events.send(ProbeEvent::SendFailed {
                            sequence: e.sequence,
                            reason: e.source.to_string(),
                        });
                    }
                }
            }
        }

        let outcome = receiver_handle
            .await
            .map_err(|e| AppError::internal(format!("Receiver task failed: {}", e)))?;
        let reason = monitor_handle
            .await
            .map_err(|e| AppError::internal(format!("Lifecycle monitor task failed: {}", e)))?;

        let report = RunReport {
            sent: state.sent(),
            received: state.received(),
            started_at: state.started_at(),
            observations: outcome.observations,
            reason,
            receive_error: outcome.error.map(|e| e.to_string()),
        };

        crate::log_info!(
            self.logger,
            "Run finished ({}): {} sent, {} received",
            report.reason,
            report.sent,
            report.received
        );

        Ok(report)
    }
}
