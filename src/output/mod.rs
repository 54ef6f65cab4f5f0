//! Output formatting and display system
//!
//! The engine never prints. It sends [`ProbeEvent`]s over a channel and the
//! [`OutputCoordinator`] turns them into lines; the header and the final
//! statistics go through the same formatter.

mod colored;
mod formatter;

pub use self::colored::{ColorScheme, ColoredFormatter, LatencyLevel};
pub use formatter::{
    format_ms, format_ttl, icmp_description, FormattingOptions, OutputFormatter, PlainFormatter,
};

use crate::error::{AppError, Result};
use crate::stats::RunStatistics;
use crate::types::ProbeEvent;
use std::io::Write;
use std::net::IpAddr;
use tokio::sync::mpsc;

/// Output formatting factory for creating appropriate formatters
pub struct OutputFormatterFactory;

impl OutputFormatterFactory {
    /// Create a formatter based on color support and preferences
    pub fn create_formatter(enable_color: bool, verbose: bool) -> Box<dyn OutputFormatter> {
        let options = FormattingOptions {
            enable_color,
            verbose_mode: verbose,
        };

        if enable_color {
            Box::new(ColoredFormatter::new(options))
        } else {
            Box::new(PlainFormatter::new(options))
        }
    }

    /// Create a plain text formatter for scripts/logs
    pub fn create_plain_formatter() -> Box<dyn OutputFormatter> {
        Self::create_formatter(false, false)
    }
}

/// Main output coordinator that handles all run display
pub struct OutputCoordinator {
    formatter: Box<dyn OutputFormatter>,
}

impl OutputCoordinator {
    /// Create a new output coordinator with the specified formatter
    pub fn new(formatter: Box<dyn OutputFormatter>) -> Self {
        Self { formatter }
    }

    pub fn formatter(&self) -> &dyn OutputFormatter {
        self.formatter.as_ref()
    }

    pub fn display_header(&self, destination: &str, address: IpAddr, payload_size: usize) -> String {
        self.formatter.format_header(destination, address, payload_size)
    }

    /// Summary line, followed by the RTT line when anything was received
    pub fn display_statistics(&self, stats: &RunStatistics) -> Vec<String> {
        let mut lines = vec![self.formatter.format_summary(stats)];
        if stats.has_replies() {
            if let Some(rtt) = &stats.rtt {
                lines.push(self.formatter.format_rtt(rtt));
            }
        }
        lines
    }

    pub fn display_event(&self, event: &ProbeEvent) -> String {
        self.formatter.format_event(event)
    }

    /// Write each event to `out` until every sender is dropped
    ///
    /// Returns the number of events written.
    pub async fn drain_events<W: Write>(
        &self,
        mut events: mpsc::UnboundedReceiver<ProbeEvent>,
        out: &mut W,
    ) -> Result<usize> {
        let mut written = 0;
        while let Some(event) = events.recv().await {
            writeln!(out, "{}", self.display_event(&event))
                .and_then(|_| out.flush())
                .map_err(|e| AppError::io(format!("Failed to write output: {}", e)))?;
            written += 1;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::RttSummary;
    use std::time::Duration;

    fn coordinator() -> OutputCoordinator {
        OutputCoordinator::new(OutputFormatterFactory::create_plain_formatter())
    }

    #[test]
    fn test_statistics_without_replies_has_single_line() {
        let stats = RunStatistics {
            sent: 3,
            received: 0,
            loss_percent: 100,
            rtt: None,
            elapsed: Duration::from_secs(3),
        };
        let lines = coordinator().display_statistics(&stats);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].starts_with("3 packets transmitted, 0 packets received, 100% loss"));
    }

    #[test]
    fn test_statistics_with_replies_adds_rtt_line() {
        let rtt = Duration::from_millis(4);
        let stats = RunStatistics {
            sent: 2,
            received: 2,
            loss_percent: 0,
            rtt: Some(RttSummary {
                min: rtt,
                max: rtt,
                avg: rtt,
            }),
            elapsed: Duration::from_secs(2),
        };
        let lines = coordinator().display_statistics(&stats);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1], "rtt min/max/avg: 4.000/4.000/4.000 ms");
    }

    #[tokio::test]
    async fn test_drain_events_until_senders_drop() {
        let (tx, rx) = mpsc::unbounded_channel();
        tx.send(ProbeEvent::Timeout).unwrap();
        tx.send(ProbeEvent::ReceiveFailed {
            reason: "denied".to_string(),
        })
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        let written = coordinator().drain_events(rx, &mut out).await.unwrap();

        assert_eq!(written, 2);
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Request timed out.\nReceive failed: denied\n"
        );
    }

    #[test]
    fn test_factory_respects_color_flag() {
        let formatter = OutputFormatterFactory::create_formatter(false, false);
        assert_eq!(
            formatter.format_header("h", "127.0.0.1".parse().unwrap(), 8),
            "PING h (127.0.0.1): 8 data bytes"
        );
    }
}
