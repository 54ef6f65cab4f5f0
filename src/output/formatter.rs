//! Core formatting trait and the plain text implementation

use crate::stats::{RttSummary, RunStatistics};
use crate::types::ProbeEvent;
use std::net::IpAddr;
use std::time::Duration;

/// Turns run data into console lines (without trailing newline)
pub trait OutputFormatter: Send + Sync {
    /// `PING <destination> (<address>): <payload> data bytes`
    fn format_header(&self, destination: &str, address: IpAddr, payload_size: usize) -> String;

    /// One line per engine event
    fn format_event(&self, event: &ProbeEvent) -> String;

    /// Packet counts, loss and elapsed time
    fn format_summary(&self, stats: &RunStatistics) -> String;

    /// Round-trip min/max/avg
    fn format_rtt(&self, rtt: &RttSummary) -> String;

    /// Format error messages
    fn format_error(&self, error: &str) -> String;

    /// Format warning messages
    fn format_warning(&self, warning: &str) -> String;
}

/// Configuration options for formatting
#[derive(Debug, Clone)]
pub struct FormattingOptions {
    /// Enable colored output
    pub enable_color: bool,
    /// Append the ICMP type/code numbers to unexpected-message lines
    pub verbose_mode: bool,
}

impl Default for FormattingOptions {
    fn default() -> Self {
        Self {
            enable_color: true,
            verbose_mode: false,
        }
    }
}

/// Plain text formatter implementation
pub struct PlainFormatter {
    options: FormattingOptions,
}

impl PlainFormatter {
    /// Create a new plain formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self { options }
    }

    pub(crate) fn describe_unexpected(&self, icmp_type: u8, code: u8, source: IpAddr) -> String {
        let description = icmp_description(icmp_type, code, source.is_ipv6());
        if self.options.verbose_mode {
            format!("From {}: {} (type={} code={})", source, description, icmp_type, code)
        } else {
            format!("From {}: {}", source, description)
        }
    }
}

/// Milliseconds with three decimals
pub fn format_ms(duration: Duration) -> String {
    format!("{:.3}", duration.as_secs_f64() * 1000.0)
}

/// Received TTL, or `unknown` when the platform does not expose it
pub fn format_ttl(ttl: Option<u8>) -> String {
    match ttl {
        Some(ttl) => ttl.to_string(),
        None => "unknown".to_string(),
    }
}

/// Human-readable name of an ICMP error message
pub fn icmp_description(icmp_type: u8, code: u8, ipv6: bool) -> &'static str {
    if ipv6 {
        match (icmp_type, code) {
            (1, 0) => "No route to destination",
            (1, 1) => "Communication with destination administratively prohibited",
            (1, 3) => "Address unreachable",
            (1, 4) => "Port unreachable",
            (1, _) => "Destination unreachable",
            (2, _) => "Packet too big",
            (3, 0) => "Hop limit exceeded in transit",
            (3, _) => "Fragment reassembly time exceeded",
            (4, _) => "Parameter problem",
            _ => "Unexpected ICMPv6 message",
        }
    } else {
        match (icmp_type, code) {
            (3, 0) => "Destination net unreachable",
            (3, 1) => "Destination host unreachable",
            (3, 2) => "Destination protocol unreachable",
            (3, 3) => "Destination port unreachable",
            (3, 4) => "Fragmentation needed",
            (3, 13) => "Communication administratively prohibited",
            (3, _) => "Destination unreachable",
            (4, _) => "Source quench",
            (5, _) => "Redirect",
            (11, 0) => "Time to live exceeded",
            (11, _) => "Fragment reassembly time exceeded",
            (12, _) => "Parameter problem",
            _ => "Unexpected ICMP message",
        }
    }
}

impl OutputFormatter for PlainFormatter {
    fn format_header(&self, destination: &str, address: IpAddr, payload_size: usize) -> String {
        format!("PING {} ({}): {} data bytes", destination, address, payload_size)
    }

    fn format_event(&self, event: &ProbeEvent) -> String {
        match event {
            ProbeEvent::Reply {
                bytes,
                source,
                sequence,
                round_trip,
                ttl,
            } => format!(
                "{} bytes from {}: icmp_seq={} time={} ms ttl={}",
                bytes,
                source,
                sequence,
                format_ms(*round_trip),
                format_ttl(*ttl)
            ),
            ProbeEvent::Timeout => "Request timed out.".to_string(),
            ProbeEvent::Unexpected {
                icmp_type,
                code,
                source,
            } => self.describe_unexpected(*icmp_type, *code, *source),
            ProbeEvent::Malformed { source, reason } => {
                format!("Malformed packet from {}: {}", source, reason)
            }
            ProbeEvent::SendFailed { sequence, reason } => {
                format!("Send failed: icmp_seq={}: {}", sequence, reason)
            }
            ProbeEvent::ReceiveFailed { reason } => format!("Receive failed: {}", reason),
        }
    }

    fn format_summary(&self, stats: &RunStatistics) -> String {
        format!(
            "{} packets transmitted, {} packets received, {}% loss, time {} ms",
            stats.sent,
            stats.received,
            stats.loss_percent,
            stats.elapsed.as_millis()
        )
    }

    fn format_rtt(&self, rtt: &RttSummary) -> String {
        format!(
            "rtt min/max/avg: {}/{}/{} ms",
            format_ms(rtt.min),
            format_ms(rtt.max),
            format_ms(rtt.avg)
        )
    }

    fn format_error(&self, error: &str) -> String {
        format!("ERROR: {}", error)
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("WARNING: {}", warning)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn formatter() -> PlainFormatter {
        PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: false,
        })
    }

    #[test]
    fn test_header() {
        let line = formatter().format_header("example.com", "93.184.216.34".parse().unwrap(), 56);
        assert_eq!(line, "PING example.com (93.184.216.34): 56 data bytes");
    }

    #[test]
    fn test_reply_line() {
        let event = ProbeEvent::Reply {
            bytes: 64,
            source: "10.0.0.1".parse().unwrap(),
            sequence: 3,
            round_trip: Duration::from_micros(12_345),
            ttl: Some(57),
        };
        assert_eq!(
            formatter().format_event(&event),
            "64 bytes from 10.0.0.1: icmp_seq=3 time=12.345 ms ttl=57"
        );
    }

    #[test]
    fn test_reply_line_without_ttl() {
        let event = ProbeEvent::Reply {
            bytes: 64,
            source: "::1".parse().unwrap(),
            sequence: 0,
            round_trip: Duration::from_millis(1),
            ttl: None,
        };
        assert!(formatter().format_event(&event).ends_with("time=1.000 ms ttl=unknown"));
    }

    #[test]
    fn test_timeout_line() {
        assert_eq!(formatter().format_event(&ProbeEvent::Timeout), "Request timed out.");
    }

    #[test]
    fn test_unexpected_line() {
        let event = ProbeEvent::Unexpected {
            icmp_type: 11,
            code: 0,
            source: "192.0.2.254".parse().unwrap(),
        };
        assert_eq!(
            formatter().format_event(&event),
            "From 192.0.2.254: Time to live exceeded"
        );

        let verbose = PlainFormatter::new(FormattingOptions {
            enable_color: false,
            verbose_mode: true,
        });
        assert!(verbose.format_event(&event).ends_with("(type=11 code=0)"));
    }

    #[test]
    fn test_icmpv6_description() {
        assert_eq!(icmp_description(3, 0, true), "Hop limit exceeded in transit");
        assert_eq!(icmp_description(3, 1, false), "Destination host unreachable");
    }

    #[test]
    fn test_summary_and_rtt_lines() {
        let stats = RunStatistics {
            sent: 10,
            received: 7,
            loss_percent: 30,
            rtt: Some(RttSummary {
                min: Duration::from_micros(1_500),
                max: Duration::from_millis(20),
                avg: Duration::from_micros(7_250),
            }),
            elapsed: Duration::from_millis(9_012),
        };

        assert_eq!(
            formatter().format_summary(&stats),
            "10 packets transmitted, 7 packets received, 30% loss, time 9012 ms"
        );
        assert_eq!(
            formatter().format_rtt(stats.rtt.as_ref().unwrap()),
            "rtt min/max/avg: 1.500/20.000/7.250 ms"
        );
    }
}
