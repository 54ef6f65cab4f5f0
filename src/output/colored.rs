//! Colored formatter implementation with terminal color support
//!
//! Wraps [`PlainFormatter`] line layouts and colors the parts worth
//! scanning for: round-trip times by latency band, loss by severity and
//! error lines in red.

use super::formatter::{
    format_ms, format_ttl, FormattingOptions, OutputFormatter, PlainFormatter,
};
use crate::stats::{RttSummary, RunStatistics};
use crate::types::ProbeEvent;
use colored::*;
use std::net::IpAddr;
use std::time::Duration;

/// Latency band used to color round-trip times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LatencyLevel {
    Excellent, // < 50ms
    Good,      // 50-100ms
    Fair,      // 100-300ms
    Poor,      // 300-1000ms
    VeryPoor,  // > 1000ms
}

impl LatencyLevel {
    /// Determine latency band from a round-trip time
    pub fn from_round_trip(round_trip: Duration) -> Self {
        let time_ms = round_trip.as_secs_f64() * 1000.0;
        if time_ms < 50.0 {
            Self::Excellent
        } else if time_ms < 100.0 {
            Self::Good
        } else if time_ms < 300.0 {
            Self::Fair
        } else if time_ms < 1000.0 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub fn color(&self) -> Color {
        match self {
            Self::Excellent => Color::Green,
            Self::Good => Color::Cyan,
            Self::Fair => Color::Yellow,
            Self::Poor => Color::Magenta,
            Self::VeryPoor => Color::Red,
        }
    }
}

/// Color scheme configuration
#[derive(Debug, Clone)]
pub struct ColorScheme {
    pub header: Color,
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub muted: Color,
}

impl Default for ColorScheme {
    fn default() -> Self {
        Self {
            header: Color::Blue,
            success: Color::Green,
            warning: Color::Yellow,
            error: Color::Red,
            muted: Color::BrightBlack,
        }
    }
}

/// Colored formatter implementation
pub struct ColoredFormatter {
    plain_formatter: PlainFormatter,
    options: FormattingOptions,
    color_scheme: ColorScheme,
}

impl ColoredFormatter {
    /// Create a new colored formatter with options
    pub fn new(options: FormattingOptions) -> Self {
        Self::with_color_scheme(options, ColorScheme::default())
    }

    /// Create a colored formatter with custom color scheme
    pub fn with_color_scheme(options: FormattingOptions, color_scheme: ColorScheme) -> Self {
        let plain_formatter = PlainFormatter::new(options.clone());
        Self {
            plain_formatter,
            options,
            color_scheme,
        }
    }

    /// Apply color to text if colors are enabled
    fn colorize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color)
        } else {
            text.normal()
        }
    }

    /// Bold and colored, or untouched when colors are disabled
    fn emphasize(&self, text: &str, color: Color) -> ColoredString {
        if self.options.enable_color {
            text.color(color).bold()
        } else {
            text.normal()
        }
    }

    fn loss_color(&self, loss_percent: u64) -> Color {
        match loss_percent {
            0 => self.color_scheme.success,
            100 => self.color_scheme.error,
            _ => self.color_scheme.warning,
        }
    }

    /// Check if terminal supports colors
    pub fn supports_color() -> bool {
        std::env::var("NO_COLOR").is_err()
            && std::env::var("TERM").map(|term| term != "dumb").unwrap_or(true)
    }

    /// Enable or disable colors at runtime
    pub fn set_colors_enabled(&mut self, enabled: bool) {
        self.options.enable_color = enabled && Self::supports_color();
    }
}

impl OutputFormatter for ColoredFormatter {
    fn format_header(&self, destination: &str, address: IpAddr, payload_size: usize) -> String {
        let line = self.plain_formatter.format_header(destination, address, payload_size);
        self.emphasize(&line, self.color_scheme.header).to_string()
    }

    fn format_event(&self, event: &ProbeEvent) -> String {
        match event {
            ProbeEvent::Reply {
                bytes,
                source,
                sequence,
                round_trip,
                ttl,
            } => {
                let level = LatencyLevel::from_round_trip(*round_trip);
                let time = format!("time={} ms", format_ms(*round_trip));
                format!(
                    "{} bytes from {}: icmp_seq={} {} ttl={}",
                    bytes,
                    source,
                    sequence,
                    self.colorize(&time, level.color()),
                    format_ttl(*ttl)
                )
            }
            ProbeEvent::Timeout => self
                .colorize("Request timed out.", self.color_scheme.warning)
                .to_string(),
            ProbeEvent::Unexpected { .. } | ProbeEvent::Malformed { .. } => {
                let line = self.plain_formatter.format_event(event);
                self.colorize(&line, self.color_scheme.warning).to_string()
            }
            ProbeEvent::SendFailed { .. } | ProbeEvent::ReceiveFailed { .. } => {
                let line = self.plain_formatter.format_event(event);
                self.colorize(&line, self.color_scheme.error).to_string()
            }
        }
    }

    fn format_summary(&self, stats: &RunStatistics) -> String {
        let loss = format!("{}% loss", stats.loss_percent);
        format!(
            "{} packets transmitted, {} packets received, {}, {}",
            stats.sent,
            stats.received,
            self.emphasize(&loss, self.loss_color(stats.loss_percent)),
            self.colorize(
                &format!("time {} ms", stats.elapsed.as_millis()),
                self.color_scheme.muted
            )
        )
    }

    fn format_rtt(&self, rtt: &RttSummary) -> String {
        format!(
            "rtt min/max/avg: {}/{}/{} ms",
            self.colorize(&format_ms(rtt.min), LatencyLevel::from_round_trip(rtt.min).color()),
            self.colorize(&format_ms(rtt.max), LatencyLevel::from_round_trip(rtt.max).color()),
            self.colorize(&format_ms(rtt.avg), LatencyLevel::from_round_trip(rtt.avg).color())
        )
    }

    fn format_error(&self, error: &str) -> String {
        format!("{} {}", self.emphasize("ERROR:", self.color_scheme.error), error)
    }

    fn format_warning(&self, warning: &str) -> String {
        format!("{} {}", self.emphasize("WARNING:", self.color_scheme.warning), warning)
    }
}
