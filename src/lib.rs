//! ping-probe
//!
//! Sends ICMP echo requests to a destination at a fixed interval, matches
//! the echo replies, and reports per-reply round-trip times followed by
//! loss and latency statistics.

pub mod app;
pub mod cli;
pub mod clock;
pub mod config;
pub mod dns;
pub mod error;
pub mod executor;
pub mod logging;
pub mod models;
pub mod output;
pub mod stats;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use executor::Pinger;
pub use models::{Config, Observation, RunConfig, RunReport};
pub use output::{ColoredFormatter, OutputCoordinator, OutputFormatter, OutputFormatterFactory, PlainFormatter};
pub use stats::{RttSummary, RunStatistics};

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");
pub const PKG_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);
    pub const DEFAULT_PAYLOAD_SIZE: usize = 56;
    pub const DEFAULT_TTL: u8 = 128;
    pub const DEFAULT_ENABLE_COLOR: bool = true;

    pub const MIN_INTERVAL: Duration = Duration::from_millis(1);
    pub const MAX_INTERVAL: Duration = Duration::from_secs(3600);
    /// Longest deadline a run honors; larger values mean the same
    pub const MAX_DEADLINE: Duration = Duration::from_secs(i32::MAX as u64);
    /// Largest payload that fits an IPv4 datagram with the ICMP header
    pub const MAX_PAYLOAD_SIZE: usize = 65507;
}
