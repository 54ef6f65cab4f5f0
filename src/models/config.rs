//! Configuration data model and validation

use crate::types::{AddressFamily, AppError, IpVersion, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Main application configuration, merged from defaults, environment and CLI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host name or address to probe
    #[serde(default)]
    pub destination: String,

    /// Number of probes to send; `None` keeps going until another condition stops the run
    #[serde(default)]
    pub count: Option<u64>,

    /// Seconds between probes
    #[serde(default = "default_interval_secs")]
    pub interval_seconds: f64,

    /// Echo payload size in bytes
    #[serde(default = "default_payload_size")]
    pub payload_size: usize,

    /// Outgoing TTL / hop limit
    #[serde(default = "default_ttl")]
    pub ttl: u8,

    /// Wall-clock limit for the whole run in seconds
    #[serde(default)]
    pub deadline_seconds: Option<f64>,

    /// Address family restriction for name resolution
    #[serde(default)]
    pub address_family: AddressFamily,

    /// Name server to use instead of the system configuration
    #[serde(default)]
    pub dns_server: Option<String>,

    /// Enable colored terminal output
    #[serde(default = "default_enable_color")]
    pub enable_color: bool,

    /// Enable verbose output
    #[serde(default)]
    pub verbose: bool,

    /// Enable debug output
    #[serde(default)]
    pub debug: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            destination: String::new(),
            count: None,
            interval_seconds: default_interval_secs(),
            payload_size: default_payload_size(),
            ttl: default_ttl(),
            deadline_seconds: None,
            address_family: AddressFamily::Any,
            dns_server: None,
            enable_color: default_enable_color(),
            verbose: false,
            debug: false,
        }
    }
}

impl Config {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the probe interval as Duration, clamped to the accepted range
    pub fn interval(&self) -> Duration {
        Duration::try_from_secs_f64(self.interval_seconds)
            .unwrap_or(crate::defaults::DEFAULT_INTERVAL)
            .clamp(crate::defaults::MIN_INTERVAL, crate::defaults::MAX_INTERVAL)
    }

    /// Get the run deadline as Duration
    ///
    /// Anything past [`crate::defaults::MAX_DEADLINE`], including values too
    /// large for a `Duration`, is that maximum.
    pub fn deadline(&self) -> Option<Duration> {
        self.deadline_seconds.map(|secs| {
            Duration::try_from_secs_f64(secs)
                .map_or(crate::defaults::MAX_DEADLINE, |d| d.min(crate::defaults::MAX_DEADLINE))
        })
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.destination.trim().is_empty() {
            return Err(AppError::config("Destination cannot be empty"));
        }

        if self.count == Some(0) {
            return Err(AppError::validation("Count must be greater than 0"));
        }

        if !self.interval_seconds.is_finite()
            || self.interval_seconds < crate::defaults::MIN_INTERVAL.as_secs_f64()
        {
            return Err(AppError::validation(format!(
                "Interval must be at least {}s, got: {}",
                crate::defaults::MIN_INTERVAL.as_secs_f64(),
                self.interval_seconds
            )));
        }

        if self.interval_seconds > crate::defaults::MAX_INTERVAL.as_secs_f64() {
            return Err(AppError::validation(format!(
                "Interval cannot exceed {}s",
                crate::defaults::MAX_INTERVAL.as_secs()
            )));
        }

        if self.payload_size > crate::defaults::MAX_PAYLOAD_SIZE {
            return Err(AppError::validation(format!(
                "Payload size cannot exceed {} bytes",
                crate::defaults::MAX_PAYLOAD_SIZE
            )));
        }

        if self.ttl == 0 {
            return Err(AppError::validation("TTL must be between 1 and 255"));
        }

        if let Some(deadline) = self.deadline_seconds {
            if !deadline.is_finite() || deadline <= 0.0 {
                return Err(AppError::validation(format!(
                    "Deadline must be greater than 0, got: {}",
                    deadline
                )));
            }
        }

        if let Some(ref server) = self.dns_server {
            crate::dns::parse_dns_config(server)
                .map_err(|e| AppError::config(format!("Invalid DNS server setting: {}", e)))?;
        }

        Ok(())
    }

    /// Merge environment variables into this configuration
    pub fn merge_from_env(&mut self) -> Result<()> {
        if let Ok(count) = std::env::var("PING_COUNT") {
            self.count = Some(count.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_COUNT value '{}': {}", count, e)))?);
        }

        if let Ok(interval) = std::env::var("PING_INTERVAL") {
            self.interval_seconds = interval.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_INTERVAL value '{}': {}", interval, e)))?;
        }

        if let Ok(size) = std::env::var("PING_SIZE") {
            self.payload_size = size.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_SIZE value '{}': {}", size, e)))?;
        }

        if let Ok(ttl) = std::env::var("PING_TTL") {
            self.ttl = ttl.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_TTL value '{}': {}", ttl, e)))?;
        }

        if let Ok(deadline) = std::env::var("PING_DEADLINE") {
            self.deadline_seconds = Some(deadline.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_DEADLINE value '{}': {}", deadline, e)))?);
        }

        if let Ok(enable_color) = std::env::var("PING_ENABLE_COLOR") {
            self.enable_color = enable_color.trim().parse()
                .map_err(|e| AppError::config(format!("Invalid PING_ENABLE_COLOR value '{}': {}", enable_color, e)))?;
        }

        Ok(())
    }
}

/// Immutable parameters of one run, fixed once the destination is resolved
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub destination: IpAddr,
    pub count: Option<u64>,
    pub ttl: u8,
    pub interval: Duration,
    pub payload_size: usize,
    pub deadline: Option<Duration>,
}

impl RunConfig {
    /// Defaults for `destination`: unbounded count and deadline, 1s interval
    pub fn new(destination: IpAddr) -> Self {
        Self {
            destination,
            count: None,
            ttl: crate::defaults::DEFAULT_TTL,
            interval: crate::defaults::DEFAULT_INTERVAL,
            payload_size: crate::defaults::DEFAULT_PAYLOAD_SIZE,
            deadline: None,
        }
    }

    /// Build from a validated `Config` and its resolved destination
    pub fn from_config(config: &Config, destination: IpAddr) -> Self {
        Self {
            destination,
            count: config.count,
            ttl: config.ttl,
            interval: config.interval(),
            payload_size: config.payload_size,
            deadline: config.deadline(),
        }
    }

    pub fn with_count(mut self, count: u64) -> Self {
        self.count = Some(count);
        self
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_payload_size(mut self, payload_size: usize) -> Self {
        self.payload_size = payload_size;
        self
    }

    pub fn with_ttl(mut self, ttl: u8) -> Self {
        self.ttl = ttl;
        self
    }

    /// IP version of the destination
    pub fn ip_version(&self) -> IpVersion {
        IpVersion::of(&self.destination)
    }

    /// How long the request tracker keeps an unanswered probe
    pub fn tracker_retention(&self) -> Duration {
        (self.interval * 10).max(Duration::from_secs(10))
    }
}

// Default value functions for serde
fn default_interval_secs() -> f64 {
    crate::defaults::DEFAULT_INTERVAL.as_secs_f64()
}

fn default_payload_size() -> usize {
    crate::defaults::DEFAULT_PAYLOAD_SIZE
}

fn default_ttl() -> u8 {
    crate::defaults::DEFAULT_TTL
}

fn default_enable_color() -> bool {
    crate::defaults::DEFAULT_ENABLE_COLOR
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            destination: "127.0.0.1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_values() {
        let config = Config::default();
        assert_eq!(config.count, None);
        assert_eq!(config.interval(), Duration::from_secs(1));
        assert_eq!(config.payload_size, 56);
        assert_eq!(config.ttl, 128);
        assert_eq!(config.deadline(), None);
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_empty_destination_invalid() {
        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn test_zero_count_invalid() {
        let mut config = valid_config();
        config.count = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_interval_bounds() {
        let mut config = valid_config();
        config.interval_seconds = 0.0;
        assert!(config.validate().is_err());

        config.interval_seconds = f64::NAN;
        assert!(config.validate().is_err());

        config.interval_seconds = 0.2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_payload_and_ttl_bounds() {
        let mut config = valid_config();
        config.payload_size = 70_000;
        assert!(config.validate().is_err());

        let mut config = valid_config();
        config.ttl = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deadline_must_be_positive() {
        let mut config = valid_config();
        config.deadline_seconds = Some(0.0);
        assert!(config.validate().is_err());

        config.deadline_seconds = Some(2.5);
        assert!(config.validate().is_ok());
        assert_eq!(config.deadline(), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_huge_deadline_is_capped() {
        let mut config = valid_config();
        for secs in [1e19, 1e20, f64::MAX] {
            config.deadline_seconds = Some(secs);
            assert!(config.validate().is_ok());
            assert_eq!(config.deadline(), Some(crate::defaults::MAX_DEADLINE));
        }

        let run = RunConfig::from_config(&config, "127.0.0.1".parse().unwrap());
        assert_eq!(run.deadline, Some(crate::defaults::MAX_DEADLINE));
    }

    #[test]
    fn test_invalid_dns_server() {
        let mut config = valid_config();
        config.dns_server = Some("not-an-ip".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_run_config_from_config() {
        let mut config = valid_config();
        config.count = Some(3);
        config.interval_seconds = 0.5;
        let addr: IpAddr = "::1".parse().unwrap();

        let run = RunConfig::from_config(&config, addr);
        assert_eq!(run.count, Some(3));
        assert_eq!(run.interval, Duration::from_millis(500));
        assert_eq!(run.ip_version(), IpVersion::V6);
    }

    #[test]
    fn test_tracker_retention_floor() {
        let run = RunConfig::new("127.0.0.1".parse().unwrap())
            .with_interval(Duration::from_millis(10));
        assert_eq!(run.tracker_retention(), Duration::from_secs(10));

        let run = run.with_interval(Duration::from_secs(5));
        assert_eq!(run.tracker_retention(), Duration::from_secs(50));
    }
}
