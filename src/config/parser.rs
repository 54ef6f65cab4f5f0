//! Configuration parsing from CLI arguments and environment variables

use crate::{cli::Cli, config::env::EnvManager, error::Result, models::Config};

/// Configuration parser that combines CLI arguments with environment variables
pub struct ConfigParser {
    cli: Cli,
}

impl ConfigParser {
    /// Create a new configuration parser with CLI arguments
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Parse and build the complete configuration
    ///
    /// Precedence, lowest first: defaults, `.env`, environment, CLI flags.
    pub fn parse(&self) -> Result<Config> {
        let mut config = Config::default();

        EnvManager::load_env_file()?;
        config.merge_from_env()?;
        self.apply_cli_overrides(&mut config);

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI argument overrides to configuration
    fn apply_cli_overrides(&self, config: &mut Config) {
        config.destination = self.cli.destination.trim().to_string();

        if let Some(count) = self.cli.count {
            config.count = Some(count);
        }
        if let Some(interval) = self.cli.interval {
            config.interval_seconds = interval;
        }
        if let Some(payload_size) = self.cli.payload_size {
            config.payload_size = payload_size;
        }
        if let Some(ttl) = self.cli.ttl {
            config.ttl = ttl;
        }
        if let Some(deadline) = self.cli.deadline {
            config.deadline_seconds = Some(deadline);
        }
        if let Some(ref server) = self.cli.dns_server {
            config.dns_server = Some(server.clone());
        }

        config.address_family = self.cli.address_family();
        config.enable_color = config.enable_color && self.cli.use_colors();

        // CLI-only flags
        config.verbose = self.cli.verbose;
        config.debug = self.cli.debug;
    }
}

/// Convenience function to load complete configuration from CLI arguments
pub fn load_config(cli: Cli) -> Result<Config> {
    ConfigParser::new(cli).parse()
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &Config) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Destination: {}", config.destination));
    summary.push(format!(
        "Count: {}",
        config.count.map_or_else(|| "unbounded".to_string(), |c| c.to_string())
    ));
    summary.push(format!("Interval: {}s", config.interval_seconds));
    summary.push(format!("Payload: {} bytes", config.payload_size));
    summary.push(format!("TTL: {}", config.ttl));
    summary.push(format!(
        "Deadline: {}",
        config.deadline_seconds.map_or_else(|| "none".to_string(), |d| format!("{}s", d))
    ));
    summary.push(format!("Address family: {:?}", config.address_family));
    summary.push(format!(
        "DNS server: {}",
        config.dns_server.as_deref().unwrap_or("system")
    ));
    summary.push(format!("Color Output: {}", config.enable_color));
    summary.push(format!("Verbose: {}", config.verbose));
    summary.push(format!("Debug: {}", config.debug));

    summary.join("\n")
}
