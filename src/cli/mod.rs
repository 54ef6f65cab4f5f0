//! Command-line interface

use clap::{ArgGroup, Parser};

/// Send ICMP echo requests to a host and report reachability, round-trip
/// latency and packet loss
#[derive(Parser, Debug, Clone)]
#[command(name = "ping-probe")]
#[command(version, about, long_about = None)]
#[command(group(ArgGroup::new("family").args(["ipv4", "ipv6"])))]
pub struct Cli {
    /// Host name or IP address to probe
    #[arg(value_name = "DESTINATION")]
    pub destination: String,

    /// Stop after sending this many probes [default: unbounded]
    #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,

    /// Seconds between probes [default: 1.0]
    #[arg(short, long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub interval: Option<f64>,

    /// Echo payload size in bytes [default: 56]
    #[arg(short = 's', long = "size", value_name = "BYTES")]
    pub payload_size: Option<usize>,

    /// Outgoing TTL / hop limit [default: 128]
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(1..))]
    pub ttl: Option<u8>,

    /// Stop after this many seconds regardless of count
    #[arg(short = 'w', long, value_name = "SECONDS", value_parser = parse_seconds)]
    pub deadline: Option<f64>,

    /// Only use IPv4
    #[arg(short = '4')]
    pub ipv4: bool,

    /// Only use IPv6
    #[arg(short = '6')]
    pub ipv6: bool,

    /// Name server(s) to resolve DESTINATION with (comma-separated)
    #[arg(long, value_name = "IP")]
    pub dns_server: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Cli {
    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && supports_color()
    }

    /// Address family requested with `-4` / `-6`
    pub fn address_family(&self) -> crate::types::AddressFamily {
        use crate::types::AddressFamily;
        match (self.ipv4, self.ipv6) {
            (true, _) => AddressFamily::V4Only,
            (_, true) => AddressFamily::V6Only,
            _ => AddressFamily::Any,
        }
    }
}

/// Parse a positive, finite number of seconds
fn parse_seconds(s: &str) -> Result<f64, String> {
    let secs: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("Invalid number of seconds: {}", s))?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err(format!("Seconds must be greater than 0, got: {}", s));
    }
    Ok(secs)
}

/// Check if the terminal supports color output
pub fn supports_color() -> bool {
    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    // Check for NO_COLOR environment variable
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    if std::env::var("FORCE_COLOR").is_ok() {
        return true;
    }

    #[cfg(target_os = "windows")]
    {
        if std::env::var("ANSICON").is_ok() || std::env::var("ConEmuANSI").is_ok() {
            return true;
        }
    }

    #[cfg(unix)]
    {
        true
    }
    #[cfg(not(unix))]
    {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AddressFamily;

    #[test]
    fn test_cli_parsing_basic() {
        let cli = Cli::parse_from(["ping-probe", "example.com"]);
        assert_eq!(cli.destination, "example.com");
        assert_eq!(cli.count, None);
        assert_eq!(cli.interval, None);
        assert_eq!(cli.address_family(), AddressFamily::Any);
        assert!(!cli.verbose);
        assert!(!cli.debug);
    }

    #[test]
    fn test_cli_parsing_all_options() {
        let cli = Cli::parse_from([
            "ping-probe",
            "-c", "5",
            "-i", "0.2",
            "-s", "100",
            "-t", "64",
            "-w", "10",
            "-6",
            "--dns-server", "2001:4860:4860::8888",
            "--no-color",
            "--verbose",
            "--debug",
            "ipv6.example.com",
        ]);

        assert_eq!(cli.count, Some(5));
        assert_eq!(cli.interval, Some(0.2));
        assert_eq!(cli.payload_size, Some(100));
        assert_eq!(cli.ttl, Some(64));
        assert_eq!(cli.deadline, Some(10.0));
        assert_eq!(cli.address_family(), AddressFamily::V6Only);
        assert_eq!(cli.dns_server.as_deref(), Some("2001:4860:4860::8888"));
        assert!(cli.no_color);
        assert!(!cli.use_colors());
        assert!(cli.verbose);
        assert!(cli.debug);
        assert_eq!(cli.destination, "ipv6.example.com");
    }

    #[test]
    fn test_invalid_arguments_rejected() {
        assert!(Cli::try_parse_from(["ping-probe"]).is_err());
        assert!(Cli::try_parse_from(["ping-probe", "-c", "0", "h"]).is_err());
        assert!(Cli::try_parse_from(["ping-probe", "-t", "0", "h"]).is_err());
        assert!(Cli::try_parse_from(["ping-probe", "-t", "256", "h"]).is_err());
        assert!(Cli::try_parse_from(["ping-probe", "-i", "-1", "h"]).is_err());
        assert!(Cli::try_parse_from(["ping-probe", "-w", "abc", "h"]).is_err());
        assert!(Cli::try_parse_from(["ping-probe", "-4", "-6", "h"]).is_err());
    }

    #[test]
    fn test_parse_seconds() {
        assert_eq!(parse_seconds("1.5"), Ok(1.5));
        assert!(parse_seconds("0").is_err());
        assert!(parse_seconds("inf").is_err());
        assert!(parse_seconds("NaN").is_err());
    }
}
