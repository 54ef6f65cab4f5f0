//! Destination resolution
//!
//! IP literals are used as-is. Host names go through `trust-dns-resolver`,
//! either with the system configuration or with the name servers given on
//! the command line.

use crate::{
    error::{AppError, Result},
    models::Config,
    types::AddressFamily,
};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use trust_dns_resolver::{
    config::{LookupIpStrategy, NameServerConfig, Protocol, ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};

/// Which name servers to ask
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DnsConfig {
    /// Whatever the host is configured with
    #[default]
    System,
    /// Explicit name servers, queried over UDP with TCP fallback
    Custom { servers: Vec<IpAddr> },
}

/// Parse `--dns-server`: `system`, one IP, or a comma separated list
pub fn parse_dns_config(input: &str) -> Result<DnsConfig> {
    let input = input.trim();

    if input.is_empty() || input.eq_ignore_ascii_case("system") || input.eq_ignore_ascii_case("default") {
        return Ok(DnsConfig::System);
    }

    let mut servers = Vec::new();
    for part in input.split(',') {
        let ip = part
            .trim()
            .parse::<IpAddr>()
            .map_err(|e| AppError::parse(format!("Invalid DNS server address '{}': {}", part.trim(), e)))?;
        servers.push(ip);
    }
    Ok(DnsConfig::Custom { servers })
}

/// Resolves a destination to the single address a run will probe
#[derive(Debug, Clone)]
pub struct Resolver {
    dns_config: DnsConfig,
    family: AddressFamily,
}

impl Resolver {
    pub fn new(dns_config: DnsConfig, family: AddressFamily) -> Self {
        Self { dns_config, family }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let dns_config = match &config.dns_server {
            Some(server) => parse_dns_config(server)?,
            None => DnsConfig::System,
        };
        Ok(Self::new(dns_config, config.address_family))
    }

    pub fn family(&self) -> AddressFamily {
        self.family
    }

    /// Resolve `destination` to the first address allowed by the family
    /// restriction
    pub async fn resolve(&self, destination: &str) -> Result<IpAddr> {
        if let Some(literal) = parse_ip_literal(destination) {
            if !self.family.accepts(&literal) {
                return Err(AppError::dns_resolution(format!(
                    "Address {} does not match the requested address family",
                    literal
                )));
            }
            return Ok(literal);
        }

        let addresses = self.lookup_all(destination).await?;
        select_address(destination, &addresses, self.family)
    }

    /// Every address the name servers return for `host`
    pub async fn lookup_all(&self, host: &str) -> Result<Vec<IpAddr>> {
        let resolver = self.build_resolver()?;
        let response = resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::dns_resolution(format!("DNS lookup failed for {}: {}", host, e)))?;
        Ok(response.iter().collect())
    }

    fn build_resolver(&self) -> Result<TokioAsyncResolver> {
        let (config, mut opts) = match &self.dns_config {
            DnsConfig::System => system_conf::read_system_conf().map_err(|e| {
                AppError::dns_resolution(format!("Failed to read system DNS config: {}", e))
            })?,
            DnsConfig::Custom { servers } => (custom_resolver_config(servers)?, ResolverOpts::default()),
        };

        opts.ip_strategy = match self.family {
            AddressFamily::Any => LookupIpStrategy::Ipv4thenIpv6,
            AddressFamily::V4Only => LookupIpStrategy::Ipv4Only,
            AddressFamily::V6Only => LookupIpStrategy::Ipv6Only,
        };

        Ok(TokioAsyncResolver::tokio(config, opts))
    }
}

fn custom_resolver_config(servers: &[IpAddr]) -> Result<ResolverConfig> {
    if servers.is_empty() {
        return Err(AppError::validation("No DNS servers provided"));
    }

    let mut config = ResolverConfig::new();
    for &server in servers {
        let socket_addr = SocketAddr::new(server, 53);
        config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Udp));
        config.add_name_server(NameServerConfig::new(socket_addr, Protocol::Tcp));
    }
    Ok(config)
}

/// `192.0.2.1`, `2001:db8::1` or `[2001:db8::1]`
fn parse_ip_literal(destination: &str) -> Option<IpAddr> {
    let trimmed = destination.trim();
    let unbracketed = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .unwrap_or(trimmed);
    unbracketed.parse().ok()
}

/// First address accepted by `family`
pub fn select_address(host: &str, addresses: &[IpAddr], family: AddressFamily) -> Result<IpAddr> {
    addresses
        .iter()
        .copied()
        .find(|addr| family.accepts(addr))
        .ok_or_else(|| {
            AppError::dns_resolution(match family {
                AddressFamily::Any => format!("No addresses found for {}", host),
                AddressFamily::V4Only => format!("No IPv4 address found for {}", host),
                AddressFamily::V6Only => format!("No IPv6 address found for {}", host),
            })
        })
}
