//! Scan target types and IPv4 resolution.
//!
//! A target is a single host resolved to an IPv4 address together with the
//! ordered set of ports to probe on it.

use super::Port;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr};
use tracing::debug;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

/// A single host resolved to IPv4, plus the ports to scan on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    /// The original input (hostname or IP string).
    pub original: String,
    /// The resolved IPv4 address.
    pub ip: Ipv4Addr,
    ports: Vec<Port>,
}

impl ScanTarget {
    /// Create a new scan target.
    ///
    /// Ports are sorted and deduplicated, so the stored set is always
    /// strictly ascending.
    pub fn new(original: impl Into<String>, ip: Ipv4Addr, ports: impl IntoIterator<Item = Port>) -> Self {
        let mut ports: Vec<Port> = ports.into_iter().collect();
        ports.sort_unstable();
        ports.dedup();
        Self {
            original: original.into(),
            ip,
            ports,
        }
    }

    /// Ports to probe, ascending.
    pub fn ports(&self) -> &[Port] {
        &self.ports
    }
}

impl fmt::Display for ScanTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.original == self.ip.to_string() {
            write!(f, "{}", self.ip)
        } else {
            write!(f, "{} ({})", self.original, self.ip)
        }
    }
}

/// Error type for target resolution.
#[derive(Debug, Clone, thiserror::Error)]
pub enum TargetError {
    #[error("target is empty")]
    Empty,
    #[error("IPv6 targets are not supported: {0}")]
    Ipv6Unsupported(String),
    #[error("failed to resolve hostname '{0}': {1}")]
    DnsResolutionFailed(String, String),
    #[error("no IPv4 addresses found for hostname '{0}'")]
    NoAddressesFound(String),
}

/// Resolve a hostname or dotted-quad string to an IPv4 address.
///
/// Literal addresses short-circuit; hostnames go through the system resolver
/// configuration (hosts file included) and the first A record wins.
pub async fn resolve_ipv4(host: &str) -> Result<Ipv4Addr, TargetError> {
    let host = host.trim();
    if host.is_empty() {
        return Err(TargetError::Empty);
    }

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V4(ip)) => return Ok(ip),
        Ok(IpAddr::V6(_)) => return Err(TargetError::Ipv6Unsupported(host.to_string())),
        Err(_) => {}
    }

    let resolver = TokioAsyncResolver::tokio_from_system_conf().unwrap_or_else(|e| {
        debug!(error = %e, "system resolver config unavailable, using defaults");
        TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default())
    });

    let response = resolver
        .lookup_ip(host)
        .await
        .map_err(|e| TargetError::DnsResolutionFailed(host.to_string(), e.to_string()))?;

    response
        .iter()
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| TargetError::NoAddressesFound(host.to_string()))
}
