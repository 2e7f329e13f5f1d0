//! Scanner trait abstraction.
//!
//! Defines a common interface for the probe strategies so the worker pool
//! can dispatch to connect or SYN probing without knowing which one it has.

use crate::error::ScanError;
use crate::types::Port;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;

/// Verdict of a single probe attempt, before it is collapsed to open/closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Handshake completed, or SYN+ACK seen.
    Open,
    /// Connection refused, or RST seen.
    Closed,
    /// No readiness before the deadline.
    FilteredOrTimeout,
    /// A correlated reply that was neither SYN+ACK nor RST.
    Unknown,
    /// The probe could not be carried out locally.
    Error(String),
}

impl ProbeOutcome {
    /// Only a positive answer counts as open; everything else is closed.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Closed => write!(f, "closed"),
            Self::FilteredOrTimeout => write!(f, "filtered/timeout"),
            Self::Unknown => write!(f, "unknown"),
            Self::Error(reason) => write!(f, "error: {}", reason),
        }
    }
}

impl From<&ScanError> for ProbeOutcome {
    fn from(err: &ScanError) -> Self {
        match err {
            ScanError::ConnectionRefused => Self::Closed,
            ScanError::Timeout => Self::FilteredOrTimeout,
            ScanError::ConnectionFailed { .. } => Self::Closed,
            other => Self::Error(other.to_string()),
        }
    }
}

/// Result of scanning a single port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortResult {
    /// The port number that was scanned.
    pub port: Port,
    /// Whether the port answered positively.
    pub open: bool,
    /// Banner captured from the service (if any).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
}

impl PortResult {
    /// Create a result with no banner.
    pub fn new(port: Port, open: bool) -> Self {
        Self {
            port,
            open,
            banner: None,
        }
    }

    /// Collapse a probe outcome into a result.
    pub fn from_outcome(port: Port, outcome: &ProbeOutcome) -> Self {
        Self::new(port, outcome.is_open())
    }

    /// Set the banner. Empty banners are stored as `None`.
    pub fn with_banner(mut self, banner: Option<String>) -> Self {
        self.banner = banner.filter(|b| !b.is_empty());
        self
    }
}

/// Probe strategy used for a scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanMode {
    /// TCP connect scan (no special privileges required).
    #[default]
    Connect,
    /// Half-open SYN scan (raw sockets, requires privileges).
    Syn,
}

impl ScanMode {
    /// Human-readable name for console output.
    pub fn label(self) -> &'static str {
        match self {
            Self::Connect => "TCP Connect",
            Self::Syn => "SYN Stealth",
        }
    }
}

impl fmt::Display for ScanMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connect => write!(f, "connect"),
            Self::Syn => write!(f, "syn"),
        }
    }
}

/// Trait for port probe implementations.
///
/// Implementations are shared by every worker thread, so they hold only
/// immutable configuration. Any socket a probe opens belongs to the calling
/// worker and is closed before `scan_port` returns.
pub trait Scanner: Send + Sync {
    /// Get the scan mode this scanner implements.
    fn scan_type(&self) -> ScanMode;

    /// Check if this scanner requires elevated privileges.
    fn requires_privileges(&self) -> bool;

    /// Get the target address.
    fn target(&self) -> Ipv4Addr;

    /// Probe a single port and classify the answer.
    fn probe(&self, port: Port) -> ProbeOutcome;

    /// Scan a single port.
    ///
    /// The default collapses [`Scanner::probe`]; scanners that can attach a
    /// banner override it.
    fn scan_port(&self, port: Port) -> PortResult {
        PortResult::from_outcome(port, &self.probe(port))
    }
}
