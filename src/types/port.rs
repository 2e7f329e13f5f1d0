//! Port types with validation and parsing.
//!
//! The `Port` newtype ensures values are always valid port numbers (1-65535).
//! `PortRange` and `PortSpec` handle port specifications such as
//! `"22,80,1000-1100"`.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// A validated network port number (1-65535).
///
/// Using a newtype prevents accidental misuse of raw u16 values
/// and ensures port numbers are always valid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Port(u16);

impl Port {
    /// Minimum valid port number.
    pub const MIN: u16 = 1;
    /// Maximum valid port number.
    pub const MAX: u16 = 65535;

    /// Create a new Port from a u16, returning None if invalid.
    #[inline]
    pub const fn new(port: u16) -> Option<Self> {
        if port >= Self::MIN {
            Some(Self(port))
        } else {
            None
        }
    }

    /// Get the raw port number.
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self.0
    }
}

impl fmt::Display for Port {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Port {
    type Error = PortError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(PortError::OutOfRange(value.into()))
    }
}

impl From<Port> for u16 {
    fn from(port: Port) -> Self {
        port.0
    }
}

/// Error type for port parsing and validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PortError {
    #[error("port {0} is out of valid range (1-65535)")]
    OutOfRange(i64),
    #[error("invalid port number: {0:?}")]
    InvalidFormat(String),
    #[error("port list is empty")]
    Empty,
}

/// A range of ports (inclusive).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortRange {
    start: Port,
    end: Port,
}

impl PortRange {
    /// Build a range from raw bounds.
    ///
    /// Reversed bounds are swapped and both ends are clamped to 1-65535.
    /// Returns `None` when nothing of the range survives clamping.
    pub fn clamped(a: i64, b: i64) -> Option<Self> {
        let (lo, hi) = if a > b { (b, a) } else { (a, b) };
        let lo = lo.max(i64::from(Port::MIN));
        let hi = hi.min(i64::from(Port::MAX));
        if lo > hi {
            return None;
        }
        let start = Port::new(u16::try_from(lo).ok()?)?;
        let end = Port::new(u16::try_from(hi).ok()?)?;
        Some(Self { start, end })
    }

    /// Create a range containing a single port.
    pub const fn single(port: Port) -> Self {
        Self {
            start: port,
            end: port,
        }
    }

    /// Get the number of ports in this range.
    pub const fn len(&self) -> usize {
        (self.end.0 - self.start.0) as usize + 1
    }

    /// A valid range always holds at least one port.
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over all ports in this range.
    pub fn iter(&self) -> impl Iterator<Item = Port> {
        (self.start.0..=self.end.0).map(Port)
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.start == self.end {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// A complete port specification that can contain multiple ranges.
///
/// Supports formats like:
/// - Single port: "80"
/// - Comma-separated: "80,443,8080"
/// - Range: "1-1000" (reversed bounds are swapped)
/// - Mixed: "22,80,1000-1100"
///
/// Out-of-range values are dropped or clamped rather than rejected;
/// only non-numeric input is an error.
#[derive(Debug, Clone, Default)]
pub struct PortSpec {
    ranges: Vec<PortRange>,
}

impl PortSpec {
    /// Create an empty port specification.
    pub const fn new() -> Self {
        Self { ranges: Vec::new() }
    }

    /// Add a port range to the specification.
    pub fn add_range(&mut self, range: PortRange) {
        self.ranges.push(range);
    }

    /// Get all ports as a strictly ascending, deduplicated vector.
    pub fn to_ports(&self) -> Vec<Port> {
        self.ranges
            .iter()
            .flat_map(|r| r.iter())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }
}

fn parse_bound(s: &str) -> Result<i64, PortError> {
    let s = s.trim();
    s.parse::<i64>()
        .map_err(|_| PortError::InvalidFormat(s.to_string()))
}

impl FromStr for PortSpec {
    type Err = PortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut spec = Self::new();

        for part in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match part.split_once('-') {
                Some((a, b)) => {
                    if let Some(range) = PortRange::clamped(parse_bound(a)?, parse_bound(b)?) {
                        spec.add_range(range);
                    }
                }
                None => {
                    let value = parse_bound(part)?;
                    let port = u16::try_from(value).ok().and_then(Port::new);
                    if let Some(port) = port {
                        spec.add_range(PortRange::single(port));
                    }
                }
            }
        }

        if spec.is_empty() {
            return Err(PortError::Empty);
        }

        Ok(spec)
    }
}

impl fmt::Display for PortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.ranges.iter().map(|r| r.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(spec: &str) -> Vec<u16> {
        spec.parse::<PortSpec>()
            .unwrap()
            .to_ports()
            .into_iter()
            .map(Port::as_u16)
            .collect()
    }

    #[test]
    fn test_port_validation() {
        assert!(Port::new(0).is_none());
        assert!(Port::new(1).is_some());
        assert!(Port::new(80).is_some());
        assert!(Port::new(65535).is_some());
        assert!(Port::try_from(0u16).is_err());
    }

    #[test]
    fn test_port_range() {
        let range = PortRange::clamped(1, 100).unwrap();
        assert_eq!(range.len(), 100);
        assert_eq!(range.to_string(), "1-100");
    }

    #[test]
    fn test_mixed_spec() {
        let ports = raw("22,80,1000-1100");
        assert_eq!(ports.len(), 2 + 101);
        assert_eq!(&ports[..3], &[22, 80, 1000]);
        assert_eq!(*ports.last().unwrap(), 1100);
    }

    #[test]
    fn test_strictly_ascending_and_deduplicated() {
        let ports = raw("443, 80,80,20-25,22");
        assert_eq!(ports, vec![20, 21, 22, 23, 24, 25, 80, 443]);
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_reversed_range_is_swapped() {
        assert_eq!(raw("5-3"), vec![3, 4, 5]);
    }

    #[test]
    fn test_range_clamped_to_valid_ports() {
        assert_eq!(raw("0-2"), vec![1, 2]);
        assert_eq!(raw("65534-70000"), vec![65534, 65535]);
    }

    #[test]
    fn test_out_of_range_single_ports_dropped() {
        assert_eq!(raw("0,80,70000"), vec![80]);
    }

    #[test]
    fn test_empty_tokens_skipped() {
        assert_eq!(raw(",22,,80,"), vec![22, 80]);
    }

    #[test]
    fn test_nothing_valid_is_empty() {
        assert_eq!("0".parse::<PortSpec>().unwrap_err(), PortError::Empty);
        assert_eq!("".parse::<PortSpec>().unwrap_err(), PortError::Empty);
        assert_eq!(
            "70000-80000".parse::<PortSpec>().unwrap_err(),
            PortError::Empty
        );
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(matches!(
            "abc".parse::<PortSpec>(),
            Err(PortError::InvalidFormat(_))
        ));
        assert!(matches!(
            "10-x".parse::<PortSpec>(),
            Err(PortError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_port_serializes_as_number() {
        let port = Port::new(8080).unwrap();
        assert_eq!(serde_json::to_string(&port).unwrap(), "8080");
        assert!(serde_json::from_str::<Port>("0").is_err());
    }
}
