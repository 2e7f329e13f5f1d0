//! TCP Connect Scanner implementation.
//!
//! Performs standard TCP connect scans using the operating system's
//! socket API. This is the most reliable scanning method but also
//! the most detectable as it completes the full TCP handshake.

use crate::banner::grab_banner_from_stream;
use crate::error::{ScanError, ScanResult};
use crate::scanner::traits::{PortResult, ProbeOutcome, ScanMode, Scanner};
use crate::types::Port;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};
use std::time::Duration;
use tracing::{debug, trace};

/// TCP Connect Scanner.
///
/// Uses a non-blocking `connect()` bounded by a readiness wait to determine
/// port status. Does not require elevated privileges.
///
/// # Performance Characteristics
///
/// - **Reliability**: High - uses OS-level connection establishment
/// - **Stealth**: Low - completes full TCP handshake, easily logged
/// - **Privileges**: None required
pub struct ConnectScanner {
    target: Ipv4Addr,
    timeout: Duration,
    grab_banners: bool,
    banner_timeout: Duration,
}

impl ConnectScanner {
    /// Create a new TCP connect scanner.
    ///
    /// # Arguments
    /// * `target` - Target IPv4 address to scan
    /// * `timeout` - Connection timeout per port
    /// * `grab_banners` - Whether to attempt banner grabbing on open ports
    pub fn new(target: Ipv4Addr, timeout: Duration, grab_banners: bool) -> Self {
        Self {
            target,
            timeout,
            grab_banners,
            banner_timeout: timeout,
        }
    }

    /// Cap the time spent on each banner read or write.
    pub fn with_banner_timeout_cap(mut self, cap: Duration) -> Self {
        self.banner_timeout = self.timeout.min(cap);
        self
    }

    /// Attempt to connect to the target port.
    ///
    /// The socket is switched to non-blocking mode, `connect()` is issued and,
    /// if it does not finish at once, write-readiness is awaited for at most
    /// the configured timeout before `SO_ERROR` decides the verdict. The
    /// socket is owned by this call until it is returned as a stream, so it
    /// is closed on every failing path.
    pub fn attempt_connect(&self, port: Port) -> ScanResult<TcpStream> {
        let addr = SocketAddr::V4(SocketAddrV4::new(self.target, port.as_u16()));
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(ScanError::SocketCreate)?;

        match socket.connect_timeout(&addr.into(), self.timeout) {
            Ok(()) => Ok(socket.into()),
            Err(e) => Err(match e.kind() {
                io::ErrorKind::ConnectionRefused => ScanError::ConnectionRefused,
                io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => ScanError::Timeout,
                _ => ScanError::ConnectionFailed {
                    target: self.target.to_string(),
                    port: port.as_u16(),
                    reason: e.to_string(),
                },
            }),
        }
    }
}

impl Scanner for ConnectScanner {
    fn scan_type(&self) -> ScanMode {
        ScanMode::Connect
    }

    fn requires_privileges(&self) -> bool {
        false
    }

    fn target(&self) -> Ipv4Addr {
        self.target
    }

    fn probe(&self, port: Port) -> ProbeOutcome {
        match self.attempt_connect(port) {
            Ok(_stream) => ProbeOutcome::Open,
            Err(e) => classify_failure(port, &e),
        }
    }

    fn scan_port(&self, port: Port) -> PortResult {
        match self.attempt_connect(port) {
            Ok(stream) => {
                let banner = if self.grab_banners {
                    grab_banner_from_stream(stream, self.banner_timeout)
                } else {
                    drop(stream);
                    None
                };
                PortResult::new(port, true).with_banner(banner)
            }
            Err(e) => PortResult::from_outcome(port, &classify_failure(port, &e)),
        }
    }
}

fn classify_failure(port: Port, err: &ScanError) -> ProbeOutcome {
    let outcome = ProbeOutcome::from(err);
    match &outcome {
        ProbeOutcome::Error(reason) => debug!(port = %port, %reason, "connect probe failed locally"),
        other => trace!(port = %port, outcome = %other, "connect probe closed"),
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    fn unused_local_port() -> Port {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        Port::new(port).unwrap()
    }

    #[test]
    fn test_scanner_creation() {
        let scanner = ConnectScanner::new(Ipv4Addr::LOCALHOST, Duration::from_secs(1), false);
        assert_eq!(scanner.target(), Ipv4Addr::LOCALHOST);
        assert!(!scanner.requires_privileges());
        assert_eq!(scanner.scan_type(), ScanMode::Connect);
    }

    #[test]
    fn test_banner_timeout_capped() {
        let scanner = ConnectScanner::new(Ipv4Addr::LOCALHOST, Duration::from_secs(5), true)
            .with_banner_timeout_cap(Duration::from_millis(1500));
        assert_eq!(scanner.banner_timeout, Duration::from_millis(1500));

        let scanner = ConnectScanner::new(Ipv4Addr::LOCALHOST, Duration::from_millis(300), true)
            .with_banner_timeout_cap(Duration::from_millis(1500));
        assert_eq!(scanner.banner_timeout, Duration::from_millis(300));
    }

    #[test]
    fn test_open_port() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = Port::new(listener.local_addr().unwrap().port()).unwrap();
        let scanner = ConnectScanner::new(Ipv4Addr::LOCALHOST, Duration::from_millis(500), false);

        assert_eq!(scanner.probe(port), ProbeOutcome::Open);
        let result = scanner.scan_port(port);
        assert!(result.open);
        assert_eq!(result.banner, None);
    }

    #[test]
    fn test_closed_port_returns_within_timeout() {
        let timeout = Duration::from_millis(200);
        let scanner = ConnectScanner::new(Ipv4Addr::LOCALHOST, timeout, false);
        let port = unused_local_port();

        let start = Instant::now();
        let outcome = scanner.probe(port);
        let elapsed = start.elapsed();

        assert!(matches!(
            outcome,
            ProbeOutcome::Closed | ProbeOutcome::FilteredOrTimeout
        ));
        assert!(elapsed < timeout + Duration::from_millis(500), "took {elapsed:?}");
        assert!(!scanner.scan_port(port).open);
    }
}
