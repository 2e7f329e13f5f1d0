//! SYN (Stealth) Scanner implementation.
//!
//! Performs half-open TCP scanning by sending SYN packets and analyzing
//! responses without completing the TCP handshake. This method is less
//! detectable than full connect scans but requires raw socket access
//! (elevated privileges).
//!
//! # Privileges Required
//!
//! This scanner requires root or `CAP_NET_RAW` to:
//! - Create raw sockets with `IP_HDRINCL`
//! - Send crafted IP/TCP packets
//! - Receive raw TCP traffic addressed to this host
//!
//! # How It Works
//!
//! 1. Send a TCP SYN packet to the target port
//! 2. Read inbound TCP packets until one answers the probe or the timeout ends:
//!    - SYN/ACK: Port is open (service is listening)
//!    - RST: Port is closed (no service)
//!    - Anything else, or nothing: reported closed
//! 3. The kernel resets the half-open connection since it never sent the SYN

use crate::error::{ScanError, ScanResult};
use crate::scanner::packet::{SynProbe, TcpReply};
use crate::scanner::traits::{ProbeOutcome, ScanMode, Scanner};
use crate::types::Port;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, Read};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};
use std::time::{Duration, Instant};
use tracing::{debug, trace};

/// Largest datagram we expect to read back.
const RECV_BUFFER_LEN: usize = 2048;

/// Shortest read timeout the socket layer honours; below this `SO_RCVTIMEO`
/// rounds to zero, which means "block forever".
const MIN_READ_TIMEOUT: Duration = Duration::from_millis(1);

/// SYN Scanner for stealth port scanning.
///
/// **Requires elevated privileges (root/sudo).**
pub struct SynScanner {
    target: Ipv4Addr,
    source_ip: Ipv4Addr,
    timeout: Duration,
}

impl SynScanner {
    /// Create a new SYN scanner.
    ///
    /// Opens and immediately closes one raw socket so that missing
    /// privileges surface here, once, rather than on every port.
    ///
    /// # Errors
    /// Returns [`ScanError::PermissionDenied`] without raw socket access,
    /// or [`ScanError::RawSocketError`] if the socket cannot be configured.
    pub fn new(target: Ipv4Addr, timeout: Duration) -> ScanResult<Self> {
        drop(open_raw_socket()?);
        let source_ip = source_address_for(target);
        debug!(%target, source = %source_ip, "raw socket access confirmed");

        Ok(Self {
            target,
            source_ip,
            timeout,
        })
    }

    /// Send one SYN and wait for the correlated reply.
    fn send_syn_and_wait(&self, port: Port) -> ScanResult<ProbeOutcome> {
        let socket = open_raw_socket()?;
        let probe = SynProbe::randomized(self.source_ip, self.target, port.as_u16());
        let destination = SocketAddr::V4(SocketAddrV4::new(self.target, port.as_u16()));

        socket
            .send_to(&probe.encode(), &destination.into())
            .map_err(|e| ScanError::RawSocketError(format!("send failed: {}", e)))?;

        let deadline = Instant::now() + self.timeout;
        let mut buffer = [0u8; RECV_BUFFER_LEN];

        loop {
            let Some(wait) = read_timeout_until(deadline, Instant::now()) else {
                return Ok(ProbeOutcome::FilteredOrTimeout);
            };
            socket.set_read_timeout(Some(wait))?;

            let n = match (&socket).read(&mut buffer) {
                Ok(n) => n,
                Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                    return Ok(ProbeOutcome::FilteredOrTimeout);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(ScanError::RawSocketError(format!("receive failed: {}", e))),
            };

            match TcpReply::parse(&buffer[..n]) {
                Some(reply) if reply.answers(&probe) => return Ok(classify_reply(&reply)),
                _ => trace!(port = %port, bytes = n, "discarding unrelated packet"),
            }
        }
    }
}

impl Scanner for SynScanner {
    fn scan_type(&self) -> ScanMode {
        ScanMode::Syn
    }

    fn requires_privileges(&self) -> bool {
        true
    }

    fn target(&self) -> Ipv4Addr {
        self.target
    }

    fn probe(&self, port: Port) -> ProbeOutcome {
        match self.send_syn_and_wait(port) {
            Ok(outcome) => outcome,
            Err(e) => {
                debug!(port = %port, error = %e, "SYN probe failed locally");
                ProbeOutcome::from(&e)
            }
        }
    }
}

/// Time left before `deadline`, or `None` once too little remains to arm a
/// read timeout.
fn read_timeout_until(deadline: Instant, now: Instant) -> Option<Duration> {
    let remaining = deadline.saturating_duration_since(now);
    (remaining >= MIN_READ_TIMEOUT).then_some(remaining)
}

/// Map a correlated reply to a verdict. Neither SYN+ACK nor RST is unknown.
pub fn classify_reply(reply: &TcpReply) -> ProbeOutcome {
    if reply.is_syn_ack() {
        ProbeOutcome::Open
    } else if reply.is_reset() {
        ProbeOutcome::Closed
    } else {
        ProbeOutcome::Unknown
    }
}

/// Open a raw TCP socket with IP header inclusion.
fn open_raw_socket() -> ScanResult<Socket> {
    let socket = Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::TCP)).map_err(|e| {
        if e.kind() == io::ErrorKind::PermissionDenied {
            ScanError::PermissionDenied(
                "raw socket access requires root or CAP_NET_RAW".to_string(),
            )
        } else {
            ScanError::RawSocketError(e.to_string())
        }
    })?;
    socket
        .set_header_included_v4(true)
        .map_err(|e| ScanError::RawSocketError(format!("IP_HDRINCL: {}", e)))?;
    Ok(socket)
}

/// Find the local address the kernel would route `target` through.
///
/// Connecting a UDP socket sends nothing but selects a route. Falls back to
/// `0.0.0.0`, which the kernel replaces on send; the TCP checksum is then
/// computed against the wrong pseudo-header, so replies become unlikely.
fn source_address_for(target: Ipv4Addr) -> Ipv4Addr {
    UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))
        .and_then(|socket| {
            socket.connect((target, 80))?;
            socket.local_addr()
        })
        .ok()
        .and_then(|local| match local.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .unwrap_or(Ipv4Addr::UNSPECIFIED)
}
