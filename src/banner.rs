//! Banner grabbing functionality for TCP connections.
//!
//! Retrieves best-effort service text from an already-connected socket:
//! whatever the service pushes unprompted, followed by whatever it answers
//! to a generic HTTP probe.

use std::io::{ErrorKind, Read, Write};
use std::net::TcpStream;
use std::time::Duration;
use tracing::trace;

/// Maximum bytes kept for a banner.
pub const MAX_BANNER_LEN: usize = 200;

/// Default cap on banner read/write timeouts.
pub const BANNER_TIMEOUT_CAP: Duration = Duration::from_millis(1500);

/// Size of a single read.
const READ_CHUNK: usize = 1024;

/// Probe sent to elicit a response from services that wait for the client.
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Grab banner from an existing TCP stream.
///
/// This function:
/// 1. Reads, without blocking, any data the service already sent
/// 2. Sends an HTTP `HEAD` probe and waits up to `timeout` for a reply
///
/// Both reads are concatenated and truncated to [`MAX_BANNER_LEN`] bytes.
/// Returns `None` if nothing was received. The stream is consumed and
/// closed before returning.
pub fn grab_banner_from_stream(mut stream: TcpStream, timeout: Duration) -> Option<String> {
    // A zero timeout is rejected by the socket API.
    let timeout = timeout.max(Duration::from_millis(1));
    if let Err(e) = stream
        .set_read_timeout(Some(timeout))
        .and_then(|()| stream.set_write_timeout(Some(timeout)))
    {
        trace!(error = %e, "could not set banner timeouts");
        return None;
    }

    let mut collected = Vec::with_capacity(READ_CHUNK);
    let mut buffer = [0u8; READ_CHUNK];

    if stream.set_nonblocking(true).is_ok() {
        read_chunk(&mut stream, &mut buffer, &mut collected);
        if let Err(e) = stream.set_nonblocking(false) {
            trace!(error = %e, "could not restore blocking mode");
            return finish_banner(collected);
        }
    }

    match stream.write_all(HTTP_PROBE) {
        Ok(()) => read_chunk(&mut stream, &mut buffer, &mut collected),
        Err(e) => trace!(error = %e, "banner probe write failed"),
    }

    finish_banner(collected)
}

/// Append the result of one read to `out`. Errors and EOF add nothing.
fn read_chunk(stream: &mut TcpStream, buffer: &mut [u8], out: &mut Vec<u8>) {
    match stream.read(buffer) {
        Ok(n) => out.extend_from_slice(&buffer[..n]),
        Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
        Err(e) => trace!(error = %e, "banner read failed"),
    }
}

/// Decode raw banner bytes as (lossy) UTF-8 and cut the text to at most
/// [`MAX_BANNER_LEN`] bytes on a character boundary.
///
/// Decoding comes first because each invalid byte expands to a three-byte
/// replacement character.
pub fn finish_banner(bytes: Vec<u8>) -> Option<String> {
    let mut banner = String::from_utf8_lossy(&bytes).into_owned();
    if banner.len() > MAX_BANNER_LEN {
        let mut cut = MAX_BANNER_LEN;
        while !banner.is_char_boundary(cut) {
            cut -= 1;
        }
        banner.truncate(cut);
    }
    (!banner.is_empty()).then_some(banner)
}
