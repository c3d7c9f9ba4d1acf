//! Banner grabbing for open TCP connections.
//!
//! Reads the initial bytes a service sends (or can be coaxed into sending)
//! right after connection establishment. The banner is an identification
//! hint only and is never parsed.

use crate::types::Port;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Maximum bytes to read for a banner.
const MAX_BANNER_SIZE: usize = 1024;

/// Displayed banner length cap after sanitizing.
const MAX_BANNER_CHARS: usize = 256;

/// Placeholder recorded when an open port sends nothing before the read timeout.
pub const NO_BANNER: &str = "[no banner received within timeout]";

/// Probe sent to elicit a response from HTTP-speaking services.
const HTTP_PROBE: &[u8] = b"HEAD / HTTP/1.0\r\n\r\n";

/// Read a best-effort banner from an open stream.
///
/// On well-known web ports a minimal HTTP request is sent first to elicit a
/// response. The read is bounded by `banner_timeout`, independent of the
/// connect timeout. This never fails: a read timeout or error is folded
/// into the returned text, because the port is open either way.
pub async fn grab_banner(stream: &mut TcpStream, port: Port, banner_timeout: Duration) -> String {
    if is_http_port(port.as_u16()) {
        // Best effort; a failed probe write still leaves the read worth trying.
        let _ = stream.write_all(HTTP_PROBE).await;
    }

    let mut buffer = vec![0u8; MAX_BANNER_SIZE];
    match timeout(banner_timeout, stream.read(&mut buffer)).await {
        Ok(Ok(n)) => sanitize_banner(&buffer[..n]),
        Ok(Err(e)) => format!("[error reading banner: {}]", e),
        Err(_) => NO_BANNER.to_string(),
    }
}

/// Check if a port is commonly used for HTTP services.
fn is_http_port(port: u16) -> bool {
    matches!(
        port,
        80 | 443 | 8000 | 8008 | 8080 | 8081 | 8082 | 8083 | 8443 | 8888 | 9000 | 9090
    )
}

/// Sanitize raw banner bytes for single-line output.
///
/// Non-printable bytes become dots, runs of whitespace collapse to a single
/// space, and the result is trimmed and length-capped.
fn sanitize_banner(data: &[u8]) -> String {
    let printable: String = data
        .iter()
        .take(MAX_BANNER_CHARS)
        .map(|&b| {
            if b.is_ascii_graphic() {
                b as char
            } else if b.is_ascii_whitespace() {
                ' '
            } else {
                '.'
            }
        })
        .collect();

    let mut result = String::with_capacity(printable.len());
    let mut prev_space = false;
    for c in printable.chars() {
        if c == ' ' {
            if !prev_space {
                result.push(c);
            }
            prev_space = true;
        } else {
            result.push(c);
            prev_space = false;
        }
    }

    result.trim().to_string()
}
