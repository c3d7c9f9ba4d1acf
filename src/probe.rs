//! Per-connection probe logic.
//!
//! A probe owns exactly one connection attempt: connect with a bounded
//! timeout, optionally elicit and read a banner with a second bounded
//! timeout, and report the outcome. The socket never outlives the probe
//! call; it is closed on every exit path when the stream drops.

use crate::banner::grab_banner;
use crate::error::ProbeError;
use crate::types::{ScanResult, ScanTask};
use async_trait::async_trait;
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;

/// Default connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(500);

/// Default banner-read timeout.
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_millis(500);

/// The probing seam between the worker pool and the network.
///
/// `Ok(Some(..))` means the port accepted a connection. `Ok(None)` is the
/// ordinary closed/filtered outcome and carries no information worth
/// surfacing. `Err` is an unexpected fault the caller logs and contains.
#[async_trait]
pub trait Probe: Send + Sync + 'static {
    /// Probe one endpoint.
    async fn probe(&self, task: &ScanTask) -> Result<Option<ScanResult>, ProbeError>;
}

#[async_trait]
impl<P: Probe> Probe for std::sync::Arc<P> {
    async fn probe(&self, task: &ScanTask) -> Result<Option<ScanResult>, ProbeError> {
        (**self).probe(task).await
    }
}

/// TCP connect prober with layered timeouts.
///
/// Uses the operating system's socket API via full connect() calls; no
/// elevated privileges required.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    connect_timeout: Duration,
    banner_timeout: Duration,
}

impl TcpProbe {
    /// Create a new TCP prober.
    pub fn new(connect_timeout: Duration, banner_timeout: Duration) -> Self {
        Self {
            connect_timeout,
            banner_timeout,
        }
    }

    /// Attempt to connect to the task's endpoint.
    ///
    /// Refused, unreachable and timed-out attempts return `Ok(None)`.
    async fn attempt_connect(&self, task: &ScanTask) -> Result<Option<TcpStream>, ProbeError> {
        // The (host, port) pair form handles IPv4, IPv6 and hostnames alike.
        let endpoint = (task.host.as_str(), task.port.as_u16());
        match timeout(self.connect_timeout, TcpStream::connect(endpoint)).await {
            Ok(Ok(stream)) => Ok(Some(stream)),
            Ok(Err(e)) if is_expected_rejection(&e) => Ok(None),
            Ok(Err(e)) => Err(ProbeError::Connect {
                target: task.endpoint(),
                reason: e.to_string(),
            }),
            // No response at all before the deadline: filtered.
            Err(_) => Ok(None),
        }
    }
}

impl Default for TcpProbe {
    fn default() -> Self {
        Self::new(DEFAULT_CONNECT_TIMEOUT, DEFAULT_BANNER_TIMEOUT)
    }
}

#[async_trait]
impl Probe for TcpProbe {
    async fn probe(&self, task: &ScanTask) -> Result<Option<ScanResult>, ProbeError> {
        let Some(mut stream) = self.attempt_connect(task).await? else {
            return Ok(None);
        };

        let banner = grab_banner(&mut stream, task.port, self.banner_timeout).await;
        Ok(Some(ScanResult::open(task.host.clone(), task.port, banner)))
    }
}

/// Classify connect errors that mean "closed or filtered", not "broken".
fn is_expected_rejection(e: &io::Error) -> bool {
    if matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
    ) {
        return true;
    }
    // Unreachable hosts/networks surface with platform-specific kinds.
    e.to_string().to_lowercase().contains("unreachable")
}
