//! Probe task and result records flowing through the scan pipeline.

use crate::types::Port;
use serde::Serialize;
use std::fmt;

/// A single (host, port) probe request.
///
/// Immutable once created; produced by the task generator and consumed
/// exactly once by exactly one worker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ScanTask {
    /// Target host, as an IP string or resolvable name.
    pub host: String,
    /// Target port.
    pub port: Port,
}

impl ScanTask {
    /// Create a new probe task.
    pub fn new(host: impl Into<String>, port: Port) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// The `host:port` endpoint string used for connecting.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl fmt::Display for ScanTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// A confirmed-open port observation.
///
/// Only ever constructed after a successful connect; closed, filtered and
/// errored ports produce no record at all. Consumed exactly once by the
/// result sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScanResult {
    /// Host the connection succeeded against.
    pub host: String,
    /// Port that accepted the connection.
    pub port: Port,
    /// Normalized banner text, or a placeholder when none was received.
    pub banner: String,
    /// Always true for a constructed result; a result is an open-port claim.
    pub open: bool,
}

impl ScanResult {
    /// Record an open port, with whatever banner the probe collected.
    pub fn open(host: impl Into<String>, port: Port, banner: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port,
            banner: banner.into(),
            open: true,
        }
    }
}
