//! Error types for sounder.
//!
//! Uses `thiserror` for ergonomic error definitions. Expected connect-phase
//! outcomes (refused, unreachable, timed out) are not errors at all: the
//! probe reports them as "no result" and the worker moves on.

use std::path::PathBuf;
use thiserror::Error;

/// An unexpected per-task fault inside a probe.
///
/// Only raised for conditions outside the normal closed/filtered taxonomy,
/// e.g. running out of file descriptors mid-connect. Contained at task
/// granularity: logged by the worker, never propagated out of the pool.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("connection to {target} failed: {reason}")]
    Connect { target: String, reason: String },
}

/// Errors raised by the result sink.
///
/// Any of these is fatal to the run: there is no partial-success mode for
/// the writer itself.
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("failed to create output file {path}: {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write result row: {0}")]
    Write(#[from] csv::Error),

    #[error("failed to flush output file: {0}")]
    Flush(#[from] std::io::Error),

    #[error("result writer task failed: {0}")]
    Join(String),
}

/// Result type alias for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;

/// Top-level error for a scan run.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Errors from the settings layer.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not determine a configuration directory for this platform")]
    DirectoryNotFound,

    #[error("failed to read {path}: {reason}")]
    ReadFailed { path: PathBuf, reason: String },

    #[error("failed to write {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },

    #[error("invalid settings file: {0}")]
    InvalidFormat(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for settings operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::Connect {
            target: "10.0.0.1:81".to_string(),
            reason: "too many open files".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "connection to 10.0.0.1:81 failed: too many open files"
        );
    }

    #[test]
    fn test_scan_error_from_sink() {
        let sink = SinkError::Join("writer panicked".to_string());
        let err: ScanError = sink.into();
        assert!(matches!(err, ScanError::Sink(_)));
    }
}
