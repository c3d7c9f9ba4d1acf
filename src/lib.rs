//! # sounder - A Concurrent TCP Reachability Scanner
//!
//! sounder determines which (host, port) pairs accept TCP connections,
//! reads a best-effort banner from each open socket, and persists results
//! durably as they are discovered.
//!
//! ## Features
//!
//! - **Bounded concurrency**: a fixed pool of async probe workers draining
//!   a shared FIFO task queue
//! - **Layered timeouts**: independent connect and banner-read timeouts,
//!   plus an optional scan-wide deadline
//! - **Durable results**: a single CSV writer that flushes every row, so a
//!   crash mid-scan cannot lose confirmed results
//! - **Flexible targeting**: single IPs, hostnames, and CIDR ranges
//! - **Banner grabbing**: best-effort service identification on open ports
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use sounder::engine::{run_scan, EngineConfig, TaskSet};
//! use sounder::probe::TcpProbe;
//! use sounder::sink::CsvSink;
//! use sounder::types::Port;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let ports = (20..=30).filter_map(Port::new).collect();
//!     let tasks = TaskSet::single("127.0.0.1", ports);
//!     let sink = CsvSink::create("scan_results.csv")?;
//!
//!     let summary = run_scan(&tasks, TcpProbe::default(), sink, EngineConfig::new(50)).await?;
//!     println!("{} open ports -> {}", summary.open_ports, summary.output.display());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`types`] - Core type definitions with newtype patterns for type safety
//! - [`engine`] - Worker pool, task queue and lifecycle coordination
//! - [`probe`] - Per-connection probe logic behind the [`probe::Probe`] seam
//! - [`sink`] - The durable single-writer CSV sink
//! - [`banner`] - Best-effort banner grabbing
//! - [`config`] - Settings defaults
//! - [`error`] - Error types

pub mod banner;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod output;
pub mod probe;
pub mod services;
pub mod sink;
pub mod types;

// Re-export commonly used types
pub use engine::{run_scan, EngineConfig, ScanStats, ScanSummary, TaskSet};
pub use error::{ConfigError, ProbeError, ScanError, SinkError};
pub use probe::{Probe, TcpProbe};
pub use sink::CsvSink;
pub use types::{Port, PortRange, PortSpec, ScanResult, ScanTarget, ScanTask, TargetSpec};
