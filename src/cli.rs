//! Command-line interface for sounder.
//!
//! Uses `clap` derive macros for declarative argument parsing. The CLI is
//! the layer that turns user input into a validated task set and engine
//! configuration; the engine itself never sees raw argument strings.

use crate::config::AppSettings;
use crate::engine::{self, EngineConfig, ScanSummary, TaskSet};
use crate::output;
use crate::probe::TcpProbe;
use crate::sink::CsvSink;
use crate::types::{PortSpec, TargetSpec};
use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// A concurrent TCP reachability scanner with durable CSV results.
#[derive(Parser, Debug)]
#[command(name = "sounder")]
#[command(author = "HueCodes <huecodes@proton.me>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "A concurrent TCP reachability scanner", long_about = None)]
pub struct Args {
    /// Targets to scan: IP addresses, hostnames, or CIDR ranges
    ///
    /// Examples:
    ///   192.168.1.1        Single IP address
    ///   example.com        Hostname
    ///   192.168.1.0/24     CIDR range
    #[arg(value_name = "TARGET", required = true, num_args = 1..)]
    pub targets: Vec<String>,

    /// Ports to probe (e.g., "80", "80,443", "1-1024", "22,80,8000-9000")
    #[arg(short, long, default_value = "1-1024")]
    pub ports: String,

    /// Number of concurrent probe workers
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// Connect timeout in milliseconds
    #[arg(short = 't', long, value_name = "MS")]
    pub connect_timeout: Option<u64>,

    /// Banner read timeout in milliseconds
    #[arg(long, value_name = "MS")]
    pub banner_timeout: Option<u64>,

    /// Abort the scan after this many seconds, keeping partial results
    #[arg(long, value_name = "SECS")]
    pub deadline: Option<u64>,

    /// Output CSV file (overwritten each run)
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Verbose output (progress bar and debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

/// Execute a scan from parsed arguments.
pub async fn run(args: Args) -> anyhow::Result<ScanSummary> {
    let settings = AppSettings::load().unwrap_or_else(|e| {
        output::print_warning(&format!("ignoring settings file: {}", e));
        AppSettings::default()
    });

    let workers = args.workers.unwrap_or(settings.workers);
    if workers == 0 {
        bail!("invalid configuration: worker count must be at least 1");
    }

    let connect_timeout_ms = args.connect_timeout.unwrap_or(settings.connect_timeout_ms);
    if connect_timeout_ms == 0 {
        bail!("invalid configuration: connect timeout must be greater than zero");
    }
    let banner_timeout_ms = args.banner_timeout.unwrap_or(settings.banner_timeout_ms);

    let port_spec: PortSpec = args
        .ports
        .parse()
        .with_context(|| format!("invalid port specification '{}'", args.ports))?;
    let ports = port_spec.to_ports();

    // Resolve every target up front; CIDR blocks fan out to their host
    // addresses, hostnames to their first resolved address.
    let mut hosts = Vec::new();
    for target in &args.targets {
        let spec = TargetSpec::parse(target)?;
        let resolved = spec
            .resolve()
            .await
            .with_context(|| format!("failed to resolve target '{}'", target))?;
        hosts.extend(resolved.into_iter().map(|t| t.ip.to_string()));
    }
    if hosts.is_empty() {
        bail!("no hosts to scan after resolving targets");
    }
    hosts.dedup();

    let tasks = TaskSet::new(hosts, ports);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&settings.output));
    let sink = CsvSink::create(&output_path)?;

    let probe = TcpProbe::new(
        Duration::from_millis(connect_timeout_ms),
        Duration::from_millis(banner_timeout_ms),
    );
    let config = EngineConfig::new(workers)
        .with_deadline(args.deadline.map(Duration::from_secs))
        .with_progress(args.verbose);

    output::print_scan_header(
        &args.targets.join(", "),
        tasks.host_count(),
        tasks.port_count(),
        workers,
    );

    let summary = engine::run_scan(&tasks, probe, sink, config).await?;
    Ok(summary)
}
