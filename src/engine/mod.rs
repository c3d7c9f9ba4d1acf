//! Scan engine: worker pool, result routing and lifecycle sequencing.
//!
//! One parametrized engine drives every scan shape: the coordinator spawns
//! the sink and N probe workers (already blocked on the queue), feeds the
//! task set through a bounded queue, closes the queue, joins the workers
//! (a worker exits only after its final probe fully completes), and only
//! then lets the sink drain and close. That strict ordering is the
//! correctness core: the sink cannot terminate while results are still in
//! flight, and no worker can block forever on an exhausted queue.

mod queue;
mod tasks;
mod worker;

pub use tasks::TaskSet;

use crate::error::ScanError;
use crate::probe::Probe;
use crate::sink::CsvSink;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Default number of concurrent probe workers.
///
/// Workers are I/O-bound, so this is deliberately independent of the CPU
/// count.
pub const DEFAULT_WORKERS: usize = 100;

/// Default task queue capacity; populating applies backpressure beyond it.
const DEFAULT_QUEUE_CAPACITY: usize = 1024;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of concurrent probe workers (>= 1).
    pub workers: usize,
    /// Optional wall-clock bound for the whole scan. When it expires the
    /// scan aborts cooperatively and already-written rows are kept.
    pub deadline: Option<Duration>,
    /// Task queue capacity.
    pub queue_capacity: usize,
    /// Show a progress bar while scanning.
    pub progress: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            deadline: None,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            progress: false,
        }
    }
}

impl EngineConfig {
    /// Create a configuration with the given worker count.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    /// Set the overall scan deadline.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Enable or disable the progress bar.
    pub fn with_progress(mut self, progress: bool) -> Self {
        self.progress = progress;
        self
    }

    fn validate(&self) -> Result<(), ScanError> {
        if self.workers == 0 {
            return Err(ScanError::InvalidConfig(
                "worker count must be at least 1".to_string(),
            ));
        }
        if self.queue_capacity == 0 {
            return Err(ScanError::InvalidConfig(
                "queue capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Counters shared across the worker pool.
#[derive(Debug, Default)]
pub struct ScanStats {
    probed: AtomicU64,
    open: AtomicU64,
    faults: AtomicU64,
}

impl ScanStats {
    pub(crate) fn record_probed(&self) {
        self.probed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_open(&self) {
        self.open.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_fault(&self) {
        self.faults.fetch_add(1, Ordering::Relaxed);
    }

    /// Tasks fully probed so far.
    pub fn probed(&self) -> u64 {
        self.probed.load(Ordering::Relaxed)
    }

    /// Open ports observed so far.
    pub fn open(&self) -> u64 {
        self.open.load(Ordering::Relaxed)
    }

    /// Unexpected per-task faults so far.
    pub fn faults(&self) -> u64 {
        self.faults.load(Ordering::Relaxed)
    }
}

/// End-of-run report.
#[derive(Debug, Clone)]
pub struct ScanSummary {
    /// Wall-clock time the scan started.
    pub started_at: DateTime<Utc>,
    /// Total scan duration.
    pub elapsed: Duration,
    /// Tasks the task set generated.
    pub tasks_total: u64,
    /// Tasks actually probed (less than total when a deadline hit).
    pub tasks_probed: u64,
    /// Open ports observed.
    pub open_ports: u64,
    /// Unexpected per-task faults (logged, contained).
    pub probe_faults: u64,
    /// Data rows written by the sink; equals `open_ports` on a clean run.
    pub rows_written: u64,
    /// Where the results were written.
    pub output: PathBuf,
    /// Whether the scan was cut short by the deadline.
    pub hit_deadline: bool,
}

/// Execute a complete scan: probe every task in `tasks`, persist results
/// through `sink`, and report totals.
///
/// Per-task failures never surface here; the only error paths are an
/// invalid configuration and a sink (persistence) fault, both fatal to the
/// run.
pub async fn run_scan<P: Probe>(
    tasks: &TaskSet,
    probe: P,
    sink: CsvSink,
    config: EngineConfig,
) -> Result<ScanSummary, ScanError> {
    config.validate()?;

    let started_at = Utc::now();
    let start = Instant::now();
    let total = tasks.len() as u64;
    let output = sink.path().to_path_buf();

    let cancel = CancellationToken::new();
    let deadline_set = config.deadline.is_some();
    let watchdog = config.deadline.map(|deadline| {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(deadline).await;
            warn!(deadline_ms = deadline.as_millis() as u64, "scan deadline reached, aborting");
            cancel.cancel();
        })
    });

    let progress = config.progress.then(|| {
        let pb = ProgressBar::new(total);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        pb
    });

    let (task_tx, task_rx) = queue::task_channel(config.queue_capacity);
    let result_tx = sink.sender();
    let stats = Arc::new(ScanStats::default());
    let probe = Arc::new(probe);

    let workers: Vec<_> = (0..config.workers)
        .map(|id| {
            tokio::spawn(worker::worker_loop(
                id,
                task_rx.clone(),
                Arc::clone(&probe),
                result_tx.clone(),
                Arc::clone(&stats),
                progress.clone(),
                cancel.clone(),
            ))
        })
        .collect();
    // Workers hold the only live clones from here on; shutdown is driven
    // purely by dropping producer handles.
    drop(task_rx);
    drop(result_tx);

    info!(tasks = total, workers = config.workers, "scan starting");
    for task in tasks.iter() {
        tokio::select! {
            _ = cancel.cancelled() => break,
            pushed = task_tx.push(task) => {
                if pushed.is_err() {
                    // Every worker already exited.
                    break;
                }
            }
        }
    }
    // Close the queue: workers finish the backlog and exit.
    drop(task_tx);

    for (id, joined) in join_all(workers).await.into_iter().enumerate() {
        if joined.is_err() {
            warn!(worker = id, "worker panicked");
        }
    }

    // All result producers are gone; the sink drains in-flight results,
    // flushes and closes. A persistence fault surfaces here.
    let rows_written = sink.finish().await?;

    if let Some(watchdog) = &watchdog {
        watchdog.abort();
    }
    if let Some(pb) = &progress {
        pb.finish_and_clear();
    }

    let summary = ScanSummary {
        started_at,
        elapsed: start.elapsed(),
        tasks_total: total,
        tasks_probed: stats.probed(),
        open_ports: stats.open(),
        probe_faults: stats.faults(),
        rows_written,
        output,
        hit_deadline: deadline_set && cancel.is_cancelled(),
    };

    info!(
        open = summary.open_ports,
        probed = summary.tasks_probed,
        rows = summary.rows_written,
        elapsed_ms = summary.elapsed.as_millis() as u64,
        "scan complete"
    );

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProbeError;
    use crate::probe::TcpProbe;
    use crate::types::{Port, ScanResult, ScanTask};
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::Mutex;
    use tokio::net::TcpListener;

    /// Probe double: reports the configured ports open, records every task.
    struct FakeProbe {
        open_ports: HashSet<u16>,
        seen: Mutex<Vec<ScanTask>>,
    }

    impl FakeProbe {
        fn new(open_ports: impl IntoIterator<Item = u16>) -> Self {
            Self {
                open_ports: open_ports.into_iter().collect(),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Probe for FakeProbe {
        async fn probe(&self, task: &ScanTask) -> Result<Option<ScanResult>, ProbeError> {
            self.seen.lock().unwrap().push(task.clone());
            if self.open_ports.contains(&task.port.as_u16()) {
                Ok(Some(ScanResult::open(task.host.clone(), task.port, "")))
            } else {
                Ok(None)
            }
        }
    }

    /// Probe double that takes a while per task.
    struct SlowProbe;

    #[async_trait]
    impl Probe for SlowProbe {
        async fn probe(&self, task: &ScanTask) -> Result<Option<ScanResult>, ProbeError> {
            tokio::time::sleep(Duration::from_millis(300)).await;
            Ok(Some(ScanResult::open(task.host.clone(), task.port, "")))
        }
    }

    fn ports(range: std::ops::RangeInclusive<u16>) -> Vec<Port> {
        range.map(|p| Port::new(p).unwrap()).collect()
    }

    fn csv_ports(path: &std::path::Path) -> Vec<u16> {
        let mut reader = csv::Reader::from_path(path).unwrap();
        assert_eq!(
            reader.headers().unwrap(),
            &csv::StringRecord::from(vec!["Host", "Port", "Service_Banner"])
        );
        reader
            .records()
            .map(|r| r.unwrap()[1].parse().unwrap())
            .collect()
    }

    #[tokio::test]
    async fn test_every_task_probed_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let tasks = TaskSet::single("192.0.2.1", ports(1..=100));
        let probe = Arc::new(FakeProbe::new([5, 50]));
        let sink = CsvSink::create(&path).unwrap();

        let summary = run_scan(&tasks, Arc::clone(&probe), sink, EngineConfig::new(7))
            .await
            .unwrap();

        assert_eq!(summary.tasks_total, 100);
        assert_eq!(summary.tasks_probed, 100);
        assert_eq!(summary.open_ports, 2);
        assert_eq!(summary.rows_written, 2);
        assert!(!summary.hit_deadline);

        let seen = probe.seen.lock().unwrap();
        assert_eq!(seen.len(), 100);
        let unique: HashSet<u16> = seen.iter().map(|t| t.port.as_u16()).collect();
        assert_eq!(unique.len(), 100);

        let mut written = csv_ports(&path);
        written.sort_unstable();
        assert_eq!(written, vec![5, 50]);
    }

    #[tokio::test]
    async fn test_result_set_independent_of_worker_count() {
        let mut outputs = Vec::new();

        for workers in [1usize, 16] {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("out.csv");

            let tasks = TaskSet::single("192.0.2.1", ports(1..=60));
            let probe = FakeProbe::new([10, 20, 30]);
            let sink = CsvSink::create(&path).unwrap();

            run_scan(&tasks, probe, sink, EngineConfig::new(workers))
                .await
                .unwrap();

            let mut written = csv_ports(&path);
            written.sort_unstable();
            outputs.push(written);
        }

        assert_eq!(outputs[0], vec![10, 20, 30]);
        assert_eq!(outputs[0], outputs[1]);
    }

    #[tokio::test]
    async fn test_empty_task_set_writes_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let tasks = TaskSet::single("192.0.2.1", Vec::new());
        let sink = CsvSink::create(&path).unwrap();

        let summary = run_scan(&tasks, FakeProbe::new([]), sink, EngineConfig::new(4))
            .await
            .unwrap();

        assert_eq!(summary.tasks_total, 0);
        assert_eq!(summary.rows_written, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Host,Port,Service_Banner\n");
    }

    #[tokio::test]
    async fn test_zero_workers_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let tasks = TaskSet::single("192.0.2.1", ports(1..=10));
        let sink = CsvSink::create(&path).unwrap();

        let err = run_scan(&tasks, FakeProbe::new([]), sink, EngineConfig::new(0))
            .await
            .unwrap_err();
        assert!(matches!(err, ScanError::InvalidConfig(_)));
    }

    #[tokio::test]
    async fn test_deadline_aborts_and_keeps_partial_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let tasks = TaskSet::single("192.0.2.1", ports(1..=50));
        let sink = CsvSink::create(&path).unwrap();
        let config = EngineConfig::new(2).with_deadline(Some(Duration::from_millis(100)));

        let start = Instant::now();
        let summary = run_scan(&tasks, SlowProbe, sink, config).await.unwrap();

        assert!(summary.hit_deadline);
        assert!(summary.tasks_probed < 50);
        assert!(start.elapsed() < Duration::from_secs(3));
        // Whatever was probed before the cut made it to the file.
        assert_eq!(summary.rows_written, summary.open_ports);
        assert_eq!(csv_ports(&path).len() as u64, summary.rows_written);
    }

    #[tokio::test]
    async fn test_live_scan_finds_only_listening_port() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        // One real listener, plus a port that was just freed (closed).
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let open_port = listener.local_addr().unwrap().port();
        let freed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_port = freed.local_addr().unwrap().port();
        drop(freed);

        let tasks = TaskSet::single(
            "127.0.0.1",
            vec![
                Port::new(open_port).unwrap(),
                Port::new(closed_port).unwrap(),
            ],
        );
        let probe = TcpProbe::new(Duration::from_millis(500), Duration::from_millis(50));
        let sink = CsvSink::create(&path).unwrap();

        let summary = run_scan(&tasks, probe, sink, EngineConfig::new(4))
            .await
            .unwrap();

        assert_eq!(summary.tasks_probed, 2);
        assert_eq!(summary.open_ports, 1);
        assert_eq!(csv_ports(&path), vec![open_port]);
        drop(listener);
    }

    #[tokio::test]
    async fn test_refused_scan_completes_with_header_only() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let freed = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let closed_port = freed.local_addr().unwrap().port();
        drop(freed);

        let tasks = TaskSet::single("127.0.0.1", vec![Port::new(closed_port).unwrap()]);
        let probe = TcpProbe::new(Duration::from_millis(500), Duration::from_millis(50));
        let sink = CsvSink::create(&path).unwrap();

        let summary = run_scan(&tasks, probe, sink, EngineConfig::new(1))
            .await
            .unwrap();

        assert_eq!(summary.tasks_probed, 1);
        assert_eq!(summary.open_ports, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Host,Port,Service_Banner\n");
    }
}
