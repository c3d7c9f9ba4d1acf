//! Probe worker loop.
//!
//! Each worker repeatedly pops a task, runs one probe, and forwards any
//! result to the sink. All socket-level trouble is contained at task
//! granularity: a bad task is logged at most and never terminates the
//! worker or the pool.

use crate::engine::queue::TaskReceiver;
use crate::engine::ScanStats;
use crate::probe::Probe;
use crate::services::get_service_description;
use crate::types::ScanResult;
use indicatif::ProgressBar;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

pub(crate) async fn worker_loop<P: Probe>(
    id: usize,
    queue: TaskReceiver,
    probe: Arc<P>,
    results: mpsc::Sender<ScanResult>,
    stats: Arc<ScanStats>,
    progress: Option<ProgressBar>,
    cancel: CancellationToken,
) {
    debug!(worker = id, "worker starting");

    loop {
        let task = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            task = queue.pop() => match task {
                Some(task) => task,
                // Queue closed and drained: normal shutdown.
                None => break,
            },
        };

        let outcome = probe.probe(&task).await;
        stats.record_probed();
        if let Some(pb) = &progress {
            pb.inc(1);
        }

        match outcome {
            Ok(Some(result)) => {
                stats.record_open();
                info!(
                    host = %result.host,
                    port = %result.port,
                    service = get_service_description(result.port.as_u16()),
                    banner = %result.banner,
                    "open port"
                );
                if let Some(pb) = &progress {
                    pb.set_message(format!("open: {}:{}", result.host, result.port));
                }
                if results.send(result).await.is_err() {
                    // Sink gone: nothing can be persisted, stop the run.
                    warn!(worker = id, "result sink unavailable, aborting scan");
                    cancel.cancel();
                    break;
                }
            }
            Ok(None) => {
                trace!(worker = id, task = %task, "closed or filtered");
            }
            Err(e) => {
                stats.record_fault();
                warn!(worker = id, task = %task, error = %e, "probe fault");
            }
        }
    }

    debug!(worker = id, "worker exiting");
}
