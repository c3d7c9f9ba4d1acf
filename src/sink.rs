//! Durable CSV result sink.
//!
//! A single writer owns the output file for the whole run. Results are
//! appended in arrival order and flushed row by row, so a crash mid-scan
//! cannot lose already-confirmed results. Persistence faults are fatal to
//! the run; there is no partial-success mode for the writer itself.

use crate::error::{SinkError, SinkResult};
use crate::types::ScanResult;
use std::fs::File;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

/// Default output file name.
pub const DEFAULT_OUTPUT_FILE: &str = "scan_results.csv";

/// Column header written exactly once, before any data row.
const HEADER: [&str; 3] = ["Host", "Port", "Service_Banner"];

/// Channel capacity between result producers and the writer.
const RESULT_CHANNEL_CAPACITY: usize = 1024;

/// The single authoritative writer of scan results.
///
/// Created before the worker pool starts so that an unusable output file
/// aborts the run before any probe is sent. The writer runs on a blocking
/// thread and exits once every producer handle has been dropped and the
/// channel is drained; that ordering is what guarantees no result is ever
/// lost behind a closed sink.
pub struct CsvSink {
    tx: mpsc::Sender<ScanResult>,
    handle: JoinHandle<SinkResult<u64>>,
    path: PathBuf,
}

impl CsvSink {
    /// Open the output file (truncating any previous run), write the header
    /// row, and start the writer task.
    pub fn create(path: impl AsRef<Path>) -> SinkResult<Self> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|e| SinkError::Create {
            path: path.clone(),
            source: e,
        })?;

        let mut writer = csv::Writer::from_writer(file);
        writer.write_record(HEADER)?;
        writer.flush()?;

        let (tx, rx) = mpsc::channel(RESULT_CHANNEL_CAPACITY);
        let handle = tokio::task::spawn_blocking(move || write_loop(writer, rx));

        Ok(Self { tx, handle, path })
    }

    /// A cloneable handle for result producers.
    pub fn sender(&self) -> mpsc::Sender<ScanResult> {
        self.tx.clone()
    }

    /// Where results are being written.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait for the writer to drain remaining results and exit.
    ///
    /// Returns the number of data rows written. Callers must have dropped
    /// every sender obtained from [`CsvSink::sender`] first; the sink's own
    /// handle is released here.
    pub async fn finish(self) -> SinkResult<u64> {
        drop(self.tx);
        match self.handle.await {
            Ok(result) => result,
            Err(e) => Err(SinkError::Join(e.to_string())),
        }
    }
}

fn write_loop(mut writer: csv::Writer<File>, mut rx: mpsc::Receiver<ScanResult>) -> SinkResult<u64> {
    let mut rows = 0u64;

    while let Some(result) = rx.blocking_recv() {
        let port = result.port.to_string();
        writer.write_record([result.host.as_str(), port.as_str(), result.banner.as_str()])?;
        writer.flush()?;
        rows += 1;
        trace!(host = %result.host, port = %result.port, "result row flushed");
    }

    writer.flush()?;
    debug!(rows, "result sink closed");
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Port;

    #[tokio::test]
    async fn test_header_only_when_no_results() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let sink = CsvSink::create(&path).unwrap();
        let rows = sink.finish().await.unwrap();
        assert_eq!(rows, 0);

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Host,Port,Service_Banner\n");
    }

    #[tokio::test]
    async fn test_rows_written_in_arrival_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let sink = CsvSink::create(&path).unwrap();
        let tx = sink.sender();
        for port in [22u16, 80, 443] {
            let result = ScanResult::open("127.0.0.1", Port::new(port).unwrap(), "hello");
            tx.send(result).await.unwrap();
        }
        drop(tx);

        let rows = sink.finish().await.unwrap();
        assert_eq!(rows, 3);

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "Host,Port,Service_Banner");
        assert_eq!(lines[1], "127.0.0.1,22,hello");
        assert_eq!(lines[2], "127.0.0.1,80,hello");
        assert_eq!(lines[3], "127.0.0.1,443,hello");
    }

    #[tokio::test]
    async fn test_banner_with_delimiter_is_quoted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let sink = CsvSink::create(&path).unwrap();
        let tx = sink.sender();
        let banner = "nginx/1.25, (Ubuntu)";
        tx.send(ScanResult::open("10.0.0.1", Port::new(80).unwrap(), banner))
            .await
            .unwrap();
        drop(tx);
        sink.finish().await.unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let record = reader.records().next().unwrap().unwrap();
        assert_eq!(&record[0], "10.0.0.1");
        assert_eq!(&record[1], "80");
        assert_eq!(&record[2], banner);
    }

    #[tokio::test]
    async fn test_create_fails_for_bad_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("out.csv");

        let err = CsvSink::create(&path).unwrap_err();
        assert!(matches!(err, SinkError::Create { .. }));
    }

    #[tokio::test]
    async fn test_output_truncated_between_runs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");

        let sink = CsvSink::create(&path).unwrap();
        let tx = sink.sender();
        tx.send(ScanResult::open("10.0.0.1", Port::new(80).unwrap(), "x"))
            .await
            .unwrap();
        drop(tx);
        sink.finish().await.unwrap();

        // Second run starts from a clean file.
        let sink = CsvSink::create(&path).unwrap();
        sink.finish().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert_eq!(content, "Host,Port,Service_Banner\n");
    }
}
