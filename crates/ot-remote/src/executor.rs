//! Executors that carry a scan across the execution boundary.
//!
//! An [`Executor`] receives a self-contained [`WorkerRequest`] and returns
//! the [`Report`] or a [`ScanFailure`]. Two implementations are provided:
//!
//! - [`InProcessExecutor`]: runs the scan on tokio's blocking pool, after a
//!   JSON round trip of the request and response
//! - [`ProcessExecutor`]: runs the scan in a separate worker process that
//!   speaks the [wire protocol](crate::protocol)
//!
//! # Cancellation
//!
//! Both executors race the scan against the [`CancellationToken`]. A
//! cancelled execution returns [`ScanFailure::Cancelled`], never a partial
//! report; the in-process scan is told to stop, the worker process is
//! killed.

use std::future::Future;
use std::process::Stdio;

use camino::{Utf8Path, Utf8PathBuf};
use ot_core::Report;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::ScanFailure;
use crate::protocol::{WorkerRequest, WorkerResponse};
use crate::worker::execute_request;

/// Runs a scan somewhere and brings back its outcome.
pub trait Executor: Send + Sync {
    /// Executes `request` until it completes or `cancel` fires.
    fn execute(
        &self,
        request: WorkerRequest,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Report, ScanFailure>> + Send;
}

/// Runs scans inside the calling process.
///
/// The request and the response are still encoded and decoded, so anything
/// that would not survive a remote worker fails here too.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessExecutor;

impl InProcessExecutor {
    /// Creates an in-process executor.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Executor for InProcessExecutor {
    async fn execute(&self, request: WorkerRequest, cancel: CancellationToken) -> Result<Report, ScanFailure> {
        let payload = serde_json::to_vec(&request)
            .map_err(|e| ScanFailure::io(format!("failed to encode worker request: {e}")))?;

        info!(root = %request.root, "Running scan in process");

        let scan_cancel = cancel.child_token();
        let token = scan_cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = serde_json::from_slice::<WorkerRequest>(&payload)
                .map_err(|e| ScanFailure::io(format!("malformed worker request: {e}")))
                .and_then(|request| execute_request(&request, &token));
            serde_json::to_vec(&WorkerResponse::from_result(result))
        });

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                scan_cancel.cancel();
                info!("In-process scan cancelled");
                Err(ScanFailure::Cancelled)
            }
            joined = task => {
                let encoded = joined
                    .map_err(|e| ScanFailure::io(format!("scan task failed: {e}")))?
                    .map_err(|e| ScanFailure::io(format!("failed to encode worker response: {e}")))?;
                decode_response(&encoded)
            }
        }
    }
}

/// Runs scans in a worker process.
///
/// The program is started with [`args`](Self::with_args) (by default
/// `worker`), receives the request on stdin and answers on stdout. Its stderr
/// is inherited so worker logs reach the caller's terminal.
#[derive(Debug, Clone)]
pub struct ProcessExecutor {
    /// Worker program.
    program: Utf8PathBuf,
    /// Arguments selecting the worker mode.
    args: Vec<String>,
}

impl ProcessExecutor {
    /// Creates an executor running `program worker`.
    #[must_use]
    pub fn new(program: impl Into<Utf8PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: vec!["worker".to_owned()],
        }
    }

    /// Creates an executor that re-runs the current executable as worker.
    ///
    /// # Errors
    ///
    /// Returns [`ScanFailure::Io`] if the executable path is unknown or not
    /// UTF-8.
    pub fn current_exe() -> Result<Self, ScanFailure> {
        let exe = std::env::current_exe()
            .map_err(|e| ScanFailure::io(format!("cannot locate current executable: {e}")))?;
        let exe = Utf8PathBuf::from_path_buf(exe)
            .map_err(|p| ScanFailure::io(format!("executable path is not valid UTF-8: {}", p.display())))?;
        Ok(Self::new(exe))
    }

    /// Replaces the arguments passed to the worker program.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Returns the worker program.
    #[must_use]
    pub fn program(&self) -> &Utf8Path {
        &self.program
    }
}

impl Executor for ProcessExecutor {
    async fn execute(&self, request: WorkerRequest, cancel: CancellationToken) -> Result<Report, ScanFailure> {
        let payload = serde_json::to_vec(&request)
            .map_err(|e| ScanFailure::io(format!("failed to encode worker request: {e}")))?;

        info!(program = %self.program, root = %request.root, "Starting worker process");

        let mut child = Command::new(self.program.as_std_path())
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ScanFailure::io(format!("failed to start worker {}: {e}", self.program)))?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| ScanFailure::io("worker stdin is not available"))?;
        let mut stdout = child
            .stdout
            .take()
            .ok_or_else(|| ScanFailure::io("worker stdout is not available"))?;

        let exchange = async move {
            stdin.write_all(&payload).await?;
            stdin.shutdown().await?;
            drop(stdin);

            let mut answer = Vec::new();
            stdout.read_to_end(&mut answer).await?;
            Ok::<_, std::io::Error>(answer)
        };

        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                if let Err(e) = child.kill().await {
                    warn!(error = %e, "Failed to kill worker process");
                }
                info!("Worker scan cancelled");
                Err(ScanFailure::Cancelled)
            }
            answer = exchange => {
                let answer = answer.map_err(|e| ScanFailure::io(format!("worker pipe failed: {e}")))?;
                let status = child
                    .wait()
                    .await
                    .map_err(|e| ScanFailure::io(format!("failed to wait for worker: {e}")))?;
                debug!(%status, bytes = answer.len(), "Worker finished");

                match decode_response(&answer) {
                    Err(ScanFailure::Io(_)) if !status.success() => {
                        Err(ScanFailure::io(format!("worker exited with {status}")))
                    }
                    result => result,
                }
            }
        }
    }
}

fn decode_response(bytes: &[u8]) -> Result<Report, ScanFailure> {
    serde_json::from_slice::<WorkerResponse>(bytes)
        .map_err(|e| ScanFailure::io(format!("malformed worker response: {e}")))?
        .into_result()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ot_core::{ScanRequest, TagConfig};
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn request_for(root: &Utf8Path) -> WorkerRequest {
        let request = ScanRequest::builder()
            .tags(TagConfig::builder().high("FIXME").normal("TODO").build())
            .build()
            .unwrap();
        WorkerRequest::new(request, root)
    }

    fn sample_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("z.txt"), "TODO last\n").unwrap();
        fs::write(dir.path().join("a.txt"), "FIXME first\n").unwrap();
        dir
    }

    #[tokio::test]
    async fn test_in_process_scan() {
        let dir = sample_tree();
        let root = Utf8Path::from_path(dir.path()).unwrap();

        let report = InProcessExecutor::new()
            .execute(request_for(root), CancellationToken::new())
            .await
            .unwrap();

        let paths: Vec<_> = report.tasks().iter().map(|t| t.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "z.txt"]);
    }

    #[tokio::test]
    async fn test_in_process_cancelled() {
        let dir = sample_tree();
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = InProcessExecutor::new().execute(request_for(root), cancel).await;
        assert_eq!(result, Err(ScanFailure::Cancelled));
    }

    #[tokio::test]
    async fn test_in_process_cancelled_mid_scan() {
        let dir = TempDir::new().unwrap();
        let content = "// TODO keep\nplain line\n".repeat(50);
        for i in 0..4000 {
            let sub = dir.path().join(format!("d{:02}", i % 40));
            fs::create_dir_all(&sub).unwrap();
            fs::write(sub.join(format!("f{i:04}.rs")), &content).unwrap();
        }
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let cancel = CancellationToken::new();

        let executor = InProcessExecutor::new();
        let scan = executor.execute(request_for(root).with_threads(Some(1)), cancel.clone());
        tokio::pin!(scan);

        // Still running after a few milliseconds.
        assert!(tokio::time::timeout(Duration::from_millis(5), &mut scan).await.is_err());
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(10), scan).await.unwrap();
        assert_eq!(result, Err(ScanFailure::Cancelled));
    }

    #[tokio::test]
    async fn test_in_process_failure_crosses_boundary() {
        let result = InProcessExecutor::new()
            .execute(request_for(Utf8Path::new("/nonexistent/tree")), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ref f) if f.is_configuration()));
    }

    #[tokio::test]
    async fn test_process_missing_program() {
        let executor = ProcessExecutor::new("/nonexistent/open-tasks-worker");
        let result = executor
            .execute(request_for(Utf8Path::new(".")), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ScanFailure::Io(ref m)) if m.contains("failed to start worker")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_decodes_worker_answer() {
        let answer = serde_json::to_string(&WorkerResponse::from_result(Ok(Report::empty()))).unwrap();
        let executor = ProcessExecutor::new("/bin/sh")
            .with_args(["-c".to_owned(), format!("cat > /dev/null; printf '%s' '{answer}'")]);

        let report = executor
            .execute(request_for(Utf8Path::new(".")), CancellationToken::new())
            .await
            .unwrap();
        assert!(report.is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_abnormal_exit() {
        let executor = ProcessExecutor::new("/bin/sh").with_args(["-c", "cat > /dev/null; exit 3"]);
        let result = executor
            .execute(request_for(Utf8Path::new(".")), CancellationToken::new())
            .await;
        assert!(matches!(result, Err(ScanFailure::Io(ref m)) if m.contains("worker exited")));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_process_cancelled_kills_worker() {
        let executor = ProcessExecutor::new("/bin/sh").with_args(["-c", "sleep 30"]);
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            trigger.cancel();
        });

        let result = tokio::time::timeout(
            Duration::from_secs(10),
            executor.execute(request_for(Utf8Path::new(".")), cancel),
        )
        .await
        .unwrap();
        assert_eq!(result, Err(ScanFailure::Cancelled));
    }
}
