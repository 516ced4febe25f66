//! The task scanning capability offered to callers.
//!
//! [`TaskScanner`] is what an orchestrator holds; [`OpenTasks`] implements it
//! on top of any [`Executor`].

use std::future::Future;

use camino::Utf8Path;
use ot_core::{Report, ScanRequest, TagConfig, ValidationOutcome};
use ot_scanner::PatternCompiler;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::ScanFailure;
use crate::executor::{Executor, InProcessExecutor};
use crate::protocol::WorkerRequest;

/// Finds open tasks in a directory tree.
pub trait TaskScanner {
    /// Scans `root` as described by `request`.
    ///
    /// Completes with the full report, or with a failure when the request is
    /// invalid, the scan could not run, or `cancel` fired.
    fn scan(
        &self,
        request: ScanRequest,
        root: &Utf8Path,
        cancel: CancellationToken,
    ) -> impl Future<Output = Result<Report, ScanFailure>> + Send;

    /// Checks `tags` against an in-memory `sample`.
    fn validate(&self, sample: &str, tags: &TagConfig) -> ValidationOutcome;
}

/// The open-tasks scanner, running its scans through `E`.
///
/// # Examples
///
/// ```no_run
/// use camino::Utf8Path;
/// use ot_core::{ScanRequest, TagConfig};
/// use ot_remote::{OpenTasks, TaskScanner};
/// use tokio_util::sync::CancellationToken;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let scanner = OpenTasks::in_process();
/// let request = ScanRequest::builder()
///     .tags(TagConfig::builder().normal("TODO").build())
///     .build()?;
///
/// let report = scanner.scan(request, Utf8Path::new("src"), CancellationToken::new()).await?;
/// println!("{} open tasks", report.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct OpenTasks<E> {
    executor: E,
    threads: Option<usize>,
}

impl OpenTasks<InProcessExecutor> {
    /// Creates a scanner running scans inside this process.
    #[must_use]
    pub const fn in_process() -> Self {
        Self::new(InProcessExecutor::new())
    }
}

impl<E> OpenTasks<E> {
    /// Creates a scanner running scans through `executor`.
    #[must_use]
    pub const fn new(executor: E) -> Self {
        Self {
            executor,
            threads: None,
        }
    }

    /// Sets the scanning pool size; `None` uses every core.
    #[must_use]
    pub const fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Returns the executor.
    pub const fn executor(&self) -> &E {
        &self.executor
    }
}

impl<E: Executor> TaskScanner for OpenTasks<E> {
    async fn scan(
        &self,
        request: ScanRequest,
        root: &Utf8Path,
        cancel: CancellationToken,
    ) -> Result<Report, ScanFailure> {
        request.validate().map_err(|e| ScanFailure::configuration(e.to_string()))?;
        PatternCompiler::compile(request.tags()).ensure_usable()?;

        if cancel.is_cancelled() {
            return Err(ScanFailure::Cancelled);
        }

        debug!(root = %root, threads = ?self.threads, "Dispatching scan");
        let invocation = WorkerRequest::new(request, root).with_threads(self.threads);
        let result = self.executor.execute(invocation, cancel).await;

        match &result {
            Ok(report) => info!(tasks = report.len(), skipped = report.skipped().len(), "Scan finished"),
            Err(failure) => info!(error = %failure, "Scan failed"),
        }
        result
    }

    fn validate(&self, sample: &str, tags: &TagConfig) -> ValidationOutcome {
        ot_scanner::validate(sample, tags)
    }
}
