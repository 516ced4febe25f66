//! Wire protocol between a scan caller and a worker.
//!
//! One exchange per worker run:
//!
//! 1. The caller writes one JSON [`WorkerRequest`] to the worker's stdin and
//!    closes it
//! 2. The worker writes one JSON [`WorkerResponse`] to its stdout
//!
//! The worker logs to stderr only, so stdout stays a clean protocol channel.
//! Everything the worker needs travels inside the request; no state is
//! shared with the caller.

use camino::{Utf8Path, Utf8PathBuf};
use ot_core::{Report, ScanRequest};
use ot_scanner::CompileError;
use serde::{Deserialize, Serialize};

use crate::error::ScanFailure;

/// Version of the exchange format. Bumped on incompatible changes.
pub const PROTOCOL_VERSION: u32 = 1;

/// Everything a worker needs to run one scan.
///
/// # Examples
///
/// ```
/// use ot_core::{ScanRequest, TagConfig};
/// use ot_remote::WorkerRequest;
///
/// let request = ScanRequest::builder()
///     .tags(TagConfig::builder().normal("TODO").build())
///     .build()?;
/// let invocation = WorkerRequest::new(request, "/srv/checkout").with_threads(Some(2));
///
/// assert!(invocation.check_version().is_ok());
/// # Ok::<(), ot_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRequest {
    /// Exchange format version.
    pub version: u32,
    /// Directory to scan, as seen by the worker.
    pub root: Utf8PathBuf,
    /// The scan to run.
    pub request: ScanRequest,
    /// Scanning pool size; `None` uses every core of the worker.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

impl WorkerRequest {
    /// Creates a request in the current protocol version.
    #[must_use]
    pub fn new(request: ScanRequest, root: impl Into<Utf8PathBuf>) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            root: root.into(),
            request,
            threads: None,
        }
    }

    /// Sets the scanning pool size.
    #[must_use]
    pub const fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Directory to scan.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Rejects requests written for another protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`ScanFailure::Configuration`] on a version mismatch.
    pub fn check_version(&self) -> Result<(), ScanFailure> {
        if self.version == PROTOCOL_VERSION {
            Ok(())
        } else {
            Err(ScanFailure::configuration(format!(
                "unsupported protocol version {}, expected {PROTOCOL_VERSION}",
                self.version
            )))
        }
    }
}

/// Category of a [`WireFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// See [`ScanFailure::Configuration`].
    Configuration,
    /// See [`ScanFailure::Compile`].
    Compile,
    /// See [`ScanFailure::Io`].
    Io,
    /// See [`ScanFailure::Cancelled`].
    Cancelled,
}

/// Serialized form of a [`ScanFailure`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireFailure {
    /// Failure category.
    pub kind: FailureKind,
    /// Human readable description.
    pub message: String,
    /// Per-tier problems, for [`FailureKind::Compile`].
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub compile_errors: Vec<CompileError>,
}

impl From<ScanFailure> for WireFailure {
    fn from(failure: ScanFailure) -> Self {
        let message = failure.to_string();
        match failure {
            ScanFailure::Configuration(_) => Self {
                kind: FailureKind::Configuration,
                message,
                compile_errors: Vec::new(),
            },
            ScanFailure::Compile(errors) => Self {
                kind: FailureKind::Compile,
                message,
                compile_errors: errors,
            },
            ScanFailure::Io(_) => Self {
                kind: FailureKind::Io,
                message,
                compile_errors: Vec::new(),
            },
            ScanFailure::Cancelled => Self {
                kind: FailureKind::Cancelled,
                message,
                compile_errors: Vec::new(),
            },
        }
    }
}

impl From<WireFailure> for ScanFailure {
    fn from(wire: WireFailure) -> Self {
        match wire.kind {
            FailureKind::Configuration => {
                Self::Configuration(strip_prefix(wire.message, "invalid configuration: "))
            }
            FailureKind::Compile => Self::Compile(wire.compile_errors),
            FailureKind::Io => Self::Io(strip_prefix(wire.message, "scan failed: ")),
            FailureKind::Cancelled => Self::Cancelled,
        }
    }
}

/// Undoes the `Display` prefix so a failure survives a round trip unchanged.
fn strip_prefix(message: String, prefix: &str) -> String {
    match message.strip_prefix(prefix) {
        Some(rest) => rest.to_owned(),
        None => message,
    }
}

/// The single answer of a worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "body", rename_all = "snake_case")]
pub enum WorkerResponse {
    /// The scan completed.
    Report(Report),
    /// The scan produced no report.
    Failure(WireFailure),
}

impl WorkerResponse {
    /// Wraps the outcome of a scan.
    #[must_use]
    pub fn from_result(result: Result<Report, ScanFailure>) -> Self {
        match result {
            Ok(report) => Self::Report(report),
            Err(failure) => Self::Failure(failure.into()),
        }
    }

    /// Unwraps the response into the outcome of the scan.
    ///
    /// # Errors
    ///
    /// Returns the transported [`ScanFailure`].
    pub fn into_result(self) -> Result<Report, ScanFailure> {
        match self {
            Self::Report(report) => Ok(report),
            Self::Failure(failure) => Err(failure.into()),
        }
    }
}
