//! Execution boundary for open-tasks scans.
//!
//! A scan is described by an immutable, serializable request and may run
//! inside the calling process or in a separate worker process. This crate
//! provides:
//!
//! - [`TaskScanner`] / [`OpenTasks`]: the capability callers hold
//! - [`Executor`]: where a scan runs ([`InProcessExecutor`],
//!   [`ProcessExecutor`])
//! - [`protocol`]: the JSON exchange between caller and worker
//! - [`run_worker`]: the worker side of that exchange
//! - [`ScanFailure`]: why a scan produced no report
//!
//! Configuration and tag compile errors are detected before anything
//! crosses the boundary. A cancelled scan never yields a partial report.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod error;
mod executor;
pub mod protocol;
mod scanner;
mod worker;

pub use error::ScanFailure;
pub use executor::{Executor, InProcessExecutor, ProcessExecutor};
pub use protocol::{FailureKind, WireFailure, WorkerRequest, WorkerResponse, PROTOCOL_VERSION};
pub use scanner::{OpenTasks, TaskScanner};
pub use worker::{execute_request, run_worker};
