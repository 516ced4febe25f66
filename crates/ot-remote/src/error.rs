//! Error types for the ot-remote crate.
//!
//! This module provides [`ScanFailure`], the failure taxonomy callers see on
//! the far side of the execution boundary.

use ot_scanner::{CompileError, ScanError};

/// Why a scan produced no report.
///
/// # Error Recovery Strategy
///
/// - **Configuration** ([`ScanFailure::Configuration`], [`ScanFailure::Compile`]):
///   the request must be fixed; retrying is pointless
/// - **Scan I/O** ([`ScanFailure::Io`]): transport or remote execution failed;
///   retrying is the caller's decision
/// - **Cancellation** ([`ScanFailure::Cancelled`]): an abort, not an error
///
/// # Examples
///
/// ```
/// use ot_remote::ScanFailure;
///
/// fn exit_code(failure: &ScanFailure) -> i32 {
///     if failure.is_cancelled() { 130 } else { 1 }
/// }
///
/// assert_eq!(exit_code(&ScanFailure::Cancelled), 130);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScanFailure {
    /// The request or its environment is invalid.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// One or more tiers have an invalid tag pattern.
    #[error("invalid tag pattern: {}", join(.0))]
    Compile(Vec<CompileError>),

    /// The scan could not be carried out or its result not transported.
    #[error("scan failed: {0}")]
    Io(String),

    /// The scan was aborted.
    #[error("scan cancelled")]
    Cancelled,
}

fn join(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ScanFailure {
    /// Creates a new [`ScanFailure::Io`] failure.
    #[inline]
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io(message.into())
    }

    /// Creates a new [`ScanFailure::Configuration`] failure.
    #[inline]
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// Returns `true` for an aborted scan.
    #[inline]
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` if the request itself has to change.
    #[inline]
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_) | Self::Compile(_))
    }
}

impl From<ScanError> for ScanFailure {
    fn from(error: ScanError) -> Self {
        match error {
            ScanError::Cancelled => Self::Cancelled,
            ScanError::Compile(errors) => Self::Compile(errors),
            other if other.is_configuration() => Self::Configuration(other.to_string()),
            other => Self::Io(other.to_string()),
        }
    }
}
