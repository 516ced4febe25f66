//! Error types for the ot-scanner crate.
//!
//! This module provides the [`ScanError`] type for errors that can occur
//! while compiling tags, resolving file sets and scanning files.

use camino::Utf8PathBuf;
use ot_core::ConfigError;

use crate::pattern::CompileError;

/// Errors that can occur during scanning operations.
///
/// # Error Recovery Strategy
///
/// - **Configuration errors** ([`ScanError::Request`], [`ScanError::Config`],
///   [`ScanError::Pattern`], [`ScanError::Compile`], [`ScanError::NoIdentifiers`]):
///   reported before any file is read
/// - **Walker errors** ([`ScanError::Walk`]): the root itself cannot be
///   walked - propagate immediately
/// - **Per-entry errors** ([`ScanError::Read`], [`ScanError::Decode`],
///   [`ScanError::NonUtf8Path`], [`ScanError::Unreadable`]): record the entry
///   as skipped, continue scan
/// - **Cancellation** ([`ScanError::Cancelled`]): stop, discard partial results
///
/// # Examples
///
/// ```
/// use ot_scanner::ScanError;
///
/// fn handle_error(err: &ScanError) {
///     if err.is_recoverable() {
///         eprintln!("skipping file: {err}");
///     } else if err.is_cancelled() {
///         eprintln!("scan aborted");
///     } else {
///         eprintln!("scan failed: {err}");
///     }
/// }
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    /// Failed to walk the root directory.
    #[error("failed to walk directory: {0}")]
    Walk(#[from] ignore::Error),

    /// An entry below the root could not be visited.
    #[error("cannot visit {path}: {source}")]
    Unreadable {
        /// The entry, relative to the scan root.
        path: Utf8PathBuf,
        /// The underlying walk error.
        #[source]
        source: ignore::Error,
    },

    /// Failed to read a file.
    #[error("failed to read file {path}: {source}")]
    Read {
        /// The path of the file that couldn't be read.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// A file is not valid in the requested encoding.
    #[error("file {path} is not valid {encoding}")]
    Decode {
        /// The path of the file that couldn't be decoded.
        path: Utf8PathBuf,
        /// Canonical name of the requested encoding.
        encoding: String,
    },

    /// Invalid scanner configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The scan request violates its invariants.
    #[error("invalid scan request: {0}")]
    Request(#[from] ConfigError),

    /// A file-set glob is malformed.
    #[error("invalid file pattern '{pattern}': {source}")]
    Pattern {
        /// The offending glob.
        pattern: String,
        /// The underlying glob error.
        #[source]
        source: globset::Error,
    },

    /// One or more tiers have an invalid tag pattern.
    #[error("invalid tag pattern: {}", join_compile_errors(.0))]
    Compile(Vec<CompileError>),

    /// No tier has a usable matcher.
    #[error("no tag identifiers configured")]
    NoIdentifiers,

    /// A path is not valid UTF-8.
    #[error("path is not valid UTF-8: {}", _0.display())]
    NonUtf8Path(std::path::PathBuf),

    /// The scanning pool could not be started.
    #[error("failed to start scanning pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The scan was cancelled.
    #[error("scan cancelled")]
    Cancelled,
}

fn join_compile_errors(errors: &[CompileError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl ScanError {
    /// Creates a new [`ScanError::Read`] error.
    #[inline]
    pub fn read(path: impl Into<Utf8PathBuf>, source: std::io::Error) -> Self {
        Self::Read {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Decode`] error.
    #[inline]
    pub fn decode(path: impl Into<Utf8PathBuf>, encoding: impl Into<String>) -> Self {
        Self::Decode {
            path: path.into(),
            encoding: encoding.into(),
        }
    }

    /// Creates a new [`ScanError::Unreadable`] error.
    #[inline]
    pub fn unreadable(path: impl Into<Utf8PathBuf>, source: ignore::Error) -> Self {
        Self::Unreadable {
            path: path.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Pattern`] error.
    #[inline]
    pub fn pattern(pattern: impl Into<String>, source: globset::Error) -> Self {
        Self::Pattern {
            pattern: pattern.into(),
            source,
        }
    }

    /// Creates a new [`ScanError::Config`] error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Returns `true` if this error only concerns one entry (scanning can continue).
    #[inline]
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Read { .. } | Self::Decode { .. } | Self::NonUtf8Path(_) | Self::Unreadable { .. }
        )
    }

    /// Returns `true` if this error is fatal (scanning should stop).
    #[inline]
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !self.is_recoverable()
    }

    /// Returns `true` for a cancellation.
    #[inline]
    #[must_use]
    pub const fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for problems with the request itself, detected before
    /// any file is read.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::Request(_)
                | Self::Pattern { .. }
                | Self::Compile(_)
                | Self::NoIdentifiers
        )
    }

    /// Returns the file path associated with this error, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Utf8PathBuf> {
        match self {
            Self::Read { path, .. } | Self::Decode { path, .. } | Self::Unreadable { path, .. } => {
                Some(path)
            }
            _ => None,
        }
    }
}
