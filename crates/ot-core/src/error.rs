//! Error types for the ot-core crate.
//!
//! This module provides the [`ConfigError`] type for configuration problems
//! that are detected before any scanning starts.

use camino::Utf8PathBuf;

/// Errors that can occur while loading configuration or building a request.
///
/// # Examples
///
/// ```
/// use ot_core::ConfigError;
///
/// let error = ConfigError::UnknownEncoding("klingon-8".to_owned());
/// assert!(error.to_string().contains("klingon-8"));
/// ```
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// No tier has any tag identifier.
    #[error("no tag identifiers configured")]
    NoIdentifiers,

    /// The source encoding label is not recognized.
    #[error("unknown character encoding '{0}'")]
    UnknownEncoding(String),

    /// A configuration option has an invalid value.
    #[error("invalid configuration option '{option}': {reason}")]
    InvalidOption {
        /// The name of the invalid option.
        option: String,
        /// Explanation of why the option is invalid.
        reason: String,
    },

    /// Failed to read the configuration file.
    #[error("failed to read configuration {path}: {source}")]
    Io {
        /// The configuration file.
        path: Utf8PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse the configuration file.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Creates a new [`ConfigError::InvalidOption`] error.
    #[inline]
    pub fn invalid_option(option: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidOption {
            option: option.into(),
            reason: reason.into(),
        }
    }
}
