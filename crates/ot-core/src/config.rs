//! Configuration file for the open-tasks scanner.
//!
//! This module provides the configuration sections read from a JSON file:
//!
//! - [`TagsConfig`] - Tag identifiers per tier and matching flags
//! - [`FilesConfig`] - Include/exclude patterns and source encoding
//! - [`WorkerConfig`] - Where and how wide the scan runs
//! - [`Config`] - Root configuration combining all sections
//!
//! All sections implement [`Default`] and deserialize with missing fields
//! filled from the defaults.

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::types::{
    FileSetSpec, MatchMode, PatternMode, ScanRequest, TagConfig, DEFAULT_ENCODING,
};

/// Tag identifiers per tier.
///
/// # Examples
///
/// ```
/// use ot_core::TagsConfig;
///
/// let config = TagsConfig::default();
/// assert_eq!(config.high, "FIXME");
/// assert_eq!(config.normal, "TODO");
/// assert_eq!(config.low, "@deprecated");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagsConfig {
    /// Identifiers of the high tier.
    pub high: String,
    /// Identifiers of the normal tier.
    pub normal: String,
    /// Identifiers of the low tier.
    pub low: String,
    /// Match identifiers regardless of casing.
    pub ignore_case: bool,
    /// Treat each tier string as a regular expression.
    pub regex: bool,
}

impl Default for TagsConfig {
    fn default() -> Self {
        Self {
            high: "FIXME".to_owned(),
            normal: "TODO".to_owned(),
            low: "@deprecated".to_owned(),
            ignore_case: false,
            regex: false,
        }
    }
}

impl TagsConfig {
    /// Converts the section into an immutable [`TagConfig`].
    #[must_use]
    pub fn to_tag_config(&self) -> TagConfig {
        TagConfig::builder()
            .high(self.high.as_str())
            .normal(self.normal.as_str())
            .low(self.low.as_str())
            .match_mode(MatchMode::from_ignore_case(self.ignore_case))
            .pattern_mode(PatternMode::from_regex_flag(self.regex))
            .build()
    }
}

/// Which files are scanned and how they are decoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Comma-separated include globs.
    pub include: String,
    /// Comma-separated exclude globs.
    pub exclude: String,
    /// Source encoding label.
    pub encoding: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            include: "**/*".to_owned(),
            exclude: String::new(),
            encoding: DEFAULT_ENCODING.to_owned(),
        }
    }
}

/// Execution settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Size of the scanning pool.
    /// `None` means use all available CPU cores.
    pub threads: Option<usize>,

    /// Scan inside the calling process instead of a worker process.
    pub in_process: bool,

    /// Worker program; `None` means the current executable.
    pub program: Option<Utf8PathBuf>,
}

/// Root configuration for the open-tasks scanner.
///
/// # Examples
///
/// ```
/// use ot_core::Config;
///
/// let config = Config::default();
/// let request = config.to_request()?;
/// assert_eq!(request.encoding(), "UTF-8");
/// # Ok::<(), ot_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Tag identifiers.
    pub tags: TagsConfig,

    /// File selection.
    pub files: FilesConfig,

    /// Execution settings.
    pub worker: WorkerConfig,
}

impl Config {
    /// Loads a configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Parse`] if it is not valid JSON, and
    /// [`ConfigError::InvalidOption`] if a value is out of range.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_std_path()).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks option ranges that serde cannot express.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidOption`] for a zero-sized pool.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker.threads == Some(0) {
            return Err(ConfigError::invalid_option(
                "worker.threads",
                "must be at least 1",
            ));
        }
        Ok(())
    }

    /// Builds the immutable scan request described by this configuration.
    ///
    /// # Errors
    ///
    /// Returns the request validation errors of
    /// [`ScanRequestBuilder::build`](crate::ScanRequestBuilder::build).
    pub fn to_request(&self) -> Result<ScanRequest, ConfigError> {
        ScanRequest::builder()
            .tags(self.tags.to_tag_config())
            .file_set(FileSetSpec::new(
                self.files.include.as_str(),
                self.files.exclude.as_str(),
            ))
            .encoding(self.files.encoding.as_str())
            .build()
    }
}
