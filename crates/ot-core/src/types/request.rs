//! The immutable scan request.
//!
//! A [`ScanRequest`] carries everything a worker needs to scan a tree: tag
//! identifiers, the file set and the source encoding. It is built once per
//! scan, never mutated, and serialized as-is across the execution boundary.

use serde::{Deserialize, Serialize};

use super::tags::TagConfig;
use crate::error::ConfigError;

/// Default source encoding.
pub const DEFAULT_ENCODING: &str = "UTF-8";

/// Include and exclude glob patterns selecting the files to scan.
///
/// Each pattern may contain several globs separated by commas
/// (`"**/*.rs, **/*.toml"`). A blank include selects every file; a blank
/// exclude removes nothing.
///
/// # Examples
///
/// ```
/// use ot_core::FileSetSpec;
///
/// let files = FileSetSpec::new("**/*.java", "**/Test*.java");
/// assert_eq!(files.include(), "**/*.java");
/// assert!(!FileSetSpec::all().has_excludes());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileSetSpec {
    include: String,
    exclude: String,
}

impl FileSetSpec {
    /// Creates a file set from include and exclude patterns.
    #[must_use]
    pub fn new(include: impl Into<String>, exclude: impl Into<String>) -> Self {
        Self {
            include: include.into(),
            exclude: exclude.into(),
        }
    }

    /// A file set selecting every file.
    #[inline]
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Returns the raw include pattern.
    #[inline]
    #[must_use]
    pub fn include(&self) -> &str {
        &self.include
    }

    /// Returns the raw exclude pattern.
    #[inline]
    #[must_use]
    pub fn exclude(&self) -> &str {
        &self.exclude
    }

    /// Returns `true` if the exclude pattern is not blank.
    #[must_use]
    pub fn has_excludes(&self) -> bool {
        !self.exclude.trim().is_empty()
    }
}

/// Everything needed to run one scan.
///
/// The request has no setters: it is assembled by [`ScanRequestBuilder`],
/// validated at [`build`](ScanRequestBuilder::build), and stays read-only while
/// it is shared between worker threads or shipped to a remote worker.
///
/// # Examples
///
/// ```
/// use ot_core::{FileSetSpec, ScanRequest, TagConfig};
///
/// let request = ScanRequest::builder()
///     .tags(TagConfig::builder().normal("TODO").build())
///     .file_set(FileSetSpec::new("**/*.rs", ""))
///     .encoding("latin1")
///     .build()?;
///
/// assert_eq!(request.encoding(), "windows-1252");
/// # Ok::<(), ot_core::ConfigError>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    tags: TagConfig,
    file_set: FileSetSpec,
    encoding: String,
}

impl ScanRequest {
    /// Starts building a request.
    #[inline]
    #[must_use]
    pub fn builder() -> ScanRequestBuilder {
        ScanRequestBuilder::default()
    }

    /// Returns the tag configuration.
    #[inline]
    #[must_use]
    pub const fn tags(&self) -> &TagConfig {
        &self.tags
    }

    /// Returns the file set.
    #[inline]
    #[must_use]
    pub const fn file_set(&self) -> &FileSetSpec {
        &self.file_set
    }

    /// Returns the canonical name of the source encoding.
    #[inline]
    #[must_use]
    pub fn encoding(&self) -> &str {
        &self.encoding
    }

    /// Checks the request invariants.
    ///
    /// Requests built through the builder always pass; requests received
    /// from the wire are re-checked by the worker.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownEncoding`] if the encoding label is unknown
    /// - [`ConfigError::NoIdentifiers`] if every tier is blank
    pub fn validate(&self) -> Result<(), ConfigError> {
        resolve_encoding(&self.encoding)?;
        if !self.tags.has_identifiers() {
            return Err(ConfigError::NoIdentifiers);
        }
        Ok(())
    }
}

/// Builder for [`ScanRequest`].
#[derive(Debug, Clone, Default)]
pub struct ScanRequestBuilder {
    tags: TagConfig,
    file_set: FileSetSpec,
    encoding: Option<String>,
}

impl ScanRequestBuilder {
    /// Sets the tag configuration.
    #[must_use]
    pub fn tags(mut self, tags: TagConfig) -> Self {
        self.tags = tags;
        self
    }

    /// Sets the file set.
    #[must_use]
    pub fn file_set(mut self, file_set: FileSetSpec) -> Self {
        self.file_set = file_set;
        self
    }

    /// Sets the source encoding label (e.g. `UTF-8`, `ISO-8859-1`).
    #[must_use]
    pub fn encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    /// Validates and builds the request.
    ///
    /// The encoding label is normalized to its canonical name.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::UnknownEncoding`] if the encoding label is unknown
    /// - [`ConfigError::NoIdentifiers`] if every tier is blank
    pub fn build(self) -> Result<ScanRequest, ConfigError> {
        let label = self.encoding.as_deref().unwrap_or(DEFAULT_ENCODING);
        let encoding = resolve_encoding(label)?;

        let request = ScanRequest {
            tags: self.tags,
            file_set: self.file_set,
            encoding: encoding.name().to_owned(),
        };
        request.validate()?;
        Ok(request)
    }
}

/// Looks up an encoding by its WHATWG label.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownEncoding`] if the label is not recognized.
pub fn resolve_encoding(label: &str) -> Result<&'static encoding_rs::Encoding, ConfigError> {
    encoding_rs::Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| ConfigError::UnknownEncoding(label.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::tags::{MatchMode, PatternMode};

    fn todo_tags() -> TagConfig {
        TagConfig::builder().normal("TODO").build()
    }

    #[test]
    fn test_build_defaults_to_utf8() {
        let request = ScanRequest::builder().tags(todo_tags()).build().unwrap();
        assert_eq!(request.encoding(), "UTF-8");
        assert_eq!(request.file_set(), &FileSetSpec::all());
    }

    #[test]
    fn test_build_rejects_unknown_encoding() {
        let result = ScanRequest::builder()
            .tags(todo_tags())
            .encoding("klingon-8")
            .build();
        assert!(matches!(result, Err(ConfigError::UnknownEncoding(label)) if label == "klingon-8"));
    }

    #[test]
    fn test_build_rejects_blank_tags() {
        let result = ScanRequest::builder()
            .tags(TagConfig::builder().high(" ").build())
            .build();
        assert!(matches!(result, Err(ConfigError::NoIdentifiers)));
    }

    #[test]
    fn test_encoding_label_is_normalized() {
        let request = ScanRequest::builder()
            .tags(todo_tags())
            .encoding(" iso-8859-1 ")
            .build()
            .unwrap();
        assert_eq!(request.encoding(), "windows-1252");
    }

    #[test]
    fn test_request_round_trips_every_field() {
        let request = ScanRequest::builder()
            .tags(
                TagConfig::builder()
                    .high("FIXME")
                    .normal("TODO")
                    .low("@deprecated")
                    .match_mode(MatchMode::IgnoreCase)
                    .pattern_mode(PatternMode::Regex)
                    .build(),
            )
            .file_set(FileSetSpec::new("**/*.java", "**/Test*.java"))
            .encoding("UTF-16LE")
            .build()
            .unwrap();

        let json = serde_json::to_string(&request).unwrap();
        let parsed: ScanRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn test_validate_rechecks_wire_requests() {
        let json = r#"{
            "tags": {"high": "", "normal": "", "low": "", "match_mode": "case_sensitive", "pattern_mode": "literal"},
            "file_set": {"include": "", "exclude": ""},
            "encoding": "UTF-8"
        }"#;
        let request: ScanRequest = serde_json::from_str(json).unwrap();
        assert!(matches!(request.validate(), Err(ConfigError::NoIdentifiers)));
    }
}
