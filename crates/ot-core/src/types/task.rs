//! Task findings and per-file failures.

use std::cmp::Ordering;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// A single open task found in a source file.
///
/// `path` is relative to the scan root and always uses `/` separators, so
/// reports produced on different machines compare equal.
///
/// Records are ordered by path, then line. The field names are part of the
/// report contract consumed by rendering and trend layers.
///
/// # Examples
///
/// ```
/// use ot_core::{Priority, TaskRecord};
///
/// let task = TaskRecord::new("src/main.rs", 12, Priority::Normal, "TODO", "handle errors");
/// assert_eq!(task.line, 12);
/// assert_eq!(task.to_string(), "src/main.rs:12: [NORMAL] TODO handle errors");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskRecord {
    /// File containing the task, relative to the scan root.
    pub path: Utf8PathBuf,
    /// 1-based line number.
    pub line: u32,
    /// Tier of the matcher that recognized the tag.
    pub priority: Priority,
    /// The tag text as it appears in the line.
    pub tag: String,
    /// Text following the tag on the same line.
    pub message: String,
}

impl TaskRecord {
    /// Creates a new task record.
    #[must_use]
    pub fn new(
        path: impl Into<Utf8PathBuf>,
        line: u32,
        priority: Priority,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            line,
            priority,
            tag: tag.into(),
            message: message.into(),
        }
    }
}

impl PartialOrd for TaskRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TaskRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.path
            .as_str()
            .cmp(other.path.as_str())
            .then(self.line.cmp(&other.line))
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| self.tag.cmp(&other.tag))
            .then_with(|| self.message.cmp(&other.message))
    }
}

impl std::fmt::Display for TaskRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}: [{}] {}", self.path, self.line, self.priority, self.tag)?;
        if !self.message.is_empty() {
            write!(f, " {}", self.message)?;
        }
        Ok(())
    }
}

/// A file that could not be scanned.
///
/// Skipped files are reported next to the tasks; they never abort the scan.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SkippedFile {
    /// File that failed, relative to the scan root.
    pub path: Utf8PathBuf,
    /// Why the file was skipped.
    pub reason: String,
}

impl SkippedFile {
    /// Creates a new skipped file entry.
    #[must_use]
    pub fn new(path: impl Into<Utf8PathBuf>, reason: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
