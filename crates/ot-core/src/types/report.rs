//! The scan report.
//!
//! A [`Report`] is the only value a scan hands back to its caller. It is
//! ordered deterministically, so two scans of the same tree produce equal
//! reports no matter how the work was scheduled.

use serde::{Deserialize, Serialize};

use super::priority::Priority;
use super::task::{SkippedFile, TaskRecord};

/// Identifier of the tool that produced a report.
pub const TOOL_ID: &str = "open-tasks";

/// Aggregated counts of a report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportSummary {
    /// Files that were read and scanned.
    pub files_scanned: u64,
    /// Files that could not be read or decoded.
    pub files_skipped: u64,
    /// Tasks in the high tier.
    pub high: u64,
    /// Tasks in the normal tier.
    pub normal: u64,
    /// Tasks in the low tier.
    pub low: u64,
}

impl ReportSummary {
    /// Total number of tasks over all tiers.
    #[inline]
    #[must_use]
    pub const fn total_tasks(&self) -> u64 {
        self.high + self.normal + self.low
    }

    /// Number of tasks in the given tier.
    #[inline]
    #[must_use]
    pub const fn count(&self, priority: Priority) -> u64 {
        match priority {
            Priority::High => self.high,
            Priority::Normal => self.normal,
            Priority::Low => self.low,
        }
    }
}

/// Ordered findings of one scan.
///
/// Tasks are sorted by path then line, skipped files by path. A report
/// never holds two tasks for the same `(path, line)`: if such duplicates are
/// handed to [`Report::new`], the one with the highest tier is kept.
///
/// # Examples
///
/// ```
/// use ot_core::{Priority, Report, TaskRecord};
///
/// let report = Report::new(
///     vec![
///         TaskRecord::new("z.txt", 1, Priority::Low, "TODO", "later"),
///         TaskRecord::new("a.txt", 4, Priority::High, "FIXME", "now"),
///     ],
///     Vec::new(),
///     2,
/// );
///
/// assert_eq!(report.tasks()[0].path, "a.txt");
/// assert_eq!(report.summary().total_tasks(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    tool: String,
    tasks: Vec<TaskRecord>,
    skipped: Vec<SkippedFile>,
    summary: ReportSummary,
}

impl Report {
    /// Builds a report, establishing the ordering and uniqueness invariants.
    ///
    /// # Arguments
    ///
    /// * `tasks` - Tasks in any order
    /// * `skipped` - Files that could not be scanned, in any order
    /// * `files_scanned` - Number of files that were scanned successfully
    #[must_use]
    pub fn new(mut tasks: Vec<TaskRecord>, mut skipped: Vec<SkippedFile>, files_scanned: u64) -> Self {
        // Within one (path, line) the highest tier sorts first and survives.
        tasks.sort();
        tasks.dedup_by(|later, earlier| later.path == earlier.path && later.line == earlier.line);
        skipped.sort();

        let mut summary = ReportSummary {
            files_scanned,
            files_skipped: skipped.len() as u64,
            ..ReportSummary::default()
        };
        for task in &tasks {
            match task.priority {
                Priority::High => summary.high += 1,
                Priority::Normal => summary.normal += 1,
                Priority::Low => summary.low += 1,
            }
        }

        Self {
            tool: TOOL_ID.to_owned(),
            tasks,
            skipped,
            summary,
        }
    }

    /// An empty report.
    #[must_use]
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), 0)
    }

    /// Identifier of the producing tool.
    #[inline]
    #[must_use]
    pub fn tool(&self) -> &str {
        &self.tool
    }

    /// Tasks in report order.
    #[inline]
    #[must_use]
    pub fn tasks(&self) -> &[TaskRecord] {
        &self.tasks
    }

    /// Files that could not be scanned, sorted by path.
    #[inline]
    #[must_use]
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }

    /// Aggregated counts.
    #[inline]
    #[must_use]
    pub const fn summary(&self) -> &ReportSummary {
        &self.summary
    }

    /// Returns `true` if the report holds no tasks.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Number of tasks.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Tasks of a single tier, in report order.
    pub fn tasks_with_priority(&self, priority: Priority) -> impl Iterator<Item = &TaskRecord> {
        self.tasks.iter().filter(move |task| task.priority == priority)
    }

    /// Consumes the report and returns its tasks.
    #[must_use]
    pub fn into_tasks(self) -> Vec<TaskRecord> {
        self.tasks
    }
}

impl Default for Report {
    fn default() -> Self {
        Self::empty()
    }
}
