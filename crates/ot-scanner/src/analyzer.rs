//! Parallel per-file task extraction using rayon.
//!
//! [`FileAnalyzer`] takes the paths resolved by a
//! [`FileSet`](crate::FileSet) and scans them with `rayon::par_iter()` on
//! whatever pool it is installed in.
//!
//! # Design
//!
//! Uses the "collect-then-parallelize" pattern:
//!
//! 1. Paths are collected first by the file set walk
//! 2. `FileAnalyzer` reads, decodes and scans each file independently
//! 3. Tasks are gathered by rayon; skipped files go through a mutex
//!    (failures are rare, so contention is minimal)
//!
//! The output order depends on thread interleaving; callers establish the
//! final order with [`Report::new`](ot_core::Report::new).

use camino::{Utf8Path, Utf8PathBuf};
use encoding_rs::Encoding;
use ot_core::{SkippedFile, TaskRecord};
use parking_lot::Mutex;
use rayon::prelude::*;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::ScanError;
use crate::lines::{open_decoded, LineScanner};
use crate::pattern::CompiledTags;
use crate::stats::ScanStats;

/// Scans files in parallel with shared, read-only matchers.
#[derive(Debug, Clone, Copy)]
pub struct FileAnalyzer<'a> {
    /// Directory the relative paths are resolved against.
    root: &'a Utf8Path,
    /// Compiled tier matchers.
    tags: &'a CompiledTags,
    /// Source encoding.
    encoding: &'static Encoding,
}

impl<'a> FileAnalyzer<'a> {
    /// Creates an analyzer for files below `root`.
    #[inline]
    #[must_use]
    pub const fn new(root: &'a Utf8Path, tags: &'a CompiledTags, encoding: &'static Encoding) -> Self {
        Self {
            root,
            tags,
            encoding,
        }
    }

    /// Scans every path in parallel.
    ///
    /// Files not yet started when `cancel` fires are left out; the caller is
    /// expected to discard the output in that case.
    ///
    /// # Returns
    ///
    /// The tasks of all scanned files and the files that had to be skipped,
    /// both unordered.
    #[must_use]
    pub fn analyze_files(
        &self,
        paths: &[Utf8PathBuf],
        cancel: &CancellationToken,
        stats: &ScanStats,
    ) -> (Vec<TaskRecord>, Vec<SkippedFile>) {
        let skipped: Mutex<Vec<SkippedFile>> = Mutex::new(Vec::new());

        let tasks = paths
            .par_iter()
            .flat_map_iter(|path| {
                if cancel.is_cancelled() {
                    return Vec::new();
                }

                match self.analyze_file(path) {
                    Ok(tasks) => {
                        debug!(path = %path, tasks = tasks.len(), "Scanned file");
                        stats.increment_scanned();
                        stats.add_tasks(tasks.len() as u64);
                        log_progress(stats);
                        tasks
                    }
                    Err(e) => {
                        warn!(path = %path, error = %e, "Skipping file");
                        stats.increment_skipped();
                        skipped.lock().push(SkippedFile::new(path.clone(), skip_reason(&e)));
                        log_progress(stats);
                        Vec::new()
                    }
                }
            })
            .collect();

        (tasks, skipped.into_inner())
    }

    /// Scans a single root-relative path.
    ///
    /// # Errors
    ///
    /// Any per-file [`ScanError`]; tasks found before a read failure are
    /// discarded with the file.
    pub fn analyze_file(&self, path: &Utf8Path) -> Result<Vec<TaskRecord>, ScanError> {
        let reader = open_decoded(&self.root.join(path), self.encoding)?;
        LineScanner::new(self.tags).tasks(path, reader).collect()
    }
}

/// Files handled between two progress lines.
const PROGRESS_INTERVAL: u64 = 1000;

fn log_progress(stats: &ScanStats) {
    let snapshot = stats.snapshot();
    let done = snapshot.scanned + snapshot.skipped;
    if done % PROGRESS_INTERVAL == 0 {
        debug!(
            done,
            pending = snapshot.pending(),
            percent = snapshot.progress_percent(),
            "Scan progress"
        );
    }
}

/// Reason text for a skipped file, without the absolute path.
fn skip_reason(error: &ScanError) -> String {
    match error {
        ScanError::Read { source, .. } => format!("read failed: {source}"),
        ScanError::Decode { encoding, .. } => format!("not valid {encoding}"),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PatternCompiler;
    use ot_core::{Priority, TagConfig};
    use std::fs;
    use tempfile::TempDir;

    fn setup(files: &[(&str, &[u8])]) -> (TempDir, CompiledTags) {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            fs::write(dir.path().join(name), content).unwrap();
        }
        let tags = PatternCompiler::compile(&TagConfig::builder().high("FIXME").normal("TODO").build());
        (dir, tags)
    }

    fn paths(names: &[&str]) -> Vec<Utf8PathBuf> {
        names.iter().map(Utf8PathBuf::from).collect()
    }

    #[test]
    fn test_analyze_file_records_relative_path() {
        let (dir, tags) = setup(&[("a.rs", &b"// FIXME: now\n"[..])]);
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let analyzer = FileAnalyzer::new(root, &tags, encoding_rs::UTF_8);

        let tasks = analyzer.analyze_file(Utf8Path::new("a.rs")).unwrap();
        assert_eq!(tasks, vec![TaskRecord::new("a.rs", 1, Priority::High, "FIXME", "now")]);
    }

    #[test]
    fn test_analyze_files_collects_skipped() {
        let (dir, tags) = setup(&[
            ("good.rs", &b"// TODO a\n// TODO b\n"[..]),
            ("bad.rs", &b"// TODO \xff\n"[..]),
        ]);
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let analyzer = FileAnalyzer::new(root, &tags, encoding_rs::UTF_8);
        let stats = ScanStats::new();

        let (tasks, skipped) = analyzer.analyze_files(
            &paths(&["good.rs", "bad.rs", "missing.rs"]),
            &CancellationToken::new(),
            &stats,
        );

        assert_eq!(tasks.len(), 2);
        assert_eq!(skipped.len(), 2);
        assert!(skipped.iter().any(|s| s.path == "bad.rs" && s.reason == "not valid UTF-8"));
        assert!(skipped.iter().any(|s| s.path == "missing.rs" && s.reason.starts_with("read failed")));

        let snap = stats.snapshot();
        assert_eq!(snap.scanned, 1);
        assert_eq!(snap.skipped, 2);
        assert_eq!(snap.tasks, 2);
    }

    #[test]
    fn test_analyze_files_stops_when_cancelled() {
        let (dir, tags) = setup(&[("a.rs", &b"// TODO\n"[..])]);
        let root = Utf8Path::from_path(dir.path()).unwrap();
        let analyzer = FileAnalyzer::new(root, &tags, encoding_rs::UTF_8);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let (tasks, skipped) = analyzer.analyze_files(&paths(&["a.rs"]), &cancel, &ScanStats::new());
        assert!(tasks.is_empty());
        assert!(skipped.is_empty());
    }
}
