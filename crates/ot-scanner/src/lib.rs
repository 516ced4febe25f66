//! Tag compilation, file-set resolution and parallel line scanning.
//!
//! This crate is the scanning engine of open-tasks. It turns a
//! [`ScanRequest`] into a [`Report`] of every open task below a root
//! directory.
//!
//! # Overview
//!
//! The main entry point is [`Scanner`], which combines:
//!
//! - [`PatternCompiler`]: tag identifiers to per-tier matchers
//! - [`FileSet`]: include/exclude resolution over a directory walk
//! - [`LineScanner`]: line-by-line task extraction with tier tie-breaks
//! - [`FileAnalyzer`]: parallel per-file processing with rayon
//! - [`ScanStats`]: atomic counters behind the report summary
//!
//! [`validate`] previews a tag configuration against a sample string.
//!
//! # Example
//!
//! ```no_run
//! use camino::Utf8Path;
//! use ot_core::{ScanRequest, TagConfig};
//! use ot_scanner::Scanner;
//! use tokio_util::sync::CancellationToken;
//!
//! let request = ScanRequest::builder()
//!     .tags(TagConfig::builder().high("FIXME").normal("TODO").build())
//!     .build()?;
//! let scanner = Scanner::new(request, Utf8Path::new("./src"))?.with_threads(4);
//!
//! let report = scanner.scan(&CancellationToken::new())?;
//! for task in report.tasks() {
//!     println!("{task}");
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Architecture
//!
//! ```text
//! Scanner (main entry point)
//!     │
//!     ├── CompiledTags (PatternCompiler, shared read-only)
//!     │
//!     ├── FileSet (collect paths)
//!     │       │
//!     │       └── WalkBuilder (ignore crate) + GlobSet (globset)
//!     │
//!     ├── FileAnalyzer (parallel scanning on a bounded rayon pool)
//!     │       │
//!     │       └── LineScanner over decoded file content
//!     │
//!     └── ScanStats (atomic counters)
//! ```
//!
//! # Cancellation
//!
//! [`Scanner::scan`] observes a [`CancellationToken`] during the walk,
//! before each file and after the pool drains. A cancelled scan returns
//! [`ScanError::Cancelled`], never a partial report.

#![deny(clippy::all)]
#![warn(missing_docs)]

mod analyzer;
mod error;
mod fileset;
mod lines;
mod pattern;
mod stats;
mod validate;

pub use analyzer::FileAnalyzer;
pub use error::ScanError;
pub use fileset::{check_pattern, FileSet, FileSetIter};
pub use lines::{open_decoded, LineMatch, LineScanner, TaskLines};
pub use pattern::{CompileError, CompiledMatcher, CompiledTags, PatternCompiler};
pub use stats::{ScanStats, StatsSnapshot};
pub use validate::validate;

use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use encoding_rs::Encoding;
use ot_core::{resolve_encoding, Report, ScanRequest, SkippedFile};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Runs one [`ScanRequest`] over a directory tree.
///
/// Everything that can be checked without reading files is checked by
/// [`Scanner::new`]: the request, every tier pattern, the encoding, the root
/// directory and the file-set globs.
///
/// # Cloning
///
/// `Scanner` is cheaply cloneable via internal `Arc` references. Clones
/// share the request, the compiled matchers and the statistics.
#[derive(Debug, Clone)]
pub struct Scanner {
    /// The immutable request.
    request: Arc<ScanRequest>,
    /// Compiled tier matchers (shared via Arc for cloning).
    tags: Arc<CompiledTags>,
    /// Files to scan.
    file_set: FileSet,
    /// Source encoding.
    encoding: &'static Encoding,
    /// Pool size; 0 means one thread per available core.
    threads: usize,
    /// Statistics counters (shared via Arc for cloning).
    stats: Arc<ScanStats>,
}

impl Scanner {
    /// Creates a scanner for `request` below `root`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Request`] if the request is invalid
    /// - [`ScanError::Compile`] listing every tier that failed to compile
    /// - [`ScanError::NoIdentifiers`] if no tier is configured
    /// - [`ScanError::Config`] if `root` is not an existing directory
    /// - [`ScanError::Pattern`] if a file-set glob is malformed
    pub fn new(request: ScanRequest, root: &Utf8Path) -> Result<Self, ScanError> {
        request.validate()?;

        let tags = PatternCompiler::compile(request.tags());
        tags.ensure_usable()?;

        let encoding = resolve_encoding(request.encoding())?;
        let file_set = FileSet::new(root, request.file_set())?;

        info!(
            root = %root,
            include = request.file_set().include(),
            exclude = request.file_set().exclude(),
            encoding = encoding.name(),
            "Creating scanner"
        );

        Ok(Self {
            request: Arc::new(request),
            tags: Arc::new(tags),
            file_set,
            encoding,
            threads: 0,
            stats: Arc::new(ScanStats::new()),
        })
    }

    /// Sets the size of the scanning pool.
    ///
    /// `0` (the default) uses one thread per available core.
    #[must_use]
    pub const fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    /// Configures whether version-control directories are skipped.
    #[must_use]
    pub fn with_default_excludes(mut self, enabled: bool) -> Self {
        self.file_set = self.file_set.with_default_excludes(enabled);
        self
    }

    /// Configures whether to follow symbolic links.
    #[must_use]
    pub fn with_follow_links(mut self, follow: bool) -> Self {
        self.file_set = self.file_set.with_follow_links(follow);
        self
    }

    /// Scans the file set and builds the report.
    ///
    /// This method:
    /// 1. Walks the root to collect the selected paths
    /// 2. Scans the files on a bounded rayon pool
    /// 3. Records unreadable files as skipped
    /// 4. Orders the results into a [`Report`]
    ///
    /// Entries below the root that cannot be visited, selected paths that are
    /// not UTF-8 and files that cannot be read or decoded are reported as
    /// skipped. The statistics of [`stats`](Self::stats) are shared with every
    /// clone and only describe progress; the report counts are computed per
    /// call.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Walk`] if the root itself cannot be walked
    /// - [`ScanError::ThreadPool`] if the pool cannot be started
    /// - [`ScanError::Cancelled`] if `cancel` fired before the report was built
    pub fn scan(&self, cancel: &CancellationToken) -> Result<Report, ScanError> {
        info!(root = %self.file_set.root(), "Starting scan");
        self.stats.reset();

        let mut paths = Vec::new();
        let mut skipped = Vec::new();

        for entry in self.file_set.iter() {
            if cancel.is_cancelled() {
                info!("Scan cancelled during file discovery");
                return Err(ScanError::Cancelled);
            }

            match entry {
                Ok(path) => paths.push(path),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    let entry = self.skipped_entry(e);
                    warn!(path = %entry.path, reason = %entry.reason, "Skipping entry");
                    self.stats.increment_skipped();
                    skipped.push(entry);
                }
            }
        }

        self.stats.add_discovered((paths.len() + skipped.len()) as u64);
        debug!(count = paths.len(), "Collected files");

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .thread_name(|index| format!("open-tasks-scan-{index}"))
            .build()?;

        let analyzer = FileAnalyzer::new(self.file_set.root(), &self.tags, self.encoding);
        let (tasks, mut failed) = pool.install(|| analyzer.analyze_files(&paths, cancel, &self.stats));

        if cancel.is_cancelled() {
            info!("Scan cancelled");
            return Err(ScanError::Cancelled);
        }

        let files_scanned = (paths.len() - failed.len()) as u64;
        skipped.append(&mut failed);
        let report = Report::new(tasks, skipped, files_scanned);

        let summary = report.summary();
        info!(
            files = summary.files_scanned,
            skipped = summary.files_skipped,
            high = summary.high,
            normal = summary.normal,
            low = summary.low,
            "Scan completed"
        );

        Ok(report)
    }

    /// Returns a snapshot of current statistics.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Returns the request this scanner runs.
    #[must_use]
    pub fn request(&self) -> &ScanRequest {
        &self.request
    }

    /// Returns the compiled matchers.
    #[must_use]
    pub fn tags(&self) -> &CompiledTags {
        &self.tags
    }

    /// Returns the directory being scanned.
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        self.file_set.root()
    }

    /// Turns a recoverable walk error into a skipped entry.
    fn skipped_entry(&self, error: ScanError) -> SkippedFile {
        match error {
            ScanError::NonUtf8Path(path) => {
                SkippedFile::new(self.lossy_relative(&path), "path is not valid UTF-8")
            }
            ScanError::Unreadable { path, source } => {
                let reason = match source.io_error() {
                    Some(io) => format!("cannot be visited: {io}"),
                    None => format!("cannot be visited: {source}"),
                };
                SkippedFile::new(path, reason)
            }
            other => SkippedFile::new(other.path().cloned().unwrap_or_default(), other.to_string()),
        }
    }

    fn lossy_relative(&self, path: &std::path::Path) -> Utf8PathBuf {
        let relative = path
            .strip_prefix(self.file_set.root().as_std_path())
            .unwrap_or(path);
        Utf8PathBuf::from(relative.to_string_lossy().replace('\\', "/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ot_core::{FileSetSpec, PatternMode, Priority, TagConfig, TaskRecord};
    use std::fs;
    use tempfile::TempDir;

    fn request(include: &str, exclude: &str) -> ScanRequest {
        ScanRequest::builder()
            .tags(TagConfig::builder().high("FIXME").normal("TODO").low("@deprecated").build())
            .file_set(FileSetSpec::new(include, exclude))
            .build()
            .unwrap()
    }

    fn tree(files: &[(&str, &str)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let path = dir.path().join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        dir
    }

    fn root(dir: &TempDir) -> &Utf8Path {
        Utf8Path::from_path(dir.path()).unwrap()
    }

    #[test]
    fn test_scanner_invalid_root() {
        let result = Scanner::new(request("", ""), Utf8Path::new("/nonexistent/path/that/does/not/exist"));
        assert!(matches!(result, Err(ScanError::Config(_))));
    }

    #[test]
    fn test_scanner_reports_compile_errors_before_io() {
        let request = ScanRequest::builder()
            .tags(
                TagConfig::builder()
                    .high("[")
                    .normal("TODO")
                    .pattern_mode(PatternMode::Regex)
                    .build(),
            )
            .build()
            .unwrap();
        // The root does not exist: compile errors must win.
        let result = Scanner::new(request, Utf8Path::new("/nonexistent"));
        assert!(matches!(result, Err(ScanError::Compile(errors)) if errors[0].priority == Priority::High));
    }

    #[test]
    fn test_scan_orders_by_path_then_line() {
        let dir = tree(&[
            ("z.txt", "TODO z1\nplain\nFIXME z3\n"),
            ("a.txt", "x\n@deprecated old\n"),
            ("sub/m.txt", "TODO m\n"),
        ]);
        let report = Scanner::new(request("", ""), root(&dir))
            .unwrap()
            .scan(&CancellationToken::new())
            .unwrap();

        assert_eq!(
            report.tasks(),
            &[
                TaskRecord::new("a.txt", 2, Priority::Low, "@deprecated", "old"),
                TaskRecord::new("sub/m.txt", 1, Priority::Normal, "TODO", "m"),
                TaskRecord::new("z.txt", 1, Priority::Normal, "TODO", "z1"),
                TaskRecord::new("z.txt", 3, Priority::High, "FIXME", "z3"),
            ]
        );
        assert_eq!(report.summary().files_scanned, 3);
        assert_eq!(report.summary().high, 1);
        assert_eq!(report.summary().normal, 2);
        assert_eq!(report.summary().low, 1);
    }

    #[test]
    fn test_scan_is_independent_of_pool_size() {
        let files: Vec<(String, String)> = (0..40)
            .map(|i| (format!("f{i:02}.rs"), format!("// TODO {i}\nfn x() {{}} // FIXME {i}\n")))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
        let dir = tree(&borrowed);

        let scan = |threads| {
            Scanner::new(request("**/*.rs", ""), root(&dir))
                .unwrap()
                .with_threads(threads)
                .scan(&CancellationToken::new())
                .unwrap()
        };

        let single = scan(1);
        assert_eq!(single.len(), 80);
        assert_eq!(single, scan(4));
    }

    #[test]
    fn test_scan_applies_file_set() {
        let dir = tree(&[
            ("A.java", "// TODO a"),
            ("TestA.java", "// TODO test"),
            ("B.txt", "TODO b"),
        ]);
        let report = Scanner::new(request("**/*.java", "**/Test*.java"), root(&dir))
            .unwrap()
            .scan(&CancellationToken::new())
            .unwrap();

        let paths: Vec<_> = report.tasks().iter().map(|t| t.path.as_str()).collect();
        assert_eq!(paths, vec!["A.java"]);
    }

    #[test]
    fn test_scan_skips_undecodable_file() {
        let dir = tree(&[("ok.rs", "// TODO fine\n")]);
        fs::write(dir.path().join("bad.rs"), b"// TODO \xc3\x28\n").unwrap();

        let scanner = Scanner::new(request("", ""), root(&dir)).unwrap();
        let report = scanner.scan(&CancellationToken::new()).unwrap();

        assert_eq!(report.len(), 1);
        assert_eq!(report.skipped().len(), 1);
        assert_eq!(report.skipped()[0].path, "bad.rs");
        assert_eq!(report.summary().files_skipped, 1);

        let stats = scanner.stats();
        assert_eq!(stats.discovered, 2);
        assert_eq!(stats.pending(), 0);
    }

    #[test]
    fn test_scan_with_latin1_encoding() {
        let dir = tree(&[]);
        fs::write(dir.path().join("legacy.txt"), b"TODO: r\xe9sum\xe9\n").unwrap();

        let request = ScanRequest::builder()
            .tags(TagConfig::builder().normal("TODO").build())
            .encoding("ISO-8859-1")
            .build()
            .unwrap();
        let report = Scanner::new(request, root(&dir))
            .unwrap()
            .scan(&CancellationToken::new())
            .unwrap();

        assert_eq!(report.tasks()[0].message, "résumé");
    }

    #[test]
    fn test_scan_cancelled_returns_no_report() {
        let dir = tree(&[("a.rs", "// TODO\n")]);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = Scanner::new(request("", ""), root(&dir)).unwrap().scan(&cancel);
        assert!(matches!(result, Err(ScanError::Cancelled)));
    }

    #[test]
    fn test_scanner_clone_shares_stats() {
        let dir = tree(&[("a.rs", "// TODO\n")]);
        let scanner = Scanner::new(request("", ""), root(&dir)).unwrap();
        let clone = scanner.clone();

        scanner.scan(&CancellationToken::new()).unwrap();
        assert_eq!(clone.stats().scanned, 1);
        assert_eq!(clone.request().encoding(), "UTF-8");
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_ignores_unselected_non_utf8_name() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let dir = tree(&[("A.java", "// TODO a\n")]);
        fs::write(dir.path().join(OsStr::from_bytes(b"\xffblob.bin")), b"TODO").unwrap();

        let report = Scanner::new(request("**/*.java", ""), root(&dir))
            .unwrap()
            .scan(&CancellationToken::new())
            .unwrap();

        assert_eq!(report.len(), 1);
        assert!(report.skipped().is_empty());
        assert_eq!(report.summary().files_skipped, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_survives_dangling_symlink() {
        let dir = tree(&[("a.rs", "// TODO keep going\n")]);
        std::os::unix::fs::symlink(dir.path().join("gone.rs"), dir.path().join("broken.rs")).unwrap();

        let report = Scanner::new(request("", ""), root(&dir))
            .unwrap()
            .with_follow_links(true)
            .scan(&CancellationToken::new())
            .unwrap();

        assert_eq!(
            report.tasks(),
            &[TaskRecord::new("a.rs", 1, Priority::Normal, "TODO", "keep going")]
        );
        assert_eq!(report.skipped().len(), 1);
        assert_eq!(report.skipped()[0].path, "broken.rs");
        assert!(report.skipped()[0].reason.starts_with("cannot be visited"));
        assert_eq!(report.summary().files_scanned, 1);
        assert_eq!(report.summary().files_skipped, 1);
    }

    #[test]
    fn test_concurrent_scans_report_own_counts() {
        let files: Vec<(String, String)> = (0..150)
            .map(|i| (format!("d{}/f{i:03}.rs", i % 5), format!("// TODO {i}\n")))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
        let dir = tree(&borrowed);
        let scanner = Scanner::new(request("", ""), root(&dir)).unwrap().with_threads(2);

        std::thread::scope(|s| {
            for _ in 0..3 {
                let scanner = scanner.clone();
                s.spawn(move || {
                    for _ in 0..5 {
                        let report = scanner.scan(&CancellationToken::new()).unwrap();
                        assert_eq!(report.summary().files_scanned, 150);
                        assert_eq!(report.summary().files_skipped, 0);
                        assert_eq!(report.len(), 150);
                    }
                });
            }
        });
    }

    #[test]
    fn test_scan_cancelled_mid_flight() {
        let files: Vec<(String, String)> = (0..3000)
            .map(|i| (format!("d{}/f{i:04}.rs", i % 20), format!("// TODO {i}\n").repeat(20)))
            .collect();
        let borrowed: Vec<(&str, &str)> = files.iter().map(|(n, c)| (n.as_str(), c.as_str())).collect();
        let dir = tree(&borrowed);
        let scanner = Scanner::new(request("", ""), root(&dir)).unwrap().with_threads(1);
        let cancel = CancellationToken::new();

        let result = std::thread::scope(|s| {
            let watcher = scanner.clone();
            let trigger = cancel.clone();
            s.spawn(move || {
                // Fire once analysis is under way.
                while watcher.stats().scanned == 0 && !trigger.is_cancelled() {
                    std::thread::yield_now();
                }
                trigger.cancel();
            });
            let result = scanner.scan(&cancel);
            cancel.cancel();
            result
        });

        assert!(matches!(result, Err(ScanError::Cancelled)));
        assert!(scanner.stats().scanned < 3000);
    }
}
