//! Resolution of include/exclude file-set patterns.
//!
//! [`FileSet`] walks a root directory with the `ignore` crate and yields the
//! root-relative paths of every regular file selected by a
//! [`FileSetSpec`].
//!
//! # Pattern syntax
//!
//! - Several globs may be given in one string, separated by commas
//! - `*` and `?` never cross a `/`; `**` spans any number of directories
//! - `**/name` also matches `name` directly under the root
//! - A pattern ending in `/` selects everything below that directory
//! - `\` is accepted as a separator and treated like `/`
//!
//! A blank include selects every file; a blank exclude rejects nothing. A
//! path matched by both is excluded.
//!
//! # Examples
//!
//! ```no_run
//! use camino::Utf8Path;
//! use ot_core::FileSetSpec;
//! use ot_scanner::FileSet;
//!
//! let spec = FileSetSpec::new("**/*.java", "**/Test*.java");
//! let files = FileSet::new(Utf8Path::new("./src"), &spec)?;
//!
//! for path in files.collect_paths()? {
//!     println!("{path}");
//! }
//! # Ok::<(), ot_scanner::ScanError>(())
//! ```

use std::path::Path;

use camino::{Utf8Path, Utf8PathBuf};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;
use ot_core::FileSetSpec;

use crate::error::ScanError;

/// Version-control metadata directories skipped unless disabled.
const DEFAULT_EXCLUDED_DIRS: &[&str] = &[".git", ".svn", ".hg", "CVS", "_darcs", ".bzr"];

/// The set of files a scan reads.
///
/// Holds only compiled patterns and options, so every call to
/// [`iter`](Self::iter) starts a fresh walk of the same tree.
#[derive(Debug, Clone)]
pub struct FileSet {
    /// Directory the walk starts from.
    root: Utf8PathBuf,
    /// `None` selects every file.
    include: Option<GlobSet>,
    /// `None` rejects nothing.
    exclude: Option<GlobSet>,
    /// Whether version-control directories are pruned.
    default_excludes: bool,
    /// Whether symbolic links are followed.
    follow_links: bool,
}

impl FileSet {
    /// Compiles `spec` against the directory `root`.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Config`] if `root` does not exist or is not a directory
    /// - [`ScanError::Pattern`] if a glob is malformed
    pub fn new(root: &Utf8Path, spec: &FileSetSpec) -> Result<Self, ScanError> {
        if !root.exists() {
            return Err(ScanError::config(format!(
                "root path does not exist: {root}"
            )));
        }
        if !root.is_dir() {
            return Err(ScanError::config(format!(
                "root path is not a directory: {root}"
            )));
        }

        Ok(Self {
            root: root.to_owned(),
            include: build_glob_set(spec.include())?,
            exclude: build_glob_set(spec.exclude())?,
            default_excludes: true,
            follow_links: false,
        })
    }

    /// Configures whether version-control directories are skipped.
    ///
    /// Enabled by default.
    #[must_use]
    pub const fn with_default_excludes(mut self, enabled: bool) -> Self {
        self.default_excludes = enabled;
        self
    }

    /// Configures whether to follow symbolic links.
    ///
    /// By default, symbolic links are not followed.
    #[must_use]
    pub const fn with_follow_links(mut self, follow: bool) -> Self {
        self.follow_links = follow;
        self
    }

    /// Returns the root directory being walked.
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    /// Returns `true` if a root-relative path (with `/` separators) is selected.
    #[must_use]
    pub fn matches(&self, relative: &str) -> bool {
        let included = self
            .include
            .as_ref()
            .is_none_or(|globs| globs.is_match(relative));
        let excluded = self
            .exclude
            .as_ref()
            .is_some_and(|globs| globs.is_match(relative));
        included && !excluded
    }

    /// Starts a lazy walk over the selected files.
    ///
    /// Paths are relative to the root and visited in file-name order.
    pub fn iter(&self) -> FileSetIter<'_> {
        let skip_vcs = self.default_excludes;
        let walk = WalkBuilder::new(&self.root)
            // Plain Ant-style selection: no ignore files, hidden files included
            .standard_filters(false)
            .follow_links(self.follow_links)
            .sort_by_file_name(|a, b| a.cmp(b))
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().is_some_and(|ft| ft.is_dir());
                !(skip_vcs
                    && is_dir
                    && entry.depth() > 0
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| DEFAULT_EXCLUDED_DIRS.contains(&name)))
            })
            .build();

        FileSetIter { set: self, walk }
    }

    /// Collects every selected path, sorted.
    ///
    /// # Errors
    ///
    /// Returns the first error of the walk.
    pub fn collect_paths(&self) -> Result<Vec<Utf8PathBuf>, ScanError> {
        let mut paths = self.iter().collect::<Result<Vec<_>, _>>()?;
        paths.sort();
        Ok(paths)
    }
}

/// Lazy walk over the files of a [`FileSet`].
///
/// Yields root-relative paths of selected files. Entries below the root
/// that cannot be read are [`ScanError::Unreadable`]; a selected path that
/// is not UTF-8 is a [`ScanError::NonUtf8Path`] carrying the absolute path.
/// Both are recoverable. Only a failure at the root itself is a
/// [`ScanError::Walk`].
pub struct FileSetIter<'a> {
    set: &'a FileSet,
    walk: ignore::Walk,
}

impl std::fmt::Debug for FileSetIter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileSetIter")
            .field("root", &self.set.root)
            .finish_non_exhaustive()
    }
}

impl Iterator for FileSetIter<'_> {
    type Item = Result<Utf8PathBuf, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let entry = match self.walk.next()? {
                Ok(entry) => entry,
                Err(err) => match self.unreadable_entry(err) {
                    Ok(Some(error)) => return Some(Err(error)),
                    Ok(None) => continue,
                    Err(fatal) => return Some(Err(fatal)),
                },
            };

            if !entry.file_type().is_some_and(|ft| ft.is_file()) {
                continue;
            }

            let Ok(relative) = entry.path().strip_prefix(self.set.root.as_std_path()) else {
                continue;
            };
            let Some(relative) = Utf8Path::from_path(relative) else {
                if self.set.matches(lossy_slash_path(relative).as_str()) {
                    return Some(Err(ScanError::NonUtf8Path(entry.path().to_owned())));
                }
                continue;
            };

            let relative = to_slash_path(relative);
            if self.set.matches(relative.as_str()) {
                return Some(Ok(relative));
            }
        }
    }
}

impl FileSetIter<'_> {
    /// Classifies a walk error.
    ///
    /// An entry below the root becomes [`ScanError::Unreadable`] when it is a
    /// directory or a selected file, and is dropped otherwise. Anything else
    /// is a fatal [`ScanError::Walk`].
    fn unreadable_entry(&self, error: ignore::Error) -> Result<Option<ScanError>, ScanError> {
        let Some(path) = error_path(&error).map(Path::to_path_buf) else {
            return Err(ScanError::Walk(error));
        };
        let Ok(relative) = path.strip_prefix(self.set.root.as_std_path()) else {
            return Err(ScanError::Walk(error));
        };
        if relative.as_os_str().is_empty() {
            return Err(ScanError::Walk(error));
        }

        let relative = lossy_slash_path(relative);
        if path.is_dir() || self.set.matches(relative.as_str()) {
            Ok(Some(ScanError::unreadable(relative, error)))
        } else {
            Ok(None)
        }
    }
}

/// Returns the entry a walk error is about, if it names one.
fn error_path(error: &ignore::Error) -> Option<&Path> {
    match error {
        ignore::Error::WithPath { path, .. } => Some(path.as_path()),
        ignore::Error::Loop { child, .. } => Some(child.as_path()),
        ignore::Error::WithDepth { err, .. } | ignore::Error::WithLineNumber { err, .. } => error_path(err),
        ignore::Error::Partial(errors) => errors.iter().find_map(error_path),
        _ => None,
    }
}

/// Checks the form of a file-set pattern without touching the disk.
///
/// # Errors
///
/// Returns [`ScanError::Pattern`] for the first malformed glob.
///
/// # Examples
///
/// ```
/// use ot_scanner::check_pattern;
///
/// assert!(check_pattern("**/*.rs, docs/").is_ok());
/// assert!(check_pattern("src/[a-").is_err());
/// ```
pub fn check_pattern(pattern: &str) -> Result<(), ScanError> {
    build_glob_set(pattern).map(|_| ())
}

/// Compiles a comma-separated glob list; `None` when the list is blank.
fn build_glob_set(raw: &str) -> Result<Option<GlobSet>, ScanError> {
    let mut builder = GlobSetBuilder::new();
    let mut any = false;

    for pattern in split_patterns(raw) {
        let glob = GlobBuilder::new(&pattern)
            .literal_separator(true)
            .build()
            .map_err(|e| ScanError::pattern(pattern.as_str(), e))?;
        builder.add(glob);
        any = true;
    }

    if !any {
        return Ok(None);
    }
    builder
        .build()
        .map(Some)
        .map_err(|e| ScanError::pattern(raw, e))
}

fn split_patterns(raw: &str) -> impl Iterator<Item = String> + '_ {
    raw.split(',')
        .map(str::trim)
        .filter(|pattern| !pattern.is_empty())
        .map(|pattern| {
            let mut pattern = pattern.replace('\\', "/");
            if pattern.ends_with('/') {
                pattern.push_str("**");
            }
            pattern
        })
}

/// Converts a relative path that may not be UTF-8, with `/` separators.
fn lossy_slash_path(path: &Path) -> Utf8PathBuf {
    let joined = path
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/");
    Utf8PathBuf::from(joined)
}

/// Rebuilds a relative path with `/` separators on every platform.
fn to_slash_path(path: &Utf8Path) -> Utf8PathBuf {
    let joined = path
        .components()
        .map(|c| c.as_str())
        .collect::<Vec<_>>()
        .join("/");
    Utf8PathBuf::from(joined)
}
