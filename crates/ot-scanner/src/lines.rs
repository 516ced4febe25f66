//! Line-oriented task extraction.
//!
//! [`LineScanner`] applies compiled tier matchers to text, one line at a
//! time:
//!
//! 1. Tiers are tried from high to low; the first tier that matches wins and
//!    lower tiers are not evaluated for that line.
//! 2. Within the winning tier, the leftmost occurrence is used.
//! 3. The message is the rest of the line after the tag, trimmed, with one
//!    leading `:` removed.
//!
//! [`TaskLines`] drives the scanner over any [`BufRead`] lazily; reading
//! stops at end of stream or at the first I/O error, which is yielded.
//!
//! # Examples
//!
//! ```
//! use ot_core::{Priority, TagConfig};
//! use ot_scanner::{LineScanner, PatternCompiler};
//!
//! let tags = PatternCompiler::compile(&TagConfig::builder().high("FIXME").normal("TODO").build());
//! let scanner = LineScanner::new(&tags);
//!
//! let found = scanner.scan_line("// TODO: also FIXME").unwrap();
//! assert_eq!(found.priority, Priority::High);
//! assert_eq!(found.tag, "FIXME");
//! assert_eq!(found.message, "");
//! ```

use std::io::{BufRead, Cursor};

use camino::{Utf8Path, Utf8PathBuf};
use encoding_rs::Encoding;
use ot_core::{Priority, TaskRecord};

use crate::error::ScanError;
use crate::pattern::CompiledTags;

/// The task found on a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineMatch {
    /// Tier that matched.
    pub priority: Priority,
    /// Matched tag text.
    pub tag: String,
    /// Text following the tag.
    pub message: String,
}

/// Applies compiled matchers to lines of text.
#[derive(Debug, Clone, Copy)]
pub struct LineScanner<'a> {
    tags: &'a CompiledTags,
}

impl<'a> LineScanner<'a> {
    /// Creates a scanner over compiled matchers.
    #[inline]
    #[must_use]
    pub const fn new(tags: &'a CompiledTags) -> Self {
        Self { tags }
    }

    /// Returns the matchers this scanner uses.
    #[inline]
    #[must_use]
    pub const fn tags(&self) -> &'a CompiledTags {
        self.tags
    }

    /// Scans one line (without its terminator).
    #[must_use]
    pub fn scan_line(&self, line: &str) -> Option<LineMatch> {
        self.tags.usable().find_map(|matcher| {
            matcher.find(line).map(|found| LineMatch {
                priority: matcher.priority(),
                tag: found.as_str().to_owned(),
                message: extract_message(&line[found.end()..]).to_owned(),
            })
        })
    }

    /// Returns a lazy iterator over the tasks of `reader`.
    ///
    /// `path` is copied into every produced [`TaskRecord`].
    pub fn tasks<R: BufRead>(&self, path: impl Into<Utf8PathBuf>, reader: R) -> TaskLines<'a, R> {
        TaskLines {
            scanner: *self,
            reader,
            path: path.into(),
            line: 0,
            buf: String::new(),
            done: false,
        }
    }
}

/// Lazy sequence of the tasks in one stream.
///
/// Finite; yields at most one error, after which it is exhausted. It cannot
/// be rewound: re-open the stream to scan again.
#[derive(Debug)]
pub struct TaskLines<'a, R> {
    scanner: LineScanner<'a>,
    reader: R,
    path: Utf8PathBuf,
    line: u32,
    buf: String,
    done: bool,
}

impl<R: BufRead> Iterator for TaskLines<'_, R> {
    type Item = Result<TaskRecord, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line = self.line.saturating_add(1);
                    let text = strip_line_ending(&self.buf);
                    if let Some(found) = self.scanner.scan_line(text) {
                        return Some(Ok(TaskRecord::new(
                            self.path.clone(),
                            self.line,
                            found.priority,
                            found.tag,
                            found.message,
                        )));
                    }
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(ScanError::read(self.path.clone(), err)));
                }
            }
        }
        None
    }
}

/// Reads `path` and decodes it with `encoding`.
///
/// A byte order mark overrides the requested encoding.
///
/// # Errors
///
/// - [`ScanError::Read`] if the file cannot be read
/// - [`ScanError::Decode`] if the content is malformed for the encoding
pub fn open_decoded(path: &Utf8Path, encoding: &'static Encoding) -> Result<Cursor<String>, ScanError> {
    let bytes = std::fs::read(path.as_std_path()).map_err(|e| ScanError::read(path, e))?;
    let (text, used, had_errors) = encoding.decode(&bytes);
    if had_errors {
        return Err(ScanError::decode(path, used.name()));
    }
    Ok(Cursor::new(text.into_owned()))
}

fn strip_line_ending(line: &str) -> &str {
    let line = line.strip_suffix('\n').unwrap_or(line);
    line.strip_suffix('\r').unwrap_or(line)
}

fn extract_message(rest: &str) -> &str {
    let trimmed = rest.trim();
    trimmed.strip_prefix(':').map_or(trimmed, str::trim)
}
