//! Compilation of tag identifiers into per-tier matchers.
//!
//! [`PatternCompiler`] turns a [`TagConfig`] into [`CompiledTags`]: one
//! [`CompiledMatcher`] per non-blank tier, in evaluation order.
//!
//! # Literal mode
//!
//! The tier string is split on commas and whitespace. The identifiers are
//! escaped and joined into a single alternation, longest first, so that
//! `TODO2` wins over `TODO` at the same position. An identifier that starts
//! or ends with a word character gets a word boundary on that side: `TODO`
//! does not match inside `TODOS`, while `@deprecated` still matches.
//!
//! # Regex mode
//!
//! The tier string is compiled as-is. Case-insensitivity is a flag on the
//! whole matcher in both modes.
//!
//! # Errors
//!
//! Compilation never stops at the first problem: an invalid tier yields a
//! matcher in the invalid state and every other tier is still compiled.
//!
//! # Examples
//!
//! ```
//! use ot_core::{PatternMode, Priority, TagConfig};
//! use ot_scanner::PatternCompiler;
//!
//! let tags = TagConfig::builder()
//!     .high("FIXME")
//!     .normal("(unclosed")
//!     .low("NOTE")
//!     .pattern_mode(PatternMode::Regex)
//!     .build();
//!
//! let compiled = PatternCompiler::compile(&tags);
//! let errors = compiled.errors();
//! assert_eq!(errors.len(), 1);
//! assert_eq!(errors[0].priority, Priority::Normal);
//! assert!(compiled.get(Priority::High).is_some_and(|m| m.is_valid()));
//! ```

use std::fmt;

use ot_core::{PatternMode, Priority, TagConfig};
use regex::{Match, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::error::ScanError;

/// A tier whose identifiers could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CompileError {
    /// The offending tier.
    pub priority: Priority,
    /// Why compilation failed.
    pub message: String,
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.priority, self.message)
    }
}

#[derive(Debug, Clone)]
enum MatcherState {
    Ready(Regex),
    Invalid(String),
}

/// An immutable matcher for one tier.
///
/// Carries its compile error instead of failing, so callers can report
/// every broken tier at once.
#[derive(Debug, Clone)]
pub struct CompiledMatcher {
    priority: Priority,
    state: MatcherState,
}

impl CompiledMatcher {
    /// The tier this matcher belongs to.
    #[inline]
    #[must_use]
    pub const fn priority(&self) -> Priority {
        self.priority
    }

    /// Returns `true` if the matcher compiled.
    #[inline]
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self.state, MatcherState::Ready(_))
    }

    /// The compile error, if any.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match &self.state {
            MatcherState::Ready(_) => None,
            MatcherState::Invalid(message) => Some(message),
        }
    }

    /// Finds the leftmost non-empty occurrence in `line`.
    ///
    /// Always `None` for an invalid matcher.
    #[must_use]
    pub fn find<'h>(&self, line: &'h str) -> Option<Match<'h>> {
        match &self.state {
            MatcherState::Ready(regex) => regex.find_iter(line).find(|m| !m.is_empty()),
            MatcherState::Invalid(_) => None,
        }
    }

    /// Counts the non-overlapping, non-empty occurrences in `line`.
    #[must_use]
    pub fn occurrences(&self, line: &str) -> usize {
        match &self.state {
            MatcherState::Ready(regex) => regex.find_iter(line).filter(|m| !m.is_empty()).count(),
            MatcherState::Invalid(_) => 0,
        }
    }
}

/// The compiled matchers of a whole tag configuration.
///
/// Holds at most one matcher per tier, in evaluation order (high first).
/// Blank tiers have no matcher.
#[derive(Debug, Clone, Default)]
pub struct CompiledTags {
    matchers: SmallVec<[CompiledMatcher; 3]>,
}

impl CompiledTags {
    /// All matchers, valid or not, highest tier first.
    pub fn matchers(&self) -> impl Iterator<Item = &CompiledMatcher> {
        self.matchers.iter()
    }

    /// Valid matchers only, highest tier first.
    pub fn usable(&self) -> impl Iterator<Item = &CompiledMatcher> {
        self.matchers.iter().filter(|m| m.is_valid())
    }

    /// The matcher of a tier, if the tier is configured.
    #[must_use]
    pub fn get(&self, priority: Priority) -> Option<&CompiledMatcher> {
        self.matchers.iter().find(|m| m.priority == priority)
    }

    /// One entry per tier that failed to compile.
    #[must_use]
    pub fn errors(&self) -> Vec<CompileError> {
        self.matchers
            .iter()
            .filter_map(|m| {
                m.error().map(|message| CompileError {
                    priority: m.priority,
                    message: message.to_owned(),
                })
            })
            .collect()
    }

    /// Returns `true` if any tier failed to compile.
    #[must_use]
    pub fn is_invalid(&self) -> bool {
        self.matchers.iter().any(|m| !m.is_valid())
    }

    /// Returns `true` if no tier is configured.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.matchers.is_empty()
    }

    /// Checks that the matchers can drive a scan.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Compile`] listing every tier that failed
    /// - [`ScanError::NoIdentifiers`] if no tier has a valid matcher
    pub fn ensure_usable(&self) -> Result<(), ScanError> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(ScanError::Compile(errors));
        }
        if self.usable().next().is_none() {
            return Err(ScanError::NoIdentifiers);
        }
        Ok(())
    }
}

/// Builds [`CompiledTags`] from a [`TagConfig`].
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternCompiler;

impl PatternCompiler {
    /// Compiles every non-blank tier of `tags`.
    ///
    /// Never fails: problems are kept inside the returned matchers.
    #[must_use]
    pub fn compile(tags: &TagConfig) -> CompiledTags {
        let mut matchers = SmallVec::new();

        for priority in Priority::ALL {
            let Some(pattern) = tier_pattern(tags.tier(priority), tags.pattern_mode()) else {
                continue;
            };

            let state = match RegexBuilder::new(&pattern)
                .case_insensitive(tags.match_mode().is_ignore_case())
                .build()
            {
                Ok(regex) => MatcherState::Ready(regex),
                Err(err) => {
                    tracing::debug!(%priority, error = %err, "Tag pattern failed to compile");
                    MatcherState::Invalid(err.to_string())
                }
            };
            matchers.push(CompiledMatcher { priority, state });
        }

        CompiledTags { matchers }
    }
}

/// Builds the regex source of one tier; `None` for a blank tier.
fn tier_pattern(raw: &str, mode: PatternMode) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    match mode {
        PatternMode::Regex => Some(raw.to_owned()),
        PatternMode::Literal => literal_pattern(&split_identifiers(raw)),
    }
}

/// Splits a literal tier string on commas and whitespace, dropping duplicates.
fn split_identifiers(raw: &str) -> Vec<&str> {
    let mut identifiers: Vec<&str> = Vec::new();
    for identifier in raw.split(|c: char| c == ',' || c.is_whitespace()) {
        if !identifier.is_empty() && !identifiers.contains(&identifier) {
            identifiers.push(identifier);
        }
    }
    identifiers
}

fn literal_pattern(identifiers: &[&str]) -> Option<String> {
    if identifiers.is_empty() {
        return None;
    }

    let mut sorted = identifiers.to_vec();
    sorted.sort_by_key(|identifier| std::cmp::Reverse(identifier.len()));

    let alternatives: Vec<String> = sorted
        .into_iter()
        .map(|identifier| {
            let lead = identifier.chars().next().is_some_and(is_word_char);
            let trail = identifier.chars().next_back().is_some_and(is_word_char);
            format!(
                "{}{}{}",
                if lead { r"\b" } else { "" },
                regex::escape(identifier),
                if trail { r"\b" } else { "" },
            )
        })
        .collect();

    Some(format!("(?:{})", alternatives.join("|")))
}

#[inline]
fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
