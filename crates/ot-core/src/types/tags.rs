//! Tag identifier configuration.
//!
//! A [`TagConfig`] holds the raw identifiers of every priority tier together
//! with the matching options shared by all tiers. It is the input of the
//! pattern compiler and of sample validation.

use serde::{Deserialize, Serialize};

use super::priority::Priority;

/// Case handling for tag matching.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Identifiers match only with the exact casing.
    #[default]
    CaseSensitive,
    /// Identifiers match regardless of casing.
    IgnoreCase,
}

impl MatchMode {
    /// Maps an "ignore case" flag onto a [`MatchMode`].
    #[inline]
    #[must_use]
    pub const fn from_ignore_case(ignore_case: bool) -> Self {
        if ignore_case {
            Self::IgnoreCase
        } else {
            Self::CaseSensitive
        }
    }

    /// Returns `true` if casing is ignored.
    #[inline]
    #[must_use]
    pub const fn is_ignore_case(self) -> bool {
        matches!(self, Self::IgnoreCase)
    }
}

/// How the tier strings are interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternMode {
    /// The tier string is a comma/space separated list of literal identifiers.
    #[default]
    Literal,
    /// The tier string is a single regular expression.
    Regex,
}

impl PatternMode {
    /// Maps a "regular expression" flag onto a [`PatternMode`].
    #[inline]
    #[must_use]
    pub const fn from_regex_flag(regex: bool) -> Self {
        if regex { Self::Regex } else { Self::Literal }
    }
}

/// Tag identifiers per tier plus the shared matching options.
///
/// Built in one step through [`TagConfig::builder`]; there are no setters.
/// A blank tier string means the tier is unused.
///
/// # Examples
///
/// ```
/// use ot_core::{MatchMode, Priority, TagConfig};
///
/// let tags = TagConfig::builder()
///     .high("FIXME")
///     .normal("TODO, XXX")
///     .match_mode(MatchMode::IgnoreCase)
///     .build();
///
/// assert_eq!(tags.tier(Priority::Normal), "TODO, XXX");
/// assert!(tags.tier(Priority::Low).is_empty());
/// assert!(tags.has_identifiers());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TagConfig {
    high: String,
    normal: String,
    low: String,
    match_mode: MatchMode,
    pattern_mode: PatternMode,
}

impl TagConfig {
    /// Starts building a new tag configuration.
    #[inline]
    #[must_use]
    pub fn builder() -> TagConfigBuilder {
        TagConfigBuilder::default()
    }

    /// Returns the raw identifier string of a tier.
    #[must_use]
    pub fn tier(&self, priority: Priority) -> &str {
        match priority {
            Priority::High => &self.high,
            Priority::Normal => &self.normal,
            Priority::Low => &self.low,
        }
    }

    /// Returns the case handling shared by all tiers.
    #[inline]
    #[must_use]
    pub const fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Returns how tier strings are interpreted.
    #[inline]
    #[must_use]
    pub const fn pattern_mode(&self) -> PatternMode {
        self.pattern_mode
    }

    /// Returns `true` if at least one tier has a non-blank identifier string.
    #[must_use]
    pub fn has_identifiers(&self) -> bool {
        Priority::ALL
            .iter()
            .any(|&priority| !self.tier(priority).trim().is_empty())
    }
}

/// Builder for [`TagConfig`].
#[derive(Debug, Clone, Default)]
pub struct TagConfigBuilder {
    inner: TagConfig,
}

impl TagConfigBuilder {
    /// Sets the identifiers of the high tier.
    #[must_use]
    pub fn high(mut self, tags: impl Into<String>) -> Self {
        self.inner.high = tags.into();
        self
    }

    /// Sets the identifiers of the normal tier.
    #[must_use]
    pub fn normal(mut self, tags: impl Into<String>) -> Self {
        self.inner.normal = tags.into();
        self
    }

    /// Sets the identifiers of the low tier.
    #[must_use]
    pub fn low(mut self, tags: impl Into<String>) -> Self {
        self.inner.low = tags.into();
        self
    }

    /// Sets the identifiers of the given tier.
    #[must_use]
    pub fn tier(self, priority: Priority, tags: impl Into<String>) -> Self {
        match priority {
            Priority::High => self.high(tags),
            Priority::Normal => self.normal(tags),
            Priority::Low => self.low(tags),
        }
    }

    /// Sets the case handling.
    #[must_use]
    pub const fn match_mode(mut self, mode: MatchMode) -> Self {
        self.inner.match_mode = mode;
        self
    }

    /// Sets how tier strings are interpreted.
    #[must_use]
    pub const fn pattern_mode(mut self, mode: PatternMode) -> Self {
        self.inner.pattern_mode = mode;
        self
    }

    /// Finishes the configuration.
    #[must_use]
    pub fn build(self) -> TagConfig {
        self.inner
    }
}
