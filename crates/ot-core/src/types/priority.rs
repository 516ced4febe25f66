//! Priority tiers for open tasks.
//!
//! This module provides the [`Priority`] enum that classifies every task
//! found by the scanner into one of three fixed tiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The priority tier of an open task.
///
/// Tiers have a fixed ordering `High > Normal > Low`. When several tiers
/// match the same line, the highest one wins.
///
/// The serialized labels (`"HIGH"`, `"NORMAL"`, `"LOW"`) are part of the
/// report contract and must stay stable.
///
/// # Examples
///
/// ```
/// use ot_core::Priority;
///
/// assert!(Priority::High > Priority::Normal);
/// assert!(Priority::Normal > Priority::Low);
/// assert_eq!(Priority::ALL[0], Priority::High);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Priority {
    /// Tasks that must be addressed first (e.g. `FIXME`).
    High,
    /// Regular open tasks (e.g. `TODO`).
    Normal,
    /// Tasks of minor importance (e.g. `@deprecated`).
    Low,
}

impl Priority {
    /// All tiers in evaluation order, highest first.
    pub const ALL: [Self; 3] = [Self::High, Self::Normal, Self::Low];

    /// Returns the stable label of this tier.
    ///
    /// # Examples
    ///
    /// ```
    /// use ot_core::Priority;
    ///
    /// assert_eq!(Priority::Normal.label(), "NORMAL");
    /// ```
    #[inline]
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::High => "HIGH",
            Self::Normal => "NORMAL",
            Self::Low => "LOW",
        }
    }

    /// Numeric rank used for ordering; higher means more important.
    #[inline]
    const fn rank(self) -> u8 {
        match self {
            Self::High => 2,
            Self::Normal => 1,
            Self::Low => 0,
        }
    }
}

impl PartialOrd for Priority {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Priority {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_ordering() {
        assert!(Priority::High > Priority::Normal);
        assert!(Priority::Normal > Priority::Low);
        assert!(Priority::High > Priority::Low);

        let mut tiers = vec![Priority::Low, Priority::High, Priority::Normal];
        tiers.sort_by(|a, b| b.cmp(a));
        assert_eq!(tiers, Priority::ALL.to_vec());
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!(Priority::High.label(), "HIGH");
        assert_eq!(Priority::Normal.label(), "NORMAL");
        assert_eq!(Priority::Low.label(), "LOW");
        assert_eq!(Priority::Low.to_string(), "LOW");
    }

    #[test]
    fn test_priority_serialization() {
        insta::assert_snapshot!(
            serde_json::to_string(&Priority::ALL).unwrap(),
            @r#"["HIGH","NORMAL","LOW"]"#
        );

        let parsed: Priority = serde_json::from_str(r#""NORMAL""#).unwrap();
        assert_eq!(parsed, Priority::Normal);
    }
}
