//! Result of validating a tag configuration against a sample.

use std::fmt;

use serde::{Deserialize, Serialize};

/// What a tag configuration finds in a sample text.
///
/// # Examples
///
/// ```
/// use ot_core::ValidationOutcome;
///
/// let outcome = ValidationOutcome::SingleMatch {
///     tag: "TODO".to_owned(),
///     message: "fix this".to_owned(),
/// };
/// assert!(outcome.is_ok());
/// assert_eq!(outcome.to_string(), "found one task: tag 'TODO', message 'fix this'");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ValidationOutcome {
    /// At least one tier could not be compiled; one message per problem.
    CompileError {
        /// Problems, each naming its tier.
        messages: Vec<String>,
    },
    /// The sample contains no task.
    NoMatch,
    /// The sample contains exactly one task.
    SingleMatch {
        /// Matched tag text.
        tag: String,
        /// Message following the tag.
        message: String,
    },
    /// The sample contains several tag occurrences.
    MultipleMatch {
        /// Number of occurrences.
        count: usize,
    },
}

impl ValidationOutcome {
    /// Returns `true` for a single, unambiguous match.
    #[inline]
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::SingleMatch { .. })
    }

    /// Returns `true` if the configuration did not compile.
    #[inline]
    #[must_use]
    pub const fn is_error(&self) -> bool {
        matches!(self, Self::CompileError { .. })
    }
}

impl fmt::Display for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CompileError { messages } => {
                write!(f, "invalid tag configuration: {}", messages.join("; "))
            }
            Self::NoMatch => f.write_str("no task found in the example"),
            Self::SingleMatch { tag, message } => {
                write!(f, "found one task: tag '{tag}', message '{message}'")
            }
            Self::MultipleMatch { count } => {
                write!(f, "found {count} tasks; the example should contain exactly one")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_classification() {
        assert!(ValidationOutcome::CompileError { messages: vec![] }.is_error());
        assert!(!ValidationOutcome::NoMatch.is_ok());
        assert!(!ValidationOutcome::MultipleMatch { count: 2 }.is_ok());
    }

    #[test]
    fn test_outcome_serialization() {
        insta::assert_snapshot!(
            serde_json::to_string(&ValidationOutcome::MultipleMatch { count: 2 }).unwrap(),
            @r#"{"outcome":"multiple_match","count":2}"#
        );
        insta::assert_snapshot!(
            serde_json::to_string(&ValidationOutcome::NoMatch).unwrap(),
            @r#"{"outcome":"no_match"}"#
        );
    }

    #[test]
    fn test_outcome_display() {
        let outcome = ValidationOutcome::CompileError {
            messages: vec!["NORMAL: unclosed group".to_owned()],
        };
        assert_eq!(
            outcome.to_string(),
            "invalid tag configuration: NORMAL: unclosed group"
        );
    }
}
