//! Preview of a tag configuration against a sample text.
//!
//! [`validate`] compiles the tags and scans the sample in memory, without
//! any file or worker involvement, so a configuration can be checked while
//! it is being written.

use ot_core::{TagConfig, ValidationOutcome};

use crate::error::ScanError;
use crate::lines::LineScanner;
use crate::pattern::PatternCompiler;

/// Classifies what `tags` finds in `sample`.
///
/// - [`ValidationOutcome::CompileError`] if a tier does not compile or no
///   tier is configured; each message names its tier
/// - [`ValidationOutcome::NoMatch`] if no line holds a task, an empty
///   sample included
/// - [`ValidationOutcome::SingleMatch`] if exactly one line holds exactly one
///   occurrence of its winning tier
/// - [`ValidationOutcome::MultipleMatch`] otherwise, counting the winning
///   tier's occurrences over all matched lines
///
/// # Examples
///
/// ```
/// use ot_core::{TagConfig, ValidationOutcome};
/// use ot_scanner::validate;
///
/// let tags = TagConfig::builder().normal("TODO").build();
///
/// assert_eq!(validate("nothing here", &tags), ValidationOutcome::NoMatch);
/// assert_eq!(
///     validate("TODO: fix this", &tags),
///     ValidationOutcome::SingleMatch { tag: "TODO".to_owned(), message: "fix this".to_owned() },
/// );
/// assert_eq!(validate("TODO a TODO b", &tags), ValidationOutcome::MultipleMatch { count: 2 });
/// ```
#[must_use]
pub fn validate(sample: &str, tags: &TagConfig) -> ValidationOutcome {
    let compiled = PatternCompiler::compile(tags);
    if let Err(err) = compiled.ensure_usable() {
        let messages = match err {
            ScanError::Compile(errors) => errors.iter().map(ToString::to_string).collect(),
            other => vec![other.to_string()],
        };
        return ValidationOutcome::CompileError { messages };
    }

    let scanner = LineScanner::new(&compiled);
    let mut matched_lines = 0_usize;
    let mut occurrences = 0_usize;
    let mut first = None;

    for line in sample.lines() {
        let Some(found) = scanner.scan_line(line) else {
            continue;
        };
        matched_lines += 1;
        occurrences += compiled
            .get(found.priority)
            .map_or(1, |matcher| matcher.occurrences(line));
        first.get_or_insert(found);
    }

    match first {
        None => ValidationOutcome::NoMatch,
        Some(found) if matched_lines == 1 && occurrences == 1 => ValidationOutcome::SingleMatch {
            tag: found.tag,
            message: found.message,
        },
        Some(_) => ValidationOutcome::MultipleMatch { count: occurrences },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ot_core::{MatchMode, PatternMode};

    fn todo() -> TagConfig {
        TagConfig::builder().normal("TODO").build()
    }

    #[test]
    fn test_no_match() {
        assert_eq!(validate("done and dusted", &todo()), ValidationOutcome::NoMatch);
        assert_eq!(validate("", &todo()), ValidationOutcome::NoMatch);
    }

    #[test]
    fn test_single_match() {
        assert_eq!(
            validate("TODO: fix this", &todo()),
            ValidationOutcome::SingleMatch {
                tag: "TODO".to_owned(),
                message: "fix this".to_owned(),
            }
        );
    }

    #[test]
    fn test_multiple_on_one_line() {
        assert_eq!(
            validate("TODO a TODO b", &todo()),
            ValidationOutcome::MultipleMatch { count: 2 }
        );
    }

    #[test]
    fn test_multiple_across_lines() {
        assert_eq!(
            validate("TODO a\nnothing\r\nTODO b\nTODO c", &todo()),
            ValidationOutcome::MultipleMatch { count: 3 }
        );
    }

    #[test]
    fn test_higher_tier_occurrences_only() {
        let tags = TagConfig::builder().high("FIXME").normal("TODO").build();
        let outcome = validate("FIXME: crash TODO later TODO never", &tags);
        assert!(matches!(outcome, ValidationOutcome::SingleMatch { ref tag, .. } if tag == "FIXME"));
    }

    #[test]
    fn test_ignore_case_keeps_sample_text() {
        let tags = TagConfig::builder()
            .normal("todo")
            .match_mode(MatchMode::IgnoreCase)
            .build();
        assert_eq!(
            validate("ToDo tidy", &tags),
            ValidationOutcome::SingleMatch {
                tag: "ToDo".to_owned(),
                message: "tidy".to_owned(),
            }
        );
    }

    #[test]
    fn test_compile_error_names_tier() {
        let tags = TagConfig::builder()
            .high("FIXME")
            .normal("TODO(")
            .pattern_mode(PatternMode::Regex)
            .build();
        let outcome = validate("FIXME", &tags);
        assert!(outcome.is_error());
        assert!(matches!(
            &outcome,
            ValidationOutcome::CompileError { messages }
                if messages.len() == 1 && messages[0].starts_with("NORMAL: ")
        ));
    }

    #[test]
    fn test_no_identifiers() {
        let outcome = validate("TODO", &TagConfig::builder().build());
        assert_eq!(
            outcome,
            ValidationOutcome::CompileError {
                messages: vec!["no tag identifiers configured".to_owned()],
            }
        );
    }

    #[test]
    fn test_empty_sample_checks_tags_first() {
        let broken = TagConfig::builder()
            .normal("TODO(")
            .pattern_mode(PatternMode::Regex)
            .build();
        assert!(validate("", &broken).is_error());
        assert!(validate("", &TagConfig::builder().build()).is_error());

        let outcome = validate("", &todo());
        assert_eq!(outcome, ValidationOutcome::NoMatch);
        assert!(!outcome.is_error());
    }

    #[test]
    fn test_outcome_snapshot() {
        insta::assert_json_snapshot!(validate("TODO a TODO b", &todo()), @r#"
        {
          "outcome": "multiple_match",
          "count": 2
        }
        "#);
    }
}
