//! Validated create/update input and draft-field normalization.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::post::TITLE_MAX_CHARS;
use crate::error::{DomainError, FieldError};

/// Naive formats accepted for `published_at`, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Fields of a create/update request before validation.
#[derive(Debug, Clone, Default)]
pub struct RawPostInput {
    pub title: Option<String>,
    pub content: Option<String>,
    pub is_draft: Option<bool>,
    pub published_at: Option<Option<String>>,
}

impl RawPostInput {
    /// Check the boundary constraints and collect every failing field.
    pub fn validate(self) -> Result<PostInput, DomainError> {
        let mut errors = Vec::new();

        let title = match self.title.as_deref().map(str::trim) {
            None | Some("") => {
                errors.push(FieldError::new("title", "The title field is required."));
                String::new()
            }
            Some(title) if title.chars().count() > TITLE_MAX_CHARS => {
                errors.push(FieldError::new(
                    "title",
                    format!("The title field must not be greater than {TITLE_MAX_CHARS} characters."),
                ));
                String::new()
            }
            Some(title) => title.to_string(),
        };

        let content = match self.content {
            Some(content) if !content.trim().is_empty() => content,
            _ => {
                errors.push(FieldError::new("content", "The content field is required."));
                String::new()
            }
        };

        let published_at = match self.published_at {
            None => None,
            Some(None) => Some(None),
            Some(Some(raw)) if raw.trim().is_empty() => Some(None),
            Some(Some(raw)) => match parse_timestamp(&raw) {
                Some(at) => Some(Some(at)),
                None => {
                    errors.push(FieldError::new(
                        "published_at",
                        "The published at field must be a valid date.",
                    ));
                    None
                }
            },
        };

        if !errors.is_empty() {
            return Err(DomainError::Validation(errors));
        }

        Ok(PostInput {
            title,
            content,
            is_draft: self.is_draft,
            published_at,
        })
    }
}

/// Parse an RFC 3339 timestamp, a naive date-time or a bare date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();

    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Input for creating or editing a post, after boundary validation.
///
/// `is_draft` is `None` when the caller did not send the flag.
/// `published_at` distinguishes three cases: `None` (not sent),
/// `Some(None)` (sent as null) and `Some(Some(at))`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostInput {
    pub title: String,
    pub content: String,
    pub is_draft: Option<bool>,
    pub published_at: Option<Option<DateTime<Utc>>>,
}

impl PostInput {
    /// Reconcile the draft flag with the publish timestamp.
    ///
    /// A draft never carries a timestamp, and a timestamp sent without a draft
    /// flag means the caller intends to publish. Idempotent.
    pub fn normalize(mut self) -> Self {
        if self.is_draft == Some(true) {
            self.published_at = Some(None);
        } else if self.is_draft.is_none() && matches!(self.published_at, Some(Some(_))) {
            self.is_draft = Some(false);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn all_inputs() -> Vec<PostInput> {
        let mut inputs = Vec::new();
        for is_draft in [None, Some(true), Some(false)] {
            for published_at in [None, Some(None), Some(Some(at()))] {
                inputs.push(PostInput {
                    title: "t".to_string(),
                    content: "c".to_string(),
                    is_draft,
                    published_at,
                });
            }
        }
        inputs
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for input in all_inputs() {
            let once = input.clone().normalize();
            assert_eq!(once.clone().normalize(), once, "input: {input:?}");
        }
    }

    #[test]
    fn test_draft_always_clears_timestamp() {
        for input in all_inputs().into_iter().filter(|i| i.is_draft == Some(true)) {
            let normalized = input.normalize();
            assert_eq!(normalized.published_at, Some(None));
        }
    }

    #[test]
    fn test_timestamp_without_flag_implies_publish() {
        let normalized = PostInput {
            title: "t".to_string(),
            content: "c".to_string(),
            is_draft: None,
            published_at: Some(Some(at())),
        }
        .normalize();

        assert_eq!(normalized.is_draft, Some(false));
        assert_eq!(normalized.published_at, Some(Some(at())));
    }

    fn raw(title: &str, content: &str) -> RawPostInput {
        RawPostInput {
            title: Some(title.to_string()),
            content: Some(content.to_string()),
            ..Default::default()
        }
    }

    fn failing_fields(result: Result<PostInput, DomainError>) -> Vec<&'static str> {
        match result {
            Err(DomainError::Validation(errors)) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_accepts_minimal_input() {
        let input = raw("  Hello  ", "World").validate().unwrap();

        assert_eq!(input.title, "Hello");
        assert_eq!(input.content, "World");
        assert_eq!(input.is_draft, None);
        assert_eq!(input.published_at, None);
    }

    #[test]
    fn test_validate_reports_every_missing_field() {
        let fields = failing_fields(RawPostInput::default().validate());
        assert_eq!(fields, vec!["title", "content"]);
    }

    #[test]
    fn test_validate_title_length_in_chars() {
        assert!(raw(&"é".repeat(255), "c").validate().is_ok());

        let fields = failing_fields(raw(&"a".repeat(256), "c").validate());
        assert_eq!(fields, vec!["title"]);
    }

    #[test]
    fn test_validate_rejects_bad_date() {
        let mut input = raw("t", "c");
        input.published_at = Some(Some("next tuesday".to_string()));

        assert_eq!(failing_fields(input.validate()), vec!["published_at"]);
    }

    #[test]
    fn test_validate_blank_date_is_null() {
        let mut input = raw("t", "c");
        input.published_at = Some(Some("   ".to_string()));

        assert_eq!(input.validate().unwrap().published_at, Some(None));
    }

    #[test]
    fn test_parse_timestamp_formats() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 14, 30, 0).unwrap();

        assert_eq!(parse_timestamp("2024-03-05T14:30:00Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T16:30:00+02:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30:00.000Z"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05 14:30:00"), Some(expected));
        assert_eq!(parse_timestamp("2024-03-05T14:30"), Some(expected));
        assert_eq!(
            parse_timestamp("2024-03-05"),
            Some(Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap())
        );
        assert_eq!(parse_timestamp("2024-13-05"), None);
    }

    #[test]
    fn test_explicit_false_keeps_timestamp_untouched() {
        let normalized = PostInput {
            title: "t".to_string(),
            content: "c".to_string(),
            is_draft: Some(false),
            published_at: None,
        }
        .normalize();

        assert_eq!(normalized.is_draft, Some(false));
        assert_eq!(normalized.published_at, None);
    }
}
