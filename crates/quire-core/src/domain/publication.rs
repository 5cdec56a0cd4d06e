//! Publication state of a post, derived from `is_draft` and `published_at`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Derived publication state. Never persisted; recomputed against `now` on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PublicationState {
    /// Explicitly marked as a draft, whatever the publish timestamp says.
    Draft,
    /// Not a draft, with a publish timestamp strictly in the future.
    Scheduled,
    /// Not a draft, with a publish timestamp now or in the past.
    Published,
    /// Not a draft and no publish timestamp. Invisible to public listings.
    Unlisted,
}

impl PublicationState {
    /// Derive the state from the stored fields and a reference instant.
    pub fn derive(is_draft: bool, published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Self {
        if is_draft {
            return Self::Draft;
        }

        match published_at {
            Some(at) if at > now => Self::Scheduled,
            Some(_) => Self::Published,
            None => Self::Unlisted,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
            Self::Unlisted => "unlisted",
        }
    }

    /// The list filter this state belongs to, if any.
    pub fn filter(self) -> Option<PostFilter> {
        match self {
            Self::Draft => Some(PostFilter::Draft),
            Self::Scheduled => Some(PostFilter::Scheduled),
            Self::Published => Some(PostFilter::Published),
            Self::Unlisted => None,
        }
    }
}

/// One of the three disjoint list filters.
///
/// Storage adapters translate these into query predicates; `matches` is the
/// in-memory form and must agree with them:
///
/// - `Draft`: `is_draft = true`
/// - `Scheduled`: `is_draft = false AND published_at IS NOT NULL AND published_at > now`
/// - `Published`: `is_draft = false AND published_at IS NOT NULL AND published_at <= now`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostFilter {
    Draft,
    Scheduled,
    Published,
}

impl PostFilter {
    pub const ALL: [PostFilter; 3] = [Self::Draft, Self::Scheduled, Self::Published];

    pub fn matches(self, is_draft: bool, published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        match self {
            Self::Draft => is_draft,
            Self::Scheduled => !is_draft && published_at.is_some_and(|at| at > now),
            Self::Published => !is_draft && published_at.is_some_and(|at| at <= now),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Published => "published",
        }
    }
}

impl std::str::FromStr for PostFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "draft" | "drafts" => Ok(Self::Draft),
            "scheduled" => Ok(Self::Scheduled),
            "published" => Ok(Self::Published),
            other => Err(format!("unknown post status '{other}'")),
        }
    }
}
