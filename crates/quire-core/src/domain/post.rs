use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::input::PostInput;
use super::publication::PublicationState;

/// Maximum length of a post title, in characters.
pub const TITLE_MAX_CHARS: usize = 255;

/// Post entity - a blog post owned by the user who created it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub is_draft: bool,
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post for `user_id` from already validated input.
    ///
    /// The input is normalized first. An omitted draft flag defaults to `false`
    /// and an omitted publish timestamp to none.
    pub fn new(user_id: Uuid, input: PostInput, now: DateTime<Utc>) -> Self {
        let input = input.normalize();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: input.title,
            content: input.content,
            is_draft: input.is_draft.unwrap_or(false),
            published_at: input.published_at.flatten(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an edit. Fields the caller did not send keep their stored value.
    pub fn apply(&mut self, input: PostInput, now: DateTime<Utc>) {
        let input = input.normalize();
        self.title = input.title;
        self.content = input.content;
        if let Some(is_draft) = input.is_draft {
            self.is_draft = is_draft;
        }
        if let Some(published_at) = input.published_at {
            self.published_at = published_at;
        }
        self.updated_at = now;
    }

    pub fn state(&self, now: DateTime<Utc>) -> PublicationState {
        PublicationState::derive(self.is_draft, self.published_at, now)
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.user_id == user_id
    }
}
