//! Access control for posts.
//!
//! A single [`AccessPolicy`] is built at startup with the deployment's
//! [`ViewMode`]. Mutations are always owner-only; the mode only changes who
//! may read a post.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::actor::Actor;
use super::post::Post;
use super::publication::PublicationState;

/// Who may read a post.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    /// Published posts are readable by anyone. Everything else is hidden as
    /// if it did not exist.
    #[default]
    Public,
    /// Every post is readable by its owner only, whatever its state.
    Private,
}

impl ViewMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
        }
    }
}

impl std::str::FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "private" => Ok(Self::Private),
            other => Err(format!("unknown view mode '{other}', expected 'public' or 'private'")),
        }
    }
}

/// An action an actor attempts.
#[derive(Debug, Clone, Copy)]
pub enum Action<'a> {
    View(&'a Post),
    Create,
    Update(&'a Post),
    Delete(&'a Post),
}

impl Action<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            Action::View(_) => "view",
            Action::Create => "create",
            Action::Update(_) => "update",
            Action::Delete(_) => "delete",
        }
    }

    /// The post acted on; `None` for `Create`.
    pub fn post_id(&self) -> Option<Uuid> {
        match self {
            Action::View(post) | Action::Update(post) | Action::Delete(post) => Some(post.id),
            Action::Create => None,
        }
    }
}

/// Why an action was denied. Determines how the denial is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    /// No actor, and the action needs one.
    Unauthenticated,
    /// The actor is known but lacks permission.
    Forbidden,
    /// The post with this id must look absent to this actor.
    NotFound(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(Denial),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AccessPolicy {
    mode: ViewMode,
}

impl AccessPolicy {
    pub fn new(mode: ViewMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn check(&self, actor: Option<&Actor>, action: Action<'_>, now: DateTime<Utc>) -> Decision {
        match action {
            Action::Create => match actor {
                Some(_) => Decision::Allow,
                None => Decision::Deny(Denial::Unauthenticated),
            },
            Action::View(post) => self.check_view(actor, post, now),
            Action::Update(post) | Action::Delete(post) => owner_only(actor, post),
        }
    }

    fn check_view(&self, actor: Option<&Actor>, post: &Post, now: DateTime<Utc>) -> Decision {
        match self.mode {
            ViewMode::Public => {
                if post.state(now) == PublicationState::Published {
                    Decision::Allow
                } else {
                    Decision::Deny(Denial::NotFound(post.id))
                }
            }
            ViewMode::Private => owner_only(actor, post),
        }
    }
}

fn owner_only(actor: Option<&Actor>, post: &Post) -> Decision {
    match actor {
        None => Decision::Deny(Denial::Unauthenticated),
        Some(actor) if post.is_owned_by(actor.id) => Decision::Allow,
        Some(_) => Decision::Deny(Denial::Forbidden),
    }
}
