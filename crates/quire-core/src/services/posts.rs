//! Post use cases: every read and write goes through the access policy here.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    AccessPolicy, Action, Actor, Decision, Denial, Owner, Page, PageRequest, Post, PostFilter,
    PublicationState, RawPostInput, ViewMode,
};
use crate::error::{DomainError, RepoError};
use crate::ports::{Clock, PostOrder, PostQuery, PostRepository, UserRepository};

#[derive(Debug, Error)]
pub enum PostServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Repo(#[from] RepoError),
}

pub type PostServiceResult<T> = Result<T, PostServiceError>;

/// A post as handed to the presentation layer, with its state resolved
/// against the service clock.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub post: Post,
    pub state: PublicationState,
    pub owner: Option<Owner>,
}

#[derive(Clone)]
pub struct PostService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
    clock: Arc<dyn Clock>,
    policy: AccessPolicy,
    per_page: u64,
}

impl PostService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
        policy: AccessPolicy,
        per_page: u64,
    ) -> Self {
        Self {
            posts,
            users,
            clock,
            policy,
            per_page,
        }
    }

    pub fn mode(&self) -> ViewMode {
        self.policy.mode()
    }

    /// The main listing.
    ///
    /// Public mode lists published posts for anyone, newest publication first.
    /// Private mode lists the actor's own posts, newest first.
    pub async fn index(&self, actor: Option<&Actor>, page: u64) -> PostServiceResult<Page<PostView>> {
        let now = self.clock.now();
        let request = PageRequest::new(page, self.per_page);

        let query = match self.policy.mode() {
            ViewMode::Public => PostQuery::new(now, request)
                .filter(PostFilter::Published)
                .order(PostOrder::NewestPublished),
            ViewMode::Private => {
                let actor = actor.ok_or(DomainError::Unauthenticated)?;
                PostQuery::new(now, request)
                    .owned_by(actor.id)
                    .order(PostOrder::NewestCreated)
            }
        };

        let page = self.posts.list(query).await?;
        self.with_owners(page).await
    }

    /// The actor's own posts, optionally narrowed to one publication state.
    pub async fn list_mine(
        &self,
        actor: Option<&Actor>,
        filter: Option<PostFilter>,
        page: u64,
    ) -> PostServiceResult<Page<PostView>> {
        let actor = actor.ok_or(DomainError::Unauthenticated)?;
        let now = self.clock.now();

        let mut query = PostQuery::new(now, PageRequest::new(page, self.per_page))
            .owned_by(actor.id)
            .order(PostOrder::NewestCreated);
        query.filter = filter;

        let page = self.posts.list(query).await?;
        Ok(page.map(|post| PostView {
            state: post.state(now),
            post,
            owner: None,
        }))
    }

    pub async fn show(&self, actor: Option<&Actor>, id: Uuid) -> PostServiceResult<PostView> {
        let post = self.load(id).await?;
        let now = self.authorize(actor, Action::View(&post))?;
        self.view_with_owner(post, now).await
    }

    /// Load a post for its edit form. Only the owner may see it this way.
    pub async fn edit(&self, actor: Option<&Actor>, id: Uuid) -> PostServiceResult<PostView> {
        let post = self.load(id).await?;
        let now = self.authorize(actor, Action::Update(&post))?;
        self.view_with_owner(post, now).await
    }

    /// Create a post owned by `actor`. Only authenticated callers reach this.
    pub async fn create(&self, actor: &Actor, input: RawPostInput) -> PostServiceResult<PostView> {
        let now = self.authorize(Some(actor), Action::Create)?;
        let input = input.validate()?;

        let post = self.posts.save(Post::new(actor.id, input, now)).await?;
        tracing::info!(
            post_id = %post.id,
            user_id = %actor.id,
            state = post.state(now).as_str(),
            "Post created"
        );

        Ok(PostView {
            state: post.state(now),
            post,
            owner: None,
        })
    }

    pub async fn update(
        &self,
        actor: Option<&Actor>,
        id: Uuid,
        input: RawPostInput,
    ) -> PostServiceResult<PostView> {
        let mut post = self.load(id).await?;
        let now = self.authorize(actor, Action::Update(&post))?;
        let input = input.validate()?;

        post.apply(input, now);
        let post = self.posts.save(post).await?;
        tracing::info!(post_id = %post.id, state = post.state(now).as_str(), "Post updated");

        Ok(PostView {
            state: post.state(now),
            post,
            owner: None,
        })
    }

    pub async fn delete(&self, actor: Option<&Actor>, id: Uuid) -> PostServiceResult<()> {
        let post = self.load(id).await?;
        self.authorize(actor, Action::Delete(&post))?;

        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, "Post deleted");
        Ok(())
    }

    async fn load(&self, id: Uuid) -> PostServiceResult<Post> {
        tracing::debug!(post_id = %id, "Loading post");
        self.posts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::post_not_found(id).into())
    }

    /// Run the policy and return the instant it was evaluated at.
    fn authorize(
        &self,
        actor: Option<&Actor>,
        action: Action<'_>,
    ) -> Result<chrono::DateTime<chrono::Utc>, DomainError> {
        let now = self.clock.now();
        match self.policy.check(actor, action, now) {
            Decision::Allow => Ok(now),
            Decision::Deny(denial) => {
                tracing::warn!(
                    action = action.name(),
                    post_id = ?action.post_id(),
                    actor = ?actor.map(|a| a.id),
                    denial = ?denial,
                    "Post access denied"
                );
                Err(match denial {
                    Denial::Unauthenticated => DomainError::Unauthenticated,
                    Denial::Forbidden => DomainError::Forbidden,
                    Denial::NotFound(id) => DomainError::post_not_found(id),
                })
            }
        }
    }

    async fn view_with_owner(
        &self,
        post: Post,
        now: chrono::DateTime<chrono::Utc>,
    ) -> PostServiceResult<PostView> {
        let owner = self
            .users
            .find_by_id(post.user_id)
            .await?
            .map(|user| Owner::from(&user));

        Ok(PostView {
            state: post.state(now),
            post,
            owner,
        })
    }

    async fn with_owners(&self, page: Page<Post>) -> PostServiceResult<Page<PostView>> {
        let now = self.clock.now();

        let mut ids: Vec<Uuid> = page.items.iter().map(|p| p.user_id).collect();
        ids.sort_unstable();
        ids.dedup();
        let owners = self.users.find_owners(&ids).await?;

        Ok(page.map(|post| PostView {
            state: post.state(now),
            owner: owners.iter().find(|o| o.id == post.user_id).cloned(),
            post,
        }))
    }
}
