use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::domain::{Owner, Page, PageRequest, Post, PostFilter, User};
use crate::error::RepoError;

/// Generic repository trait defining standard CRUD operations.
#[async_trait]
pub trait BaseRepository<T, ID>: Send + Sync {
    /// Find an entity by its unique ID.
    async fn find_by_id(&self, id: ID) -> Result<Option<T>, RepoError>;

    /// Save an entity (create or update).
    async fn save(&self, entity: T) -> Result<T, RepoError>;

    /// Delete an entity by its ID.
    async fn delete(&self, id: ID) -> Result<(), RepoError>;
}

/// User repository with domain-specific methods.
#[async_trait]
pub trait UserRepository: BaseRepository<User, Uuid> {
    /// Find a user by their email address.
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Load the public owner projection for each id that exists.
    async fn find_owners(&self, ids: &[Uuid]) -> Result<Vec<Owner>, RepoError>;
}

/// Sort order for post listings. Ties break on id so pages stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PostOrder {
    /// Newest `published_at` first.
    #[default]
    NewestPublished,
    /// Newest `created_at` first.
    NewestCreated,
}

/// A post listing query.
#[derive(Debug, Clone)]
pub struct PostQuery {
    pub filter: Option<PostFilter>,
    pub owner_id: Option<Uuid>,
    /// Reference instant the filter is evaluated against.
    pub now: DateTime<Utc>,
    pub order: PostOrder,
    pub page: PageRequest,
}

impl PostQuery {
    pub fn new(now: DateTime<Utc>, page: PageRequest) -> Self {
        Self {
            filter: None,
            owner_id: None,
            now,
            order: PostOrder::default(),
            page,
        }
    }

    pub fn filter(mut self, filter: PostFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn owned_by(mut self, owner_id: Uuid) -> Self {
        self.owner_id = Some(owner_id);
        self
    }

    pub fn order(mut self, order: PostOrder) -> Self {
        self.order = order;
        self
    }
}

/// Post repository.
#[async_trait]
pub trait PostRepository: BaseRepository<Post, Uuid> {
    /// List one page of posts matching the query.
    async fn list(&self, query: PostQuery) -> Result<Page<Post>, RepoError>;
}
