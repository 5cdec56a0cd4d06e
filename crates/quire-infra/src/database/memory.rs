//! In-memory repositories - used when no database is configured, and in tests.
//!
//! Data is lost on process restart.

use std::cmp::Reverse;
use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use quire_core::domain::{Owner, Page, Post, User};
use quire_core::error::RepoError;
use quire_core::ports::{BaseRepository, PostOrder, PostQuery, PostRepository, UserRepository};

/// In-memory post store. Saves are last-write-wins.
#[derive(Default)]
pub struct InMemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl InMemoryPostRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<Post, Uuid> for InMemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        self.store.write().await.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn list(&self, query: PostQuery) -> Result<Page<Post>, RepoError> {
        let mut matching: Vec<Post> = self
            .store
            .read()
            .await
            .values()
            .filter(|p| query.owner_id.is_none_or(|owner| p.user_id == owner))
            .filter(|p| {
                query
                    .filter
                    .is_none_or(|f| f.matches(p.is_draft, p.published_at, query.now))
            })
            .cloned()
            .collect();

        // `Option` orders `None` first, so reversing puts unpublished posts last.
        match query.order {
            PostOrder::NewestPublished => {
                matching.sort_by_key(|p| Reverse((p.published_at, p.id)));
            }
            PostOrder::NewestCreated => {
                matching.sort_by_key(|p| Reverse((p.created_at, p.id)));
            }
        }

        let total = matching.len() as u64;
        let items = matching
            .into_iter()
            .skip(usize::try_from(query.page.offset()).unwrap_or(usize::MAX))
            .take(query.page.per_page as usize)
            .collect();

        Ok(Page::new(items, query.page, total))
    }
}

/// In-memory user store with a unique email constraint.
#[derive(Default)]
pub struct InMemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl BaseRepository<User, Uuid> for InMemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        Ok(self.store.read().await.get(&id).cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        let taken = store
            .values()
            .any(|u| u.id != user.id && u.email.eq_ignore_ascii_case(&user.email));
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        match self.store.write().await.remove(&id) {
            Some(_) => Ok(()),
            None => Err(RepoError::NotFound),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        Ok(self
            .store
            .read()
            .await
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_owners(&self, ids: &[Uuid]) -> Result<Vec<Owner>, RepoError> {
        let store = self.store.read().await;
        Ok(ids.iter().filter_map(|id| store.get(id)).map(Owner::from).collect())
    }
}
