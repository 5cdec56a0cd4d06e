//! PostgreSQL repository implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::{NullOrdering, Order};
use sea_orm::{ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use uuid::Uuid;

use quire_core::domain::{Owner, Page, Post, PostFilter, User};
use quire_core::error::RepoError;
use quire_core::ports::{PostOrder, PostQuery, PostRepository, UserRepository};

use super::entity::post::{self, Entity as PostEntity};
use super::entity::user::{self, Entity as UserEntity};
use super::postgres_base::{PostgresBaseRepository, query_error};

/// PostgreSQL user repository.
pub type PostgresUserRepository = PostgresBaseRepository<UserEntity>;

/// PostgreSQL post repository.
pub type PostgresPostRepository = PostgresBaseRepository<PostEntity>;

/// Mask an email for logging to avoid PII in logs.
fn mask_email(email: &str) -> String {
    match email.find('@') {
        Some(at_pos) => {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = match local.chars().next() {
                Some(first) if local.chars().count() > 1 => format!("{first}***"),
                _ => "***".to_string(),
            };
            format!("{masked_local}{domain}")
        }
        None => "***".to_string(),
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        tracing::debug!(user_email = %mask_email(email), "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(result.map(Into::into))
    }

    async fn find_owners(&self, ids: &[Uuid]) -> Result<Vec<Owner>, RepoError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let users = UserEntity::find()
            .filter(user::Column::Id.is_in(ids.iter().copied()))
            .all(self.db.as_ref())
            .await
            .map_err(query_error)?;

        Ok(users
            .into_iter()
            .map(|model| Owner {
                id: model.id,
                name: model.name,
                email: model.email,
            })
            .collect())
    }
}

/// SQL form of a list filter. Must agree with `PostFilter::matches`.
pub(crate) fn filter_condition(filter: PostFilter, now: DateTime<Utc>) -> Condition {
    let now: DateTimeWithTimeZone = now.into();

    match filter {
        PostFilter::Draft => Condition::all().add(post::Column::IsDraft.eq(true)),
        PostFilter::Scheduled => Condition::all()
            .add(post::Column::IsDraft.eq(false))
            .add(post::Column::PublishedAt.is_not_null())
            .add(post::Column::PublishedAt.gt(now)),
        PostFilter::Published => Condition::all()
            .add(post::Column::IsDraft.eq(false))
            .add(post::Column::PublishedAt.is_not_null())
            .add(post::Column::PublishedAt.lte(now)),
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn list(&self, query: PostQuery) -> Result<Page<Post>, RepoError> {
        tracing::debug!(
            filter = ?query.filter,
            owner_id = ?query.owner_id,
            order = ?query.order,
            page = query.page.page,
            "Listing posts"
        );

        let mut select = PostEntity::find();
        if let Some(owner_id) = query.owner_id {
            select = select.filter(post::Column::UserId.eq(owner_id));
        }
        if let Some(filter) = query.filter {
            select = select.filter(filter_condition(filter, query.now));
        }

        let select = match query.order {
            PostOrder::NewestPublished => select.order_by_with_nulls(
                post::Column::PublishedAt,
                Order::Desc,
                NullOrdering::Last,
            ),
            PostOrder::NewestCreated => select.order_by_desc(post::Column::CreatedAt),
        }
        .order_by_desc(post::Column::Id);

        let paginator = select.paginate(self.db.as_ref(), query.page.per_page);
        let total = paginator.num_items().await.map_err(query_error)?;
        let models = paginator
            .fetch_page(query.page.page.saturating_sub(1))
            .await
            .map_err(query_error)?;

        Ok(Page::new(
            models.into_iter().map(Into::into).collect(),
            query.page,
            total,
        ))
    }
}
