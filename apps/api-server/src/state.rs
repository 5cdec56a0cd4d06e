//! Application state - shared across all handlers.

use std::sync::Arc;

use quire_core::domain::AccessPolicy;
use quire_core::ports::{Clock, PasswordService, PostRepository, TokenService, UserRepository};
use quire_core::services::PostService;
use quire_infra::{
    Argon2PasswordService, InMemoryPostRepository, InMemoryUserRepository, JwtTokenService,
    SystemClock,
};

#[cfg(feature = "postgres")]
use quire_infra::{PostgresPostRepository, PostgresUserRepository};

use crate::config::{AppConfig, is_production};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub posts: PostService,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
}

type Repositories = (Arc<dyn PostRepository>, Arc<dyn UserRepository>);

fn in_memory() -> Repositories {
    (
        Arc::new(InMemoryPostRepository::new()),
        Arc::new(InMemoryUserRepository::new()),
    )
}

impl AppState {
    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Self {
        #[cfg(feature = "postgres")]
        let (posts, users): Repositories = match &config.database {
            Some(db_config) => match quire_infra::database::connect(db_config).await {
                Ok(conn) => {
                    let conn = Arc::new(conn);
                    (
                        Arc::new(PostgresPostRepository::new(conn.clone())),
                        Arc::new(PostgresUserRepository::new(conn)),
                    )
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to connect to database: {}. Using in-memory fallback.",
                        e
                    );
                    in_memory()
                }
            },
            None => {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                in_memory()
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (posts, users): Repositories = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            in_memory()
        };

        let state = Self::with_repositories(config, posts, users, Arc::new(SystemClock));
        tracing::info!(view_mode = ?config.view_mode, per_page = config.per_page, "Application state initialized");
        state
    }

    pub fn with_repositories(
        config: &AppConfig,
        posts: Arc<dyn PostRepository>,
        users: Arc<dyn UserRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let tokens = JwtTokenService::new(config.jwt.clone());
        if tokens.uses_default_secret() {
            if is_production() {
                tracing::error!(
                    "SECURITY: Using default JWT secret in production! Set JWT_SECRET environment variable."
                );
            } else {
                tracing::warn!("Using default JWT secret. Set JWT_SECRET for production use.");
            }
        }

        let service = PostService::new(
            posts,
            users.clone(),
            clock,
            AccessPolicy::new(config.view_mode),
            config.per_page,
        );

        Self {
            users,
            posts: service,
            tokens: Arc::new(tokens),
            passwords: Arc::new(Argon2PasswordService::new()),
        }
    }
}
