//! Application configuration loaded from environment variables.

use std::env;

use quire_core::domain::{DEFAULT_PER_PAGE, MAX_PER_PAGE, MIN_PER_PAGE, ViewMode};
use quire_infra::JwtConfig;
use quire_infra::database::DatabaseConfig;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database: Option<DatabaseConfig>,
    pub view_mode: ViewMode,
    pub per_page: u64,
    pub jwt: JwtConfig,
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let database = env::var("DATABASE_URL").ok().map(|url| DatabaseConfig {
            url,
            max_connections: parse_var("DB_MAX_CONNECTIONS").unwrap_or(100),
            min_connections: parse_var("DB_MIN_CONNECTIONS").unwrap_or(10),
        });

        let view_mode = match env::var("POST_VIEW_MODE") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                tracing::warn!("Invalid POST_VIEW_MODE ({}), falling back to public", e);
                ViewMode::Public
            }),
            Err(_) => ViewMode::Public,
        };

        let defaults = JwtConfig::default();
        let jwt = JwtConfig {
            secret: env::var("JWT_SECRET").unwrap_or(defaults.secret),
            expiration_hours: parse_var("JWT_EXPIRATION_HOURS").unwrap_or(defaults.expiration_hours),
            issuer: env::var("JWT_ISSUER").unwrap_or(defaults.issuer),
        };

        Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT").unwrap_or(8080),
            database,
            view_mode,
            per_page: clamp_per_page(parse_var("POSTS_PER_PAGE")),
            jwt,
        }
    }

    /// Configuration for tests: no database, default secret.
    #[cfg(test)]
    pub fn for_tests(view_mode: ViewMode) -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 0,
            database: None,
            view_mode,
            per_page: DEFAULT_PER_PAGE,
            jwt: JwtConfig::default(),
        }
    }
}

pub fn is_production() -> bool {
    env::var("RUST_ENV")
        .map(|v| v == "production" || v == "prod")
        .unwrap_or(false)
}

fn parse_var<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|s| s.trim().parse().ok())
}

fn clamp_per_page(requested: Option<u64>) -> u64 {
    match requested {
        Some(n) if !(MIN_PER_PAGE..=MAX_PER_PAGE).contains(&n) => {
            let clamped = n.clamp(MIN_PER_PAGE, MAX_PER_PAGE);
            tracing::warn!(requested = n, clamped, "POSTS_PER_PAGE out of range");
            clamped
        }
        Some(n) => n,
        None => DEFAULT_PER_PAGE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_per_page() {
        assert_eq!(clamp_per_page(None), 20);
        assert_eq!(clamp_per_page(Some(15)), 15);
        assert_eq!(clamp_per_page(Some(5)), 10);
        assert_eq!(clamp_per_page(Some(500)), 20);
    }
}
