//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;

use actix_web::{error::InternalError, web};
use quire_shared::ErrorResponse;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me)),
            )
            // Post routes; `/mine` must be registered ahead of `/{id}`
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::index))
                    .route("", web::post().to(posts::create))
                    .route("/mine", web::get().to(posts::mine))
                    .route("/{id}", web::get().to(posts::show))
                    .route("/{id}", web::put().to(posts::update))
                    .route("/{id}", web::delete().to(posts::destroy))
                    .route("/{id}/edit", web::get().to(posts::edit)),
            ),
    );
}

/// JSON body settings: malformed bodies get a problem document instead of plain text.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .limit(256 * 1024)
        .error_handler(|err, _req| {
            let detail = err.to_string();
            let response = actix_web::HttpResponse::BadRequest().json(ErrorResponse::bad_request(detail));
            InternalError::from_response(err, response).into()
        })
}
