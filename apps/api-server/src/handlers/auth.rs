//! Authentication handlers.

use actix_web::{HttpResponse, web};

use quire_core::domain::User;
use quire_core::error::{DomainError, FieldError};
use quire_shared::dto::{AuthResponse, LoginRequest, RegisterUserRequest, UserResponse};

use crate::middleware::auth::Identity;
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_CHARS: usize = 255;

fn validate_registration(req: &RegisterUserRequest) -> Result<(), AppError> {
    let mut errors = Vec::new();

    let name = req.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new("name", "The name field is required."));
    } else if name.chars().count() > MAX_NAME_CHARS {
        errors.push(FieldError::new(
            "name",
            format!("The name field must not be greater than {MAX_NAME_CHARS} characters."),
        ));
    }

    let email = req.email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && !domain.is_empty());
    if !well_formed {
        errors.push(FieldError::new("email", "The email field must be a valid email address."));
    }

    if req.password.chars().count() < MIN_PASSWORD_LEN {
        errors.push(FieldError::new(
            "password",
            format!("The password field must be at least {MIN_PASSWORD_LEN} characters."),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(errors))
    }
}

fn issue_token(state: &AppState, user: &User) -> AppResult<AuthResponse> {
    let token = state
        .tokens
        .generate_token(user.id, &user.email)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    Ok(AuthResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.tokens.expiration_seconds().max(0) as u64,
    })
}

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterUserRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();
    validate_registration(&req)?;

    let email = req.email.trim().to_string();
    if state.users.find_by_email(&email).await?.is_some() {
        return Err(DomainError::Duplicate("Email already registered".to_string()).into());
    }

    let password_hash = state
        .passwords
        .hash(&req.password)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    let user = state
        .users
        .save(User::new(req.name.trim().to_string(), email, password_hash))
        .await?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(HttpResponse::Created().json(issue_token(&state, &user)?))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .users
        .find_by_email(req.email.trim())
        .await?
        .ok_or(AppError::Unauthorized)?;

    let valid = state
        .passwords
        .verify(&req.password, &user.password_hash)
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !valid {
        tracing::debug!(user_id = %user.id, "Login rejected");
        return Err(AppError::Unauthorized);
    }

    Ok(HttpResponse::Ok().json(issue_token(&state, &user)?))
}

/// GET /api/auth/me - Protected route
pub async fn me(state: web::Data<AppState>, identity: Identity) -> AppResult<HttpResponse> {
    let user = state
        .users
        .find_by_id(identity.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        name: user.name,
        email: user.email,
        created_at: user.created_at.to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{App, http::StatusCode, test};
    use quire_core::domain::ViewMode;
    use serde_json::{Value, json};

    use crate::config::AppConfig;
    use crate::handlers::configure_routes;

    async fn state() -> AppState {
        AppState::new(&AppConfig::for_tests(ViewMode::Public)).await
    }

    #[actix_rt::test]
    async fn test_register_login_me() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state().await))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": "Ada", "email": "ada@example.com", "password": "hunter2hunter2"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "ada@example.com", "password": "hunter2hunter2"}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        let token = body["access_token"].as_str().unwrap().to_string();
        assert_eq!(body["token_type"], "Bearer");

        let req = test::TestRequest::get()
            .uri("/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let me: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(me["name"], "Ada");
        assert_eq!(me["email"], "ada@example.com");

        let req = test::TestRequest::post()
            .uri("/api/auth/login")
            .set_json(json!({"email": "ada@example.com", "password": "wrong-password"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_rt::test]
    async fn test_register_reports_each_bad_field() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state().await))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/api/auth/register")
            .set_json(json!({"name": " ", "email": "nope", "password": "short"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

        let body: Value = test::read_body_json(res).await;
        for field in ["name", "email", "password"] {
            assert!(body["errors"][field].is_array(), "missing error for {field}");
        }
    }

    #[actix_rt::test]
    async fn test_register_same_email_twice_conflicts() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state().await))
                .configure(configure_routes),
        )
        .await;

        let register = |email: &str| {
            test::TestRequest::post()
                .uri("/api/auth/register")
                .set_json(json!({"name": "Ada", "email": email, "password": "hunter2hunter2"}))
                .to_request()
        };

        let res = test::call_service(&app, register("ada@example.com")).await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = test::call_service(&app, register(" ada@example.com ")).await;
        assert_eq!(res.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["detail"], "Email already registered");
    }

    #[actix_rt::test]
    async fn test_me_requires_token() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state().await))
                .configure(configure_routes),
        )
        .await;

        let req = test::TestRequest::get().uri("/api/auth/me").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
