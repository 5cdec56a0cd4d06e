//! Post handlers.
//!
//! Handlers only translate between HTTP and [`PostService`]; every access
//! decision is made by the service.
//!
//! [`PostService`]: quire_core::services::PostService

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::SecondsFormat;
use uuid::Uuid;

use quire_core::domain::{Page, PostFilter, RawPostInput};
use quire_core::error::FieldError;
use quire_core::services::PostView;
use quire_shared::ApiResponse;
use quire_shared::dto::{
    OwnerResponse, PageLinks, PageMeta, PageQuery, PaginatedResponse, PostPayload, PostResponse,
};

use crate::middleware::auth::{Identity, OptionalIdentity};
use crate::middleware::error::{AppError, AppResult};
use crate::state::AppState;

fn raw_input(payload: PostPayload) -> RawPostInput {
    RawPostInput {
        title: payload.title,
        content: payload.content,
        is_draft: payload.is_draft,
        published_at: payload.published_at,
    }
}

fn post_response(view: PostView) -> PostResponse {
    let PostView { post, state, owner } = view;

    PostResponse {
        id: post.id.to_string(),
        title: post.title,
        content: post.content,
        is_draft: post.is_draft,
        published_at: post
            .published_at
            .map(|at| at.to_rfc3339_opts(SecondsFormat::Micros, true)),
        state: state.as_str().to_string(),
        user: owner.map(|o| OwnerResponse {
            id: o.id.to_string(),
            name: o.name,
            email: o.email,
        }),
    }
}

/// `status` is optional; blank and `all` both mean no filter.
fn parse_status(raw: Option<&str>) -> AppResult<Option<PostFilter>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("all") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(|_| {
            AppError::Validation(vec![FieldError::new(
                "status",
                "The selected status is invalid.",
            )])
        }),
    }
}

fn page_url(path: &str, status: Option<PostFilter>, page: u64) -> String {
    match status {
        Some(filter) => format!("{path}?status={}&page={page}", filter.as_str()),
        None => format!("{path}?page={page}"),
    }
}

fn paginated(
    req: &HttpRequest,
    status: Option<PostFilter>,
    page: Page<PostView>,
) -> PaginatedResponse<PostResponse> {
    let path = req.path();
    let last_page = page.last_page();
    let current = page.page;

    let links = PageLinks {
        first: page_url(path, status, 1),
        last: page_url(path, status, last_page),
        prev: (current > 1).then(|| page_url(path, status, (current - 1).min(last_page))),
        next: page.has_next().then(|| page_url(path, status, current + 1)),
    };
    let meta = PageMeta {
        current_page: current,
        per_page: page.per_page,
        total: page.total,
        last_page,
    };

    PaginatedResponse {
        data: page.items.into_iter().map(post_response).collect(),
        meta,
        links,
    }
}

/// GET /api/posts
pub async fn index(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let page = state
        .posts
        .index(actor.as_ref(), query.page.unwrap_or(1))
        .await?;

    Ok(HttpResponse::Ok().json(paginated(&req, None, page)))
}

/// GET /api/posts/mine?status=draft|scheduled|published
pub async fn mine(
    req: HttpRequest,
    state: web::Data<AppState>,
    identity: Identity,
    query: web::Query<PageQuery>,
) -> AppResult<HttpResponse> {
    let status = parse_status(query.status.as_deref())?;
    let page = state
        .posts
        .list_mine(Some(&identity.actor()), status, query.page.unwrap_or(1))
        .await?;

    Ok(HttpResponse::Ok().json(paginated(&req, status, page)))
}

/// GET /api/posts/{id}
pub async fn show(
    state: web::Data<AppState>,
    identity: OptionalIdentity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let actor = identity.actor();
    let view = state.posts.show(actor.as_ref(), path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_response(view))))
}

/// GET /api/posts/{id}/edit
pub async fn edit(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let view = state
        .posts
        .edit(Some(&identity.actor()), path.into_inner())
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok(post_response(view))))
}

/// POST /api/posts
pub async fn create(
    state: web::Data<AppState>,
    identity: Identity,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let view = state
        .posts
        .create(&identity.actor(), raw_input(body.into_inner()))
        .await?;
    let location = format!("/api/posts/{}", view.post.id);

    Ok(HttpResponse::Created()
        .insert_header((header::LOCATION, location))
        .json(ApiResponse::ok_with_message(post_response(view), "Post created.")))
}

/// PUT /api/posts/{id}
pub async fn update(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<PostPayload>,
) -> AppResult<HttpResponse> {
    let view = state
        .posts
        .update(
            Some(&identity.actor()),
            path.into_inner(),
            raw_input(body.into_inner()),
        )
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(post_response(view), "Post updated.")))
}

/// DELETE /api/posts/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state
        .posts
        .delete(Some(&identity.actor()), path.into_inner())
        .await?;

    Ok(HttpResponse::NoContent().finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::{Value, json};

    use quire_core::domain::{User, ViewMode};
    use quire_core::ports::BaseRepository;
    use quire_infra::{InMemoryPostRepository, InMemoryUserRepository, ManualClock};

    use crate::config::AppConfig;
    use crate::handlers::{configure_routes, json_config};

    struct Fixture {
        state: AppState,
        clock: Arc<ManualClock>,
        alice: String,
        bob: String,
    }

    async fn fixture(mode: ViewMode) -> Fixture {
        let config = AppConfig::for_tests(mode);
        let users = Arc::new(InMemoryUserRepository::new());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap(),
        ));
        let state = AppState::with_repositories(
            &config,
            Arc::new(InMemoryPostRepository::new()),
            users.clone(),
            clock.clone(),
        );

        let mut tokens = Vec::new();
        for (name, email) in [("Alice", "alice@example.com"), ("Bob", "bob@example.com")] {
            let user = users
                .save(User::new(name.into(), email.into(), "hash".into()))
                .await
                .unwrap();
            tokens.push(state.tokens.generate_token(user.id, &user.email).unwrap());
        }
        let bob = tokens.pop().unwrap();
        let alice = tokens.pop().unwrap();

        Fixture {
            state,
            clock,
            alice,
            bob,
        }
    }

    fn bearer(token: &str) -> (header::HeaderName, String) {
        (header::AUTHORIZATION, format!("Bearer {token}"))
    }

    macro_rules! app {
        ($fixture:expr) => {
            test::init_service(
                App::new()
                    .app_data(web::Data::new($fixture.state.clone()))
                    .app_data(json_config())
                    .configure(configure_routes),
            )
            .await
        };
    }

    macro_rules! create_post {
        ($app:expr, $token:expr, $body:expr) => {{
            let req = test::TestRequest::post()
                .uri("/api/posts")
                .insert_header(bearer($token))
                .set_json($body)
                .to_request();
            let res = test::call_service(&$app, req).await;
            assert_eq!(res.status(), StatusCode::CREATED);
            let body: Value = test::read_body_json(res).await;
            body["data"]["id"].as_str().unwrap().to_string()
        }};
    }

    #[actix_rt::test]
    async fn test_public_read_and_owner_only_writes() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&f.alice))
            .set_json(json!({"title": "Hello", "content": "World", "published_at": "2024-05-01 09:30:00"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::CREATED);
        let location = res.headers().get(header::LOCATION).unwrap().to_str().unwrap().to_string();
        let body: Value = test::read_body_json(res).await;
        let id = body["data"]["id"].as_str().unwrap().to_string();
        assert_eq!(location, format!("/api/posts/{id}"));
        assert_eq!(body["data"]["state"], "published");
        assert_eq!(body["data"]["published_at"], "2024-05-01T09:30:00.000000Z");

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let index: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(index["data"][0]["id"], id.as_str());
        assert_eq!(index["data"][0]["user"]["name"], "Alice");
        assert_eq!(index["meta"]["total"], 1);
        assert!(index["links"]["next"].is_null());

        let req = test::TestRequest::get().uri(&location).to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let req = test::TestRequest::put()
            .uri(&location)
            .insert_header(bearer(&f.bob))
            .set_json(json!({"title": "Mine now", "content": "x"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&location)
            .insert_header(bearer(&f.bob))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri(&format!("{location}/edit"))
            .insert_header(bearer(&f.bob))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::delete()
            .uri(&location)
            .insert_header(bearer(&f.alice))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

        let req = test::TestRequest::get().uri(&location).to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_unpublished_posts_are_not_found_for_others() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        let draft = create_post!(
            app,
            &f.alice,
            json!({"title": "Draft", "content": "x", "is_draft": "on", "published_at": "2024-01-01"})
        );
        let unlisted = create_post!(app, &f.alice, json!({"title": "Unlisted", "content": "x"}));

        for id in [&draft, &unlisted] {
            let req = test::TestRequest::get().uri(&format!("/api/posts/{id}")).to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

            let req = test::TestRequest::get()
                .uri(&format!("/api/posts/{id}"))
                .insert_header(bearer(&f.bob))
                .to_request();
            assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
        }

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{draft}/edit"))
            .insert_header(bearer(&f.alice))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["is_draft"], true);
        assert!(body["data"]["published_at"].is_null());
        assert_eq!(body["data"]["state"], "draft");

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let index: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(index["data"].as_array().unwrap().len(), 0);
    }

    #[actix_rt::test]
    async fn test_null_draft_flag_clears_draft() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        let id = create_post!(app, &f.alice, json!({"title": "Draft", "content": "x", "is_draft": true}));

        let req = test::TestRequest::put()
            .uri(&format!("/api/posts/{id}"))
            .insert_header(bearer(&f.alice))
            .set_json(json!({"title": "Draft", "content": "x", "is_draft": null}))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["data"]["is_draft"], false);
        assert_eq!(body["data"]["state"], "unlisted");
    }

    #[actix_rt::test]
    async fn test_scheduled_post_appears_once_due() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        let id = create_post!(
            app,
            &f.alice,
            json!({"title": "Soon", "content": "x", "published_at": "2024-06-02T08:00:00Z"})
        );

        let req = test::TestRequest::get()
            .uri("/api/posts/mine?status=scheduled")
            .insert_header(bearer(&f.alice))
            .to_request();
        let mine: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(mine["data"][0]["id"], id.as_str());
        assert_eq!(mine["data"][0]["state"], "scheduled");

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let index: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(index["meta"]["total"], 0);

        f.clock.advance(Duration::days(1));

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        let index: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(index["data"][0]["id"], id.as_str());
        assert_eq!(index["data"][0]["state"], "published");
    }

    #[actix_rt::test]
    async fn test_validation_and_authentication_errors() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .set_json(json!({"title": "Anon", "content": "x"}))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&f.alice))
            .set_json(json!({"title": "   ", "published_at": "not a date"}))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body: Value = test::read_body_json(res).await;
        for field in ["title", "content", "published_at"] {
            assert!(body["errors"][field].is_array(), "missing error for {field}");
        }

        let req = test::TestRequest::post()
            .uri("/api/posts")
            .insert_header(bearer(&f.alice))
            .insert_header((header::CONTENT_TYPE, "application/json"))
            .set_payload("{not json")
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/posts/mine?status=archived")
            .insert_header(bearer(&f.alice))
            .to_request();
        assert_eq!(
            test::call_service(&app, req).await.status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );

        let req = test::TestRequest::get().uri("/api/posts/not-a-uuid").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }

    #[actix_rt::test]
    async fn test_mine_pagination_keeps_status_filter() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        for i in 0..21 {
            create_post!(app, &f.alice, json!({"title": format!("Draft {i}"), "content": "x", "is_draft": true}));
            f.clock.advance(Duration::seconds(1));
        }
        create_post!(app, &f.alice, json!({"title": "Out", "content": "x", "published_at": "2024-01-01"}));

        let req = test::TestRequest::get()
            .uri("/api/posts/mine?status=draft")
            .insert_header(bearer(&f.alice))
            .to_request();
        let first: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(first["meta"]["total"], 21);
        assert_eq!(first["meta"]["last_page"], 2);
        assert_eq!(first["data"][0]["title"], "Draft 20");
        assert_eq!(first["links"]["next"], "/api/posts/mine?status=draft&page=2");
        assert!(first["links"]["prev"].is_null());

        let req = test::TestRequest::get()
            .uri("/api/posts/mine?status=draft&page=2")
            .insert_header(bearer(&f.alice))
            .to_request();
        let second: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(second["data"].as_array().unwrap().len(), 1);
        assert_eq!(second["links"]["prev"], "/api/posts/mine?status=draft&page=1");

        let req = test::TestRequest::get()
            .uri("/api/posts/mine")
            .insert_header(bearer(&f.bob))
            .to_request();
        let bobs: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(bobs["meta"]["total"], 0);
    }

    #[actix_rt::test]
    async fn test_page_beyond_u64_range_is_empty() {
        let f = fixture(ViewMode::Public).await;
        let app = app!(f);

        create_post!(
            app,
            &f.alice,
            json!({"title": "Only", "content": "x", "published_at": "2024-01-01"})
        );

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts?page={}", u64::MAX))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);

        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["data"].as_array().unwrap().len(), 0);
        assert_eq!(body["meta"]["total"], 1);
        assert!(body["links"]["next"].is_null());
        assert_eq!(body["links"]["prev"], "/api/posts?page=1");
    }

    #[actix_rt::test]
    async fn test_private_mode_hides_everything_from_others() {
        let f = fixture(ViewMode::Private).await;
        let app = app!(f);

        let id = create_post!(
            app,
            &f.alice,
            json!({"title": "Notes", "content": "x", "published_at": "2024-01-01"})
        );

        let req = test::TestRequest::get().uri("/api/posts").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri(&format!("/api/posts/{id}"))
            .insert_header(bearer(&f.bob))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/posts")
            .insert_header(bearer(&f.alice))
            .to_request();
        let index: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(index["data"][0]["id"], id.as_str());
    }

    #[actix_rt::test]
    async fn test_parse_status() {
        assert_eq!(parse_status(None).unwrap(), None);
        assert_eq!(parse_status(Some(" ")).unwrap(), None);
        assert_eq!(parse_status(Some("all")).unwrap(), None);
        assert_eq!(parse_status(Some("drafts")).unwrap(), Some(PostFilter::Draft));
        assert!(parse_status(Some("unlisted")).is_err());
    }
}
