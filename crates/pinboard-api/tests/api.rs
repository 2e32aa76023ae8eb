//! End-to-end API tests driving the router directly

use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, Response, StatusCode, header};
use pinboard_api::{AppState, create_router};
use pinboard_auth::TokenService;
use pinboard_db::Database;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt;

const TEST_SECRET: &str = "integration-test-secret";

struct TestApp {
    app: Router,
    db: Database,
    tokens: Arc<TokenService>,
    _dir: tempfile::TempDir,
}

async fn spawn_app() -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite:{}?mode=rwc", dir.path().join("api.db").display());
    let db = Database::new(&url).await.unwrap();
    let tokens = Arc::new(TokenService::new(TEST_SECRET, "HS256", 30).unwrap());
    let app = create_router(AppState::new(db.clone(), tokens.clone()), None);
    TestApp {
        app,
        db,
        tokens,
        _dir: dir,
    }
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.app.clone().oneshot(request).await.unwrap()
    }

    async fn register(&self, email: &str, password: &str) -> i64 {
        let response = self
            .send(
                Request::post("/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"email": email, "password": password}).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }

    async fn login(&self, email: &str, password: &str) -> String {
        let response = self.try_login(email, password).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["token_type"], "Bearer token");
        body["access_token"].as_str().unwrap().to_string()
    }

    async fn try_login(&self, email: &str, password: &str) -> Response<Body> {
        self.send(
            Request::post("/login")
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(format!(
                    "username={}&password={}",
                    email, password
                )))
                .unwrap(),
        )
        .await
    }

    async fn create_post(&self, token: &str, title: &str) -> i64 {
        let response = self
            .send(
                Request::post("/posts")
                    .header(header::AUTHORIZATION, format!("Bearer {}", token))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(
                        json!({"title": title, "content": "content"}).to_string(),
                    ))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CREATED);
        body_json(response).await["id"].as_i64().unwrap()
    }
}

async fn body_json(response: Response<Body>) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_register_login_and_protected_call() {
    let app = spawn_app().await;

    let user_id = app.register("u@x.com", "pw123").await;
    let token = app.login("u@x.com", "pw123").await;

    // Token resolves to the registered principal
    let response = app
        .send(
            Request::get("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    assert_eq!(app.tokens.verify(&token).unwrap(), user_id);

    // Truncated token is rejected
    let truncated = &token[..token.len() - 1];
    let response = app
        .send(
            Request::get("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {}", truncated))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_bad_credentials_are_indistinguishable() {
    let app = spawn_app().await;
    app.register("u@x.com", "pw123").await;

    let unknown_email = app.try_login("nobody@x.com", "pw123").await;
    let wrong_password = app.try_login("u@x.com", "wrong").await;

    assert_eq!(unknown_email.status(), StatusCode::FORBIDDEN);
    assert_eq!(wrong_password.status(), StatusCode::FORBIDDEN);

    let body_a = body_json(unknown_email).await;
    let body_b = body_json(wrong_password).await;
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["error"], "Invalid credentials");
}

#[tokio::test]
async fn test_login_missing_fields_is_rejected_before_database_access() {
    let app = spawn_app().await;
    app.register("u@x.com", "pw123").await;

    // With the pool closed every query fails, so a 422 here proves the
    // field check ran before any lookup; a handler that looked up the
    // user first would surface a 500 instead.
    app.db.pool().close().await;

    for body in ["username=u@x.com", "password=pw123", ""] {
        let response = app
            .send(
                Request::post("/login")
                    .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                    .body(Body::from(body))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_registration_missing_fields_is_rejected_before_database_access() {
    let app = spawn_app().await;
    app.db.pool().close().await;

    for body in [
        json!({"email": "u@x.com"}),
        json!({"password": "pw123"}),
        json!({"email": "", "password": "pw123"}),
        json!({"email": "u@x.com", "password": ""}),
    ] {
        let response = app
            .send(
                Request::post("/users")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[tokio::test]
async fn test_missing_token_gets_bearer_challenge() {
    let app = spawn_app().await;

    let response = app
        .send(Request::get("/posts").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get(header::WWW_AUTHENTICATE)
            .and_then(|h| h.to_str().ok()),
        Some("Bearer")
    );
}

#[tokio::test]
async fn test_valid_token_for_missing_subject_is_unauthorized() {
    let app = spawn_app().await;

    // Correctly signed, unexpired token whose subject was never registered
    let token = app.tokens.issue(99_999).unwrap();
    let response = app
        .send(
            Request::get("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_token_from_other_secret_is_unauthorized() {
    let app = spawn_app().await;
    let user_id = app.register("u@x.com", "pw123").await;

    let foreign = TokenService::new("some-other-secret", "HS256", 30).unwrap();
    let token = foreign.issue(user_id).unwrap();

    let response = app
        .send(
            Request::get("/posts")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_only_owner_can_mutate_post() {
    let app = spawn_app().await;

    app.register("a@x.com", "pw123").await;
    app.register("b@x.com", "pw123").await;
    let token_a = app.login("a@x.com", "pw123").await;
    let token_b = app.login("b@x.com", "pw123").await;

    let post_id = app.create_post(&token_a, "owned by a").await;

    // B cannot update
    let response = app
        .send(
            Request::put(format!("/posts/{}", post_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token_b))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"title": "hijacked", "content": "x"}).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    // B cannot delete
    let response = app
        .send(
            Request::delete(format!("/posts/{}", post_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token_b))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["error"], "Not authorized to perform requested action");

    // A can update and delete
    let response = app
        .send(
            Request::put(format!("/posts/{}", post_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token_a))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"title": "updated", "content": "x"}).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["title"], "updated");

    let response = app
        .send(
            Request::delete(format!("/posts/{}", post_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token_a))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_missing_post_is_not_found_before_ownership() {
    let app = spawn_app().await;
    app.register("a@x.com", "pw123").await;
    let token = app.login("a@x.com", "pw123").await;

    let response = app
        .send(
            Request::delete("/posts/424242")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_vote_lifecycle() {
    let app = spawn_app().await;

    app.register("a@x.com", "pw123").await;
    app.register("b@x.com", "pw123").await;
    let token_a = app.login("a@x.com", "pw123").await;
    let token_b = app.login("b@x.com", "pw123").await;
    let post_id = app.create_post(&token_a, "votable").await;

    let cast = |token: String, dir: u8, post_id: i64| {
        Request::post("/vote")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(
                json!({"post_id": post_id, "dir": dir}).to_string(),
            ))
            .unwrap()
    };

    // Add vote
    let response = app.send(cast(token_b.clone(), 1, post_id)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Voting twice conflicts
    let response = app.send(cast(token_b.clone(), 1, post_id)).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Vote count is visible on the post
    let response = app
        .send(
            Request::get(format!("/posts/{}", post_id))
                .header(header::AUTHORIZATION, format!("Bearer {}", token_a))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["votes"], 1);

    // Remove vote
    let response = app.send(cast(token_b.clone(), 0, post_id)).await;
    assert_eq!(response.status(), StatusCode::OK);

    // Removing a vote that is gone is not found
    let response = app.send(cast(token_b.clone(), 0, post_id)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Voting on a missing post is not found
    let response = app.send(cast(token_b.clone(), 1, 424242)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    // Bad direction
    let response = app.send(cast(token_b, 7, post_id)).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_duplicate_registration_conflicts() {
    let app = spawn_app().await;
    app.register("u@x.com", "pw123").await;

    let response = app
        .send(
            Request::post("/users")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({"email": "u@x.com", "password": "other"}).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_user_lookup() {
    let app = spawn_app().await;
    let user_id = app.register("u@x.com", "pw123").await;

    let response = app
        .send(
            Request::get(format!("/users/{}", user_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["email"], "u@x.com");
    // The hash never leaves the service
    assert!(body.get("password_hash").is_none());

    let response = app
        .send(Request::get("/users/424242").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_post_listing_includes_owner_and_votes() {
    let app = spawn_app().await;
    app.register("a@x.com", "pw123").await;
    let token = app.login("a@x.com", "pw123").await;

    app.create_post(&token, "first post").await;
    app.create_post(&token, "second post").await;

    let response = app
        .send(
            Request::get("/posts?limit=10&skip=0&search=second")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["post"]["title"], "second post");
    assert_eq!(items[0]["post"]["owner"]["email"], "a@x.com");
    assert_eq!(items[0]["votes"], 0);
}
