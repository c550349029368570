use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{Duration, Utc};
use darkroom::{
    repositories::{Repositories, VerificationCodeRepository},
    test_utils::test_helpers::{self, RecordingEmailService},
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

struct TestApp {
    app: Router,
    email: RecordingEmailService,
    repositories: Repositories,
    _public: TempDir,
}

async fn setup() -> TestApp {
    let pool = test_helpers::create_test_db().await.unwrap();
    let repositories = Repositories::sqlite(pool);
    let email = RecordingEmailService::new();
    let public = TempDir::new().unwrap();
    let app = test_helpers::test_app(repositories.clone(), email.clone(), public.path());

    TestApp {
        app,
        email,
        repositories,
        _public: public,
    }
}

async fn post(app: &Router, uri: &str, body: Value, cookie: Option<&str>) -> Response {
    let mut request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

async fn get_me(app: &Router, cookie: Option<&str>) -> Response {
    let mut request = Request::builder().uri("/api/auth/me");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// `name=value` part of the response's Set-Cookie header.
fn session_cookie(response: &Response) -> String {
    let header = response
        .headers()
        .get(header::SET_COOKIE)
        .expect("session cookie set")
        .to_str()
        .unwrap();
    header.split(';').next().unwrap().to_string()
}

#[tokio::test]
async fn test_signup_then_login_sets_cookie() {
    let t = setup().await;

    let response = post(
        &t.app,
        "/api/auth/signup",
        json!({ "email": "new@example.com", "password": "password123", "name": "New" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["email"], "new@example.com");
    assert!(body["user"].get("passwordHash").is_none());

    let response = post(
        &t.app,
        "/api/auth/login",
        json!({ "email": "new@example.com", "password": "password123" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("auth-token="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Max-Age=604800"));
    assert!(!set_cookie.contains("Secure"));

    let cookie = session_cookie(&response);
    let response = get_me(&t.app, Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["user"]["name"], "New");
}

#[tokio::test]
async fn test_signup_rejects_duplicates_and_missing_fields() {
    let t = setup().await;
    let body = json!({ "email": "dup@example.com", "password": "password123" });

    assert_eq!(
        post(&t.app, "/api/auth/signup", body.clone(), None).await.status(),
        StatusCode::CREATED
    );

    let response = post(&t.app, "/api/auth/signup", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "User already exists");

    let response = post(
        &t.app,
        "/api/auth/signup",
        json!({ "email": "x@example.com" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let t = setup().await;
    post(
        &t.app,
        "/api/auth/signup",
        json!({ "email": "u@example.com", "password": "right-password" }),
        None,
    )
    .await;

    let response = post(
        &t.app,
        "/api/auth/login",
        json!({ "email": "u@example.com", "password": "wrong-password" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let response = post(
        &t.app,
        "/api/auth/login",
        json!({ "email": "nobody@example.com", "password": "right-password" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_requires_valid_cookie() {
    let t = setup().await;

    assert_eq!(get_me(&t.app, None).await.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        get_me(&t.app, Some("auth-token=forged.token")).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_code_sign_in_creates_user() {
    let t = setup().await;

    let response = post(
        &t.app,
        "/api/auth/send-code",
        json!({ "email": "code@example.com" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let code = t.email.last_code_for("code@example.com").unwrap();
    assert_eq!(code.len(), 6);

    let response = post(
        &t.app,
        "/api/auth/verify-code",
        json!({ "email": "code@example.com", "code": code }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = session_cookie(&response);
    assert_eq!(json_body(response).await["user"]["email"], "code@example.com");

    let response = get_me(&t.app, Some(&cookie)).await;
    assert_eq!(json_body(response).await["user"]["email"], "code@example.com");
}

#[tokio::test]
async fn test_codes_are_single_use() {
    let t = setup().await;
    post(
        &t.app,
        "/api/auth/send-code",
        json!({ "email": "once@example.com" }),
        None,
    )
    .await;
    let code = t.email.last_code_for("once@example.com").unwrap();
    let body = json!({ "email": "once@example.com", "code": code });

    assert_eq!(
        post(&t.app, "/api/auth/verify-code", body.clone(), None)
            .await
            .status(),
        StatusCode::OK
    );

    let response = post(&t.app, "/api/auth/verify-code", body, None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "Invalid or expired code");
}

#[tokio::test]
async fn test_expired_code_is_rejected() {
    let t = setup().await;
    t.repositories
        .codes
        .create_code(
            "late@example.com",
            "123456",
            Utc::now() - Duration::minutes(1),
        )
        .await
        .unwrap();

    let response = post(
        &t.app,
        "/api/auth/verify-code",
        json!({ "email": "late@example.com", "code": "123456" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = post(
        &t.app,
        "/api/auth/verify-code",
        json!({ "email": "late@example.com" }),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await["error"],
        "Email and code are required"
    );
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let t = setup().await;

    let response = post(&t.app, "/api/auth/logout", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let set_cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(set_cookie.starts_with("auth-token=;"));
    assert!(set_cookie.contains("Max-Age=0"));
    assert_eq!(json_body(response).await["success"], true);
}

#[tokio::test]
async fn test_send_code_requires_email() {
    let t = setup().await;
    let response = post(&t.app, "/api/auth/send-code", json!({}), None).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(t.email.sent().is_empty());
}
