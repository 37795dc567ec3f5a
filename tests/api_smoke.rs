use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use studio_site::{
    api::{router, AppState},
    auth::SESSION_HEADER,
    security::AccessGate,
};
use tower::ServiceExt;

const SECRET: &str = "smoke-secret";

fn app() -> Router {
    router(AppState::new(AccessGate::new(SECRET)))
}

async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    session: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(session) = session {
        builder = builder.header(SESSION_HEADER, session);
    }
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
}

async fn login(app: &Router, session: &str) {
    let (status, body) = send(
        app,
        "POST",
        "/admin/login",
        Some(session),
        Some(json!({ "password": SECRET })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["gate"], "unlocked");
}

#[tokio::test]
async fn health_reports_ok() {
    let app = app();
    let (status, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "ok");
    assert_eq!(body["sessions"], 0);
}

#[tokio::test]
async fn missing_session_header_is_rejected() {
    let app = app();
    let (status, body) = send(&app, "GET", "/admin", None, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn wrong_password_is_unauthorized() {
    let app = app();
    let (status, body) = send(
        &app,
        "POST",
        "/admin/login",
        Some("tab-1"),
        Some(json!({ "password": "nope" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Неверный пароль");
    assert_eq!(body["gate"], "locked");
}

#[tokio::test]
async fn locked_admin_is_forbidden() {
    let app = app();
    let (status, _) = send(&app, "GET", "/admin/records/blog", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn unknown_tab_is_not_found() {
    let app = app();
    login(&app, "tab-1").await;
    let (status, _) = send(&app, "GET", "/admin/records/gallery", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_then_create_blog_post() {
    let app = app();
    login(&app, "tab-1").await;

    let (status, body) = send(
        &app,
        "POST",
        "/admin/records/blog",
        Some("tab-1"),
        Some(json!({ "fields": {
            "title": "A",
            "excerpt": "e",
            "content": "c",
            "publish_date": "2024-02-01",
            "author": "X"
        }})),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["result"]["outcome"], "created");

    let (status, body) = send(&app, "GET", "/admin/records/blog", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[2]["title"], "A");
}

#[tokio::test]
async fn missing_required_field_is_bad_request() {
    let app = app();
    login(&app, "tab-1").await;
    let (status, body) = send(
        &app,
        "POST",
        "/admin/records/blog",
        Some("tab-1"),
        Some(json!({ "fields": { "title": "Only a title" } })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("_required"));
}

#[tokio::test]
async fn sessions_do_not_share_unlock() {
    let app = app();
    login(&app, "tab-1").await;
    let (status, _) = send(&app, "GET", "/admin", Some("tab-2"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, "GET", "/admin", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tab"], "portfolio");
    assert_eq!(body["screen"]["count"], 3);
}

#[tokio::test]
async fn contact_status_rejects_unknown_value() {
    let app = app();
    login(&app, "tab-1").await;
    let (status, _) = send(
        &app,
        "PUT",
        "/admin/contacts/1/status",
        Some("tab-1"),
        Some(json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn locked_requests_do_not_register_sessions() {
    let app = app();
    for n in 0..50 {
        let session = format!("stranger-{n}");
        let (status, _) = send(&app, "GET", "/admin", Some(&session), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, _) = send(
            &app,
            "POST",
            "/admin/login",
            Some(&session),
            Some(json!({ "password": "wrong" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
    let (_, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(body["sessions"], 0);

    login(&app, "tab-1").await;
    let (_, body) = send(&app, "GET", "/health", None, None).await;
    assert_eq!(body["sessions"], 1);
}

#[tokio::test]
async fn logout_requires_unlocked_session() {
    let app = app();
    let (status, _) = send(&app, "POST", "/admin/logout", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    login(&app, "tab-1").await;
    let (status, _) = send(&app, "POST", "/admin/logout", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, "POST", "/admin/logout", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn closing_unknown_session_is_allowed() {
    let app = app();
    let (status, body) = send(&app, "DELETE", "/admin/session", Some("tab-9"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["closed"], false);
}

#[tokio::test]
async fn contact_requests_are_read_only() {
    let app = app();
    login(&app, "tab-1").await;
    let (status, _) = send(
        &app,
        "POST",
        "/admin/records/contacts",
        Some("tab-1"),
        Some(json!({ "fields": { "name": "N", "email": "n@example.com", "message": "m" } })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = send(
        &app,
        "PUT",
        "/admin/records/contacts/1",
        Some("tab-1"),
        Some(json!({ "fields": { "email": "changed@example.com" } })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, body) = send(&app, "DELETE", "/admin/records/contacts/1", Some("tab-1"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["removed"], true);
}
