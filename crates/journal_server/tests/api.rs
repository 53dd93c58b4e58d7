//! End-to-end tests of the REST surface, driven through the router.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::NaiveDate;
use journal_core::clock::ManualClock;
use journal_core::entry::JournalEntry;
use journal_core::streak::StreakSummary;
use journal_server::{
    Config, app,
    db::{JournalRepo, init_database},
    handlers::AppState,
};
use rusqlite::Connection;
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    clock: Arc<ManualClock>,
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

impl TestApp {
    fn new() -> Self {
        let conn = Connection::open_in_memory().unwrap();
        init_database(&conn).unwrap();
        let clock = Arc::new(ManualClock::new(day("2024-03-10")));
        let state = AppState {
            repo: Arc::new(JournalRepo::new(conn)),
            clock: clock.clone(),
            session_expiry_days: 30,
        };
        Self {
            router: app(state, &Config::default()),
            clock,
        }
    }

    async fn send(
        &self,
        method: &str,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn register(&self, username: &str) -> String {
        let (status, body) = self
            .send(
                "POST",
                "/api/users/register",
                None,
                Some(json!({
                    "username": username,
                    "email": format!("{username}@example.com"),
                    "password": "hunter22"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    async fn create(&self, token: &str, title: &str, date: &str) -> JournalEntry {
        let (status, body) = self
            .send(
                "POST",
                "/api/journal",
                Some(token),
                Some(json!({ "title": title, "content": "text", "date": date })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        serde_json::from_value(body).unwrap()
    }
}

#[tokio::test]
async fn test_health() {
    let app = TestApp::new();
    let response = app
        .router
        .clone()
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_register_login_profile_logout() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    // Duplicate username or email
    let (status, body) = app
        .send(
            "POST",
            "/api/users/register",
            None,
            Some(json!({ "username": "ada", "email": "other@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");

    let (status, _) = app
        .send(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "ada@example.com", "password": "wrong-one" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, login) = app
        .send(
            "POST",
            "/api/users/login",
            None,
            Some(json!({ "email": "ADA@example.com", "password": "hunter22" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(login["username"], "ada");
    assert_ne!(login["token"].as_str().unwrap(), token);

    let (status, profile) = app.send("GET", "/api/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(profile["email"], "ada@example.com");
    assert!(profile["lastLoginDate"].is_string());

    let (status, _) = app.send("POST", "/api/users/logout", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = app.send("GET", "/api/users/profile", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Not authorized");
}

#[tokio::test]
async fn test_registration_validation() {
    let app = TestApp::new();
    let (status, body) = app
        .send(
            "POST",
            "/api/users/register",
            None,
            Some(json!({ "username": "ab", "email": "bad", "password": "123" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["violations"]["username"].is_string());
    assert!(body["violations"]["email"].is_string());
    assert!(body["violations"]["password"].is_string());
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = TestApp::new();
    for (method, uri) in [
        ("GET", "/api/journal"),
        ("GET", "/api/journal/streak"),
        ("GET", "/api/journal/1"),
        ("DELETE", "/api/journal/1"),
    ] {
        let (status, body) = app.send(method, uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["message"], "Not authorized");
    }

    let (status, _) = app.send("GET", "/api/journal", Some("forged"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_entry_crud() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    let created = app.create(&token, "First", "2024-03-09").await;
    assert_eq!(created.title, "First");
    assert_eq!(created.date, day("2024-03-09"));

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/journal/{}", created.id),
            Some(&token),
            Some(json!({ "content": "only content changes" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let updated: JournalEntry = serde_json::from_value(body).unwrap();
    assert_eq!(updated.title, "First");
    assert_eq!(updated.content, "only content changes");

    let (status, body) = app
        .send("GET", &format!("/api/journal/{}", created.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["content"], "only content changes");
    assert_eq!(body["ownerId"], created.owner_id);

    let (status, body) = app
        .send("DELETE", &format!("/api/journal/{}", created.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Entry removed");

    let (status, body) = app
        .send("GET", &format!("/api/journal/{}", created.id), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Entry not found");
}

#[tokio::test]
async fn test_create_validation_and_default_date() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    let (status, body) = app
        .send(
            "POST",
            "/api/journal",
            Some(&token),
            Some(json!({ "title": "  ", "date": "2024-13-01" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["violations"]["title"].is_string());
    assert!(body["violations"]["date"].is_string());

    let (status, body) = app
        .send("POST", "/api/journal", Some(&token), Some(json!({ "title": "No date" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["date"], "2024-03-10");
    assert_eq!(body["content"], "");
}

#[tokio::test]
async fn test_update_rejects_blank_title() {
    let app = TestApp::new();
    let token = app.register("ada").await;
    let created = app.create(&token, "Keep", "2024-03-09").await;

    let (status, body) = app
        .send(
            "PUT",
            &format!("/api/journal/{}", created.id),
            Some(&token),
            Some(json!({ "title": "" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "title is required");

    let (status, _) = app
        .send("PUT", "/api/journal/9999", Some(&token), Some(json!({ "title": "x" })))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_entries_are_private() {
    let app = TestApp::new();
    let ada = app.register("ada").await;
    let bob = app.register("bob").await;
    let entry = app.create(&ada, "Secret", "2024-03-09").await;

    let (status, _) = app
        .send("GET", &format!("/api/journal/{}", entry.id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .send("DELETE", &format!("/api/journal/{}", entry.id), Some(&bob), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, list) = app.send("GET", "/api/journal", Some(&bob), None).await;
    assert_eq!(list.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_list_search_and_streak() {
    let app = TestApp::new();
    let token = app.register("ada").await;

    app.create(&token, "Rain", "2024-03-10").await;
    app.create(&token, "Walk", "2024-03-09").await;
    app.create(&token, "Rainbow", "2024-03-08").await;
    app.create(&token, "Gap", "2024-03-06").await;

    let (_, list) = app.send("GET", "/api/journal", Some(&token), None).await;
    let titles: Vec<_> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Rain", "Walk", "Rainbow", "Gap"]);

    let (status, found) = app
        .send("GET", "/api/journal/search?query=rain", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(found.as_array().unwrap().len(), 2);

    let (status, body) = app.send("GET", "/api/journal/search", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Search query is required");

    let (_, streak) = app.send("GET", "/api/journal/streak", Some(&token), None).await;
    let streak: StreakSummary = serde_json::from_value(streak).unwrap();
    assert_eq!(streak.current_streak, 3);
    assert_eq!(streak.longest_streak, 3);
    assert_eq!(streak.last_entry_date, Some(day("2024-03-10")));

    // Two days later the streak is broken
    app.clock.set_today(day("2024-03-12"));
    let (_, streak) = app.send("GET", "/api/journal/streak", Some(&token), None).await;
    assert_eq!(streak["currentStreak"], 0);
}
