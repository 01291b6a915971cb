// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::NaiveDate;
use serde_json::Value;
use std::sync::Arc;
use streak_tracker::config::Config;
use streak_tracker::db::{FirestoreDb, MemoryStore};
use streak_tracker::routes::create_router;
use streak_tracker::services::StreakService;
use streak_tracker::AppState;
use tower::ServiceExt;

/// Fixed "today" for API tests (a Monday).
#[allow(dead_code)]
pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 6, 10).unwrap()
}

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app backed by an in-memory store and a fixed clock.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState {
        config: Config::test_default(),
        service: StreakService::with_clock(Arc::new(MemoryStore::new()), today),
    });

    (create_router(state.clone()), state)
}

/// Send a request and decode the JSON response body (Null if empty).
#[allow(dead_code)]
pub async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, json)
}

/// Create a streak through the API and return its ID.
#[allow(dead_code)]
pub async fn create_streak(app: &axum::Router, name: &str, color: &str) -> String {
    let (status, body) = send(
        app,
        "POST",
        "/api/streaks",
        Some(serde_json::json!({
            "name": name,
            "start_date": "2024-06-01",
            "color": color,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create streak failed: {}", body);
    body["id"].as_str().unwrap().to_string()
}

/// Log a completion through the API and return the response body.
#[allow(dead_code)]
pub async fn log_completion(app: &axum::Router, streak_id: &str, date: &str) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/api/completions",
        Some(serde_json::json!({
            "streak": streak_id,
            "date_completed": date,
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "log completion failed: {}", body);
    body
}
