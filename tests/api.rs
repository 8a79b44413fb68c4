//! HTTP API behaviour through the full router

mod common;

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use challenge_judge::{
    authorization::Role,
    config::JwtConfig,
    handlers,
    middleware::auth::{issue_token, Claims},
    state::AppState,
};

use common::{add_challenge, fixture, Fixture, ScriptedSandbox};

const SECRET: &str = "integration-secret";

fn app() -> (Router, Fixture) {
    let fx = fixture(Arc::new(ScriptedSandbox));
    let state = AppState::new(
        fx.pipeline.clone(),
        JwtConfig {
            secret: SECRET.to_string(),
        },
    );
    (handlers::app(state), fx)
}

fn token(user_id: Uuid, role: Role) -> String {
    issue_token(&Claims::new(user_id, role, chrono::Duration::hours(1)), SECRET).unwrap()
}

async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    bearer: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(bearer) = bearer {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

#[tokio::test]
async fn health_reports_queue_depth() {
    let (app, _fx) = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/health", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["queued"], 0);
}

#[tokio::test]
async fn submissions_require_a_token() {
    let (app, _fx) = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/submissions", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert!(body["error"]["code"].is_string());

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/submissions",
        Some("not-a-jwt"),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn submit_is_accepted_and_queued() {
    let (app, fx) = app();
    let challenge = add_challenge(fx.store.as_ref()).await;
    let user = Uuid::new_v4();
    let bearer = token(user, Role::Participant);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/submissions",
        Some(&bearer),
        Some(json!({
            "challenge_id": challenge.id,
            "source_code": "function solution(input) { return 4; }"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["state"], "queued");
    let id = body["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/submissions/{}", id),
        Some(&bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["language"], "javascript");
    assert!(body.get("source_code").is_none());

    // Not judged yet: no workers are running
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/submissions/{}/verdict", id),
        Some(&bearer),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Other participants cannot read it
    let stranger = token(Uuid::new_v4(), Role::Participant);
    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/submissions/{}", id),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn invalid_submission_is_a_bad_request() {
    let (app, fx) = app();
    let challenge = add_challenge(fx.store.as_ref()).await;
    let bearer = token(Uuid::new_v4(), Role::Participant);

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/submissions",
        Some(&bearer),
        Some(json!({
            "challenge_id": challenge.id,
            "language": "cobol",
            "source_code": "IDENTIFICATION DIVISION."
        })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn only_authors_publish_challenges() {
    let (app, _fx) = app();
    let challenge = json!({
        "title": "Reverse a list",
        "difficulty": "medium",
        "tags": ["Arrays"],
        "test_cases": [
            {"input": [1, 2, 3], "expected": [3, 2, 1]},
            {"input": [], "expected": [], "time_limit_ms": 500}
        ],
        "sample_count": 1
    });

    let participant = token(Uuid::new_v4(), Role::Participant);
    let (status, _) = send(
        &app,
        Method::POST,
        "/api/v1/challenges",
        Some(&participant),
        Some(challenge.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let author = token(Uuid::new_v4(), Role::Author);
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/v1/challenges",
        Some(&author),
        Some(challenge),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["points"], 20);
    assert_eq!(body["tags"], json!(["arrays"]));

    // Public view exposes only the sample case
    let id = body["id"].as_str().unwrap().to_string();
    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/challenges/{}", id),
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["test_case_count"], 2);
    assert_eq!(body["samples"], json!([{"input": [1, 2, 3], "expected": [3, 2, 1]}]));

    let (status, body) = send(
        &app,
        Method::GET,
        "/api/v1/challenges?difficulty=medium&tag=arrays",
        None,
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 1);

    // Authors may publish but not delete
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/challenges/{}", id),
        Some(&author),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token(Uuid::new_v4(), Role::Admin);
    let (status, _) = send(
        &app,
        Method::DELETE,
        &format!("/api/v1/challenges/{}", id),
        Some(&admin),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn leaderboard_is_public() {
    let (app, _fx) = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/leaderboard", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["entries"], json!([]));
}
