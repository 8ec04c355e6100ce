//! End-to-end tests driving the full router against the in-memory store.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::config::Config;
use crate::models::user_models::{NewUser, Role, User};
use crate::routes;
use crate::state::AppState;
use crate::store::{MemoryPollStore, MemoryUserStore, StoreError, StoreResult, UserStore};

fn test_app() -> Router {
    let config = Config {
        bcrypt_cost: 4,
        feed_limit: 3,
        ..Config::default()
    };
    routes::app(AppState::in_memory(config))
}

/// Send one request and return the status with the decoded JSON body.
async fn send(
    app: &Router,
    method: Method,
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

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

/// Register an account and return `(id, token)`.
async fn register(app: &Router, name: &str, email: &str, role: &str) -> (String, String) {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": name, "email": email, "password": "secret-pw", "role": role })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["id"].as_str().unwrap().to_string(),
        body["token"].as_str().unwrap().to_string(),
    )
}

async fn admin(app: &Router) -> String {
    register(app, "Root", "root@example.com", "admin").await.1
}

async fn create_poll(app: &Router, token: &str, end_date: chrono::DateTime<Utc>) -> Value {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/polls",
        Some(token),
        Some(json!({
            "title": "T",
            "description": "Pick one",
            "options": ["A", "B"],
            "endDate": end_date.to_rfc3339(),
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body
}

fn option_id(poll: &Value, text: &str) -> String {
    poll["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|option| option["text"] == text)
        .map(|option| option["id"].as_str().unwrap().to_string())
        .unwrap()
}

fn votes_for(poll: &Value, text: &str) -> u64 {
    poll["options"]
        .as_array()
        .unwrap()
        .iter()
        .find(|option| option["text"] == text)
        .map(|option| option["votes"].as_u64().unwrap())
        .unwrap()
}

async fn vote(app: &Router, token: &str, poll_id: &str, option_id: &str) -> (StatusCode, Value) {
    send(
        app,
        Method::POST,
        &format!("/api/polls/{poll_id}/vote"),
        Some(token),
        Some(json!({ "optionId": option_id })),
    )
    .await
}

// -----------------------------------------------------------------------
// Health and fallback
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_root_reports_running() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["message"], "Voting System API is running");
}

#[tokio::test]
async fn test_unknown_route_is_json_404() {
    let app = test_app();
    let (status, body) = send(&app, Method::GET, "/api/nowhere", None, None).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

// -----------------------------------------------------------------------
// Registration and login
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_register_defaults_to_user_role() {
    let app = test_app();
    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada", "email": "ada@example.com", "password": "secret-pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["role"], "user");
    assert_eq!(body["email"], "ada@example.com");
    assert!(body["token"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body.get("passwordHash").is_none());
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_duplicate_email_is_rejected() {
    let app = test_app();
    register(&app, "Ada", "ada@example.com", "user").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({ "name": "Ada 2", "email": "ada@example.com", "password": "other-pw" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User already exists");
}

#[tokio::test]
async fn test_register_validates_fields() {
    let app = test_app();
    for payload in [
        json!({ "name": " ", "email": "a@example.com", "password": "secret-pw" }),
        json!({ "name": "Ada", "email": "not-an-email", "password": "secret-pw" }),
        json!({ "name": "Ada", "email": "a@example.com", "password": "123" }),
    ] {
        let (status, body) =
            send(&app, Method::POST, "/api/auth/register", None, Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_login_checks_password() {
    let app = test_app();
    let (id, _) = register(&app, "Ada", "ada@example.com", "user").await;

    let (status, body) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], id.as_str());

    let token = body["token"].as_str().unwrap().to_string();
    let (status, _) = send(&app, Method::GET, "/api/polls", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "ada@example.com", "password": "wrong-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(
        &app,
        Method::POST,
        "/api/auth/login",
        None,
        Some(json!({ "email": "nobody@example.com", "password": "secret-pw" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -----------------------------------------------------------------------
// Authentication and access policy
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_missing_or_bad_token_is_unauthorized() {
    let app = test_app();

    let (status, body) = send(&app, Method::GET, "/api/polls", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "AUTHENTICATION_ERROR");

    let (status, _) = send(&app, Method::GET, "/api/polls", Some("garbage"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, Method::GET, "/api/reports/feed", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_regular_user_is_forbidden_admin_actions() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, user_token) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_uri = format!("/api/polls/{}", poll["id"].as_str().unwrap());

    let attempts = [
        (
            Method::POST,
            "/api/polls".to_string(),
            Some(json!({ "title": "x", "description": "y", "options": ["a", "b"], "endDate": "2099-01-01" })),
        ),
        (Method::PUT, poll_uri.clone(), Some(json!({ "title": "hijacked" }))),
        (Method::DELETE, poll_uri.clone(), None),
        (Method::GET, "/api/auth/users".to_string(), None),
        (Method::DELETE, "/api/auth/users/anyone".to_string(), None),
        (Method::GET, "/api/reports/summary".to_string(), None),
    ];

    for (method, uri, body) in attempts {
        let (status, response) = send(&app, method.clone(), &uri, Some(&user_token), body).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(response["error"], "AUTHORIZATION_ERROR");
    }

    let (status, body) = send(&app, Method::GET, &poll_uri, Some(&user_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["title"], "T");
}

#[tokio::test]
async fn test_removed_user_token_stops_working() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (user_id, user_token) = register(&app, "Ada", "ada@example.com", "user").await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/auth/users/{user_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User removed");

    let (status, _) = send(&app, Method::GET, "/api/polls", Some(&user_token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

// -----------------------------------------------------------------------
// Users
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_admin_cannot_be_deleted() {
    let app = test_app();
    let (admin_id, admin_token) = register(&app, "Root", "root@example.com", "admin").await;

    let (status, body) = send(
        &app,
        Method::DELETE,
        &format!("/api/auth/users/{admin_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CONFLICT");

    let (status, _) = send(
        &app,
        Method::DELETE,
        "/api/auth/users/does-not-exist",
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_admin_lists_users_without_hashes() {
    let app = test_app();
    let admin_token = admin(&app).await;
    register(&app, "Ada", "ada@example.com", "user").await;

    let (status, body) = send(&app, Method::GET, "/api/auth/users", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);

    let users = body.as_array().unwrap();
    assert_eq!(users.len(), 2);
    for user in users {
        assert!(user.get("passwordHash").is_none());
        assert!(user["email"].is_string());
    }
}

// -----------------------------------------------------------------------
// Polls
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_create_poll_validates_options() {
    let app = test_app();
    let token = admin(&app).await;

    for options in [json!(["only"]), json!(["A", "A"]), json!(["A", "  "])] {
        let (status, body) = send(
            &app,
            Method::POST,
            "/api/polls",
            Some(&token),
            Some(json!({ "title": "T", "description": "D", "options": options, "endDate": "2099-01-01" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }
}

#[tokio::test]
async fn test_created_poll_shape() {
    let app = test_app();
    let token = admin(&app).await;
    let poll = create_poll(&app, &token, Utc::now() + Duration::days(1)).await;

    assert_eq!(poll["status"], "active");
    assert_eq!(poll["totalVotes"], 0);
    assert_eq!(poll["acceptingVotes"], true);
    assert_eq!(poll["hasVoted"], false);
    assert_eq!(poll["createdBy"]["name"], "Root");
    assert_eq!(votes_for(&poll, "A"), 0);
    assert_eq!(votes_for(&poll, "B"), 0);
}

#[tokio::test]
async fn test_two_users_vote_for_same_option() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, first) = register(&app, "Ada", "ada@example.com", "user").await;
    let (_, second) = register(&app, "Bob", "bob@example.com", "user").await;
    let (_, bystander) = register(&app, "Cy", "cy@example.com", "user").await;

    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap();
    let a = option_id(&poll, "A");

    for token in [&first, &second] {
        let (status, body) = vote(&app, token, poll_id, &a).await;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(body["message"], "Vote registered");
    }

    for token in [&first, &second] {
        let (status, body) =
            send(&app, Method::GET, &format!("/api/polls/{poll_id}"), Some(token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(votes_for(&body, "A"), 2);
        assert_eq!(votes_for(&body, "B"), 0);
        assert_eq!(body["totalVotes"], 2);
        assert_eq!(body["hasVoted"], true);
    }

    let (_, listed) = send(&app, Method::GET, "/api/polls", Some(&bystander), None).await;
    assert_eq!(listed[0]["hasVoted"], false);
    let (_, listed) = send(&app, Method::GET, "/api/polls", Some(&first), None).await;
    assert_eq!(listed[0]["hasVoted"], true);
}

#[tokio::test]
async fn test_second_vote_by_same_user_is_conflict() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap();

    let (status, _) = vote(&app, &voter, poll_id, &option_id(&poll, "A")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = vote(&app, &voter, poll_id, &option_id(&poll, "B")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "CONFLICT");
    assert_eq!(body["message"], "You have already voted in this poll");

    let (_, poll) =
        send(&app, Method::GET, &format!("/api/polls/{poll_id}"), Some(&voter), None).await;
    assert_eq!(votes_for(&poll, "A"), 1);
    assert_eq!(votes_for(&poll, "B"), 0);
}

#[tokio::test]
async fn test_expired_poll_rejects_votes() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() - Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap();

    assert_eq!(poll["status"], "active");
    assert_eq!(poll["acceptingVotes"], false);

    let (status, body) = vote(&app, &voter, poll_id, &option_id(&poll, "A")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Poll is closed");

    let (_, poll) =
        send(&app, Method::GET, &format!("/api/polls/{poll_id}"), Some(&voter), None).await;
    assert_eq!(poll["totalVotes"], 0);
}

#[tokio::test]
async fn test_closed_poll_rejects_votes() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(30)).await;
    let poll_id = poll["id"].as_str().unwrap();

    let (status, closed) = send(
        &app,
        Method::PUT,
        &format!("/api/polls/{poll_id}"),
        Some(&admin_token),
        Some(json!({ "status": "closed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(closed["status"], "closed");

    let (status, _) = vote(&app, &voter, poll_id, &option_id(&poll, "A")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_missing_poll_and_option_are_not_found() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap();

    let (status, body) = vote(&app, &voter, poll_id, "no-such-option").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Option not found");

    let (status, body) = vote(&app, &voter, "no-such-poll", &option_id(&poll, "A")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Poll not found");

    let (status, _) =
        send(&app, Method::GET, "/api/polls/no-such-poll", Some(&voter), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_update_overwrites_only_supplied_fields() {
    let app = test_app();
    let token = admin(&app).await;
    let poll = create_poll(&app, &token, Utc::now() + Duration::days(1)).await;
    let uri = format!("/api/polls/{}", poll["id"].as_str().unwrap());

    let (status, updated) = send(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "title": "Renamed" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["title"], "Renamed");
    assert_eq!(updated["description"], poll["description"]);
    assert_eq!(updated["status"], poll["status"]);
    assert_eq!(updated["endDate"], poll["endDate"]);

    let (status, _) = send(&app, Method::PUT, &uri, Some(&token), Some(json!({ "title": "" }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        Method::PUT,
        "/api/polls/missing",
        Some(&token),
        Some(json!({ "title": "x" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_poll() {
    let app = test_app();
    let token = admin(&app).await;
    let poll = create_poll(&app, &token, Utc::now() + Duration::days(1)).await;
    let uri = format!("/api/polls/{}", poll["id"].as_str().unwrap());

    let (status, body) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Poll removed");

    let (status, _) = send(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = send(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_votes_are_all_counted() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap().to_string();
    let a = option_id(&poll, "A");

    let mut tokens = Vec::new();
    for n in 0..20 {
        let (_, token) = register(&app, "Voter", &format!("voter{n}@example.com"), "user").await;
        tokens.push(token);
    }

    let tasks: Vec<_> = tokens
        .into_iter()
        .map(|token| {
            let app = app.clone();
            let poll_id = poll_id.clone();
            let a = a.clone();
            tokio::spawn(async move { vote(&app, &token, &poll_id, &a).await.0 })
        })
        .collect();
    for task in tasks {
        assert_eq!(task.await.unwrap(), StatusCode::OK);
    }

    let (_, poll) = send(
        &app,
        Method::GET,
        &format!("/api/polls/{poll_id}"),
        Some(&admin_token),
        None,
    )
    .await;
    assert_eq!(votes_for(&poll, "A"), 20);
    assert_eq!(poll["totalVotes"], 20);
}

// -----------------------------------------------------------------------
// Reports
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_summary_aggregates_polls_and_votes() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    register(&app, "Bob", "bob@example.com", "user").await;

    let open = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let closed = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let open_id = open["id"].as_str().unwrap();

    vote(&app, &voter, open_id, &option_id(&open, "B")).await;
    send(
        &app,
        Method::PUT,
        &format!("/api/polls/{}", closed["id"].as_str().unwrap()),
        Some(&admin_token),
        Some(json!({ "status": "closed" })),
    )
    .await;

    let (status, summary) =
        send(&app, Method::GET, "/api/reports/summary", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(summary["totalPolls"], 2);
    assert_eq!(summary["activePolls"], 1);
    assert_eq!(summary["totalUsers"], 2);
    assert_eq!(summary["totalVotes"], 1);

    let stats = summary["pollStats"].as_array().unwrap();
    let open_stat = stats.iter().find(|stat| stat["id"] == open_id).unwrap();
    assert_eq!(open_stat["totalVotes"], 1);
    assert_eq!(open_stat["status"], "active");
}

#[tokio::test]
async fn test_feed_is_newest_first_and_limited() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;

    let mut ids = Vec::new();
    for _ in 0..4 {
        let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
        ids.push(poll["id"].as_str().unwrap().to_string());
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let (status, feed) = send(&app, Method::GET, "/api/reports/feed", Some(&voter), None).await;
    assert_eq!(status, StatusCode::OK);

    let feed_ids: Vec<&str> = feed
        .as_array()
        .unwrap()
        .iter()
        .map(|poll| poll["id"].as_str().unwrap())
        .collect();
    assert_eq!(feed_ids, vec![ids[3].as_str(), ids[2].as_str(), ids[1].as_str()]);
}

// -----------------------------------------------------------------------
// Malformed bodies
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_malformed_bodies_are_validation_errors() {
    let app = test_app();
    let admin_token = admin(&app).await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap();

    let cases = [
        (Method::POST, format!("/api/polls/{poll_id}/vote"), voter.clone(), json!({})),
        (
            Method::POST,
            "/api/auth/register".to_string(),
            voter.clone(),
            json!({ "name": "Bob", "password": "secret-pw" }),
        ),
        (
            Method::PUT,
            format!("/api/polls/{poll_id}"),
            admin_token.clone(),
            json!({ "status": "paused" }),
        ),
        (
            Method::POST,
            "/api/polls".to_string(),
            admin_token.clone(),
            json!({ "title": "T", "options": ["A", "B"] }),
        ),
    ];
    for (method, uri, token, payload) in cases {
        let (status, body) = send(&app, method, &uri, Some(&token), Some(payload)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}: {body}");
        assert_eq!(body["error"], "VALIDATION_ERROR", "{uri}");
    }

    // Unparsable JSON and a missing content type.
    for (content_type, raw) in [(Some("application/json"), "{\"optionId\":"), (None, "{}")] {
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(format!("/api/polls/{poll_id}/vote"))
            .header(header::AUTHORIZATION, format!("Bearer {voter}"));
        if let Some(content_type) = content_type {
            builder = builder.header(header::CONTENT_TYPE, content_type);
        }
        let response = app
            .clone()
            .oneshot(builder.body(Body::from(raw)).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "VALIDATION_ERROR");
    }

    let (_, fetched) =
        send(&app, Method::GET, &format!("/api/polls/{poll_id}"), Some(&voter), None).await;
    assert_eq!(fetched["totalVotes"], 0);
}

// -----------------------------------------------------------------------
// Store failures after a committed vote
// -----------------------------------------------------------------------

/// Memory user store that times out lookups of one chosen user.
#[derive(Default)]
struct FlakyUserStore {
    inner: MemoryUserStore,
    unreachable: Mutex<Option<String>>,
}

#[async_trait::async_trait]
impl UserStore for FlakyUserStore {
    async fn create(&self, user: NewUser) -> StoreResult<User> {
        self.inner.create(user).await
    }

    async fn find_by_id(&self, id: &str) -> StoreResult<Option<User>> {
        let unreachable = self.unreachable.lock().unwrap().as_deref() == Some(id);
        if unreachable {
            return Err(StoreError::Timeout(std::time::Duration::from_millis(5)));
        }
        self.inner.find_by_id(id).await
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.inner.find_by_email(email).await
    }

    async fn list(&self) -> StoreResult<Vec<User>> {
        self.inner.list().await
    }

    async fn remove(&self, id: &str) -> StoreResult<User> {
        self.inner.remove(id).await
    }

    async fn count_by_role(&self, role: Role) -> StoreResult<u64> {
        self.inner.count_by_role(role).await
    }
}

#[tokio::test]
async fn test_committed_vote_survives_creator_lookup_failure() {
    let users = Arc::new(FlakyUserStore::default());
    let config = Config {
        bcrypt_cost: 4,
        ..Config::default()
    };
    let app = routes::app(AppState::new(
        users.clone(),
        Arc::new(MemoryPollStore::new()),
        config,
    ));

    let (admin_id, admin_token) = register(&app, "Root", "root@example.com", "admin").await;
    let (_, voter) = register(&app, "Ada", "ada@example.com", "user").await;
    let poll = create_poll(&app, &admin_token, Utc::now() + Duration::days(1)).await;
    let poll_id = poll["id"].as_str().unwrap();
    let a = option_id(&poll, "A");

    *users.unreachable.lock().unwrap() = Some(admin_id.clone());

    let (status, body) = vote(&app, &voter, poll_id, &a).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["message"], "Vote registered");
    assert_eq!(body["poll"]["totalVotes"], 1);
    assert_eq!(body["poll"]["createdBy"]["id"], admin_id.as_str());
    assert_eq!(body["poll"]["createdBy"]["name"], Value::Null);

    *users.unreachable.lock().unwrap() = None;

    let (status, body) = vote(&app, &voter, poll_id, &a).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You have already voted in this poll");
}
