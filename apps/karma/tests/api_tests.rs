//! Integration tests for the karma HTTP API.
//!
//! Uses axum-test to test the API handlers without starting a real server.

// Allow unwrap and panic in tests - these are standard for test code
#![allow(clippy::unwrap_used, clippy::panic)]

use axum::http::{HeaderValue, header};
use axum_test::TestServer;
use base64::Engine;
use karma::api::{
    AppState, ExportResponse, HealthResponse, LeaderboardResponse, MessageResponse, ScoreResponse,
    StatusResponse, TransfersResponse, UserKarmaResponse, create_router,
};
use karma::chat::Bot;
use karma::config::{KarmaConfig, ServerConfig};
use karma_core::{Direction, Ledger, ledger_from_bytes};
use serde_json::json;

// =============================================================================
// HELPER FUNCTIONS
// =============================================================================

fn in_memory_bot() -> Bot {
    Bot::new(Ledger::new(), &KarmaConfig::default())
}

/// Create a test server over a fresh in-memory ledger with the given guards.
fn server_with(server: ServerConfig) -> TestServer {
    let router = create_router(AppState::new(in_memory_bot()), &server);
    TestServer::new(router).unwrap()
}

/// Create a test server with default guards: no API key, 100 req/s.
fn create_test_server() -> TestServer {
    server_with(ServerConfig::default())
}

/// Create a test server that requires `api_key`.
fn create_auth_test_server(api_key: &str) -> TestServer {
    server_with(ServerConfig {
        api_key: Some(api_key.to_string()),
        ..ServerConfig::default()
    })
}

fn bearer(key: &str) -> HeaderValue {
    format!("Bearer {}", key).parse().unwrap()
}

/// Post one public chat line.
async fn say(server: &TestServer, user: &str, text: &str) -> MessageResponse {
    let response = server
        .post("/message")
        .json(&json!({ "user": user, "text": text }))
        .await;
    response.assert_status_ok();
    response.json()
}

/// Create a test server holding a→x:+1, b→x:+1, c→y:-1.
async fn create_populated_test_server() -> TestServer {
    let server = create_test_server();
    say(&server, "a", "x++").await;
    say(&server, "b", "x++").await;
    say(&server, "c", "y--").await;
    server
}

fn rows(board: &LeaderboardResponse) -> Vec<(String, i64)> {
    board
        .entries
        .iter()
        .map(|s| (s.user.to_string(), s.points))
        .collect()
}

// =============================================================================
// HEALTH ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let server = create_test_server();

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
    assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
}

// =============================================================================
// STATUS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_status_empty_ledger() {
    let server = create_test_server();

    let response = server.get("/status").await;

    response.assert_status_ok();
    let status: StatusResponse = response.json();
    assert!(!status.persistent);
    assert_eq!(status.transfer_count, 0);
    assert_eq!(status.receiver_count, 0);
}

#[tokio::test]
async fn test_status_populated_ledger() {
    let server = create_populated_test_server().await;

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.transfer_count, 3);
    assert_eq!(status.receiver_count, 2);
    assert_eq!(status.giver_count, 3);
}

// =============================================================================
// MESSAGE ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_message_records_karma_silently() {
    let server = create_test_server();

    let reply = say(&server, "dave", "thanks alice++ and (bob smith)--").await;
    assert!(reply.success);
    assert!(reply.replies.is_empty());

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.transfer_count, 2);
}

#[tokio::test]
async fn test_message_self_karma_notice() {
    let server = create_test_server();

    let reply = say(&server, "Carol", "carol++").await;
    assert_eq!(reply.replies, vec!["Nice try, no modifying your own karma"]);

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.transfer_count, 0);
}

#[tokio::test]
async fn test_message_directed_gives_no_karma() {
    let server = create_test_server();

    let response = server
        .post("/message")
        .json(&json!({ "user": "dave", "text": "alice++", "directed": true }))
        .await;
    response.assert_status_ok();

    let status: StatusResponse = server.get("/status").await.json();
    assert_eq!(status.transfer_count, 0);
}

#[tokio::test]
async fn test_message_command_replies() {
    let server = create_populated_test_server().await;

    let reply = say(&server, "z", "!karma --top").await;
    assert_eq!(reply.replies, vec!["y: -1", "x: 2"]);

    let reply = say(&server, "z", "!karma X").await;
    assert_eq!(reply.replies, vec!["x has 2 points"]);

    let reply = say(&server, "z", "!karma nobody").await;
    assert_eq!(reply.replies, vec!["No karma for nobody"]);
}

#[tokio::test]
async fn test_message_blank_user_rejected() {
    let server = create_test_server();

    let response = server
        .post("/message")
        .json(&json!({ "user": "  ", "text": "alice++" }))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let reply: MessageResponse = response.json();
    assert!(!reply.success);
    assert!(reply.error.is_some());
}

#[tokio::test]
async fn test_message_oversized_text_rejected() {
    let server = create_test_server();

    let text = format!("{} alice++", "x".repeat(70_000));
    let response = server
        .post("/message")
        .json(&json!({ "user": "dave", "text": text }))
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
}

// =============================================================================
// KARMA ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_top_is_ascending_with_highest_last() {
    let server = create_populated_test_server().await;

    let response = server.get("/karma/top").await;

    response.assert_status_ok();
    let board: LeaderboardResponse = response.json();
    assert_eq!(board.direction, Direction::Top);
    assert_eq!(
        rows(&board),
        vec![("y".to_string(), -1), ("x".to_string(), 2)]
    );
}

#[tokio::test]
async fn test_top_and_bottom_with_limit() {
    let server = create_populated_test_server().await;

    let top: LeaderboardResponse = server
        .get("/karma/top")
        .add_query_param("limit", 1)
        .await
        .json();
    assert_eq!(rows(&top), vec![("x".to_string(), 2)]);

    let bottom: LeaderboardResponse = server
        .get("/karma/bottom")
        .add_query_param("limit", 1)
        .await
        .json();
    assert_eq!(rows(&bottom), vec![("y".to_string(), -1)]);
}

#[tokio::test]
async fn test_leaderboard_limit_too_large() {
    let server = create_test_server();

    let response = server
        .get("/karma/top")
        .add_query_param("limit", 10_000)
        .await;

    assert_eq!(response.status_code().as_u16(), 400);
    let board: LeaderboardResponse = response.json();
    assert!(!board.success);
}

#[tokio::test]
async fn test_leaderboard_empty_ledger() {
    let server = create_test_server();

    let board: LeaderboardResponse = server.get("/karma/bottom").await.json();
    assert!(board.success);
    assert!(board.entries.is_empty());
}

#[tokio::test]
async fn test_giver_and_taker() {
    let server = create_populated_test_server().await;

    let giver: ScoreResponse = server.get("/karma/giver").await.json();
    assert!(giver.found);
    let giver = giver.score.unwrap();
    assert_eq!((giver.user.as_str(), giver.points), ("a", 1));

    let taker: ScoreResponse = server.get("/karma/taker").await.json();
    let taker = taker.score.unwrap();
    assert_eq!((taker.user.as_str(), taker.points), ("c", -1));
}

#[tokio::test]
async fn test_giver_and_taker_empty() {
    let server = create_test_server();

    let giver: ScoreResponse = server.get("/karma/giver").await.json();
    assert!(giver.success);
    assert!(!giver.found);

    let taker: ScoreResponse = server.get("/karma/taker").await.json();
    assert!(!taker.found);
}

#[tokio::test]
async fn test_user_lookup_is_case_insensitive() {
    let server = create_populated_test_server().await;

    let response = server.get("/karma/users/X").await;

    response.assert_status_ok();
    let user: UserKarmaResponse = response.json();
    assert_eq!(user.user.as_deref(), Some("x"));
    assert!(user.found);
    assert_eq!(user.points, 2);
}

#[tokio::test]
async fn test_user_lookup_with_space() {
    let server = create_test_server();
    say(&server, "dave", "(Bob Smith)++").await;

    let user: UserKarmaResponse = server.get("/karma/users/bob%20smith").await.json();
    assert!(user.found);
    assert_eq!(user.points, 1);
}

#[tokio::test]
async fn test_user_lookup_unknown() {
    let server = create_test_server();

    let user: UserKarmaResponse = server.get("/karma/users/ghost").await.json();
    assert!(user.success);
    assert!(!user.found);
    assert_eq!(user.points, 0);
}

// =============================================================================
// TRANSFERS ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_transfers_returns_most_recent() {
    let server = create_populated_test_server().await;

    let response = server
        .get("/transfers")
        .add_query_param("limit", 2)
        .await;

    response.assert_status_ok();
    let page: TransfersResponse = response.json();
    assert_eq!(page.total, 3);
    assert_eq!(page.transfers.len(), 2);
    assert_eq!(page.transfers[0].giver().as_str(), "b");
    assert_eq!(page.transfers[1].giver().as_str(), "c");
    assert_eq!(page.transfers[1].delta(), -1);
}

// =============================================================================
// EXPORT ENDPOINT TESTS
// =============================================================================

#[tokio::test]
async fn test_export_empty_ledger() {
    let server = create_test_server();

    let response = server.post("/export").await;

    response.assert_status_ok();
    let export: ExportResponse = response.json();
    assert!(export.success);
    assert_eq!(export.checksum.unwrap().len(), 64);
}

#[tokio::test]
async fn test_export_decodes_to_history() {
    let server = create_populated_test_server().await;

    let export: ExportResponse = server.post("/export").await.json();
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(export.data.unwrap())
        .unwrap();
    let transfers = ledger_from_bytes(&bytes).unwrap();

    assert_eq!(transfers.len(), 3);
    assert_eq!(transfers[0].receiver().as_str(), "x");
}

// =============================================================================
// ERROR HANDLING TESTS
// =============================================================================

#[tokio::test]
async fn test_404_on_unknown_endpoint() {
    let server = create_test_server();

    let response = server.get("/unknown").await;
    response.assert_status_not_found();
}

#[tokio::test]
async fn test_method_not_allowed() {
    let server = create_test_server();

    // /health is GET only
    let response = server.post("/health").await;
    assert_eq!(response.status_code().as_u16(), 405);
}

#[tokio::test]
async fn test_invalid_json_body() {
    let server = create_test_server();

    let response = server
        .post("/message")
        .text("not valid json")
        .content_type("application/json")
        .await;

    assert!(response.status_code().is_client_error());
}

// =============================================================================
// AUTHENTICATION TESTS
// =============================================================================

#[tokio::test]
async fn test_auth_valid_bearer_token() {
    let api_key = "test-secret-key-12345";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/karma/top")
        .add_header(header::AUTHORIZATION, bearer(api_key))
        .await;

    response.assert_status_ok();
    let board: LeaderboardResponse = response.json();
    assert!(board.success);
}

#[tokio::test]
async fn test_auth_valid_raw_token() {
    let api_key = "test-raw-key-67890";
    let server = create_auth_test_server(api_key);

    let response = server
        .get("/karma/users/alice")
        .add_header(header::AUTHORIZATION, api_key.parse::<HeaderValue>().unwrap())
        .await;

    response.assert_status_ok();
}

#[tokio::test]
async fn test_auth_invalid_token_rejected() {
    let server = create_auth_test_server("correct-key");

    let response = server
        .post("/message")
        .add_header(header::AUTHORIZATION, bearer("wrong-key"))
        .json(&json!({ "user": "dave", "text": "alice++" }))
        .await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Invalid token should return 401 Unauthorized"
    );
    assert_eq!(
        response.headers().get(header::WWW_AUTHENTICATE).unwrap(),
        "Bearer"
    );
}

#[tokio::test]
async fn test_auth_rejected_message_records_nothing() {
    let api_key = "correct-key";
    let server = create_auth_test_server(api_key);

    server
        .post("/message")
        .json(&json!({ "user": "dave", "text": "alice++" }))
        .await;

    let status: StatusResponse = server
        .get("/status")
        .add_header(header::AUTHORIZATION, bearer(api_key))
        .await
        .json();
    assert_eq!(status.transfer_count, 0);
}

#[tokio::test]
async fn test_auth_missing_header_rejected() {
    let server = create_auth_test_server("required-key");

    let response = server.get("/karma/giver").await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Missing Authorization header should return 401 Unauthorized"
    );
}

#[tokio::test]
async fn test_auth_every_protected_route() {
    let server = create_auth_test_server("required-key");

    for path in [
        "/status",
        "/karma/top",
        "/karma/bottom",
        "/karma/giver",
        "/karma/taker",
        "/karma/users/alice",
        "/transfers",
    ] {
        let response = server.get(path).await;
        assert_eq!(response.status_code().as_u16(), 401, "GET {} is protected", path);
    }
    let response = server.post("/export").await;
    assert_eq!(response.status_code().as_u16(), 401, "POST /export is protected");
}

#[tokio::test]
async fn test_auth_health_endpoint_is_public() {
    let server = create_auth_test_server("secret-key-for-bypass-test");

    let response = server.get("/health").await;

    response.assert_status_ok();
    let health: HealthResponse = response.json();
    assert_eq!(health.status, "ok");
}

#[tokio::test]
async fn test_auth_bearer_prefix_only_rejected() {
    let server = create_auth_test_server("actual-key");

    let response = server
        .get("/status")
        .add_header(header::AUTHORIZATION, "Bearer ".parse::<HeaderValue>().unwrap())
        .await;

    assert_eq!(
        response.status_code().as_u16(),
        401,
        "Bearer prefix with no key should return 401 Unauthorized"
    );
}

// =============================================================================
// RATE LIMIT TESTS
// =============================================================================

#[tokio::test]
async fn test_rate_limit_refuses_over_budget() {
    let server = server_with(ServerConfig {
        rate_limit: 2,
        ..ServerConfig::default()
    });

    server.get("/karma/top").await.assert_status_ok();
    server.get("/karma/taker").await.assert_status_ok();
    let response = server.get("/karma/top").await;

    assert_eq!(response.status_code().as_u16(), 429);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
}

#[tokio::test]
async fn test_rate_limit_zero_disables() {
    let server = server_with(ServerConfig {
        rate_limit: 0,
        ..ServerConfig::default()
    });

    for _ in 0..5 {
        server.get("/karma/bottom").await.assert_status_ok();
    }
}

// =============================================================================
// CORS TESTS
// =============================================================================

fn allowed_origin(response: &axum_test::TestResponse) -> Option<String> {
    response
        .headers()
        .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
        .map(|v| v.to_str().unwrap().to_string())
}

#[tokio::test]
async fn test_cors_default_allows_loopback_only() {
    let server = create_test_server();

    let local = server
        .get("/karma/top")
        .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:5173"))
        .await;
    assert_eq!(allowed_origin(&local).as_deref(), Some("http://localhost:5173"));

    let remote = server
        .get("/karma/top")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://evil.example"))
        .await;
    assert_eq!(allowed_origin(&remote), None);
}

#[tokio::test]
async fn test_cors_configured_origin() {
    let server = server_with(ServerConfig {
        cors_origins: vec!["https://chat.example.org".to_string()],
        ..ServerConfig::default()
    });

    let response = server
        .get("/karma/top")
        .add_header(header::ORIGIN, HeaderValue::from_static("https://chat.example.org"))
        .await;
    assert_eq!(
        allowed_origin(&response).as_deref(),
        Some("https://chat.example.org")
    );

    let local = server
        .get("/karma/top")
        .add_header(header::ORIGIN, HeaderValue::from_static("http://localhost:5173"))
        .await;
    assert_eq!(allowed_origin(&local), None);
}
