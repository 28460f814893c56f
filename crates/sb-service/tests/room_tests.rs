//! Integration tests for the room endpoints.
//!
//! Tests room lifecycle against a wiremock registry:
//! - Create (including defaults and non-idempotent "already exists")
//! - List
//! - Idempotent delete (absent room is success)
//! - Capacity checks (metadata override, unlimited rooms, fail-closed)
//!
//! # Test Setup
//!
//! Tests use wiremock to stand in for the provider's Twirp RoomService and
//! drive the router with `tower::ServiceExt::oneshot`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use sb_service::config::Config;
use sb_service::routes::{self, AppState};
use sb_service::services::{RegistryClient, SessionBroker, TokenIssuer};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tower::ServiceExt;
use wiremock::matchers::{body_partial_json, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Global metrics handle for test servers
static TEST_METRICS_HANDLE: OnceLock<metrics_exporter_prometheus::PrometheusHandle> =
    OnceLock::new();

fn test_metrics_handle() -> metrics_exporter_prometheus::PrometheusHandle {
    TEST_METRICS_HANDLE
        .get_or_init(|| {
            sb_service::observability::metrics::init_metrics_recorder().unwrap_or_else(|_| {
                metrics_exporter_prometheus::PrometheusBuilder::new()
                    .build_recorder()
                    .handle()
            })
        })
        .clone()
}

fn live_app(registry_url: &str) -> Router {
    let vars = HashMap::from([
        ("REGISTRY_URL".to_string(), registry_url.to_string()),
        ("REGISTRY_API_KEY".to_string(), "SWKEY_test".to_string()),
        ("REGISTRY_API_SECRET".to_string(), "integration-secret".to_string()),
    ]);
    let config = Config::from_vars(&vars);
    let registry = RegistryClient::from_mode(&config.mode).unwrap();
    let issuer = TokenIssuer::from_mode(&config.mode);
    let broker = SessionBroker::new(registry, issuer);
    let state = Arc::new(AppState { broker, config });
    routes::build_routes(state, test_metrics_handle())
}

async fn send(
    app: Router,
    method_name: &str,
    uri: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder().method(method_name).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(serde_json::to_vec(&json).unwrap())
        }
        None => Body::empty(),
    };

    let response = app.oneshot(builder.body(body).unwrap()).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// ============================================================================
// Create Room
// ============================================================================

#[tokio::test]
async fn test_create_room_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/CreateRoom"))
        .and(header_exists("Authorization"))
        .and(body_partial_json(serde_json::json!({
            "name": "study-hall",
            "maxParticipants": 2,
            "emptyTimeout": 300
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "study-hall",
            "emptyTimeout": 300,
            "maxParticipants": 2,
            "numParticipants": 0,
            "metadata": ""
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "POST",
        "/api/v1/rooms",
        Some(serde_json::json!({"room": "study-hall"})),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Room study-hall created successfully");
    assert_eq!(body["room"]["name"], "study-hall");
    assert_eq!(body["room"]["status"], "created");
    assert_eq!(body["room"]["max_participants"], 2);
    assert_eq!(body["room"]["empty_timeout"], 300);
}

#[tokio::test]
async fn test_create_room_honors_explicit_settings() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/CreateRoom"))
        .and(body_partial_json(serde_json::json!({
            "name": "big-room",
            "maxParticipants": 10,
            "emptyTimeout": 60,
            "metadata": "{\"topic\": \"algebra\"}"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "name": "big-room",
            "emptyTimeout": 60,
            "maxParticipants": 10,
            "numParticipants": 0,
            "metadata": "{\"topic\": \"algebra\"}"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "POST",
        "/api/v1/rooms",
        Some(serde_json::json!({
            "room": "big-room",
            "max_participants": 10,
            "empty_timeout": 60,
            "metadata": "{\"topic\": \"algebra\"}"
        })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["room"]["max_participants"], 10);
    assert_eq!(body["room"]["metadata"], "{\"topic\": \"algebra\"}");
}

#[tokio::test]
async fn test_create_room_missing_name_is_400_with_no_registry_call() {
    let server = MockServer::start().await;
    // No side effects allowed: the registry must never be called
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/CreateRoom"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "POST",
        "/api/v1/rooms",
        Some(serde_json::json!({"max_participants": 5})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "error");
    assert_eq!(body["error"], "room name is required");
}

#[tokio::test]
async fn test_create_room_already_exists_surfaces_as_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/CreateRoom"))
        .respond_with(ResponseTemplate::new(409).set_body_json(serde_json::json!({
            "code": "already_exists",
            "msg": "room study-hall already exists"
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "POST",
        "/api/v1/rooms",
        Some(serde_json::json!({"room": "study-hall"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().unwrap().contains("already exists"));
}

// ============================================================================
// List Rooms
// ============================================================================

#[tokio::test]
async fn test_list_rooms_returns_names() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/ListRooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "rooms": [
                {"name": "alpha", "numParticipants": 2},
                {"name": "beta", "numParticipants": 0}
            ]
        })))
        .mount(&server)
        .await;

    let (status, body) = send(live_app(&server.uri()), "GET", "/api/v1/rooms", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["rooms"], serde_json::json!(["alpha", "beta"]));
}

#[tokio::test]
async fn test_list_rooms_registry_down_is_503() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/ListRooms"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = send(live_app(&server.uri()), "GET", "/api/v1/rooms", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "error");
}

// ============================================================================
// Delete Room (idempotent)
// ============================================================================

#[tokio::test]
async fn test_delete_room_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/DeleteRoom"))
        .and(body_partial_json(serde_json::json!({"room": "old-room"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "DELETE",
        "/api/v1/rooms/old-room",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(body["message"], "Room old-room deleted successfully");
}

#[tokio::test]
async fn test_delete_absent_room_is_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/DeleteRoom"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "code": "not_found",
            "msg": "requested room does not exist"
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "DELETE",
        "/api/v1/rooms/ghost-room",
        None,
    )
    .await;

    // Idempotence law: Delete; Delete both succeed
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
    assert_eq!(
        body["message"],
        "Room ghost-room was already deleted or does not exist"
    );
}

#[tokio::test]
async fn test_delete_room_free_text_not_found_is_success() {
    let server = MockServer::start().await;
    // Some providers only return free text; the message fallback applies
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/DeleteRoom"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "code": "internal",
            "msg": "Room Not Found"
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "DELETE",
        "/api/v1/rooms/ghost-room",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_delete_room_other_error_surfaces() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/DeleteRoom"))
        .respond_with(ResponseTemplate::new(403).set_body_json(serde_json::json!({
            "code": "permission_denied",
            "msg": "insufficient grants"
        })))
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "DELETE",
        "/api/v1/rooms/protected-room",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["status"], "error");
}

// ============================================================================
// Capacity
// ============================================================================

fn capacity_mock(room_json: serde_json::Value) -> Mock {
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/ListRooms"))
        .and(body_partial_json(serde_json::json!({"names": ["the-room"]})))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({"rooms": [room_json]})),
        )
}

#[tokio::test]
async fn test_capacity_below_limit_can_join() {
    let server = MockServer::start().await;
    capacity_mock(serde_json::json!({
        "name": "the-room",
        "maxParticipants": 2,
        "numParticipants": 1
    }))
    .mount(&server)
    .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/the-room/capacity",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_join"], true);
    assert_eq!(body["current_participants"], 1);
    assert_eq!(body["max_participants"], 2);
    assert_eq!(body["status"], "success");
}

#[tokio::test]
async fn test_capacity_full_room_cannot_join() {
    let server = MockServer::start().await;
    capacity_mock(serde_json::json!({
        "name": "the-room",
        "maxParticipants": 2,
        "numParticipants": 2
    }))
    .mount(&server)
    .await;

    let (_, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/the-room/capacity",
        None,
    )
    .await;

    assert_eq!(body["can_join"], false);
    assert_eq!(body["current_participants"], 2);
}

#[tokio::test]
async fn test_capacity_metadata_overrides_declared_max() {
    let server = MockServer::start().await;
    capacity_mock(serde_json::json!({
        "name": "the-room",
        "maxParticipants": 20,
        "numParticipants": 4,
        "metadata": "{\"max_participants\": 5}"
    }))
    .mount(&server)
    .await;

    let (_, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/the-room/capacity",
        None,
    )
    .await;

    assert_eq!(body["max_participants"], 5);
    assert_eq!(body["can_join"], true);
}

#[tokio::test]
async fn test_capacity_malformed_metadata_falls_back() {
    let server = MockServer::start().await;
    capacity_mock(serde_json::json!({
        "name": "the-room",
        "maxParticipants": 20,
        "numParticipants": 4,
        "metadata": "{{{ not json"
    }))
    .mount(&server)
    .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/the-room/capacity",
        None,
    )
    .await;

    // Malformed metadata never aborts the decision
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["max_participants"], 20);
}

#[tokio::test]
async fn test_capacity_zero_max_is_unlimited() {
    let server = MockServer::start().await;
    capacity_mock(serde_json::json!({
        "name": "the-room",
        "maxParticipants": 0,
        "numParticipants": 250
    }))
    .mount(&server)
    .await;

    let (_, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/the-room/capacity",
        None,
    )
    .await;

    assert_eq!(body["can_join"], true);
    assert_eq!(body["max_participants"], 0);
}

#[tokio::test]
async fn test_capacity_absent_room_is_joinable_with_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/ListRooms"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"rooms": []})))
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/new-room/capacity",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["can_join"], true);
    assert_eq!(body["current_participants"], 0);
    assert_eq!(body["max_participants"], 2);
}

#[tokio::test]
async fn test_capacity_registry_error_fails_closed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/twirp/livekit.RoomService/ListRooms"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let (status, body) = send(
        live_app(&server.uri()),
        "GET",
        "/api/v1/rooms/the-room/capacity",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["can_join"], false);
    assert_eq!(body["current_participants"], 0);
    assert_eq!(body["max_participants"], 0);
    assert_eq!(body["status"], "error");
    assert!(body["error"].as_str().is_some());
}
