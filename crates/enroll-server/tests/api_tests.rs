//! Integration tests for the Enroll API endpoints.
//!
//! Most tests drive the Axum `Router` directly via `tower::ServiceExt`
//! without starting a TCP server. The startup and `WebSocket` tests bind a
//! real listener on an ephemeral port and talk to it over `TcpStream`.

#![allow(
    clippy::unwrap_used,
    clippy::indexing_slicing,
    clippy::arithmetic_side_effects
)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use enroll_server::config::default_activities;
use enroll_server::router::build_router;
use enroll_server::startup::spawn_server;
use enroll_server::{AppState, ServerConfig, ServiceConfig};
use enroll_store::RosterStore;
use enroll_types::{ActivitySpec, ParticipantId, RosterEventKind};
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tower::ServiceExt;

fn make_state(catalog: Vec<ActivitySpec>) -> Arc<AppState> {
    let store = RosterStore::new(catalog).unwrap();
    Arc::new(AppState::new(Arc::new(store), &ServiceConfig::default()))
}

fn school_state() -> Arc<AppState> {
    make_state(default_activities())
}

fn chess_state(capacity: usize) -> Arc<AppState> {
    make_state(vec![ActivitySpec::new("Chess Club", capacity)])
}

async fn send(router: Router, method: Method, uri: &str) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

async fn signup(state: &Arc<AppState>, activity: &str, email: &str) -> (StatusCode, Value) {
    let uri = format!("/activities/{activity}/signup?email={email}");
    send(build_router(Arc::clone(state)), Method::POST, &uri).await
}

async fn unregister(state: &Arc<AppState>, activity: &str, email: &str) -> (StatusCode, Value) {
    let uri = format!("/activities/{activity}/unregister?email={email}");
    send(build_router(Arc::clone(state)), Method::DELETE, &uri).await
}

fn loopback() -> ServerConfig {
    ServerConfig {
        host: String::from("127.0.0.1"),
        port: 0,
    }
}

async fn read_more(stream: &mut TcpStream, buf: &mut Vec<u8>) {
    let mut chunk = [0_u8; 4096];
    let n = stream.read(&mut chunk).await.unwrap();
    assert!(n > 0, "server closed the connection");
    buf.extend_from_slice(&chunk[..n]);
}

/// Perform the `WebSocket` handshake on `/ws/rosters`. Returns the stream
/// and any bytes already read past the response headers.
async fn open_roster_socket(addr: SocketAddr) -> (TcpStream, Vec<u8>) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /ws/rosters HTTP/1.1\r\n\
              Host: localhost\r\n\
              Connection: Upgrade\r\n\
              Upgrade: websocket\r\n\
              Sec-WebSocket-Version: 13\r\n\
              Sec-WebSocket-Key: dGhlIHNhbXBsZSBub25jZQ==\r\n\r\n",
        )
        .await
        .unwrap();

    let mut buf = Vec::new();
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        read_more(&mut stream, &mut buf).await;
    };
    let head = String::from_utf8_lossy(&buf[..header_end]).into_owned();
    assert!(head.starts_with("HTTP/1.1 101"), "handshake failed: {head}");
    buf.drain(..header_end);
    (stream, buf)
}

/// Read one server text frame (servers never mask) and parse it as JSON.
async fn read_text_frame(stream: &mut TcpStream, buf: &mut Vec<u8>) -> Value {
    loop {
        if buf.len() >= 2 {
            let header = match buf[1] & 0x7f {
                126 => (buf.len() >= 4)
                    .then(|| (usize::from(u16::from_be_bytes([buf[2], buf[3]])), 4)),
                127 => (buf.len() >= 10).then(|| {
                    let raw = <[u8; 8]>::try_from(&buf[2..10]).unwrap();
                    (usize::try_from(u64::from_be_bytes(raw)).unwrap(), 10)
                }),
                short => Some((usize::from(short), 2)),
            };
            if let Some((len, offset)) = header {
                if buf.len() >= offset + len {
                    assert_eq!(buf[0] & 0x0f, 0x1, "expected a text frame");
                    let frame: Vec<u8> = buf.drain(..offset + len).collect();
                    return serde_json::from_slice(&frame[offset..]).unwrap();
                }
            }
        }
        read_more(stream, buf).await;
    }
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_list_activities_returns_catalog_in_order() {
    let response = build_router(school_state())
        .oneshot(Request::get("/activities").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let raw = String::from_utf8(bytes.to_vec()).unwrap();
    let positions: Vec<usize> = default_activities()
        .iter()
        .map(|spec| raw.find(&format!("\"{}\":", spec.name)).unwrap())
        .collect();
    assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));

    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json.as_object().unwrap().len(), 9);

    let chess = &json["Chess Club"];
    assert_eq!(chess["max_participants"], 12);
    assert_eq!(chess["schedule"], "Fridays, 3:30 PM - 5:00 PM");
    assert_eq!(
        chess["participants"],
        serde_json::json!(["michael@mergington.edu", "daniel@mergington.edu"])
    );
}

#[tokio::test]
async fn test_responses_are_not_cacheable() {
    let response = build_router(school_state())
        .oneshot(Request::get("/activities").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.headers()["cache-control"], "no-store");
}

#[tokio::test]
async fn test_health_reports_totals() {
    let (status, json) = send(build_router(school_state()), Method::GET, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["activities"], 9);
    assert_eq!(json["enrolled"], 18);
}

#[tokio::test]
async fn test_signup_then_listed() {
    let state = school_state();
    let (status, json) = signup(&state, "Chess%20Club", "new@mergington.edu").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Signed up new@mergington.edu for Chess Club");

    let (_, listing) = send(build_router(state), Method::GET, "/activities").await;
    let participants = listing["Chess Club"]["participants"].as_array().unwrap();
    assert_eq!(participants.len(), 3);
    assert_eq!(participants[2], "new@mergington.edu");
}

#[tokio::test]
async fn test_duplicate_signup_is_bad_request() {
    let state = school_state();
    let (status, json) = signup(&state, "Chess%20Club", "michael@mergington.edu").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "already_registered");
    assert_eq!(json["detail"], "Student is already signed up for this activity");
    assert_eq!(json["status"], 400);
}

#[tokio::test]
async fn test_unknown_activity_is_not_found() {
    let state = school_state();
    let (status, json) = signup(&state, "Underwater%20Basket%20Weaving", "a@x.com").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_kind"], "activity_not_found");
    assert_eq!(json["message"], "Activity not found");

    let (status, _) = unregister(&state, "Nonexistent", "a@x.com").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_full_activity_rejects_signup() {
    let state = chess_state(2);
    assert_eq!(signup(&state, "Chess%20Club", "a@x.com").await.0, StatusCode::OK);
    assert_eq!(signup(&state, "Chess%20Club", "b@x.com").await.0, StatusCode::OK);

    let (status, json) = signup(&state, "Chess%20Club", "c@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "capacity_exceeded");
    assert_eq!(json["message"], "Activity is full");

    let (status, json) = unregister(&state, "Chess%20Club", "a@x.com").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["message"], "Unregistered a@x.com from Chess Club");

    assert_eq!(signup(&state, "Chess%20Club", "c@x.com").await.0, StatusCode::OK);
}

#[tokio::test]
async fn test_unregister_non_member_is_not_found() {
    let state = school_state();
    let (status, json) = unregister(&state, "Chess%20Club", "nobody@mergington.edu").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error_kind"], "not_registered");
    assert_eq!(json["message"], "Student is not signed up for this activity");
}

#[tokio::test]
async fn test_missing_or_blank_email_is_invalid_input() {
    let state = school_state();

    let router = build_router(Arc::clone(&state));
    let (status, json) = send(router, Method::POST, "/activities/Chess%20Club/signup").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "invalid_input");

    let (status, json) = signup(&state, "Chess%20Club", "%20%20").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "invalid_input");

    let (status, json) = unregister(&state, "Chess%20Club", "not-an-email").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "invalid_input");

    let (_, health) = send(build_router(state), Method::GET, "/health").await;
    assert_eq!(health["enrolled"], 18);
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let router = build_router(school_state());
    let response = router
        .oneshot(
            Request::get("/activities/Chess%20Club/signup?email=a@x.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_successful_requests_publish_events() {
    let state = chess_state(1);
    let mut rx = state.subscribe();

    signup(&state, "Chess%20Club", "a@x.com").await;
    signup(&state, "Chess%20Club", "b@x.com").await;
    unregister(&state, "Chess%20Club", "a@x.com").await;

    let joined = rx.recv().await.unwrap();
    assert_eq!(joined.kind, RosterEventKind::Registered);
    assert_eq!(joined.activity, "Chess Club");
    assert_eq!(joined.participant, ParticipantId::from("a@x.com"));

    let left = rx.recv().await.unwrap();
    assert_eq!(left.kind, RosterEventKind::Unregistered);
    assert_eq!(left.enrolled, 0);

    assert!(rx.try_recv().is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_signups_for_last_slot() {
    let state = chess_state(1);

    let requests = (0..16).map(|i| {
        let state = Arc::clone(&state);
        tokio::spawn(async move { signup(&state, "Chess%20Club", &format!("s{i}@x.com")).await })
    });
    let results = futures::future::join_all(requests).await;

    let statuses: Vec<StatusCode> = results.into_iter().map(|r| r.unwrap().0).collect();
    let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    assert_eq!(admitted, 1);
    assert!(
        statuses
            .iter()
            .all(|s| *s == StatusCode::OK || *s == StatusCode::BAD_REQUEST)
    );

    let (_, listing) = send(build_router(state), Method::GET, "/activities").await;
    assert_eq!(
        listing["Chess Club"]["participants"].as_array().unwrap().len(),
        1
    );
}

#[tokio::test]
async fn test_spawned_server_answers_over_tcp() {
    let handle = spawn_server(&loopback(), school_state()).await.unwrap();
    assert_ne!(handle.local_addr.port(), 0);

    let mut stream = TcpStream::connect(handle.local_addr)
        .await
        .unwrap();
    stream
        .write_all(b"GET /health HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let mut raw = Vec::new();
    stream.read_to_end(&mut raw).await.unwrap();
    let text = String::from_utf8_lossy(&raw);

    assert!(text.starts_with("HTTP/1.1 200 OK"));
    assert!(text.contains("\"status\":\"ok\""));

    handle.task.abort();
}

#[tokio::test]
async fn test_spawn_rejects_taken_port() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let config = ServerConfig {
        host: String::from("127.0.0.1"),
        port: listener.local_addr().unwrap().port(),
    };

    assert!(spawn_server(&config, school_state()).await.is_err());
}

#[tokio::test]
async fn test_repeated_email_is_invalid_input() {
    let state = school_state();
    let (status, json) = signup(&state, "Chess%20Club", "a@x.com&email=b@x.com").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "invalid_input");
    assert_eq!(json["status"], 400);

    let (status, json) = unregister(&state, "Chess%20Club", "a@x.com&email=b@x.com").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error_kind"], "invalid_input");

    let (_, health) = send(build_router(state), Method::GET, "/health").await;
    assert_eq!(health["enrolled"], 18);
}

#[tokio::test]
async fn test_roster_socket_sends_snapshot_then_events() {
    let state = chess_state(2);
    let handle = spawn_server(&loopback(), Arc::clone(&state)).await.unwrap();

    tokio::time::timeout(Duration::from_secs(10), async {
        let (mut stream, mut buf) = open_roster_socket(handle.local_addr).await;

        let snapshot = read_text_frame(&mut stream, &mut buf).await;
        assert_eq!(snapshot["type"], "snapshot");
        assert_eq!(snapshot["activities"]["Chess Club"]["max_participants"], 2);
        assert_eq!(
            snapshot["activities"]["Chess Club"]["participants"],
            serde_json::json!([])
        );

        // The socket subscribed before sending its snapshot, so a change
        // made after the snapshot arrived is always delivered.
        assert!(state.service.handle_register("Chess Club", "a@x.com").is_success());
        let joined = read_text_frame(&mut stream, &mut buf).await;
        assert_eq!(joined["type"], "event");
        assert_eq!(joined["kind"], "registered");
        assert_eq!(joined["activity"], "Chess Club");
        assert_eq!(joined["participant"], "a@x.com");
        assert_eq!(joined["enrolled"], 1);
        assert_eq!(joined["capacity"], 2);

        // Rejected requests publish nothing; the next frame is the withdrawal.
        assert!(!state.service.handle_register("Chess Club", "a@x.com").is_success());
        assert!(state.service.handle_unregister("Chess Club", "a@x.com").is_success());
        let left = read_text_frame(&mut stream, &mut buf).await;
        assert_eq!(left["type"], "event");
        assert_eq!(left["kind"], "unregistered");
        assert_eq!(left["enrolled"], 0);
    })
    .await
    .unwrap();

    handle.task.abort();
}
