// Test-specific lint overrides: integration tests use unwrap/expect freely,
// and some pedantic/nursery lints are not appropriate for test code.
#![allow(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::doc_markdown,
    clippy::future_not_send,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Integration tests for game server failures.
//!
//! Every failure kind (refused, hang-up, silence) must surface to the page as
//! a `null` field, with the status picked by the configured failure status,
//! and must never leave the HTTP request hanging past the relay timeout.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Body;
use axum::http::{Method, Request, StatusCode};
use clap::Parser;
use mazebridge_relay::backend::{BackendClient, BackendConfig, ReadMode};
use mazebridge_relay::config::{RelayCliArgs, RelayConfig};
use mazebridge_relay::server::{self, BridgeState, FailureStatus};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// Returns an address nothing is listening on.
async fn dead_addr() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    drop(listener);
    addr
}

/// A game server that accepts connections and never writes anything.
async fn silent_game_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });
    addr
}

/// A game server that closes every connection without replying.
async fn hang_up_game_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap().to_string();
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let _ = socket.shutdown().await;
        }
    });
    addr
}

fn router(backend: BackendConfig, failure_status: FailureStatus) -> axum::Router {
    server::build_router(Arc::new(BridgeState::with_failure_status(
        BackendClient::new(backend),
        failure_status,
    )))
}

async fn request(app: axum::Router, method: Method, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    let status = resp.status();
    let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, String::from_utf8_lossy(&body).into_owned())
}

#[tokio::test]
async fn refused_connection_yields_null_message() {
    let backend = BackendConfig {
        addr: dead_addr().await,
        ..BackendConfig::default()
    };
    let (status, body) = request(router(backend, FailureStatus::Ok), Method::POST, "/join").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":null}"#);
}

#[tokio::test]
async fn hang_up_yields_null_game_state() {
    let backend = BackendConfig {
        addr: hang_up_game_server().await,
        ..BackendConfig::default()
    };
    let (status, body) =
        request(router(backend, FailureStatus::Ok), Method::GET, "/gameState").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"gameState":null}"#);
}

#[tokio::test]
async fn silent_game_server_is_bounded_by_timeout() {
    let backend = BackendConfig {
        addr: silent_game_server().await,
        timeout: Duration::from_millis(200),
        ..BackendConfig::default()
    };

    let started = Instant::now();
    let (status, body) =
        request(router(backend, FailureStatus::Ok), Method::GET, "/gameState").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"gameState":null}"#);
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "request took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn until_eof_mode_also_times_out_on_silence() {
    let backend = BackendConfig {
        addr: silent_game_server().await,
        timeout: Duration::from_millis(200),
        read_mode: ReadMode::UntilEof,
        ..BackendConfig::default()
    };
    let (_, body) = request(router(backend, FailureStatus::Ok), Method::POST, "/join").await;
    assert_eq!(body, r#"{"message":null}"#);
}

#[tokio::test]
async fn bad_gateway_status_when_configured() {
    let backend = BackendConfig {
        addr: dead_addr().await,
        ..BackendConfig::default()
    };
    let app = router(backend, FailureStatus::BadGateway);

    let (status, body) = request(app.clone(), Method::POST, "/join").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"message":null}"#);

    let (status, body) = request(app, Method::GET, "/gameState").await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, r#"{"gameState":null}"#);
}

#[tokio::test]
async fn config_file_drives_failure_status() {
    let path = std::env::temp_dir().join(format!(
        "mazebridge-failures-{}.toml",
        std::process::id()
    ));
    let dead = dead_addr().await;
    std::fs::write(
        &path,
        format!(
            "[server]\nfailure_status = \"bad_gateway\"\n\n[backend]\naddr = \"{dead}\"\ntimeout_ms = 500\n"
        ),
    )
    .unwrap();

    let cli = RelayCliArgs::parse_from(["mazebridge-relay", "--config", path.to_str().unwrap()]);
    let config = RelayConfig::load(&cli).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(config.backend_addr, dead);
    assert_eq!(config.backend_timeout, Duration::from_millis(500));

    let (status, _) = request(
        router(config.backend_config(), config.failure_status),
        Method::POST,
        "/join",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
