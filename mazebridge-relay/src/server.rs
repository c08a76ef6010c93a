//! HTTP surface of the relay: routes, CORS, and server startup.
//!
//! | Method    | Path         | Relayed command  | Body                         |
//! |-----------|--------------|------------------|------------------------------|
//! | `POST`    | `/join`      | `JOIN`           | `{"message": <reply>}`       |
//! | `GET`     | `/gameState` | `GET_GAME_STATE` | `{"gameState": <reply>}`     |
//! | `OPTIONS` | any          | none             | empty, CORS headers          |
//!
//! A failed relay call is reported as `null` in the body. The status code for
//! that case is configurable through [`FailureStatus`].

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use mazebridge_proto::{Command, GameStateResponse, JoinResponse};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};

use crate::backend::BackendClient;

/// HTTP status returned when the game server could not be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum FailureStatus {
    /// `200 OK` with a `null` field, what existing browser pages expect.
    #[default]
    Ok,
    /// `502 Bad Gateway` with a `null` field.
    BadGateway,
}

impl FailureStatus {
    /// The status code sent for a failed relay call.
    #[must_use]
    pub const fn status_code(self) -> StatusCode {
        match self {
            Self::Ok => StatusCode::OK,
            Self::BadGateway => StatusCode::BAD_GATEWAY,
        }
    }
}

/// Shared state for the HTTP handlers. Immutable after startup.
#[derive(Debug)]
pub struct BridgeState {
    backend: BackendClient,
    failure_status: FailureStatus,
}

impl BridgeState {
    /// Creates handler state that reports failures as `200` with `null`.
    #[must_use]
    pub const fn new(backend: BackendClient) -> Self {
        Self {
            backend,
            failure_status: FailureStatus::Ok,
        }
    }

    /// Creates handler state with an explicit failure status.
    #[must_use]
    pub const fn with_failure_status(backend: BackendClient, failure_status: FailureStatus) -> Self {
        Self {
            backend,
            failure_status,
        }
    }

    /// Serializes a relay outcome, picking the status from whether the call
    /// produced a reply.
    fn respond<T: Serialize>(&self, relayed: bool, body: T) -> Response {
        let status = if relayed {
            StatusCode::OK
        } else {
            self.failure_status.status_code()
        };
        (status, Json(body)).into_response()
    }
}

/// Permissive CORS: any origin, the three methods the page uses, and the
/// `Content-Type` request header. `OPTIONS` requests are answered here with
/// `200` and never reach a handler.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Builds the relay router with its CORS layer.
pub fn build_router(state: Arc<BridgeState>) -> axum::Router {
    axum::Router::new()
        .route("/join", post(join))
        .route("/gameState", get(game_state))
        .with_state(state)
        .layer(cors_layer())
}

/// `POST /join`. The request body (the page sends `{"name": ...}`) is ignored.
async fn join(State(state): State<Arc<BridgeState>>) -> Response {
    let reply = state.backend.send(Command::Join).await;
    tracing::info!(reply = ?reply, "join relayed");
    state.respond(reply.is_some(), JoinResponse::from(reply))
}

/// `GET /gameState`
async fn game_state(State(state): State<Arc<BridgeState>>) -> Response {
    let reply = state.backend.send(Command::GetGameState).await;
    state.respond(reply.is_some(), GameStateResponse::from(reply))
}

/// Starts the relay on the given address and returns the bound address and
/// a join handle. The server runs until the handle is aborted.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server(
    addr: &str,
    state: Arc<BridgeState>,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)> {
    start_server_with_shutdown(addr, state, std::future::pending()).await
}

/// Starts the relay and stops it gracefully once `shutdown` resolves.
///
/// In-flight relay calls are allowed to finish before the task exits.
///
/// # Errors
///
/// Returns an error if the TCP listener cannot bind to the given address.
pub async fn start_server_with_shutdown<F>(
    addr: &str,
    state: Arc<BridgeState>,
    shutdown: F,
) -> std::io::Result<(SocketAddr, tokio::task::JoinHandle<()>)>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown)
            .await
        {
            tracing::error!(error = %e, "relay server error");
        }
    });

    Ok((bound_addr, handle))
}

/// Starts the relay in-process for testing, pointed at `backend_addr`.
///
/// Binds to `127.0.0.1:0` (OS-assigned port).
#[cfg(test)]
pub async fn start_test_server(
    backend_addr: &str,
) -> (SocketAddr, tokio::task::JoinHandle<()>) {
    let backend = BackendClient::new(crate::backend::BackendConfig {
        addr: backend_addr.to_string(),
        timeout: std::time::Duration::from_secs(2),
        ..crate::backend::BackendConfig::default()
    });
    start_server("127.0.0.1:0", Arc::new(BridgeState::new(backend)))
        .await
        .expect("failed to start test server")
}
