//! In-process dashboard API used by the integration tests.
//!
//! Serves the REST routes with cookie sessions and a minimal Socket.IO
//! endpoint that confirms every subscribed login code.
#![allow(clippy::unwrap_used, clippy::expect_used, dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{any, get, post},
};
use parking_lot::Mutex;
use serde_json::{Value, json};

/// How the socket endpoint ends a connection after answering a subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HangUp {
    /// Closes the websocket; the client should reconnect on its own.
    Transport,
    /// Sends a namespace disconnect; the client stops reconnecting.
    Namespace,
}

/// Server-side session bookkeeping shared with the tests.
#[derive(Default)]
pub struct ServerState {
    /// Access token currently accepted by protected routes.
    pub valid_access: Mutex<String>,
    /// Number of refresh calls received.
    pub refresh_calls: AtomicUsize,
    /// Codes subscribed over the socket.
    pub subscriptions: Mutex<Vec<String>>,
    /// Status pushed for every subscribed code.
    pub push_status: Mutex<String>,
    /// Delay applied to refresh responses.
    pub refresh_delay_ms: Mutex<u64>,
    /// Ends the next socket connection after its first subscription.
    pub hang_up_once: Mutex<Option<HangUp>>,
    /// Number of socket connections accepted.
    pub socket_connections: AtomicUsize,
}

impl ServerState {
    /// Invalidates the current access token; the refresh cookie stays valid.
    pub fn expire_access(&self) {
        *self.valid_access.lock() = "expired".to_string();
    }
}

/// A running test server.
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<ServerState>,
}

impl TestServer {
    /// Base URL of the server.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

/// Starts the server on an ephemeral port.
pub async fn spawn_server() -> TestServer {
    let state = Arc::new(ServerState {
        push_status: Mutex::new("CONFIRMED".to_string()),
        ..ServerState::default()
    });

    let app = Router::new()
        .route("/api/auth/qr-code/generate", post(generate))
        .route("/api/auth/qr-code/login", post(login))
        .route("/api/auth/refresh", post(refresh))
        .route("/api/users/me", get(me))
        .route("/socket.io/", any(socket))
        .with_state(Arc::clone(&state));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer { addr, state }
}

fn cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.to_string())
}

fn with_cookies(status: StatusCode, cookies: &[&str], body: Value) -> Response {
    let mut response = (status, Json(body)).into_response();
    for cookie in cookies {
        response
            .headers_mut()
            .append(header::SET_COOKIE, cookie.parse().unwrap());
    }
    response
}

async fn generate() -> Json<Value> {
    let expires_at = chrono::Utc::now() + chrono::Duration::seconds(30);
    Json(json!({ "code": "abc", "expiresAt": expires_at.to_rfc3339() }))
}

async fn login(State(state): State<Arc<ServerState>>, Json(body): Json<Value>) -> Response {
    if body["code"] != "abc" {
        return (StatusCode::BAD_REQUEST, Json(json!({"message": "unknown code"}))).into_response();
    }
    *state.valid_access.lock() = "access-1".to_string();
    with_cookies(
        StatusCode::CREATED,
        &["access=access-1; Path=/", "refresh=refresh-1; Path=/"],
        json!({}),
    )
}

async fn refresh(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let call = state.refresh_calls.fetch_add(1, Ordering::SeqCst) + 1;
    let delay = *state.refresh_delay_ms.lock();
    tokio::time::sleep(Duration::from_millis(delay)).await;

    if cookie(&headers, "refresh").as_deref() != Some("refresh-1") {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Refresh token expired", "statusCode": 401})),
        )
            .into_response();
    }
    let access = format!("access-{}", call + 1);
    *state.valid_access.lock() = access.clone();
    let set_access = format!("access={access}; Path=/");
    with_cookies(StatusCode::OK, &[set_access.as_str()], json!({}))
}

async fn me(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    let valid = state.valid_access.lock().clone();
    if cookie(&headers, "access").as_deref() == Some(valid.as_str()) {
        Json(json!({"id": "1", "username": "ana", "firstName": "Ana", "role": "ADMIN"}))
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"message": "Unauthorized", "statusCode": 401})),
        )
            .into_response()
    }
}

async fn socket(ws: WebSocketUpgrade, State(state): State<Arc<ServerState>>) -> Response {
    ws.on_upgrade(move |socket| speak_socket_io(socket, state))
}

async fn send_text(socket: &mut WebSocket, text: String) {
    socket.send(Message::Text(text.into())).await.unwrap();
}

/// Minimal Socket.IO v4 server side: open, namespace ack, then answer
/// every `subscribeToQrCode` with the configured status.
async fn speak_socket_io(mut socket: WebSocket, state: Arc<ServerState>) {
    state.socket_connections.fetch_add(1, Ordering::SeqCst);
    send_text(
        &mut socket,
        r#"0{"sid":"test-sid","upgrades":[],"pingInterval":300,"pingTimeout":200,"maxPayload":1000000}"#
            .to_string(),
    )
    .await;

    let mut ping = tokio::time::interval(Duration::from_millis(300));
    loop {
        tokio::select! {
            _ = ping.tick() => send_text(&mut socket, "2".to_string()).await,
            received = socket.recv() => {
                let Some(Ok(Message::Text(text))) = received else {
                    return;
                };
                let text = text.as_str();
                if text == "40" {
                    send_text(&mut socket, r#"40{"sid":"ns-sid"}"#.to_string()).await;
                } else if let Some(body) = text.strip_prefix("42") {
                    let args: Vec<Value> = serde_json::from_str(body).unwrap();
                    if args[0] == "subscribeToQrCode" {
                        let code = args[1].as_str().unwrap().to_string();
                        state.subscriptions.lock().push(code.clone());
                        let status = state.push_status.lock().clone();
                        let event = json!(["qrCodeStatus", {"qrCode": code, "status": status}]);
                        send_text(&mut socket, format!("42{event}")).await;

                        let hang_up = state.hang_up_once.lock().take();
                        match hang_up {
                            Some(HangUp::Transport) => {
                                let _ = socket.send(Message::Close(None)).await;
                                return;
                            }
                            Some(HangUp::Namespace) => {
                                send_text(&mut socket, "41".to_string()).await;
                                return;
                            }
                            None => {}
                        }
                    }
                }
            }
        }
    }
}
