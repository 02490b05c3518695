//! End-to-end QR login over the Socket.IO channel and the REST API.
#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use patchgate_application::ports::PushChannel;
use patchgate_application::{
    ApiClient, AuthSession, GatewayConfig, HandshakeState, QrHandshake, RequestGateway,
};
use patchgate_domain::channel::{EVENT_CONNECT, EVENT_DISCONNECT};
use patchgate_domain::{ChannelEvent, ClientSettings, ConnectionState};
use patchgate_infrastructure::{ReqwestHttpClient, SocketIoChannel, SystemClock};
use pretty_assertions::assert_eq;
use tokio::task::JoinHandle;

use common::{HangUp, spawn_server};

fn api_client(settings: &ClientSettings) -> Arc<ApiClient<ReqwestHttpClient>> {
    let client = ReqwestHttpClient::from_settings(settings).unwrap();
    let gateway = RequestGateway::new(Arc::new(client), GatewayConfig::from_settings(settings));
    Arc::new(ApiClient::new(Arc::new(gateway), settings.clone()))
}

/// Records each channel event with the channel state seen when it arrived.
fn watch_states(
    channel: &Arc<SocketIoChannel>,
    count: usize,
) -> JoinHandle<Vec<(String, ConnectionState)>> {
    let mut events = channel.events();
    let channel = Arc::clone(channel);
    tokio::spawn(async move {
        let mut seen = Vec::new();
        while seen.len() < count {
            let event = events.recv().await.unwrap();
            seen.push((event.name, channel.state()));
        }
        seen
    })
}

#[tokio::test]
async fn test_confirmed_code_signs_in() {
    let server = spawn_server().await;
    let settings = ClientSettings::for_server(server.url());
    let api = api_client(&settings);
    let session = Arc::new(AuthSession::new(Arc::clone(&api)));
    let channel = Arc::new(SocketIoChannel::new(settings.push_channel()));

    let mut handshake = QrHandshake::new(
        Arc::clone(&api),
        Arc::clone(&channel),
        Arc::new(SystemClock::new()),
    )
    .with_listener(session.clone());

    let grant = handshake.request_code().await.unwrap();
    assert_eq!(grant.code, "abc");

    let state = tokio::time::timeout(Duration::from_secs(5), handshake.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(state, HandshakeState::Authenticated);
    assert!(session.is_authenticated().await);
    assert_eq!(*server.state.subscriptions.lock(), vec!["abc".to_string()]);

    handshake.abandon().await;
    assert_eq!(channel.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_not_found_code_is_terminal() {
    let server = spawn_server().await;
    *server.state.push_status.lock() = "NOT_FOUND".to_string();
    let settings = ClientSettings::for_server(server.url());
    let api = api_client(&settings);
    let channel = Arc::new(SocketIoChannel::new(settings.push_channel()));
    let mut handshake = QrHandshake::new(api, channel, Arc::new(SystemClock::new()));

    handshake.request_code().await.unwrap();
    let state = tokio::time::timeout(Duration::from_secs(5), handshake.run())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        state,
        HandshakeState::NotFound {
            code: "abc".to_string()
        }
    );
}

#[tokio::test]
async fn test_channel_answers_heartbeats() {
    let server = spawn_server().await;
    let settings = ClientSettings::for_server(server.url());
    let channel = SocketIoChannel::new(settings.push_channel());
    let mut events = channel.events();

    channel.connect().await.unwrap();
    assert_eq!(events.recv().await.unwrap(), ChannelEvent::connected());

    // Longer than the 500ms liveness window; only the pings keep it open.
    tokio::time::sleep(Duration::from_millis(1_000)).await;
    assert_eq!(channel.state(), ConnectionState::Connected);

    channel.disconnect().await;
    assert_eq!(channel.state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn test_dropped_transport_reconnects_and_resubscribes() {
    let server = spawn_server().await;
    *server.state.push_status.lock() = "PENDING".to_string();
    *server.state.hang_up_once.lock() = Some(HangUp::Transport);
    let mut settings = ClientSettings::for_server(server.url());
    settings.reconnect.backoff_base_ms = 200;
    let channel = Arc::new(SocketIoChannel::new(settings.push_channel()));
    let watcher = watch_states(&channel, 3);
    let mut handshake = QrHandshake::new(
        api_client(&settings),
        Arc::clone(&channel),
        Arc::new(SystemClock::new()),
    );

    handshake.request_code().await.unwrap();
    let waiting = tokio::time::timeout(Duration::from_secs(3), handshake.next_transition()).await;
    assert!(waiting.is_err());

    let seen = tokio::time::timeout(Duration::from_secs(1), watcher)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(
        seen,
        vec![
            (EVENT_CONNECT.to_string(), ConnectionState::Connected),
            (EVENT_DISCONNECT.to_string(), ConnectionState::Reconnecting),
            (EVENT_CONNECT.to_string(), ConnectionState::Connected),
        ]
    );
    assert_eq!(
        *server.state.subscriptions.lock(),
        vec!["abc".to_string(), "abc".to_string()]
    );
    assert_eq!(server.state.socket_connections.load(Ordering::SeqCst), 2);
    assert_eq!(handshake.state().active_code(), Some("abc"));

    handshake.abandon().await;
}

#[tokio::test]
async fn test_server_disconnect_is_reconnected_by_handshake() {
    let server = spawn_server().await;
    *server.state.push_status.lock() = "PENDING".to_string();
    *server.state.hang_up_once.lock() = Some(HangUp::Namespace);
    let settings = ClientSettings::for_server(server.url());
    let channel = Arc::new(SocketIoChannel::new(settings.push_channel()));
    let mut handshake = QrHandshake::new(
        api_client(&settings),
        Arc::clone(&channel),
        Arc::new(SystemClock::new()),
    );

    handshake.request_code().await.unwrap();
    let waiting = tokio::time::timeout(Duration::from_secs(2), handshake.next_transition()).await;

    assert!(waiting.is_err());
    assert_eq!(channel.state(), ConnectionState::Connected);
    assert_eq!(
        *server.state.subscriptions.lock(),
        vec!["abc".to_string(), "abc".to_string()]
    );
    assert_eq!(server.state.socket_connections.load(Ordering::SeqCst), 2);

    handshake.abandon().await;
}
