//! Reconnecting Socket.IO client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use patchgate_application::ports::PushChannel;
use patchgate_domain::channel::{
    REASON_CLIENT_DISCONNECT, REASON_RECONNECT_FAILED, REASON_SERVER_DISCONNECT,
};
use patchgate_domain::{ChannelError, ChannelEvent, ConnectionState, PushChannelConfig};
use rand::Rng;
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::packet::{EnginePacket, OpenHandshake, SocketPacket};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const EVENT_BUFFER: usize = 64;

/// State shared between the handle and the supervisor task.
struct Shared {
    config: PushChannelConfig,
    events: broadcast::Sender<ChannelEvent>,
    state: Mutex<ConnectionState>,
}

impl Shared {
    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    fn publish(&self, event: ChannelEvent) {
        // No subscribers is fine; events are not replayed.
        let _ = self.events.send(event);
    }
}

struct Supervisor {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// An established websocket with the Socket.IO namespace joined.
struct Session {
    ws: WsStream,
    open: OpenHandshake,
}

/// Why a live session ended.
enum SessionEnd {
    /// `disconnect` was called.
    Cancelled,
    /// The server closed the namespace; no reconnect.
    ServerClosed,
    /// The transport dropped; reconnect if the policy allows.
    Dropped(String),
}

/// Socket.IO push channel over a websocket.
///
/// `connect` performs the first handshake inline, so configuration and
/// network errors surface to the caller. After that a supervisor task owns
/// the connection, answers heartbeats and reconnects with exponential
/// backoff. Emits are queued and flushed once a connection is live.
pub struct SocketIoChannel {
    shared: Arc<Shared>,
    outgoing: Mutex<Option<mpsc::UnboundedSender<String>>>,
    supervisor: tokio::sync::Mutex<Option<Supervisor>>,
}

impl SocketIoChannel {
    /// Creates a disconnected channel.
    #[must_use]
    pub fn new(config: PushChannelConfig) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER);
        Self {
            shared: Arc::new(Shared {
                config,
                events,
                state: Mutex::new(ConnectionState::Disconnected),
            }),
            outgoing: Mutex::new(None),
            supervisor: tokio::sync::Mutex::new(None),
        }
    }

    /// Channel configuration.
    #[must_use]
    pub fn config(&self) -> &PushChannelConfig {
        &self.shared.config
    }
}

#[async_trait]
impl PushChannel for SocketIoChannel {
    async fn connect(&self) -> Result<(), ChannelError> {
        let mut supervisor = self.supervisor.lock().await;
        if let Some(running) = supervisor.as_ref() {
            if !running.handle.is_finished() && !self.state().needs_connect() {
                return Ok(());
            }
            // The old supervisor has given up; make sure it is gone.
            running.cancel.cancel();
        }

        self.shared.set_state(ConnectionState::Connecting);
        let session = match establish(&self.shared.config).await {
            Ok(session) => session,
            Err(error) => {
                warn!(%error, "push channel connect failed");
                self.shared.set_state(ConnectionState::Disconnected);
                return Err(error);
            }
        };

        let (tx, rx) = mpsc::unbounded_channel();
        *self.outgoing.lock() = Some(tx);
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(supervise(
            Arc::clone(&self.shared),
            session,
            rx,
            cancel.clone(),
        ));
        *supervisor = Some(Supervisor { cancel, handle });
        Ok(())
    }

    async fn disconnect(&self) {
        let running = self.supervisor.lock().await.take();
        self.outgoing.lock().take();
        if let Some(running) = running {
            running.cancel.cancel();
            if let Err(error) = running.handle.await {
                warn!(%error, "push channel supervisor ended abnormally");
            }
        }
        self.shared.set_state(ConnectionState::Disconnected);
    }

    fn emit(&self, event: &str, payload: Value) -> Result<(), ChannelError> {
        let outgoing = self.outgoing.lock();
        let tx = outgoing.as_ref().ok_or(ChannelError::NotConnected)?;
        tx.send(SocketPacket::event(event, payload).to_frame())
            .map_err(|_| ChannelError::SendFailed("push channel is closed".to_string()))
    }

    fn events(&self) -> broadcast::Receiver<ChannelEvent> {
        self.shared.events.subscribe()
    }

    fn state(&self) -> ConnectionState {
        *self.shared.state.lock()
    }
}

impl Drop for SocketIoChannel {
    fn drop(&mut self) {
        if let Some(running) = self.supervisor.get_mut().take() {
            running.cancel.cancel();
        }
    }
}

/// Opens the websocket and joins the default namespace.
async fn establish(config: &PushChannelConfig) -> Result<Session, ChannelError> {
    let url = config.websocket_url()?;
    debug!(%url, "opening push channel");

    timeout(config.connect_timeout(), async {
        let (mut ws, _) = connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::ConnectionFailed(e.to_string()))?;

        let open = loop {
            match read_engine_packet(&mut ws).await? {
                EnginePacket::Open(open) => break open,
                other => debug!(?other, "ignoring packet before open"),
            }
        };

        send_frame(&mut ws, SocketPacket::Connect(None).to_frame()).await?;

        loop {
            match read_engine_packet(&mut ws).await? {
                EnginePacket::Ping => send_frame(&mut ws, EnginePacket::Pong.encode()).await?,
                EnginePacket::Message(data) => match SocketPacket::decode(&data)? {
                    SocketPacket::Connect(_) => break,
                    SocketPacket::ConnectError(reason) => {
                        return Err(ChannelError::ConnectionFailed(format!(
                            "namespace refused: {reason}"
                        )));
                    }
                    other => debug!(?other, "ignoring packet before namespace ack"),
                },
                EnginePacket::Close => {
                    return Err(ChannelError::ConnectionFailed(
                        "server closed during handshake".to_string(),
                    ));
                }
                _ => {}
            }
        }

        info!(sid = %open.sid, "push channel connected");
        Ok::<_, ChannelError>(Session { ws, open })
    })
    .await
    .map_err(|_| ChannelError::Timeout)?
}

async fn read_engine_packet(ws: &mut WsStream) -> Result<EnginePacket, ChannelError> {
    loop {
        match ws.next().await {
            Some(Ok(Message::Text(text))) => return EnginePacket::decode(text.as_str()),
            Some(Ok(Message::Close(_))) | None => {
                return Err(ChannelError::Disconnected("transport close".to_string()));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(ChannelError::Disconnected(e.to_string())),
        }
    }
}

async fn send_frame(ws: &mut WsStream, frame: String) -> Result<(), ChannelError> {
    ws.send(Message::Text(frame.into()))
        .await
        .map_err(|e| ChannelError::SendFailed(e.to_string()))
}

/// Owns the connection for its whole life, reconnecting after drops.
async fn supervise(
    shared: Arc<Shared>,
    first: Session,
    mut outgoing: mpsc::UnboundedReceiver<String>,
    cancel: CancellationToken,
) {
    let policy = shared.config.reconnect.clone();
    let mut session = Some(first);

    loop {
        let Some(live) = session.take() else {
            break;
        };
        shared.set_state(ConnectionState::Connected);
        shared.publish(ChannelEvent::connected());

        match drive(&shared, live, &mut outgoing, &cancel).await {
            SessionEnd::Cancelled => {
                shared.set_state(ConnectionState::Disconnected);
                shared.publish(ChannelEvent::disconnected(REASON_CLIENT_DISCONNECT));
                return;
            }
            SessionEnd::ServerClosed => {
                info!("server closed the push channel");
                shared.set_state(ConnectionState::Disconnected);
                shared.publish(ChannelEvent::disconnected(REASON_SERVER_DISCONNECT));
                return;
            }
            SessionEnd::Dropped(reason) => {
                warn!(%reason, "push channel dropped");
                if policy.allows(0) {
                    shared.set_state(ConnectionState::Reconnecting);
                }
                shared.publish(ChannelEvent::disconnected(reason));
            }
        }

        let mut attempt: u32 = 0;
        while session.is_none() {
            if !policy.allows(attempt) {
                warn!(attempt, "giving up on push channel");
                shared.set_state(ConnectionState::Failed);
                shared.publish(ChannelEvent::disconnected(REASON_RECONNECT_FAILED));
                return;
            }
            attempt += 1;
            shared.set_state(ConnectionState::Reconnecting);

            let delay = with_jitter(policy.delay_for(attempt));
            debug!(attempt, ?delay, "reconnecting push channel");
            tokio::select! {
                () = cancel.cancelled() => {
                    shared.set_state(ConnectionState::Disconnected);
                    shared.publish(ChannelEvent::disconnected(REASON_CLIENT_DISCONNECT));
                    return;
                }
                () = sleep(delay) => {}
            }

            match establish(&shared.config).await {
                Ok(live) => session = Some(live),
                Err(error) => warn!(attempt, %error, "push channel reconnect failed"),
            }
        }
    }
}

/// Pumps frames until the session ends.
async fn drive(
    shared: &Shared,
    session: Session,
    outgoing: &mut mpsc::UnboundedReceiver<String>,
    cancel: &CancellationToken,
) -> SessionEnd {
    let liveness = Duration::from_millis(session.open.liveness_window_ms());
    let (mut sink, mut stream) = session.ws.split();
    let watchdog = sleep(liveness);
    tokio::pin!(watchdog);

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                let _ = sink.send(Message::Text(SocketPacket::Disconnect.to_frame().into())).await;
                let _ = sink.close().await;
                return SessionEnd::Cancelled;
            }
            () = &mut watchdog => {
                return SessionEnd::Dropped("ping timeout".to_string());
            }
            Some(frame) = outgoing.recv() => {
                if let Err(e) = sink.send(Message::Text(frame.into())).await {
                    return SessionEnd::Dropped(format!("transport error: {e}"));
                }
            }
            received = stream.next() => {
                let text = match received {
                    Some(Ok(Message::Text(text))) => text,
                    Some(Ok(Message::Close(_))) | None => {
                        return SessionEnd::Dropped("transport close".to_string());
                    }
                    Some(Ok(_)) => continue,
                    Some(Err(e)) => return SessionEnd::Dropped(format!("transport error: {e}")),
                };
                match EnginePacket::decode(text.as_str()) {
                    Ok(EnginePacket::Ping) => {
                        watchdog.as_mut().reset(tokio::time::Instant::now() + liveness);
                        let pong = Message::Text(EnginePacket::Pong.encode().into());
                        if let Err(e) = sink.send(pong).await {
                            return SessionEnd::Dropped(format!("transport error: {e}"));
                        }
                    }
                    Ok(EnginePacket::Message(data)) => match SocketPacket::decode(&data) {
                        Ok(SocketPacket::Event { name, payload, .. }) => {
                            debug!(event = %name, "push event");
                            shared.publish(ChannelEvent::new(name, payload));
                        }
                        Ok(SocketPacket::Disconnect) => return SessionEnd::ServerClosed,
                        Ok(SocketPacket::ConnectError(reason)) => {
                            return SessionEnd::Dropped(format!("namespace error: {reason}"));
                        }
                        Ok(SocketPacket::Connect(_)) => {}
                        Err(error) => warn!(%error, "dropping malformed socket packet"),
                    },
                    Ok(EnginePacket::Close) => {
                        return SessionEnd::Dropped("transport close".to_string());
                    }
                    Ok(_) => {}
                    Err(error) => warn!(%error, "dropping malformed engine packet"),
                }
            }
        }
    }
}

/// Adds up to 25% random jitter.
fn with_jitter(delay: Duration) -> Duration {
    let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
    let jitter = rand::rng().random_range(0..=millis / 4);
    Duration::from_millis(millis.saturating_add(jitter))
}
