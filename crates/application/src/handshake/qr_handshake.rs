//! QR login handshake driver.

use std::sync::Arc;

use patchgate_domain::channel::{EVENT_SUBSCRIBE_QR_CODE, REASON_CLIENT_DISCONNECT};
use patchgate_domain::{ChannelError, ChannelEvent, QrCodeGrant, QrCodeStatus, QrStatusUpdate};
use serde_json::json;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::{DispatchTable, HandshakeError, HandshakeSignal, HandshakeState};
use crate::ports::{Clock, PushChannel, QrLoginService, SessionListener};

/// What woke the handshake up.
enum Wake {
    Expired,
    Event(Result<ChannelEvent, RecvError>),
}

/// Puts the code back to active unless the login exchange completes.
struct ConfirmGuard<'a> {
    state: &'a mut HandshakeState,
    restore: Option<HandshakeState>,
}

impl ConfirmGuard<'_> {
    fn disarm(mut self) {
        self.restore = None;
    }
}

impl Drop for ConfirmGuard<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.restore.take() {
            debug!("login exchange interrupted, code is active again");
            *self.state = state;
        }
    }
}

/// Drives one QR login flow over a REST service and a push channel.
///
/// The handshake owns the expiry deadline of the active code. Status events
/// only act on the active code; anything addressed to a superseded code is
/// dropped.
pub struct QrHandshake<S: QrLoginService, P: PushChannel> {
    service: Arc<S>,
    channel: Arc<P>,
    clock: Arc<dyn Clock>,
    listener: Option<Arc<dyn SessionListener>>,
    dispatch: DispatchTable,
    events: Option<broadcast::Receiver<ChannelEvent>>,
    state: HandshakeState,
    expiry_deadline: Option<Instant>,
    channel_dropped: bool,
}

impl<S: QrLoginService, P: PushChannel> QrHandshake<S, P> {
    /// Creates an idle handshake.
    pub fn new(service: Arc<S>, channel: Arc<P>, clock: Arc<dyn Clock>) -> Self {
        Self {
            service,
            channel,
            clock,
            listener: None,
            dispatch: DispatchTable::new(),
            events: None,
            state: HandshakeState::Idle,
            expiry_deadline: None,
            channel_dropped: false,
        }
    }

    /// Notifies `listener` once a login completes.
    #[must_use]
    pub fn with_listener(mut self, listener: Arc<dyn SessionListener>) -> Self {
        self.listener = Some(listener);
        self
    }

    /// Current state.
    pub const fn state(&self) -> &HandshakeState {
        &self.state
    }

    /// Requests a fresh code and subscribes to its status.
    ///
    /// Connects the push channel first so no status update can be missed.
    /// Requesting a code while another is active supersedes it.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::InvalidState`] while a code request or login is running.
    /// - [`HandshakeError::Channel`] if the push channel cannot connect.
    /// - [`HandshakeError::Generate`] if the server does not issue a code.
    pub async fn request_code(&mut self) -> Result<QrCodeGrant, HandshakeError> {
        if !self.state.can_request_code() {
            return Err(HandshakeError::InvalidState(self.state.message()));
        }

        if self.events.is_none() {
            self.events = Some(self.channel.events());
        }
        self.channel.connect().await?;

        self.expiry_deadline = None;
        self.state = HandshakeState::CodeRequested;
        let grant = match self.service.generate_code().await {
            Ok(grant) => grant,
            Err(error) => {
                warn!(%error, "login code generation failed");
                self.state = HandshakeState::Idle;
                return Err(HandshakeError::Generate(error));
            }
        };

        let remaining = self.clock.until(grant.expires_at);
        self.expiry_deadline = Some(Instant::now() + remaining);
        self.state = HandshakeState::CodeActive {
            code: grant.code.clone(),
            expires_at: grant.expires_at,
        };
        let expires_in_ms = u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX);
        info!(expires_in_ms, "login code issued");

        self.subscribe(&grant.code)?;
        Ok(grant)
    }

    /// Waits for the next state change of the active code.
    ///
    /// Returns when the code expires, the server reports it as expired or
    /// unknown, or a confirmation was exchanged for a session.
    ///
    /// # Errors
    ///
    /// - [`HandshakeError::NoActiveCode`] if no code is active.
    /// - [`HandshakeError::Login`] if the confirmed code could not be
    ///   exchanged; the code stays active and waiting may continue.
    /// - [`HandshakeError::Channel`] if the event stream closed.
    pub async fn next_transition(&mut self) -> Result<HandshakeState, HandshakeError> {
        loop {
            let wake = {
                let (Some(deadline), Some(events)) = (self.expiry_deadline, self.events.as_mut())
                else {
                    return Err(HandshakeError::NoActiveCode);
                };
                tokio::select! {
                    () = tokio::time::sleep_until(deadline) => Wake::Expired,
                    received = events.recv() => Wake::Event(received),
                }
            };

            match wake {
                Wake::Expired => return Ok(self.finish_expired()),
                Wake::Event(Ok(event)) => {
                    if let Some(state) = self.handle_event(&event).await? {
                        return Ok(state);
                    }
                }
                Wake::Event(Err(RecvError::Lagged(skipped))) => {
                    warn!(skipped, "handshake fell behind the push channel");
                    self.resync().await?;
                }
                Wake::Event(Err(RecvError::Closed)) => {
                    return Err(HandshakeError::Channel(ChannelError::Disconnected(
                        "event stream closed".to_string(),
                    )));
                }
            }
        }
    }

    /// Waits until the flow reaches a terminal state.
    ///
    /// # Errors
    ///
    /// Same as [`Self::next_transition`].
    pub async fn run(&mut self) -> Result<HandshakeState, HandshakeError> {
        loop {
            let state = self.next_transition().await?;
            if state.is_finished() {
                return Ok(state);
            }
        }
    }

    /// Abandons the flow: disconnects the channel and forgets the code.
    pub async fn abandon(&mut self) {
        info!("abandoning qr login");
        self.channel.disconnect().await;
        self.events = None;
        self.expiry_deadline = None;
        self.channel_dropped = false;
        self.state = HandshakeState::Idle;
    }

    fn subscribe(&self, code: &str) -> Result<(), HandshakeError> {
        debug!(code, "subscribing to login code status");
        self.channel
            .emit(EVENT_SUBSCRIBE_QR_CODE, json!(code))
            .map_err(HandshakeError::from)
    }

    /// Recovers after skipped events, which may have hidden a reconnect.
    async fn resync(&mut self) -> Result<(), HandshakeError> {
        self.channel_dropped = true;
        let Some(code) = self.state.active_code().map(str::to_string) else {
            return Ok(());
        };
        if self.channel.state().needs_connect() {
            self.reconnect().await
        } else {
            self.subscribe(&code)
        }
    }

    /// Reconnects a channel that stopped on its own. The `connect` event it
    /// publishes triggers the resubscribe.
    async fn reconnect(&self) -> Result<(), HandshakeError> {
        info!("push channel is down, reconnecting");
        self.channel.connect().await.map_err(|error| {
            warn!(%error, "push channel reconnect failed");
            HandshakeError::from(error)
        })
    }

    async fn handle_event(
        &mut self,
        event: &ChannelEvent,
    ) -> Result<Option<HandshakeState>, HandshakeError> {
        match self.dispatch.dispatch(event) {
            None => Ok(None),
            Some(HandshakeSignal::Connected) => {
                if std::mem::take(&mut self.channel_dropped) {
                    if let Some(code) = self.state.active_code().map(str::to_string) {
                        info!("push channel back, resubscribing login code");
                        self.subscribe(&code)?;
                    }
                }
                Ok(None)
            }
            Some(HandshakeSignal::Disconnected(reason)) => {
                warn!(%reason, "push channel dropped");
                self.channel_dropped = true;
                if reason != REASON_CLIENT_DISCONNECT
                    && self.state.active_code().is_some()
                    && self.channel.state().needs_connect()
                {
                    self.reconnect().await?;
                }
                Ok(None)
            }
            Some(HandshakeSignal::Status(update)) => self.apply_status(update).await,
        }
    }

    async fn apply_status(
        &mut self,
        update: QrStatusUpdate,
    ) -> Result<Option<HandshakeState>, HandshakeError> {
        let HandshakeState::CodeActive { code, expires_at } = &self.state else {
            debug!(code = %update.code, "status update without an active code");
            return Ok(None);
        };
        if *code != update.code {
            debug!(code = %update.code, "ignoring status for superseded code");
            return Ok(None);
        }
        let (code, expires_at) = (code.clone(), *expires_at);

        match update.status {
            QrCodeStatus::Pending => Ok(None),
            QrCodeStatus::Confirmed => {
                self.state = HandshakeState::Confirmed { code: code.clone() };
                info!("login code confirmed");
                let guard = ConfirmGuard {
                    state: &mut self.state,
                    restore: Some(HandshakeState::CodeActive {
                        code: code.clone(),
                        expires_at,
                    }),
                };
                let result = self.service.login_with_code(&code).await;
                guard.disarm();
                match result {
                    Ok(()) => {
                        self.expiry_deadline = None;
                        self.state = HandshakeState::Authenticated;
                        if let Some(listener) = &self.listener {
                            listener.session_established().await;
                        }
                        info!("signed in with login code");
                        Ok(Some(HandshakeState::Authenticated))
                    }
                    Err(error) => {
                        warn!(%error, "login with confirmed code failed");
                        self.state = HandshakeState::CodeActive { code, expires_at };
                        Err(HandshakeError::Login(error))
                    }
                }
            }
            QrCodeStatus::Expired => {
                self.expiry_deadline = None;
                self.state = HandshakeState::Expired { code };
                Ok(Some(self.state.clone()))
            }
            QrCodeStatus::NotFound => {
                warn!("server does not know the login code");
                self.expiry_deadline = None;
                self.state = HandshakeState::NotFound { code };
                Ok(Some(self.state.clone()))
            }
        }
    }

    fn finish_expired(&mut self) -> HandshakeState {
        self.expiry_deadline = None;
        self.state = match std::mem::take(&mut self.state) {
            HandshakeState::CodeActive { code, .. } => {
                info!("login code expired");
                HandshakeState::Expired { code }
            }
            other => other,
        };
        self.state.clone()
    }
}
