//! Request gateway with single-flight session refresh.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use patchgate_domain::{
    ClientSettings, PublicEndpoints, auth::REFRESH_PATH, request::RequestSpec,
    response::ResponseSpec,
};
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::refresh_state::Admission;
use super::{GatewayError, GatewayResult, REFRESHED, RefreshOutcome, RefreshSnapshot, RefreshState};
use crate::ports::HttpClient;

/// Gateway configuration.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Absolute URL of the refresh endpoint.
    pub refresh_url: String,
    /// Endpoints exempt from refresh interception.
    pub public_endpoints: PublicEndpoints,
    /// Upper bound for requests waiting on someone else's refresh.
    pub refresh_wait_timeout: Option<Duration>,
    /// Timeout of the refresh call itself in milliseconds.
    pub refresh_timeout_ms: u64,
}

impl GatewayConfig {
    /// Derives the configuration from client settings.
    #[must_use]
    pub fn from_settings(settings: &ClientSettings) -> Self {
        Self {
            refresh_url: settings.endpoint(REFRESH_PATH),
            public_endpoints: PublicEndpoints::default(),
            refresh_wait_timeout: settings.refresh_wait_timeout(),
            refresh_timeout_ms: settings.request_timeout_ms,
        }
    }
}

/// Executes API requests and hides session expiry from callers.
///
/// The refresh state belongs to the gateway instance, so independent
/// clients in one process do not share refresh cycles.
///
/// # Example
///
/// ```ignore
/// let gateway = RequestGateway::new(Arc::new(ReqwestHttpClient::new()?), config);
/// let response = gateway.execute(&RequestSpec::get(url)).await?;
/// ```
pub struct RequestGateway<C: HttpClient> {
    client: Arc<C>,
    config: GatewayConfig,
    state: Mutex<RefreshState>,
}

impl<C: HttpClient> RequestGateway<C> {
    /// Creates a gateway over the given transport.
    pub fn new(client: Arc<C>, config: GatewayConfig) -> Self {
        Self {
            client,
            config,
            state: Mutex::new(RefreshState::new()),
        }
    }

    /// The transport requests are sent through.
    pub const fn transport(&self) -> &Arc<C> {
        &self.client
    }

    /// Returns the gateway configuration.
    pub const fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Current refresh flag and queue length.
    pub fn refresh_snapshot(&self) -> RefreshSnapshot {
        self.state.lock().snapshot()
    }

    /// Executes a request, refreshing the session at most once on `401`.
    ///
    /// # Errors
    ///
    /// - [`GatewayError::Transport`] when the transport fails.
    /// - [`GatewayError::AuthRequired`] when a public endpoint answers `401`.
    /// - [`GatewayError::RefreshFailed`] when the session could not be renewed.
    /// - [`GatewayError::RefreshTimedOut`] / [`GatewayError::RefreshAbandoned`]
    ///   when a queued request never saw the refresh settle.
    pub async fn execute(&self, request: &RequestSpec) -> GatewayResult<ResponseSpec> {
        let response = self.send(request).await?;
        if !response.is_unauthorized() {
            return Ok(response);
        }

        let admission = self.state.lock().admit();
        match admission {
            Admission::Queued(rx) => {
                debug!(request_id = %request.id, url = %request.url, "queued behind session refresh");
                self.wait_for_refresh(rx).await?;
            }
            Admission::Leader => {
                let guard = LeaderGuard::new(&self.state);
                let outcome = self.refresh().await;
                guard.settle(&outcome);
                outcome?;
            }
        }

        debug!(request_id = %request.id, "replaying request after session refresh");
        self.send(request).await
    }

    /// One transport call plus the public-endpoint check.
    async fn send(&self, request: &RequestSpec) -> GatewayResult<ResponseSpec> {
        let response = self.client.execute(request).await?;
        if response.is_unauthorized() && self.config.public_endpoints.is_public(&request.url) {
            debug!(request_id = %request.id, url = %request.url, "public endpoint rejected session");
            return Err(GatewayError::AuthRequired {
                body: response.text(),
            });
        }
        Ok(response)
    }

    /// Calls the refresh endpoint through [`Self::send`]; being public, a
    /// rejected refresh surfaces as an error instead of recursing.
    async fn refresh(&self) -> RefreshOutcome {
        let request = RequestSpec::post(&self.config.refresh_url)
            .with_header("Accept", "application/json")
            .with_timeout_ms(self.config.refresh_timeout_ms);

        info!(request_id = %request.id, "refreshing session");
        let outcome = match self.send(&request).await {
            Ok(response) if response.is_success() => Ok(REFRESHED),
            Ok(response) => Err(GatewayError::RefreshFailed {
                status: Some(response.status),
                message: response.text(),
            }),
            Err(GatewayError::AuthRequired { body }) => Err(GatewayError::RefreshFailed {
                status: Some(401),
                message: body,
            }),
            Err(other) => Err(GatewayError::RefreshFailed {
                status: None,
                message: other.to_string(),
            }),
        };

        match &outcome {
            Ok(_) => info!("session refreshed"),
            Err(error) => warn!(%error, "session refresh failed"),
        }
        outcome
    }

    async fn wait_for_refresh(&self, rx: oneshot::Receiver<RefreshOutcome>) -> RefreshOutcome {
        let received = match self.config.refresh_wait_timeout {
            Some(limit) => tokio::time::timeout(limit, rx).await.map_err(|_| {
                let waited_ms = u64::try_from(limit.as_millis()).unwrap_or(u64::MAX);
                warn!(waited_ms, "queued request timed out waiting for refresh");
                GatewayError::RefreshTimedOut { waited_ms }
            })?,
            None => rx.await,
        };
        received.map_err(|_| GatewayError::RefreshAbandoned)?
    }
}

/// Releases the refresh slot even if the leading request is dropped
/// mid-refresh; queued callers are then rejected instead of hanging.
struct LeaderGuard<'a> {
    state: &'a Mutex<RefreshState>,
    settled: bool,
}

impl<'a> LeaderGuard<'a> {
    const fn new(state: &'a Mutex<RefreshState>) -> Self {
        Self {
            state,
            settled: false,
        }
    }

    fn settle(mut self, outcome: &RefreshOutcome) {
        self.state.lock().settle(outcome);
        self.settled = true;
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("session refresh dropped before settling");
            self.state.lock().settle(&Err(GatewayError::RefreshAbandoned));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    use futures::future::join_all;
    use patchgate_domain::auth::QR_GENERATE_PATH;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::ports::HttpFuture;

    const BASE: &str = "http://dashboard.test/api";

    /// Protected routes answer 401 until a refresh succeeds.
    struct ScriptedClient {
        session_valid: AtomicBool,
        refresh_calls: AtomicUsize,
        protected_calls: AtomicUsize,
        refresh_status: u16,
        refresh_delay: Duration,
    }

    impl ScriptedClient {
        fn new(refresh_status: u16) -> Self {
            Self {
                session_valid: AtomicBool::new(false),
                refresh_calls: AtomicUsize::new(0),
                protected_calls: AtomicUsize::new(0),
                refresh_status,
                refresh_delay: Duration::from_millis(50),
            }
        }
    }

    impl HttpClient for ScriptedClient {
        fn execute<'a>(&'a self, request: &'a RequestSpec) -> HttpFuture<'a> {
            Box::pin(async move {
                if request.url.ends_with(REFRESH_PATH) {
                    self.refresh_calls.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(self.refresh_delay).await;
                    if self.refresh_status == 200 {
                        self.session_valid.store(true, Ordering::SeqCst);
                    }
                    return Ok(ResponseSpec::with_status(self.refresh_status, "refresh"));
                }
                if request.url.contains(QR_GENERATE_PATH) {
                    return Ok(ResponseSpec::with_status(401, "no session"));
                }
                self.protected_calls.fetch_add(1, Ordering::SeqCst);
                if self.session_valid.load(Ordering::SeqCst) {
                    Ok(ResponseSpec::with_status(200, "ok"))
                } else {
                    Ok(ResponseSpec::with_status(401, "expired"))
                }
            })
        }
    }

    fn gateway(client: ScriptedClient, wait: Option<Duration>) -> RequestGateway<ScriptedClient> {
        let config = GatewayConfig {
            refresh_url: format!("{BASE}{REFRESH_PATH}"),
            public_endpoints: PublicEndpoints::default(),
            refresh_wait_timeout: wait,
            refresh_timeout_ms: 1_000,
        };
        RequestGateway::new(Arc::new(client), config)
    }

    fn protected(route: &str) -> RequestSpec {
        RequestSpec::get(format!("{BASE}{route}"))
    }

    #[tokio::test(start_paused = true)]
    async fn test_passes_through_non_401() {
        let client = ScriptedClient::new(200);
        client.session_valid.store(true, Ordering::SeqCst);
        let gateway = gateway(client, None);

        let response = gateway.execute(&protected("/games")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(gateway.client.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refreshes_and_replays_once() {
        let gateway = gateway(ScriptedClient::new(200), None);

        let response = gateway.execute(&protected("/users/me")).await.unwrap();

        assert_eq!(response.status, 200);
        assert_eq!(gateway.client.refresh_calls.load(Ordering::SeqCst), 1);
        assert_eq!(gateway.client.protected_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_401s_share_one_refresh() {
        let gateway = gateway(ScriptedClient::new(200), None);
        let requests: Vec<RequestSpec> = (0..5).map(|i| protected(&format!("/games/{i}"))).collect();

        let results = join_all(requests.iter().map(|r| gateway.execute(r))).await;

        assert_eq!(gateway.client.refresh_calls.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap().status, 200);
        }
        assert_eq!(
            gateway.refresh_snapshot(),
            RefreshSnapshot {
                is_refreshing: false,
                pending: 0
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_rejects_every_waiter() {
        let gateway = gateway(ScriptedClient::new(500), None);
        let a = protected("/update-requests");
        let b = protected("/games");

        let (first, second) = tokio::join!(gateway.execute(&a), gateway.execute(&b));

        let expected = GatewayError::RefreshFailed {
            status: Some(500),
            message: "refresh".to_string(),
        };
        assert_eq!(first.unwrap_err(), expected);
        assert_eq!(second.unwrap_err(), expected);
        assert_eq!(gateway.client.refresh_calls.load(Ordering::SeqCst), 1);
        assert!(!gateway.refresh_snapshot().is_refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_rejected_refresh_does_not_recurse() {
        let gateway = gateway(ScriptedClient::new(401), None);

        let err = gateway.execute(&protected("/users/me")).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::RefreshFailed {
                status: Some(401),
                message: "refresh".to_string(),
            }
        );
        assert_eq!(gateway.client.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_public_401_skips_refresh() {
        let gateway = gateway(ScriptedClient::new(200), None);
        let request = RequestSpec::post(format!("{BASE}{QR_GENERATE_PATH}"));

        let err = gateway.execute(&request).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::AuthRequired {
                body: "no session".to_string()
            }
        );
        assert_eq!(gateway.client.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_queued_request_times_out() {
        let gateway = gateway(ScriptedClient::new(200), Some(Duration::from_millis(10)));
        let leader = protected("/games");
        let waiter = protected("/users/me");

        let (first, second) = tokio::join!(gateway.execute(&leader), gateway.execute(&waiter));

        assert_eq!(first.unwrap().status, 200);
        assert_eq!(
            second.unwrap_err(),
            GatewayError::RefreshTimedOut { waited_ms: 10 }
        );
        assert!(!gateway.refresh_snapshot().is_refreshing);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_leader_releases_queue() {
        let gateway = gateway(ScriptedClient::new(200), None);
        let leader = protected("/games");
        let waiter = protected("/users/me");

        let (first, second) = tokio::join!(
            tokio::time::timeout(Duration::from_millis(10), gateway.execute(&leader)),
            gateway.execute(&waiter)
        );

        assert!(first.is_err());
        assert_eq!(second.unwrap_err(), GatewayError::RefreshAbandoned);
        assert_eq!(
            gateway.refresh_snapshot(),
            RefreshSnapshot {
                is_refreshing: false,
                pending: 0
            }
        );
    }

    #[test]
    fn test_config_from_settings() {
        let settings = ClientSettings::for_server("https://api.example.com");
        let config = GatewayConfig::from_settings(&settings);

        assert_eq!(config.refresh_url, "https://api.example.com/api/auth/refresh");
        assert!(config.public_endpoints.is_public(&config.refresh_url));
        assert_eq!(config.refresh_wait_timeout, Some(Duration::from_secs(30)));
    }
}
