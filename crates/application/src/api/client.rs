//! REST endpoints of the dashboard API.

use std::sync::Arc;

use async_trait::async_trait;
use patchgate_domain::{
    App, AppQuery, ClientSettings, CreateSubscription, CreateSystemUpdateRequest,
    CreateUpdateRequest, Game, GameQuery, Page, Pagination, PatchNote, PatchNoteQuery,
    QrCodeGrant, QrLoginRequest, Subscription, UpdateRequest, User,
    auth::{QR_GENERATE_PATH, QR_LOGIN_PATH, REFRESH_PATH},
    request::{HttpMethod, RequestBody, RequestSpec},
    response::ResponseSpec,
};
use serde::{Serialize, de::DeserializeOwned};
use tracing::debug;

use super::{ApiError, ApiResult};
use crate::gateway::RequestGateway;
use crate::ports::{HttpClient, QrLoginService};

const USERS_ME_PATH: &str = "/users/me";
const GAMES_PATH: &str = "/games";
const UPDATES_PATH: &str = "/updates";
const UPDATE_REQUEST_PATH: &str = "/updates/request";
const SYSTEM_UPDATE_REQUEST_PATH: &str = "/updates/request_system";
const PATCH_NOTES_PATH: &str = "/patch-notes";
const SUBSCRIPTIONS_PATH: &str = "/subscriptions";
const APPS_PATH: &str = "/apps";

/// Typed client for the dashboard REST API.
///
/// Every call goes through the shared [`RequestGateway`], so session expiry
/// is handled transparently.
pub struct ApiClient<C: HttpClient> {
    gateway: Arc<RequestGateway<C>>,
    settings: ClientSettings,
}

impl<C: HttpClient> ApiClient<C> {
    /// Creates a client over the gateway.
    pub const fn new(gateway: Arc<RequestGateway<C>>, settings: ClientSettings) -> Self {
        Self { gateway, settings }
    }

    /// The gateway this client sends through.
    pub const fn gateway(&self) -> &Arc<RequestGateway<C>> {
        &self.gateway
    }

    /// Fetches the signed-in user.
    ///
    /// # Errors
    ///
    /// Fails with [`ApiError::Gateway`] when there is no session.
    pub async fn current_user(&self) -> ApiResult<User> {
        self.fetch(self.request(HttpMethod::Get, USERS_ME_PATH)).await
    }

    /// Lists games, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the page cannot be decoded.
    pub async fn games(&self, query: &GameQuery) -> ApiResult<Page<Game>> {
        let route = with_query(GAMES_PATH, query)?;
        self.fetch(self.request(HttpMethod::Get, &route)).await
    }

    /// Lists update requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the page cannot be decoded.
    pub async fn update_requests(&self, pagination: Pagination) -> ApiResult<Page<UpdateRequest>> {
        let route = with_query(UPDATES_PATH, &pagination)?;
        self.fetch(self.request(HttpMethod::Get, &route)).await
    }

    /// Queues an update for one app of a game.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the server rejects the request.
    pub async fn create_update_request(
        &self,
        body: &CreateUpdateRequest,
    ) -> ApiResult<UpdateRequest> {
        let request = self
            .request(HttpMethod::Post, UPDATE_REQUEST_PATH)
            .with_body(json_body(body)?);
        self.fetch(request).await
    }

    /// Queues an update on behalf of another user.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the server rejects the request.
    pub async fn create_system_update_request(
        &self,
        body: &CreateSystemUpdateRequest,
    ) -> ApiResult<UpdateRequest> {
        let request = self
            .request(HttpMethod::Post, SYSTEM_UPDATE_REQUEST_PATH)
            .with_body(json_body(body)?);
        self.fetch(request).await
    }

    /// Lists patch notes, optionally for one game or app.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the page cannot be decoded.
    pub async fn patch_notes(&self, query: &PatchNoteQuery) -> ApiResult<Page<PatchNote>> {
        let route = with_query(PATCH_NOTES_PATH, query)?;
        self.fetch(self.request(HttpMethod::Get, &route)).await
    }

    /// Lists the signed-in user's update subscriptions.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the page cannot be decoded.
    pub async fn subscriptions(&self, pagination: Pagination) -> ApiResult<Page<Subscription>> {
        let route = with_query(SUBSCRIPTIONS_PATH, &pagination)?;
        self.fetch(self.request(HttpMethod::Get, &route)).await
    }

    /// Subscribes to (or opts out of) updates of one app.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the server rejects the body.
    pub async fn create_subscription(&self, body: &CreateSubscription) -> ApiResult<Subscription> {
        let request = self
            .request(HttpMethod::Post, SUBSCRIPTIONS_PATH)
            .with_body(json_body(body)?);
        self.fetch(request).await
    }

    /// Lists Steam apps, optionally filtered.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the page cannot be decoded.
    pub async fn apps(&self, query: &AppQuery) -> ApiResult<Page<App>> {
        let route = with_query(APPS_PATH, query)?;
        self.fetch(self.request(HttpMethod::Get, &route)).await
    }

    /// Requests a new login code.
    ///
    /// # Errors
    ///
    /// Returns an error if the call fails or the grant cannot be decoded.
    pub async fn generate_qr_code(&self) -> ApiResult<QrCodeGrant> {
        self.fetch(self.request(HttpMethod::Post, QR_GENERATE_PATH))
            .await
    }

    /// Exchanges a confirmed code for session cookies.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the code.
    pub async fn login_with_qr_code(&self, code: &str) -> ApiResult<()> {
        let body = QrLoginRequest {
            code: code.to_string(),
        };
        let request = self
            .request(HttpMethod::Post, QR_LOGIN_PATH)
            .with_body(json_body(&body)?);
        self.send(request).await.map(drop)
    }

    /// Rotates the session cookies explicitly.
    ///
    /// # Errors
    ///
    /// Returns an error if the server refuses the refresh.
    pub async fn refresh_session(&self) -> ApiResult<()> {
        self.send(self.request(HttpMethod::Post, REFRESH_PATH))
            .await
            .map(drop)
    }

    fn request(&self, method: HttpMethod, route: &str) -> RequestSpec {
        RequestSpec::new(method, self.settings.endpoint(route))
            .with_header("Accept", "application/json")
            .with_header("Content-Type", "application/json")
            .with_timeout_ms(self.settings.request_timeout_ms)
    }

    async fn send(&self, request: RequestSpec) -> ApiResult<ResponseSpec> {
        debug!(request_id = %request.id, method = %request.method, url = %request.url, "api call");
        let response = self.gateway.execute(&request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(ApiError::from_response(&response))
        }
    }

    async fn fetch<T: DeserializeOwned>(&self, request: RequestSpec) -> ApiResult<T> {
        let response = self.send(request).await?;
        response.json().map_err(|e| ApiError::Decode(e.to_string()))
    }
}

#[async_trait]
impl<C: HttpClient> QrLoginService for ApiClient<C> {
    async fn generate_code(&self) -> Result<QrCodeGrant, ApiError> {
        self.generate_qr_code().await
    }

    async fn login_with_code(&self, code: &str) -> Result<(), ApiError> {
        self.login_with_qr_code(code).await
    }
}

fn json_body<T: Serialize>(value: &T) -> ApiResult<RequestBody> {
    RequestBody::json(value).map_err(|e| ApiError::Encode(e.to_string()))
}

fn with_query<T: Serialize>(route: &str, query: &T) -> ApiResult<String> {
    let encoded = serde_urlencoded::to_string(query).map_err(|e| ApiError::Encode(e.to_string()))?;
    if encoded.is_empty() {
        Ok(route.to_string())
    } else {
        Ok(format!("{route}?{encoded}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::gateway::GatewayConfig;
    use crate::ports::HttpFuture;

    /// Records every request and answers with a fixed response per path.
    #[derive(Default)]
    struct RecordingClient {
        seen: Mutex<Vec<RequestSpec>>,
        routes: Vec<(&'static str, u16, &'static str)>,
    }

    impl HttpClient for RecordingClient {
        fn execute<'a>(&'a self, request: &'a RequestSpec) -> HttpFuture<'a> {
            Box::pin(async move {
                self.seen.lock().push(request.clone());
                let path = request.parse_url().unwrap().path().to_string();
                let (status, body) = self
                    .routes
                    .iter()
                    .find(|(route, _, _)| path.ends_with(route))
                    .map_or((404, "{}"), |(_, status, body)| (*status, *body));
                Ok(ResponseSpec::with_status(status, body))
            })
        }
    }

    fn client(routes: Vec<(&'static str, u16, &'static str)>) -> ApiClient<RecordingClient> {
        let settings = ClientSettings::for_server("http://dashboard.test");
        let transport = RecordingClient {
            routes,
            ..RecordingClient::default()
        };
        let gateway = RequestGateway::new(
            Arc::new(transport),
            GatewayConfig::from_settings(&settings),
        );
        ApiClient::new(Arc::new(gateway), settings)
    }

    fn seen(api: &ApiClient<RecordingClient>) -> Vec<RequestSpec> {
        api.gateway().transport().seen.lock().clone()
    }

    #[tokio::test]
    async fn test_current_user() {
        let api = client(vec![(
            USERS_ME_PATH,
            200,
            r#"{"id":"1","username":"ana","firstName":"Ana","role":"ADMIN"}"#,
        )]);

        let user = api.current_user().await.unwrap();

        assert_eq!(user.username, "ana");
        let requests = seen(&api);
        assert_eq!(requests[0].url, "http://dashboard.test/api/users/me");
        assert_eq!(requests[0].headers.get("accept"), Some("application/json"));
    }

    #[tokio::test]
    async fn test_games_encodes_query() {
        let api = client(vec![(
            GAMES_PATH,
            200,
            r#"{"data":[{"id":"g1","name":"Dota 2"}],"page":2,"perPage":10,"total":11,"pageCount":2}"#,
        )]);
        let query = GameQuery {
            page: Some(2),
            limit: Some(10),
            app_name: Some("dota".to_string()),
            ..GameQuery::default()
        };

        let page = api.games(&query).await.unwrap();

        assert_eq!(page.data[0].name, "Dota 2");
        assert!(!page.has_next());
        assert_eq!(
            seen(&api)[0].url,
            "http://dashboard.test/api/games?page=2&limit=10&appName=dota"
        );
    }

    #[tokio::test]
    async fn test_login_posts_code() {
        let api = client(vec![(QR_LOGIN_PATH, 201, "")]);

        api.login_with_code("f3a1").await.unwrap();

        let request = &seen(&api)[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.body.content(), Some(r#"{"code":"f3a1"}"#));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced() {
        let api = client(vec![(
            UPDATE_REQUEST_PATH,
            409,
            r#"{"message":"Update already queued","statusCode":409}"#,
        )]);
        let body = CreateUpdateRequest {
            game_id: "g1".to_string(),
            app_id: "570".to_string(),
        };

        let err = api.create_update_request(&body).await.unwrap_err();

        assert_eq!(
            err,
            ApiError::Status {
                status: 409,
                message: "Update already queued".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_decode_failure() {
        let api = client(vec![(QR_GENERATE_PATH, 201, "not json")]);
        assert!(matches!(
            api.generate_qr_code().await,
            Err(ApiError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_patch_notes_filters_by_app() {
        let api = client(vec![(
            PATCH_NOTES_PATH,
            200,
            r#"{"data":[{"id":"p1","title":"1.2","content":"Fixes","releaseDate":"2026-03-01T00:00:00Z",
                "gameId":"g1","appId":"730","createdAt":"2026-03-01T00:00:00Z","updatedAt":"2026-03-01T00:00:00Z"}],
                "page":1,"perPage":10,"total":1,"pageCount":1}"#,
        )]);
        let query = PatchNoteQuery {
            game_id: Some("g1".to_string()),
            app_id: Some("730".to_string()),
            ..PatchNoteQuery::default()
        };

        let page = api.patch_notes(&query).await.unwrap();

        assert_eq!(page.data[0].title, "1.2");
        assert_eq!(
            seen(&api)[0].url,
            "http://dashboard.test/api/patch-notes?gameId=g1&appId=730"
        );
    }

    #[tokio::test]
    async fn test_subscriptions_round_trip() {
        let subscription = r#"{"id":"s1","isSubscribed":true,
            "app":{"id":"730","name":"CS2"},"game":{"id":"g1","name":"Counter-Strike"}}"#;
        let api = client(vec![(
            SUBSCRIPTIONS_PATH,
            200,
            r#"{"data":[{"id":"s1","isSubscribed":true,"app":{"id":"730","name":"CS2"},
                "game":{"id":"g1","name":"Counter-Strike"}}],"page":1,"perPage":10,"total":1,"pageCount":1}"#,
        )]);

        let page = api.subscriptions(Pagination::new(1, 10)).await.unwrap();
        assert_eq!(page.data[0].app.name, "CS2");
        assert_eq!(
            seen(&api)[0].url,
            "http://dashboard.test/api/subscriptions?page=1&limit=10"
        );

        let api = client(vec![(SUBSCRIPTIONS_PATH, 201, subscription)]);
        let body = CreateSubscription {
            game_id: "g1".to_string(),
            app_id: "730".to_string(),
            is_subscribed: true,
        };
        let created = api.create_subscription(&body).await.unwrap();

        assert!(created.is_subscribed);
        let request = &seen(&api)[0];
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.body.content(),
            Some(r#"{"gameId":"g1","appId":"730","isSubscribed":true}"#)
        );
    }

    #[tokio::test]
    async fn test_apps_and_system_request() {
        let api = client(vec![
            (
                APPS_PATH,
                200,
                r#"{"data":[{"id":"570","name":"Dota 2","image":null}],"page":1,"perPage":20,"total":1,"pageCount":1}"#,
            ),
            (
                SYSTEM_UPDATE_REQUEST_PATH,
                201,
                r#"{"id":"u9","status":"PENDING","gameId":"g1","appId":"570","userId":"7",
                    "createdAt":"2026-03-01T10:00:00Z","updatedAt":"2026-03-01T10:00:00Z"}"#,
            ),
        ]);
        let query = AppQuery {
            game_id: Some("g1".to_string()),
            ..AppQuery::default()
        };

        let apps = api.apps(&query).await.unwrap();
        let queued = api
            .create_system_update_request(&CreateSystemUpdateRequest {
                game_id: "g1".to_string(),
                app_id: "570".to_string(),
                user_id: "7".to_string(),
            })
            .await
            .unwrap();

        assert_eq!(apps.data[0].name, "Dota 2");
        assert_eq!(queued.user_id, "7");
        let requests = seen(&api);
        assert_eq!(requests[0].url, "http://dashboard.test/api/apps?gameId=g1");
        assert_eq!(
            requests[1].url,
            "http://dashboard.test/api/updates/request_system"
        );
    }
}
