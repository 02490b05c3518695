//! Subcommand implementations.

use std::sync::Arc;

use anyhow::{Context as _, bail};
use patchgate_application::{
    ApiClient, AuthSession, GatewayConfig, HandshakeError, HandshakeState, QrHandshake,
    RequestGateway,
};
use patchgate_domain::{
    AppQuery, ClientSettings, CreateSubscription, CreateSystemUpdateRequest, CreateUpdateRequest,
    GameQuery, Page, Pagination, PatchNoteQuery, User,
};
use patchgate_infrastructure::{ReqwestHttpClient, SocketIoChannel, SystemClock};
use tracing::{info, warn};

/// How many codes `login` requests before giving up.
const MAX_CODES: u32 = 3;

/// Wired-up client stack shared by all commands.
pub struct Context {
    settings: ClientSettings,
    api: Arc<ApiClient<ReqwestHttpClient>>,
    session: Arc<AuthSession<ReqwestHttpClient>>,
}

impl Context {
    /// Builds the transport, gateway, API client and session cache.
    pub fn new(settings: ClientSettings) -> anyhow::Result<Self> {
        let transport = ReqwestHttpClient::from_settings(&settings)?;
        let gateway = RequestGateway::new(
            Arc::new(transport),
            GatewayConfig::from_settings(&settings),
        );
        let api = Arc::new(ApiClient::new(Arc::new(gateway), settings.clone()));
        let session = Arc::new(AuthSession::new(Arc::clone(&api)));
        Ok(Self {
            settings,
            api,
            session,
        })
    }

    /// Returns the signed-in user, running the QR login if needed.
    async fn ensure_session(&self) -> anyhow::Result<User> {
        if let Some(user) = self.session.check_auth().await? {
            return Ok(user);
        }
        self.sign_in().await
    }

    /// Runs the QR login until it succeeds, fails or is interrupted.
    async fn sign_in(&self) -> anyhow::Result<User> {
        let channel = Arc::new(SocketIoChannel::new(self.settings.push_channel()));
        let mut handshake = QrHandshake::new(
            Arc::clone(&self.api),
            channel,
            Arc::new(SystemClock::new()),
        )
        .with_listener(Arc::clone(&self.session) as _);

        let outcome = tokio::select! {
            outcome = drive_login(&mut handshake) => outcome,
            _ = tokio::signal::ctrl_c() => Err(anyhow::anyhow!("login cancelled")),
        };
        handshake.abandon().await;
        outcome?;

        self.session
            .current_user()
            .await
            .context("signed in, but the server did not return the user")
    }
}

async fn drive_login(
    handshake: &mut QrHandshake<ApiClient<ReqwestHttpClient>, SocketIoChannel>,
) -> anyhow::Result<()> {
    for _ in 0..MAX_CODES {
        let grant = handshake.request_code().await?;
        println!("Confirm this login code in the dashboard app: {}", grant.code);
        println!("The code expires at {}", grant.expires_at.format("%H:%M:%S UTC"));

        loop {
            match handshake.run().await {
                Ok(HandshakeState::Authenticated) => return Ok(()),
                Ok(HandshakeState::Expired { .. }) => {
                    println!("The code expired.");
                    break;
                }
                Ok(HandshakeState::NotFound { .. }) => bail!("the server no longer knows this code"),
                Ok(other) => bail!("login stopped in state {other:?}"),
                Err(HandshakeError::Login(error)) => {
                    warn!(%error, "code confirmed but login failed, still waiting");
                }
                Err(error) => return Err(error.into()),
            }
        }
    }
    bail!("no code was confirmed after {MAX_CODES} attempts")
}

/// `login`
pub async fn login(context: &Context) -> anyhow::Result<()> {
    let user = context.sign_in().await?;
    info!(user_id = %user.id, "signed in");
    println!("Signed in as {} (@{})", user.display_name(), user.username);
    Ok(())
}

/// `whoami`
pub async fn whoami(context: &Context) -> anyhow::Result<()> {
    match context.session.check_auth().await? {
        Some(user) => println!("{} (@{}) - {:?}", user.display_name(), user.username, user.role),
        None => println!("Not signed in"),
    }
    Ok(())
}

/// `games`
pub async fn games(
    context: &Context,
    page: Option<u32>,
    limit: Option<u32>,
    name: Option<String>,
    app_id: Option<String>,
) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let query = GameQuery {
        page,
        limit,
        app_id,
        name,
        ..GameQuery::default()
    };
    let games = context.api.games(&query).await?;
    for game in &games.data {
        let version = game
            .version
            .map_or_else(|| "-".to_string(), |v| v.to_string());
        println!("{:<26} {:<40} {version}", game.id, game.name);
    }
    print_footer(&games, "games");
    Ok(())
}

/// `updates`
pub async fn updates(
    context: &Context,
    page: Option<u32>,
    limit: Option<u32>,
) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let requests = context
        .api
        .update_requests(Pagination { page, limit })
        .await?;
    for request in &requests.data {
        let status = format!("{:?}", request.status);
        println!(
            "{:<26} {status:<10} app {:<10} {}",
            request.id,
            request.app_id,
            request.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    print_footer(&requests, "requests");
    Ok(())
}

/// `request-update`
pub async fn request_update(
    context: &Context,
    game_id: String,
    app_id: String,
    for_user: Option<String>,
) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let request = match for_user {
        Some(user_id) => {
            let body = CreateSystemUpdateRequest {
                game_id,
                app_id,
                user_id,
            };
            context.api.create_system_update_request(&body).await?
        }
        None => {
            let body = CreateUpdateRequest { game_id, app_id };
            context.api.create_update_request(&body).await?
        }
    };
    println!("Queued update {} ({:?})", request.id, request.status);
    Ok(())
}

/// `patch-notes`
pub async fn patch_notes(context: &Context, query: &PatchNoteQuery) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let notes = context.api.patch_notes(query).await?;
    for note in &notes.data {
        let version = note.version.as_deref().unwrap_or("-");
        println!(
            "{} {:<10} {:<10} {}",
            note.release_date.format("%Y-%m-%d"),
            note.app_id,
            version,
            note.title
        );
    }
    print_footer(&notes, "patch notes");
    Ok(())
}

/// `apps`
pub async fn apps(context: &Context, query: &AppQuery) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let apps = context.api.apps(query).await?;
    for app in &apps.data {
        println!("{:<12} {}", app.id, app.name);
    }
    print_footer(&apps, "apps");
    Ok(())
}

/// `subscriptions`
pub async fn subscriptions(context: &Context, pagination: Pagination) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let subscriptions = context.api.subscriptions(pagination).await?;
    for subscription in &subscriptions.data {
        let mark = if subscription.is_subscribed { "on" } else { "off" };
        println!(
            "{mark:<4} {:<30} {:<12} {}",
            subscription.game.name, subscription.app.id, subscription.app.name
        );
    }
    print_footer(&subscriptions, "subscriptions");
    Ok(())
}

/// `subscribe`
pub async fn subscribe(context: &Context, body: &CreateSubscription) -> anyhow::Result<()> {
    context.ensure_session().await?;
    let subscription = context.api.create_subscription(body).await?;
    let verb = if subscription.is_subscribed {
        "Subscribed to"
    } else {
        "Unsubscribed from"
    };
    println!("{verb} {} ({})", subscription.app.name, subscription.game.name);
    Ok(())
}

fn print_footer<T>(page: &Page<T>, noun: &str) {
    println!("page {}/{} ({} {noun})", page.page, page.page_count, page.total);
}
