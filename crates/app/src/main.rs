//! Patchgate - Main Entry Point
//!
//! Command line front end for the dashboard client: signs in with a QR
//! code and talks to the REST API through the session-refreshing gateway.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use patchgate_domain::{AppQuery, CreateSubscription, Pagination, PatchNoteQuery};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use commands::Context;

#[derive(Parser)]
#[command(name = "patchgate", version, about = "Patchgate game update dashboard client")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Settings file (defaults to the platform config directory).
    #[arg(long, global = true, env = "PATCHGATE_CONFIG")]
    config: Option<PathBuf>,

    /// API server URL, overriding the settings file.
    #[arg(long, global = true)]
    server: Option<String>,

    /// Log level used when `RUST_LOG` is not set.
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in by confirming a QR code on another device.
    Login,
    /// Show the signed-in user.
    Whoami,
    /// List games.
    Games {
        /// Page number.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Filter by game name.
        #[arg(long)]
        name: Option<String>,
        /// Filter by Steam app id.
        #[arg(long)]
        app_id: Option<String>,
    },
    /// List update requests.
    Updates {
        /// Page number.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Queue an update for one app of a game.
    RequestUpdate {
        /// Game id.
        #[arg(long)]
        game_id: String,
        /// Steam app id.
        #[arg(long)]
        app_id: String,
        /// File the request for this user instead of yourself.
        #[arg(long)]
        for_user: Option<String>,
    },
    /// List patch notes.
    PatchNotes {
        /// Page number.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Only notes of this game.
        #[arg(long)]
        game_id: Option<String>,
        /// Only notes of this Steam app.
        #[arg(long)]
        app_id: Option<String>,
    },
    /// List Steam apps.
    Apps {
        /// Page number.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
        /// Filter by app name.
        #[arg(long)]
        name: Option<String>,
        /// Only apps of this game.
        #[arg(long)]
        game_id: Option<String>,
    },
    /// List your update subscriptions.
    Subscriptions {
        /// Page number.
        #[arg(long)]
        page: Option<u32>,
        /// Page size.
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Subscribe to updates of one app.
    Subscribe {
        /// Game id.
        #[arg(long)]
        game_id: String,
        /// Steam app id.
        #[arg(long)]
        app_id: String,
        /// Opt out instead.
        #[arg(long)]
        off: bool,
    },
}

fn init_tracing(level: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let mut settings = patchgate_infrastructure::load_settings(cli.config.as_deref())?;
    if let Some(server) = cli.server {
        settings.api_url = server;
        settings.validate()?;
    }
    tracing::debug!(api_url = %settings.api_url, "settings loaded");

    let context = Context::new(settings)?;
    match cli.command {
        Command::Login => commands::login(&context).await,
        Command::Whoami => commands::whoami(&context).await,
        Command::Games {
            page,
            limit,
            name,
            app_id,
        } => commands::games(&context, page, limit, name, app_id).await,
        Command::Updates { page, limit } => commands::updates(&context, page, limit).await,
        Command::RequestUpdate {
            game_id,
            app_id,
            for_user,
        } => commands::request_update(&context, game_id, app_id, for_user).await,
        Command::PatchNotes {
            page,
            limit,
            game_id,
            app_id,
        } => {
            let query = PatchNoteQuery {
                page,
                limit,
                game_id,
                app_id,
            };
            commands::patch_notes(&context, &query).await
        }
        Command::Apps {
            page,
            limit,
            name,
            game_id,
        } => {
            let query = AppQuery {
                page,
                limit,
                name,
                game_id,
            };
            commands::apps(&context, &query).await
        }
        Command::Subscriptions { page, limit } => {
            commands::subscriptions(&context, Pagination { page, limit }).await
        }
        Command::Subscribe {
            game_id,
            app_id,
            off,
        } => {
            let body = CreateSubscription {
                game_id,
                app_id,
                is_subscribed: !off,
            };
            commands::subscribe(&context, &body).await
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_request_update() {
        let cli = Cli::try_parse_from([
            "patchgate",
            "--server",
            "https://dash.example.com",
            "request-update",
            "--game-id",
            "g1",
            "--app-id",
            "730",
        ])
        .unwrap();

        assert_eq!(cli.server.as_deref(), Some("https://dash.example.com"));
        assert!(matches!(
            cli.command,
            Command::RequestUpdate { ref game_id, ref app_id, for_user: None }
                if game_id == "g1" && app_id == "730"
        ));
    }

    #[test]
    fn test_parse_subscribe_off() {
        let cli = Cli::try_parse_from([
            "patchgate",
            "subscribe",
            "--game-id",
            "g1",
            "--app-id",
            "730",
            "--off",
        ])
        .unwrap();

        assert!(matches!(cli.command, Command::Subscribe { off: true, .. }));
    }
}
