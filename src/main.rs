mod api;
mod background;
mod cli;
mod config;
mod constants;
mod handlers;
mod server;
mod state;
mod util;


use std::env;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use rustls::crypto::ring::default_provider;
use rustls::crypto::CryptoProvider;
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::api::ApiClient;
use crate::background::run_leaderboard_poller;
use crate::cli::lookup_player;
use crate::config::Config;
use crate::server::build_router;
use crate::state::AppState;
use crate::util::env_flag;

#[cfg(unix)]
use tokio::signal::unix::{signal, SignalKind};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "leaderboard_watch=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    CryptoProvider::install_default(default_provider())
        .map_err(|_| anyhow!("Failed to install rustls crypto provider"))?;

    let config = Config::from_env()?;
    let api = ApiClient::new(config.api_base_url.clone(), config.request_timeout)?;

    let args: Vec<String> = env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None | Some("serve") => {
            serve(config, api).await?;
            Ok(ExitCode::SUCCESS)
        }
        Some("lookup") => {
            let player_id = args.get(1).map(String::as_str).unwrap_or("");
            let found = lookup_player(&api, player_id, config.lookup_detail, |message| {
                println!("{}", message.text);
            })
            .await;
            Ok(if found {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Some(other) => Err(anyhow!(
            "unknown command {:?}; usage: leaderboard-watch [serve | lookup <player-id>]",
            other
        )),
    }
}

async fn serve(config: Config, api: ApiClient) -> Result<()> {
    let state = AppState::new(config.clone(), api);

    if env_flag(env::var("DISABLE_BACKGROUND_TASKS").ok()) {
        warn!("background tasks disabled via DISABLE_BACKGROUND_TASKS");
    } else {
        tokio::spawn(run_leaderboard_poller(Arc::clone(&state)));
    }

    let app = build_router(Arc::clone(&state));

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("leaderboard-watch listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal(Arc::clone(&state)))
    .await
    .context("server error")?;

    Ok(())
}

async fn shutdown_signal(state: Arc<AppState>) {
    #[cfg(unix)]
    {
        let ctrl_c = tokio::signal::ctrl_c();
        let terminate = match signal(SignalKind::terminate()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!(?err, "failed to install SIGTERM handler");
                None
            }
        };
        let quit = match signal(SignalKind::quit()) {
            Ok(signal) => Some(signal),
            Err(err) => {
                warn!(?err, "failed to install SIGQUIT handler");
                None
            }
        };

        tokio::select! {
            _ = ctrl_c => {},
            _ = async {
                if let Some(mut signal) = terminate {
                    signal.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {},
            _ = async {
                if let Some(mut signal) = quit {
                    signal.recv().await;
                } else {
                    std::future::pending::<()>().await;
                }
            } => {},
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }

    info!("shutting down");
    state.broadcast_shutdown().await;
}
