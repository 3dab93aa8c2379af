mod config;
mod message;
mod rate_limit;
mod routes;
mod services;
mod state;

use std::process::ExitCode;

use crate::config::ServerConfig;
use crate::services::auth::TokenStore;

#[tokio::main]
async fn main() -> ExitCode {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            eprintln!("failed to load .env: {e}");
        }
    }
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "collab server failed");
            ExitCode::FAILURE
        }
    }
}

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Auth(#[from] services::auth::AuthError),
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

async fn run() -> Result<(), StartupError> {
    let config = ServerConfig::from_env()?;

    let tokens = match &config.users_file {
        Some(path) => TokenStore::load(path, config.allow_guests)?,
        None => TokenStore::new(config.allow_guests),
    };
    if tokens.is_empty() && !config.allow_guests {
        tracing::warn!("no users configured and guests disabled; every connection will be rejected");
    }
    tracing::info!(users = tokens.len(), allow_guests = config.allow_guests, "token store ready");

    let state = state::AppState::new(tokens, &config);
    let app = routes::app(state);

    let port = config.port;
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .map_err(|source| StartupError::Bind { port, source })?;

    tracing::info!(%port, "collab server listening");
    axum::serve(listener, app).await.map_err(StartupError::Serve)
}
