// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::{future::IntoFuture, process::ExitCode, sync::Arc};

use keygate::{
    api::router,
    auth::{Authenticator, KeyStore, KeyStoreError},
    config::{Config, ConfigError, LogFormat},
    logging,
    state::AppState,
    users::{InMemoryUserStore, NewUser, UserStore, UserStoreError},
};
use tokio::{net::TcpListener, task::JoinError};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, warn};

#[derive(Debug, thiserror::Error)]
enum StartupError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("signing keys: {0}")]
    Keys(#[from] KeyStoreError),

    #[error("seeding admin user: {0}")]
    Seed(#[from] UserStoreError),

    #[error("server I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("server task: {0}")]
    Join(#[from] JoinError),
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            logging::init(LogFormat::default());
            error!(error = %StartupError::from(e), "Keygate failed to start");
            return ExitCode::FAILURE;
        }
    };
    logging::init(config.log_format);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Keygate stopped with an error");
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> Result<(), StartupError> {
    info!(?config, "Starting keygate");

    let keys = KeyStore::load_dir(&config.keys_dir, &info_span!("keystore"))?;
    info!(kids = ?keys.kids(), "Signing keys loaded");

    let authenticator = Arc::new(Authenticator::new(
        Arc::new(keys),
        config.issuer.clone(),
        info_span!("auth"),
    ));

    let users = Arc::new(InMemoryUserStore::new());
    if let Some(seed) = &config.seed_admin {
        let admin = users
            .create(NewUser {
                name: "Administrator".to_string(),
                email: seed.email.clone(),
                password: seed.password.clone(),
                roles: ["admin".to_string()].into(),
                enabled: true,
            })
            .await?;
        info!(user_id = %admin.id, email = %admin.email, "Seeded admin user");
    }

    let app = router(AppState::new(
        authenticator,
        users,
        config.token_ttl,
        info_span!("api"),
    ));

    let listener = TcpListener::bind(config.bind_addr()).await?;
    info!(addr = %listener.local_addr()?, "Keygate listening (docs at /docs)");

    let shutdown = CancellationToken::new();
    tokio::spawn(watch_signals(shutdown.clone()));

    let mut server = tokio::spawn(
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown.clone().cancelled_owned())
            .into_future(),
    );

    tokio::select! {
        result = &mut server => return Ok(result??),
        _ = shutdown.cancelled() => {}
    }

    info!(
        timeout_secs = config.shutdown_timeout.as_secs(),
        "Draining open connections"
    );
    match tokio::time::timeout(config.shutdown_timeout, &mut server).await {
        Ok(result) => result??,
        Err(_) => {
            warn!("Graceful shutdown timed out, dropping open connections");
            server.abort();
        }
    }

    info!("Keygate stopped");
    Ok(())
}

/// Cancel `shutdown` on SIGINT or SIGTERM.
async fn watch_signals(shutdown: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
            (Ok(mut sigterm), Ok(mut sigint)) => {
                tokio::select! {
                    _ = sigterm.recv() => info!("Received SIGTERM"),
                    _ = sigint.recv() => info!("Received SIGINT"),
                }
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "Failed to register signal handlers, falling back to Ctrl+C");
                let _ = tokio::signal::ctrl_c().await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C");
    }

    shutdown.cancel();
}
