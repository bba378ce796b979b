// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::process;

use drink_menu_server::{
    api::router,
    auth::{AuthGate, TokenVerifier},
    config::{AuthConfig, LogFormat, ServerConfig, DEFAULT_LOG_FILTER},
    state::AppState,
    store::InMemoryStore,
};
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() {
    let server_config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid server configuration: {e}");
            process::exit(1);
        }
    };

    init_tracing(server_config.log_format);

    let auth_config = match AuthConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid auth configuration");
            process::exit(1);
        }
    };

    let verifier = match TokenVerifier::from_config(&auth_config) {
        Ok(verifier) => verifier,
        Err(e) => {
            error!(error = %e, "Failed to build JWKS client");
            process::exit(1);
        }
    };

    info!(
        issuer = %auth_config.issuer,
        audience = %auth_config.audience,
        jwks_url = %auth_config.jwks_url,
        "Auth configured"
    );

    let state = AppState::new(InMemoryStore::seeded(), AuthGate::new(verifier));
    let app = router(state);

    let addr = server_config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind listen address");

    info!("Drink menu server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("HTTP server failed");
}

fn init_tracing(format: LogFormat) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).init(),
        LogFormat::Pretty => registry.with(fmt::layer()).init(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
