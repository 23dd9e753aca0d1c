//! # HolisticMatch API Server
//!
//! Marketplace backend for holistic-therapy professionals: registration with
//! email verification, JWT sessions, password reset, profile management and
//! search.
//!
//! ## Usage
//!
//! ```bash
//! DATABASE_URL=postgresql://... JWT_SECRET=... cargo run -p holisticmatch-api
//! ```
//!
//! Set `LOG_FORMAT=json` for JSON logs.

use anyhow::Context;
use holisticmatch_api::{
    app::{build_router, AppState},
    config::Config,
};
use holisticmatch_shared::db::{
    migrations::run_migrations,
    pool::{connect, shutdown, PoolSettings},
};
use holisticmatch_shared::services::{
    notifier::{LogNotifier, Notifier, ResendNotifier},
    photos::LocalPhotoStorage,
};
use holisticmatch_shared::store::postgres::PgStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "holisticmatch_api=debug,holisticmatch_shared=debug,tower_http=debug".into()
    });
    let registry = tracing_subscriber::registry().with(filter);

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to listen for SIGTERM");
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

    tracing::info!("Shutdown signal received, draining connections...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;
    init_tracing();

    tracing::info!(
        "HolisticMatch API Server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let pool = connect(&PoolSettings::new(
        config.database.url.clone(),
        config.database.max_connections,
    ))
    .await
    .context("Failed to connect to the database")?;

    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    let notifier: Arc<dyn Notifier> = match &config.email.resend_api_key {
        Some(key) => {
            tracing::info!(from = %config.email.from, "Sending email through Resend");
            Arc::new(ResendNotifier::new(key.clone(), config.email.from.clone()))
        }
        None => {
            tracing::warn!("RESEND_API_KEY not set; emails will only be logged");
            Arc::new(LogNotifier)
        }
    };

    tokio::fs::create_dir_all(&config.media.root)
        .await
        .with_context(|| format!("Failed to create media root {}", config.media.root))?;
    let photos = LocalPhotoStorage::new(&config.media.root, &config.media.url);

    let bind_address = config.bind_address();
    let state = AppState::new(
        config,
        Arc::new(PgStore::new(pool.clone())),
        notifier,
        Arc::new(photos),
    )?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;

    tracing::info!("Server listening on http://{}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    shutdown(pool).await;
    tracing::info!("Server stopped");

    Ok(())
}
