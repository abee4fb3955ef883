//! HEMBIT Storefront - JSON API for the shop frontend and admin back office.
//!
//! This binary serves `/api` and `/uploads` on port 5000 by default.
//!
//! # Architecture
//!
//! - Axum web framework, JSON in and out
//! - One JSON document held in memory, persisted to a local file or a single
//!   Postgres row by a background task
//! - Stateless JWT bearer auth, OTP emails through Brevo (or logged locally)
//! - Sentry error tracking and `tracing` logs

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use hembit_storefront::config::StorefrontConfig;
use hembit_storefront::db::{DocumentStore, StoreOptions};
use hembit_storefront::middleware::RateLimits;
use hembit_storefront::routes;
use hembit_storefront::services::auth::admin_seed;
use hembit_storefront::state::AppState;

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &StorefrontConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // Load configuration from environment (needed for Sentry init)
    let config = StorefrontConfig::from_env().expect("Failed to load configuration");

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "hembit_storefront=info,tower_http=debug".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    if config.data.uses_default_admin_password() {
        tracing::warn!(
            email = %config.data.admin_email,
            "admin account uses the default password; set HEMBIT_ADMIN_PASSWORD"
        );
    }

    // Open the document store (seeds and normalizes on first start)
    let admin = admin_seed(&config.data).expect("Failed to prepare admin account");
    let store = Arc::new(
        DocumentStore::open(StoreOptions::new(&config.data, admin))
            .await
            .expect("Failed to open document store"),
    );

    let state = AppState::new(config.clone(), Arc::clone(&store))
        .expect("Failed to initialize application state");

    let app = routes::app(state, RateLimits::Enabled)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    // Start server
    let addr = config.socket_addr();
    tracing::info!(mode = %store.mode(), "storefront listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Server error");

    // Flush pending writes before exit
    store.close().await;
    tracing::info!("store flushed, exiting");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
