//! Document store persistence.
//!
//! # Storage modes
//!
//! The whole storefront lives in one JSON [`Document`](crate::models::Document)
//! held in memory and persisted after every write:
//!
//! - **File mode** (no `DATABASE_URL`): the seed file itself is the database,
//!   rewritten atomically on each persist.
//! - **Postgres mode**: a single row (`id = 1`) of the `app_state` table holds
//!   the document as JSONB. An empty table is initialized from the seed file.
//!
//! Writes are serialized through one persistence queue; see [`DocumentStore`].

mod normalize;
mod store;

pub use normalize::{AdminSeed, normalize};
pub use store::{DocumentStore, StoreMode, StoreOptions, load_row, read_seed, save_row};

use std::path::PathBuf;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions, PgSslMode};
use thiserror::Error;

/// Row of `app_state` that holds the document.
pub const STORE_ROW_ID: i32 = 1;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The seed document does not exist.
    #[error("seed file not found: {}", .0.display())]
    SeedMissing(PathBuf),

    /// Filesystem error while reading or persisting.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored document is not valid JSON for the current schema.
    #[error("invalid document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Write attempted after [`DocumentStore::close`].
    #[error("store is closed")]
    Closed,
}

/// Create a `PostgreSQL` connection pool for the document store.
///
/// TLS is preferred unless the URL carries its own `sslmode` parameter.
///
/// # Errors
///
/// Returns `sqlx::Error` if the URL is invalid or the connection cannot be established.
pub async fn create_pool(database_url: &SecretString) -> Result<PgPool, sqlx::Error> {
    let url = database_url.expose_secret();
    let mut options: PgConnectOptions = url.parse()?;
    if !url.contains("sslmode=") {
        options = options.ssl_mode(PgSslMode::Prefer);
    }

    PgPoolOptions::new()
        .max_connections(5)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await
}

/// Create the `app_state` table if it does not exist yet.
///
/// # Errors
///
/// Returns `sqlx::Error` if the DDL fails.
pub async fn ensure_schema(pool: &PgPool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS app_state (
            id INTEGER PRIMARY KEY,
            data JSONB NOT NULL,
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await?;
    Ok(())
}
