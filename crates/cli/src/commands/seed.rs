//! Load the seed document into Postgres.
//!
//! The server initializes an empty `app_state` table on its own; this command
//! exists for resetting a deployed database back to the shipped seed.
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` - `PostgreSQL` connection string (required)
//! - `HEMBIT_DATA_PATH` - Seed document to load

use chrono::Utc;
use thiserror::Error;
use tracing::info;

use hembit_storefront::config::{ConfigError, DataConfig};
use hembit_storefront::db::{
    StoreError, create_pool, ensure_schema, load_row, normalize, read_seed, save_row,
};
use hembit_storefront::services::auth::{AuthError, admin_seed};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Seeding only applies to Postgres mode.
    #[error("DATABASE_URL is not set; in file mode the seed file is already the database")]
    NoDatabase,

    /// A document is already stored.
    #[error("app_state already holds a document; pass --force to overwrite it")]
    AlreadySeeded,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// Database connection error.
    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Write the normalized seed file into row 1 of `app_state`.
///
/// # Errors
///
/// Returns `SeedError::AlreadySeeded` if a row exists and `force` is false.
pub async fn run(force: bool) -> Result<(), SeedError> {
    let data = DataConfig::from_env()?;
    let database_url = data.database_url.as_ref().ok_or(SeedError::NoDatabase)?;

    info!("Connecting to database...");
    let pool = create_pool(database_url).await?;
    ensure_schema(&pool).await?;

    if load_row(&pool).await?.is_some() {
        if !force {
            return Err(SeedError::AlreadySeeded);
        }
        tracing::warn!(
            "Overwriting the existing document; restart the storefront server so it reloads it"
        );
    }

    let mut document = read_seed(&data.data_path).await?;
    normalize(&mut document, &admin_seed(&data)?, Utc::now());
    save_row(&pool, &document).await?;

    info!(
        path = %data.data_path.display(),
        users = document.users.len(),
        products = document.products.len(),
        orders = document.orders.len(),
        "Seed loaded"
    );
    pool.close().await;
    Ok(())
}
