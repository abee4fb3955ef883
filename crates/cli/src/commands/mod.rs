//! Command implementations.

pub mod admin;
pub mod export;
pub mod seed;

use hembit_storefront::config::{ConfigError, DataConfig};
use hembit_storefront::db::{DocumentStore, StoreError, StoreOptions};
use hembit_storefront::services::auth::{AuthError, admin_seed};
use thiserror::Error;

/// Errors while opening the document store.
#[derive(Debug, Error)]
pub enum OpenError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a command does with the document once it is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Update,
}

/// Printed under the help of every command that changes the document.
///
/// A running server keeps the whole document in memory and saves all of it
/// on its next write, which would discard a change made here.
pub const STOP_SERVER_NOTE: &str = "Stop the storefront server before running this command. \
A running server saves its in-memory document on the next write and would overwrite the change.";

/// Open the store the server would open, from the same environment.
pub async fn open_store(access: Access) -> Result<DocumentStore, OpenError> {
    let data = DataConfig::from_env()?;
    let admin = admin_seed(&data)?;
    let store = DocumentStore::open(StoreOptions::new(&data, admin)).await?;
    tracing::info!(mode = %store.mode(), "document store opened");
    if access == Access::Update {
        tracing::warn!(
            mode = %store.mode(),
            "updating the document directly; changes are lost if the storefront server is running"
        );
    }
    Ok(store)
}
