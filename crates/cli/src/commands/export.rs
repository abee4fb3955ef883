//! Dump the current document as pretty JSON.

use std::path::Path;

use thiserror::Error;
use tokio::io::AsyncWriteExt;

use super::{Access, OpenError, open_store};

/// Errors that can occur during export.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Open(#[from] OpenError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Write the normalized document to `output`, or stdout when `None`.
///
/// # Errors
///
/// Returns `ExportError` if the store cannot be opened or the output written.
pub async fn run(output: Option<&Path>) -> Result<(), ExportError> {
    let store = open_store(Access::Read).await?;
    let document = store.export();
    store.close().await;

    let mut json = serde_json::to_vec_pretty(&document)?;
    json.push(b'\n');

    match output {
        Some(path) => {
            tokio::fs::write(path, &json).await?;
            tracing::info!(path = %path.display(), bytes = json.len(), "Document exported");
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout.write_all(&json).await?;
            stdout.flush().await?;
        }
    }
    Ok(())
}
