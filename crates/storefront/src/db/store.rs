//! The in-memory document and its persistence queue.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError, RwLock};

use chrono::Utc;
use secrecy::SecretString;
use sqlx::PgPool;
use sqlx::types::Json;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::DataConfig;
use crate::models::Document;

use super::{AdminSeed, STORE_ROW_ID, StoreError, create_pool, ensure_schema, normalize};

/// Where the document is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreMode {
    /// Local JSON file.
    File,
    /// Single JSONB row in Postgres.
    Postgres,
}

impl fmt::Display for StoreMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File => f.write_str("file"),
            Self::Postgres => f.write_str("postgres"),
        }
    }
}

/// Settings for [`DocumentStore::open`].
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Postgres connection string; file mode when `None`.
    pub database_url: Option<SecretString>,
    /// Seed document, and the database itself in file mode.
    pub seed_path: PathBuf,
    /// Administrator re-seeded on every normalization.
    pub admin: AdminSeed,
}

impl StoreOptions {
    /// Options for the store described by `data`.
    #[must_use]
    pub fn new(data: &DataConfig, admin: AdminSeed) -> Self {
        Self {
            database_url: data.database_url.clone(),
            seed_path: data.data_path.clone(),
            admin,
        }
    }

    /// File-mode options for `seed_path`.
    #[must_use]
    pub const fn file(seed_path: PathBuf, admin: AdminSeed) -> Self {
        Self {
            database_url: None,
            seed_path,
            admin,
        }
    }
}

#[derive(Clone)]
enum Backend {
    File(PathBuf),
    Postgres(PgPool),
}

impl Backend {
    const fn mode(&self) -> StoreMode {
        match self {
            Self::File(_) => StoreMode::File,
            Self::Postgres(_) => StoreMode::Postgres,
        }
    }

    async fn save(&self, doc: &Document) -> Result<(), StoreError> {
        match self {
            Self::File(path) => write_file(path, doc).await,
            Self::Postgres(pool) => save_row(pool, doc).await,
        }
    }
}

/// Shared handle to the storefront document.
///
/// Reads and writes run synchronously against the in-memory copy. Every
/// successful write enqueues a full snapshot for a single background task,
/// so snapshots reach the backend in the order the writes happened.
pub struct DocumentStore {
    document: RwLock<Document>,
    admin: AdminSeed,
    mode: StoreMode,
    pool: Option<PgPool>,
    queue: Mutex<Option<mpsc::UnboundedSender<Document>>>,
    persister: Mutex<Option<JoinHandle<()>>>,
}

impl DocumentStore {
    /// Load (or seed) the document and start the persistence task.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the seed file is missing or invalid, or the
    /// database cannot be reached.
    pub async fn open(options: StoreOptions) -> Result<Self, StoreError> {
        let (backend, mut document) = match &options.database_url {
            Some(url) => {
                let pool = create_pool(url).await?;
                ensure_schema(&pool).await?;
                let document = match load_row(&pool).await? {
                    Some(document) => document,
                    None => {
                        tracing::info!(path = %options.seed_path.display(), "initializing app_state from seed");
                        read_seed(&options.seed_path).await?
                    }
                };
                (Backend::Postgres(pool), document)
            }
            None => {
                let document = read_seed(&options.seed_path).await?;
                (Backend::File(options.seed_path.clone()), document)
            }
        };

        normalize(&mut document, &options.admin, Utc::now());
        backend.save(&document).await?;

        let mode = backend.mode();
        let pool = match &backend {
            Backend::Postgres(pool) => Some(pool.clone()),
            Backend::File(_) => None,
        };
        let (sender, receiver) = mpsc::unbounded_channel();
        let persister = tokio::spawn(persist_snapshots(backend, receiver));

        tracing::info!(%mode, users = document.users.len(), products = document.products.len(), "store initialized");

        Ok(Self {
            document: RwLock::new(document),
            admin: options.admin,
            mode,
            pool,
            queue: Mutex::new(Some(sender)),
            persister: Mutex::new(Some(persister)),
        })
    }

    /// Which backend this store persists to.
    #[must_use]
    pub const fn mode(&self) -> StoreMode {
        self.mode
    }

    /// Run `f` against the current document.
    pub fn read<R>(&self, f: impl FnOnce(&Document) -> R) -> R {
        let doc = self.document.read().unwrap_or_else(PoisonError::into_inner);
        f(&doc)
    }

    /// Apply an infallible mutation and persist the result.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Closed` after [`close`](Self::close).
    pub fn write<R>(&self, mutate: impl FnOnce(&mut Document) -> R) -> Result<R, StoreError> {
        self.try_write(|doc| Ok::<_, StoreError>(mutate(doc)))
    }

    /// Apply a fallible mutation, persisting only when it succeeds.
    ///
    /// The closure should validate before it mutates: an error leaves any
    /// changes already made in memory without persisting them.
    ///
    /// # Errors
    ///
    /// Returns the closure's error, or `StoreError::Closed` converted into `E`.
    pub fn try_write<R, E>(
        &self,
        mutate: impl FnOnce(&mut Document) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut doc = self.document.write().unwrap_or_else(PoisonError::into_inner);
        let value = mutate(&mut doc)?;
        normalize(&mut doc, &self.admin, Utc::now());

        // Enqueue under the document lock so queue order matches write order.
        let queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let sender = queue.as_ref().ok_or(StoreError::Closed)?;
        sender
            .send(doc.clone())
            .map_err(|_| StoreError::Closed)?;
        Ok(value)
    }

    /// A copy of the current document.
    #[must_use]
    pub fn export(&self) -> Document {
        self.read(Document::clone)
    }

    /// Stop accepting writes, wait for queued snapshots to be persisted and
    /// release the database pool.
    pub async fn close(&self) {
        drop(self.queue.lock().unwrap_or_else(PoisonError::into_inner).take());

        let persister = self
            .persister
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(persister) = persister
            && let Err(e) = persister.await
        {
            tracing::error!(error = %e, "persistence task failed");
        }

        if let Some(pool) = &self.pool {
            pool.close().await;
        }
        tracing::info!(mode = %self.mode, "store closed");
    }
}

async fn persist_snapshots(backend: Backend, mut queue: mpsc::UnboundedReceiver<Document>) {
    while let Some(mut snapshot) = queue.recv().await {
        // Each snapshot is the whole document, so only the newest pending one matters.
        while let Ok(newer) = queue.try_recv() {
            snapshot = newer;
        }
        if let Err(e) = backend.save(&snapshot).await {
            tracing::error!(error = %e, mode = %backend.mode(), "failed to persist document");
        }
    }
}

/// Read and parse the seed document.
///
/// # Errors
///
/// Returns `StoreError::SeedMissing` if the file does not exist, or an
/// I/O or parse error.
pub async fn read_seed(path: &Path) -> Result<Document, StoreError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StoreError::SeedMissing(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_slice(&bytes)?)
}

/// Load the stored document row, if any.
///
/// # Errors
///
/// Returns `StoreError::Database` on query or decode failure.
pub async fn load_row(pool: &PgPool) -> Result<Option<Document>, StoreError> {
    let row: Option<Json<Document>> =
        sqlx::query_scalar("SELECT data FROM app_state WHERE id = $1")
            .bind(STORE_ROW_ID)
            .fetch_optional(pool)
            .await?;
    Ok(row.map(|Json(document)| document))
}

/// Insert or replace the stored document row.
///
/// # Errors
///
/// Returns `StoreError::Database` on query failure.
pub async fn save_row(pool: &PgPool, doc: &Document) -> Result<(), StoreError> {
    sqlx::query(
        r"
        INSERT INTO app_state (id, data, updated_at)
        VALUES ($1, $2, NOW())
        ON CONFLICT (id) DO UPDATE SET data = EXCLUDED.data, updated_at = NOW()
        ",
    )
    .bind(STORE_ROW_ID)
    .bind(Json(doc))
    .execute(pool)
    .await?;
    Ok(())
}

/// Write pretty JSON to a sibling temp file, then rename over `path`.
async fn write_file(path: &Path, doc: &Document) -> Result<(), StoreError> {
    let json = serde_json::to_vec_pretty(doc)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
