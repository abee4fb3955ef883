//! Application state shared across handlers.

use std::sync::Arc;

use crate::config::StorefrontConfig;
use crate::db::DocumentStore;
use crate::services::auth::{AuthService, TokenService};
use crate::services::email::{EmailError, EmailService};
use crate::services::media::MediaLibrary;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// the document store, configuration and service clients.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<DocumentStore>,
    email: EmailService,
    tokens: TokenService,
    media: MediaLibrary,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Storefront configuration
    /// * `store` - Opened document store
    ///
    /// # Errors
    ///
    /// Returns an error if the email client cannot be built.
    pub fn new(config: StorefrontConfig, store: Arc<DocumentStore>) -> Result<Self, EmailError> {
        let email = EmailService::new(&config.email)?;
        let tokens = TokenService::new(&config.jwt_secret);
        let media = MediaLibrary::new(config.uploads_dir.clone());

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                store,
                email,
                tokens,
                media,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the document store.
    #[must_use]
    pub fn store(&self) -> &DocumentStore {
        &self.inner.store
    }

    /// Get a reference to the email service.
    #[must_use]
    pub fn email(&self) -> &EmailService {
        &self.inner.email
    }

    /// Get a reference to the token service.
    #[must_use]
    pub fn tokens(&self) -> &TokenService {
        &self.inner.tokens
    }

    /// Get a reference to the uploads library.
    #[must_use]
    pub fn media(&self) -> &MediaLibrary {
        &self.inner.media
    }

    /// Authentication service over this state's store and mailer.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.store(), self.email())
    }
}
