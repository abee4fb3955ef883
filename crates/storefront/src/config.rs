//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Token signing secret (min 32 chars, high entropy)
//!
//! ## Optional
//! - `HEMBIT_HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 5000)
//! - `DATABASE_URL` - `PostgreSQL` connection string; file mode when unset
//! - `HEMBIT_DATA_PATH` - Seed / file-mode document (default: crates/storefront/data/data.json)
//! - `HEMBIT_UPLOADS_DIR` - Media upload directory (default: crates/storefront/data/uploads)
//! - `FRONTEND_URL` - Allowed CORS origin (default: <http://localhost:5173>); CORS is disabled when unusable
//! - `PUBLIC_BASE_URL` - Base for uploaded media URLs (default: derived from the Host header)
//! - `HEMBIT_ADMIN_EMAIL` - Seeded administrator (default: admin@hembit.in)
//! - `HEMBIT_ADMIN_PASSWORD` - Seeded administrator password (default: Admin@123)
//! - `BREVO_API_KEY` - Brevo transactional email key; emails are logged when unset
//! - `EMAIL_FROM` / `EMAIL_FROM_NAME` - Sender identity (default: support@hembit.in / HEMBIT)
//! - `RAZORPAY_KEY_ID` - Razorpay public checkout key
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use url::Url;

use hembit_core::Email;

const MIN_JWT_SECRET_LENGTH: usize = 32;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Administrator seeded into every document unless overridden.
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@hembit.in";
/// Password for the seeded administrator unless overridden.
pub const DEFAULT_ADMIN_PASSWORD: &str = "Admin@123";
/// Display name of the seeded administrator.
pub const ADMIN_NAME: &str = "HEMBIT Admin";

/// CORS origin used when `FRONTEND_URL` is unset.
pub const DEFAULT_FRONTEND_URL: &str = "http://localhost:5173";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Document store location and seeded administrator
    pub data: DataConfig,
    /// Directory uploaded media is written to and served from
    pub uploads_dir: PathBuf,
    /// Sole allowed CORS origin
    pub frontend_url: String,
    /// Base URL for uploaded media links
    pub public_base_url: Option<String>,
    /// HS256 token signing secret
    pub jwt_secret: SecretString,
    /// Outbound email configuration
    pub email: EmailConfig,
    /// Razorpay checkout configuration
    pub razorpay: RazorpayConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Where the document lives and which administrator it always contains.
///
/// Shared by the server and the CLI, which does not need the HTTP settings.
#[derive(Clone)]
pub struct DataConfig {
    /// `PostgreSQL` connection URL (contains password); file mode when `None`
    pub database_url: Option<SecretString>,
    /// Seed document, and the database itself in file mode
    pub data_path: PathBuf,
    /// Seeded administrator email (validated when loaded from the environment)
    pub admin_email: String,
    /// Seeded administrator password
    pub admin_password: SecretString,
}

impl std::fmt::Debug for DataConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataConfig")
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("data_path", &self.data_path)
            .field("admin_email", &self.admin_email)
            .field("admin_password", &"[REDACTED]")
            .finish()
    }
}

/// Brevo transactional email configuration.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct EmailConfig {
    /// Brevo API key; emails are only logged when `None`
    pub brevo_api_key: Option<SecretString>,
    /// Sender address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl std::fmt::Debug for EmailConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailConfig")
            .field(
                "brevo_api_key",
                &self.brevo_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("from_email", &self.from_email)
            .field("from_name", &self.from_name)
            .finish()
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            brevo_api_key: None,
            from_email: "support@hembit.in".to_string(),
            from_name: "HEMBIT".to_string(),
        }
    }
}

/// Razorpay public checkout configuration.
#[derive(Debug, Clone, Default)]
pub struct RazorpayConfig {
    /// Public key ID handed to the browser checkout widget
    pub key_id: Option<String>,
}

impl RazorpayConfig {
    /// Whether a key ID is configured.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.key_id.is_some()
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("HEMBIT_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HEMBIT_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "5000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let jwt_secret = get_validated_secret("JWT_SECRET")?;
        validate_jwt_secret(&jwt_secret, "JWT_SECRET")?;

        // Checked when the CORS layer is built; a bad value disables CORS
        let frontend_url = get_env_or_default("FRONTEND_URL", DEFAULT_FRONTEND_URL)
            .trim()
            .trim_end_matches('/')
            .to_string();
        let public_base_url = get_url("PUBLIC_BASE_URL")?;

        Ok(Self {
            host,
            port,
            data: DataConfig::from_env()?,
            uploads_dir: PathBuf::from(get_env_or_default(
                "HEMBIT_UPLOADS_DIR",
                "crates/storefront/data/uploads",
            )),
            frontend_url,
            public_base_url,
            jwt_secret,
            email: EmailConfig::from_env(),
            razorpay: RazorpayConfig {
                key_id: get_optional_env("RAZORPAY_KEY_ID"),
            },
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// A file-mode configuration with every optional integration disabled.
    ///
    /// Used by tooling and tests that run the storefront in-process.
    #[must_use]
    pub fn local(data_path: PathBuf, uploads_dir: PathBuf, jwt_secret: SecretString) -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 5000,
            data: DataConfig {
                database_url: None,
                data_path,
                admin_email: DEFAULT_ADMIN_EMAIL.to_string(),
                admin_password: SecretString::from(DEFAULT_ADMIN_PASSWORD),
            },
            uploads_dir,
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            public_base_url: None,
            jwt_secret,
            email: EmailConfig::default(),
            razorpay: RazorpayConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl DataConfig {
    /// Load the store settings from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `HEMBIT_ADMIN_EMAIL` is not a valid address.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let admin_email = get_env_or_default("HEMBIT_ADMIN_EMAIL", DEFAULT_ADMIN_EMAIL);
        Email::parse(&admin_email).map_err(|e| {
            ConfigError::InvalidEnvVar("HEMBIT_ADMIN_EMAIL".to_string(), e.to_string())
        })?;

        Ok(Self {
            database_url: get_optional_env("DATABASE_URL").map(SecretString::from),
            data_path: PathBuf::from(get_env_or_default(
                "HEMBIT_DATA_PATH",
                "crates/storefront/data/data.json",
            )),
            admin_email,
            admin_password: SecretString::from(get_env_or_default(
                "HEMBIT_ADMIN_PASSWORD",
                DEFAULT_ADMIN_PASSWORD,
            )),
        })
    }

    /// Whether the seeded administrator still uses the shipped password.
    #[must_use]
    pub fn uses_default_admin_password(&self) -> bool {
        self.admin_password.expose_secret() == DEFAULT_ADMIN_PASSWORD
    }
}

impl EmailConfig {
    fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            brevo_api_key: get_optional_env("BREVO_API_KEY").map(SecretString::from),
            from_email: get_optional_env("EMAIL_FROM").unwrap_or(defaults.from_email),
            from_name: get_optional_env("EMAIL_FROM_NAME").unwrap_or(defaults.from_name),
        }
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Get an absolute URL, normalized without a trailing slash.
fn get_url(key: &str) -> Result<Option<String>, ConfigError> {
    let Some(raw) = get_optional_env(key) else {
        return Ok(None);
    };
    Url::parse(&raw)
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    Ok(Some(raw.trim_end_matches('/').to_string()))
}

/// Validate that the token secret meets minimum length requirements.
fn validate_jwt_secret(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let value = secret.expose_secret();
    if value.len() < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_JWT_SECRET_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_high() {
        let entropy = shannon_entropy("aB3$xY9!mK2@nL5#");
        assert!(entropy > 3.3);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-jwt-key-here", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_dev_default() {
        // The old development fallback must never pass.
        assert!(validate_secret_strength("dev-secret", "JWT_SECRET").is_err());
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_jwt_secret_too_short() {
        let secret = SecretString::from("short");
        assert!(validate_jwt_secret(&secret, "JWT_SECRET").is_err());
    }

    #[test]
    fn test_local_config() {
        let config = StorefrontConfig::local(
            PathBuf::from("data.json"),
            PathBuf::from("uploads"),
            SecretString::from("x".repeat(32)),
        );

        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 5000);
        assert!(config.data.database_url.is_none());
        assert!(config.data.uses_default_admin_password());
        assert!(!config.razorpay.is_configured());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let data = DataConfig {
            database_url: Some(SecretString::from("postgres://u:hunter2@db/hembit")),
            data_path: PathBuf::from("data.json"),
            admin_email: "owner@hembit.in".to_string(),
            admin_password: SecretString::from("super_secret_admin"),
        };
        let email = EmailConfig {
            brevo_api_key: Some(SecretString::from("xkeysib-abcdef")),
            ..EmailConfig::default()
        };

        let debug_output = format!("{data:?} {email:?}");

        assert!(debug_output.contains("owner@hembit.in"));
        assert!(debug_output.contains("support@hembit.in"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("hunter2"));
        assert!(!debug_output.contains("super_secret_admin"));
        assert!(!debug_output.contains("xkeysib"));
    }
}
