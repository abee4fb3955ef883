//! Media uploads sent as base64 data URLs.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use regex::Regex;
use thiserror::Error;

use hembit_core::MediaId;

/// Largest accepted decoded upload.
pub const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

/// Accepted MIME types and the extension used when the filename has none.
pub const ALLOWED_TYPES: [(&str, &str); 7] = [
    ("image/jpeg", ".jpg"),
    ("image/png", ".png"),
    ("image/webp", ".webp"),
    ("image/gif", ".gif"),
    ("video/mp4", ".mp4"),
    ("video/webm", ".webm"),
    ("video/quicktime", ".mov"),
];

static DATA_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^data:([^;]+);base64,(.+)$").expect("Invalid regex"));

/// Errors that can occur while accepting an upload.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("dataUrl is required")]
    MissingData,

    #[error("Invalid data URL format")]
    InvalidDataUrl,

    #[error("Unsupported file type")]
    UnsupportedType,

    #[error("File too large (max 8MB)")]
    TooLarge,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A decoded data URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    pub mime: String,
    pub bytes: Vec<u8>,
}

/// Parse and validate `data:<mime>;base64,<payload>`.
///
/// # Errors
///
/// Returns `MediaError` if the URL is blank or malformed, the type is not
/// allowed, or the decoded payload exceeds [`MAX_UPLOAD_BYTES`].
pub fn parse_data_url(data_url: &str) -> Result<DataUrl, MediaError> {
    if data_url.is_empty() {
        return Err(MediaError::MissingData);
    }

    let captures = DATA_URL_RE
        .captures(data_url)
        .ok_or(MediaError::InvalidDataUrl)?;
    let mime = &captures[1];
    let payload = &captures[2];

    if extension_for_mime(mime).is_none() {
        return Err(MediaError::UnsupportedType);
    }
    // Skip decoding payloads that cannot fit.
    if payload.len() / 4 * 3 > MAX_UPLOAD_BYTES + 3 {
        return Err(MediaError::TooLarge);
    }

    let bytes = STANDARD
        .decode(payload)
        .map_err(|_| MediaError::InvalidDataUrl)?;
    if bytes.len() > MAX_UPLOAD_BYTES {
        return Err(MediaError::TooLarge);
    }

    Ok(DataUrl {
        mime: mime.to_owned(),
        bytes,
    })
}

/// Default extension for an allowed MIME type.
#[must_use]
pub fn extension_for_mime(mime: &str) -> Option<&'static str> {
    ALLOWED_TYPES
        .iter()
        .find(|(allowed, _)| *allowed == mime)
        .map(|(_, ext)| *ext)
}

/// Lowercased extension of a client-supplied filename, if it is a plain
/// alphanumeric suffix of at most 8 characters.
#[must_use]
pub fn sanitized_extension(filename: &str) -> Option<String> {
    let ext = Path::new(filename).extension()?.to_str()?;
    let valid = !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric());
    valid.then(|| format!(".{}", ext.to_ascii_lowercase()))
}

/// A file written by [`MediaLibrary::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMedia {
    pub file_name: String,
    pub mime: String,
}

/// The uploads directory, served publicly under `/uploads`.
#[derive(Debug, Clone)]
pub struct MediaLibrary {
    dir: PathBuf,
}

impl MediaLibrary {
    #[must_use]
    pub const fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Validate `data_url` and write it as `media_<id><ext>`.
    ///
    /// # Errors
    ///
    /// Returns `MediaError` if validation fails or the file cannot be written.
    pub async fn save(&self, filename: &str, data_url: &str) -> Result<StoredMedia, MediaError> {
        let DataUrl { mime, bytes } = parse_data_url(data_url)?;

        let ext = sanitized_extension(filename)
            .or_else(|| extension_for_mime(&mime).map(str::to_owned))
            .unwrap_or_else(|| ".bin".to_owned());
        let file_name = format!("{}{ext}", MediaId::generate());

        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&file_name), &bytes).await?;

        tracing::info!(file = %file_name, mime = %mime, bytes = bytes.len(), "media uploaded");
        Ok(StoredMedia { file_name, mime })
    }
}
