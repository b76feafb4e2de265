//! Configuration types and loading
//!
//! Mirrors the host application's settings surface for the blob storage
//! plugin. Values come from the environment; the libraries never read
//! ambient state themselves and are handed these objects explicitly.

use serde::{Deserialize, Serialize};

/// Plugin configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BlobStorageConfig {
    /// Remote bucket settings
    pub bucket: BucketConfig,

    /// OAuth identity provider, when the service requires bearer tokens
    pub oidc: Option<OidcConfig>,

    /// Upload validation settings
    pub uploads: UploadConfig,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct BucketConfig {
    /// Access key, used to sign every request
    pub key: String,
    /// Bucket identifier
    pub id: String,
    /// Base URL of the blob service API
    pub base_url: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OidcConfig {
    /// Identity provider base URL (discovery document lives under it)
    pub provider_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct UploadConfig {
    /// Allowed MIME types, newline- or comma-separated. Empty means the
    /// built-in default list applies.
    pub allowed_mime_types: String,
    /// Maximum upload size in megabytes; 0 disables the check
    pub max_upload_size_mb: u64,
}

/// Configuration error
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Environment variable not set: {0}")]
    MissingEnvVar(String),
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

impl BlobStorageConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        // Bucket
        if let Ok(key) = std::env::var("BLOB_BUCKET_KEY") {
            config.bucket.key = key;
        }
        if let Ok(id) = std::env::var("BLOB_BUCKET_ID") {
            config.bucket.id = id;
        }
        if let Ok(url) = std::env::var("BLOB_API_BASE_URL") {
            config.bucket.base_url = url;
        }

        // Identity provider - only active when all three values are present
        if let (Ok(provider_url), Ok(client_id), Ok(client_secret)) = (
            std::env::var("BLOB_OIDC_PROVIDER_URL"),
            std::env::var("BLOB_OIDC_CLIENT_ID"),
            std::env::var("BLOB_OIDC_CLIENT_SECRET"),
        ) {
            config.oidc = Some(OidcConfig {
                provider_url,
                client_id,
                client_secret,
            });
        }

        // Uploads
        if let Ok(types) = std::env::var("BLOB_ALLOWED_MIME_TYPES") {
            config.uploads.allowed_mime_types = types;
        }
        if let Ok(size) = std::env::var("BLOB_MAX_UPLOAD_SIZE_MB") {
            config.uploads.max_upload_size_mb =
                size.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "BLOB_MAX_UPLOAD_SIZE_MB".to_string(),
                    message: format!("expected a number, got {:?}", size),
                })?;
        }

        Ok(config)
    }

    /// True when the mandatory bucket settings are all present. The host
    /// keeps the plugin inactive otherwise.
    pub fn is_configured(&self) -> bool {
        !self.bucket.key.is_empty()
            && !self.bucket.id.is_empty()
            && !self.bucket.base_url.is_empty()
    }
}
