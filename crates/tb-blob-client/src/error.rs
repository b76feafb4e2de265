//! Client error types.

use thiserror::Error;

/// Errors surfaced by the blob service client
#[derive(Debug, Error)]
pub enum BlobApiError {
    /// Error response from the service, decoded from its JSON error body
    #[error("{error_id}: {message}")]
    Api {
        error_id: String,
        message: String,
        status: u16,
    },

    /// Transport-level failure before a response was interpreted
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),

    /// Token acquisition or request signing failure
    #[error("authentication error: {0}")]
    Auth(String),

    /// Response body that could not be interpreted
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The configured service base URL does not parse
    #[error("invalid base URL: {0}")]
    BaseUrl(#[from] url::ParseError),
}

pub type BlobApiResult<T> = Result<T, BlobApiError>;

impl BlobApiError {
    pub fn api(error_id: impl Into<String>, message: impl Into<String>, status: u16) -> Self {
        Self::Api {
            error_id: error_id.into(),
            message: message.into(),
            status,
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::InvalidResponse(message.into())
    }

    /// Upstream error identifier. Synthesized for failures the service
    /// never labeled.
    pub fn error_id(&self) -> &str {
        match self {
            Self::Api { error_id, .. } => error_id,
            Self::Http(_) => "transport",
            Self::Auth(_) => "auth",
            Self::InvalidResponse(_) => "protocol",
            Self::BaseUrl(_) => "config",
        }
    }

    /// Human-readable message without the identifier prefix
    pub fn message(&self) -> String {
        match self {
            Self::Api { message, .. } => message.clone(),
            Self::Http(e) => e.to_string(),
            Self::Auth(message) => message.clone(),
            Self::InvalidResponse(message) => message.clone(),
            Self::BaseUrl(e) => e.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = BlobApiError::api("BLOB-403", "bucket quota exceeded", 403);
        assert_eq!(err.to_string(), "BLOB-403: bucket quota exceeded");
        assert_eq!(err.error_id(), "BLOB-403");
        assert_eq!(err.message(), "bucket quota exceeded");
    }

    #[test]
    fn test_synthesized_error_ids() {
        assert_eq!(BlobApiError::auth("no token").error_id(), "auth");
        assert_eq!(
            BlobApiError::invalid_response("not json").error_id(),
            "protocol"
        );
    }
}
