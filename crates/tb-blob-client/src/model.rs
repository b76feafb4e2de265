//! Wire types for the blob service.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::error::{BlobApiError, BlobApiResult};

/// A stored object as the service reports it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlobObject {
    /// Content address assigned by the service
    pub identifier: String,
    pub file_name: String,
    pub prefix: String,
    #[serde(default)]
    pub file_size: u64,
    /// Data-URL-style content (`<metadata>,<base64>`), present only when
    /// the listing requested inlined data
    #[serde(default)]
    pub content_url: String,
}

impl BlobObject {
    /// Decode the inlined content
    pub fn decode_content(&self) -> BlobApiResult<Vec<u8>> {
        decode_data_url(&self.content_url)
    }
}

/// Listing response envelope
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObjectList {
    #[serde(default)]
    pub files: Vec<BlobObject>,
}

/// Options for listing stored objects
#[derive(Debug, Clone)]
pub struct ListOptions {
    /// Only objects whose path starts with this value are returned
    pub prefix: String,
    /// Inline each object's content into `contentUrl`
    pub include_data: bool,
}

impl ListOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            include_data: false,
        }
    }

    pub fn with_data(mut self) -> Self {
        self.include_data = true;
        self
    }
}

/// Options for deleting stored objects
#[derive(Debug, Clone)]
pub struct DeleteOptions {
    /// Every object whose path starts with this value is deleted
    pub prefix: String,
}

impl DeleteOptions {
    pub fn prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }
}

/// A new object to submit to the service
#[derive(Debug, Clone)]
pub struct NewObject {
    pub file_name: String,
    pub prefix: String,
    pub content: Vec<u8>,
}

impl NewObject {
    pub fn new(file_name: impl Into<String>, prefix: impl Into<String>, content: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            prefix: prefix.into(),
            content,
        }
    }
}

/// Decode a data-URL-style content string. Everything after the first
/// comma is the base64 payload; the metadata before it is not inspected.
pub fn decode_data_url(content_url: &str) -> BlobApiResult<Vec<u8>> {
    let payload = match content_url.split_once(',') {
        Some((_, payload)) => payload,
        None => {
            return Err(BlobApiError::invalid_response(
                "content URL is missing the base64 payload",
            ))
        }
    };

    STANDARD
        .decode(payload.trim())
        .map_err(|e| BlobApiError::invalid_response(format!("invalid base64 payload: {e}")))
}

/// Encode bytes the way the service inlines them
pub fn encode_data_url(mime_type: &str, content: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_url_round_trip() {
        let content = b"hello blob storage";
        let url = encode_data_url("text/plain", content);
        assert!(url.starts_with("data:text/plain;base64,"));

        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded, content);
    }

    #[test]
    fn test_decode_splits_on_first_comma_only() {
        // base64 of "a,b" - the payload itself must survive intact
        let url = format!("data:text/plain;base64,{}", STANDARD.encode(b"a,b"));
        let decoded = decode_data_url(&url).unwrap();
        assert_eq!(decoded, b"a,b");
    }

    #[test]
    fn test_decode_without_comma_fails() {
        let result = decode_data_url("no payload here");
        assert!(matches!(result, Err(BlobApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_decode_bad_base64_fails() {
        let result = decode_data_url("data:image/png;base64,%%%%");
        assert!(matches!(result, Err(BlobApiError::InvalidResponse(_))));
    }

    #[test]
    fn test_list_options() {
        let options = ListOptions::prefix("tasks/1").with_data();
        assert_eq!(options.prefix, "tasks/1");
        assert!(options.include_data);
    }
}
