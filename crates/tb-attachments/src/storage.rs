//! Object storage contract and the process-local backend.
//!
//! The host's upload and removal workflow consumes the [`ObjectStorage`]
//! trait and is handed an implementation at startup. The remote backend
//! lives in [`crate::blob`]; the in-memory one here serves tests and
//! development without the remote service.

use std::collections::BTreeMap;
use std::path::Path;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::RwLock;

use crate::keys::derive_key;
use crate::mime::MimeValidator;

/// Adapter-level errors. Failures of the underlying client are re-wrapped
/// into [`StorageError::UpstreamFailure`] so callers never depend on the
/// client's error type.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Payload failed type or size validation; nothing was uploaded
    #[error("File rejected: {0}")]
    ValidationRejected(String),

    /// No object stored under the key
    #[error("File not found: {0}")]
    NotFound(String),

    /// The blob service or its transport failed
    #[error("{context}: {error_id}: {message}")]
    UpstreamFailure {
        context: String,
        error_id: String,
        message: String,
    },

    /// Key cannot be split into filename and prefix
    #[error("Malformed storage key: {0}")]
    MalformedKey(String),

    /// Local file access failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// Fixed storage contract for file attachments.
///
/// Keys are opaque host paths; retrieval and deletion treat the full key
/// as a path prefix on the remote side, so one key addresses the object
/// it named at upload time.
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Raw decoded content stored under the key
    async fn get(&self, key: &str) -> StorageResult<Bytes>;

    /// Write the stored content to the caller's sink. Missing objects are
    /// an error, never a silent no-op.
    async fn output(
        &self,
        key: &str,
        sink: &mut (dyn AsyncWrite + Send + Unpin),
    ) -> StorageResult<()> {
        let content = self.get(key).await?;
        sink.write_all(&content).await?;
        sink.flush().await?;
        Ok(())
    }

    /// Validate and upload an in-memory payload
    async fn put(&self, key: &str, content: Bytes) -> StorageResult<()>;

    /// Validate and upload a local file
    async fn move_file(&self, source: &Path, key: &str) -> StorageResult<bool>;

    /// Alias of [`ObjectStorage::move_file`] for freshly received uploads
    async fn move_uploaded_file(&self, source: &Path, key: &str) -> StorageResult<bool> {
        self.move_file(source, key).await
    }

    /// Delete every object under the key. Completing without a client
    /// error is success; there is no read-back, so removing an absent key
    /// succeeds too.
    async fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Backend name for logging
    fn name(&self) -> &str;
}

/// In-memory storage with the same prefix-addressed semantics as the
/// remote backend
pub struct MemoryObjectStorage {
    objects: RwLock<BTreeMap<String, Bytes>>,
    validator: MimeValidator,
}

impl Default for MemoryObjectStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::with_validator(MimeValidator::default())
    }

    pub fn with_validator(validator: MimeValidator) -> Self {
        Self {
            objects: RwLock::new(BTreeMap::new()),
            validator,
        }
    }

    fn key_matches(stored: &str, requested: &str) -> bool {
        stored == requested
            || stored
                .strip_prefix(requested)
                .map(|rest| rest.starts_with('/'))
                .unwrap_or(false)
    }

    async fn store(&self, key: &str, content: Bytes) -> StorageResult<()> {
        // Uploads must split cleanly, like the remote backend requires
        derive_key(key)?;

        if !self.validator.is_allowed(&content) {
            return Err(StorageError::ValidationRejected(format!(
                "file type of {key} is not in the allowed list"
            )));
        }

        let mut objects = self.objects.write().await;
        objects.insert(key.to_string(), content);
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let objects = self.objects.read().await;
        objects
            .iter()
            .find(|(stored, _)| Self::key_matches(stored, key))
            .map(|(_, content)| content.clone())
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }

    async fn put(&self, key: &str, content: Bytes) -> StorageResult<()> {
        self.store(key, content).await
    }

    async fn move_file(&self, source: &Path, key: &str) -> StorageResult<bool> {
        let content = tokio::fs::read(source).await?;
        self.store(key, Bytes::from(content)).await?;
        Ok(true)
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let mut objects = self.objects.write().await;
        objects.retain(|stored, _| !Self::key_matches(stored, key));
        Ok(true)
    }

    fn name(&self) -> &str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const PDF_MAGIC: &[u8] = b"%PDF-1.4\n%fake pdf body";

    #[tokio::test]
    async fn test_put_get_round_trip() {
        let storage = MemoryObjectStorage::new();
        let content = Bytes::from_static(PNG_MAGIC);

        storage.put("tasks/1/abc/photo.png", content.clone()).await.unwrap();
        let retrieved = storage.get("tasks/1/abc/photo.png").await.unwrap();
        assert_eq!(retrieved, content);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let storage = MemoryObjectStorage::new();
        let result = storage.get("tasks/1/missing.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let storage = MemoryObjectStorage::new();

        assert!(storage.remove("tasks/1/never-stored.png").await.unwrap());

        storage
            .put("tasks/2/doc.pdf", Bytes::from_static(PDF_MAGIC))
            .await
            .unwrap();
        assert!(storage.remove("tasks/2/doc.pdf").await.unwrap());
        assert!(matches!(
            storage.get("tasks/2/doc.pdf").await,
            Err(StorageError::NotFound(_))
        ));
        assert!(storage.remove("tasks/2/doc.pdf").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_deletes_by_prefix() {
        let storage = MemoryObjectStorage::new();
        storage
            .put("tasks/1/abc/photo.png", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap();
        storage
            .put("tasks/1/abc/thumb.png", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap();
        storage
            .put("tasks/10/other.png", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap();

        storage.remove("tasks/1/abc").await.unwrap();

        assert!(storage.get("tasks/1/abc/photo.png").await.is_err());
        assert!(storage.get("tasks/1/abc/thumb.png").await.is_err());
        // "tasks/10" must not be swept up by the "tasks/1" removal
        assert!(storage.get("tasks/10/other.png").await.is_ok());
    }

    #[tokio::test]
    async fn test_put_rejects_disallowed_type() {
        let storage = MemoryObjectStorage::with_validator(MimeValidator::new("image/png"));
        let result = storage
            .put("tasks/1/doc.pdf", Bytes::from_static(PDF_MAGIC))
            .await;
        assert!(matches!(result, Err(StorageError::ValidationRejected(_))));
        assert!(matches!(
            storage.get("tasks/1/doc.pdf").await,
            Err(StorageError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_put_rejects_malformed_key() {
        let storage = MemoryObjectStorage::new();
        let result = storage.put("no-prefix.png", Bytes::from_static(PNG_MAGIC)).await;
        assert!(matches!(result, Err(StorageError::MalformedKey(_))));
    }

    #[tokio::test]
    async fn test_output_writes_stored_bytes() {
        let storage = MemoryObjectStorage::new();
        storage
            .put("tasks/1/note.txt", Bytes::from_static(b"written to the sink"))
            .await
            .unwrap();

        let (mut sink, mut source) = tokio::io::duplex(256);
        storage.output("tasks/1/note.txt", &mut sink).await.unwrap();
        drop(sink);

        let mut written = Vec::new();
        source.read_to_end(&mut written).await.unwrap();
        assert_eq!(written, b"written to the sink");
    }

    #[tokio::test]
    async fn test_output_missing_key_is_not_found() {
        let storage = MemoryObjectStorage::new();
        let (mut sink, _source) = tokio::io::duplex(256);

        let result = storage.output("tasks/1/missing.txt", &mut sink).await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_end_to_end_png_scenario() {
        let storage = MemoryObjectStorage::with_validator(MimeValidator::new("image/png"));

        storage
            .put("proj/1/abc/photo.png", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap();
        let fetched = storage.get("proj/1/abc/photo.png").await.unwrap();
        assert_eq!(fetched, Bytes::from_static(PNG_MAGIC));

        let rejected = storage
            .put("proj/1/abc/doc.pdf", Bytes::from_static(PDF_MAGIC))
            .await;
        assert!(matches!(rejected, Err(StorageError::ValidationRejected(_))));
    }
}
