//! Blob service backend for [`ObjectStorage`].
//!
//! Uploads split the host path into filename and prefix before handing
//! the payload to the service; retrieval and removal pass the full key as
//! the service-side prefix filter, matching how keys were laid out at
//! upload time.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tb_blob_client::{BlobApi, BlobApiError, DeleteOptions, ListOptions, NewObject};
use tracing::{debug, info, instrument, warn};

use crate::keys::derive_key;
use crate::mime::MimeValidator;
use crate::storage::{ObjectStorage, StorageError, StorageResult};

fn upstream(context: &str, err: BlobApiError) -> StorageError {
    StorageError::UpstreamFailure {
        context: context.to_string(),
        error_id: err.error_id().to_string(),
        message: err.message(),
    }
}

/// [`ObjectStorage`] backed by the remote blob service
pub struct BlobObjectStorage {
    api: Arc<dyn BlobApi>,
    validator: MimeValidator,
}

impl BlobObjectStorage {
    /// Both the client and the validator are built by the caller, so the
    /// backend carries no environment lookups of its own
    pub fn new(api: Arc<dyn BlobApi>, validator: MimeValidator) -> Self {
        Self { api, validator }
    }

    async fn store(&self, key: &str, content: &[u8]) -> StorageResult<()> {
        let (filename, prefix) = derive_key(key)?;

        if !self.validator.is_allowed(content) {
            warn!(key, "upload rejected: file type is not in the allowed list");
            return Err(StorageError::ValidationRejected(format!(
                "file type of {key} is not in the allowed list"
            )));
        }

        let object = self
            .api
            .create_object(NewObject::new(filename, prefix, content.to_vec()))
            .await
            .map_err(|err| upstream("Unable to write file", err))?;

        info!(key, identifier = %object.identifier, "uploaded object");
        Ok(())
    }
}

#[async_trait]
impl ObjectStorage for BlobObjectStorage {
    #[instrument(skip(self), fields(storage = "blob"))]
    async fn get(&self, key: &str) -> StorageResult<Bytes> {
        let options = ListOptions::prefix(key).with_data();
        let objects = self
            .api
            .list_objects(options)
            .await
            .map_err(|err| upstream("Unable to read file", err))?;

        let object = objects
            .into_iter()
            .next()
            .ok_or_else(|| StorageError::NotFound(key.to_string()))?;

        let content = object
            .decode_content()
            .map_err(|err| upstream("Unable to read file", err))?;
        Ok(Bytes::from(content))
    }

    #[instrument(skip(self, content), fields(storage = "blob"))]
    async fn put(&self, key: &str, content: Bytes) -> StorageResult<()> {
        self.store(key, &content).await
    }

    #[instrument(skip(self), fields(storage = "blob"))]
    async fn move_file(&self, source: &Path, key: &str) -> StorageResult<bool> {
        let content = tokio::fs::read(source).await?;
        self.store(key, &content).await?;
        Ok(true)
    }

    #[instrument(skip(self), fields(storage = "blob"))]
    async fn remove(&self, key: &str) -> StorageResult<bool> {
        self.api
            .delete_objects(DeleteOptions::prefix(key))
            .await
            .map_err(|err| upstream("Unable to remove file", err))?;

        debug!(key, "removed objects under key");
        Ok(true)
    }

    fn name(&self) -> &str {
        "blob"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tb_blob_client::{encode_data_url, BlobObject, MockBlobApi};

    const PNG_MAGIC: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];
    const PDF_MAGIC: &[u8] = b"%PDF-1.4\n%fake pdf body";

    fn stored_object(file_name: &str, prefix: &str, content: &[u8]) -> BlobObject {
        BlobObject {
            identifier: "d41d8cd98f00b204".to_string(),
            file_name: file_name.to_string(),
            prefix: prefix.to_string(),
            file_size: content.len() as u64,
            content_url: encode_data_url("application/octet-stream", content),
        }
    }

    fn storage(api: MockBlobApi) -> BlobObjectStorage {
        BlobObjectStorage::new(Arc::new(api), MimeValidator::default())
    }

    #[tokio::test]
    async fn test_put_uploads_derived_components() {
        let mut api = MockBlobApi::new();
        api.expect_create_object()
            .withf(|object| {
                object.file_name == "photo.png"
                    && object.prefix == "tasks/1/abc"
                    && object.content == PNG_MAGIC
            })
            .times(1)
            .returning(|object| Ok(stored_object(&object.file_name, &object.prefix, &object.content)));

        let storage = storage(api);
        storage
            .put("tasks/1/abc/photo.png", Bytes::from_static(PNG_MAGIC))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_put_rejects_before_any_upload() {
        let mut api = MockBlobApi::new();
        api.expect_create_object().times(0);

        let storage = BlobObjectStorage::new(Arc::new(api), MimeValidator::new("image/png"));
        let result = storage
            .put("tasks/1/doc.pdf", Bytes::from_static(PDF_MAGIC))
            .await;
        assert!(matches!(result, Err(StorageError::ValidationRejected(_))));
    }

    #[tokio::test]
    async fn test_malformed_key_never_reaches_the_service() {
        let mut api = MockBlobApi::new();
        api.expect_create_object().times(0);

        let storage = storage(api);
        let result = storage.put("photo.png", Bytes::from_static(PNG_MAGIC)).await;
        assert!(matches!(result, Err(StorageError::MalformedKey(_))));
    }

    #[tokio::test]
    async fn test_get_filters_by_full_key_and_decodes() {
        let mut api = MockBlobApi::new();
        api.expect_list_objects()
            .withf(|options| options.prefix == "tasks/1/abc/photo.png" && options.include_data)
            .times(1)
            .returning(|_| Ok(vec![stored_object("photo.png", "tasks/1/abc", PNG_MAGIC)]));

        let storage = storage(api);
        let content = storage.get("tasks/1/abc/photo.png").await.unwrap();
        assert_eq!(content, Bytes::from_static(PNG_MAGIC));
    }

    #[tokio::test]
    async fn test_get_empty_listing_is_not_found() {
        let mut api = MockBlobApi::new();
        api.expect_list_objects().returning(|_| Ok(Vec::new()));

        let storage = storage(api);
        let result = storage.get("tasks/1/missing.png").await;
        assert!(matches!(result, Err(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_preserves_upstream_error_id() {
        let mut api = MockBlobApi::new();
        api.expect_list_objects()
            .returning(|_| Err(BlobApiError::api("BLOB-500", "bucket unavailable", 500)));

        let storage = storage(api);
        let err = storage.get("tasks/1/abc/photo.png").await.unwrap_err();
        match &err {
            StorageError::UpstreamFailure { context, error_id, message } => {
                assert_eq!(context, "Unable to read file");
                assert_eq!(error_id, "BLOB-500");
                assert_eq!(message, "bucket unavailable");
            }
            other => panic!("expected upstream failure, got {other:?}"),
        }
        assert_eq!(
            err.to_string(),
            "Unable to read file: BLOB-500: bucket unavailable"
        );
    }

    #[tokio::test]
    async fn test_remove_passes_full_key_as_filter() {
        let mut api = MockBlobApi::new();
        api.expect_delete_objects()
            .withf(|options| options.prefix == "tasks/1/abc/photo.png")
            .times(1)
            .returning(|_| Ok(()));

        let storage = storage(api);
        assert!(storage.remove("tasks/1/abc/photo.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_remove_wraps_upstream_failure() {
        let mut api = MockBlobApi::new();
        api.expect_delete_objects()
            .returning(|_| Err(BlobApiError::auth("token expired")));

        let storage = storage(api);
        let err = storage.remove("tasks/1/abc").await.unwrap_err();
        assert!(matches!(
            err,
            StorageError::UpstreamFailure { ref context, ref error_id, .. }
                if context == "Unable to remove file" && error_id == "auth"
        ));
    }

    #[tokio::test]
    async fn test_move_file_uploads_local_content() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("upload.png");
        std::fs::write(&source, PNG_MAGIC).unwrap();

        let mut api = MockBlobApi::new();
        api.expect_create_object()
            .withf(|object| object.file_name == "upload.png" && object.content == PNG_MAGIC)
            .times(1)
            .returning(|object| Ok(stored_object(&object.file_name, &object.prefix, &object.content)));

        let storage = storage(api);
        assert!(storage.move_file(&source, "tasks/7/xyz/upload.png").await.unwrap());
    }

    #[tokio::test]
    async fn test_move_file_missing_source_is_io_error() {
        let mut api = MockBlobApi::new();
        api.expect_create_object().times(0);

        let storage = storage(api);
        let result = storage
            .move_file(Path::new("/nonexistent/upload.png"), "tasks/7/xyz/upload.png")
            .await;
        assert!(matches!(result, Err(StorageError::Io(_))));
    }
}
