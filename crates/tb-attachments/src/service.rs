//! Upload and removal workflow on top of [`ObjectStorage`].

use std::sync::Arc;

use bytes::Bytes;
use tb_core::UploadConfig;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::keys::compose_display_key;
use crate::mime::detect_mime;
use crate::model::AttachmentRecord;
use crate::storage::{ObjectStorage, StorageError, StorageResult};

/// Thumbnails are stored under the content key, shifted into this folder
const THUMBNAIL_PREFIX: &str = "thumbnails";

fn is_image_filename(filename: &str) -> bool {
    mime_guess::from_path(filename)
        .first()
        .map(|guess| guess.type_() == mime::IMAGE)
        .unwrap_or(false)
}

/// Attachment workflow: validates uploads, places them under a unique
/// folder, and cleans up derived thumbnails on removal. The backend is
/// injected, so the same workflow runs against the remote service or the
/// in-memory store.
pub struct AttachmentService {
    storage: Arc<dyn ObjectStorage>,
    config: UploadConfig,
}

impl AttachmentService {
    pub fn new(storage: Arc<dyn ObjectStorage>, config: UploadConfig) -> Self {
        Self { storage, config }
    }

    fn check_upload_size(&self, size: u64) -> StorageResult<()> {
        let max_mb = self.config.max_upload_size_mb;
        if max_mb == 0 {
            return Ok(());
        }

        let limit = max_mb.saturating_mul(1024 * 1024);
        if size > limit {
            return Err(StorageError::ValidationRejected(format!(
                "file size of {size} bytes exceeds the maximum upload size of {max_mb} MB"
            )));
        }
        Ok(())
    }

    /// Store an upload under a fresh unique folder below the destination.
    /// The returned record carries the storage key all later operations
    /// use.
    #[instrument(skip(self, content), fields(size = content.len()))]
    pub async fn upload(
        &self,
        destination_id: &str,
        original_filename: &str,
        content: Bytes,
    ) -> StorageResult<AttachmentRecord> {
        if content.is_empty() {
            return Err(StorageError::ValidationRejected("file is empty".to_string()));
        }
        self.check_upload_size(content.len() as u64)?;

        let folder = Uuid::new_v4().simple().to_string();
        let path = compose_display_key(
            original_filename,
            &format!("{destination_id}/{folder}"),
        );

        self.storage.put(&path, content.clone()).await?;

        let mime_type = detect_mime(&content).unwrap_or("application/octet-stream");
        let record = AttachmentRecord::new(original_filename, path.as_str(), content.len() as u64)
            .with_mime_type(mime_type)
            .with_image_flag(is_image_filename(original_filename));

        info!(%path, mime_type, "attachment uploaded");
        Ok(record)
    }

    #[instrument(skip(self))]
    pub async fn download(&self, path: &str) -> StorageResult<Bytes> {
        self.storage.get(path).await
    }

    /// Remove the attachment and its thumbnail. A thumbnail failure is
    /// logged but does not fail the removal, since the thumbnail may never
    /// have been rendered.
    #[instrument(skip(self))]
    pub async fn delete(&self, path: &str) -> StorageResult<()> {
        self.storage.remove(path).await?;
        debug!(path, "attachment removed");

        let thumbnail_key = format!("{THUMBNAIL_PREFIX}/{path}");
        if let Err(err) = self.storage.remove(&thumbnail_key).await {
            warn!(path, error = %err, "failed to remove thumbnail");
        }
        Ok(())
    }
}
