//! Attachment metadata.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata describing one stored attachment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub id: Uuid,
    /// Filename as the user provided it
    pub name: String,
    /// Storage key the content lives under
    pub path: String,
    pub size: u64,
    pub mime_type: String,
    pub is_image: bool,
    pub uploaded_at: DateTime<Utc>,
}

impl AttachmentRecord {
    pub fn new(name: impl Into<String>, path: impl Into<String>, size: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            path: path.into(),
            size,
            mime_type: "application/octet-stream".to_string(),
            is_image: false,
            uploaded_at: Utc::now(),
        }
    }

    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> Self {
        self.mime_type = mime_type.into();
        self
    }

    pub fn with_image_flag(mut self, is_image: bool) -> Self {
        self.is_image = is_image;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builders() {
        let record = AttachmentRecord::new("photo.png", "tasks/1/abc/photo.png", 2048)
            .with_mime_type("image/png")
            .with_image_flag(true);

        assert_eq!(record.name, "photo.png");
        assert_eq!(record.path, "tasks/1/abc/photo.png");
        assert_eq!(record.size, 2048);
        assert_eq!(record.mime_type, "image/png");
        assert!(record.is_image);
    }
}
