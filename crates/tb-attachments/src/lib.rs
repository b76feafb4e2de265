//! # tb-attachments
//!
//! File attachment handling for Taskboard: content-based MIME validation,
//! storage key handling, and the [`ObjectStorage`] abstraction with its
//! blob service and in-memory backends.
//!
//! The workflow entry point is [`AttachmentService`], parameterized over
//! any [`ObjectStorage`] implementation:
//!
//! ```no_run
//! use std::sync::Arc;
//! use tb_attachments::{AttachmentService, MemoryObjectStorage};
//! use tb_core::UploadConfig;
//!
//! let storage = Arc::new(MemoryObjectStorage::new());
//! let service = AttachmentService::new(storage, UploadConfig::default());
//! ```

pub mod blob;
pub mod keys;
pub mod mime;
pub mod model;
pub mod service;
pub mod storage;

pub use blob::BlobObjectStorage;
pub use keys::{compose_display_key, derive_key};
pub use mime::{detect_mime, MimeValidator, DEFAULT_ALLOWED_TYPES};
pub use model::AttachmentRecord;
pub use service::AttachmentService;
pub use storage::{MemoryObjectStorage, ObjectStorage, StorageError, StorageResult};
