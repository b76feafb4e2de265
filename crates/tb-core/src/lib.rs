//! # tb-core
//!
//! Shared configuration types for the Taskboard blob storage plugin.
//!
//! The plugin is activated by the host application only when
//! [`BlobStorageConfig::is_configured`] reports that the mandatory bucket
//! settings are present.

pub mod config;

pub use config::{BlobStorageConfig, BucketConfig, ConfigError, OidcConfig, UploadConfig};
