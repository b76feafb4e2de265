//! # tb-blob-client
//!
//! Typed HTTP client for the remote blob object-storage service.
//!
//! The service addresses files by prefix: every stored object carries a
//! `prefix` (hierarchical grouping) and a `fileName`, and listing or
//! deleting always filters by prefix. Content comes back inlined as a
//! data-URL-style string when requested.
//!
//! Requests are signed with the bucket access key; deployments fronted by
//! an identity provider additionally attach a bearer token acquired via a
//! client-credentials exchange at connect time.

pub mod auth;
pub mod client;
pub mod error;
pub mod model;
pub mod sign;

pub use client::{BlobApi, BlobClient};
pub use error::{BlobApiError, BlobApiResult};
pub use model::{
    decode_data_url, encode_data_url, BlobObject, DeleteOptions, ListOptions, NewObject,
    ObjectList,
};

#[cfg(any(test, feature = "mocks"))]
pub use client::MockBlobApi;
