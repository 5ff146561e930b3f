//! Picture storage layer.
//!
//! Pictures are raw byte blobs addressed by their name, which is used verbatim
//! as the object key. The HTTP layer only talks to the [`PictureStore`] trait,
//! so the S3 implementation can be swapped for an in-memory fake in tests.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │              HTTP Handlers              │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │          PictureStore Trait             │
//! │   (exists / put / get / list keys)      │
//! └────────────────────┬────────────────────┘
//!                      │
//!                      ▼
//! ┌─────────────────────────────────────────┐
//! │            S3PictureStore               │
//! │  (AWS S3, MinIO, GCS interoperability)  │
//! └─────────────────────────────────────────┘
//! ```

mod s3;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;

pub use s3::{create_s3_client, S3PictureStore};

/// Base of the human-facing console URL reported by `/status`.
pub const CONSOLE_URL_BASE: &str = "https://console.cloud.google.com/storage/browser";

/// Trait for key-addressed picture storage.
///
/// Every call is a single round trip to the backing store. Implementations
/// must not cache store contents: the service stays stateless so any number
/// of replicas can run side by side.
#[async_trait]
pub trait PictureStore: Send + Sync {
    /// Check whether an object with the given name exists.
    async fn exists(&self, name: &str) -> Result<bool, StoreError>;

    /// Write `data` under `name`, replacing any existing object.
    async fn put(&self, name: &str, data: Bytes, content_type: &str) -> Result<(), StoreError>;

    /// Read the full content of the named object.
    ///
    /// Returns [`StoreError::NotFound`] if no such object exists.
    async fn get(&self, name: &str) -> Result<Bytes, StoreError>;

    /// List every object key in the store.
    async fn list(&self) -> Result<Vec<String>, StoreError>;

    /// Name of the bucket backing this store.
    fn bucket(&self) -> &str;

    /// Human-facing console URL for the bucket.
    ///
    /// Plain string templating; the link is not checked for reachability.
    fn console_url(&self) -> String {
        bucket_console_url(self.bucket())
    }
}

/// Build the console URL for a bucket name.
pub fn bucket_console_url(bucket: &str) -> String {
    format!("{}/{}", CONSOLE_URL_BASE, bucket)
}
