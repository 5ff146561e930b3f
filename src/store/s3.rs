//! S3-backed picture store.
//!
//! Works against AWS S3 and any S3-compatible service (MinIO, the Google Cloud
//! Storage XML interoperability endpoint, ...) through a custom endpoint URL.

use async_trait::async_trait;
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{ProvideErrorMetadata, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tracing::debug;

use super::PictureStore;
use crate::error::StoreError;

/// S3-backed implementation of `PictureStore`.
///
/// The picture name is used as the object key within the bucket.
#[derive(Clone)]
pub struct S3PictureStore {
    client: Client,
    bucket: String,
}

impl S3PictureStore {
    /// Create a new store for the given bucket.
    ///
    /// # Arguments
    /// * `client` - AWS S3 client to use for requests
    /// * `bucket` - Bucket name holding the pictures
    pub fn new(client: Client, bucket: String) -> Self {
        Self { client, bucket }
    }

    fn location(&self, name: &str) -> String {
        format!("s3://{}/{}", self.bucket, name)
    }
}

/// Whether an SDK error means "no such object".
///
/// Some S3-compatible backends answer HEAD misses with a bare 404 and no
/// error code, so the raw status is checked as well as the modeled error.
fn is_not_found<E>(err: &SdkError<E, HttpResponse>) -> bool
where
    E: ProvideErrorMetadata,
{
    if let Some(code) = err.as_service_error().and_then(|se| se.code()) {
        if code == "NotFound" || code == "NoSuchKey" {
            return true;
        }
    }

    err.raw_response()
        .map(|r| r.status().as_u16() == 404)
        .unwrap_or(false)
}

#[async_trait]
impl PictureStore for S3PictureStore {
    async fn exists(&self, name: &str) -> Result<bool, StoreError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(StoreError::S3(e.to_string())),
        }
    }

    async fn put(&self, name: &str, data: Bytes, content_type: &str) -> Result<(), StoreError> {
        let len = data.len();

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(name)
            .content_type(content_type)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| StoreError::S3(e.to_string()))?;

        debug!(location = %self.location(name), bytes = len, "Stored picture");
        Ok(())
    }

    async fn get(&self, name: &str) -> Result<Bytes, StoreError> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(name)
            .send()
            .await
            .map_err(|e| {
                if is_not_found(&e) {
                    StoreError::NotFound(self.location(name))
                } else {
                    StoreError::S3(e.to_string())
                }
            })?;

        let data = resp
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?
            .into_bytes();

        Ok(data)
    }

    async fn list(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .max_keys(1000);

            if let Some(token) = continuation_token {
                request = request.continuation_token(token);
            }

            let result = request
                .send()
                .await
                .map_err(|e| StoreError::S3(e.to_string()))?;

            keys.extend(
                result
                    .contents()
                    .iter()
                    .filter_map(|obj| obj.key().map(str::to_string)),
            );

            if result.is_truncated() == Some(true) {
                continuation_token = result.next_continuation_token().map(|s| s.to_string());
            } else {
                break;
            }
        }

        Ok(keys)
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Create an S3 client with optional custom endpoint and region.
///
/// Use a custom endpoint for S3-compatible services like MinIO or GCS:
/// ```ignore
/// let client = create_s3_client(Some("https://storage.googleapis.com"), "auto").await;
/// ```
///
/// For AWS S3, pass `None` to use the default endpoint:
/// ```ignore
/// let client = create_s3_client(None, "us-east-1").await;
/// ```
pub async fn create_s3_client(endpoint_url: Option<&str>, region: &str) -> Client {
    let region = aws_config::Region::new(region.to_string());
    let mut config_loader =
        aws_config::defaults(aws_config::BehaviorVersion::latest()).region(region);

    if let Some(endpoint) = endpoint_url {
        config_loader = config_loader.endpoint_url(endpoint);
    }

    let sdk_config = config_loader.load().await;

    // S3-compatible services generally need path-style addressing
    let s3_config = if endpoint_url.is_some() {
        aws_sdk_s3::config::Builder::from(&sdk_config)
            .force_path_style(true)
            .build()
    } else {
        aws_sdk_s3::config::Builder::from(&sdk_config).build()
    };

    Client::from_conf(s3_config)
}
