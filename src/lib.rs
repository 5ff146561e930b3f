//! # picture-mailer
//!
//! A small HTTP backend that stores uploaded pictures in object storage and
//! emails a stored picture to a recipient as an attachment.
//!
//! ## Features
//!
//! - **Uploads**: base64 JSON uploads, checked by magic bytes to be images
//! - **Email**: sends a stored picture through the SendGrid API
//! - **Status**: bucket console URL and live picture count
//! - **Authentication**: static shared secret in the `X-API-KEY` header
//!
//! ## Architecture
//!
//! - [`store`] - Picture storage trait and S3 implementation
//! - [`mail`] - Email model, dispatcher trait and SendGrid client
//! - [`sniff`] - MIME type detection from content
//! - [`server`] - Axum-based HTTP server and routes
//! - [`client`] - HTTP client for a running server
//! - [`config`] - CLI and configuration types
//!
//! The service holds no state of its own: every request is one round trip to
//! the bucket and/or the mail API.
//!
//! ## Example
//!
//! ```rust,no_run
//! use picture_mailer::{
//!     create_router, create_s3_client, AppState, RouterConfig, S3PictureStore, SendGridClient,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = create_s3_client(Some("https://storage.googleapis.com"), "auto").await;
//!     let store = S3PictureStore::new(client, "booth-pictures".to_string());
//!     let mailer = SendGridClient::new("SG.xxxxx");
//!
//!     let state = AppState::new(store, mailer, "booth@example.com");
//!     let router = create_router(state, RouterConfig::new("my-api-key"));
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, router).await.unwrap();
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod mail;
pub mod server;
pub mod sniff;
pub mod store;

// Re-export commonly used types
pub use client::PictureClient;
pub use config::{CheckConfig, Cli, Command, ServeConfig, StorageConfig, UploadConfig};
pub use error::{ClientError, MailError, StoreError};
pub use mail::{Attachment, Email, MailDispatcher, SendGridClient};
pub use server::{
    auth_middleware, create_router, email_handler, heartbeat_handler, status_handler,
    upload_handler, ApiError, ApiKeyAuth, AppState, AuthError, EmailRequest, RouterConfig,
    StatusResponse, UploadRequest, API_KEY_HEADER, DEFAULT_MAX_UPLOAD_BYTES,
};
pub use sniff::{is_image_mime_type, sniff_mime_type, UNKNOWN_MIME_TYPE};
pub use store::{bucket_console_url, create_s3_client, PictureStore, S3PictureStore};
