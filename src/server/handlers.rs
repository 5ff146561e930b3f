//! HTTP request handlers for the picture-mailer API.
//!
//! # Endpoints
//!
//! - `GET /` - Heartbeat
//! - `POST /upload` - Store a base64-encoded picture
//! - `POST /email` - Email a stored picture as an attachment
//! - `GET /status` - Bucket URL and picture count

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::error::{MailError, StoreError};
use crate::mail::{Email, MailDispatcher};
use crate::sniff::{is_image_mime_type, sniff_mime_type};
use crate::store::PictureStore;

// =============================================================================
// Application State
// =============================================================================

/// Shared application state handed to every handler.
///
/// Holds only the injected clients; nothing about store contents is kept in
/// process.
pub struct AppState<S: PictureStore, M: MailDispatcher> {
    /// Object store holding the pictures
    pub store: Arc<S>,

    /// Outbound mail provider
    pub mailer: Arc<M>,

    /// Sender address of every outgoing email
    pub sender_email: String,
}

impl<S: PictureStore, M: MailDispatcher> AppState<S, M> {
    pub fn new(store: S, mailer: M, sender_email: impl Into<String>) -> Self {
        Self {
            store: Arc::new(store),
            mailer: Arc::new(mailer),
            sender_email: sender_email.into(),
        }
    }
}

impl<S: PictureStore, M: MailDispatcher> Clone for AppState<S, M> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            mailer: Arc::clone(&self.mailer),
            sender_email: self.sender_email.clone(),
        }
    }
}

// =============================================================================
// Request / Response Types
// =============================================================================

/// Body of `POST /upload`.
#[derive(Debug, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Base64-encoded picture content
    pub image: String,

    /// Picture name, used verbatim as the object key
    pub name: String,
}

/// Body of `POST /email`.
#[derive(Debug, Serialize, Deserialize)]
pub struct EmailRequest {
    /// Recipient address (format is not validated here)
    pub email: String,

    /// Name of a stored picture
    pub name: String,
}

/// Body of `GET /status`.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusResponse {
    /// Console URL of the bucket
    pub bucket_url: String,

    /// Number of objects currently in the bucket
    pub num_pictures: usize,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Everything a handler can fail with, each mapped to its own status.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Request body is not the expected JSON, or a field is unusable
    #[error("Invalid request: {0}")]
    InvalidPayload(String),

    /// Request body exceeds the configured size limit
    #[error("Request body too large: {0}")]
    PayloadTooLarge(String),

    /// Decoded upload is not an image
    #[error("Invalid file type: {mime_type}. Only images are allowed.")]
    InvalidFileType { mime_type: String },

    /// Named picture is not in the store
    #[error("Picture not found: {name}")]
    PictureNotFound { name: String },

    /// Store failure while uploading
    #[error("Error uploading picture: {0}")]
    Upload(StoreError),

    /// Store or mail failure while emailing
    #[error("Error sending email: {0}")]
    Email(EmailFailure),

    /// Store failure while computing status
    #[error("Error getting status: {0}")]
    Status(StoreError),
}

/// Downstream failure behind an email request.
#[derive(Debug, Error)]
pub enum EmailFailure {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Mail(#[from] MailError),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        // Over-long bodies surface as a buffering failure inside the JSON rejection
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(rejection.body_text())
        } else {
            ApiError::InvalidPayload(rejection.body_text())
        }
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidPayload(_) | ApiError::InvalidFileType { .. } => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::PictureNotFound { .. } => StatusCode::NOT_FOUND,
            ApiError::Upload(_) | ApiError::Email(_) | ApiError::Status(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_type(&self) -> &'static str {
        match self {
            ApiError::InvalidPayload(_) => "invalid_payload",
            ApiError::InvalidFileType { .. } => "invalid_file_type",
            ApiError::PayloadTooLarge(_) => "payload_too_large",
            ApiError::PictureNotFound { .. } => "not_found",
            ApiError::Upload(_) => "upload_error",
            ApiError::Email(EmailFailure::Store(_)) => "storage_error",
            ApiError::Email(EmailFailure::Mail(_)) => "mail_error",
            ApiError::Status(_) => "status_error",
        }
    }

    /// Plain-text body returned to the caller.
    ///
    /// Server errors get a fixed message; the underlying cause only goes to
    /// the log.
    fn public_message(&self) -> String {
        match self {
            ApiError::InvalidPayload(_)
            | ApiError::InvalidFileType { .. }
            | ApiError::PayloadTooLarge(_) => self.to_string(),
            ApiError::PictureNotFound { .. } => "Picture not found".to_string(),
            ApiError::Upload(_) => "Error uploading picture".to_string(),
            ApiError::Email(_) => "Error sending email".to_string(),
            ApiError::Status(_) => "Error getting status".to_string(),
        }
    }
}

/// Convert ApiError to HTTP response.
///
/// - 5xx errors are logged at ERROR level with the downstream message
/// - 404s are logged at DEBUG level
/// - other 4xx errors are logged at WARN level
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_type = self.error_type();

        if status.is_server_error() {
            error!(
                error_type = error_type,
                status = status.as_u16(),
                "Server error: {}",
                self
            );
        } else if status == StatusCode::NOT_FOUND {
            debug!(
                error_type = error_type,
                status = status.as_u16(),
                "Resource not found: {}",
                self
            );
        } else {
            warn!(
                error_type = error_type,
                status = status.as_u16(),
                "Client error: {}",
                self
            );
        }

        (status, self.public_message()).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle heartbeat requests.
///
/// `GET /` always answers `200 OK` with body `OK`. It never touches the store
/// or the mail API, so it reports liveness only.
pub async fn heartbeat_handler() -> &'static str {
    "OK"
}

/// Decode the base64 picture payload.
///
/// ASCII whitespace is skipped so line-wrapped output (76-column MIME style,
/// `base64(1)`) decodes the same as a single line. Anything else outside the
/// standard alphabet is an error.
fn decode_image(encoded: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let compact: Vec<u8> = encoded
        .bytes()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    STANDARD.decode(compact)
}

/// Handle picture uploads.
///
/// # Endpoint
///
/// `POST /upload` with JSON body `{"image": "<base64>", "name": "a.jpg"}`
///
/// # Response
///
/// - `201 Created`: `Picture uploaded successfully`
/// - `400 Bad Request`: malformed body, empty name, bad base64, or not an image
/// - `401 Unauthorized`: rejected by the auth middleware before this runs
/// - `413 Payload Too Large`: body over the router's upload limit
/// - `500 Internal Server Error`: store failure
///
/// An existing object with the same name is overwritten.
pub async fn upload_handler<S: PictureStore, M: MailDispatcher>(
    State(state): State<AppState<S, M>>,
    payload: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<(StatusCode, &'static str), ApiError> {
    let Json(request) = payload?;

    if request.name.is_empty() {
        return Err(ApiError::InvalidPayload(
            "Picture name must not be empty".to_string(),
        ));
    }

    let data = decode_image(&request.image)
        .map_err(|e| ApiError::InvalidPayload(format!("Image is not valid base64: {}", e)))?;

    let mime_type = sniff_mime_type(&data);
    if !is_image_mime_type(mime_type) {
        return Err(ApiError::InvalidFileType {
            mime_type: mime_type.to_string(),
        });
    }

    let size = data.len();
    state
        .store
        .put(&request.name, Bytes::from(data), mime_type)
        .await
        .map_err(ApiError::Upload)?;

    info!(
        name = %request.name,
        mime_type = mime_type,
        bytes = size,
        "Picture uploaded"
    );

    Ok((StatusCode::CREATED, "Picture uploaded successfully"))
}

/// Handle picture email requests.
///
/// # Endpoint
///
/// `POST /email` with JSON body `{"email": "visitor@example.com", "name": "a.jpg"}`
///
/// # Response
///
/// - `200 OK`: `Email sent successfully`
/// - `400 Bad Request`: malformed body
/// - `401 Unauthorized`: rejected by the auth middleware before this runs
/// - `404 Not Found`: `Picture not found`; no email is sent
/// - `413 Payload Too Large`: body over the router's upload limit
/// - `500 Internal Server Error`: store or mail API failure
///
/// The mail API is called at most once per request.
pub async fn email_handler<S: PictureStore, M: MailDispatcher>(
    State(state): State<AppState<S, M>>,
    payload: Result<Json<EmailRequest>, JsonRejection>,
) -> Result<&'static str, ApiError> {
    let Json(request) = payload?;

    let exists = state
        .store
        .exists(&request.name)
        .await
        .map_err(|e| ApiError::Email(e.into()))?;

    if !exists {
        return Err(ApiError::PictureNotFound { name: request.name });
    }

    // The object can vanish between the existence check and the read
    let picture = match state.store.get(&request.name).await {
        Ok(data) => data,
        Err(StoreError::NotFound(_)) => {
            return Err(ApiError::PictureNotFound { name: request.name })
        }
        Err(e) => return Err(ApiError::Email(e.into())),
    };

    let email = Email::picture(&state.sender_email, &request.email, &request.name, &picture);

    state
        .mailer
        .send(&email)
        .await
        .map_err(|e| ApiError::Email(e.into()))?;

    info!(name = %request.name, recipient = %request.email, "Picture emailed");

    Ok("Email sent successfully")
}

/// Handle status requests.
///
/// # Endpoint
///
/// `GET /status`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "bucket_url": "https://console.cloud.google.com/storage/browser/my-bucket",
///   "num_pictures": 42
/// }
/// ```
///
/// Lists the whole bucket on every call; nothing is cached.
pub async fn status_handler<S: PictureStore, M: MailDispatcher>(
    State(state): State<AppState<S, M>>,
) -> Result<Json<StatusResponse>, ApiError> {
    let keys = state.store.list().await.map_err(ApiError::Status)?;

    Ok(Json(StatusResponse {
        bucket_url: state.store.console_url(),
        num_pictures: keys.len(),
    }))
}

// =============================================================================
// Tests
// =============================================================================
