//! Shared-secret authentication for picture-mailer.
//!
//! Protected routes require an `X-API-KEY` header whose value equals the
//! configured secret. There is a single static secret: no scoping, no
//! rotation, no expiry.
//!
//! The check runs as Axum middleware, so a rejected request never reaches its
//! handler: no body is parsed and neither the store nor the mail API is
//! contacted.
//!
//! # Example
//!
//! ```rust
//! use picture_mailer::server::auth::ApiKeyAuth;
//!
//! let auth = ApiKeyAuth::new("my-secret-key");
//!
//! assert!(auth.verify(Some("my-secret-key")).is_ok());
//! assert!(auth.verify(Some("wrong")).is_err());
//! assert!(auth.verify(None).is_err());
//! ```

use axum::{
    extract::{Request, State},
    http::{HeaderMap, HeaderName, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

// =============================================================================
// Types
// =============================================================================

/// Header carrying the shared secret.
pub const API_KEY_HEADER: HeaderName = HeaderName::from_static("x-api-key");

/// Authentication error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No `X-API-KEY` header on the request
    MissingApiKey,

    /// Header present but not equal to the secret (or not valid ASCII)
    InvalidApiKey,
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingApiKey => write!(f, "Missing X-API-KEY header"),
            AuthError::InvalidApiKey => write!(f, "Invalid API key"),
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = StatusCode::UNAUTHORIZED;
        let error_type = match &self {
            AuthError::MissingApiKey => "missing_api_key",
            AuthError::InvalidApiKey => "invalid_api_key",
        };

        // A wrong key may be probing; a missing one is usually a misconfigured client
        match &self {
            AuthError::InvalidApiKey => {
                warn!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    self
                );
            }
            AuthError::MissingApiKey => {
                debug!(
                    error_type = error_type,
                    status = status.as_u16(),
                    "Authentication failed: {}",
                    self
                );
            }
        }

        // No detail leaks to the caller
        (status, "Unauthorized").into_response()
    }
}

// =============================================================================
// API Key Authentication
// =============================================================================

/// Authenticator comparing the `X-API-KEY` header against a static secret.
#[derive(Clone)]
pub struct ApiKeyAuth {
    secret: Vec<u8>,
}

impl ApiKeyAuth {
    /// Create a new authenticator for the given secret.
    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
        }
    }

    /// Check a presented key against the secret.
    ///
    /// Authorized iff the values are byte-for-byte equal. The comparison is
    /// constant-time in the length of the secret.
    pub fn verify(&self, presented: Option<&str>) -> Result<(), AuthError> {
        let presented = presented.ok_or(AuthError::MissingApiKey)?;

        if presented.as_bytes().ct_eq(&self.secret).into() {
            Ok(())
        } else {
            Err(AuthError::InvalidApiKey)
        }
    }

    /// Check the `X-API-KEY` header of a request.
    pub fn verify_headers(&self, headers: &HeaderMap) -> Result<(), AuthError> {
        match headers.get(&API_KEY_HEADER) {
            None => Err(AuthError::MissingApiKey),
            Some(value) => {
                let value = value.to_str().map_err(|_| AuthError::InvalidApiKey)?;
                self.verify(Some(value))
            }
        }
    }
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware rejecting requests without a valid `X-API-KEY` header.
///
/// # Example
///
/// ```ignore
/// use axum::{Router, middleware, routing::post};
/// use picture_mailer::server::auth::{ApiKeyAuth, auth_middleware};
///
/// let auth = ApiKeyAuth::new("secret-key");
/// let app = Router::new()
///     .route("/upload", post(upload_handler))
///     .layer(middleware::from_fn_with_state(auth, auth_middleware));
/// ```
pub async fn auth_middleware(
    State(auth): State<ApiKeyAuth>,
    request: Request,
    next: Next,
) -> Result<Response, AuthError> {
    auth.verify_headers(request.headers())?;

    Ok(next.run(request).await)
}

// =============================================================================
// Tests
// =============================================================================
