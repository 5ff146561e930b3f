//! Router configuration for picture-mailer.
//!
//! This module defines the HTTP routes and applies middleware for
//! authentication, CORS and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! GET  /          - Heartbeat (public)
//! GET  /status    - Bucket URL and picture count (public)
//! POST /upload    - Store a picture (protected)
//! POST /email     - Email a stored picture (protected)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use picture_mailer::server::routes::{create_router, RouterConfig};
//! use picture_mailer::server::AppState;
//!
//! let state = AppState::new(store, mailer, "booth@example.com");
//! let config = RouterConfig::new("my-api-key")
//!     .with_cors_origin("https://booth.example.com");
//!
//! let router = create_router(state, config);
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::auth::{auth_middleware, ApiKeyAuth, API_KEY_HEADER};
use super::handlers::{email_handler, heartbeat_handler, status_handler, upload_handler, AppState};
use crate::mail::MailDispatcher;
use crate::store::PictureStore;

// =============================================================================
// Router Configuration
// =============================================================================

/// Default cap on a `/upload` or `/email` request body (32 MiB).
///
/// The picture travels base64-encoded, so the largest accepted picture is
/// about three quarters of this.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

/// Configuration for the HTTP router.
#[derive(Clone)]
pub struct RouterConfig {
    /// Shared secret expected in the `X-API-KEY` header
    pub api_key: String,

    /// Whether `/upload` and `/email` require the API key
    pub auth_enabled: bool,

    /// The single origin allowed cross-origin access (None = any origin)
    pub cors_origin: Option<String>,

    /// Whether to enable request tracing
    pub enable_tracing: bool,

    /// Largest accepted request body on the protected routes, in bytes
    pub max_upload_bytes: usize,
}

impl RouterConfig {
    /// Create a new router configuration with the given API key.
    ///
    /// By default:
    /// - Authentication is enabled
    /// - CORS allows any origin
    /// - Tracing is enabled
    /// - Request bodies up to [`DEFAULT_MAX_UPLOAD_BYTES`] are accepted
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            auth_enabled: true,
            cors_origin: None,
            enable_tracing: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Create a configuration with authentication disabled.
    ///
    /// **Warning**: This should only be used for development/testing.
    pub fn without_auth() -> Self {
        Self {
            api_key: String::new(),
            auth_enabled: false,
            cors_origin: None,
            enable_tracing: true,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }

    /// Restrict cross-origin access to a single origin.
    pub fn with_cors_origin(mut self, origin: impl Into<String>) -> Self {
        self.cors_origin = Some(origin.into());
        self
    }

    /// Set the largest accepted request body on the protected routes.
    pub fn with_max_upload_bytes(mut self, bytes: usize) -> Self {
        self.max_upload_bytes = bytes;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the main application router.
///
/// This function builds the complete Axum router with:
/// - Public routes (heartbeat, status)
/// - Protected routes (upload, email) behind the API key middleware
/// - CORS configuration
/// - Request tracing (optional)
pub fn create_router<S, M>(state: AppState<S, M>, config: RouterConfig) -> Router
where
    S: PictureStore + 'static,
    M: MailDispatcher + 'static,
{
    let cors = build_cors_layer(&config);

    let protected_routes = Router::new()
        .route("/upload", post(upload_handler::<S, M>))
        .route("/email", post(email_handler::<S, M>))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
        .with_state(state.clone());

    let protected_routes = if config.auth_enabled {
        let auth = ApiKeyAuth::new(&config.api_key);
        protected_routes.route_layer(middleware::from_fn_with_state(auth, auth_middleware))
    } else {
        protected_routes
    };

    let public_routes = Router::new()
        .route("/", get(heartbeat_handler))
        .route("/status", get(status_handler::<S, M>))
        .with_state(state);

    let router = Router::new()
        .merge(protected_routes)
        .merge(public_routes)
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, API_KEY_HEADER])
        .max_age(Duration::from_secs(86400)); // 24 hours

    match &config.cors_origin {
        None => cors.allow_origin(Any),
        Some(origin) => match origin.parse::<http::HeaderValue>() {
            Ok(value) => cors.allow_origin(value),
            // An unparseable origin allows nothing rather than everything
            Err(_) => cors,
        },
    }
}

// =============================================================================
// Tests
// =============================================================================
