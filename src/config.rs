//! Configuration management for picture-mailer.
//!
//! Every option can be given on the command line or through an environment
//! variable. A `.env` file in the working directory is loaded before parsing.
//!
//! # Example
//!
//! ```ignore
//! use clap::Parser;
//! use picture_mailer::config::{Cli, Command};
//!
//! match Cli::parse().into_command() {
//!     Command::Serve(config) => println!("Listening on {}", config.bind_address()),
//!     Command::Upload(config) => println!("Uploading {}", config.file.display()),
//!     Command::Check(config) => println!("Checking bucket {}", config.storage.bucket_name),
//! }
//! ```
//!
//! # Environment Variables
//!
//! - `HOST` - Server bind address (default: 0.0.0.0)
//! - `PORT` - Server port (default: 8080)
//! - `PROJECT_ID` - Cloud project identifier (required)
//! - `BUCKET_NAME` - Bucket holding the pictures (required)
//! - `STORAGE_ENDPOINT` - Custom S3-compatible endpoint (GCS, MinIO)
//! - `STORAGE_REGION` - Storage region (default: auto)
//! - `SENDGRID_API_KEY` - SendGrid API key (required)
//! - `SENDGRID_BASE_URL` - SendGrid API base URL
//! - `SENDER_EMAIL` - From address of outgoing email (required)
//! - `API_KEY` - Shared secret for `/upload` and `/email`
//! - `AUTH_ENABLED` - Require the shared secret (default: true)
//! - `CORS_ORIGIN` - Single allowed cross-origin (default: any)
//! - `MAX_UPLOAD_BYTES` - Largest accepted request body (default: 32 MiB)
//! - `SERVER_URL` - Server base URL used by the `upload` client

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::mail::DEFAULT_SENDGRID_BASE_URL;
use crate::server::DEFAULT_MAX_UPLOAD_BYTES;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default storage region. GCS interoperability accepts "auto".
pub const DEFAULT_REGION: &str = "auto";

/// Default server URL for the upload client.
pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:8080";

// =============================================================================
// CLI Arguments
// =============================================================================

/// picture-mailer - store uploaded pictures and email them to visitors.
#[derive(Parser, Debug, Clone)]
#[command(name = "picture-mailer")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    pub fn into_command(self) -> Command {
        self.command
    }
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the HTTP server.
    Serve(ServeConfig),

    /// Upload a local picture to a running server (test client).
    Upload(UploadConfig),

    /// Check storage connectivity and report the picture count.
    Check(CheckConfig),
}

/// Object storage settings shared by `serve` and `check`.
#[derive(Args, Debug, Clone)]
pub struct StorageConfig {
    /// Cloud project identifier.
    #[arg(long, env = "PROJECT_ID")]
    pub project_id: String,

    /// Bucket holding the pictures.
    #[arg(long, env = "BUCKET_NAME")]
    pub bucket_name: String,

    /// Custom endpoint URL for S3-compatible services.
    ///
    /// Use `https://storage.googleapis.com` for Google Cloud Storage with HMAC
    /// interoperability keys, or a MinIO URL for local development.
    #[arg(long, env = "STORAGE_ENDPOINT")]
    pub storage_endpoint: Option<String>,

    /// Storage region.
    #[arg(long, default_value = DEFAULT_REGION, env = "STORAGE_REGION")]
    pub storage_region: String,
}

impl StorageConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.project_id.is_empty() {
            return Err("Project ID is required. Set --project-id or PROJECT_ID".to_string());
        }

        if self.bucket_name.is_empty() {
            return Err("Bucket name is required. Set --bucket-name or BUCKET_NAME".to_string());
        }

        Ok(())
    }
}

/// Settings for the `serve` subcommand.
#[derive(Args, Debug, Clone)]
pub struct ServeConfig {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    // =========================================================================
    // Storage Configuration
    // =========================================================================
    #[command(flatten)]
    pub storage: StorageConfig,

    // =========================================================================
    // Mail Configuration
    // =========================================================================
    /// SendGrid API key.
    #[arg(long, env = "SENDGRID_API_KEY", hide_env_values = true)]
    pub sendgrid_api_key: String,

    /// SendGrid API base URL.
    #[arg(long, default_value = DEFAULT_SENDGRID_BASE_URL, env = "SENDGRID_BASE_URL")]
    pub sendgrid_base_url: String,

    /// From address of every outgoing email.
    #[arg(long, env = "SENDER_EMAIL")]
    pub sender_email: String,

    // =========================================================================
    // Authentication Configuration
    // =========================================================================
    /// Shared secret expected in the X-API-KEY header.
    ///
    /// If not provided and auth is enabled, the server will fail to start.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Require the shared secret on /upload and /email.
    ///
    /// WARNING: Only disable authentication in development/testing.
    #[arg(long, default_value_t = true, env = "AUTH_ENABLED", action = clap::ArgAction::Set)]
    pub auth_enabled: bool,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// The single origin allowed cross-origin access.
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "CORS_ORIGIN")]
    pub cors_origin: Option<String>,

    /// Largest accepted /upload or /email request body, in bytes.
    ///
    /// Pictures arrive base64-encoded, so this must be about a third larger
    /// than the biggest picture.
    #[arg(long, default_value_t = DEFAULT_MAX_UPLOAD_BYTES, env = "MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: usize,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl ServeConfig {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        self.storage.validate()?;

        if self.sendgrid_api_key.is_empty() {
            return Err(
                "SendGrid API key is required. Set --sendgrid-api-key or SENDGRID_API_KEY"
                    .to_string(),
            );
        }

        if self.sender_email.is_empty() {
            return Err(
                "Sender email is required. Set --sender-email or SENDER_EMAIL".to_string(),
            );
        }

        if self.max_upload_bytes == 0 {
            return Err("Max upload bytes must be greater than 0".to_string());
        }

        if self.auth_enabled && self.api_key.as_deref().map_or(true, str::is_empty) {
            return Err(
                "Authentication is enabled but no API key provided. \
                 Set --api-key or API_KEY, or disable auth with --auth-enabled=false"
                    .to_string(),
            );
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the API key, or an empty string if unset (call validate() first).
    pub fn api_key_or_empty(&self) -> &str {
        self.api_key.as_deref().unwrap_or("")
    }
}

/// Settings for the `upload` subcommand.
#[derive(Args, Debug, Clone)]
pub struct UploadConfig {
    /// Picture file to upload. Its file name becomes the picture name.
    pub file: PathBuf,

    /// Base URL of the running server.
    #[arg(long, default_value = DEFAULT_SERVER_URL, env = "SERVER_URL")]
    pub server_url: String,

    /// Shared secret sent in the X-API-KEY header.
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    pub api_key: String,

    /// Email the picture to this address after uploading it.
    #[arg(long)]
    pub email: Option<String>,
}

impl UploadConfig {
    pub fn validate(&self) -> Result<(), String> {
        if self.api_key.is_empty() {
            return Err("API_KEY not found in environment variables.".to_string());
        }

        if !self.file.exists() {
            return Err(format!("File not found at {}", self.file.display()));
        }

        Ok(())
    }
}

/// Settings for the `check` subcommand.
#[derive(Args, Debug, Clone)]
pub struct CheckConfig {
    #[command(flatten)]
    pub storage: StorageConfig,

    /// List every picture name in the bucket.
    #[arg(long, default_value_t = false)]
    pub list_pictures: bool,

    /// Enable verbose logging.
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

// =============================================================================
// Tests
// =============================================================================
