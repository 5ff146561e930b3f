use thiserror::Error;

/// Errors that can occur when talking to the object store
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// Error from S3 or S3-compatible storage
    #[error("S3 error: {0}")]
    S3(String),

    /// Network or connection error while streaming an object body
    #[error("Connection error: {0}")]
    Connection(String),

    /// Object not found
    #[error("Object not found: {0}")]
    NotFound(String),
}

/// Errors that can occur when dispatching an email
#[derive(Debug, Clone, Error)]
pub enum MailError {
    /// The request never produced a response (DNS, TLS, connection reset, ...)
    #[error("Mail request failed: {0}")]
    Request(String),

    /// The mail API answered with a non-success status
    #[error("Mail API rejected message with status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors returned by the command-line test client
#[derive(Debug, Error)]
pub enum ClientError {
    /// Local file could not be read
    #[error("Failed to read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// HTTP request to the server failed
    #[error("Error sending request: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server returned {status}: {body}")]
    Status { status: u16, body: String },
}
