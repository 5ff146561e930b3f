//! HTTP client for a running picture-mailer server.
//!
//! Backs the `upload` subcommand: reads a local picture, base64-encodes it and
//! posts it to `/upload` with the shared secret, then optionally asks the
//! server to email it.

use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::ClientError;
use crate::server::{EmailRequest, StatusResponse, UploadRequest, API_KEY_HEADER};

/// Client for the picture-mailer HTTP API.
#[derive(Clone)]
pub struct PictureClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl PictureClient {
    pub fn new(base_url: &str, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Upload raw picture bytes under `name`. Returns the server's message.
    pub async fn upload(&self, name: &str, data: &[u8]) -> Result<String, ClientError> {
        let body = UploadRequest {
            image: STANDARD.encode(data),
            name: name.to_string(),
        };

        let response = self
            .http
            .post(self.url("/upload"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        into_text(response).await
    }

    /// Upload a local file, named after its file name.
    ///
    /// Returns the picture name together with the server's message.
    pub async fn upload_file(&self, path: &Path) -> Result<(String, String), ClientError> {
        let data = tokio::fs::read(path)
            .await
            .map_err(|source| ClientError::File {
                path: path.display().to_string(),
                source,
            })?;

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let message = self.upload(&name, &data).await?;
        Ok((name, message))
    }

    /// Ask the server to email a stored picture.
    pub async fn email(&self, recipient: &str, name: &str) -> Result<String, ClientError> {
        let body = EmailRequest {
            email: recipient.to_string(),
            name: name.to_string(),
        };

        let response = self
            .http
            .post(self.url("/email"))
            .header(API_KEY_HEADER, &self.api_key)
            .json(&body)
            .send()
            .await?;

        into_text(response).await
    }

    /// Fetch `/status`.
    pub async fn status(&self) -> Result<StatusResponse, ClientError> {
        let response = self.http.get(self.url("/status")).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response.json().await?)
    }
}

async fn into_text(response: reqwest::Response) -> Result<String, ClientError> {
    let status = response.status();
    let body = response.text().await?;

    if status.is_success() {
        Ok(body)
    } else {
        Err(ClientError::Status {
            status: status.as_u16(),
            body,
        })
    }
}
