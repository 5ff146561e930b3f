//! Outbound email.
//!
//! Handlers build an [`Email`] and hand it to a [`MailDispatcher`]. The
//! production dispatcher is [`SendGridClient`]; tests substitute a recorder.

mod sendgrid;

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::MailError;

pub use sendgrid::{SendGridClient, DEFAULT_SENDGRID_BASE_URL};

/// Subject line of the picture email.
pub const PICTURE_EMAIL_SUBJECT: &str = "Thanks for visiting our booth!";

/// HTML body of the picture email.
pub const PICTURE_EMAIL_HTML: &str = "<p>Thank you for visiting Google Cloud's booth at the \
conference! The entire experience was coded with AI Studio, Gemini CLI and Jules.</p>\
<p>We'd love for you to try out these technologies yourself. Get started with free Google \
Cloud credits (no credit card required) by visiting: \
<a href=\"https://trygcp.dev/dvxx-be-25\">trygcp.dev/dvxx-be-25</a></p>";

/// Content type stamped on every picture attachment.
///
/// Fixed rather than re-sniffed; mail clients render any common image type
/// under it.
pub const PICTURE_ATTACHMENT_TYPE: &str = "image/jpeg";

/// A file attached to an email, already base64-encoded for transport.
///
/// Attachments are always sent with `attachment` disposition, never inline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Base64 (standard alphabet, padded) file content
    pub content: String,
    pub filename: String,
    pub mime_type: String,
}

impl Attachment {
    /// Encode raw bytes into an attachment.
    pub fn from_bytes(
        data: &[u8],
        filename: impl Into<String>,
        mime_type: impl Into<String>,
    ) -> Self {
        Self {
            content: STANDARD.encode(data),
            filename: filename.into(),
            mime_type: mime_type.into(),
        }
    }
}

/// A single-recipient HTML email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub html: String,
    pub attachments: Vec<Attachment>,
}

impl Email {
    /// Build the booth email carrying a stored picture.
    ///
    /// The attachment is named after the picture's store key.
    pub fn picture(sender: &str, recipient: &str, picture_name: &str, picture: &[u8]) -> Self {
        Self {
            from: sender.to_string(),
            to: recipient.to_string(),
            subject: PICTURE_EMAIL_SUBJECT.to_string(),
            html: PICTURE_EMAIL_HTML.to_string(),
            attachments: vec![Attachment::from_bytes(
                picture,
                picture_name,
                PICTURE_ATTACHMENT_TYPE,
            )],
        }
    }
}

/// Trait for sending email through an external provider.
///
/// One call is one delivery attempt; implementations do not retry.
#[async_trait]
pub trait MailDispatcher: Send + Sync {
    async fn send(&self, email: &Email) -> Result<(), MailError>;
}
