//! Content type detection from magic bytes.
//!
//! The uploaded file name and any client-supplied type are never trusted: the
//! decoded payload itself decides whether an upload is a picture.

/// Content type reported for byte buffers that match no known signature.
pub const UNKNOWN_MIME_TYPE: &str = "application/octet-stream";

/// Guess the MIME type of a byte buffer from its leading bytes.
///
/// Recognizes every image signature the `image` crate knows about (JPEG, PNG,
/// GIF, WebP, BMP, TIFF, ICO, ...). Anything else is reported as
/// [`UNKNOWN_MIME_TYPE`].
pub fn sniff_mime_type(data: &[u8]) -> &'static str {
    match image::guess_format(data) {
        Ok(format) => format.to_mime_type(),
        Err(_) => UNKNOWN_MIME_TYPE,
    }
}

/// Whether a MIME type's top-level category is `image`.
pub fn is_image_mime_type(mime: &str) -> bool {
    mime.split('/')
        .next()
        .map(|top| top.trim().eq_ignore_ascii_case("image"))
        .unwrap_or(false)
}
