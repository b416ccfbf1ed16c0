//! Image encoding for inline data URIs.

use base64::{engine::general_purpose::STANDARD, Engine};
use billscan_core::{ImageFormat, ImageMimePolicy};

/// Detect image format from bytes (magic number detection).
pub fn detect_format(content: &[u8]) -> ImageFormat {
    if content.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        ImageFormat::Png
    } else if content.starts_with(&[0xFF, 0xD8, 0xFF]) {
        ImageFormat::Jpeg
    } else if content.starts_with(b"GIF87a") || content.starts_with(b"GIF89a") {
        ImageFormat::Gif
    } else if content.len() >= 12 && content.starts_with(b"RIFF") && &content[8..12] == b"WEBP" {
        ImageFormat::Webp
    } else {
        ImageFormat::Unknown
    }
}

/// MIME type to declare in the data URI under the given policy.
pub fn declared_mime(format: ImageFormat, policy: ImageMimePolicy) -> &'static str {
    match policy {
        ImageMimePolicy::Png => "image/png",
        ImageMimePolicy::Detect => format.mime_type().unwrap_or("image/png"),
    }
}

/// Encode `content` as a base64 data URI.
pub fn data_uri(mime_type: &str, content: &[u8]) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(content))
}
