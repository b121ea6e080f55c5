//! MIME type detection for local files

use std::path::Path;

use crate::config;

/// Guess the declared MIME type of a file from its extension
pub fn mime_from_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "jpg" | "jpeg" | "jpe" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => config::image::FALLBACK_MIME_TYPE,
    }
}

/// Whether a declared MIME type may be uploaded
pub fn is_accepted(mime_type: &str) -> bool {
    config::image::ACCEPTED_MIME_TYPES.contains(&mime_type)
}
