//! Media type detection and preview glyphs.
//!
//! The terminal has no browser-declared media type, so the type is derived
//! from the file extension. Unknown extensions map to
//! `application/octet-stream`, which no intake policy accepts.

use std::path::Path;

/// Media type reported for unknown extensions
pub const UNKNOWN_MEDIA_TYPE: &str = "application/octet-stream";

const EXTENSIONS: &[(&str, &str)] = &[
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("svg", "image/svg+xml"),
    ("pdf", "application/pdf"),
    ("doc", "application/msword"),
    (
        "docx",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    ),
    ("txt", "text/plain"),
    ("zip", "application/zip"),
];

/// Guess the media type of `path` from its extension
#[must_use]
pub fn media_type_for_path(path: &Path) -> &'static str {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return UNKNOWN_MEDIA_TYPE;
    };

    EXTENSIONS
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map_or(UNKNOWN_MEDIA_TYPE, |&(_, media_type)| media_type)
}

/// Preview glyph for a media type
#[must_use]
pub fn glyph(media_type: &str) -> &'static str {
    let essence = media_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    match essence.as_str() {
        t if t.starts_with("image/") => "🖼",
        "application/pdf" => "📕",
        "application/msword"
        | "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => "📝",
        "text/plain" => "📄",
        "application/zip" | "application/x-zip-compressed" => "🗜",
        _ => "📁",
    }
}
