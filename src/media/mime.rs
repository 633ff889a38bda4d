use std::path::Path;

pub const OCTET_STREAM: &str = "application/octet-stream";

/// MIME type for an attachment, from its file extension.
pub fn mime_for_path(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext.as_deref() {
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("pdf") => "application/pdf",
        Some("txt") => "text/plain",
        Some("json") => "application/json",
        _ => OCTET_STREAM,
    }
}

/// Sniffs common image signatures.
pub fn detect_image_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        _ => None,
    }
}

/// Extension-based type, falling back to content sniffing for unknown
/// extensions.
pub fn attachment_mime(path: &Path, bytes: &[u8]) -> &'static str {
    match mime_for_path(path) {
        OCTET_STREAM => detect_image_mime(bytes).unwrap_or_else(|| {
            tracing::warn!(
                "Unrecognized attachment type for {} (first 4 bytes: {:02X?}), sending as {}",
                path.display(),
                &bytes[..bytes.len().min(4)],
                OCTET_STREAM
            );
            OCTET_STREAM
        }),
        known => known,
    }
}
