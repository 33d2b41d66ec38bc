/// Media type assumed when an upload does not declare one.
pub const DEFAULT_IMAGE_MIME: &str = "image/jpeg";

/// Sniffs the media type of a local image from its magic bytes.
pub fn detect_image_mime(bytes: &[u8]) -> &'static str {
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [0x89, 0x50, 0x4E, 0x47, ..] => "image/png",
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => "image/webp",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        _ => {
            tracing::warn!(
                "Unrecognized image format (first 4 bytes: {:02X?}), falling back to {}",
                &bytes[..bytes.len().min(4)],
                DEFAULT_IMAGE_MIME
            );
            DEFAULT_IMAGE_MIME
        }
    }
}

/// Declared upload media type, or [`DEFAULT_IMAGE_MIME`] when absent or blank.
pub fn declared_or_default(declared: Option<&str>) -> String {
    declared
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .unwrap_or(DEFAULT_IMAGE_MIME)
        .to_string()
}
