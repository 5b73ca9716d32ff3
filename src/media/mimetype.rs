pub const OCTET_STREAM: &str = "application/octet-stream";

/// Sniffs the content type from magic bytes; the client-supplied type is never trusted.
pub fn detect_mimetype(bytes: &[u8]) -> &'static str {
    infer::get(bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or(OCTET_STREAM)
}

pub fn is_image(bytes: &[u8]) -> bool {
    infer::is_image(bytes)
}
