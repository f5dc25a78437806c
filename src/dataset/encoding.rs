//! Text decoding for exported files
//!
//! Exports arrive either as UTF-8 or in a Latin-1 compatible legacy
//! encoding. UTF-8 is tried first.

/// Decodes file contents, falling back to Latin-1 when not valid UTF-8
///
/// A leading UTF-8 byte order mark is dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        // Every Latin-1 byte is the code point of the same value
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}
