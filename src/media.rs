//! Data-URI decoding for captured photos.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Decode a browser-produced image payload into raw bytes.
///
/// The payload is either a full data URI (`data:image/jpeg;base64,<data>`)
/// or the bare base64 remainder of one the client already split on the
/// comma. Any `data:` prefix is accepted; everything after the first comma
/// is the payload.
pub fn decode_image_payload(payload: &str) -> Result<Vec<u8>, base64::DecodeError> {
    let encoded = match payload.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => payload,
    };
    STANDARD.decode(encoded.trim())
}
