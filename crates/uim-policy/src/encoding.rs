//! base64url helpers for keys and signatures carried in JSON fields.

use base64::Engine;
use base64::engine::general_purpose::{URL_SAFE, URL_SAFE_NO_PAD};

/// Encode with the padded URL-safe alphabet.
pub fn encode(bytes: &[u8]) -> String {
    URL_SAFE.encode(bytes)
}

/// Decode URL-safe base64, with or without padding.
pub fn decode(value: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(value.trim().trim_end_matches('='))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_accepts_padded_and_unpadded() {
        let padded = encode(b"ab");
        assert!(padded.ends_with('='));
        assert_eq!(decode(&padded).unwrap(), b"ab");
        assert_eq!(decode(padded.trim_end_matches('=')).unwrap(), b"ab");
    }
}
