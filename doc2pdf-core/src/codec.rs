//! Base64 transport encoding for document and PDF payloads.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CodecError {
    #[error("Invalid Base64 string: {0}")]
    InvalidBase64(String),
}

/// Decode a standard base64 string.
///
/// Whitespace anywhere in the input is ignored so that line-wrapped payloads
/// are accepted.
pub fn decode(text: &str) -> Result<Vec<u8>, CodecError> {
    let compact: String = text.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    STANDARD.decode(compact.as_bytes()).map_err(|e| {
        tracing::error!("Failed to decode base64 payload: {e}");
        CodecError::InvalidBase64(e.to_string())
    })
}

/// Encode bytes as padded standard base64.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_round_trip() {
        assert_eq!(encode(&[]), "");
        assert_eq!(decode("").unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn test_known_value() {
        assert_eq!(encode(b"PK\x03\x04"), "UEsDBA==");
        assert_eq!(decode("UEsDBA==").unwrap(), b"PK\x03\x04");
    }

    #[test]
    fn test_whitespace_is_ignored() {
        assert_eq!(decode("  UEsD\nBA==\r\n").unwrap(), b"PK\x03\x04");
    }

    #[test]
    fn test_invalid_input() {
        let err = decode("not base64!").unwrap_err();
        assert!(matches!(err, CodecError::InvalidBase64(_)));
        assert!(err.to_string().starts_with("Invalid Base64 string"));
    }

    proptest! {
        #[test]
        fn prop_round_trip(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
            prop_assert_eq!(decode(&encode(&bytes)).unwrap(), bytes);
        }
    }
}
