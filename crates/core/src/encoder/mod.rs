//! Transport encoding for file payloads.
//!
//! The conversion endpoints take raw bytes as a base64 text body and return
//! converted artifacts the same way. Encoding runs over fixed-size input
//! chunks; the chunk size is a multiple of 3 so every chunk encodes without
//! padding and the concatenated output equals a one-shot encode.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Input bytes encoded per chunk. Must stay a multiple of 3.
pub const ENCODE_CHUNK_BYTES: usize = 3 * 16 * 1024;

const _: () = assert!(ENCODE_CHUNK_BYTES % 3 == 0);

/// Errors that can occur while decoding a transport payload.
#[derive(Debug, Error)]
pub enum EncodingError {
    /// The text is not valid padded base64.
    #[error("Invalid payload encoding: {0}")]
    InvalidEncoding(String),
}

/// Encodes raw bytes as standard padded base64.
pub fn encode_payload(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(bytes.len()));
    for chunk in bytes.chunks(ENCODE_CHUNK_BYTES) {
        STANDARD.encode_string(chunk, &mut out);
    }
    out
}

/// Encodes raw bytes, yielding to the runtime between chunks.
///
/// Produces exactly the same text as [`encode_payload`]. Use this for large
/// files so a single encode does not monopolise the executor thread.
pub async fn encode_payload_yielding(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(encoded_len(bytes.len()));
    for chunk in bytes.chunks(ENCODE_CHUNK_BYTES) {
        STANDARD.encode_string(chunk, &mut out);
        tokio::task::yield_now().await;
    }
    out
}

/// Decodes a base64 payload back into raw bytes.
///
/// Leading and trailing whitespace is ignored; anything else that is not
/// valid padded base64 is rejected.
pub fn decode_payload(text: &str) -> Result<Vec<u8>, EncodingError> {
    STANDARD
        .decode(text.trim())
        .map_err(|e| EncodingError::InvalidEncoding(e.to_string()))
}

fn encoded_len(input_len: usize) -> usize {
    input_len.div_ceil(3) * 4
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 31 % 251) as u8).collect()
    }

    #[test]
    fn test_empty_payload() {
        let encoded = encode_payload(&[]);
        assert_eq!(encoded, "");
        assert!(decode_payload(&encoded).unwrap().is_empty());
    }

    #[test]
    fn test_single_byte() {
        let encoded = encode_payload(&[0xff]);
        assert_eq!(encoded, "/w==");
        assert_eq!(decode_payload(&encoded).unwrap(), vec![0xff]);
    }

    #[test]
    fn test_known_vector() {
        assert_eq!(encode_payload(b"release"), "cmVsZWFzZQ==");
    }

    #[test]
    fn test_chunked_matches_one_shot() {
        for len in [
            ENCODE_CHUNK_BYTES - 1,
            ENCODE_CHUNK_BYTES,
            ENCODE_CHUNK_BYTES + 1,
            ENCODE_CHUNK_BYTES * 3 + 2,
        ] {
            let bytes = sample(len);
            let encoded = encode_payload(&bytes);
            assert_eq!(encoded, STANDARD.encode(&bytes), "length {}", len);
            assert_eq!(decode_payload(&encoded).unwrap(), bytes, "length {}", len);
        }
    }

    #[test]
    fn test_encoded_length_is_exact() {
        let bytes = sample(ENCODE_CHUNK_BYTES * 2 + 5);
        assert_eq!(encode_payload(&bytes).len(), encoded_len(bytes.len()));
    }

    #[tokio::test]
    async fn test_yielding_encoder_matches() {
        let bytes = sample(ENCODE_CHUNK_BYTES * 4 + 7);
        assert_eq!(encode_payload_yielding(&bytes).await, encode_payload(&bytes));
    }

    #[test]
    fn test_decode_ignores_surrounding_whitespace() {
        assert_eq!(decode_payload("  cmVsZWFzZQ==\n").unwrap(), b"release");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        let err = decode_payload("not*base64").unwrap_err();
        assert!(matches!(err, EncodingError::InvalidEncoding(_)));
    }
}
