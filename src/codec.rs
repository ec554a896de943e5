//! Reversible text compression for post bodies: UTF-8 bytes are gzipped and
//! the result is stored as standard-alphabet base64.

use std::io::{Read, Write};

use base64::{Engine, engine::general_purpose::STANDARD};
use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    #[error("invalid gzip stream: {0}")]
    Io(#[from] std::io::Error),
}

pub fn compress(text: &str) -> Result<String, CodecError> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(text.as_bytes())?;
    let bytes = encoder.finish()?;
    Ok(STANDARD.encode(bytes))
}

pub fn decompress(token: &str) -> Result<String, CodecError> {
    let bytes = STANDARD.decode(token)?;
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_empty_ascii_and_multibyte_text() {
        for text in [
            "",
            "Tempered glass, 8mm, clear finish.",
            "Kính cường lực – 强化玻璃 – 🪟",
        ] {
            assert_eq!(decompress(&compress(text).unwrap()).unwrap(), text);
        }
    }

    #[test]
    fn token_is_plain_base64() {
        let token = compress("hello").unwrap();
        assert!(STANDARD.decode(&token).is_ok());
        assert_ne!(token, "hello");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(decompress("not base64!"), Err(CodecError::Base64(_))));
        let not_gzip = STANDARD.encode(b"plain bytes");
        assert!(matches!(decompress(&not_gzip), Err(CodecError::Io(_))));
    }
}
