//! Reversible obfuscation applied to every frame on the wire.
//!
//! The plaintext is XOR-ed byte by byte with a repeating key and the result is
//! base64 encoded so the frame travels as plain ASCII text. Decoding reverses
//! the two steps; since XOR is its own inverse the same key undoes the combine.
//!
//! This is obfuscation only. It offers no confidentiality against anyone who
//! knows (or guesses) the shared key.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use thiserror::Error;

/// Failure to turn a wire frame back into plaintext
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("malformed base64 frame: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("decoded frame is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// XORs `data` in place with the repeating `key`; an empty key leaves data untouched
fn xor_with_key(data: &mut [u8], key: &[u8]) {
    if key.is_empty() {
        return;
    }

    for (byte, key_byte) in data.iter_mut().zip(key.iter().cycle()) {
        *byte ^= key_byte;
    }
}

/// Obfuscates `plaintext` into a wire-safe frame
pub fn encode(plaintext: &str, key: &[u8]) -> String {
    let mut bytes = plaintext.as_bytes().to_vec();
    xor_with_key(&mut bytes, key);
    STANDARD.encode(bytes)
}

/// Recovers the plaintext of a frame produced by [`encode`] with the same key
///
/// Leading and trailing ASCII whitespace around the frame is ignored.
pub fn decode(wire: &str, key: &[u8]) -> Result<String, CodecError> {
    let mut bytes = STANDARD.decode(wire.trim_matches(|c: char| c.is_ascii_whitespace()))?;
    xor_with_key(&mut bytes, key);
    Ok(String::from_utf8(bytes)?)
}
