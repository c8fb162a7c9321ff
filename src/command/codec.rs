use crate::command::SignedCommand;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use thiserror::Error;

/// Errors that can occur during encoding/decoding
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Failed to encode command: {0}")]
    EncodeError(String),

    #[error("Failed to decode command: {0}")]
    DecodeError(String),

    #[error("Invalid hex string: {0}")]
    InvalidHex(String),

    #[error("Invalid base64 string: {0}")]
    InvalidBase64(String),
}

/// Wire codec for signed commands (postcard binary, hex and base64 text)
pub struct CommandCodec;

impl CommandCodec {
    pub fn encode(signed: &SignedCommand) -> Result<Vec<u8>, CodecError> {
        postcard::to_allocvec(signed).map_err(|e| CodecError::EncodeError(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<SignedCommand, CodecError> {
        postcard::from_bytes(bytes).map_err(|e| CodecError::DecodeError(e.to_string()))
    }

    pub fn encode_hex(signed: &SignedCommand) -> Result<String, CodecError> {
        Ok(hex::encode(Self::encode(signed)?))
    }

    pub fn decode_hex(hex_str: &str) -> Result<SignedCommand, CodecError> {
        let bytes = hex::decode(hex_str).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        Self::decode(&bytes)
    }

    /// URL-safe, no padding
    pub fn encode_base64(signed: &SignedCommand) -> Result<String, CodecError> {
        Ok(URL_SAFE_NO_PAD.encode(Self::encode(signed)?))
    }

    pub fn decode_base64(b64_str: &str) -> Result<SignedCommand, CodecError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(b64_str)
            .map_err(|e| CodecError::InvalidBase64(e.to_string()))?;
        Self::decode(&bytes)
    }
}
