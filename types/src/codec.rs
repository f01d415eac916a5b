//! Address encoding.

use crate::error::CodecError;

/// Renders raw account bytes into the string form stored in documents.
pub trait AddressCodec: Send + Sync {
    fn encode(&self, bytes: &[u8]) -> Result<String, CodecError>;

    fn decode(&self, encoded: &str) -> Result<Vec<u8>, CodecError>;

    /// Encode, collapsing any failure into an empty string.
    fn encode_silent(&self, bytes: &[u8]) -> String {
        self.encode(bytes).unwrap_or_default()
    }
}

/// Lowercase hex rendering of addresses.
///
/// With an expected length set, any input of another length fails, which is
/// how a real bech32 codec treats truncated public keys.
#[derive(Clone, Debug, Default)]
pub struct HexAddressCodec {
    expected_len: Option<usize>,
}

impl HexAddressCodec {
    pub fn new() -> Self {
        Self { expected_len: None }
    }

    pub fn with_length(len: usize) -> Self {
        Self {
            expected_len: Some(len),
        }
    }
}

impl AddressCodec for HexAddressCodec {
    fn encode(&self, bytes: &[u8]) -> Result<String, CodecError> {
        match self.expected_len {
            Some(expected) if bytes.len() != expected => Err(CodecError::InvalidAddressLength {
                expected,
                actual: bytes.len(),
            }),
            None if bytes.is_empty() => Err(CodecError::EmptyAddress),
            _ => Ok(hex::encode(bytes)),
        }
    }

    fn decode(&self, encoded: &str) -> Result<Vec<u8>, CodecError> {
        let bytes = hex::decode(encoded).map_err(|e| CodecError::InvalidHex(e.to_string()))?;
        if let Some(expected) = self.expected_len {
            if bytes.len() != expected {
                return Err(CodecError::InvalidAddressLength {
                    expected,
                    actual: bytes.len(),
                });
            }
        }
        Ok(bytes)
    }
}
