//! On-chain token metadata and its decoder.

use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// Metadata attached to an NFT, SFT or meta token nonce.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetaData {
    pub nonce: u64,
    pub name: Vec<u8>,
    pub creator: Vec<u8>,
    pub royalties: u32,
    pub hash: Vec<u8>,
    pub uris: Vec<Vec<u8>>,
    pub attributes: Vec<u8>,
}

/// Token balance entry as serialized by the chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitalToken {
    #[serde(rename = "type")]
    pub token_type: u32,
    /// Decimal string.
    pub value: String,
    pub properties: Vec<u8>,
    pub token_meta_data: Option<TokenMetaData>,
}

/// Structured decoder for serialized token metadata.
pub trait MetadataCodec: Send + Sync {
    fn decode_token(&self, bytes: &[u8]) -> Result<DigitalToken, CodecError>;

    fn encode_token(&self, token: &DigitalToken) -> Result<Vec<u8>, CodecError>;
}

/// JSON encoding of [`DigitalToken`].
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonMetadataCodec;

impl MetadataCodec for JsonMetadataCodec {
    fn decode_token(&self, bytes: &[u8]) -> Result<DigitalToken, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Metadata(e.to_string()))
    }

    fn encode_token(&self, token: &DigitalToken) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(token).map_err(|e| CodecError::Metadata(e.to_string()))
    }
}
