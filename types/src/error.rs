//! Codec errors shared across crates.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid address length: expected {expected}, got {actual}")]
    InvalidAddressLength { expected: usize, actual: usize },

    #[error("empty address")]
    EmptyAddress,

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("cannot decode token metadata: {0}")]
    Metadata(String),
}
