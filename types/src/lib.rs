//! Fundamental types for the shard event indexer.
//!
//! This crate defines the decoded block model handed over by the node
//! (header, body, transaction pool, logs, altered accounts), the primitive
//! converters shared by every processor, the address and metadata codecs,
//! and the status latch value.

pub mod account;
pub mod block;
pub mod codec;
pub mod convert;
pub mod error;
pub mod event;
pub mod metadata;
pub mod status;
pub mod transaction;

pub use account::{AccountTokenData, AlteredAccount};
pub use block::{Body, Header, MiniBlock, MiniBlockType, OutportBlock, TransactionPool};
pub use codec::{AddressCodec, HexAddressCodec};
pub use convert::{nft_identifier, nonce_to_hex, BalanceConverter};
pub use error::CodecError;
pub use event::{EventRecord, LogData};
pub use metadata::{DigitalToken, JsonMetadataCodec, MetadataCodec, TokenMetaData};
pub use status::{StatusInfo, TxStatus};
pub use transaction::{FeeInfo, ScrInfo, SmartContractResult, Transaction, TxInfo};
