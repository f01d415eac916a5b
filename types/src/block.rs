//! Decoded block as delivered by the node for one indexing pass.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::account::AlteredAccount;
use crate::event::LogData;
use crate::transaction::{ScrInfo, TxInfo};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub hash: Vec<u8>,
    pub prev_hash: Vec<u8>,
    pub nonce: u64,
    pub round: u64,
    pub epoch: u32,
    pub shard_id: u32,
    /// Unix seconds.
    pub timestamp: u64,
}

impl Header {
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum MiniBlockType {
    #[default]
    TxBlock,
    SmartContractResultBlock,
    InvalidBlock,
    RewardsBlock,
    ReceiptBlock,
    PeerBlock,
}

impl MiniBlockType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TxBlock => "TxBlock",
            Self::SmartContractResultBlock => "SmartContractResultBlock",
            Self::InvalidBlock => "InvalidBlock",
            Self::RewardsBlock => "RewardsBlock",
            Self::ReceiptBlock => "ReceiptBlock",
            Self::PeerBlock => "PeerBlock",
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiniBlock {
    pub hash: Vec<u8>,
    pub sender_shard_id: u32,
    pub receiver_shard_id: u32,
    pub mb_type: MiniBlockType,
    pub tx_hashes: Vec<Vec<u8>>,
}

impl MiniBlock {
    pub fn hash_hex(&self) -> String {
        hex::encode(&self.hash)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Body {
    pub mini_blocks: Vec<MiniBlock>,
}

impl Body {
    /// Hex hashes of every transaction or SCR referenced by the body.
    pub fn tx_hashes_hex(&self) -> Vec<String> {
        self.mini_blocks
            .iter()
            .flat_map(|mb| mb.tx_hashes.iter().map(hex::encode))
            .collect()
    }
}

/// Transactions, SCRs and logs of a block, keyed by hex hash.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionPool {
    pub transactions: BTreeMap<String, TxInfo>,
    pub smart_contract_results: BTreeMap<String, ScrInfo>,
    pub logs: Vec<LogData>,
}

/// Everything needed to index one block of one shard.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutportBlock {
    pub header: Header,
    pub body: Body,
    pub pool: TransactionPool,
    /// Keyed by encoded address.
    pub altered_accounts: BTreeMap<String, AlteredAccount>,
}
