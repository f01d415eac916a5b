//! Transactions and smart contract results as found in the pool.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub nonce: u64,
    pub value: u128,
    pub receiver: Vec<u8>,
    pub sender: Vec<u8>,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub data: Vec<u8>,
    pub signature: Vec<u8>,
    pub relayer: Vec<u8>,
    pub guardian: Vec<u8>,
    pub version: u32,
}

/// Fee data computed by the node for a transaction or SCR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeInfo {
    pub gas_used: u64,
    pub fee: u128,
    pub initial_paid_fee: u128,
    pub gas_refunded: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInfo {
    pub transaction: Transaction,
    pub fee_info: FeeInfo,
    pub execution_order: u32,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmartContractResult {
    pub nonce: u64,
    pub value: u128,
    pub receiver: Vec<u8>,
    pub sender: Vec<u8>,
    pub relayer: Vec<u8>,
    pub relayed_value: u128,
    pub code: Vec<u8>,
    pub data: Vec<u8>,
    pub prev_tx_hash: Vec<u8>,
    pub original_tx_hash: Vec<u8>,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub call_type: u32,
    pub return_message: Vec<u8>,
    pub original_sender: Vec<u8>,
}

impl SmartContractResult {
    /// Hex hash of the transaction this result ultimately belongs to.
    pub fn original_tx_hash_hex(&self) -> String {
        if self.original_tx_hash.is_empty() {
            hex::encode(&self.prev_tx_hash)
        } else {
            hex::encode(&self.original_tx_hash)
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrInfo {
    pub scr: SmartContractResult,
    pub fee_info: FeeInfo,
    pub execution_order: u32,
}
