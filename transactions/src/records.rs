//! Document shapes of the transactions and SC results collections.
//!
//! Fee, gas used and status are not part of the transaction record: they
//! are merged separately so that every pass can contribute to them.

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRecord {
    #[serde(skip)]
    pub hash: String,
    pub mini_block_hash: String,
    pub nonce: u64,
    pub round: u64,
    pub value: String,
    pub value_num: f64,
    pub receiver: String,
    pub sender: String,
    pub receiver_shard: u32,
    pub sender_shard: u32,
    pub gas_price: u64,
    pub gas_limit: u64,
    pub initial_paid_fee: String,
    pub data: String,
    pub signature: String,
    pub timestamp: u64,
    pub search_order: u32,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub has_sc_results: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relayer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub guardian: String,
    pub version: u32,
    pub operation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dcdt_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScResultRecord {
    #[serde(skip)]
    pub hash: String,
    pub mini_block_hash: String,
    pub nonce: u64,
    pub gas_limit: u64,
    pub gas_price: u64,
    pub value: String,
    pub value_num: f64,
    pub sender: String,
    pub receiver: String,
    pub sender_shard: u32,
    pub receiver_shard: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relayer: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub relayed_value: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub code: String,
    pub data: String,
    pub prev_tx_hash: String,
    pub original_tx_hash: String,
    pub call_type: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub return_message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub original_sender: String,
    pub timestamp: u64,
    pub initial_tx_fee: String,
    pub operation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub function: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dcdt_values: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub receivers: Vec<String>,
}
