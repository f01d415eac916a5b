//! Accounts altered by a block, as reported by the node.

use serde::{Deserialize, Serialize};

use crate::metadata::TokenMetaData;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountTokenData {
    /// Collection (or fungible token) identifier, without nonce.
    pub identifier: String,
    pub nonce: u64,
    pub balance: String,
    pub properties: String,
    pub metadata: Option<TokenMetaData>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlteredAccount {
    pub address: String,
    pub nonce: u64,
    pub balance: String,
    pub tokens: Vec<AccountTokenData>,
}
