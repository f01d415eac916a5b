//! Accounts DCDT balances written by a block.
//!
//! Every document carries the `timestamp` and `shardID` of the block that
//! wrote it, which is what a revert selects on.

use std::collections::BTreeMap;

use serde_json::{json, Value};
use tracing::warn;

use shardex_logsevents::delta::NftMetadata;
use shardex_store::{WriteAction, WriteItem};
use shardex_transactions::SkippedRecord;
use shardex_types::convert::BalanceConverter;
use shardex_types::{nft_identifier, nonce_to_hex, AccountTokenData, AddressCodec, AlteredAccount};

/// `{address}-{token}` for fungible balances, `{address}-{token}-{hexnonce}`
/// otherwise.
pub fn account_dcdt_id(address: &str, token: &str, nonce: u64) -> String {
    if nonce == 0 {
        format!("{}-{}", address, token)
    } else {
        format!("{}-{}-{}", address, token, nonce_to_hex(nonce))
    }
}

fn is_zero_balance(balance: &str) -> bool {
    balance.is_empty() || balance.parse::<u128>().map_or(false, |b| b == 0)
}

pub struct AccountsDcdtWriter<'a> {
    pub codec: &'a dyn AddressCodec,
    pub balance_converter: BalanceConverter,
    pub timestamp: u64,
    pub shard_id: u32,
}

impl AccountsDcdtWriter<'_> {
    pub fn writes(
        &self,
        accounts: &BTreeMap<String, AlteredAccount>,
        skipped: &mut Vec<SkippedRecord>,
    ) -> Vec<WriteItem> {
        let mut items = Vec::new();
        for account in accounts.values() {
            for token in &account.tokens {
                let id = account_dcdt_id(&account.address, &token.identifier, token.nonce);
                if is_zero_balance(&token.balance) {
                    items.push(WriteItem::new(id, WriteAction::Delete));
                    continue;
                }
                match self.document(&account.address, token) {
                    Ok(doc) => items.push(WriteItem::new(id, WriteAction::Overwrite(doc))),
                    Err(err) => {
                        warn!(id = %id, error = %err, "skipping account balance");
                        skipped.push(SkippedRecord {
                            id,
                            reason: err.to_string(),
                        });
                    }
                }
            }
        }
        items
    }

    fn document(&self, address: &str, token: &AccountTokenData) -> Result<Value, serde_json::Error> {
        let identifier = if token.nonce == 0 {
            token.identifier.clone()
        } else {
            nft_identifier(&token.identifier, token.nonce)
        };
        let mut doc = json!({
            "address": address,
            "token": token.identifier,
            "identifier": identifier,
            "tokenNonce": token.nonce,
            "balance": token.balance,
            "balanceNum": self.balance_converter.str_to_float(&token.balance),
            "timestamp": self.timestamp,
            "shardID": self.shard_id,
        });
        if !token.properties.is_empty() {
            doc["properties"] = json!(token.properties);
        }
        if let Some(metadata) = &token.metadata {
            doc["data"] = serde_json::to_value(NftMetadata::from_raw(metadata, self.codec))?;
        }
        Ok(doc)
    }
}
