//! Undo of everything a block wrote, keyed by its header and body.
//!
//! The four steps are independent: each is attempted whatever happened to
//! the others, and every failure is reported.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use shardex_store::indices::{ACCOUNTS_DCDT, BLOCKS, MINIBLOCKS, OPERATIONS, SCRESULTS, TRANSACTIONS};
use shardex_store::write::FEE_FIELD;
use shardex_store::{
    apply_action, Document, DocumentStore, FeeWrite, Mutation, Query, StoreError, WriteAction, WriteItem,
};
use shardex_types::{Body, Header};

use crate::blocks::mini_block_reverts;
use crate::error::{RollbackError, RollbackStep};

const ORIGINAL_TX_HASH: &str = "originalTxHash";
const HAS_SC_RESULTS: &str = "hasScResults";

/// Fields a transaction document can carry before any pass holding the
/// transaction itself was stored, other than refunds.
const PLACEHOLDER_FIELDS: [&str; 2] = [HAS_SC_RESULTS, "type"];

pub struct RollbackEngine<'a> {
    store: &'a dyn DocumentStore,
    denomination: u32,
}

impl<'a> RollbackEngine<'a> {
    pub fn new(store: &'a dyn DocumentStore, denomination: u32) -> Self {
        Self {
            store,
            denomination,
        }
    }

    pub fn revert_block(&self, header: &Header, body: &Body) -> Result<(), RollbackError> {
        let steps: [(RollbackStep, Result<(), StoreError>); 4] = [
            (RollbackStep::Block, self.remove_block(header)),
            (RollbackStep::MiniBlocks, self.revert_mini_blocks(header, body)),
            (RollbackStep::Transactions, self.remove_transactions(body)),
            (
                RollbackStep::AccountsDcdt,
                self.remove_accounts_dcdt(header.timestamp, header.shard_id)
                    .map(|_| ()),
            ),
        ];

        let failures: Vec<(RollbackStep, StoreError)> = steps
            .into_iter()
            .filter_map(|(step, result)| result.err().map(|err| (step, err)))
            .inspect(|(step, err)| warn!(step = %step, error = %err, "rollback step failed"))
            .collect();

        if failures.is_empty() {
            info!(hash = %header.hash_hex(), shard = header.shard_id, "block reverted");
            Ok(())
        } else {
            Err(RollbackError { failures })
        }
    }

    /// Removes the account balances written by the block with this
    /// timestamp on this shard.
    pub fn remove_accounts_dcdt(&self, timestamp: u64, shard_id: u32) -> Result<u64, StoreError> {
        let removed = self
            .store
            .delete_by_query(ACCOUNTS_DCDT, &Query::written_by_block(timestamp, shard_id))?;
        info!(timestamp, shard_id, removed, "account balances removed");
        Ok(removed)
    }

    fn remove_block(&self, header: &Header) -> Result<(), StoreError> {
        self.store
            .bulk_upsert(BLOCKS, &[WriteItem::new(header.hash_hex(), WriteAction::Delete)])
    }

    fn revert_mini_blocks(&self, header: &Header, body: &Body) -> Result<(), StoreError> {
        let items = mini_block_reverts(header, body);
        if items.is_empty() {
            return Ok(());
        }
        self.store.bulk_upsert(MINIBLOCKS, &items)
    }

    /// Every index is attempted; the first failure is returned.
    ///
    /// SCRs of the body are unwound from their parent transactions first,
    /// while their documents still name the parent.
    fn remove_transactions(&self, body: &Body) -> Result<(), StoreError> {
        let hashes = body.tx_hashes_hex();
        if hashes.is_empty() {
            return Ok(());
        }

        let mut first_error = self.unwind_results(&hashes).err();
        let deletes: Vec<WriteItem> = hashes
            .iter()
            .map(|hash| WriteItem::new(hash.as_str(), WriteAction::Delete))
            .collect();
        for index in [TRANSACTIONS, SCRESULTS, OPERATIONS] {
            if let Err(err) = self.store.bulk_upsert(index, &deletes) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Withdraws what the SCRs in `hashes` contributed to transactions
    /// stored outside this block: their refunds, and `hasScResults` when no
    /// other SCR of the transaction remains.
    fn unwind_results(&self, hashes: &[String]) -> Result<(), StoreError> {
        let reverted: BTreeSet<&str> = hashes.iter().map(String::as_str).collect();
        let results = self.store.multi_get(SCRESULTS, hashes)?;

        let mut by_parent: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (hash, doc) in hashes.iter().zip(results) {
            let parent = doc
                .as_ref()
                .and_then(|doc| doc.get(ORIGINAL_TX_HASH))
                .and_then(Value::as_str)
                .filter(|parent| !reverted.contains(parent));
            if let Some(parent) = parent {
                by_parent
                    .entry(parent.to_string())
                    .or_default()
                    .push(hash.clone());
            }
        }
        if by_parent.is_empty() {
            return Ok(());
        }

        let mut unwinds = BTreeMap::new();
        for (parent, scrs) in by_parent {
            let mut mutations: Vec<Mutation> = scrs
                .into_iter()
                .map(|refund_id| {
                    Mutation::Fee(FeeWrite::RevertRefund {
                        refund_id,
                        denomination: self.denomination,
                    })
                })
                .collect();
            if !self.has_other_results(&parent, &reverted)? {
                mutations.push(Mutation::Unset {
                    field: HAS_SC_RESULTS.to_string(),
                });
            }
            unwinds.insert(parent, mutations);
        }

        let mut first_error = None;
        for index in [TRANSACTIONS, OPERATIONS] {
            if let Err(err) = self.unwind_parents(index, &unwinds) {
                first_error.get_or_insert(err);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn has_other_results(&self, parent: &str, reverted: &BTreeSet<&str>) -> Result<bool, StoreError> {
        let mut found = false;
        self.store.scroll_query(
            SCRESULTS,
            &Query::term(ORIGINAL_TX_HASH, parent),
            &mut |page: &[Document]| {
                found |= page.iter().any(|doc| !reverted.contains(doc.id.as_str()));
                Ok(())
            },
        )?;
        Ok(found)
    }

    /// A stored transaction keeps its document. A placeholder left by
    /// SCR-only passes is deleted once nothing but markers remains in it.
    fn unwind_parents(
        &self,
        index: &str,
        unwinds: &BTreeMap<String, Vec<Mutation>>,
    ) -> Result<(), StoreError> {
        let ids: Vec<String> = unwinds.keys().cloned().collect();
        let stored = self.store.multi_get(index, &ids)?;

        let items: Vec<WriteItem> = unwinds
            .iter()
            .zip(stored)
            .filter_map(|((id, mutations), doc)| {
                let doc = doc?;
                if doc.get(FEE_FIELD).is_some() {
                    return Some(WriteItem::new(id.as_str(), WriteAction::Update(mutations.clone())));
                }
                let rest = apply_action(Some(doc), &WriteAction::Update(mutations.clone()))?;
                let action = if is_bare_placeholder(&rest) {
                    debug!(index, tx = %id, "placeholder removed");
                    WriteAction::Delete
                } else {
                    WriteAction::Overwrite(rest)
                };
                Some(WriteItem::new(id.as_str(), action))
            })
            .collect();
        if items.is_empty() {
            return Ok(());
        }
        self.store.bulk_upsert(index, &items)
    }
}

fn is_bare_placeholder(doc: &Value) -> bool {
    doc.as_object().is_some_and(|fields| {
        fields
            .keys()
            .all(|key| PLACEHOLDER_FIELDS.contains(&key.as_str()))
    })
}
