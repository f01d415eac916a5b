//! Writes of the transactions, SC results and operations collections.

use serde_json::json;
use tracing::{debug, warn};

use shardex_store::{FeeWrite, Mutation, WriteAction, WriteItem};

use crate::correlator::{CorrelatedBlock, CorrelatedTx, ForeignTxUpdate, PassStatus, STATUS_PENDING};

pub const OPERATION_TYPE_NORMAL: &str = "normal";
pub const OPERATION_TYPE_UNSIGNED: &str = "unsigned";

/// A record left out of the flush because it could not be serialized.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedRecord {
    pub id: String,
    pub reason: String,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecordWrites {
    pub transactions: Vec<WriteItem>,
    pub scresults: Vec<WriteItem>,
    pub operations: Vec<WriteItem>,
    pub skipped: Vec<SkippedRecord>,
}

impl RecordWrites {
    fn skip(&mut self, id: &str, err: serde_json::Error) {
        warn!(id, error = %err, "skipping record that cannot be serialized");
        self.skipped.push(SkippedRecord {
            id: id.to_string(),
            reason: err.to_string(),
        });
    }
}

pub fn build_writes(block: &CorrelatedBlock) -> RecordWrites {
    let mut writes = RecordWrites::default();

    for tx in &block.transactions {
        match tx_mutations(tx) {
            Ok(mutations) => push_with_operation(&mut writes, &tx.record.hash, mutations),
            Err(err) => writes.skip(&tx.record.hash, err),
        }
    }

    for (hash, update) in &block.foreign {
        let mutations = foreign_mutations(hash, update, block.denomination);
        push_with_operation(&mut writes, hash, mutations);
    }

    for scr in &block.scresults {
        match serde_json::to_value(scr) {
            Ok(doc) => {
                let mut operation = doc.clone();
                operation["type"] = json!(OPERATION_TYPE_UNSIGNED);
                writes.scresults.push(WriteItem::new(&scr.hash, WriteAction::Overwrite(doc)));
                writes
                    .operations
                    .push(WriteItem::new(&scr.hash, WriteAction::Overwrite(operation)));
            }
            Err(err) => writes.skip(&scr.hash, err),
        }
    }

    writes
}

fn push_with_operation(writes: &mut RecordWrites, hash: &str, mutations: Vec<Mutation>) {
    let mut operation = mutations.clone();
    operation.push(Mutation::Merge(json!({ "type": OPERATION_TYPE_NORMAL })));
    writes.transactions.push(WriteItem::new(hash, WriteAction::Upsert(mutations)));
    writes.operations.push(WriteItem::new(hash, WriteAction::Upsert(operation)));
}

/// Record fields, then fee, then the pass status and the log signals.
///
/// The source-shard copy of a cross-shard transaction only fills fields
/// that are still missing; the executing pass owns the record.
fn tx_mutations(tx: &CorrelatedTx) -> Result<Vec<Mutation>, serde_json::Error> {
    let record = serde_json::to_value(&tx.record)?;
    let mut mutations = Vec::with_capacity(4);
    match tx.status.signal() {
        Some(signal) => {
            mutations.push(Mutation::Merge(record));
            mutations.push(Mutation::Fee(tx.fee.clone()));
            mutations.push(Mutation::LatchStatus(signal));
        }
        None => {
            debug_assert_eq!(tx.status, PassStatus::Pending);
            mutations.push(Mutation::MergeIfAbsent(record));
            mutations.push(Mutation::Fee(tx.fee.clone()));
            mutations.push(Mutation::MergeIfAbsent(json!({ "status": STATUS_PENDING })));
        }
    }
    if let Some(signal) = &tx.signal {
        mutations.push(Mutation::LatchStatus(signal.clone()));
    }
    Ok(mutations)
}

fn foreign_mutations(hash: &str, update: &ForeignTxUpdate, denomination: u32) -> Vec<Mutation> {
    let mut mutations = Vec::new();
    if update.has_sc_results {
        mutations.push(Mutation::Merge(json!({ "hasScResults": true })));
    }
    for (refund_id, refund) in &update.refunds {
        debug!(tx = hash, scr = %refund_id, "relative fee adjustment");
        mutations.push(Mutation::Fee(FeeWrite::RelativeAdjust {
            refund_id: refund_id.clone(),
            refund: *refund,
            denomination,
        }));
    }
    if let Some(signal) = &update.signal {
        mutations.push(Mutation::LatchStatus(signal.clone()));
    }
    mutations
}
