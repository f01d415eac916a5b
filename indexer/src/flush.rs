//! One write per document per block, flushed index by index.

use std::collections::BTreeMap;

use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{debug, error, warn};

use shardex_store::{BulkBuffer, DocumentStore, StoreError, WriteAction, WriteItem};
use shardex_transactions::SkippedRecord;

/// Pending writes of one block, combined per document.
#[derive(Debug, Default)]
pub struct WriteBatch {
    indices: BTreeMap<&'static str, BTreeMap<String, WriteAction>>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue `item`; a second write to the same document is folded into the
    /// first so that each document gets a single write.
    pub fn push(&mut self, index: &'static str, item: WriteItem) {
        let docs = self.indices.entry(index).or_default();
        let action = match docs.remove(&item.id) {
            Some(previous) => previous.combine(item.action),
            None => item.action,
        };
        docs.insert(item.id, action);
    }

    pub fn extend(&mut self, index: &'static str, items: impl IntoIterator<Item = WriteItem>) {
        for item in items {
            self.push(index, item);
        }
    }

    pub fn len(&self) -> usize {
        self.indices.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: &str, id: &str) -> Option<&WriteAction> {
        self.indices.get(index).and_then(|docs| docs.get(id))
    }
}

/// Outcome of one block flush.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FlushReport {
    /// Documents written per index.
    pub written: BTreeMap<String, usize>,
    /// Records left out because they could not be serialized.
    pub skipped: Vec<SkippedRecord>,
}

impl FlushReport {
    pub fn written_to(&self, index: &str) -> usize {
        self.written.get(index).copied().unwrap_or(0)
    }

    pub fn total_written(&self) -> usize {
        self.written.values().sum()
    }
}

struct IndexOutcome {
    index: &'static str,
    written: usize,
    skipped: Vec<SkippedRecord>,
}

/// Sends every index of the batch, one task per index on `pool`. Chunks of
/// one index go out in order. The first store failure is returned after
/// every index has been attempted.
pub fn flush_batch(
    store: &dyn DocumentStore,
    pool: &ThreadPool,
    batch: WriteBatch,
    bulk_request_max_size: usize,
) -> Result<FlushReport, StoreError> {
    let results: Vec<Result<IndexOutcome, StoreError>> = pool.install(|| {
        batch
            .indices
            .into_par_iter()
            .map(|(index, docs)| flush_index(store, index, docs, bulk_request_max_size))
            .collect()
    });

    let mut report = FlushReport::default();
    let mut first_error = None;
    for result in results {
        match result {
            Ok(outcome) => {
                report.written.insert(outcome.index.to_string(), outcome.written);
                report.skipped.extend(outcome.skipped);
            }
            Err(err) => {
                error!(error = %err, "flush failed");
                first_error.get_or_insert(err);
            }
        }
    }

    match first_error {
        Some(err) => Err(err),
        None => Ok(report),
    }
}

fn flush_index(
    store: &dyn DocumentStore,
    index: &'static str,
    docs: BTreeMap<String, WriteAction>,
    max_size: usize,
) -> Result<IndexOutcome, StoreError> {
    let mut buffer = BulkBuffer::new(max_size);
    let mut skipped = Vec::new();
    for (id, action) in docs {
        let item = WriteItem::new(id, action);
        let id = item.id.clone();
        if let Err(err) = buffer.push(item) {
            warn!(index, id = %id, error = %err, "skipping write that cannot be serialized");
            skipped.push(SkippedRecord {
                id,
                reason: err.to_string(),
            });
        }
    }

    for chunk in buffer.chunks() {
        debug!(index, items = chunk.len(), "bulk request");
        store.bulk_upsert(index, chunk)?;
    }

    Ok(IndexOutcome {
        index,
        written: buffer.len(),
        skipped,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shardex_store::Mutation;

    fn merge(id: &str, field: &str) -> WriteItem {
        let mut patch = json!({});
        patch[field] = json!(1);
        WriteItem::new(id, WriteAction::Upsert(vec![Mutation::Merge(patch)]))
    }

    #[test]
    fn writes_to_the_same_document_are_combined() {
        let mut batch = WriteBatch::new();
        batch.push("tokens", merge("a", "x"));
        batch.push("tokens", merge("a", "y"));
        batch.push("tokens", merge("b", "x"));
        batch.push("blocks", merge("a", "x"));

        assert_eq!(batch.len(), 3);
        match batch.get("tokens", "a") {
            Some(WriteAction::Upsert(mutations)) => assert_eq!(mutations.len(), 2),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn delete_after_upsert_wins() {
        let mut batch = WriteBatch::new();
        batch.push("tokens", merge("a", "x"));
        batch.push("tokens", WriteItem::new("a", WriteAction::Delete));
        assert_eq!(batch.get("tokens", "a"), Some(&WriteAction::Delete));
    }
}
