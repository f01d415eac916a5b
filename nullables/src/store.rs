//! Nullable document store: thread-safe in-memory storage for testing.

use serde_json::Value;
use shardex_store::write::apply_action;
use shardex_store::{Document, DocumentStore, Query, StoreError, WriteItem};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Mutex;

type Index = BTreeMap<String, Value>;

/// An in-memory document store applying write items exactly as the merge
/// contract defines them. Documents iterate in id order.
pub struct NullDocumentStore {
    indices: Mutex<BTreeMap<String, Index>>,
    failing: Mutex<BTreeSet<String>>,
    bulk_calls: Mutex<Vec<(String, usize)>>,
    page_size: usize,
}

impl NullDocumentStore {
    pub fn new() -> Self {
        Self {
            indices: Mutex::new(BTreeMap::new()),
            failing: Mutex::new(BTreeSet::new()),
            bulk_calls: Mutex::new(Vec::new()),
            page_size: 100,
        }
    }

    pub fn with_page_size(page_size: usize) -> Self {
        Self {
            page_size: page_size.max(1),
            ..Self::new()
        }
    }

    /// Every subsequent call touching `index` fails with a backend error.
    pub fn fail_index(&self, index: &str) {
        self.failing.lock().unwrap().insert(index.to_string());
    }

    pub fn heal_index(&self, index: &str) {
        self.failing.lock().unwrap().remove(index);
    }

    /// Seed a document directly, bypassing the write path.
    pub fn put(&self, index: &str, id: &str, doc: Value) {
        self.indices
            .lock()
            .unwrap()
            .entry(index.to_string())
            .or_default()
            .insert(id.to_string(), doc);
    }

    pub fn get(&self, index: &str, id: &str) -> Option<Value> {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .and_then(|docs| docs.get(id))
            .cloned()
    }

    /// All documents of `index`, in id order.
    pub fn documents(&self, index: &str) -> Vec<Document> {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .map(|docs| {
                docs.iter()
                    .map(|(id, source)| Document {
                        id: id.clone(),
                        source: source.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn count(&self, index: &str) -> usize {
        self.indices
            .lock()
            .unwrap()
            .get(index)
            .map_or(0, BTreeMap::len)
    }

    /// `(index, items)` for every bulk request received.
    pub fn bulk_calls(&self) -> Vec<(String, usize)> {
        self.bulk_calls.lock().unwrap().clone()
    }

    fn check(&self, index: &str) -> Result<(), StoreError> {
        if self.failing.lock().unwrap().contains(index) {
            return Err(StoreError::Backend(format!("index {} unavailable", index)));
        }
        Ok(())
    }
}

impl Default for NullDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentStore for NullDocumentStore {
    fn multi_get(&self, index: &str, ids: &[String]) -> Result<Vec<Option<Value>>, StoreError> {
        self.check(index)?;
        let indices = self.indices.lock().unwrap();
        let docs = indices.get(index);
        Ok(ids
            .iter()
            .map(|id| docs.and_then(|d| d.get(id)).cloned())
            .collect())
    }

    fn bulk_upsert(&self, index: &str, items: &[WriteItem]) -> Result<(), StoreError> {
        self.check(index)?;
        self.bulk_calls
            .lock()
            .unwrap()
            .push((index.to_string(), items.len()));

        let mut indices = self.indices.lock().unwrap();
        let docs = indices.entry(index.to_string()).or_default();
        for item in items {
            let existing = docs.remove(&item.id);
            if let Some(doc) = apply_action(existing, &item.action) {
                docs.insert(item.id.clone(), doc);
            }
        }
        Ok(())
    }

    fn scroll_query(
        &self,
        index: &str,
        query: &Query,
        handler: &mut dyn FnMut(&[Document]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError> {
        self.check(index)?;
        let matching: Vec<Document> = self
            .documents(index)
            .into_iter()
            .filter(|doc| query.matches(&doc.source))
            .collect();
        for page in matching.chunks(self.page_size) {
            handler(page)?;
        }
        Ok(())
    }

    fn delete_by_query(&self, index: &str, query: &Query) -> Result<u64, StoreError> {
        self.check(index)?;
        let mut indices = self.indices.lock().unwrap();
        let Some(docs) = indices.get_mut(index) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !query.matches(doc));
        Ok((before - docs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shardex_store::{Mutation, WriteAction};

    #[test]
    fn bulk_applies_merge_contract() {
        let store = NullDocumentStore::new();
        store.put("tokens", "T-1", json!({"name": "n"}));
        store
            .bulk_upsert(
                "tokens",
                &[
                    WriteItem::new("T-1", WriteAction::Upsert(vec![Mutation::Merge(json!({"type": "t"}))])),
                    WriteItem::new("T-2", WriteAction::Update(vec![Mutation::Merge(json!({"x": 1}))])),
                    WriteItem::new("T-3", WriteAction::Overwrite(json!({"y": 2}))),
                ],
            )
            .expect("bulk");

        assert_eq!(store.get("tokens", "T-1"), Some(json!({"name": "n", "type": "t"})));
        assert_eq!(store.get("tokens", "T-2"), None);
        assert_eq!(store.count("tokens"), 2);
        assert_eq!(store.bulk_calls(), vec![("tokens".to_string(), 3)]);
    }

    #[test]
    fn multi_get_keeps_request_order() {
        let store = NullDocumentStore::new();
        store.put("i", "b", json!(2));
        let docs = store
            .multi_get("i", &["a".to_string(), "b".to_string()])
            .expect("multi get");
        assert_eq!(docs, vec![None, Some(json!(2))]);
    }

    #[test]
    fn scroll_pages_and_delete_by_query() {
        let store = NullDocumentStore::with_page_size(2);
        for (id, ts) in [("a", 1), ("b", 2), ("c", 2), ("d", 2)] {
            store.put("accountsdcdt", id, json!({"timestamp": ts, "shardID": 0}));
        }

        let mut pages = Vec::new();
        store
            .scroll_query("accountsdcdt", &Query::term("timestamp", 2), &mut |page| {
                pages.push(page.len());
                Ok(())
            })
            .expect("scroll");
        assert_eq!(pages, vec![2, 1]);

        let deleted = store
            .delete_by_query("accountsdcdt", &Query::written_by_block(2, 0))
            .expect("delete");
        assert_eq!(deleted, 3);
        assert_eq!(store.count("accountsdcdt"), 1);
    }

    #[test]
    fn failing_index_returns_backend_error() {
        let store = NullDocumentStore::new();
        store.fail_index("blocks");
        let err = store.bulk_upsert("blocks", &[]).unwrap_err();
        assert!(matches!(err, StoreError::Backend(_)));
        assert!(store.multi_get("tokens", &[]).is_ok());

        store.heal_index("blocks");
        assert!(store.bulk_upsert("blocks", &[]).is_ok());
    }
}
