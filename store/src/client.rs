//! Document store client interface.

use serde_json::Value;

use crate::error::StoreError;
use crate::query::Query;
use crate::write::WriteItem;

/// A stored document and its id.
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    pub id: String,
    pub source: Value,
}

/// Synchronous client of a document store.
///
/// Every call is an atomic step from the caller's point of view. Retries,
/// if any, happen inside the implementation. `bulk_upsert` must execute
/// each item with the semantics of [`crate::write::apply_action`], and must
/// serialize concurrent writes to the same document.
pub trait DocumentStore: Send + Sync {
    /// One entry per requested id, `None` where the document is absent.
    fn multi_get(&self, index: &str, ids: &[String]) -> Result<Vec<Option<Value>>, StoreError>;

    fn bulk_upsert(&self, index: &str, items: &[WriteItem]) -> Result<(), StoreError>;

    /// Feeds matching documents to `handler` page by page.
    fn scroll_query(
        &self,
        index: &str,
        query: &Query,
        handler: &mut dyn FnMut(&[Document]) -> Result<(), StoreError>,
    ) -> Result<(), StoreError>;

    /// Returns the number of deleted documents.
    fn delete_by_query(&self, index: &str, query: &Query) -> Result<u64, StoreError>;
}
