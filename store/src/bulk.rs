//! Size-bounded batching of write items.

use crate::error::StoreError;
use crate::write::WriteItem;

/// Write items for one index, split into chunks whose serialized size stays
/// under `max_size` bytes. An item larger than `max_size` gets a chunk of
/// its own.
#[derive(Debug)]
pub struct BulkBuffer {
    max_size: usize,
    chunks: Vec<Vec<WriteItem>>,
    current_size: usize,
}

impl BulkBuffer {
    pub fn new(max_size: usize) -> Self {
        Self {
            max_size,
            chunks: Vec::new(),
            current_size: 0,
        }
    }

    /// Appends `item`, opening a new chunk when the current one is full.
    pub fn push(&mut self, item: WriteItem) -> Result<(), StoreError> {
        let size = serde_json::to_vec(&item)?.len();
        let fits = self.current_size + size <= self.max_size;
        match self.chunks.last_mut() {
            Some(chunk) if fits => {
                chunk.push(item);
                self.current_size += size;
            }
            _ => {
                self.chunks.push(vec![item]);
                self.current_size = size;
            }
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Number of buffered items across all chunks.
    pub fn len(&self) -> usize {
        self.chunks.iter().map(Vec::len).sum()
    }

    pub fn chunks(&self) -> &[Vec<WriteItem>] {
        &self.chunks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::write::{Mutation, WriteAction};
    use serde_json::json;

    fn item(id: &str, payload: &str) -> WriteItem {
        WriteItem::new(
            id,
            WriteAction::Upsert(vec![Mutation::Merge(json!({ "payload": payload }))]),
        )
    }

    #[test]
    fn splits_into_bounded_chunks() {
        let one = serde_json::to_vec(&item("a", "xxxx")).expect("size").len();
        let mut buffer = BulkBuffer::new(one * 2);
        for id in ["a", "b", "c", "d", "e"] {
            buffer.push(item(id, "xxxx")).expect("push");
        }
        let sizes: Vec<usize> = buffer.chunks().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
        assert_eq!(buffer.len(), 5);
    }

    #[test]
    fn oversized_item_gets_its_own_chunk() {
        let mut buffer = BulkBuffer::new(64);
        buffer.push(item("a", "x")).expect("push");
        buffer.push(item("big", &"y".repeat(500))).expect("push");
        buffer.push(item("c", "z")).expect("push");
        let sizes: Vec<usize> = buffer.chunks().iter().map(Vec::len).collect();
        assert_eq!(sizes, vec![1, 1, 1]);
    }

    #[test]
    fn empty_buffer() {
        let buffer = BulkBuffer::new(10);
        assert!(buffer.is_empty());
        assert_eq!(buffer.len(), 0);
    }
}
