//! Abstract document store for the shard event indexer.
//!
//! The indexer only ever talks to [`DocumentStore`]; concrete clients (the
//! search cluster client, the in-memory nullable) implement it. The
//! [`write`] module defines how every write item is merged into the stored
//! document, independent of any backend.

pub mod bulk;
pub mod client;
pub mod error;
pub mod indices;
pub mod query;
pub mod write;

pub use bulk::BulkBuffer;
pub use client::{Document, DocumentStore};
pub use error::StoreError;
pub use query::Query;
pub use write::{apply_action, FeeWrite, Mutation, Refund, WriteAction, WriteItem};
