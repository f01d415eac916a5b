//! Nullable infrastructure for deterministic testing.
//!
//! External dependencies of the indexer (the document store) are abstracted
//! behind traits. This crate provides test-friendly implementations that:
//! - Execute the persistence merge contract in memory
//! - Can be made to fail programmatically
//! - Never touch the network
//!
//! Usage: hand a [`NullDocumentStore`] to the indexer in place of a real client.

pub mod store;

pub use store::NullDocumentStore;
