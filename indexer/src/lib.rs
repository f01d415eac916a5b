//! Block indexer for the shard event index.
//!
//! [`BlockIndexer::save_block`] runs one decoded block through the event
//! classifiers and the transaction correlator, turns the result into one
//! write per touched document, and flushes the writes to the
//! [`shardex_store::DocumentStore`]. [`BlockIndexer::revert_block`] undoes
//! a block.

pub mod accounts;
pub mod blocks;
pub mod config;
pub mod error;
pub mod flush;
pub mod indexer;
pub mod rollback;
pub mod tokens;

pub use config::{IndexerConfig, METACHAIN_SHARD_ID};
pub use error::{IndexerError, RollbackError, RollbackStep};
pub use flush::{FlushReport, WriteBatch};
pub use indexer::{BlockIndexer, BlockIndexerBuilder, IndexerStat};
pub use rollback::RollbackEngine;
