//! Shared utilities for the shard event indexer.

pub mod logging;
pub mod stats;

pub use logging::{init_logging, LogFormat};
pub use stats::{CounterKind, Counters};
