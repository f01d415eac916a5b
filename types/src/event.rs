//! Raw on-chain log events.

use serde::{Deserialize, Serialize};

/// One event emitted during execution. Topic order and count are
/// significant per identifier.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub address: Vec<u8>,
    pub identifier: String,
    pub topics: Vec<Vec<u8>>,
    pub data: Vec<u8>,
}

impl EventRecord {
    pub fn new(address: impl Into<Vec<u8>>, identifier: &str, topics: Vec<Vec<u8>>) -> Self {
        Self {
            address: address.into(),
            identifier: identifier.to_string(),
            topics,
            data: Vec::new(),
        }
    }

    /// Topic at `index`, or `None` when the event is too short.
    pub fn topic(&self, index: usize) -> Option<&[u8]> {
        self.topics.get(index).map(Vec::as_slice)
    }
}

/// The events produced by a single transaction or smart contract result.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogData {
    /// Hex encoded hash of the transaction (or SCR) that emitted the log.
    pub tx_hash: String,
    /// Address of the account that executed.
    pub address: Vec<u8>,
    pub events: Vec<EventRecord>,
}
