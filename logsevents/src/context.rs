use shardex_types::convert::BalanceConverter;

/// What a classifier may know about the event beyond its own bytes.
#[derive(Clone, Copy, Debug)]
pub struct EventContext<'a> {
    /// Hex hash of the transaction or SCR whose log holds the event.
    pub tx_hash: &'a str,
    /// Hex hash of the transaction the log ultimately belongs to. Equal to
    /// `tx_hash` unless the log was emitted by an SCR of the same pool.
    pub original_tx_hash: &'a str,
    /// Address of the account whose execution emitted the log.
    pub log_address: &'a [u8],
    pub timestamp: u64,
    pub self_shard_id: u32,
    pub balance_converter: BalanceConverter,
}

#[cfg(test)]
pub(crate) fn test_context() -> EventContext<'static> {
    EventContext {
        tx_hash: "01020304",
        original_tx_hash: "01020304",
        log_address: b"contract",
        timestamp: 1000,
        self_shard_id: 0,
        balance_converter: BalanceConverter::new(10),
    }
}
