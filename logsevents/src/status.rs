//! Per-block status records, one per transaction hash.

use std::collections::BTreeMap;

use shardex_types::StatusInfo;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct TxHashStatusInfo {
    records: BTreeMap<String, StatusInfo>,
}

impl TxHashStatusInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latch `info` into the record of `hash`, creating it on first use.
    pub fn add_record(&mut self, hash: &str, info: &StatusInfo) {
        self.records.entry(hash.to_string()).or_default().latch(info);
    }

    pub fn get(&self, hash: &str) -> Option<&StatusInfo> {
        self.records.get(hash)
    }

    /// Records in hash order.
    pub fn all_records(&self) -> &BTreeMap<String, StatusInfo> {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_latch_per_hash() {
        let mut statuses = TxHashStatusInfo::new();
        statuses.add_record("txHash", &StatusInfo::new(true, false, "success"));
        statuses.add_record("txHash", &StatusInfo::new(false, true, "fail"));
        statuses.add_record("txHash", &StatusInfo::new(false, false, "success"));
        statuses.add_record("other", &StatusInfo::completed());

        assert_eq!(statuses.get("txHash"), Some(&StatusInfo::new(true, true, "fail")));
        assert_eq!(statuses.get("other"), Some(&StatusInfo::completed()));
        assert_eq!(
            statuses.all_records().keys().collect::<Vec<_>>(),
            vec!["other", "txHash"]
        );
    }
}
