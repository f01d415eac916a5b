use proptest::prelude::*;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

use shardex_logsevents::writes::token_write;
use shardex_logsevents::DispatchRegistry;
use shardex_store::apply_action;
use shardex_types::{EventRecord, HexAddressCodec, JsonMetadataCodec, LogData, TransactionPool};

const ROLE: &str = "DCDTRoleNFTBurn";
const TOKEN: &str = "NFT-abcd";

fn registry() -> DispatchRegistry {
    DispatchRegistry::new(Arc::new(HexAddressCodec::new()), Arc::new(JsonMetadataCodec), 18, 0)
}

fn pool(logs: Vec<LogData>) -> TransactionPool {
    TransactionPool {
        logs,
        ..Default::default()
    }
}

fn role_event(account: u8, set: bool) -> EventRecord {
    let identifier = if set { "DCDTSetRole" } else { "DCDTUnSetRole" };
    EventRecord::new(
        vec![account; 4],
        identifier,
        vec![TOKEN.as_bytes().to_vec(), vec![], vec![], ROLE.as_bytes().to_vec()],
    )
}

proptest! {
    /// The stored role list holds exactly the accounts whose last event in
    /// the block granted the role.
    #[test]
    fn last_role_event_per_account_wins(ops in prop::collection::vec((0u8..4, any::<bool>()), 1..20)) {
        let events = ops.iter().map(|(account, set)| role_event(*account, *set)).collect();
        let acc = registry().process_logs(
            &pool(vec![LogData { tx_hash: "aa".into(), address: vec![1; 4], events }]),
            1000,
        );

        let item = token_write(TOKEN, &acc.tokens[TOKEN]).expect("serialize").expect("write");
        let doc = apply_action(None, &item.action).expect("upserted");

        let mut last = BTreeMap::new();
        for (account, set) in &ops {
            last.insert(hex::encode([*account; 4]), *set);
        }
        let mut expected: Vec<Value> = last
            .into_iter()
            .filter(|(_, set)| *set)
            .map(|(address, _)| Value::String(address))
            .collect();
        let mut stored = doc["roles"][ROLE].as_array().cloned().unwrap_or_default();
        expected.sort_by_key(|v| v.to_string());
        stored.sort_by_key(|v| v.to_string());
        prop_assert_eq!(stored, expected);
    }

    /// One error signal among the logs of a block decides the status,
    /// wherever it appears.
    #[test]
    fn error_signal_is_sticky_within_a_block(completions in 0usize..6, error_at in 0usize..6) {
        let mut events: Vec<EventRecord> = (0..completions)
            .map(|_| EventRecord::new(vec![1; 4], "completedTxEvent", vec![]))
            .collect();
        events.insert(error_at.min(events.len()), EventRecord::new(vec![1; 4], "signalError", vec![]));

        let logs = events
            .into_iter()
            .map(|event| LogData { tx_hash: "aa".into(), address: vec![1; 4], events: vec![event] })
            .collect();
        let acc = registry().process_logs(&pool(logs), 1000);

        let status = acc.statuses.get("aa").expect("status");
        prop_assert!(status.error_event);
        prop_assert_eq!(status.completed_event, completions > 0);
        prop_assert_eq!(status.status.as_str(), "fail");
    }
}
