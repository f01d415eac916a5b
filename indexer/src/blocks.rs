//! Block and miniblock documents.

use serde_json::json;

use shardex_store::{Mutation, WriteAction, WriteItem};
use shardex_types::{Body, Header, MiniBlock};

pub const SENDER_BLOCK_HASH: &str = "senderBlockHash";
pub const RECEIVER_BLOCK_HASH: &str = "receiverBlockHash";

pub fn block_write(header: &Header, body: &Body) -> WriteItem {
    let mini_blocks: Vec<String> = body.mini_blocks.iter().map(MiniBlock::hash_hex).collect();
    let tx_count: usize = body.mini_blocks.iter().map(|mb| mb.tx_hashes.len()).sum();
    let doc = json!({
        "nonce": header.nonce,
        "round": header.round,
        "epoch": header.epoch,
        "shardId": header.shard_id,
        "timestamp": header.timestamp,
        "prevHash": hex::encode(&header.prev_hash),
        "miniBlocksHashes": mini_blocks,
        "txCount": tx_count,
    });
    WriteItem::new(header.hash_hex(), WriteAction::Overwrite(doc))
}

/// A miniblock is written by both its sender and its receiver shard, each
/// contributing its own block hash.
pub fn mini_block_writes(header: &Header, body: &Body) -> Vec<WriteItem> {
    let block_hash = header.hash_hex();
    body.mini_blocks
        .iter()
        .filter(|mb| mb.sender_shard_id == header.shard_id || mb.receiver_shard_id == header.shard_id)
        .map(|mb| {
            let mut fields = json!({
                "senderShard": mb.sender_shard_id,
                "receiverShard": mb.receiver_shard_id,
                "type": mb.mb_type.as_str(),
            });
            if mb.sender_shard_id == header.shard_id {
                fields[SENDER_BLOCK_HASH] = json!(block_hash);
                fields["timestamp"] = json!(header.timestamp);
            }
            if mb.receiver_shard_id == header.shard_id {
                fields[RECEIVER_BLOCK_HASH] = json!(block_hash);
            }
            WriteItem::new(mb.hash_hex(), WriteAction::Upsert(vec![Mutation::Merge(fields)]))
        })
        .collect()
}

/// Undo of [`mini_block_writes`]: the sender's document goes away, the
/// receiver only withdraws its block hash.
pub fn mini_block_reverts(header: &Header, body: &Body) -> Vec<WriteItem> {
    body.mini_blocks
        .iter()
        .filter_map(|mb| {
            if mb.sender_shard_id == header.shard_id {
                Some(WriteItem::new(mb.hash_hex(), WriteAction::Delete))
            } else if mb.receiver_shard_id == header.shard_id {
                Some(WriteItem::new(
                    mb.hash_hex(),
                    WriteAction::Update(vec![Mutation::Unset {
                        field: RECEIVER_BLOCK_HASH.to_string(),
                    }]),
                ))
            } else {
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shardex_store::apply_action;
    use shardex_types::MiniBlockType;

    fn header(shard_id: u32, hash: u8) -> Header {
        Header {
            hash: vec![hash],
            shard_id,
            timestamp: 10,
            ..Default::default()
        }
    }

    fn cross_shard_body() -> Body {
        Body {
            mini_blocks: vec![MiniBlock {
                hash: vec![0xab],
                sender_shard_id: 0,
                receiver_shard_id: 1,
                mb_type: MiniBlockType::TxBlock,
                tx_hashes: vec![vec![1], vec![2]],
            }],
        }
    }

    #[test]
    fn both_shards_contribute_to_the_miniblock() {
        let body = cross_shard_body();
        let sender = mini_block_writes(&header(0, 1), &body);
        let receiver = mini_block_writes(&header(1, 2), &body);

        let doc = apply_action(None, &sender[0].action);
        let doc = apply_action(doc, &receiver[0].action).unwrap();
        assert_eq!(doc[SENDER_BLOCK_HASH], "01");
        assert_eq!(doc[RECEIVER_BLOCK_HASH], "02");
        assert_eq!(doc["type"], "TxBlock");
    }

    #[test]
    fn receiver_revert_keeps_the_sender_part() {
        let body = cross_shard_body();
        let sender = mini_block_writes(&header(0, 1), &body);
        let receiver = mini_block_writes(&header(1, 2), &body);
        let sent = apply_action(None, &sender[0].action);
        let both = apply_action(sent.clone(), &receiver[0].action);

        let reverted = mini_block_reverts(&header(1, 2), &body);
        assert_eq!(apply_action(both, &reverted[0].action), sent);

        let reverted = mini_block_reverts(&header(0, 1), &body);
        assert_eq!(reverted[0].action, WriteAction::Delete);
    }

    #[test]
    fn block_document_counts_transactions() {
        let item = block_write(&header(0, 7), &cross_shard_body());
        assert_eq!(item.id, "07");
        match item.action {
            WriteAction::Overwrite(doc) => {
                assert_eq!(doc["txCount"], 2);
                assert_eq!(doc["miniBlocksHashes"][0], "ab");
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
