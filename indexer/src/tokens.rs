//! Token and NFT writes, including the lookups that need the store.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use tracing::{debug, warn};

use shardex_logsevents::accumulators::BlockAccumulators;
use shardex_logsevents::writes::{nft_write, token_write, CollectionFields};
use shardex_store::indices::TOKENS;
use shardex_store::{DocumentStore, Mutation, Query, StoreError, WriteAction, WriteItem};
use shardex_transactions::SkippedRecord;

use crate::flush::WriteBatch;

/// Queues the writes of every token and NFT touched by the block.
pub fn queue_token_writes(
    store: &dyn DocumentStore,
    acc: &BlockAccumulators,
    batch: &mut WriteBatch,
    skipped: &mut Vec<SkippedRecord>,
) -> Result<(), StoreError> {
    for (token, token_acc) in &acc.tokens {
        match token_write(token, token_acc) {
            Ok(Some(item)) => batch.push(TOKENS, item),
            Ok(None) => {}
            Err(err) => skip(skipped, token, err),
        }
    }

    let collections = collection_fields(store, acc)?;
    for (identifier, nft) in &acc.nfts {
        let collection = nft
            .created
            .as_ref()
            .map(|c| c.token.as_str())
            .or_else(|| nft.supply.first().map(|s| s.token.as_str()))
            .and_then(|token| collections.get(token));
        if !nft.supply.is_empty() && collection.is_none() {
            debug!(identifier = %identifier, "supply change for unknown collection");
        }
        match nft_write(identifier, nft, collection) {
            Ok(Some(item)) => batch.push(TOKENS, item),
            Ok(None) => {}
            Err(err) => skip(skipped, identifier, err),
        }
    }

    propagate_types(store, acc, batch)
}

fn skip(skipped: &mut Vec<SkippedRecord>, id: &str, err: serde_json::Error) {
    warn!(id, error = %err, "skipping token record that cannot be serialized");
    skipped.push(SkippedRecord {
        id: id.to_string(),
        reason: err.to_string(),
    });
}

/// Collection fields of every collection an NFT of the block needs, from
/// the block itself first and from the store otherwise.
fn collection_fields(
    store: &dyn DocumentStore,
    acc: &BlockAccumulators,
) -> Result<BTreeMap<String, CollectionFields>, StoreError> {
    let needed: BTreeSet<&str> = acc
        .nfts
        .values()
        .filter_map(|nft| {
            nft.created
                .as_ref()
                .map(|c| c.token.as_str())
                .or_else(|| nft.supply.first().map(|s| s.token.as_str()))
        })
        .collect();

    let mut fields = BTreeMap::new();
    let mut missing = Vec::new();
    for token in needed {
        match acc.tokens.get(token).and_then(CollectionFields::from_accumulator) {
            Some(from_block) => {
                fields.insert(token.to_string(), from_block);
            }
            None => missing.push(token.to_string()),
        }
    }

    if !missing.is_empty() {
        let docs = store.multi_get(TOKENS, &missing)?;
        for (token, doc) in missing.into_iter().zip(docs) {
            if let Some(stored) = doc.as_ref().and_then(CollectionFields::from_document) {
                fields.insert(token, stored);
            }
        }
    }
    Ok(fields)
}

/// Copies a collection type set by this block onto the NFTs of that
/// collection that are already stored.
fn propagate_types(
    store: &dyn DocumentStore,
    acc: &BlockAccumulators,
    batch: &mut WriteBatch,
) -> Result<(), StoreError> {
    for (token, token_acc) in &acc.tokens {
        let Some(token_type) = token_acc.token_type() else {
            continue;
        };
        let query = Query::And(vec![Query::term("token", token.as_str()), Query::exists("nonce")]);
        let mut updates = Vec::new();
        store.scroll_query(TOKENS, &query, &mut |docs| {
            for doc in docs {
                if doc.source.get("type").and_then(|t| t.as_str()) != Some(token_type) {
                    updates.push(WriteItem::new(
                        doc.id.clone(),
                        WriteAction::Update(vec![Mutation::Merge(json!({ "type": token_type }))]),
                    ));
                }
            }
            Ok(())
        })?;
        if !updates.is_empty() {
            debug!(token = %token, token_type, nfts = updates.len(), "propagating collection type");
        }
        batch.extend(TOKENS, updates);
    }
    Ok(())
}
