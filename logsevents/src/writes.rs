//! Accumulator to write conversion for the token, NFT, delegator and
//! contract collections.

use serde_json::{json, Map, Value};

use shardex_store::{Mutation, WriteAction, WriteItem};
use shardex_types::convert::{extract_metadata, extract_tags};

use crate::accumulators::{BlockAccumulators, NftAccumulator, TokenAccumulator};
use crate::delta::NftMutation;
use crate::identifiers::{DYNAMIC_NON_FUNGIBLE_DCDT, NON_FUNGIBLE_DCDT, NON_FUNGIBLE_DCDT_V2};

/// Whether tokens of this type are removed from the index when burnt.
pub fn is_non_fungible(token_type: &str) -> bool {
    matches!(
        token_type,
        NON_FUNGIBLE_DCDT | NON_FUNGIBLE_DCDT_V2 | DYNAMIC_NON_FUNGIBLE_DCDT
    )
}

/// Collection fields copied onto each NFT of the collection.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectionFields {
    pub token_type: String,
    pub ticker: String,
    pub num_decimals: Option<u64>,
}

impl CollectionFields {
    pub fn from_accumulator(acc: &TokenAccumulator) -> Option<Self> {
        acc.static_fields.as_ref().map(|s| Self {
            token_type: s.token_type.clone(),
            ticker: s.ticker.clone(),
            num_decimals: s.num_decimals,
        })
    }

    pub fn from_document(doc: &Value) -> Option<Self> {
        let token_type = doc.get("type")?.as_str()?.to_string();
        Some(Self {
            token_type,
            ticker: doc
                .get("ticker")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            num_decimals: doc.get("numDecimals").and_then(Value::as_u64),
        })
    }

    fn patch(&self) -> Value {
        let mut patch = json!({ "type": self.token_type, "ticker": self.ticker });
        if let Some(decimals) = self.num_decimals {
            patch["numDecimals"] = json!(decimals);
        }
        patch
    }
}

/// The single write of one token or collection document.
pub fn token_write(token: &str, acc: &TokenAccumulator) -> Result<Option<WriteItem>, serde_json::Error> {
    let mut mutations = Vec::new();

    if let Some(fields) = &acc.static_fields {
        let mut patch = json!({
            "token": token,
            "name": fields.name,
            "ticker": fields.ticker,
            "type": fields.token_type,
        });
        if let Some(decimals) = fields.num_decimals {
            patch["numDecimals"] = json!(decimals);
        }
        mutations.push(Mutation::Merge(patch));
    }
    if let Some(issuer) = &acc.issuer {
        let mut patch = Map::new();
        patch.insert("issuer".into(), json!(issuer));
        if let Some(owner) = &acc.initial_owner {
            patch.insert("currentOwner".into(), json!(owner));
        }
        if let Some(ts) = acc.issued_at {
            patch.insert("timestamp".into(), json!(ts));
        }
        mutations.push(Mutation::MergeIfAbsent(Value::Object(patch)));
    }
    if let Some(owner) = &acc.current_owner {
        mutations.push(Mutation::Merge(json!({ "token": token, "currentOwner": owner })));
    }
    if !acc.owners_history.is_empty() {
        let values = acc
            .owners_history
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        mutations.push(Mutation::AddToSet {
            field: "ownersHistory".into(),
            values,
        });
    }
    if acc.change_to_dynamic {
        mutations.push(Mutation::Merge(json!({ "changedToDynamic": true })));
    }
    for ((role, address), set) in &acc.roles {
        mutations.push(Mutation::SetRole {
            role: role.clone(),
            address: address.clone(),
            set: *set,
        });
    }
    if !acc.properties.is_empty() {
        mutations.push(Mutation::Merge(json!({ "properties": acc.properties })));
    }

    let only_paused = mutations.is_empty();
    if let Some(paused) = acc.paused {
        mutations.push(Mutation::Merge(json!({ "paused": paused })));
    }

    Ok(match (mutations.is_empty(), only_paused) {
        (true, _) => None,
        (false, true) => Some(WriteItem::new(token, WriteAction::Update(mutations))),
        (false, false) => Some(WriteItem::new(token, WriteAction::Upsert(mutations))),
    })
}

/// The single write of one NFT document.
///
/// `collection` carries the collection fields when known; a burn or wipe
/// only removes the document of a non-fungible collection.
pub fn nft_write(
    identifier: &str,
    acc: &NftAccumulator,
    collection: Option<&CollectionFields>,
) -> Result<Option<WriteItem>, serde_json::Error> {
    let removed = !acc.supply.is_empty()
        && collection.map_or(false, |c| is_non_fungible(&c.token_type));
    if removed {
        return Ok(Some(WriteItem::new(identifier, WriteAction::Delete)));
    }

    let mut mutations = Vec::new();
    if let Some(created) = &acc.created {
        let mut fields = json!({
            "identifier": created.identifier,
            "token": created.token,
            "nonce": created.nonce,
            "timestamp": created.timestamp,
        });
        if let Some(data) = &created.data {
            fields["data"] = serde_json::to_value(data)?;
        }
        mutations.push(Mutation::MergeIfAbsent(fields));
    }
    if let Some(collection) = collection {
        if acc.created.is_some() {
            mutations.push(Mutation::Merge(collection.patch()));
        }
    }
    for update in &acc.updates {
        push_nft_mutation(&mut mutations, &update.mutation)?;
    }

    if mutations.is_empty() {
        return Ok(None);
    }
    let action = if acc.created.is_some() {
        WriteAction::Upsert(mutations)
    } else {
        WriteAction::Update(mutations)
    };
    Ok(Some(WriteItem::new(identifier, action)))
}

fn push_nft_mutation(mutations: &mut Vec<Mutation>, mutation: &NftMutation) -> Result<(), serde_json::Error> {
    match mutation {
        NftMutation::SetAttributes(attributes) => {
            mutations.push(Mutation::Set {
                field: "data.attributes".into(),
                value: json!(hex::encode(attributes)),
            });
            mutations.push(Mutation::Set {
                field: "data.tags".into(),
                value: json!(extract_tags(attributes)),
            });
            mutations.push(match extract_metadata(attributes) {
                Some(metadata) => Mutation::Set {
                    field: "data.metadata".into(),
                    value: json!(metadata),
                },
                None => Mutation::Unset {
                    field: "data.metadata".into(),
                },
            });
        }
        NftMutation::AddUris(uris) => mutations.push(Mutation::AddToSet {
            field: "data.uris".into(),
            values: uris.iter().map(|u| json!(u)).collect(),
        }),
        NftMutation::SetUris(uris) => mutations.push(Mutation::Set {
            field: "data.uris".into(),
            value: json!(uris),
        }),
        NftMutation::Freeze => mutations.push(Mutation::Merge(json!({ "frozen": true }))),
        NftMutation::UnFreeze => mutations.push(Mutation::Merge(json!({ "frozen": false }))),
        // Collection level, folded into the token accumulator.
        NftMutation::Pause | NftMutation::UnPause => {}
        NftMutation::RecreateMetadata(data) => mutations.push(Mutation::Set {
            field: "data".into(),
            value: serde_json::to_value(data)?,
        }),
        NftMutation::UpdateMetadata(data) => {
            mutations.push(Mutation::Merge(json!({ "data": serde_json::to_value(data)? })))
        }
        NftMutation::ModifyCreator(creator) => {
            mutations.push(Mutation::Merge(json!({ "data": { "creator": creator } })))
        }
        NftMutation::ModifyRoyalties(royalties) => {
            mutations.push(Mutation::Merge(json!({ "data": { "royalties": royalties } })))
        }
    }
    Ok(())
}

pub fn delegator_writes(acc: &BlockAccumulators) -> Vec<WriteItem> {
    acc.delegators
        .iter()
        .map(|(id, delegator)| WriteItem::new(id.clone(), delegator.to_action()))
        .collect()
}

pub fn contract_writes(acc: &BlockAccumulators) -> Vec<WriteItem> {
    acc.contracts
        .iter()
        .filter(|(_, contract)| !contract.mutations.is_empty())
        .map(|(address, contract)| {
            WriteItem::new(address.clone(), WriteAction::Upsert(contract.mutations.clone()))
        })
        .collect()
}
