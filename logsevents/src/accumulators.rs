//! Per-block accumulators keyed by entity identity.
//!
//! Scalars are last-write-wins in event order, histories append. Each
//! touched entity yields exactly one write when the block is flushed.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use shardex_store::write::apply_all;
use shardex_store::{Mutation, WriteAction};

use crate::delta::*;
use crate::status::TxHashStatusInfo;

type Blake2b256 = Blake2b<U32>;

/// Document id of the (address, contract) delegation pair.
pub fn delegator_id(address: &str, contract: &str) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update(address.as_bytes());
    hasher.update(contract.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TokenStatic {
    pub name: String,
    pub ticker: String,
    pub token_type: String,
    pub num_decimals: Option<u64>,
}

/// Everything a block says about one collection or fungible token.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TokenAccumulator {
    pub static_fields: Option<TokenStatic>,
    pub issuer: Option<String>,
    pub initial_owner: Option<String>,
    pub issued_at: Option<u64>,
    /// Set by ownership transfers.
    pub current_owner: Option<String>,
    pub owners_history: Vec<OwnerData>,
    pub change_to_dynamic: bool,
    /// `(role, address)` → granted.
    pub roles: BTreeMap<(String, String), bool>,
    pub properties: BTreeMap<String, bool>,
    pub paused: Option<bool>,
}

impl TokenAccumulator {
    fn apply(&mut self, info: TokenInfo) {
        match info.kind {
            TokenEventKind::Issue | TokenEventKind::Change => {
                let num_decimals = info
                    .num_decimals
                    .or_else(|| self.static_fields.as_ref().and_then(|s| s.num_decimals));
                self.static_fields = Some(TokenStatic {
                    name: info.name,
                    ticker: info.ticker,
                    token_type: info.token_type,
                    num_decimals,
                });
                self.change_to_dynamic |= info.change_to_dynamic;
                if info.kind == TokenEventKind::Issue {
                    self.issuer.get_or_insert(info.issuer);
                    self.initial_owner.get_or_insert(info.current_owner);
                    self.issued_at.get_or_insert(info.timestamp);
                    self.owners_history.push(info.owner_entry);
                }
            }
            TokenEventKind::TransferOwnership => {
                self.current_owner = Some(info.current_owner);
                self.owners_history.push(info.owner_entry);
            }
        }
    }

    /// Token type known from this block, if any.
    pub fn token_type(&self) -> Option<&str> {
        self.static_fields.as_ref().map(|s| s.token_type.as_str())
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct NftAccumulator {
    pub created: Option<NftInfo>,
    pub updates: Vec<NftDataUpdate>,
    pub supply: Vec<SupplyChange>,
}

/// Ordered mutations of one delegator document, with deletion folded in.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DelegatorAccumulator {
    mutations: Vec<Mutation>,
    deleted: bool,
}

impl DelegatorAccumulator {
    fn apply(&mut self, delegator: Delegator) {
        if delegator.should_delete {
            self.mutations.clear();
            self.deleted = true;
            return;
        }

        self.mutations.push(Mutation::Merge(json!({
            "address": delegator.address,
            "contract": delegator.contract,
            "activeStake": delegator.active_stake,
            "activeStakeNum": delegator.active_stake_num,
            "timestamp": delegator.timestamp,
        })));
        if let Some(info) = delegator.undelegate {
            self.mutations.push(Mutation::AddToSet {
                field: "unDelegateInfo".into(),
                values: vec![json!({
                    "id": info.id,
                    "value": info.value,
                    "valueNum": info.value_num,
                    "timestamp": info.timestamp,
                })],
            });
        }
        if !delegator.withdraw_fund_ids.is_empty() {
            self.mutations.push(Mutation::RemoveWhere {
                field: "unDelegateInfo".into(),
                key: "id".into(),
                values: delegator.withdraw_fund_ids.into_iter().map(Value::String).collect(),
            });
        }
    }

    pub fn to_action(&self) -> WriteAction {
        match (self.deleted, self.mutations.is_empty()) {
            (true, true) => WriteAction::Delete,
            (true, false) => {
                let mut doc = Value::Object(Map::new());
                apply_all(&mut doc, &self.mutations);
                WriteAction::Overwrite(doc)
            }
            (false, _) => WriteAction::Upsert(self.mutations.clone()),
        }
    }
}

/// Ordered mutations of one deployed contract document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContractAccumulator {
    pub mutations: Vec<Mutation>,
}

impl ContractAccumulator {
    fn deployed(&mut self, info: ScDeployInfo) {
        let mut fields = json!({
            "deployer": info.creator,
            "deployTxHash": info.tx_hash,
            "timestamp": info.timestamp,
        });
        if !info.code_hash.is_empty() {
            fields["codeHash"] = Value::String(info.code_hash);
        }
        self.mutations.push(Mutation::Merge(fields));
        self.mutations
            .push(Mutation::MergeIfAbsent(json!({ "currentOwner": info.creator })));
    }

    fn upgraded(&mut self, info: ScUpgrade) {
        if !info.code_hash.is_empty() {
            self.mutations
                .push(Mutation::Merge(json!({ "codeHash": info.code_hash })));
        }
        self.mutations.push(Mutation::AddToSet {
            field: "upgrades".into(),
            values: vec![json!({
                "upgrader": info.upgrader,
                "codeHash": info.code_hash,
                "txHash": info.tx_hash,
                "timestamp": info.timestamp,
            })],
        });
    }

    fn owner_changed(&mut self, change: OwnerChange) {
        self.mutations
            .push(Mutation::Merge(json!({ "currentOwner": change.owner.address })));
        self.mutations.push(Mutation::AddToSet {
            field: "ownersHistory".into(),
            values: vec![json!({
                "address": change.owner.address,
                "timestamp": change.owner.timestamp,
                "txHash": change.owner.tx_hash,
            })],
        });
    }
}

/// Everything extracted from one block's logs.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BlockAccumulators {
    /// Keyed by collection or fungible token identifier.
    pub tokens: BTreeMap<String, TokenAccumulator>,
    /// Keyed by NFT identifier.
    pub nfts: BTreeMap<String, NftAccumulator>,
    /// Keyed by delegator document id.
    pub delegators: BTreeMap<String, DelegatorAccumulator>,
    /// Keyed by contract address.
    pub contracts: BTreeMap<String, ContractAccumulator>,
    pub statuses: TxHashStatusInfo,
}

impl BlockAccumulators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, delta: Delta) {
        match delta {
            Delta::Token(info) => self.tokens.entry(info.token.clone()).or_default().apply(info),
            Delta::NftCreated(info) => {
                let id = info.identifier.clone();
                self.nfts.entry(id).or_default().created = Some(info);
            }
            Delta::NftUpdate(update) => match update.mutation {
                NftMutation::Pause | NftMutation::UnPause => {
                    let paused = update.mutation == NftMutation::Pause;
                    self.tokens.entry(update.identifier).or_default().paused = Some(paused);
                }
                _ => self
                    .nfts
                    .entry(update.identifier.clone())
                    .or_default()
                    .updates
                    .push(update),
            },
            Delta::Supply(change) => self
                .nfts
                .entry(change.identifier.clone())
                .or_default()
                .supply
                .push(change),
            Delta::Role(role) => {
                self.tokens
                    .entry(role.token)
                    .or_default()
                    .roles
                    .insert((role.role, role.address), role.set);
            }
            Delta::Properties(props) => self
                .tokens
                .entry(props.token)
                .or_default()
                .properties
                .extend(props.properties),
            Delta::Delegator(delegator) => self
                .delegators
                .entry(delegator_id(&delegator.address, &delegator.contract))
                .or_default()
                .apply(delegator),
            Delta::ContractDeployed(info) => self
                .contracts
                .entry(info.contract.clone())
                .or_default()
                .deployed(info),
            Delta::ContractUpgraded(info) => self
                .contracts
                .entry(info.contract.clone())
                .or_default()
                .upgraded(info),
            Delta::OwnerChanged(change) => self
                .contracts
                .entry(change.contract.clone())
                .or_default()
                .owner_changed(change),
            Delta::Status { tx_hash, info } => self.statuses.add_record(&tx_hash, &info),
        }
    }
}
