//! Typed effects extracted from single events.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use shardex_types::convert::{bytes_to_field, extract_metadata, extract_tags};
use shardex_types::{AddressCodec, StatusInfo, TokenMetaData};

#[derive(Clone, Debug, PartialEq)]
pub enum Delta {
    Token(TokenInfo),
    NftCreated(NftInfo),
    NftUpdate(NftDataUpdate),
    Supply(SupplyChange),
    Role(RoleData),
    Properties(PropertiesData),
    Delegator(Delegator),
    ContractDeployed(ScDeployInfo),
    ContractUpgraded(ScUpgrade),
    OwnerChanged(OwnerChange),
    Status { tx_hash: String, info: StatusInfo },
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerData {
    pub address: String,
    pub timestamp: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tx_hash: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenEventKind {
    /// Issue or register: creates the token.
    Issue,
    /// Type or flag change of an existing token.
    Change,
    TransferOwnership,
}

/// Token-level information from an issue-family event.
#[derive(Clone, Debug, PartialEq)]
pub struct TokenInfo {
    pub kind: TokenEventKind,
    pub token: String,
    pub name: String,
    pub ticker: String,
    pub token_type: String,
    pub num_decimals: Option<u64>,
    pub issuer: String,
    pub current_owner: String,
    pub owner_entry: OwnerData,
    pub change_to_dynamic: bool,
    pub timestamp: u64,
}

/// Document form of NFT metadata. Empty fields are omitted so the value
/// doubles as a field-level patch.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NftMetadata {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub creator: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub royalties: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub uris: Vec<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub attributes: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<String>,
}

fn is_zero(v: &u32) -> bool {
    *v == 0
}

impl NftMetadata {
    pub fn from_raw(raw: &TokenMetaData, codec: &dyn AddressCodec) -> Self {
        Self {
            name: bytes_to_field(&raw.name),
            creator: codec.encode_silent(&raw.creator),
            royalties: raw.royalties,
            hash: hex::encode(&raw.hash),
            uris: raw
                .uris
                .iter()
                .map(|u| bytes_to_field(u))
                .filter(|u| !u.is_empty())
                .collect(),
            attributes: hex::encode(&raw.attributes),
            tags: extract_tags(&raw.attributes),
            metadata: extract_metadata(&raw.attributes),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NftInfo {
    pub identifier: String,
    pub token: String,
    pub nonce: u64,
    pub timestamp: u64,
    pub data: Option<NftMetadata>,
}

#[derive(Clone, Debug, PartialEq)]
pub enum NftMutation {
    SetAttributes(Vec<u8>),
    AddUris(Vec<String>),
    SetUris(Vec<String>),
    Freeze,
    UnFreeze,
    Pause,
    UnPause,
    RecreateMetadata(NftMetadata),
    UpdateMetadata(NftMetadata),
    ModifyCreator(String),
    ModifyRoyalties(u32),
}

/// One property change of an NFT (or, for pause, of a collection).
#[derive(Clone, Debug, PartialEq)]
pub struct NftDataUpdate {
    pub identifier: String,
    pub address: String,
    pub mutation: NftMutation,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupplyKind {
    Burn,
    Wipe,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SupplyChange {
    pub kind: SupplyKind,
    pub identifier: String,
    pub token: String,
    pub nonce: u64,
    pub value: u128,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoleData {
    pub role: String,
    pub token: String,
    pub address: String,
    pub set: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertiesData {
    pub token: String,
    pub properties: BTreeMap<String, bool>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnDelegateInfo {
    pub id: String,
    pub value: String,
    pub value_num: f64,
    pub timestamp: u64,
}

/// A stake change of `address` on delegation contract `contract`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Delegator {
    pub address: String,
    pub contract: String,
    pub active_stake: String,
    pub active_stake_num: f64,
    pub timestamp: u64,
    pub should_delete: bool,
    pub withdraw_fund_ids: Vec<String>,
    pub undelegate: Option<UnDelegateInfo>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScDeployInfo {
    pub contract: String,
    pub creator: String,
    pub code_hash: String,
    pub tx_hash: String,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScUpgrade {
    pub contract: String,
    pub upgrader: String,
    pub code_hash: String,
    pub tx_hash: String,
    pub timestamp: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnerChange {
    pub contract: String,
    pub owner: OwnerData,
}
