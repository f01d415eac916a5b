//! Persistence merge contract.
//!
//! Every outbound record is a [`WriteItem`]: a document id plus the
//! [`WriteAction`] deciding whether the stored document is replaced,
//! merged into, or removed. [`apply_action`] is the reference semantics
//! that every [`crate::DocumentStore`] implementation executes per item.
//!
//! Fee bookkeeping keeps every refund the document has seen under
//! `feeRefunds`, keyed by the refunding SCR hash. That makes both fee
//! forms idempotent and independent of delivery order:
//!
//! ```text
//! fee = fee_of_the_tx_pass - sum(refunds not known to that pass)
//! ```

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use shardex_types::{BalanceConverter, StatusInfo};

use crate::query::lookup;

pub const FEE_REFUNDS_FIELD: &str = "feeRefunds";
pub const FEE_FIELD: &str = "fee";
pub const FEE_NUM_FIELD: &str = "feeNum";
pub const GAS_USED_FIELD: &str = "gasUsed";
pub const ROLES_FIELD: &str = "roles";

/// A refund credited to a transaction by one SCR.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Refund {
    #[serde(with = "decimal")]
    pub fee: u128,
    pub gas_refunded: u64,
}

/// How a transaction fee reaches the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FeeWrite {
    /// Written by the pass holding the transaction itself. `fee` and
    /// `gas_used` already account for `refunds`.
    Absolute {
        #[serde(with = "decimal")]
        fee: u128,
        gas_used: u64,
        refunds: BTreeMap<String, Refund>,
        denomination: u32,
    },
    /// Written by a pass holding only a refunding SCR.
    RelativeAdjust {
        refund_id: String,
        refund: Refund,
        denomination: u32,
    },
    /// Withdraws a stored refund and gives its fee and gas back.
    RevertRefund {
        refund_id: String,
        denomination: u32,
    },
}

/// One field-level change applied to a stored document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "camelCase")]
pub enum Mutation {
    /// Deep merge of an object into the document.
    Merge(Value),
    /// Sets top-level keys that are not present yet.
    MergeIfAbsent(Value),
    /// Replaces the value at a dotted path.
    Set { field: String, value: Value },
    Unset { field: String },
    /// Appends values not already present in the array at `field`.
    AddToSet { field: String, values: Vec<Value> },
    /// Drops array elements whose `key` equals one of `values`.
    RemoveWhere {
        field: String,
        key: String,
        values: Vec<Value>,
    },
    /// Grants or revokes `role` for `address` under `roles.<role>`.
    SetRole {
        role: String,
        address: String,
        set: bool,
    },
    Fee(FeeWrite),
    LatchStatus(StatusInfo),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "body", rename_all = "camelCase")]
pub enum WriteAction {
    /// Replace the stored document wholesale.
    Overwrite(Value),
    /// Apply to the stored document, or to an empty one if absent.
    Upsert(Vec<Mutation>),
    /// Apply to the stored document; dropped if absent.
    Update(Vec<Mutation>),
    Delete,
}

impl WriteAction {
    /// Folds `next` into `self` so a single write has the effect of both
    /// applied in order.
    ///
    /// The one approximation: `Update` followed by `Upsert` against an
    /// absent document also applies the update mutations.
    pub fn combine(self, next: WriteAction) -> WriteAction {
        use WriteAction::*;
        match (self, next) {
            (_, Overwrite(doc)) => Overwrite(doc),
            (_, Delete) => Delete,
            (Overwrite(mut doc), Upsert(ms) | Update(ms)) => {
                apply_all(&mut doc, &ms);
                Overwrite(doc)
            }
            (Delete, Upsert(ms)) => {
                let mut doc = Value::Object(Map::new());
                apply_all(&mut doc, &ms);
                Overwrite(doc)
            }
            (Delete, Update(_)) => Delete,
            (Upsert(mut a), Upsert(b) | Update(b)) | (Update(mut a), Upsert(b)) => {
                a.extend(b);
                Upsert(a)
            }
            (Update(mut a), Update(b)) => {
                a.extend(b);
                Update(a)
            }
        }
    }
}

/// A write addressed to one document.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WriteItem {
    pub id: String,
    pub action: WriteAction,
}

impl WriteItem {
    pub fn new(id: impl Into<String>, action: WriteAction) -> Self {
        Self {
            id: id.into(),
            action,
        }
    }
}

/// The document resulting from applying `action` to `existing`.
pub fn apply_action(existing: Option<Value>, action: &WriteAction) -> Option<Value> {
    match action {
        WriteAction::Overwrite(doc) => Some(doc.clone()),
        WriteAction::Upsert(mutations) => {
            let mut doc = existing.unwrap_or_else(|| Value::Object(Map::new()));
            apply_all(&mut doc, mutations);
            Some(doc)
        }
        WriteAction::Update(mutations) => existing.map(|mut doc| {
            apply_all(&mut doc, mutations);
            doc
        }),
        WriteAction::Delete => None,
    }
}

pub fn apply_all(doc: &mut Value, mutations: &[Mutation]) {
    for mutation in mutations {
        apply(doc, mutation);
    }
}

pub fn apply(doc: &mut Value, mutation: &Mutation) {
    match mutation {
        Mutation::Merge(patch) => deep_merge(doc, patch),
        Mutation::MergeIfAbsent(patch) => {
            let map = ensure_object(doc);
            if let Value::Object(fields) = patch {
                for (key, value) in fields {
                    map.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
        Mutation::Set { field, value } => *slot_mut(doc, field) = value.clone(),
        Mutation::Unset { field } => unset(doc, field),
        Mutation::AddToSet { field, values } => add_to_set(slot_mut(doc, field), values),
        Mutation::RemoveWhere { field, key, values } => {
            if let Some(Value::Array(items)) = lookup_mut(doc, field) {
                items.retain(|item| item.get(key).map_or(true, |v| !values.contains(v)));
            }
        }
        Mutation::SetRole { role, address, set } => {
            let path = format!("{}.{}", ROLES_FIELD, role);
            let address = Value::String(address.clone());
            if *set {
                add_to_set(slot_mut(doc, &path), std::slice::from_ref(&address));
            } else if let Some(Value::Array(addresses)) = lookup_mut(doc, &path) {
                addresses.retain(|a| *a != address);
            }
        }
        Mutation::Fee(fee) => apply_fee(doc, fee),
        Mutation::LatchStatus(signal) => latch_status(doc, signal),
    }
}

fn ensure_object(value: &mut Value) -> &mut Map<String, Value> {
    if !value.is_object() {
        *value = Value::Object(Map::new());
    }
    match value {
        Value::Object(map) => map,
        _ => unreachable!("value was just replaced by an object"),
    }
}

fn slot_mut<'a>(doc: &'a mut Value, path: &str) -> &'a mut Value {
    let mut current = doc;
    for key in path.split('.') {
        current = ensure_object(current)
            .entry(key.to_string())
            .or_insert(Value::Null);
    }
    current
}

fn unset(doc: &mut Value, path: &str) {
    let (parent, key) = match path.rsplit_once('.') {
        Some((parent, key)) => (lookup_mut(doc, parent), key),
        None => (Some(doc), path),
    };
    if let Some(Value::Object(map)) = parent {
        map.remove(key);
    }
}

fn lookup_mut<'a>(doc: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split('.').try_fold(doc, |current, key| current.get_mut(key))
}

fn deep_merge(target: &mut Value, patch: &Value) {
    match (target, patch) {
        (Value::Object(target), Value::Object(patch)) => {
            for (key, value) in patch {
                match target.get_mut(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => {
                        target.insert(key.clone(), value.clone());
                    }
                }
            }
        }
        (target, patch) => *target = patch.clone(),
    }
}

fn add_to_set(slot: &mut Value, values: &[Value]) {
    if !slot.is_array() {
        *slot = Value::Array(Vec::new());
    }
    if let Value::Array(items) = slot {
        for value in values {
            if !items.contains(value) {
                items.push(value.clone());
            }
        }
    }
}

fn read_refunds(doc: &Value) -> BTreeMap<String, Refund> {
    let Some(Value::Object(stored)) = lookup(doc, FEE_REFUNDS_FIELD) else {
        return BTreeMap::new();
    };
    stored
        .iter()
        .map(|(id, refund)| {
            let fee = refund
                .get("fee")
                .and_then(Value::as_str)
                .and_then(|f| f.parse().ok())
                .unwrap_or(0);
            let gas_refunded = refund
                .get("gasRefunded")
                .and_then(Value::as_u64)
                .unwrap_or(0);
            (id.clone(), Refund { fee, gas_refunded })
        })
        .collect()
}

fn refunds_value(refunds: &BTreeMap<String, Refund>) -> Value {
    let map = refunds
        .iter()
        .map(|(id, r)| {
            (
                id.clone(),
                json!({"fee": r.fee.to_string(), "gasRefunded": r.gas_refunded}),
            )
        })
        .collect();
    Value::Object(map)
}

fn write_fee(map: &mut Map<String, Value>, fee: u128, denomination: u32) {
    map.insert(FEE_FIELD.to_string(), Value::String(fee.to_string()));
    map.insert(
        FEE_NUM_FIELD.to_string(),
        json!(BalanceConverter::new(denomination).to_float(fee)),
    );
}

fn apply_fee(doc: &mut Value, fee_write: &FeeWrite) {
    let mut stored = read_refunds(doc);
    match fee_write {
        FeeWrite::Absolute {
            fee,
            gas_used,
            refunds,
            denomination,
        } => {
            let (foreign_fee, foreign_gas) = stored
                .iter()
                .filter(|(id, _)| !refunds.contains_key(*id))
                .fold((0u128, 0u64), |(f, g), (_, r)| {
                    (f.saturating_add(r.fee), g.saturating_add(r.gas_refunded))
                });
            stored.extend(refunds.iter().map(|(id, r)| (id.clone(), *r)));

            let map = ensure_object(doc);
            write_fee(map, fee.saturating_sub(foreign_fee), *denomination);
            map.insert(
                GAS_USED_FIELD.to_string(),
                json!(gas_used.saturating_sub(foreign_gas)),
            );
            if !stored.is_empty() {
                map.insert(FEE_REFUNDS_FIELD.to_string(), refunds_value(&stored));
            }
        }
        FeeWrite::RelativeAdjust {
            refund_id,
            refund,
            denomination,
        } => {
            if stored.contains_key(refund_id) {
                return;
            }
            stored.insert(refund_id.clone(), *refund);

            let map = ensure_object(doc);
            map.insert(FEE_REFUNDS_FIELD.to_string(), refunds_value(&stored));
            let current_fee = map
                .get(FEE_FIELD)
                .and_then(Value::as_str)
                .and_then(|f| f.parse::<u128>().ok());
            if let Some(current) = current_fee {
                write_fee(map, current.saturating_sub(refund.fee), *denomination);
            }
            if let Some(gas) = map.get(GAS_USED_FIELD).and_then(Value::as_u64) {
                map.insert(
                    GAS_USED_FIELD.to_string(),
                    json!(gas.saturating_sub(refund.gas_refunded)),
                );
            }
        }
        FeeWrite::RevertRefund {
            refund_id,
            denomination,
        } => {
            let Some(refund) = stored.remove(refund_id) else {
                return;
            };

            let map = ensure_object(doc);
            write_refunds(map, &stored);
            let current_fee = map
                .get(FEE_FIELD)
                .and_then(Value::as_str)
                .and_then(|f| f.parse::<u128>().ok());
            if let Some(current) = current_fee {
                write_fee(map, current.saturating_add(refund.fee), *denomination);
            }
            if let Some(gas) = map.get(GAS_USED_FIELD).and_then(Value::as_u64) {
                map.insert(
                    GAS_USED_FIELD.to_string(),
                    json!(gas.saturating_add(refund.gas_refunded)),
                );
            }
        }
    }
}

fn write_refunds(map: &mut Map<String, Value>, refunds: &BTreeMap<String, Refund>) {
    if refunds.is_empty() {
        map.remove(FEE_REFUNDS_FIELD);
    } else {
        map.insert(FEE_REFUNDS_FIELD.to_string(), refunds_value(refunds));
    }
}

fn latch_status(doc: &mut Value, signal: &StatusInfo) {
    let map = ensure_object(doc);
    let flag = |map: &Map<String, Value>, key: &str| {
        map.get(key).and_then(Value::as_bool).unwrap_or(false)
    };
    let mut current = StatusInfo {
        completed_event: flag(map, "completedEvent"),
        error_event: flag(map, "errorEvent"),
        status: map
            .get("status")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string(),
    };
    current.latch(signal);

    map.insert("completedEvent".into(), Value::Bool(current.completed_event));
    map.insert("errorEvent".into(), Value::Bool(current.error_event));
    map.insert("status".into(), Value::String(current.status));
}

mod decimal {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refund(fee: u128, gas: u64) -> Refund {
        Refund {
            fee,
            gas_refunded: gas,
        }
    }

    fn absolute(fee: u128, gas_used: u64, refunds: &[(&str, Refund)]) -> Mutation {
        Mutation::Fee(FeeWrite::Absolute {
            fee,
            gas_used,
            refunds: refunds.iter().map(|(id, r)| (id.to_string(), *r)).collect(),
            denomination: 18,
        })
    }

    fn relative(id: &str, r: Refund) -> Mutation {
        Mutation::Fee(FeeWrite::RelativeAdjust {
            refund_id: id.to_string(),
            refund: r,
            denomination: 18,
        })
    }

    fn run(mutations: &[Mutation]) -> Value {
        apply_action(None, &WriteAction::Upsert(mutations.to_vec())).expect("upsert")
    }

    #[test]
    fn update_on_absent_document_is_dropped() {
        let action = WriteAction::Update(vec![Mutation::Merge(json!({"a": 1}))]);
        assert_eq!(apply_action(None, &action), None);
        assert_eq!(
            apply_action(Some(json!({"b": 2})), &action),
            Some(json!({"a": 1, "b": 2}))
        );
    }

    #[test]
    fn deep_merge_keeps_sibling_fields() {
        let doc = run(&[
            Mutation::Merge(json!({"data": {"name": "n", "creator": "c"}})),
            Mutation::Merge(json!({"data": {"creator": "d"}, "type": "NonFungibleDCDT"})),
        ]);
        assert_eq!(
            doc,
            json!({"data": {"name": "n", "creator": "d"}, "type": "NonFungibleDCDT"})
        );
    }

    #[test]
    fn merge_if_absent_never_overwrites() {
        let doc = run(&[
            Mutation::MergeIfAbsent(json!({"issuer": "a", "currentOwner": "a"})),
            Mutation::Merge(json!({"currentOwner": "b"})),
            Mutation::MergeIfAbsent(json!({"issuer": "x", "currentOwner": "x"})),
        ]);
        assert_eq!(doc, json!({"issuer": "a", "currentOwner": "b"}));
    }

    #[test]
    fn add_to_set_is_idempotent() {
        let add = Mutation::AddToSet {
            field: "data.uris".into(),
            values: vec![json!("u1"), json!("u2")],
        };
        let doc = run(&[add.clone(), add]);
        assert_eq!(doc, json!({"data": {"uris": ["u1", "u2"]}}));
    }

    #[test]
    fn remove_where_and_unset() {
        let doc = run(&[
            Mutation::AddToSet {
                field: "unDelegateInfo".into(),
                values: vec![json!({"id": "01", "value": "1"}), json!({"id": "02", "value": "2"})],
            },
            Mutation::RemoveWhere {
                field: "unDelegateInfo".into(),
                key: "id".into(),
                values: vec![json!("01")],
            },
            Mutation::Merge(json!({"meta": {"x": 1, "y": 2}})),
            Mutation::Unset { field: "meta.x".into() },
        ]);
        assert_eq!(
            doc,
            json!({"unDelegateInfo": [{"id": "02", "value": "2"}], "meta": {"y": 2}})
        );
    }

    #[test]
    fn roles_are_granted_and_revoked() {
        let doc = run(&[
            Mutation::SetRole { role: "DCDTRoleNFTCreate".into(), address: "a".into(), set: true },
            Mutation::SetRole { role: "DCDTRoleNFTCreate".into(), address: "b".into(), set: true },
            Mutation::SetRole { role: "DCDTRoleNFTCreate".into(), address: "a".into(), set: false },
            Mutation::SetRole { role: "DCDTRoleNFTCreate".into(), address: "b".into(), set: true },
        ]);
        assert_eq!(doc, json!({"roles": {"DCDTRoleNFTCreate": ["b"]}}));
    }

    #[test]
    fn relative_refunds_commute_with_absolute_fee() {
        let base = 1_000_000u128;
        let tx_first = run(&[
            absolute(base, 1000, &[]),
            relative("r1", refund(100, 10)),
            relative("r2", refund(250, 25)),
        ]);
        let scrs_first = run(&[
            relative("r2", refund(250, 25)),
            relative("r1", refund(100, 10)),
            absolute(base, 1000, &[]),
        ]);
        assert_eq!(tx_first, scrs_first);
        assert_eq!(tx_first["fee"], json!("999650"));
        assert_eq!(tx_first["gasUsed"], json!(965));
    }

    #[test]
    fn duplicate_deliveries_are_idempotent() {
        let once = run(&[absolute(500, 50, &[("r1", refund(20, 2))]), relative("r2", refund(30, 3))]);
        let twice = run(&[
            absolute(500, 50, &[("r1", refund(20, 2))]),
            relative("r2", refund(30, 3)),
            relative("r2", refund(30, 3)),
            absolute(500, 50, &[("r1", refund(20, 2))]),
        ]);
        assert_eq!(once, twice);
        assert_eq!(once["fee"], json!("470"));
    }

    #[test]
    fn reverted_refund_gives_the_fee_back() {
        let revert = Mutation::Fee(FeeWrite::RevertRefund {
            refund_id: "r2".into(),
            denomination: 18,
        });
        let without = run(&[absolute(500, 50, &[]), relative("r1", refund(20, 2))]);
        let reverted = run(&[
            absolute(500, 50, &[]),
            relative("r1", refund(20, 2)),
            relative("r2", refund(30, 3)),
            revert.clone(),
            revert,
        ]);
        assert_eq!(reverted, without);
        assert_eq!(reverted["fee"], json!("480"));
        assert_eq!(reverted["gasUsed"], json!(48));

        let placeholder = run(&[
            relative("r2", refund(30, 3)),
            Mutation::Fee(FeeWrite::RevertRefund {
                refund_id: "r2".into(),
                denomination: 18,
            }),
        ]);
        assert_eq!(placeholder, json!({}));
    }

    #[test]
    fn stored_status_latches() {
        let doc = run(&[
            Mutation::LatchStatus(StatusInfo::new(true, false, "success")),
            Mutation::LatchStatus(StatusInfo::failed()),
            Mutation::LatchStatus(StatusInfo::new(false, false, "success")),
        ]);
        assert_eq!(
            doc,
            json!({"completedEvent": true, "errorEvent": true, "status": "fail"})
        );
    }

    #[test]
    fn combine_matches_sequential_application() {
        let stored = Some(json!({"a": 1}));
        let first = WriteAction::Upsert(vec![Mutation::Merge(json!({"b": 2}))]);
        let second = WriteAction::Update(vec![Mutation::Merge(json!({"c": 3}))]);

        let sequential = apply_action(apply_action(stored.clone(), &first), &second);
        let combined = apply_action(stored, &first.combine(second));
        assert_eq!(sequential, combined);
    }

    #[test]
    fn delete_then_upsert_becomes_overwrite() {
        let combined = WriteAction::Delete.combine(WriteAction::Upsert(vec![Mutation::Merge(
            json!({"activeStake": "5"}),
        )]));
        assert_eq!(combined, WriteAction::Overwrite(json!({"activeStake": "5"})));
        assert_eq!(
            WriteAction::Delete.combine(WriteAction::Update(vec![])),
            WriteAction::Delete
        );
    }
}
