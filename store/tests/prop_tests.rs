use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use shardex_store::write::{apply_action, apply_all};
use shardex_store::{FeeWrite, Mutation, Refund, WriteAction};

fn refunds() -> impl Strategy<Value = Vec<Refund>> {
    prop::collection::vec(
        (1u128..1_000_000, 0u64..10_000).prop_map(|(fee, gas_refunded)| Refund { fee, gas_refunded }),
        0..6,
    )
}

proptest! {
    /// Fee converges to base minus all refunds whatever the delivery order
    /// and whichever refunds travel with the transaction itself.
    #[test]
    fn fee_is_order_independent(
        refunds in refunds(),
        in_pass_mask in any::<u8>(),
        tx_position in 0usize..7,
        seed in any::<u64>(),
    ) {
        let base = 10_000_000_000u128;
        let gas = 1_000_000u64;
        let ids: Vec<String> = (0..refunds.len()).map(|i| format!("scr{}", i)).collect();

        let mut in_pass = BTreeMap::new();
        let mut separate = Vec::new();
        for (i, refund) in refunds.iter().enumerate() {
            if in_pass_mask & (1 << i) != 0 {
                in_pass.insert(ids[i].clone(), *refund);
            } else {
                separate.push(Mutation::Fee(FeeWrite::RelativeAdjust {
                    refund_id: ids[i].clone(),
                    refund: *refund,
                    denomination: 18,
                }));
            }
        }
        let pass_fee = base - in_pass.values().map(|r| r.fee).sum::<u128>();
        let pass_gas = gas - in_pass.values().map(|r| r.gas_refunded).sum::<u64>();
        let tx = Mutation::Fee(FeeWrite::Absolute {
            fee: pass_fee,
            gas_used: pass_gas,
            refunds: in_pass,
            denomination: 18,
        });

        let mut ordered = separate.clone();
        let len = ordered.len();
        ordered.rotate_left((seed as usize) % len.max(1));
        ordered.insert(tx_position.min(len), tx.clone());

        let mut reference = separate;
        reference.insert(0, tx);

        let mut a = json!({});
        apply_all(&mut a, &ordered);
        let mut b = json!({});
        apply_all(&mut b, &reference);

        prop_assert_eq!(&a, &b);
        let expected = base - refunds.iter().map(|r| r.fee).sum::<u128>();
        prop_assert_eq!(a["fee"].clone(), Value::String(expected.to_string()));
    }

    /// Combining two merges equals applying them one after the other.
    #[test]
    fn combined_upserts_match_sequential(a in "[a-z]{1,4}", b in "[a-z]{1,4}", x in any::<u32>(), y in any::<u32>()) {
        let first = WriteAction::Upsert(vec![Mutation::Merge(json!({ a.clone(): x }))]);
        let second = WriteAction::Upsert(vec![Mutation::Merge(json!({ b.clone(): y }))]);
        let sequential = apply_action(apply_action(None, &first), &second);
        let combined = apply_action(None, &first.combine(second));
        prop_assert_eq!(sequential, combined);
    }
}
