//! Stake changes on delegation contracts.

use std::sync::Arc;

use shardex_types::convert::{bytes_to_bool, bytes_to_u128};
use shardex_types::{AddressCodec, EventRecord};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::{Delta, Delegator, UnDelegateInfo};
use crate::identifiers::*;

const MIN_TOPICS_DELEGATORS: usize = 4;
const MIN_TOPICS_CLAIM: usize = 2;

/// Stake topics:
/// - `[0]` value moved by the operation
/// - `[1]` active stake of the delegator after the operation
/// - `[2]` number of delegators
/// - `[3]` total active stake of the contract
/// - `[4]` contract (delegate), fund id (unDelegate) or should-delete flag (withdraw)
/// - `[5..]` withdrawn fund ids
///
/// `claimRewards` topics: `[reward, should-delete, contract?]`.
pub struct DelegatorsClassifier {
    codec: Arc<dyn AddressCodec>,
}

impl DelegatorsClassifier {
    pub fn new(codec: Arc<dyn AddressCodec>) -> Self {
        Self { codec }
    }

    fn claim_rewards(&self, address: String, contract: String, topics: &[Vec<u8>]) -> Outcome {
        if topics.len() < MIN_TOPICS_CLAIM {
            return Outcome::swallowed();
        }
        if !bytes_to_bool(&topics[1]) {
            return Outcome::swallowed();
        }
        let contract = match topics.get(2) {
            Some(c) => self.codec.encode_silent(c),
            None => contract,
        };
        Outcome::single(Delta::Delegator(Delegator {
            address,
            contract,
            should_delete: true,
            ..Default::default()
        }))
    }
}

impl EventClassifier for DelegatorsClassifier {
    fn name(&self) -> &'static str {
        "delegators"
    }

    fn process_event(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome {
        let id = event.identifier.as_str();
        if !matches!(id, DELEGATE | UNDELEGATE | WITHDRAW | RE_DELEGATE_REWARDS | CLAIM_REWARDS) {
            return Outcome::NotApplicable;
        }

        let address = self.codec.encode_silent(&event.address);
        if address.is_empty() {
            return Outcome::swallowed();
        }
        let contract = self.codec.encode_silent(ctx.log_address);
        let topics = &event.topics;

        if id == CLAIM_REWARDS {
            return self.claim_rewards(address, contract, topics);
        }
        if topics.len() < MIN_TOPICS_DELEGATORS {
            return Outcome::swallowed();
        }

        let Some(active_stake) = bytes_to_u128(&topics[1]) else {
            return Outcome::swallowed();
        };
        let mut delegator = Delegator {
            address,
            contract,
            active_stake: active_stake.to_string(),
            active_stake_num: ctx.balance_converter.to_float(active_stake),
            timestamp: ctx.timestamp,
            ..Default::default()
        };

        match (id, topics.get(4)) {
            (DELEGATE, Some(contract)) => delegator.contract = self.codec.encode_silent(contract),
            (UNDELEGATE, Some(fund_id)) => {
                let value = bytes_to_u128(&topics[0]).unwrap_or_default();
                delegator.undelegate = Some(UnDelegateInfo {
                    id: hex::encode(fund_id),
                    value: value.to_string(),
                    value_num: ctx.balance_converter.to_float(value),
                    timestamp: ctx.timestamp,
                });
            }
            (WITHDRAW, Some(should_delete)) => {
                delegator.should_delete = bytes_to_bool(should_delete);
                delegator.withdraw_fund_ids = topics[5..].iter().map(hex::encode).collect();
            }
            _ => {}
        }

        if delegator.contract.is_empty() {
            return Outcome::swallowed();
        }
        Outcome::single(Delta::Delegator(delegator))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use shardex_types::HexAddressCodec;

    fn classifier() -> DelegatorsClassifier {
        DelegatorsClassifier::new(Arc::new(HexAddressCodec::new()))
    }

    fn be(v: u128) -> Vec<u8> {
        let bytes = v.to_be_bytes();
        let first = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
        bytes[first..].to_vec()
    }

    fn delegator(event: EventRecord) -> Delegator {
        match classifier().process_event(&event, &test_context()).deltas() {
            [Delta::Delegator(d)] => d.clone(),
            other => panic!("expected one delegator, got {:?}", other),
        }
    }

    #[test]
    fn delegate() {
        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            DELEGATE,
            vec![be(1000), be(1_000_000_000), be(10), be(1_000_000_000)],
        ));
        assert_eq!(
            d,
            Delegator {
                address: "61646472".into(),
                contract: "636f6e7472616374".into(),
                active_stake: "1000000000".into(),
                active_stake_num: 0.1,
                timestamp: 1000,
                ..Default::default()
            }
        );
    }

    #[test]
    fn delegate_with_contract_topic() {
        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            DELEGATE,
            vec![be(1000), be(1000), be(1), be(1000), b"contract2".to_vec()],
        ));
        assert_eq!(d.contract, hex::encode("contract2"));
    }

    #[test]
    fn withdraw_with_delete() {
        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            WITHDRAW,
            vec![be(1000), be(0), be(10), be(1_000_000_000), b"true".to_vec(), b"a".to_vec()],
        ));
        assert!(d.should_delete);
        assert_eq!(d.active_stake, "0");
        assert_eq!(d.active_stake_num, 0.0);
        assert_eq!(d.withdraw_fund_ids, vec!["61".to_string()]);
    }

    #[test]
    fn withdraw_with_five_topics_has_no_fund_ids() {
        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            WITHDRAW,
            vec![be(1000), be(0), be(10), be(1_000_000_000), b"true".to_vec()],
        ));
        assert!(d.should_delete);
        assert!(d.withdraw_fund_ids.is_empty());
    }

    #[test]
    fn withdraw_with_several_fund_ids() {
        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            WITHDRAW,
            vec![be(1000), be(0), be(10), be(1), b"true".to_vec(), b"id1".to_vec(), b"id2".to_vec()],
        ));
        assert_eq!(d.withdraw_fund_ids, vec!["696431".to_string(), "696432".to_string()]);
    }

    #[test]
    fn undelegate_records_pending_fund() {
        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            UNDELEGATE,
            vec![be(2_000_000_000), be(1_000_000_000), be(10), be(1), b"fund".to_vec()],
        ));
        let info = d.undelegate.expect("undelegate info");
        assert_eq!(info.id, hex::encode("fund"));
        assert_eq!(info.value, "2000000000");
        assert_eq!(info.value_num, 0.2);
    }

    #[test]
    fn claim_rewards_with_delete_is_a_pure_deletion() {
        let d = delegator(EventRecord::new(b"addr".to_vec(), CLAIM_REWARDS, vec![be(1000), b"true".to_vec()]));
        assert_eq!(
            d,
            Delegator {
                address: "61646472".into(),
                contract: "636f6e7472616374".into(),
                should_delete: true,
                ..Default::default()
            }
        );

        let d = delegator(EventRecord::new(
            b"addr".to_vec(),
            CLAIM_REWARDS,
            vec![be(1000), b"true".to_vec(), b"contract2".to_vec()],
        ));
        assert_eq!(d.contract, hex::encode("contract2"));
    }

    #[test]
    fn claim_rewards_without_delete_has_no_delta() {
        let event = EventRecord::new(b"addr".to_vec(), CLAIM_REWARDS, vec![be(1000), b"false".to_vec()]);
        assert_eq!(classifier().process_event(&event, &test_context()), Outcome::swallowed());
    }

    #[test]
    fn short_stake_event_is_swallowed() {
        let event = EventRecord::new(b"addr".to_vec(), DELEGATE, vec![be(1)]);
        assert_eq!(classifier().process_event(&event, &test_context()), Outcome::swallowed());
    }
}
