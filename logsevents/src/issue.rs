//! Token issuance, type changes and ownership transfers.

use std::sync::Arc;

use shardex_types::convert::bytes_to_u64;
use shardex_types::{AddressCodec, EventRecord};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::{Delta, OwnerData, TokenEventKind, TokenInfo};
use crate::identifiers::*;

const NUM_ISSUE_TOPICS: usize = 4;

/// Topics:
/// - `[0]` token identifier
/// - `[1]` token name
/// - `[2]` ticker
/// - `[3]` token type
/// - `[4]` number of decimals, or the new owner for `transferOwnership`
pub struct IssueClassifier {
    codec: Arc<dyn AddressCodec>,
}

impl IssueClassifier {
    pub fn new(codec: Arc<dyn AddressCodec>) -> Self {
        Self { codec }
    }

    fn kind(identifier: &str) -> Option<TokenEventKind> {
        match identifier {
            ISSUE
            | ISSUE_SEMI_FUNGIBLE
            | ISSUE_NON_FUNGIBLE
            | REGISTER_META_DCDT
            | REGISTER_AND_SET_ALL_ROLES
            | REGISTER_DYNAMIC
            | REGISTER_AND_SET_ALL_ROLES_DYNAMIC => Some(TokenEventKind::Issue),
            CHANGE_SFT_TO_META_DCDT | CHANGE_TO_DYNAMIC => Some(TokenEventKind::Change),
            TRANSFER_OWNERSHIP => Some(TokenEventKind::TransferOwnership),
            _ => None,
        }
    }
}

impl EventClassifier for IssueClassifier {
    fn name(&self) -> &'static str {
        "issue"
    }

    fn process_event(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome {
        let Some(kind) = Self::kind(&event.identifier) else {
            return Outcome::NotApplicable;
        };

        let topics = &event.topics;
        if topics.len() < NUM_ISSUE_TOPICS || topics[0].is_empty() {
            return Outcome::swallowed();
        }

        let encoded = self.codec.encode_silent(&event.address);
        if encoded.is_empty() {
            return Outcome::swallowed();
        }

        let num_decimals = (topics.len() == NUM_ISSUE_TOPICS + 1
            && kind != TokenEventKind::TransferOwnership)
            .then(|| bytes_to_u64(&topics[4]));

        let mut info = TokenInfo {
            kind,
            token: String::from_utf8_lossy(&topics[0]).into_owned(),
            name: String::from_utf8_lossy(&topics[1]).into_owned(),
            ticker: String::from_utf8_lossy(&topics[2]).into_owned(),
            token_type: String::from_utf8_lossy(&topics[3]).into_owned(),
            num_decimals,
            issuer: encoded.clone(),
            current_owner: encoded.clone(),
            owner_entry: OwnerData {
                address: encoded,
                timestamp: ctx.timestamp,
                tx_hash: ctx.tx_hash.to_string(),
            },
            change_to_dynamic: event.identifier == CHANGE_TO_DYNAMIC,
            timestamp: ctx.timestamp,
        };

        if kind == TokenEventKind::TransferOwnership {
            let Some(new_owner) = topics.get(4).map(|t| self.codec.encode_silent(t)) else {
                return Outcome::swallowed();
            };
            if new_owner.is_empty() {
                return Outcome::swallowed();
            }
            info.current_owner = new_owner.clone();
            info.owner_entry.address = new_owner;
        }

        Outcome::single(Delta::Token(info))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use shardex_types::HexAddressCodec;

    fn classifier() -> IssueClassifier {
        IssueClassifier::new(Arc::new(HexAddressCodec::new()))
    }

    fn token_info(outcome: Outcome) -> TokenInfo {
        match outcome.deltas() {
            [Delta::Token(info)] => info.clone(),
            other => panic!("expected one token delta, got {:?}", other),
        }
    }

    #[test]
    fn issue_non_fungible() {
        let event = EventRecord::new(
            b"addr".to_vec(),
            ISSUE_NON_FUNGIBLE,
            vec![b"MYTOKEN-abcd".to_vec(), b"my-token".to_vec(), b"MYTOKEN".to_vec(), b"NonFungibleDCDT".to_vec()],
        );
        let info = token_info(classifier().process_event(&event, &test_context()));

        assert_eq!(info.kind, TokenEventKind::Issue);
        assert_eq!(info.token, "MYTOKEN-abcd");
        assert_eq!(info.name, "my-token");
        assert_eq!(info.ticker, "MYTOKEN");
        assert_eq!(info.token_type, "NonFungibleDCDT");
        assert_eq!(info.issuer, "61646472");
        assert_eq!(info.current_owner, "61646472");
        assert_eq!(info.num_decimals, None);
        assert_eq!(info.owner_entry, OwnerData { address: "61646472".into(), timestamp: 1000, tx_hash: "01020304".into() });
    }

    #[test]
    fn issue_fungible_with_decimals() {
        let event = EventRecord::new(
            b"addr".to_vec(),
            ISSUE,
            vec![b"TKN-abcd".to_vec(), b"tkn".to_vec(), b"TKN".to_vec(), b"FungibleDCDT".to_vec(), vec![18]],
        );
        let info = token_info(classifier().process_event(&event, &test_context()));
        assert_eq!(info.num_decimals, Some(18));
    }

    #[test]
    fn transfer_ownership_sets_new_owner() {
        let event = EventRecord::new(
            b"addr".to_vec(),
            TRANSFER_OWNERSHIP,
            vec![b"MYTOKEN-abcd".to_vec(), b"my-token".to_vec(), b"MYTOKEN".to_vec(), b"NonFungibleDCDT".to_vec(), b"newOwner".to_vec()],
        );
        let info = token_info(classifier().process_event(&event, &test_context()));

        assert_eq!(info.kind, TokenEventKind::TransferOwnership);
        assert_eq!(info.current_owner, "6e65774f776e6572");
        assert_eq!(info.owner_entry.address, "6e65774f776e6572");
        assert_eq!(info.issuer, "61646472");
        assert_eq!(info.num_decimals, None);
    }

    #[test]
    fn change_to_dynamic_sets_flag() {
        let event = EventRecord::new(
            b"addr".to_vec(),
            CHANGE_TO_DYNAMIC,
            vec![b"MYTOKEN-abcd".to_vec(), b"my-token".to_vec(), b"MYTOKEN".to_vec(), b"DynamicMetaDCDT".to_vec()],
        );
        let info = token_info(classifier().process_event(&event, &test_context()));
        assert!(info.change_to_dynamic);
        assert_eq!(info.kind, TokenEventKind::Change);
    }

    #[test]
    fn malformed_events_are_swallowed() {
        let short = EventRecord::new(b"addr".to_vec(), ISSUE, vec![b"T-1".to_vec()]);
        assert_eq!(classifier().process_event(&short, &test_context()), Outcome::swallowed());

        let empty_token = EventRecord::new(
            b"addr".to_vec(),
            ISSUE,
            vec![vec![], b"n".to_vec(), b"T".to_vec(), b"FungibleDCDT".to_vec()],
        );
        assert_eq!(classifier().process_event(&empty_token, &test_context()), Outcome::swallowed());
    }

    #[test]
    fn unknown_identifier_is_not_applicable() {
        let event = EventRecord::new(b"addr".to_vec(), "random", vec![]);
        assert_eq!(classifier().process_event(&event, &test_context()), Outcome::NotApplicable);
    }
}
