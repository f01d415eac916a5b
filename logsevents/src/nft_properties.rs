//! Property changes of existing NFTs, and collection pause/unpause.

use std::sync::Arc;
use tracing::debug;

use shardex_types::convert::{bytes_to_field, bytes_to_nonce, bytes_to_u64, nft_identifier};
use shardex_types::{AddressCodec, EventRecord, MetadataCodec};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::{Delta, NftDataUpdate, NftMetadata, NftMutation};
use crate::identifiers::*;

const MIN_TOPICS_UPDATE: usize = 4;

/// Topics:
/// - `[0]` collection
/// - `[1]` nonce
/// - `[2]` value
/// - `[3..]` new data (attributes, URIs, serialized token, royalties)
///
/// A pause event carries only the collection.
pub struct NftPropertiesClassifier {
    codec: Arc<dyn AddressCodec>,
    metadata_codec: Arc<dyn MetadataCodec>,
}

impl NftPropertiesClassifier {
    pub fn new(codec: Arc<dyn AddressCodec>, metadata_codec: Arc<dyn MetadataCodec>) -> Self {
        Self {
            codec,
            metadata_codec,
        }
    }

    fn handles(identifier: &str) -> bool {
        matches!(
            identifier,
            NFT_ADD_URI
                | NFT_UPDATE_ATTRIBUTES
                | FREEZE
                | UNFREEZE
                | PAUSE
                | UNPAUSE
                | METADATA_RECREATE
                | METADATA_UPDATE
                | SET_NEW_URIS
                | MODIFY_CREATOR
                | MODIFY_ROYALTIES
        )
    }

    fn pause_event(identifier: &str, token: String, caller: String) -> Outcome {
        let mutation = match identifier {
            PAUSE => NftMutation::Pause,
            UNPAUSE => NftMutation::UnPause,
            _ => return Outcome::swallowed(),
        };
        Outcome::single(Delta::NftUpdate(NftDataUpdate {
            identifier: token,
            address: caller,
            mutation,
        }))
    }

    fn decode_metadata(&self, identifier: &str, bytes: &[u8]) -> Option<NftMetadata> {
        match self.metadata_codec.decode_token(bytes) {
            Ok(token) => Some(
                token
                    .token_meta_data
                    .as_ref()
                    .map(|meta| NftMetadata::from_raw(meta, self.codec.as_ref()))
                    .unwrap_or_default(),
            ),
            Err(err) => {
                debug!(identifier, error = %err, "cannot decode metadata update");
                None
            }
        }
    }
}

fn uris(topics: &[Vec<u8>]) -> Vec<String> {
    topics
        .iter()
        .map(|u| bytes_to_field(u))
        .filter(|u| !u.is_empty())
        .collect()
}

impl EventClassifier for NftPropertiesClassifier {
    fn name(&self) -> &'static str {
        "nft-properties"
    }

    fn process_event(&self, event: &EventRecord, _ctx: &EventContext<'_>) -> Outcome {
        let id = event.identifier.as_str();
        if !Self::handles(id) {
            return Outcome::NotApplicable;
        }

        let caller = self.codec.encode_silent(&event.address);
        if caller.is_empty() {
            return Outcome::swallowed();
        }

        let topics = &event.topics;
        if topics.len() == 1 {
            let token = String::from_utf8_lossy(&topics[0]).into_owned();
            return Self::pause_event(id, token, caller);
        }

        let is_modify_creator = id == MODIFY_CREATOR && topics.len() == MIN_TOPICS_UPDATE - 1;
        if topics.len() < MIN_TOPICS_UPDATE && !is_modify_creator {
            return Outcome::swallowed();
        }

        let Some(nonce) = bytes_to_nonce(&topics[1]).filter(|nonce| *nonce > 0) else {
            return Outcome::NotApplicable;
        };
        let identifier = nft_identifier(&String::from_utf8_lossy(&topics[0]), nonce);

        let mutation = match id {
            NFT_UPDATE_ATTRIBUTES => NftMutation::SetAttributes(topics[3].clone()),
            NFT_ADD_URI => NftMutation::AddUris(uris(&topics[3..])),
            SET_NEW_URIS => NftMutation::SetUris(uris(&topics[3..])),
            FREEZE => NftMutation::Freeze,
            UNFREEZE => NftMutation::UnFreeze,
            METADATA_RECREATE | METADATA_UPDATE => {
                let Some(metadata) = self.decode_metadata(&identifier, &topics[3]) else {
                    return Outcome::swallowed();
                };
                if id == METADATA_RECREATE {
                    NftMutation::RecreateMetadata(metadata)
                } else {
                    NftMutation::UpdateMetadata(metadata)
                }
            }
            MODIFY_CREATOR => NftMutation::ModifyCreator(caller.clone()),
            MODIFY_ROYALTIES => {
                NftMutation::ModifyRoyalties(u32::try_from(bytes_to_u64(&topics[3])).unwrap_or(u32::MAX))
            }
            // pause/unpause with more than one topic
            _ => return Outcome::swallowed(),
        };

        Outcome::single(Delta::NftUpdate(NftDataUpdate {
            identifier,
            address: caller,
            mutation,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;
    use shardex_types::{DigitalToken, HexAddressCodec, JsonMetadataCodec, TokenMetaData};

    fn classifier() -> NftPropertiesClassifier {
        NftPropertiesClassifier::new(Arc::new(HexAddressCodec::new()), Arc::new(JsonMetadataCodec))
    }

    fn update(event: EventRecord) -> NftDataUpdate {
        match classifier().process_event(&event, &test_context()).deltas() {
            [Delta::NftUpdate(u)] => u.clone(),
            other => panic!("expected one update, got {:?}", other),
        }
    }

    fn event(identifier: &str, topics: Vec<Vec<u8>>) -> EventRecord {
        EventRecord::new(b"addr".to_vec(), identifier, topics)
    }

    #[test]
    fn add_uris() {
        let u = update(event(NFT_ADD_URI, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![], b"uri1".to_vec(), b"uri2".to_vec()]));
        assert_eq!(u.identifier, "TOUC-aaaa-01");
        assert_eq!(u.address, "61646472");
        assert_eq!(u.mutation, NftMutation::AddUris(vec!["uri1".into(), "uri2".into()]));
    }

    #[test]
    fn set_new_uris_replaces() {
        let u = update(event(SET_NEW_URIS, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![], b"uri".to_vec()]));
        assert_eq!(u.mutation, NftMutation::SetUris(vec!["uri".into()]));
    }

    #[test]
    fn update_attributes() {
        let u = update(event(NFT_UPDATE_ATTRIBUTES, vec![b"TOUC-aaaa".to_vec(), vec![14], vec![], b"tags:a".to_vec()]));
        assert_eq!(u.identifier, "TOUC-aaaa-0e");
        assert_eq!(u.mutation, NftMutation::SetAttributes(b"tags:a".to_vec()));
    }

    #[test]
    fn nonce_wider_than_64_bits_is_not_applicable() {
        let outcome = classifier().process_event(
            &event(NFT_ADD_URI, vec![b"TOUC-aaaa".to_vec(), vec![1; 9], vec![], b"uri".to_vec()]),
            &test_context(),
        );
        assert_eq!(outcome, Outcome::NotApplicable);
    }

    #[test]
    fn pause_with_single_topic_targets_collection() {
        let u = update(event(PAUSE, vec![b"TOUC-aaaa".to_vec()]));
        assert_eq!(u.identifier, "TOUC-aaaa");
        assert_eq!(u.mutation, NftMutation::Pause);

        let outcome = classifier().process_event(&event(FREEZE, vec![b"TOUC-aaaa".to_vec()]), &test_context());
        assert_eq!(outcome, Outcome::swallowed());
    }

    #[test]
    fn freeze_and_unfreeze() {
        let u = update(event(FREEZE, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![1], b"acct".to_vec()]));
        assert_eq!(u.mutation, NftMutation::Freeze);
        let u = update(event(UNFREEZE, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![1], b"acct".to_vec()]));
        assert_eq!(u.mutation, NftMutation::UnFreeze);
    }

    #[test]
    fn metadata_recreate_and_update() {
        let token = DigitalToken {
            token_meta_data: Some(TokenMetaData {
                name: b"new-name".to_vec(),
                royalties: 250,
                ..Default::default()
            }),
            ..Default::default()
        };
        let bytes = JsonMetadataCodec.encode_token(&token).expect("encode");
        let expected = NftMetadata {
            name: "new-name".into(),
            royalties: 250,
            ..Default::default()
        };

        let u = update(event(METADATA_RECREATE, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![], bytes.clone()]));
        assert_eq!(u.mutation, NftMutation::RecreateMetadata(expected.clone()));
        let u = update(event(METADATA_UPDATE, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![], bytes]));
        assert_eq!(u.mutation, NftMutation::UpdateMetadata(expected));
    }

    #[test]
    fn modify_creator_accepts_three_topics() {
        let u = update(event(MODIFY_CREATOR, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![]]));
        assert_eq!(u.mutation, NftMutation::ModifyCreator("61646472".into()));
    }

    #[test]
    fn modify_royalties() {
        let u = update(event(MODIFY_ROYALTIES, vec![b"TOUC-aaaa".to_vec(), vec![1], vec![], vec![0x01, 0xf4]]));
        assert_eq!(u.mutation, NftMutation::ModifyRoyalties(500));
    }

    #[test]
    fn zero_nonce_is_fungible() {
        let outcome = classifier().process_event(
            &event(NFT_ADD_URI, vec![b"TOUC-aaaa".to_vec(), vec![], vec![], b"uri".to_vec()]),
            &test_context(),
        );
        assert_eq!(outcome, Outcome::NotApplicable);
    }

    #[test]
    fn empty_caller_is_swallowed() {
        let e = EventRecord::new(Vec::new(), NFT_ADD_URI, vec![b"T".to_vec(), vec![1], vec![], b"u".to_vec()]);
        assert_eq!(classifier().process_event(&e, &test_context()), Outcome::swallowed());
    }

    #[test]
    fn too_few_topics_are_swallowed() {
        let outcome = classifier().process_event(&event(NFT_ADD_URI, vec![b"T".to_vec(), vec![1]]), &test_context());
        assert_eq!(outcome, Outcome::swallowed());
    }
}
