//! NFT creation and supply removal.

use std::sync::Arc;
use tracing::debug;

use shardex_types::convert::{bytes_to_nonce, bytes_to_u128, nft_identifier};
use shardex_types::{AddressCodec, EventRecord, MetadataCodec};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::{Delta, NftInfo, NftMetadata, SupplyChange, SupplyKind};
use crate::identifiers::{NFT_BURN, NFT_CREATE, WIPE};

const MIN_TOPICS: usize = 3;
const CREATE_TOPICS: usize = 4;

/// Topics:
/// - `[0]` collection
/// - `[1]` nonce
/// - `[2]` value
/// - `[3]` serialized token (create) or wiped account (wipe)
pub struct NftsClassifier {
    codec: Arc<dyn AddressCodec>,
    metadata_codec: Arc<dyn MetadataCodec>,
}

impl NftsClassifier {
    pub fn new(codec: Arc<dyn AddressCodec>, metadata_codec: Arc<dyn MetadataCodec>) -> Self {
        Self {
            codec,
            metadata_codec,
        }
    }
}

impl EventClassifier for NftsClassifier {
    fn name(&self) -> &'static str {
        "nfts"
    }

    fn process_event(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome {
        let kind = match event.identifier.as_str() {
            NFT_CREATE => None,
            NFT_BURN => Some(SupplyKind::Burn),
            WIPE => Some(SupplyKind::Wipe),
            _ => return Outcome::NotApplicable,
        };

        let topics = &event.topics;
        if topics.len() < MIN_TOPICS {
            return Outcome::swallowed();
        }

        let Some(nonce) = bytes_to_nonce(&topics[1]).filter(|nonce| *nonce > 0) else {
            return Outcome::NotApplicable;
        };

        if self.codec.encode_silent(&event.address).is_empty() {
            return Outcome::swallowed();
        }

        let token = String::from_utf8_lossy(&topics[0]).into_owned();
        let identifier = nft_identifier(&token, nonce);

        if let Some(kind) = kind {
            let Some(value) = bytes_to_u128(&topics[2]) else {
                return Outcome::swallowed();
            };
            return Outcome::single(Delta::Supply(SupplyChange {
                kind,
                identifier,
                token,
                nonce,
                value,
                timestamp: ctx.timestamp,
            }));
        }

        if topics.len() < CREATE_TOPICS {
            return Outcome::swallowed();
        }
        let digital_token = match self.metadata_codec.decode_token(&topics[3]) {
            Ok(t) => t,
            Err(err) => {
                debug!(identifier = %identifier, error = %err, "cannot decode created token");
                return Outcome::swallowed();
            }
        };

        Outcome::single(Delta::NftCreated(NftInfo {
            identifier,
            token,
            nonce,
            timestamp: ctx.timestamp,
            data: digital_token
                .token_meta_data
                .as_ref()
                .map(|meta| NftMetadata::from_raw(meta, self.codec.as_ref())),
        }))
    }
}
