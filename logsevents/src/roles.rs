//! Role grants and token property upgrades.

use std::collections::BTreeMap;
use std::sync::Arc;

use shardex_types::convert::bytes_to_bool;
use shardex_types::{AddressCodec, EventRecord};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::{Delta, PropertiesData, RoleData};
use crate::identifiers::*;

const MIN_TOPICS_ROLES: usize = 4;
const FIRST_PROPERTY_TOPIC: usize = 2;

/// Role topics: `[token, nonce, value, role...]`, the account being the
/// event address. Property topics: `[token, nonce, (name, bool)...]`.
pub struct RolesClassifier {
    codec: Arc<dyn AddressCodec>,
}

pub(crate) fn valid_roles(roles: &[Vec<u8>]) -> bool {
    roles.iter().all(|r| r.starts_with(ROLE_PREFIX.as_bytes()))
}

impl RolesClassifier {
    pub fn new(codec: Arc<dyn AddressCodec>) -> Self {
        Self { codec }
    }

    fn properties(token: String, topics: &[Vec<u8>]) -> Outcome {
        let properties: BTreeMap<String, bool> = topics
            .chunks_exact(2)
            .map(|pair| (String::from_utf8_lossy(&pair[0]).into_owned(), bytes_to_bool(&pair[1])))
            .collect();
        if properties.is_empty() {
            return Outcome::swallowed();
        }
        Outcome::single(Delta::Properties(PropertiesData { token, properties }))
    }
}

impl EventClassifier for RolesClassifier {
    fn name(&self) -> &'static str {
        "roles"
    }

    fn process_event(&self, event: &EventRecord, _ctx: &EventContext<'_>) -> Outcome {
        let id = event.identifier.as_str();
        if !matches!(id, SET_ROLE | UNSET_ROLE | NFT_CREATE_ROLE_TRANSFER | UPGRADE_PROPERTIES) {
            return Outcome::NotApplicable;
        }

        let topics = &event.topics;
        if topics.len() < MIN_TOPICS_ROLES {
            return Outcome::swallowed();
        }
        let token = String::from_utf8_lossy(&topics[0]).into_owned();

        if id == UPGRADE_PROPERTIES {
            return Self::properties(token, &topics[FIRST_PROPERTY_TOPIC..]);
        }

        let address = self.codec.encode_silent(&event.address);
        if address.is_empty() {
            return Outcome::swallowed();
        }

        if id == NFT_CREATE_ROLE_TRANSFER {
            return Outcome::single(Delta::Role(RoleData {
                role: ROLE_NFT_CREATE.to_string(),
                token,
                address,
                set: bytes_to_bool(&topics[3]),
            }));
        }

        let roles = &topics[3..];
        if !valid_roles(roles) {
            return Outcome::swallowed();
        }
        let set = id == SET_ROLE;
        Outcome::Processed(
            roles
                .iter()
                .map(|role| {
                    Delta::Role(RoleData {
                        role: String::from_utf8_lossy(role).into_owned(),
                        token: token.clone(),
                        address: address.clone(),
                        set,
                    })
                })
                .collect(),
        )
    }
}
