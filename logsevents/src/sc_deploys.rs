//! Contract deployments, upgrades and ownership changes.

use std::sync::Arc;

use shardex_types::{AddressCodec, EventRecord};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::{Delta, OwnerChange, OwnerData, ScDeployInfo, ScUpgrade};
use crate::identifiers::{CHANGE_OWNER_ADDRESS, SC_DEPLOY, SC_UPGRADE};

const MIN_TOPICS_DEPLOY: usize = 2;

/// Deploy/upgrade topics: `[contract, deployer, code hash?]`.
/// `ChangeOwnerAddress` is emitted by the contract itself: the event
/// address is the contract and `[0]` the new owner.
pub struct ScDeploysClassifier {
    codec: Arc<dyn AddressCodec>,
}

impl ScDeploysClassifier {
    pub fn new(codec: Arc<dyn AddressCodec>) -> Self {
        Self { codec }
    }

    fn change_owner(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome {
        let contract = self.codec.encode_silent(&event.address);
        let owner = event
            .topic(0)
            .map(|t| self.codec.encode_silent(t))
            .unwrap_or_default();
        if contract.is_empty() || owner.is_empty() {
            return Outcome::swallowed();
        }
        Outcome::single(Delta::OwnerChanged(OwnerChange {
            contract,
            owner: OwnerData {
                address: owner,
                timestamp: ctx.timestamp,
                tx_hash: ctx.tx_hash.to_string(),
            },
        }))
    }
}

impl EventClassifier for ScDeploysClassifier {
    fn name(&self) -> &'static str {
        "sc-deploys"
    }

    fn process_event(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome {
        let id = event.identifier.as_str();
        if id == CHANGE_OWNER_ADDRESS {
            return self.change_owner(event, ctx);
        }
        if id != SC_DEPLOY && id != SC_UPGRADE {
            return Outcome::NotApplicable;
        }

        let topics = &event.topics;
        if topics.len() < MIN_TOPICS_DEPLOY {
            return Outcome::swallowed();
        }
        let contract = self.codec.encode_silent(&topics[0]);
        let creator = self.codec.encode_silent(&topics[1]);
        if contract.is_empty() || creator.is_empty() {
            return Outcome::swallowed();
        }
        let code_hash = event.topic(2).map(hex::encode).unwrap_or_default();

        let delta = if id == SC_DEPLOY {
            Delta::ContractDeployed(ScDeployInfo {
                contract,
                creator,
                code_hash,
                tx_hash: ctx.tx_hash.to_string(),
                timestamp: ctx.timestamp,
            })
        } else {
            Delta::ContractUpgraded(ScUpgrade {
                contract,
                upgrader: creator,
                code_hash,
                tx_hash: ctx.tx_hash.to_string(),
                timestamp: ctx.timestamp,
            })
        };
        Outcome::single(delta)
    }
}
