//! Ordered dispatch of raw events to classifiers.

use std::sync::Arc;

use tracing::trace;

use shardex_types::convert::BalanceConverter;
use shardex_types::{AddressCodec, EventRecord, MetadataCodec, TransactionPool};
use shardex_utils::{CounterKind, Counters};

use crate::accumulators::BlockAccumulators;
use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::Delta;
use crate::delegators::DelegatorsClassifier;
use crate::informative::InformativeClassifier;
use crate::issue::IssueClassifier;
use crate::nft_properties::NftPropertiesClassifier;
use crate::nfts::NftsClassifier;
use crate::roles::RolesClassifier;
use crate::sc_deploys::ScDeploysClassifier;

/// What happened to each dispatched event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventStat {
    Seen,
    Processed,
    /// Claimed by a classifier that produced no delta.
    Swallowed,
    Unclaimed,
}

impl CounterKind for EventStat {
    const ALL: &'static [Self] = &[Self::Seen, Self::Processed, Self::Swallowed, Self::Unclaimed];

    fn name(self) -> &'static str {
        match self {
            Self::Seen => "events",
            Self::Processed => "events_processed",
            Self::Swallowed => "events_swallowed",
            Self::Unclaimed => "events_unclaimed",
        }
    }
}

/// Routes each event to the first classifier that reports it processed.
pub struct DispatchRegistry {
    classifiers: Vec<Box<dyn EventClassifier>>,
    balance_converter: BalanceConverter,
    self_shard_id: u32,
    stats: Counters<EventStat>,
}

impl DispatchRegistry {
    /// The standard classifier list.
    pub fn new(
        address_codec: Arc<dyn AddressCodec>,
        metadata_codec: Arc<dyn MetadataCodec>,
        denomination: u32,
        self_shard_id: u32,
    ) -> Self {
        let classifiers: Vec<Box<dyn EventClassifier>> = vec![
            Box::new(IssueClassifier::new(address_codec.clone())),
            Box::new(NftsClassifier::new(address_codec.clone(), metadata_codec.clone())),
            Box::new(NftPropertiesClassifier::new(address_codec.clone(), metadata_codec)),
            Box::new(RolesClassifier::new(address_codec.clone())),
            Box::new(ScDeploysClassifier::new(address_codec.clone())),
            Box::new(DelegatorsClassifier::new(address_codec)),
            Box::new(InformativeClassifier),
        ];
        Self::with_classifiers(classifiers, denomination, self_shard_id)
    }

    pub fn with_classifiers(
        classifiers: Vec<Box<dyn EventClassifier>>,
        denomination: u32,
        self_shard_id: u32,
    ) -> Self {
        Self {
            classifiers,
            balance_converter: BalanceConverter::new(denomination),
            self_shard_id,
            stats: Counters::new(),
        }
    }

    /// Classifier names in dispatch order.
    pub fn classifier_names(&self) -> Vec<&'static str> {
        self.classifiers.iter().map(|c| c.name()).collect()
    }

    pub fn stats(&self) -> &Counters<EventStat> {
        &self.stats
    }

    /// Runs every event of the pool's logs, in log then event order, and
    /// folds the resulting deltas into fresh accumulators.
    pub fn process_logs(&self, pool: &TransactionPool, timestamp: u64) -> BlockAccumulators {
        let mut accumulators = BlockAccumulators::new();

        for log in &pool.logs {
            let original_tx_hash = pool
                .smart_contract_results
                .get(&log.tx_hash)
                .map(|info| info.scr.original_tx_hash_hex())
                .unwrap_or_else(|| log.tx_hash.clone());
            let ctx = EventContext {
                tx_hash: &log.tx_hash,
                original_tx_hash: &original_tx_hash,
                log_address: &log.address,
                timestamp,
                self_shard_id: self.self_shard_id,
                balance_converter: self.balance_converter,
            };

            for event in &log.events {
                self.stats.increment(EventStat::Seen);
                match self.dispatch(event, &ctx) {
                    Some(deltas) if deltas.is_empty() => self.stats.increment(EventStat::Swallowed),
                    Some(deltas) => {
                        self.stats.increment(EventStat::Processed);
                        for delta in deltas {
                            accumulators.apply(delta);
                        }
                    }
                    None => {
                        self.stats.increment(EventStat::Unclaimed);
                        trace!(identifier = %event.identifier, tx_hash = %log.tx_hash, "no classifier for event");
                    }
                }
            }
        }

        accumulators
    }

    fn dispatch(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Option<Vec<Delta>> {
        self.classifiers
            .iter()
            .find_map(|classifier| match classifier.process_event(event, ctx) {
                Outcome::Processed(deltas) => {
                    trace!(classifier = classifier.name(), identifier = %event.identifier, deltas = deltas.len(), "event processed");
                    Some(deltas)
                }
                Outcome::NotApplicable => None,
            })
    }
}
