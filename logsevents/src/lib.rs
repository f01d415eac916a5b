//! Log and event processing for the shard event indexer.
//!
//! Raw events are routed through a fixed, ordered list of classifiers:
//! - **Issue**: token issuance, type changes, ownership transfer
//! - **NFTs**: NFT creation and supply removal (burn, wipe)
//! - **NFT properties**: attribute, URI, freeze, pause and metadata changes
//! - **Roles**: role grants and property upgrades
//! - **SC deploys**: deployments, upgrades and contract ownership changes
//! - **Delegators**: stake changes on delegation contracts
//! - **Informative**: transaction completion and error signals
//!
//! Each classifier turns one event into typed [`Delta`]s. The
//! [`DispatchRegistry`] folds deltas into [`BlockAccumulators`], which
//! yield one write per touched entity when the block is flushed.

pub mod accumulators;
pub mod classifier;
pub mod context;
pub mod delegators;
pub mod delta;
pub mod identifiers;
pub mod informative;
pub mod issue;
pub mod nft_properties;
pub mod nfts;
pub mod registry;
pub mod roles;
pub mod sc_deploys;
pub mod status;
pub mod writes;

pub use accumulators::BlockAccumulators;
pub use classifier::{EventClassifier, Outcome};
pub use context::EventContext;
pub use delta::Delta;
pub use registry::{DispatchRegistry, EventStat};
pub use status::TxHashStatusInfo;
