//! The block indexer facade.

use std::sync::Arc;

use rayon::{ThreadPool, ThreadPoolBuilder};
use tracing::{debug, info};

use shardex_logsevents::writes::{contract_writes, delegator_writes};
use shardex_logsevents::DispatchRegistry;
use shardex_store::indices::{
    ACCOUNTS_DCDT, BLOCKS, DELEGATORS, MINIBLOCKS, OPERATIONS, SCDEPLOYS, SCRESULTS, TRANSACTIONS,
};
use shardex_store::DocumentStore;
use shardex_transactions::{build_writes, TransactionCorrelator};
use shardex_types::convert::BalanceConverter;
use shardex_types::{AddressCodec, Body, Header, MetadataCodec, OutportBlock};
use shardex_utils::{CounterKind, Counters};

use crate::accounts::AccountsDcdtWriter;
use crate::blocks::{block_write, mini_block_writes};
use crate::config::IndexerConfig;
use crate::flush::{flush_batch, FlushReport, WriteBatch};
use crate::rollback::RollbackEngine;
use crate::tokens::queue_token_writes;
use crate::IndexerError;

/// Block and flush totals of one indexer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexerStat {
    BlocksSaved,
    BlocksReverted,
    DocumentsWritten,
    /// Records left out of a flush because they could not be serialized.
    RecordsSkipped,
}

impl CounterKind for IndexerStat {
    const ALL: &'static [Self] = &[
        Self::BlocksSaved,
        Self::BlocksReverted,
        Self::DocumentsWritten,
        Self::RecordsSkipped,
    ];

    fn name(self) -> &'static str {
        match self {
            Self::BlocksSaved => "blocks_saved",
            Self::BlocksReverted => "blocks_reverted",
            Self::DocumentsWritten => "documents_written",
            Self::RecordsSkipped => "records_skipped",
        }
    }
}

/// Turns decoded blocks into document writes.
///
/// Holds no per-block state: every call builds fresh accumulators, so one
/// indexer may serve several blocks concurrently.
pub struct BlockIndexer {
    config: IndexerConfig,
    store: Arc<dyn DocumentStore>,
    address_codec: Arc<dyn AddressCodec>,
    registry: DispatchRegistry,
    correlator: TransactionCorrelator,
    flush_pool: ThreadPool,
    stats: Counters<IndexerStat>,
}

impl BlockIndexer {
    pub fn builder(config: IndexerConfig) -> BlockIndexerBuilder {
        BlockIndexerBuilder::new(config)
    }

    pub fn config(&self) -> &IndexerConfig {
        &self.config
    }

    pub fn stats(&self) -> &Counters<IndexerStat> {
        &self.stats
    }

    pub fn registry(&self) -> &DispatchRegistry {
        &self.registry
    }

    /// Classifies, correlates and flushes one block.
    ///
    /// Store failures abort the flush and are returned; records that cannot
    /// be serialized are left out and listed in the report.
    pub fn save_block(&self, block: &OutportBlock) -> Result<FlushReport, IndexerError> {
        let header = &block.header;
        let accumulators = self.registry.process_logs(&block.pool, header.timestamp);
        let correlated = self.correlator.correlate(
            header,
            &block.body,
            &block.pool,
            accumulators.statuses.all_records(),
        );
        let records = build_writes(&correlated);

        let mut skipped = records.skipped;
        let mut batch = WriteBatch::new();
        batch.extend(TRANSACTIONS, records.transactions);
        batch.extend(SCRESULTS, records.scresults);
        batch.extend(OPERATIONS, records.operations);

        queue_token_writes(self.store.as_ref(), &accumulators, &mut batch, &mut skipped)?;
        batch.extend(DELEGATORS, delegator_writes(&accumulators));
        batch.extend(SCDEPLOYS, contract_writes(&accumulators));

        let accounts = AccountsDcdtWriter {
            codec: self.address_codec.as_ref(),
            balance_converter: BalanceConverter::new(self.config.denomination),
            timestamp: header.timestamp,
            shard_id: header.shard_id,
        };
        batch.extend(ACCOUNTS_DCDT, accounts.writes(&block.altered_accounts, &mut skipped));

        batch.push(BLOCKS, block_write(header, &block.body));
        batch.extend(MINIBLOCKS, mini_block_writes(header, &block.body));

        debug!(documents = batch.len(), "flushing block");
        let mut report = flush_batch(
            self.store.as_ref(),
            &self.flush_pool,
            batch,
            self.config.bulk_request_max_size,
        )?;
        skipped.append(&mut report.skipped);
        report.skipped = skipped;

        self.stats.increment(IndexerStat::BlocksSaved);
        self.stats.add(IndexerStat::DocumentsWritten, report.total_written() as u64);
        self.stats.add(IndexerStat::RecordsSkipped, report.skipped.len() as u64);
        info!(
            hash = %header.hash_hex(),
            nonce = header.nonce,
            shard = header.shard_id,
            written = report.total_written(),
            skipped = report.skipped.len(),
            "block saved"
        );
        Ok(report)
    }

    /// Removes what [`BlockIndexer::save_block`] wrote for this block.
    pub fn revert_block(&self, header: &Header, body: &Body) -> Result<(), IndexerError> {
        self.rollback().revert_block(header, body)?;
        self.stats.increment(IndexerStat::BlocksReverted);
        Ok(())
    }

    pub fn remove_accounts_dcdt(&self, timestamp: u64, shard_id: u32) -> Result<u64, IndexerError> {
        Ok(self.rollback().remove_accounts_dcdt(timestamp, shard_id)?)
    }

    fn rollback(&self) -> RollbackEngine<'_> {
        RollbackEngine::new(self.store.as_ref(), self.config.denomination)
    }
}

/// Collects the collaborators of a [`BlockIndexer`]; [`build`] fails on
/// the first one missing.
///
/// [`build`]: BlockIndexerBuilder::build
pub struct BlockIndexerBuilder {
    config: IndexerConfig,
    store: Option<Arc<dyn DocumentStore>>,
    address_codec: Option<Arc<dyn AddressCodec>>,
    metadata_codec: Option<Arc<dyn MetadataCodec>>,
}

impl BlockIndexerBuilder {
    pub fn new(config: IndexerConfig) -> Self {
        Self {
            config,
            store: None,
            address_codec: None,
            metadata_codec: None,
        }
    }

    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn address_codec(mut self, codec: Arc<dyn AddressCodec>) -> Self {
        self.address_codec = Some(codec);
        self
    }

    pub fn metadata_codec(mut self, codec: Arc<dyn MetadataCodec>) -> Self {
        self.metadata_codec = Some(codec);
        self
    }

    pub fn build(self) -> Result<BlockIndexer, IndexerError> {
        self.config.validate()?;
        let store = self.store.ok_or(IndexerError::MissingCollaborator("document store"))?;
        let address_codec = self
            .address_codec
            .ok_or(IndexerError::MissingCollaborator("address codec"))?;
        let metadata_codec = self
            .metadata_codec
            .ok_or(IndexerError::MissingCollaborator("metadata codec"))?;

        let flush_pool = ThreadPoolBuilder::new()
            .num_threads(self.config.max_concurrent_flushes)
            .thread_name(|i| format!("shardex-flush-{}", i))
            .build()
            .map_err(|e| IndexerError::ThreadPool(e.to_string()))?;

        let config = self.config;
        Ok(BlockIndexer {
            registry: DispatchRegistry::new(
                address_codec.clone(),
                metadata_codec,
                config.denomination,
                config.self_shard_id,
            ),
            correlator: TransactionCorrelator::new(
                address_codec.clone(),
                config.denomination,
                config.self_shard_id,
            ),
            stats: Counters::new(),
            config,
            store,
            address_codec,
            flush_pool,
        })
    }
}
