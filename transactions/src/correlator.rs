//! Correlation of transactions with their smart contract results.
//!
//! A pass holds whatever one shard block delivered: transactions, SCRs of
//! transactions executed elsewhere, or both. SCRs are grouped by their
//! original transaction hash. Refunds whose transaction is in the pass are
//! folded into an absolute fee; the others become relative adjustments
//! that the store applies to whatever it holds for the transaction.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::debug;

use shardex_store::{FeeWrite, Refund};
use shardex_types::convert::{bytes_to_field, BalanceConverter};
use shardex_types::{
    AddressCodec, Body, Header, MiniBlockType, ScrInfo, StatusInfo, TransactionPool, TxInfo,
};

use crate::data_field::DataFieldParser;
use crate::records::{ScResultRecord, TransactionRecord};

/// Data of an SCR returning unused gas: `@` followed by hex `ok`.
const REFUND_DATA: &[u8] = b"@6f6b";

pub const STATUS_PENDING: &str = "pending";
pub const STATUS_INVALID: &str = "invalid";

/// Status contribution of the pass holding a transaction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassStatus {
    /// Source shard of a cross-shard transaction; execution is elsewhere.
    Pending,
    /// Executed in this pass.
    Executed,
    /// Included in an invalid miniblock.
    Invalid,
}

impl PassStatus {
    /// Latch signal for passes that decide the status.
    pub fn signal(&self) -> Option<StatusInfo> {
        match self {
            Self::Pending => None,
            Self::Executed => Some(StatusInfo::new(false, false, "success")),
            Self::Invalid => Some(StatusInfo::new(false, true, STATUS_INVALID)),
        }
    }
}

/// A transaction present in the pass.
#[derive(Clone, Debug, PartialEq)]
pub struct CorrelatedTx {
    pub record: TransactionRecord,
    /// Always [`FeeWrite::Absolute`].
    pub fee: FeeWrite,
    pub status: PassStatus,
    /// Latched completion and error signals of the pass's logs.
    pub signal: Option<StatusInfo>,
}

/// Everything a pass contributes to a transaction it does not hold.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ForeignTxUpdate {
    pub has_sc_results: bool,
    /// Refunding SCR hash → refund.
    pub refunds: BTreeMap<String, Refund>,
    pub signal: Option<StatusInfo>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CorrelatedBlock {
    pub transactions: Vec<CorrelatedTx>,
    pub scresults: Vec<ScResultRecord>,
    /// Keyed by original transaction hash.
    pub foreign: BTreeMap<String, ForeignTxUpdate>,
    pub denomination: u32,
}

#[derive(Clone, Copy, Debug)]
struct MiniBlockRef<'a> {
    hash: &'a [u8],
    sender_shard: u32,
    receiver_shard: u32,
    mb_type: MiniBlockType,
}

pub struct TransactionCorrelator {
    codec: Arc<dyn AddressCodec>,
    parser: DataFieldParser,
    balance_converter: BalanceConverter,
    denomination: u32,
    self_shard_id: u32,
}

impl TransactionCorrelator {
    pub fn new(codec: Arc<dyn AddressCodec>, denomination: u32, self_shard_id: u32) -> Self {
        Self {
            parser: DataFieldParser::new(codec.clone()),
            codec,
            balance_converter: BalanceConverter::new(denomination),
            denomination,
            self_shard_id,
        }
    }

    /// Correlates one pass. `signals` are the latched log statuses of the
    /// pass keyed by original transaction hash.
    pub fn correlate(
        &self,
        header: &Header,
        body: &Body,
        pool: &TransactionPool,
        signals: &BTreeMap<String, StatusInfo>,
    ) -> CorrelatedBlock {
        let mini_blocks = index_mini_blocks(body);

        let mut refunds_by_tx: BTreeMap<String, BTreeMap<String, Refund>> = BTreeMap::new();
        let mut txs_with_results: BTreeSet<String> = BTreeSet::new();
        let mut scresults = Vec::with_capacity(pool.smart_contract_results.len());

        for (hash, info) in &pool.smart_contract_results {
            let original = info.scr.original_tx_hash_hex();
            if let Some(refund) = refund_of(info) {
                debug!(scr = %hash, tx = %original, fee = %refund.fee, "refund detected");
                refunds_by_tx
                    .entry(original.clone())
                    .or_default()
                    .insert(hash.clone(), refund);
            }
            txs_with_results.insert(original);
            scresults.push(self.scr_record(hash, info, header, mini_blocks.get(hash).copied()));
        }

        let mut transactions = Vec::with_capacity(pool.transactions.len());
        for (hash, info) in &pool.transactions {
            let mb = mini_blocks.get(hash).copied();
            let refunds = refunds_by_tx.remove(hash).unwrap_or_default();
            let mut record = self.tx_record(hash, info, header, mb);
            record.has_sc_results = txs_with_results.remove(hash);

            transactions.push(CorrelatedTx {
                record,
                fee: self.absolute_fee(info, refunds),
                status: self.pass_status(mb),
                signal: signals.get(hash).cloned(),
            });
        }

        let mut foreign: BTreeMap<String, ForeignTxUpdate> = BTreeMap::new();
        for hash in txs_with_results {
            foreign.entry(hash).or_default().has_sc_results = true;
        }
        for (hash, refunds) in refunds_by_tx {
            foreign.entry(hash).or_default().refunds = refunds;
        }
        for (hash, signal) in signals {
            if !pool.transactions.contains_key(hash) {
                foreign.entry(hash.clone()).or_default().signal = Some(signal.clone());
            }
        }

        CorrelatedBlock {
            transactions,
            scresults,
            foreign,
            denomination: self.denomination,
        }
    }

    /// Fee of the transaction net of the refunds delivered with it.
    fn absolute_fee(&self, info: &TxInfo, refunds: BTreeMap<String, Refund>) -> FeeWrite {
        let (paid_fee, paid_gas) = if info.fee_info.initial_paid_fee > 0 {
            (info.fee_info.initial_paid_fee, info.transaction.gas_limit)
        } else {
            (info.fee_info.fee, info.fee_info.gas_used)
        };
        let (refunded_fee, refunded_gas) = refunds.values().fold((0u128, 0u64), |(f, g), r| {
            (f.saturating_add(r.fee), g.saturating_add(r.gas_refunded))
        });

        FeeWrite::Absolute {
            fee: paid_fee.saturating_sub(refunded_fee),
            gas_used: paid_gas.saturating_sub(refunded_gas),
            refunds,
            denomination: self.denomination,
        }
    }

    fn pass_status(&self, mb: Option<MiniBlockRef<'_>>) -> PassStatus {
        match mb {
            Some(mb) if mb.mb_type == MiniBlockType::InvalidBlock => PassStatus::Invalid,
            Some(mb)
                if mb.sender_shard != mb.receiver_shard
                    && mb.sender_shard == self.self_shard_id =>
            {
                PassStatus::Pending
            }
            _ => PassStatus::Executed,
        }
    }

    fn shards(&self, mb: Option<MiniBlockRef<'_>>) -> (u32, u32) {
        mb.map_or((self.self_shard_id, self.self_shard_id), |mb| {
            (mb.sender_shard, mb.receiver_shard)
        })
    }

    fn tx_record(
        &self,
        hash: &str,
        info: &TxInfo,
        header: &Header,
        mb: Option<MiniBlockRef<'_>>,
    ) -> TransactionRecord {
        let tx = &info.transaction;
        let (sender_shard, receiver_shard) = self.shards(mb);
        let parsed = self.parser.parse(&tx.data, &tx.sender, &tx.receiver);

        TransactionRecord {
            hash: hash.to_string(),
            mini_block_hash: mb.map(|mb| hex::encode(mb.hash)).unwrap_or_default(),
            nonce: tx.nonce,
            round: header.round,
            value: tx.value.to_string(),
            value_num: self.balance_converter.to_float(tx.value),
            receiver: self.codec.encode_silent(&tx.receiver),
            sender: self.codec.encode_silent(&tx.sender),
            receiver_shard,
            sender_shard,
            gas_price: tx.gas_price,
            gas_limit: tx.gas_limit,
            initial_paid_fee: info.fee_info.initial_paid_fee.to_string(),
            data: bytes_to_field(&tx.data),
            signature: hex::encode(&tx.signature),
            timestamp: header.timestamp,
            search_order: info.execution_order,
            has_sc_results: false,
            relayer: self.codec.encode_silent(&tx.relayer),
            guardian: self.codec.encode_silent(&tx.guardian),
            version: tx.version,
            operation: parsed.operation,
            function: parsed.function,
            tokens: parsed.tokens,
            dcdt_values: parsed.dcdt_values,
            receivers: parsed.receivers,
        }
    }

    fn scr_record(
        &self,
        hash: &str,
        info: &ScrInfo,
        header: &Header,
        mb: Option<MiniBlockRef<'_>>,
    ) -> ScResultRecord {
        let scr = &info.scr;
        let (sender_shard, receiver_shard) = self.shards(mb);
        let parsed = self.parser.parse(&scr.data, &scr.sender, &scr.receiver);

        ScResultRecord {
            hash: hash.to_string(),
            mini_block_hash: mb.map(|mb| hex::encode(mb.hash)).unwrap_or_default(),
            nonce: scr.nonce,
            gas_limit: scr.gas_limit,
            gas_price: scr.gas_price,
            value: scr.value.to_string(),
            value_num: self.balance_converter.to_float(scr.value),
            sender: self.codec.encode_silent(&scr.sender),
            receiver: self.codec.encode_silent(&scr.receiver),
            sender_shard,
            receiver_shard,
            relayer: self.codec.encode_silent(&scr.relayer),
            relayed_value: if scr.relayed_value > 0 {
                scr.relayed_value.to_string()
            } else {
                String::new()
            },
            code: bytes_to_field(&scr.code),
            data: bytes_to_field(&scr.data),
            prev_tx_hash: hex::encode(&scr.prev_tx_hash),
            original_tx_hash: scr.original_tx_hash_hex(),
            call_type: scr.call_type.to_string(),
            return_message: bytes_to_field(&scr.return_message),
            original_sender: self.codec.encode_silent(&scr.original_sender),
            timestamp: header.timestamp,
            initial_tx_fee: info.fee_info.fee.to_string(),
            operation: parsed.operation,
            function: parsed.function,
            tokens: parsed.tokens,
            dcdt_values: parsed.dcdt_values,
            receivers: parsed.receivers,
        }
    }
}

fn index_mini_blocks(body: &Body) -> BTreeMap<String, MiniBlockRef<'_>> {
    let mut index = BTreeMap::new();
    for mb in &body.mini_blocks {
        let entry = MiniBlockRef {
            hash: &mb.hash,
            sender_shard: mb.sender_shard_id,
            receiver_shard: mb.receiver_shard_id,
            mb_type: mb.mb_type,
        };
        for hash in &mb.tx_hashes {
            index.insert(hex::encode(hash), entry);
        }
    }
    index
}

/// The refund carried by an SCR, if it returns gas to the sender.
pub fn refund_of(info: &ScrInfo) -> Option<Refund> {
    let data = info.scr.data.as_slice();
    let is_refund = info.fee_info.gas_refunded > 0
        || (info.fee_info.fee > 0 && (data.is_empty() || data == REFUND_DATA));
    is_refund.then_some(Refund {
        fee: info.fee_info.fee,
        gas_refunded: info.fee_info.gas_refunded,
    })
}
