//! Transaction and smart contract result processing.
//!
//! - **Data field**: operation labels and token transfers from `data`
//! - **Correlator**: groups SCRs by original transaction, computes fees and
//!   refunds, and decides the pass status of each transaction
//! - **Writes**: transaction, SC result and operation documents

pub mod correlator;
pub mod data_field;
pub mod records;
pub mod writes;

pub use correlator::{CorrelatedBlock, CorrelatedTx, ForeignTxUpdate, PassStatus, TransactionCorrelator};
pub use data_field::{DataFieldParser, ParsedData};
pub use records::{ScResultRecord, TransactionRecord};
pub use writes::{build_writes, RecordWrites, SkippedRecord};
