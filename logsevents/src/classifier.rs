//! The classifier contract.

use shardex_types::EventRecord;

use crate::context::EventContext;
use crate::delta::Delta;

#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The identifier is not in this classifier's vocabulary.
    NotApplicable,
    /// The event was consumed. An empty list means it was malformed and
    /// deliberately ignored.
    Processed(Vec<Delta>),
}

impl Outcome {
    pub fn swallowed() -> Self {
        Self::Processed(Vec::new())
    }

    pub fn single(delta: Delta) -> Self {
        Self::Processed(vec![delta])
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed(_))
    }

    /// Deltas of a processed event; empty otherwise.
    pub fn deltas(&self) -> &[Delta] {
        match self {
            Self::Processed(deltas) => deltas,
            Self::NotApplicable => &[],
        }
    }
}

/// Turns one raw event into typed deltas.
///
/// Implementations own a fixed set of identifiers, hold no per-block state
/// and never fail: malformed events are swallowed.
pub trait EventClassifier: Send + Sync {
    fn name(&self) -> &'static str;

    fn process_event(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome;
}
