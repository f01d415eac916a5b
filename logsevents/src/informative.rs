//! Completion and error signals for transaction status.

use shardex_types::{EventRecord, StatusInfo};

use crate::classifier::{EventClassifier, Outcome};
use crate::context::EventContext;
use crate::delta::Delta;
use crate::identifiers::{COMPLETED_TX_EVENT, INTERNAL_VM_ERRORS, SIGNAL_ERROR, WRITE_LOG};

/// Signals are attributed to the original transaction of the log.
#[derive(Default)]
pub struct InformativeClassifier;

impl EventClassifier for InformativeClassifier {
    fn name(&self) -> &'static str {
        "informative"
    }

    fn process_event(&self, event: &EventRecord, ctx: &EventContext<'_>) -> Outcome {
        let info = match event.identifier.as_str() {
            COMPLETED_TX_EVENT | WRITE_LOG => StatusInfo::completed(),
            SIGNAL_ERROR | INTERNAL_VM_ERRORS => StatusInfo::failed(),
            _ => return Outcome::NotApplicable,
        };
        Outcome::single(Delta::Status {
            tx_hash: ctx.original_tx_hash.to_string(),
            info,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::test_context;

    #[test]
    fn error_and_completion_signals() {
        let mut ctx = test_context();
        ctx.original_tx_hash = "aabb";

        let outcome = InformativeClassifier.process_event(&EventRecord::new(vec![], SIGNAL_ERROR, vec![]), &ctx);
        assert_eq!(
            outcome,
            Outcome::single(Delta::Status { tx_hash: "aabb".into(), info: StatusInfo::failed() })
        );

        let outcome = InformativeClassifier.process_event(&EventRecord::new(vec![], WRITE_LOG, vec![]), &ctx);
        assert_eq!(
            outcome,
            Outcome::single(Delta::Status { tx_hash: "aabb".into(), info: StatusInfo::completed() })
        );
    }

    #[test]
    fn other_identifiers_are_not_applicable() {
        let outcome = InformativeClassifier.process_event(&EventRecord::new(vec![], "transfer", vec![]), &test_context());
        assert_eq!(outcome, Outcome::NotApplicable);
    }
}
