//! Transaction execution status and the latch that merges status signals.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Execution status labels as persisted on transaction documents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Success,
    Pending,
    Fail,
    Invalid,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Pending => "pending",
            Self::Fail => "fail",
            Self::Invalid => "invalid",
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Completion/error state of a transaction hash.
///
/// Both flags only ever go from `false` to `true`. Once an error has been
/// latched, only another error signal may change `status`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusInfo {
    #[serde(default)]
    pub completed_event: bool,
    #[serde(default)]
    pub error_event: bool,
    #[serde(default)]
    pub status: String,
}

impl StatusInfo {
    pub fn new(completed_event: bool, error_event: bool, status: impl Into<String>) -> Self {
        Self {
            completed_event,
            error_event,
            status: status.into(),
        }
    }

    pub fn completed() -> Self {
        Self::new(true, false, TxStatus::Success.as_str())
    }

    pub fn failed() -> Self {
        Self::new(false, true, TxStatus::Fail.as_str())
    }

    /// Merge one incoming signal into the latched state.
    pub fn latch(&mut self, signal: &StatusInfo) {
        let was_error = self.error_event;
        self.completed_event |= signal.completed_event;
        self.error_event |= signal.error_event;

        if signal.error_event || !was_error {
            self.status = signal.status.clone();
        }
    }
}
