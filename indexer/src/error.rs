use std::fmt;

use thiserror::Error;

use shardex_store::StoreError;

#[derive(Debug, Error)]
pub enum IndexerError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("config error: {0}")]
    Config(String),

    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    #[error("flush thread pool error: {0}")]
    ThreadPool(String),

    #[error(transparent)]
    Rollback(#[from] RollbackError),
}

/// Independent parts of a block revert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RollbackStep {
    Block,
    MiniBlocks,
    Transactions,
    AccountsDcdt,
}

impl fmt::Display for RollbackStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Block => "block",
            Self::MiniBlocks => "miniblocks",
            Self::Transactions => "transactions",
            Self::AccountsDcdt => "accounts dcdt",
        };
        f.write_str(name)
    }
}

/// Every rollback step that failed, with its cause. The other steps ran.
#[derive(Debug, Error)]
#[error("rollback failed: {}", describe(.failures))]
pub struct RollbackError {
    pub failures: Vec<(RollbackStep, StoreError)>,
}

impl RollbackError {
    pub fn failed_steps(&self) -> Vec<RollbackStep> {
        self.failures.iter().map(|(step, _)| *step).collect()
    }
}

fn describe(failures: &[(RollbackStep, StoreError)]) -> String {
    failures
        .iter()
        .map(|(step, err)| format!("{}: {}", step, err))
        .collect::<Vec<_>>()
        .join("; ")
}
