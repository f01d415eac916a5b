//! Index names.

pub const TRANSACTIONS: &str = "transactions";
pub const SCRESULTS: &str = "scresults";
pub const OPERATIONS: &str = "operations";
pub const TOKENS: &str = "tokens";
pub const DELEGATORS: &str = "delegators";
pub const SCDEPLOYS: &str = "scdeploys";
pub const ACCOUNTS_DCDT: &str = "accountsdcdt";
pub const BLOCKS: &str = "blocks";
pub const MINIBLOCKS: &str = "miniblocks";
