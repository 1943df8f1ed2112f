/// Errors produced by ledger operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    #[error("invalid reconciliation status '{value}'; expected one of: {allowed}")]
    InvalidStatus { value: String, allowed: String },

    #[error("ledger is frozen; no further entries can be appended")]
    Frozen,

    #[error("no ledger entry with seq {0}")]
    UnknownEntry(u64),

    #[error("serialization error: {0}")]
    Serialization(String),
}
