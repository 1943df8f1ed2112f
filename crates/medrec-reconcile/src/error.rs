use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("rule table error: {0}")]
    Rules(#[from] medrec_rules::RulesError),

    #[error("normalizer error: {0}")]
    Normalize(#[from] medrec_normalize::NormalizeError),

    #[error("safety error: {0}")]
    Safety(#[from] medrec_safety::SafetyError),

    #[error("ledger error: {0}")]
    Ledger(#[from] medrec_ledger::LedgerError),

    #[error("unreadable reasoning opinion: {0}")]
    Opinion(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type ReconcileResult<T> = Result<T, ReconcileError>;
