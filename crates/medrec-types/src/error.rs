use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("unknown {vocabulary} '{value}'; expected one of: {allowed}")]
    UnknownLabel {
        vocabulary: &'static str,
        value: String,
        allowed: String,
    },

    #[error("safety issue must name at least one affected medication")]
    NoAffectedMedications,
}
