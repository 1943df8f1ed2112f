use thiserror::Error;

/// Errors from loading or validating rule tables.
#[derive(Debug, Error)]
pub enum RulesError {
    #[error("rule table parse error: {0}")]
    Parse(String),

    #[error("failed to read rule tables from {path}: {message}")]
    Io { path: String, message: String },

    #[error("rule table validation error: {0}")]
    Validation(String),

    #[error("rule table serialization error: {0}")]
    Serialize(String),
}
