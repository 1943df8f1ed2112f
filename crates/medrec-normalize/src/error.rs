use thiserror::Error;

/// Errors from building a normalizer.
///
/// Normalizing a medication never fails; only compiling the strength
/// patterns from the rule tables can.
#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error("invalid strength pattern: {0}")]
    Pattern(#[from] regex::Error),
}
