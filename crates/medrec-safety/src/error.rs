use medrec_types::TypeError;

/// Errors raised while running safety checks.
///
/// Built-in checks only fail on programmer error; custom checks may report
/// their own failures through [`SafetyError::check`].
#[derive(Debug, thiserror::Error)]
pub enum SafetyError {
    /// A check produced a malformed issue.
    #[error("invalid safety issue: {0}")]
    Issue(#[from] TypeError),

    /// A check failed to run.
    #[error("check error in '{check}': {message}")]
    Check { check: String, message: String },
}

impl SafetyError {
    /// Create a check error with a name and message.
    pub fn check(check: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Check {
            check: check.into(),
            message: message.into(),
        }
    }
}
