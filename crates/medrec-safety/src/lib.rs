//! Safety validation over canonical medications.
//!
//! The [`SafetyValidator`] runs an ordered pipeline of [`SafetyCheck`]s over
//! a medication list and optional lab values:
//!
//! ```text
//! exact duplication -> class duplication -> interaction -> renal
//! ```
//!
//! Findings are data, never errors. Every check is a pure function of the
//! medications, the labs and the injected rule tables.

pub mod check;
pub mod checks;
pub mod error;
pub mod validator;

pub use check::{CheckContext, SafetyCheck, SafetyOptions};
pub use error::SafetyError;
pub use validator::{issue_counts, CheckResult, SafetyReport, SafetyValidator};
